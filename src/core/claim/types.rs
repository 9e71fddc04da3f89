//=========================================================================
// Claim Types
//=========================================================================
//
// Identifiers and the per-claim reservation record.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

use serde::{Deserialize, Serialize};

//=== SystemId ============================================================

/// Identifies a star system that narrative scripts can claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemId(pub u32);

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "system#{}", self.0)
    }
}

//=== ClaimId =============================================================

/// Handle to a claim owned by the [`ClaimRegistry`](super::ClaimRegistry).
///
/// Parents (missions/events) keep this handle and report it back through
/// `ScriptHost::parent_claim`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimId(pub(crate) u64);

impl ClaimId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "claim#{}", self.0)
    }
}

//=== SystemClaimState ====================================================

/// Claim-derived state of one system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemClaimState {
    /// Some active exclusive claim holds the system.
    pub exclusive: bool,

    /// Number of active non-exclusive reservations on the system.
    pub soft_count: u32,
}

//=== Claim ===============================================================

/// A reservation of systems and tag strings.
///
/// Built empty, filled while inactive, then tested and activated as one
/// transaction. Once active it is read-only until destroyed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub(crate) active: bool,
    pub(crate) exclusive: bool,
    pub(crate) systems: Vec<SystemId>,
    pub(crate) tags: Vec<String>,
}

impl Claim {
    pub(crate) fn new(exclusive: bool) -> Self {
        Self {
            active: false,
            exclusive,
            systems: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    pub fn systems(&self) -> &[SystemId] {
        &self.systems
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// True when the claim reserves no systems. Tags don't count.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    pub fn holds_system(&self, system: SystemId) -> bool {
        self.systems.contains(&system)
    }

    pub fn holds_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
