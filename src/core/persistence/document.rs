//=========================================================================
// Scheduler Document
//=========================================================================
//
// Save-game shape of the scheduler state.
//
//   SchedulerDocument
//     ├─ version
//     ├─ hooks:  [SavedHook]   (saveable live hooks)
//     └─ claims: [SavedClaim]  (active claims)
//
// Field names are part of the save format. Optional fields are left out
// of the JSON when unset.
//
//=========================================================================

//=== External Dependencies ===============================================

use serde::{Deserialize, Serialize};

//=== Internal Dependencies ===============================================

use crate::core::claim::SystemId;
use crate::core::host::HookArg;

//=== Constants ===========================================================

/// Version written by `save()` and the only one `load()` accepts.
pub const DOCUMENT_VERSION: u32 = 1;

//=== SchedulerDocument ===================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerDocument {
    pub version: u32,
    #[serde(default)]
    pub hooks: Vec<SavedHook>,
    #[serde(default)]
    pub claims: Vec<SavedClaim>,
}

impl Default for SchedulerDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            hooks: Vec::new(),
            claims: Vec::new(),
        }
    }
}

//=== SavedHook ===========================================================

/// One persisted hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedHook {
    pub id: u64,
    pub channel: String,
    /// `"mission"` or `"event"`.
    pub parent_kind: String,
    pub parent_id: u64,
    pub function: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub once: bool,

    /// Set for calendar hooks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accumulated: Option<u64>,

    /// Set for countdown hooks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_ms: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg: Option<HookArg>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

//=== SavedClaim ==========================================================

/// One persisted active claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedClaim {
    pub id: u64,
    pub exclusive: bool,
    #[serde(default)]
    pub systems: Vec<SystemId>,
    #[serde(default)]
    pub tags: Vec<String>,
}

//=== LoadReport ==========================================================

/// Summary of one `load()` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub hooks_restored: usize,
    /// Entries dropped as malformed (unknown parent kind, bad or
    /// duplicate id).
    pub hooks_skipped: usize,
    /// Restored hooks whose saved id was already taken; they were kept
    /// under a fresh id.
    pub hooks_renumbered: usize,
    pub claims_restored: usize,
    pub claims_skipped: usize,
}

//=========================================================================
// Unit Tests
//=========================================================================
