//=========================================================================
// Script Host Interface
//=========================================================================
//
// Scheduler-to-script contract (parents, arguments, callback outcomes).
//
// The scheduler knows nothing about the scripting language. Everything it
// needs from the narrative layer goes through `ScriptHost`:
//
//   Scheduler ── invoke(&mut Scheduler, HookCall) ──> ScriptHost
//             ── parent_exists / parent_claim ──────> ScriptHost
//             ── current_system / event_saves ──────> ScriptHost
//
// `invoke` receives the scheduler mutably so callbacks may register,
// remove, or dispatch hooks re-entrantly.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

//=== Internal Dependencies ===============================================

use crate::core::claim::{ClaimId, SystemId};
use crate::core::hook::HookId;
use crate::scheduler::Scheduler;

//=== ParentRef ===========================================================

/// Identifies the mission or event that owns a scripted hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ParentRef {
    Mission(u64),
    Event(u64),
}

impl ParentRef {
    /// Kind of the parent, without its id.
    pub fn kind(&self) -> ParentKind {
        match self {
            Self::Mission(_) => ParentKind::Mission,
            Self::Event(_) => ParentKind::Event,
        }
    }

    /// Numeric id of the parent.
    pub fn id(&self) -> u64 {
        match *self {
            Self::Mission(id) | Self::Event(id) => id,
        }
    }

    /// Rebuilds a parent reference from its kind and id.
    pub fn from_parts(kind: ParentKind, id: u64) -> Self {
        match kind {
            ParentKind::Mission => Self::Mission(id),
            ParentKind::Event => Self::Event(id),
        }
    }
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

//=== ParentKind ==========================================================

/// Parent kinds that can be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentKind {
    Mission,
    Event,
}

impl ParentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mission => "mission",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for ParentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mission" => Ok(Self::Mission),
            "event" => Ok(Self::Event),
            other => Err(other.to_owned()),
        }
    }
}

//=== HookArg =============================================================

/// A typed value passed to a hook callback.
///
/// Dispatch params and a hook's stored argument are both lists of
/// `HookArg`. The stored argument, if any, is appended after the params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HookArg {
    Nil,
    Bool(bool),
    Int(i64),
    Number(f64),
    Text(String),
    /// Opaque world handle (pilot, planet, outfit ...).
    Id(u64),
    List(Vec<HookArg>),
}

impl From<bool> for HookArg {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for HookArg {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for HookArg {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for HookArg {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for HookArg {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

//=== CallbackOutcome =====================================================

/// Result signalled by a callback after it ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Callback completed; the hook stays registered.
    Ok,

    /// The owning mission/event asked to be torn down.
    ///
    /// The scheduler does not tear anything down itself, it reports the
    /// parent back to the caller in the `DispatchReport`.
    Terminate,

    /// Callback failed. Logged and counted; the hook is kept.
    Error(String),
}

//=== HookCall ============================================================

/// One scripted callback invocation.
#[derive(Debug, Clone, Copy)]
pub struct HookCall<'a> {
    pub hook: HookId,
    pub parent: ParentRef,
    pub function: &'a str,
    pub args: &'a [HookArg],
}

//=== ScriptHost ==========================================================

/// The narrative runtime the scheduler calls into.
///
/// Implementations must tolerate re-entrant `invoke` calls: a callback may
/// dispatch a channel that fires further callbacks before it returns.
pub trait ScriptHost {
    /// Runs `call.function` inside the parent's script environment.
    fn invoke(&mut self, scheduler: &mut Scheduler, call: HookCall<'_>) -> CallbackOutcome;

    /// Whether the mission/event still exists.
    fn parent_exists(&self, parent: ParentRef) -> bool;

    /// The claim currently held by the parent, if any.
    fn parent_claim(&self, _parent: ParentRef) -> Option<ClaimId> {
        None
    }

    /// The system the player is in, or `None` when no world is loaded.
    fn current_system(&self) -> Option<SystemId>;

    /// Whether an event opted into being saved.
    fn event_saves(&self, _event: u64) -> bool {
        true
    }
}

//=========================================================================
// Test Support
//=========================================================================


//=========================================================================
// Unit Tests
//=========================================================================
