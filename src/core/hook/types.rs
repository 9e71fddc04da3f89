//=========================================================================
// Hook Types
//=========================================================================
//
// One registered reaction and the variants that describe it.
//
//   Hook
//     ├─ parent:  Script(ParentRef) | Native(NativeCallback)
//     └─ trigger: Channel | Countdown | Calendar
//
// Parent and trigger are orthogonal enums, so a hook always has exactly
// one owner kind and exactly one trigger kind.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;
use std::num::NonZeroU64;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

//=== Internal Dependencies ===============================================

use crate::core::host::{CallbackOutcome, HookArg, ParentRef, ScriptHost};
use crate::scheduler::Scheduler;

//=== HookId ==============================================================

/// Process-unique, positive hook identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HookId(NonZeroU64);

impl HookId {
    /// Returns `None` for zero, which is never a valid hook id.
    pub fn new(id: u64) -> Option<Self> {
        NonZeroU64::new(id).map(Self)
    }

    pub fn get(&self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//=== NativeCallback ======================================================

/// Signature of a hook implemented in Rust instead of script.
pub type NativeFn = dyn Fn(&mut Scheduler, &mut dyn ScriptHost, &[HookArg]) -> CallbackOutcome;

/// Shared handle to a native hook function.
///
/// Any data the function needs is captured by the closure. Cloning is
/// cheap, which lets the dispatcher release its borrow of the hook store
/// before the call.
#[derive(Clone)]
pub struct NativeCallback(Rc<NativeFn>);

impl NativeCallback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Scheduler, &mut dyn ScriptHost, &[HookArg]) -> CallbackOutcome + 'static,
    {
        Self(Rc::new(f))
    }

    pub(crate) fn call(
        &self,
        scheduler: &mut Scheduler,
        host: &mut dyn ScriptHost,
        args: &[HookArg],
    ) -> CallbackOutcome {
        (self.0)(scheduler, host, args)
    }
}

impl fmt::Debug for NativeCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NativeCallback(..)")
    }
}

//=== HookParent ==========================================================

/// Who owns a hook and runs when it fires.
#[derive(Debug, Clone)]
pub enum HookParent {
    /// A mission or event; the hook names a function in its environment.
    Script(ParentRef),

    /// A Rust function. Never persisted.
    Native(NativeCallback),
}

impl HookParent {
    /// The scripted parent, if this isn't a native hook.
    pub fn script(&self) -> Option<ParentRef> {
        match self {
            Self::Script(parent) => Some(*parent),
            Self::Native(_) => None,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native(_))
    }
}

//=== Trigger =============================================================

/// What makes a hook fire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    /// Fires when its channel is dispatched.
    Channel,

    /// Fires once the remaining time runs out.
    Countdown { remaining_ms: f64 },

    /// Fires each time the accumulated game time reaches `resolution`.
    Calendar { resolution: u64, accumulated: u64 },
}

impl Trigger {
    pub fn is_channel(&self) -> bool {
        matches!(self, Self::Channel)
    }

    pub fn is_countdown(&self) -> bool {
        matches!(self, Self::Countdown { .. })
    }

    pub fn is_calendar(&self) -> bool {
        matches!(self, Self::Calendar { .. })
    }
}

//=== Hook ================================================================

/// One registered reaction.
///
/// Only the scheduler mutates hooks. A hook marked for deletion is inert
/// and stays allocated until the next safe sweep.
#[derive(Debug, Clone)]
pub struct Hook {
    pub(crate) id: HookId,
    pub(crate) channel: String,
    pub(crate) parent: HookParent,
    pub(crate) function: String,
    pub(crate) trigger: Trigger,
    pub(crate) once: bool,
    pub(crate) pending_delete: bool,
    pub(crate) arg: Option<HookArg>,
}

impl Hook {
    pub fn id(&self) -> HookId {
        self.id
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn parent(&self) -> &HookParent {
        &self.parent
    }

    /// Callback name; empty for native hooks.
    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    pub fn is_once(&self) -> bool {
        self.once
    }

    pub fn is_pending_delete(&self) -> bool {
        self.pending_delete
    }

    /// Live hooks are those not yet marked for deletion.
    pub fn is_live(&self) -> bool {
        !self.pending_delete
    }

    pub fn arg(&self) -> Option<&HookArg> {
        self.arg.as_ref()
    }

    pub fn belongs_to(&self, parent: ParentRef) -> bool {
        self.parent.script() == Some(parent)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
