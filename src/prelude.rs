//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use aetheric_scheduler::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Scheduler
pub use crate::scheduler::{Scheduler, SchedulerBuilder, SchedulerConfig};

// Script host contract
pub use crate::core::host::{CallbackOutcome, HookArg, HookCall, ParentRef, ScriptHost};

// Hooks and dispatch
pub use crate::core::deferred::DeferredSender;
pub use crate::core::dispatch::DispatchReport;
pub use crate::core::hook::{Hook, HookId, Trigger};

// Claims
pub use crate::core::claim::{Claim, ClaimId, ClaimRegistry, SystemClaimState, SystemId};

// Persistence
pub use crate::core::error::PersistError;
pub use crate::core::persistence::{LoadReport, SchedulerDocument};
