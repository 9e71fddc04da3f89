//=========================================================================
// Scheduler Errors
//=========================================================================
//
// World-integrity problems are recovered locally and only logged
// (`SchedulerError`). Save-game documents that can't be read at all
// surface as `PersistError`.
//
// Claim misuse is a caller contract violation and panics instead.
//
//=========================================================================

//=== External Dependencies ===============================================

use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::host::ParentRef;
use crate::core::hook::HookId;

//=== SchedulerError ======================================================

/// Recoverable problems met while dispatching or loading hooks.
///
/// None of these are returned to callers; they are formatted into `warn!`
/// lines and the scheduler carries on.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The hook's mission/event no longer exists. The hook is dropped.
    #[error("hook {hook} belongs to {parent} which no longer exists, removing it")]
    MissingParent { hook: HookId, parent: ParentRef },

    /// The script callback reported an error. The hook is kept.
    #[error("hook {hook} [{channel}] -> '{function}' failed: {message}")]
    Callback {
        hook: HookId,
        channel: String,
        function: String,
        message: String,
    },

    /// A saved hook names a parent kind this build can't restore.
    #[error("saved hook {id} has unknown parent kind '{kind}', skipping it")]
    UnknownPersistedHookType { id: u64, kind: String },

    /// A saved hook carries an id that can't be used.
    #[error("saved hook has unusable id {id}, skipping it")]
    InvalidPersistedId { id: u64 },
}

//=== PersistError ========================================================

/// Failures reading or writing a scheduler document.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("scheduler document could not be (de)serialized: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported scheduler document version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

//=========================================================================
// Unit Tests
//=========================================================================
