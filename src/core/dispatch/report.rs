//=========================================================================
// Dispatch Report
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::host::ParentRef;

//=== DispatchReport ======================================================

/// What happened during one dispatch call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Callbacks invoked, failed ones included.
    pub fired: usize,

    /// Callbacks that returned an error.
    pub failed: usize,

    /// Parents whose callbacks asked for teardown, in request order.
    pub terminated: Vec<ParentRef>,

    /// The dispatch was parked in the exclusion queue.
    pub queued: bool,
}

impl DispatchReport {
    pub(crate) fn queued() -> Self {
        Self {
            queued: true,
            ..Self::default()
        }
    }

    /// Folds another report into this one.
    pub fn merge(&mut self, other: DispatchReport) {
        self.fired += other.fired;
        self.failed += other.failed;
        for parent in other.terminated {
            self.note_terminated(parent);
        }
        self.queued |= other.queued;
    }

    pub(crate) fn note_terminated(&mut self, parent: ParentRef) {
        if !self.terminated.contains(&parent) {
            self.terminated.push(parent);
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
