//=========================================================================
// Exclusion Queue
//=========================================================================
//
// FIFO of channel dispatches requested while the atomic window is open.
//
// While a world update that temporarily breaks invariants is running,
// dispatches are parked here and replayed in order once the window
// closes. Calendar time that passes inside the window is accumulated so
// it can be applied in one step afterwards.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::VecDeque;

//=== Internal Dependencies ===============================================

use crate::core::host::HookArg;

//=== QueuedDispatch ======================================================

/// A channel dispatch waiting for the window to close.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedDispatch {
    pub channel: String,
    pub params: Vec<HookArg>,
}

//=== ExclusionQueue ======================================================

/// Atomic-window flag plus the dispatches it held back.
#[derive(Debug, Default)]
pub struct ExclusionQueue {
    active: bool,
    queue: VecDeque<QueuedDispatch>,
    calendar_backlog: u64,
}

impl ExclusionQueue {
    /// Creates a closed, empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    //--- Window -----------------------------------------------------------

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Opens the window. Returns false if it was already open.
    pub(crate) fn open(&mut self) -> bool {
        !std::mem::replace(&mut self.active, true)
    }

    pub(crate) fn close(&mut self) {
        self.active = false;
    }

    //--- Queueing ---------------------------------------------------------

    /// Parks a dispatch until the window closes.
    pub(crate) fn push(&mut self, channel: &str, params: &[HookArg]) {
        self.queue.push_back(QueuedDispatch {
            channel: channel.to_owned(),
            params: params.to_vec(),
        });
    }

    /// Adds calendar time that passed inside the window.
    pub(crate) fn defer_calendar(&mut self, delta: u64) {
        self.calendar_backlog = self.calendar_backlog.saturating_add(delta);
    }

    /// Returns an iterator over queued dispatches, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &QueuedDispatch> {
        self.queue.iter()
    }

    /// Returns the number of queued dispatches.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if no dispatch is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn calendar_backlog(&self) -> u64 {
        self.calendar_backlog
    }

    /// Takes all queued dispatches, leaving the queue empty.
    pub(crate) fn take(&mut self) -> VecDeque<QueuedDispatch> {
        std::mem::take(&mut self.queue)
    }

    pub(crate) fn take_calendar_backlog(&mut self) -> u64 {
        std::mem::take(&mut self.calendar_backlog)
    }

    /// Closes the window and forgets everything queued.
    pub(crate) fn clear(&mut self) {
        self.active = false;
        self.queue.clear();
        self.calendar_backlog = 0;
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
