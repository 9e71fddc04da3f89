//=========================================================================
// Deferred Dispatch
//=========================================================================
//
// Dispatches requested now but run at the next frame boundary.
//
// Flow:
//   dispatch_deferred() / DeferredSender::send()
//     → DeferredInbox
//     → update(dt): drain (bounded) → dispatch_channel() → timer tick
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::dispatch::DispatchReport;
use crate::core::host::{HookArg, ScriptHost};
use crate::scheduler::Scheduler;

//=== Module Declarations =================================================

mod inbox;

//=== Public API ==========================================================

pub use inbox::{DeferredDispatch, DeferredSender};
pub(crate) use inbox::DeferredInbox;

//=== Scheduler Integration ===============================================

impl Scheduler {
    /// Queues a channel dispatch for the next [`update`](Self::update).
    pub fn dispatch_deferred(&self, channel: &str, params: &[HookArg]) -> bool {
        self.inbox.sender().send(channel, params.to_vec())
    }

    /// Handle for posting deferred dispatches without `&mut Scheduler`.
    pub fn deferred_sender(&self) -> DeferredSender {
        self.inbox.sender()
    }

    /// Number of deferred dispatches waiting for the next update.
    pub fn pending_deferred(&self) -> usize {
        self.inbox.pending()
    }

    /// Per-frame driver.
    ///
    /// Runs the deferred dispatches that fit in this frame's budget, then
    /// the timer tick for `dt`.
    pub fn update(&mut self, host: &mut dyn ScriptHost, dt: f64) -> DispatchReport {
        let mut report = DispatchReport::default();

        for dispatch in self.inbox.collect_frame() {
            report.merge(self.dispatch_channel(host, &dispatch.channel, &dispatch.params));
        }

        report.merge(self.dispatch_timer(host, dt));
        report
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
