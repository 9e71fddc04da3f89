//=========================================================================
// Exclusion Window
//=========================================================================
//
// Holds channel dispatches back while a world update is mid-flight.
//
// Flow:
//   begin_exclusion() → dispatch_channel() × N → queued (FIFO)
//   end_exclusion(dt) → replay queue → timer tick → calendar tick → sweep
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use crate::core::dispatch::DispatchReport;
use crate::core::host::ScriptHost;
use crate::scheduler::Scheduler;

//=== Module Declarations =================================================

mod exclusion_queue;

//=== Public API ==========================================================

pub use exclusion_queue::{ExclusionQueue, QueuedDispatch};

//=== Scheduler Integration ===============================================

impl Scheduler {
    /// Opens the atomic window. Channel dispatches are queued until
    /// [`end_exclusion`](Self::end_exclusion).
    pub fn begin_exclusion(&mut self) {
        if self.exclusion.open() {
            debug!("Exclusion window opened");
        } else {
            warn!("Exclusion window already open");
        }
    }

    /// Closes the window and settles everything it held back.
    ///
    /// Queued dispatches run in the order they were issued, then the
    /// timer tick for `dt`, then calendar time accumulated in the window,
    /// then a sweep.
    pub fn end_exclusion(&mut self, host: &mut dyn ScriptHost, dt: f64) -> DispatchReport {
        self.exclusion.close();

        let queued = self.exclusion.take();
        debug!("Exclusion window closed, replaying {} dispatches", queued.len());

        let mut report = DispatchReport::default();
        for dispatch in queued {
            report.merge(self.dispatch_channel(host, &dispatch.channel, &dispatch.params));
        }

        report.merge(self.run_timer(host, dt));

        let backlog = self.exclusion.take_calendar_backlog();
        if backlog > 0 {
            report.merge(self.run_calendar(host, backlog));
        }

        self.sweep();
        report
    }

    /// Whether the atomic window is currently open.
    pub fn in_exclusion(&self) -> bool {
        self.exclusion.is_active()
    }

    /// Dispatches waiting for the window to close.
    pub fn exclusion_queue(&self) -> &ExclusionQueue {
        &self.exclusion
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
