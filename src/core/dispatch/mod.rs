//=========================================================================
// Dispatch System
//=========================================================================
//
// Executes hooks for channels, single ids, countdowns and calendar time.
//
// Flow:
//   dispatch_channel() ─┬─ window open → ExclusionQueue
//                       └─ run_frame() → pass 1 (claims) → pass 2 → sweep
//
//=========================================================================

//=== Module Declarations =================================================

mod dispatcher;
mod report;

//=== Public API ==========================================================

pub use report::DispatchReport;
