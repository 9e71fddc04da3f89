//=========================================================================
// Core Subsystems
//
// Building blocks of the scheduler, leaves first:
//
//   host         collaborator trait the narrative runtime implements
//   claim        reservations of systems and tags
//   hook         hook records and the arena that owns them
//   dispatch     two-pass dispatch, timer and calendar ticks
//   exclusion    atomic window that holds dispatches back
//   deferred     dispatches posted for the next frame
//   persistence  save/load documents
//
// Every subsystem that needs the whole context adds its operations to
// `Scheduler` in its own `impl` block.
//
//=========================================================================

pub mod claim;
pub mod deferred;
pub mod dispatch;
pub mod error;
pub mod exclusion;
pub mod hook;
pub mod host;
pub mod persistence;
