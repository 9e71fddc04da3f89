//=========================================================================
// Aetheric Scheduler - Library Root
//
// Hook scheduling and resource claims for narrative scripts.
//
// Responsibilities:
// - Let missions and events register hooks on channels, timers and
//   game-time calendars
// - Dispatch them re-entrantly, claim holders first
// - Hold dispatches back inside an atomic exclusion window
// - Track system and tag claims so plots don't collide
// - Save and restore all of it with the game
//
// Typical usage:
// ```
// use aetheric_scheduler::prelude::*;
//
// struct Host;
//
// impl ScriptHost for Host {
//     fn invoke(&mut self, _: &mut Scheduler, call: HookCall<'_>) -> CallbackOutcome {
//         println!("{} runs {}", call.parent, call.function);
//         CallbackOutcome::Ok
//     }
//     fn parent_exists(&self, _: ParentRef) -> bool {
//         true
//     }
//     fn current_system(&self) -> Option<SystemId> {
//         Some(SystemId(1))
//     }
// }
//
// let mut scheduler = SchedulerBuilder::new().build();
// scheduler.add_channel_hook(ParentRef::Mission(1), "on_land", "land");
// let report = scheduler.dispatch_channel(&mut Host, "land", &[]);
// assert_eq!(report.fired, 1);
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the subsystems. Most callers only need the `Scheduler`
// facade and the types in the prelude.
//
pub mod core;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `scheduler` defines the owning context and its builder.
//
mod scheduler;

//--- Public Exports ------------------------------------------------------

pub use scheduler::{Scheduler, SchedulerBuilder, SchedulerConfig, DATE_CHANNEL, TIMER_CHANNEL};
