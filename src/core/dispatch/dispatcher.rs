//=========================================================================
// Dispatcher
//=========================================================================
//
// Runs hooks for a channel, a single id, countdown timers, or calendar
// time.
//
// Frame:
//   snapshot candidate ids
//     → pass 1: hooks whose parent's claim holds the current system
//     → pass 2: every remaining candidate
//     → re-derive claims if anything fired
//     → sweep (outermost frame only)
//
// Re-entrancy:
//   Callbacks get `&mut Scheduler` and may register, remove or dispatch.
//   The candidate snapshot keeps hooks created mid-frame out of it, each
//   candidate is re-checked for liveness right before it fires, and the
//   per-frame fired set keeps nested frames from resetting outer guards.
//   Hook slots are only compacted once `depth` is back to zero.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashSet;

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use super::DispatchReport;
use crate::core::claim::SystemId;
use crate::core::error::SchedulerError;
use crate::core::hook::{HookId, HookParent, Trigger};
use crate::core::host::{CallbackOutcome, HookArg, HookCall, ScriptHost};
use crate::scheduler::Scheduler;

impl Scheduler {
    //--- Channel Dispatch -------------------------------------------------

    /// Fires every live hook listening on `channel`.
    ///
    /// While the exclusion window is open the request is queued instead
    /// and the returned report has `queued` set. Without a loaded world
    /// (`current_system()` is `None`) nothing fires.
    pub fn dispatch_channel(
        &mut self,
        host: &mut dyn ScriptHost,
        channel: &str,
        params: &[HookArg],
    ) -> DispatchReport {
        if self.exclusion.is_active() {
            debug!("Exclusion window open, queueing dispatch of '{}'", channel);
            self.exclusion.push(channel, params);
            return DispatchReport::queued();
        }

        let Some(system) = host.current_system() else {
            return DispatchReport::default();
        };

        let candidates = self
            .hooks
            .live_ids(|h| h.trigger.is_channel() && h.channel == channel);
        self.run_frame(host, system, &candidates, params)
    }

    /// Fires exactly one hook, ignoring its channel and claim state.
    pub fn dispatch_by_id(
        &mut self,
        host: &mut dyn ScriptHost,
        id: HookId,
        params: &[HookArg],
    ) -> DispatchReport {
        if host.current_system().is_none() {
            return DispatchReport::default();
        }
        if !self.hooks.is_live(id) {
            debug!("Hook {} is not live, nothing to run", id);
            return DispatchReport::default();
        }

        self.depth += 1;
        let mut report = DispatchReport::default();
        self.fire(host, id, params, &mut report);
        self.finish_frame(&report);
        report
    }

    //--- Timer / Calendar Ticks -------------------------------------------

    /// Advances countdown hooks by `dt` seconds and fires the expired ones.
    ///
    /// Ignored while the exclusion window is open: `end_exclusion(dt)`
    /// runs that frame's timer step instead.
    pub fn dispatch_timer(&mut self, host: &mut dyn ScriptHost, dt: f64) -> DispatchReport {
        if self.exclusion.is_active() {
            debug!("Timer tick ignored inside exclusion window");
            return DispatchReport::default();
        }
        self.run_timer(host, dt)
    }

    /// Adds `delta` game time to calendar hooks and fires those that
    /// reached their resolution.
    ///
    /// Inside the exclusion window the delta is held back and applied by
    /// `end_exclusion`.
    pub fn dispatch_calendar(&mut self, host: &mut dyn ScriptHost, delta: u64) -> DispatchReport {
        if self.exclusion.is_active() {
            self.exclusion.defer_calendar(delta);
            return DispatchReport::queued();
        }
        self.run_calendar(host, delta)
    }

    pub(crate) fn run_timer(&mut self, host: &mut dyn ScriptHost, dt: f64) -> DispatchReport {
        let Some(system) = host.current_system() else {
            return DispatchReport::default();
        };

        let elapsed_ms = dt * 1000.0;
        let mut due = Vec::new();
        for id in self.hooks.live_ids(|h| h.trigger.is_countdown()) {
            let Some(hook) = self.hooks.get_mut(id) else {
                continue;
            };
            if let Trigger::Countdown { remaining_ms } = &mut hook.trigger {
                *remaining_ms -= elapsed_ms;
                if *remaining_ms <= 0.0 {
                    // Expired countdowns never fire twice
                    hook.once = true;
                    due.push(id);
                }
            }
        }

        self.run_frame(host, system, &due, &[])
    }

    pub(crate) fn run_calendar(&mut self, host: &mut dyn ScriptHost, delta: u64) -> DispatchReport {
        let Some(system) = host.current_system() else {
            return DispatchReport::default();
        };

        let mut due = Vec::new();
        for id in self.hooks.live_ids(|h| h.trigger.is_calendar()) {
            let Some(hook) = self.hooks.get_mut(id) else {
                continue;
            };
            if let Trigger::Calendar { resolution, accumulated } = &mut hook.trigger {
                *accumulated = accumulated.saturating_add(delta);
                if *accumulated >= *resolution {
                    // Keep the overflow so periodic hooks don't drift
                    *accumulated %= *resolution;
                    due.push(id);
                }
            }
        }

        self.run_frame(host, system, &due, &[])
    }

    //--- Frame ------------------------------------------------------------

    fn run_frame(
        &mut self,
        host: &mut dyn ScriptHost,
        system: SystemId,
        candidates: &[HookId],
        params: &[HookArg],
    ) -> DispatchReport {
        self.depth += 1;
        let mut report = DispatchReport::default();
        let mut fired: HashSet<HookId> = HashSet::with_capacity(candidates.len());

        // Pass 1: claim holders of the current system go first
        for &id in candidates {
            if self.hooks.is_live(id) && self.claims_system(&*host, id, system) {
                fired.insert(id);
                self.fire(host, id, params, &mut report);
            }
        }

        // Pass 2: everything still live that didn't fire yet
        for &id in candidates {
            if !fired.contains(&id) && self.hooks.is_live(id) {
                self.fire(host, id, params, &mut report);
            }
        }

        self.finish_frame(&report);
        report
    }

    fn finish_frame(&mut self, report: &DispatchReport) {
        self.depth -= 1;

        // Claims made by missions/events spawned from callbacks take
        // effect before the dispatch returns
        if report.fired > 0 {
            self.claims.activate_all();
        }

        self.sweep();
    }

    fn claims_system(&self, host: &dyn ScriptHost, id: HookId, system: SystemId) -> bool {
        let Some(parent) = self.hooks.get(id).and_then(|h| h.parent.script()) else {
            return false;
        };
        self.claims.test_system(host.parent_claim(parent), system)
    }

    //--- Invocation -------------------------------------------------------

    fn fire(
        &mut self,
        host: &mut dyn ScriptHost,
        id: HookId,
        params: &[HookArg],
        report: &mut DispatchReport,
    ) {
        let Some(hook) = self.hooks.get(id) else {
            return;
        };

        // Copied out so the store isn't borrowed while the callback runs
        let parent = hook.parent.clone();
        let channel = hook.channel.clone();
        let function = hook.function.clone();
        let once = hook.once;
        let mut args = params.to_vec();
        if let Some(arg) = &hook.arg {
            args.push(arg.clone());
        }

        if let Some(script) = parent.script() {
            if !host.parent_exists(script) {
                warn!("{}", SchedulerError::MissingParent { hook: id, parent: script });
                self.hooks.remove(id);
                return;
            }
        }

        // Removed before the call so a re-entrant dispatch can't refire it
        if once {
            self.hooks.remove(id);
        }

        let outcome = match &parent {
            HookParent::Script(script) => host.invoke(
                self,
                HookCall {
                    hook: id,
                    parent: *script,
                    function: &function,
                    args: &args,
                },
            ),
            HookParent::Native(callback) => callback.call(self, host, &args),
        };
        report.fired += 1;

        match outcome {
            CallbackOutcome::Ok => {}
            CallbackOutcome::Terminate => match parent.script() {
                Some(script) => report.note_terminated(script),
                None => debug!("Native hook {} asked for termination, ignoring", id),
            },
            CallbackOutcome::Error(message) => {
                report.failed += 1;
                warn!(
                    "{}",
                    SchedulerError::Callback {
                        hook: id,
                        channel,
                        function,
                        message,
                    }
                );
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::core::claim::SystemId;
    use crate::core::host::testing::TestHost;
    use crate::core::host::ParentRef;
    use crate::scheduler::SchedulerBuilder;

    const M1: ParentRef = ParentRef::Mission(1);
    const M2: ParentRef = ParentRef::Mission(2);
    const E1: ParentRef = ParentRef::Event(1);

    fn scheduler() -> Scheduler {
        SchedulerBuilder::new().build()
    }

    //--- Channel ----------------------------------------------------------

    #[test]
    fn dispatch_fires_matching_channel_only() {
        let mut s = scheduler();
        let mut host = TestHost::new();
        s.add_channel_hook(M1, "on_enter", "enter");
        s.add_channel_hook(M1, "on_land", "land");

        let report = s.dispatch_channel(&mut host, "enter", &[]);
        assert_eq!(report.fired, 1);
        assert_eq!(host.functions(), ["on_enter"]);
    }

    #[test]
    fn params_come_before_stored_arg() {
        let mut s = scheduler();
        let mut host = TestHost::new();
        let id = s.add_channel_hook(M1, "cb", "board");
        s.set_arg(id, HookArg::Text("cargo".into()));

        s.dispatch_channel(&mut host, "board", &[HookArg::Id(77)]);
        assert_eq!(host.calls[0].2, vec![HookArg::Id(77), HookArg::Text("cargo".into())]);
    }

    #[test]
    fn claim_holders_fire_first() {
        let mut s = scheduler();
        let mut host = TestHost::new();
        s.add_channel_hook(M1, "unclaimed", "enter");
        s.add_channel_hook(M2, "claimed", "enter");

        let claim = s.claims_mut().create(false);
        s.claims_mut().add_system(claim, SystemId(1));
        assert!(!s.claims_mut().test(Some(claim)));
        s.claims_mut().activate(claim);
        host.claims.insert(M2, claim);

        s.dispatch_channel(&mut host, "enter", &[]);
        assert_eq!(host.functions(), ["claimed", "unclaimed"]);
    }

    #[test]
    fn claim_for_other_system_does_not_prioritise() {
        let mut s = scheduler();
        let mut host = TestHost::new();
        s.add_channel_hook(M1, "first", "enter");
        s.add_channel_hook(M2, "second", "enter");

        let claim = s.claims_mut().create(true);
        s.claims_mut().add_system(claim, SystemId(99));
        host.claims.insert(M2, claim);

        s.dispatch_channel(&mut host, "enter", &[]);
        assert_eq!(host.functions(), ["first", "second"]);
    }

    #[test]
    fn no_world_means_no_dispatch() {
        let mut s = scheduler();
        let mut host = TestHost::new();
        host.system = None;
        s.add_channel_hook(M1, "cb", "enter");

        assert_eq!(s.dispatch_channel(&mut host, "enter", &[]), DispatchReport::default());
        assert!(host.calls.is_empty());
    }

    #[test]
    fn no_world_means_no_timer_calendar_or_id_dispatch() {
        let mut s = scheduler();
        let mut host = TestHost::new();
        host.system = None;
        let timer = s.add_countdown_hook(M1, "beep", 100.0);
        let date = s.add_calendar_hook(M1, "tick", 100);
        let chan = s.add_channel_hook(M1, "cb", "enter");

        assert_eq!(s.dispatch_timer(&mut host, 1.0), DispatchReport::default());
        assert_eq!(s.dispatch_calendar(&mut host, 500), DispatchReport::default());
        assert_eq!(s.dispatch_by_id(&mut host, chan, &[]), DispatchReport::default());

        assert!(host.calls.is_empty());
        assert_eq!(s.hook(timer).unwrap().trigger(), Trigger::Countdown { remaining_ms: 100.0 });
        assert_eq!(
            s.hook(date).unwrap().trigger(),
            Trigger::Calendar { resolution: 100, accumulated: 0 }
        );
    }

    #[test]
    fn missing_parent_removes_hook_without_invoking() {
        let mut s = scheduler();
        let mut host = TestHost::new();
        let id = s.add_channel_hook(E1, "cb", "enter");
        host.dead.insert(E1);

        let report = s.dispatch_channel(&mut host, "enter", &[]);
        assert_eq!(report.fired, 0);
        assert!(host.calls.is_empty());
        assert!(s.hook(id).is_none());
    }

    #[test]
    fn callback_error_keeps_hook() {
        let mut s = scheduler();
        let mut host = TestHost::new();
        let id = s.add_channel_hook(M1, "broken", "enter");
        host.outcomes
            .insert("broken".into(), CallbackOutcome::Error("nil value".into()));

        let report = s.dispatch_channel(&mut host, "enter", &[]);
        assert_eq!(report.fired, 1);
        assert_eq!(report.failed, 1);
        assert!(s.is_live(id));
    }

    #[test]
    fn terminate_is_reported_not_handled() {
        let mut s = scheduler();
        let mut host = TestHost::new();
        let id = s.add_channel_hook(M1, "done", "land");
        host.outcomes.insert("done".into(), CallbackOutcome::Terminate);

        let report = s.dispatch_channel(&mut host, "land", &[]);
        assert_eq!(report.terminated, vec![M1]);
        assert!(s.is_live(id));
    }

    #[test]
    fn hooks_created_during_dispatch_wait_for_next_one() {
        let mut s = scheduler();
        let mut host = TestHost::new();
        s.add_channel_hook(M1, "spawner", "enter");
        host.on("spawner", |s, _| {
            s.add_channel_hook(M1, "spawned", "enter");
        });

        s.dispatch_channel(&mut host, "enter", &[]);
        assert_eq!(host.functions(), ["spawner"]);

        host.calls.clear();
        s.dispatch_channel(&mut host, "enter", &[]);
        assert_eq!(host.functions(), ["spawner", "spawned"]);
    }

    #[test]
    fn once_hook_survives_reentrant_dispatch_of_its_channel() {
        let mut s = scheduler();
        let mut host = TestHost::new();
        let id = s.add_channel_hook(M1, "once", "enter");
        s.set_once(id, true);
        host.on("once", |s, host| {
            s.dispatch_channel(host, "enter", &[]);
        });

        s.dispatch_channel(&mut host, "enter", &[]);
        s.dispatch_channel(&mut host, "enter", &[]);
        assert_eq!(host.functions(), ["once"]);
        assert!(s.hook(id).is_none());
    }

    #[test]
    fn removal_during_dispatch_is_deferred_until_outermost_frame() {
        let mut s = scheduler();
        let mut host = TestHost::new();
        s.add_channel_hook(M1, "killer", "enter");
        let victim = s.add_channel_hook(M1, "victim", "enter");
        let seen_len = Rc::new(Cell::new(0));
        let seen = Rc::clone(&seen_len);
        host.on("killer", move |s, _| {
            s.remove(victim);
            seen.set(s.hook_count());
        });

        s.dispatch_channel(&mut host, "enter", &[]);
        assert_eq!(host.functions(), ["killer"]);
        assert_eq!(seen_len.get(), 2);
        assert_eq!(s.hook_count(), 1);
    }

    #[test]
    fn native_hooks_receive_params_and_can_reenter() {
        let mut s = scheduler();
        let mut host = TestHost::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        s.add_native_hook(
            move |s, host, args| {
                counter.set(counter.get() + 1);
                assert_eq!(args, [HookArg::Int(5)]);
                s.dispatch_channel(host, "inner", &[]);
                CallbackOutcome::Ok
            },
            "outer",
        );
        s.add_channel_hook(M1, "inner_cb", "inner");

        let report = s.dispatch_channel(&mut host, "outer", &[HookArg::Int(5)]);
        assert_eq!(hits.get(), 1);
        assert_eq!(report.fired, 1);
        assert_eq!(host.functions(), ["inner_cb"]);
    }

    //--- By Id ------------------------------------------------------------

    #[test]
    fn dispatch_by_id_ignores_channel() {
        let mut s = scheduler();
        let mut host = TestHost::new();
        s.add_channel_hook(M1, "other", "p_death");
        let id = s.add_channel_hook(M1, "target", "p_death");

        let report = s.dispatch_by_id(&mut host, id, &[HookArg::Id(3)]);
        assert_eq!(report.fired, 1);
        assert_eq!(host.functions(), ["target"]);
    }

    #[test]
    fn dispatch_by_id_skips_removed_hook() {
        let mut s = scheduler();
        let mut host = TestHost::new();
        let id = s.add_channel_hook(M1, "target", "enter");
        s.remove(id);

        assert_eq!(s.dispatch_by_id(&mut host, id, &[]).fired, 0);
    }

    //--- Timers -----------------------------------------------------------

    #[test]
    fn countdown_fires_once_when_expired() {
        let mut s = scheduler();
        let mut host = TestHost::new();
        let id = s.add_countdown_hook(M1, "beep", 1500.0);

        assert_eq!(s.dispatch_timer(&mut host, 1.0).fired, 0);
        assert_eq!(s.dispatch_timer(&mut host, 0.5).fired, 1);
        assert_eq!(s.dispatch_timer(&mut host, 5.0).fired, 0);
        assert!(s.hook(id).is_none());
    }

    #[test]
    fn claimed_countdown_fires_before_unclaimed() {
        let mut s = scheduler();
        let mut host = TestHost::new();
        s.add_countdown_hook(M1, "unclaimed", 100.0);
        s.add_countdown_hook(M2, "claimed", 100.0);

        let claim = s.claims_mut().create(true);
        s.claims_mut().add_system(claim, SystemId(1));
        assert!(!s.claims_mut().test(Some(claim)));
        s.claims_mut().activate(claim);
        host.claims.insert(M2, claim);

        assert_eq!(s.dispatch_timer(&mut host, 0.2).fired, 2);
        assert_eq!(host.functions(), ["claimed", "unclaimed"]);
    }

    #[test]
    fn claimed_calendar_hook_fires_before_unclaimed() {
        let mut s = scheduler();
        let mut host = TestHost::new();
        s.add_calendar_hook(M1, "unclaimed", 10);
        s.add_calendar_hook(M2, "claimed", 10);

        let claim = s.claims_mut().create(false);
        s.claims_mut().add_system(claim, SystemId(1));
        assert!(!s.claims_mut().test(Some(claim)));
        s.claims_mut().activate(claim);
        host.claims.insert(M2, claim);

        assert_eq!(s.dispatch_calendar(&mut host, 10).fired, 2);
        assert_eq!(host.functions(), ["claimed", "unclaimed"]);
    }

    #[test]
    fn countdown_ignores_channel_dispatch() {
        let mut s = scheduler();
        let mut host = TestHost::new();
        s.add_countdown_hook(M1, "beep", 10.0);

        assert_eq!(s.dispatch_channel(&mut host, "timer", &[]).fired, 0);
    }

    #[test]
    fn calendar_keeps_residual() {
        let mut s = scheduler();
        let mut host = TestHost::new();
        let id = s.add_calendar_hook(M1, "tick", 100);

        for _ in 0..3 {
            s.dispatch_calendar(&mut host, 40);
        }
        assert_eq!(host.calls.len(), 1);
        assert_eq!(
            s.hook(id).unwrap().trigger(),
            Trigger::Calendar { resolution: 100, accumulated: 20 }
        );
    }

    #[test]
    fn claim_made_by_callback_is_in_force_after_dispatch() {
        let mut s = scheduler();
        let mut host = TestHost::new();
        s.add_channel_hook(M1, "start_plot", "enter");
        host.on("start_plot", |s, _| {
            let claim = s.claims_mut().create(true);
            s.claims_mut().add_system(claim, SystemId(4));
            if !s.claims_mut().test(Some(claim)) {
                s.claims_mut().activate(claim);
            }
        });

        s.dispatch_channel(&mut host, "enter", &[]);
        assert!(s.claims().system_state(SystemId(4)).exclusive);
    }
}
