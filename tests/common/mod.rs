//=========================================================================
// Shared Test Support
//=========================================================================

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use aetheric_scheduler::prelude::*;

/// Installs a test logger once per binary.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Callback run by [`RecordingHost`] when a function is invoked.
pub type Reaction = Box<dyn FnMut(&mut Scheduler, &mut RecordingHost)>;

/// Script host double that records what was invoked.
pub struct RecordingHost {
    pub system: Option<SystemId>,
    pub log: Vec<(ParentRef, String, Vec<HookArg>)>,
    pub gone: HashSet<ParentRef>,
    pub claims: HashMap<ParentRef, ClaimId>,
    pub reactions: HashMap<String, Reaction>,
    pub quiet_events: HashSet<u64>,
}

impl RecordingHost {
    pub fn in_system(system: u32) -> Self {
        Self {
            system: Some(SystemId(system)),
            log: Vec::new(),
            gone: HashSet::new(),
            claims: HashMap::new(),
            reactions: HashMap::new(),
            quiet_events: HashSet::new(),
        }
    }

    pub fn functions(&self) -> Vec<String> {
        self.log.iter().map(|(_, f, _)| f.clone()).collect()
    }

    pub fn on<F>(&mut self, function: &str, reaction: F)
    where
        F: FnMut(&mut Scheduler, &mut RecordingHost) + 'static,
    {
        self.reactions.insert(function.to_owned(), Box::new(reaction));
    }
}

impl ScriptHost for RecordingHost {
    fn invoke(&mut self, scheduler: &mut Scheduler, call: HookCall<'_>) -> CallbackOutcome {
        self.log
            .push((call.parent, call.function.to_owned(), call.args.to_vec()));
        if let Some(mut reaction) = self.reactions.remove(call.function) {
            reaction(scheduler, self);
            self.reactions.insert(call.function.to_owned(), reaction);
        }
        CallbackOutcome::Ok
    }

    fn parent_exists(&self, parent: ParentRef) -> bool {
        !self.gone.contains(&parent)
    }

    fn parent_claim(&self, parent: ParentRef) -> Option<ClaimId> {
        self.claims.get(&parent).copied()
    }

    fn current_system(&self) -> Option<SystemId> {
        self.system
    }

    fn event_saves(&self, event: u64) -> bool {
        !self.quiet_events.contains(&event)
    }
}

/// Creates, tests and activates a claim. Returns None on collision.
pub fn try_claim(
    claims: &mut ClaimRegistry,
    exclusive: bool,
    systems: &[u32],
    tags: &[&str],
) -> Option<ClaimId> {
    let claim = claims.create(exclusive);
    for &system in systems {
        claims.add_system(claim, SystemId(system));
    }
    for tag in tags {
        claims.add_tag(claim, *tag);
    }
    if claims.test(Some(claim)) {
        claims.destroy(claim);
        return None;
    }
    claims.activate(claim);
    Some(claim)
}
