//=========================================================================
// Persistence
//=========================================================================
//
// Converts live scheduler state to and from a `SchedulerDocument`.
//
// Save:
//   live script hooks
//     → skip native / volatile channel / events that don't save
//     → SavedHook
//   active claims → SavedClaim
//
// Load:
//   reserve every saved id
//     → add_* (fresh id) → move to saved id → restore arg / timing
//     → release reservations
//   claims inserted under their saved ids → one activate_all()
//
// Reserving first means a fresh id handed out mid-load can never be one
// that a later entry still needs.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashSet;

use log::{debug, info, warn};

//=== Internal Dependencies ===============================================

use crate::core::claim::{Claim, ClaimId};
use crate::core::error::{PersistError, SchedulerError};
use crate::core::hook::{Hook, HookId, Trigger};
use crate::core::host::{ParentKind, ParentRef, ScriptHost};
use crate::scheduler::Scheduler;

//=== Module Declarations =================================================

mod document;

//=== Public API ==========================================================

pub use document::{LoadReport, SavedClaim, SavedHook, SchedulerDocument, DOCUMENT_VERSION};

//=== Scheduler Integration ===============================================

impl Scheduler {
    //--- Save -------------------------------------------------------------

    /// Captures every saveable hook and every active claim.
    pub fn save(&self, host: &dyn ScriptHost) -> SchedulerDocument {
        let hooks: Vec<SavedHook> = self
            .hooks
            .iter()
            .filter(|hook| self.is_saveable(host, hook))
            .filter_map(saved_hook)
            .collect();

        let claims: Vec<SavedClaim> = self
            .claims
            .active_claims()
            .map(|(id, claim)| SavedClaim {
                id: id.get(),
                exclusive: claim.is_exclusive(),
                systems: claim.systems().to_vec(),
                tags: claim.tags().to_vec(),
            })
            .collect();

        info!("Saved {} hooks and {} claims", hooks.len(), claims.len());
        SchedulerDocument {
            version: document::DOCUMENT_VERSION,
            hooks,
            claims,
        }
    }

    /// [`save`](Self::save) rendered as JSON.
    pub fn save_json(&self, host: &dyn ScriptHost) -> Result<String, PersistError> {
        Ok(serde_json::to_string(&self.save(host))?)
    }

    fn is_saveable(&self, host: &dyn ScriptHost, hook: &Hook) -> bool {
        let Some(parent) = hook.parent().script() else {
            return false;
        };
        if !hook.is_live() || self.is_volatile(hook.channel()) {
            return false;
        }
        match parent {
            ParentRef::Mission(_) => true,
            ParentRef::Event(id) => host.event_saves(id),
        }
    }

    //--- Load -------------------------------------------------------------

    /// Restores hooks and claims from `doc` on top of the current state.
    ///
    /// Malformed entries are skipped with a warning. Only a document of an
    /// unsupported version fails as a whole, before anything is touched.
    pub fn load(&mut self, doc: SchedulerDocument) -> Result<LoadReport, PersistError> {
        if doc.version != document::DOCUMENT_VERSION {
            return Err(PersistError::UnsupportedVersion {
                found: doc.version,
                expected: document::DOCUMENT_VERSION,
            });
        }

        let mut report = LoadReport::default();

        self.hooks
            .reserve(doc.hooks.iter().filter_map(|saved| HookId::new(saved.id)));
        let mut seen = HashSet::with_capacity(doc.hooks.len());
        for saved in &doc.hooks {
            match self.restore_hook(saved, &mut seen) {
                Some(true) => report.hooks_restored += 1,
                Some(false) => {
                    report.hooks_restored += 1;
                    report.hooks_renumbered += 1;
                }
                None => report.hooks_skipped += 1,
            }
        }
        self.hooks.release_reserved();

        for saved in &doc.claims {
            let mut claim = Claim::new(saved.exclusive);
            claim.systems = saved.systems.clone();
            claim.tags = saved.tags.clone();
            if self.claims.insert_restored(ClaimId(saved.id), claim) {
                report.claims_restored += 1;
            } else {
                warn!("Saved claim#{} is already registered, skipping it", saved.id);
                report.claims_skipped += 1;
            }
        }
        self.claims.activate_all();

        info!(
            "Loaded {} hooks ({} skipped) and {} claims",
            report.hooks_restored, report.hooks_skipped, report.claims_restored
        );
        Ok(report)
    }

    /// Parses JSON and [`load`](Self::load)s it.
    pub fn load_json(&mut self, json: &str) -> Result<LoadReport, PersistError> {
        let doc: SchedulerDocument = serde_json::from_str(json)?;
        self.load(doc)
    }

    /// Some(true) kept its saved id, Some(false) had to be renumbered.
    fn restore_hook(&mut self, saved: &SavedHook, seen: &mut HashSet<HookId>) -> Option<bool> {
        let Some(wanted) = HookId::new(saved.id).filter(|id| !seen.contains(id)) else {
            warn!("{}", SchedulerError::InvalidPersistedId { id: saved.id });
            return None;
        };
        let kind = match saved.parent_kind.parse::<ParentKind>() {
            Ok(kind) => kind,
            Err(kind) => {
                warn!(
                    "{}",
                    SchedulerError::UnknownPersistedHookType { id: saved.id, kind }
                );
                return None;
            }
        };
        seen.insert(wanted);

        let parent = ParentRef::from_parts(kind, saved.parent_id);
        let fresh = match (saved.resolution, saved.remaining_ms) {
            (Some(resolution), _) => {
                self.add_calendar_hook(parent, &saved.function, resolution)
            }
            (None, Some(remaining_ms)) => {
                self.add_countdown_hook(parent, &saved.function, remaining_ms)
            }
            (None, None) => self.add_channel_hook(parent, &saved.function, &saved.channel),
        };

        let kept = self.hooks.reassign_id(fresh, wanted);
        let id = if kept {
            wanted
        } else {
            warn!(
                "Saved hook id {} is already in use, restoring it as {}",
                wanted, fresh
            );
            fresh
        };

        if let Some(hook) = self.hooks.get_mut(id) {
            hook.arg = saved.arg.clone();
            hook.once |= saved.once;
            if let (Trigger::Calendar { resolution, accumulated }, Some(saved_acc)) =
                (&mut hook.trigger, saved.accumulated)
            {
                *accumulated = saved_acc % *resolution;
            }
        }
        debug!("Restored hook {} for {}", id, parent);
        Some(kept)
    }
}

//--- Helpers --------------------------------------------------------------

fn saved_hook(hook: &Hook) -> Option<SavedHook> {
    let parent = hook.parent().script()?;
    let (resolution, accumulated, remaining_ms) = match hook.trigger() {
        Trigger::Channel => (None, None, None),
        Trigger::Countdown { remaining_ms } => (None, None, Some(remaining_ms)),
        Trigger::Calendar { resolution, accumulated } => {
            (Some(resolution), Some(accumulated), None)
        }
    };

    Some(SavedHook {
        id: hook.id().get(),
        channel: hook.channel().to_owned(),
        parent_kind: parent.kind().as_str().to_owned(),
        parent_id: parent.id(),
        function: hook.function().to_owned(),
        once: hook.is_once(),
        resolution,
        accumulated,
        remaining_ms,
        arg: hook.arg().cloned(),
    })
}

//=========================================================================
// Unit Tests
//=========================================================================
