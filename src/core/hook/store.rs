//=========================================================================
// Hook Store
//=========================================================================
//
// Arena of hook records addressed by stable ids.
//
// Hooks live in a Vec in registration order with an id → slot index.
// Removal only marks a hook; slots are compacted by `sweep()`, which the
// scheduler calls only when no dispatch frame is running. Slot indices
// therefore stay valid for the whole of any dispatch.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::{HashMap, HashSet};

use log::debug;

//=== Internal Dependencies ===============================================

use super::types::{Hook, HookId, HookParent, Trigger};
use crate::core::host::{HookArg, ParentRef};

//=== HookStore ===========================================================

/// Owns every hook, live or pending deletion.
#[derive(Debug, Default)]
pub struct HookStore {
    hooks: Vec<Hook>,
    index: HashMap<HookId, usize>,
    next_id: u64,
    /// Ids set aside for hooks that are being restored.
    reserved: HashSet<HookId>,
}

impl HookStore {
    //--- Construction -----------------------------------------------------

    pub fn new() -> Self {
        Self::default()
    }

    //--- Registration -----------------------------------------------------

    /// Stores a new hook under a freshly generated id.
    pub(crate) fn insert(
        &mut self,
        channel: &str,
        parent: HookParent,
        function: &str,
        trigger: Trigger,
        once: bool,
    ) -> HookId {
        let id = self.generate_id();
        self.index.insert(id, self.hooks.len());
        self.hooks.push(Hook {
            id,
            channel: channel.to_owned(),
            parent,
            function: function.to_owned(),
            trigger,
            once,
            pending_delete: false,
            arg: None,
        });
        debug!("Registered hook {} on '{}' -> '{}'", id, channel, function);
        id
    }

    /// Next unused id. Skips ids held by any stored hook or reserved for
    /// a restore in progress.
    fn generate_id(&mut self) -> HookId {
        loop {
            self.next_id = self.next_id.wrapping_add(1);
            let Some(id) = HookId::new(self.next_id) else {
                continue;
            };
            if !self.index.contains_key(&id) && !self.reserved.contains(&id) {
                return id;
            }
        }
    }

    //--- Lookup -----------------------------------------------------------

    pub fn get(&self, id: HookId) -> Option<&Hook> {
        self.index.get(&id).map(|&slot| &self.hooks[slot])
    }

    pub(crate) fn get_mut(&mut self, id: HookId) -> Option<&mut Hook> {
        match self.index.get(&id) {
            Some(&slot) => Some(&mut self.hooks[slot]),
            None => None,
        }
    }

    /// Whether the hook exists and isn't marked for deletion.
    pub fn is_live(&self, id: HookId) -> bool {
        self.get(id).is_some_and(Hook::is_live)
    }

    /// All stored hooks in storage order, including pending deletions.
    pub fn iter(&self) -> impl Iterator<Item = &Hook> + '_ {
        self.hooks.iter()
    }

    /// Ids of live hooks matching `filter`, in storage order.
    pub(crate) fn live_ids<F>(&self, mut filter: F) -> Vec<HookId>
    where
        F: FnMut(&Hook) -> bool,
    {
        self.hooks
            .iter()
            .filter(|h| h.is_live() && filter(h))
            .map(|h| h.id)
            .collect()
    }

    /// Number of stored hooks, including pending deletions.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    //--- Mutation ---------------------------------------------------------

    pub(crate) fn set_arg(&mut self, id: HookId, arg: Option<HookArg>) -> bool {
        match self.get_mut(id) {
            Some(hook) if hook.is_live() => {
                hook.arg = arg;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn set_once(&mut self, id: HookId, once: bool) -> bool {
        match self.get_mut(id) {
            Some(hook) if hook.is_live() => {
                hook.once = once;
                true
            }
            _ => false,
        }
    }

    /// Marks a hook for deletion. Returns true if it was live.
    pub(crate) fn remove(&mut self, id: HookId) -> bool {
        match self.get_mut(id) {
            Some(hook) if hook.is_live() => {
                hook.pending_delete = true;
                debug!("Hook {} marked for removal", id);
                true
            }
            _ => false,
        }
    }

    /// Marks every hook of `parent` for deletion.
    pub(crate) fn remove_all_for_parent(&mut self, parent: ParentRef) -> usize {
        let mut removed = 0;
        for hook in self.hooks.iter_mut() {
            if hook.is_live() && hook.belongs_to(parent) {
                hook.pending_delete = true;
                removed += 1;
            }
        }
        if removed > 0 {
            debug!("Marked {} hooks of {} for removal", removed, parent);
        }
        removed
    }

    /// Live hooks owned by `parent`.
    pub fn count_for_parent(&self, parent: ParentRef) -> usize {
        self.hooks
            .iter()
            .filter(|h| h.is_live() && h.belongs_to(parent))
            .count()
    }

    //--- Sweeping ---------------------------------------------------------

    /// Physically drops every hook marked for deletion.
    ///
    /// Must only run while no dispatch frame is active.
    pub(crate) fn sweep(&mut self) -> usize {
        let before = self.hooks.len();
        self.hooks.retain(|h| h.is_live());
        let swept = before - self.hooks.len();

        if swept > 0 {
            self.rebuild_index();
            debug!("Swept {} hooks ({} remain)", swept, self.hooks.len());
        }
        swept
    }

    /// Drops everything and restarts id generation.
    pub(crate) fn clear(&mut self) {
        self.hooks.clear();
        self.index.clear();
        self.reserved.clear();
        self.next_id = 0;
    }

    //--- Restore Support --------------------------------------------------

    /// Sets aside ids so generation can't hand them out.
    pub(crate) fn reserve(&mut self, ids: impl IntoIterator<Item = HookId>) {
        self.reserved.extend(ids);
    }

    pub(crate) fn release_reserved(&mut self) {
        self.reserved.clear();
    }

    /// Moves a hook to a new id. Fails if `to` is already stored.
    pub(crate) fn reassign_id(&mut self, from: HookId, to: HookId) -> bool {
        if from == to {
            return self.index.contains_key(&from);
        }
        if self.index.contains_key(&to) {
            return false;
        }
        let Some(slot) = self.index.remove(&from) else {
            return false;
        };

        self.hooks[slot].id = to;
        self.index.insert(to, slot);
        self.next_id = self.next_id.max(to.get());
        true
    }

    //--- Internal Helpers -------------------------------------------------

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (slot, hook) in self.hooks.iter().enumerate() {
            self.index.insert(hook.id, slot);
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
