//=========================================================================
// Claim Registry
//=========================================================================
//
// Tracks which systems and tag strings narrative scripts have reserved.
//
// Architecture:
//   ClaimRegistry
//     ├─ claims:  BTreeMap<ClaimId, Claim>         (owned reservations)
//     ├─ systems: HashMap<SystemId, SystemTally>   (claim-derived world state)
//     └─ tags:    HashMap<String, usize>           (claimed tag multiset)
//
// Protocol: create → add_* → test → activate → ... → destroy
//
// Exclusivity rules:
//   exclusive claim  collides with any exclusive holder or soft count > 0
//   soft claim       collides only with an exclusive holder
//   tags             always exclusive, regardless of claim kind
//
// test() and activate() are not one atomic step. That is only sound
// because every caller runs on the single scheduler thread.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use super::types::{Claim, ClaimId, SystemClaimState, SystemId};

//=== SystemTally =========================================================

/// Raw counters behind [`SystemClaimState`].
///
/// Exclusive holders are counted rather than flagged so destroy can undo
/// exactly what activate did, even when duplicates were reserved.
#[derive(Debug, Clone, Copy, Default)]
struct SystemTally {
    exclusive: u32,
    soft: u32,
}

impl SystemTally {
    fn is_clear(&self) -> bool {
        self.exclusive == 0 && self.soft == 0
    }
}

//=== ClaimRegistry =======================================================

/// Owner of every claim and of the shared claim state they derive.
#[derive(Debug, Default)]
pub struct ClaimRegistry {
    claims: BTreeMap<ClaimId, Claim>,
    systems: HashMap<SystemId, SystemTally>,
    tags: HashMap<String, usize>,
    /// Claims whose last `test()` found no collision and that haven't
    /// changed since.
    verified: HashSet<ClaimId>,
    next_id: u64,
}

impl ClaimRegistry {
    //--- Construction -----------------------------------------------------

    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an inactive claim.
    pub fn create(&mut self, exclusive: bool) -> ClaimId {
        self.next_id += 1;
        let id = ClaimId(self.next_id);
        self.claims.insert(id, Claim::new(exclusive));
        debug!("Created {} (exclusive: {})", id, exclusive);
        id
    }

    //--- Building ---------------------------------------------------------

    /// Reserves a system. Each call adds one unit of reservation.
    ///
    /// # Panics
    ///
    /// Panics if the claim is unknown or already active.
    pub fn add_system(&mut self, claim: ClaimId, system: SystemId) {
        self.building(claim).systems.push(system);
        self.verified.remove(&claim);
    }

    /// Reserves an opaque tag string.
    ///
    /// # Panics
    ///
    /// Panics if the claim is unknown or already active.
    pub fn add_tag(&mut self, claim: ClaimId, tag: impl Into<String>) {
        self.building(claim).tags.push(tag.into());
        self.verified.remove(&claim);
    }

    //--- Queries ----------------------------------------------------------

    /// True if there is no claim or it reserves no systems.
    pub fn is_empty(&self, claim: Option<ClaimId>) -> bool {
        self.lookup(claim).map_or(true, Claim::is_empty)
    }

    /// Returns true if activating the claim would collide.
    ///
    /// Leaves the claim and the shared claim state untouched. The registry
    /// only notes a collision-free result so a following `activate()` is
    /// allowed; that note is the sole reason this takes `&mut self`.
    pub fn test(&mut self, claim: Option<ClaimId>) -> bool {
        let Some(id) = claim else {
            return false;
        };
        let Some(record) = self.claims.get(&id) else {
            warn!("Testing unknown {}, treating it as empty", id);
            return false;
        };

        let collides = self.collides(record);
        if collides {
            self.verified.remove(&id);
        } else {
            self.verified.insert(id);
        }
        collides
    }

    /// Whether the claim itself reserves `system`.
    pub fn test_system(&self, claim: Option<ClaimId>, system: SystemId) -> bool {
        self.lookup(claim).is_some_and(|c| c.holds_system(system))
    }

    /// Whether the claim itself reserves `tag`.
    pub fn test_tag(&self, claim: Option<ClaimId>, tag: &str) -> bool {
        self.lookup(claim).is_some_and(|c| c.holds_tag(tag))
    }

    pub fn claim(&self, claim: ClaimId) -> Option<&Claim> {
        self.claims.get(&claim)
    }

    /// Claim-derived state of a system.
    pub fn system_state(&self, system: SystemId) -> SystemClaimState {
        let tally = self.systems.get(&system).copied().unwrap_or_default();
        SystemClaimState {
            exclusive: tally.exclusive > 0,
            soft_count: tally.soft,
        }
    }

    /// Whether any active claim holds `tag`.
    pub fn is_tag_claimed(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    /// Number of claims, active or not.
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Ids of all active claims in ascending order.
    pub fn active_claims(&self) -> impl Iterator<Item = (ClaimId, &Claim)> + '_ {
        self.claims
            .iter()
            .filter(|(_, c)| c.active)
            .map(|(&id, c)| (id, c))
    }

    //--- Commit -----------------------------------------------------------

    /// Commits the claim into shared state.
    ///
    /// # Panics
    ///
    /// Panics if the claim is unknown, already active, or has not passed a
    /// collision-free `test()` since it was last modified.
    pub fn activate(&mut self, claim: ClaimId) {
        let verified = self.verified.contains(&claim);
        let Some(record) = self.claims.get_mut(&claim) else {
            panic!("Activating unknown {}", claim);
        };
        assert!(!record.active, "{} is already active", claim);
        assert!(
            verified,
            "{} must pass test() without collision before activation",
            claim
        );

        record.active = true;
        let record = record.clone();
        self.apply(&record);
        debug!(
            "Activated {} ({} systems, {} tags)",
            claim,
            record.systems.len(),
            record.tags.len()
        );
    }

    /// Releases the claim, undoing its activation if it was active.
    pub fn destroy(&mut self, claim: ClaimId) {
        let Some(record) = self.claims.remove(&claim) else {
            warn!("Destroying unknown {}", claim);
            return;
        };
        self.verified.remove(&claim);
        if record.active {
            self.unapply(&record);
        }
        debug!("Destroyed {} (was active: {})", claim, record.active);
    }

    //--- Bulk Operations --------------------------------------------------

    /// Zeroes every system's exclusive flag and soft count and empties
    /// the claimed-tag set.
    ///
    /// Registered claims keep their active flag, so `activate_all()`
    /// re-asserts them afterwards. Used when a new game starts.
    pub fn clear_all(&mut self) {
        self.systems.clear();
        self.tags.clear();
        debug!("Cleared all shared claim state");
    }

    /// Re-derives shared state from every active claim.
    ///
    /// Call once after a batch of claims was restored. Claims that are
    /// meant to coexist never see each other as collisions this way.
    pub fn activate_all(&mut self) {
        self.systems.clear();
        self.tags.clear();

        let active: Vec<Claim> = self.claims.values().filter(|c| c.active).cloned().collect();
        for record in &active {
            self.apply(record);
        }
    }

    /// Drops every claim and all shared state.
    pub(crate) fn reset(&mut self) {
        self.claims.clear();
        self.systems.clear();
        self.tags.clear();
        self.verified.clear();
        self.next_id = 0;
    }

    /// Inserts an already-committed claim under a fixed id.
    ///
    /// Shared state is not updated; call `activate_all()` afterwards.
    /// Returns false if the id is taken.
    pub(crate) fn insert_restored(&mut self, id: ClaimId, mut claim: Claim) -> bool {
        if self.claims.contains_key(&id) {
            return false;
        }
        claim.active = true;
        self.next_id = self.next_id.max(id.0);
        self.claims.insert(id, claim);
        true
    }

    //--- Internal Helpers -------------------------------------------------

    fn lookup(&self, claim: Option<ClaimId>) -> Option<&Claim> {
        claim.and_then(|id| self.claims.get(&id))
    }

    fn building(&mut self, claim: ClaimId) -> &mut Claim {
        let Some(record) = self.claims.get_mut(&claim) else {
            panic!("Adding to unknown {}", claim);
        };
        assert!(!record.active, "Cannot add to {} once it is active", claim);
        record
    }

    fn collides(&self, record: &Claim) -> bool {
        let system_hit = record.systems.iter().any(|system| {
            let state = self.system_state(*system);
            if record.exclusive {
                state.exclusive || state.soft_count > 0
            } else {
                state.exclusive
            }
        });

        system_hit || record.tags.iter().any(|tag| self.tags.contains_key(tag))
    }

    fn apply(&mut self, record: &Claim) {
        for system in &record.systems {
            let tally = self.systems.entry(*system).or_default();
            if record.exclusive {
                tally.exclusive += 1;
            } else {
                tally.soft += 1;
            }
        }
        for tag in &record.tags {
            *self.tags.entry(tag.clone()).or_insert(0) += 1;
        }
    }

    fn unapply(&mut self, record: &Claim) {
        for system in &record.systems {
            if let Some(tally) = self.systems.get_mut(system) {
                if record.exclusive {
                    tally.exclusive = tally.exclusive.saturating_sub(1);
                } else {
                    tally.soft = tally.soft.saturating_sub(1);
                }
                if tally.is_clear() {
                    self.systems.remove(system);
                }
            }
        }
        for tag in &record.tags {
            if let Some(count) = self.tags.get_mut(tag) {
                *count -= 1;
                if *count == 0 {
                    self.tags.remove(tag);
                }
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
