//=========================================================================
// Claim Registry Properties
//=========================================================================
//
// Exclusivity, stacking and tag rules checked over generated claims.
//
//=========================================================================

mod common;

use aetheric_scheduler::prelude::*;
use common::try_claim;
use proptest::prelude::*;

proptest! {
    /// An active exclusive claim blocks every other claim on its system,
    /// and destroying it frees the system again.
    #[test]
    fn exclusive_claim_blocks_until_destroyed(
        system in 0u32..50,
        other_exclusive in any::<bool>(),
    ) {
        let mut claims = ClaimRegistry::new();
        let owner = try_claim(&mut claims, true, &[system], &[]);
        prop_assert!(owner.is_some());

        let probe = claims.create(other_exclusive);
        claims.add_system(probe, SystemId(system));
        prop_assert!(claims.test(Some(probe)));

        claims.destroy(owner.unwrap());
        prop_assert!(!claims.test(Some(probe)));
    }

    /// Any number of soft claims share a system; an exclusive one can't
    /// join them.
    #[test]
    fn soft_claims_stack(system in 0u32..50, holders in 1usize..6) {
        let mut claims = ClaimRegistry::new();
        for _ in 0..holders {
            prop_assert!(try_claim(&mut claims, false, &[system], &[]).is_some());
        }

        let state = claims.system_state(SystemId(system));
        prop_assert_eq!(state.soft_count as usize, holders);
        prop_assert!(!state.exclusive);
        prop_assert!(try_claim(&mut claims, true, &[system], &[]).is_none());
    }

    /// Tags are exclusive no matter what kind of claim holds them.
    #[test]
    fn tags_never_shared(first_exclusive in any::<bool>(), second_exclusive in any::<bool>()) {
        let mut claims = ClaimRegistry::new();

        let first = claims.create(first_exclusive);
        claims.add_tag(first, "T");
        let second = claims.create(second_exclusive);
        claims.add_tag(second, "T");

        prop_assert!(!claims.test(Some(first)));
        prop_assert!(!claims.test(Some(second)));

        claims.activate(first);
        prop_assert!(claims.test(Some(second)));
    }

    /// Destroying every claim in any order leaves no trace.
    #[test]
    fn destroy_restores_clear_state(
        specs in prop::collection::vec((any::<bool>(), prop::collection::vec(0u32..8, 1..4)), 1..8),
    ) {
        let mut claims = ClaimRegistry::new();
        let mut active = Vec::new();
        for (exclusive, systems) in &specs {
            if let Some(id) = try_claim(&mut claims, *exclusive, systems, &[]) {
                active.push(id);
            }
        }

        for id in active.into_iter().rev() {
            claims.destroy(id);
        }
        for system in 0..8 {
            prop_assert_eq!(claims.system_state(SystemId(system)), SystemClaimState::default());
        }
        prop_assert_eq!(claims.len(), 0);
    }

    /// Re-deriving shared state gives the same answer as incremental
    /// activation.
    #[test]
    fn activate_all_matches_incremental_state(
        specs in prop::collection::vec((any::<bool>(), prop::collection::vec(0u32..8, 1..4)), 1..8),
    ) {
        let mut claims = ClaimRegistry::new();
        for (exclusive, systems) in &specs {
            try_claim(&mut claims, *exclusive, systems, &[]);
        }

        let before: Vec<_> = (0..8).map(|s| claims.system_state(SystemId(s))).collect();
        claims.activate_all();
        let after: Vec<_> = (0..8).map(|s| claims.system_state(SystemId(s))).collect();
        prop_assert_eq!(before, after);
    }
}

#[test]
fn soft_reservation_blocks_new_exclusive_but_not_existing_soft() {
    let mut claims = ClaimRegistry::new();
    let soft = try_claim(&mut claims, false, &[3], &[]).unwrap();

    assert!(try_claim(&mut claims, true, &[3], &[]).is_none());
    assert!(claims.claim(soft).is_some_and(|c| c.is_active()));
}

#[test]
fn clear_all_then_activate_all_reasserts_registered_claims() {
    let mut claims = ClaimRegistry::new();
    let claim = try_claim(&mut claims, true, &[4], &["relic"]).unwrap();

    claims.clear_all();
    assert!(!claims.system_state(SystemId(4)).exclusive);
    assert!(!claims.is_tag_claimed("relic"));

    claims.activate_all();
    assert!(claims.claim(claim).is_some_and(|c| c.is_active()));
    assert!(claims.system_state(SystemId(4)).exclusive);
    assert!(claims.is_tag_claimed("relic"));
}
