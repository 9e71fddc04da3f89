//=========================================================================
// Claim System
//=========================================================================
//
// Reservations of shared world resources by narrative scripts.
//
// Architecture:
//   ClaimRegistry
//     ├─ claims: BTreeMap<ClaimId, Claim>
//     ├─ systems: per-system exclusive holders + soft count
//     └─ tags: global claimed-tag multiset
//
// No dependency on the hook scheduler.
//
//=========================================================================

//=== Module Declarations =================================================

mod registry;
mod types;

//=== Public API ==========================================================

pub use registry::ClaimRegistry;
pub use types::{Claim, ClaimId, SystemClaimState, SystemId};
