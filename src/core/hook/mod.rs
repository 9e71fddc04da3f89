//=========================================================================
// Hook System
//=========================================================================
//
// Registered reactions to channels, countdowns and calendar time.
//
// Architecture:
//   HookStore
//     ├─ hooks: Vec<Hook>            (storage order = dispatch order)
//     └─ index: HashMap<HookId, usize>
//
// Lifecycle:
//   insert() → live → remove() → pending_delete → sweep() → gone
//
//=========================================================================

//=== Module Declarations =================================================

mod store;
mod types;

//=== Public API ==========================================================

pub use store::HookStore;
pub use types::{Hook, HookId, HookParent, NativeCallback, NativeFn, Trigger};
