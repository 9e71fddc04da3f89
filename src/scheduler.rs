//=========================================================================
// Aetheric Scheduler
//
// Owning context for hooks, claims and the exclusion window.
//
// Architecture:
// ```text
//     SchedulerBuilder  ──build()──>  Scheduler
//         │                              │
//         ├─ with_volatile_channels()    ├─ add_*_hook() / remove()
//         ├─ with_volatile_prefix()      ├─ dispatch_*() / update()
//         ├─ with_deferred_capacity()    ├─ begin/end_exclusion()
//         └─ with_max_deferred_...()     ├─ claims_mut()
//                                        └─ save() / load()
// ```
//
// Dispatch, exclusion, deferred dispatch and persistence are implemented
// in their own `core` modules as further `impl Scheduler` blocks.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

//=== Internal Dependencies ===============================================

use crate::core::claim::ClaimRegistry;
use crate::core::deferred::DeferredInbox;
use crate::core::exclusion::ExclusionQueue;
use crate::core::hook::{Hook, HookId, HookParent, HookStore, NativeCallback, Trigger};
use crate::core::host::{CallbackOutcome, HookArg, ParentRef, ScriptHost};

//=== Constants ===========================================================

/// Pseudo-channel of countdown hooks.
pub const TIMER_CHANNEL: &str = "timer";

/// Pseudo-channel of calendar hooks.
pub const DATE_CHANNEL: &str = "date";

//=== SchedulerConfig =====================================================

/// Tunables of a [`Scheduler`].
///
/// Deserializable so a game can keep these in its own settings file;
/// missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Channels whose hooks are never saved.
    pub volatile_channels: Vec<String>,

    /// Channel prefixes whose hooks are never saved.
    pub volatile_prefixes: Vec<String>,

    /// Deferred dispatches that may wait for the next update.
    pub deferred_capacity: usize,

    /// Deferred dispatches drained by a single update.
    pub max_deferred_per_frame: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        let volatile = [
            TIMER_CHANNEL,
            "end",
            "p_death",
            "p_board",
            "p_disable",
            "p_jump",
            "p_attacked",
            "p_idle",
        ];
        Self {
            volatile_channels: volatile.iter().map(|c| c.to_string()).collect(),
            volatile_prefixes: Vec::new(),
            deferred_capacity: 256,
            max_deferred_per_frame: 100,
        }
    }
}

//=== SchedulerBuilder ====================================================

/// Builder for configuring and constructing a [`Scheduler`].
///
/// # Default Values
///
/// - **Volatile channels**: `timer`, `end` and the per-pilot `p_*` channels
/// - **Deferred capacity**: 256 dispatches
/// - **Deferred drained per frame**: 100
///
/// # Examples
///
/// ```
/// use aetheric_scheduler::SchedulerBuilder;
///
/// let scheduler = SchedulerBuilder::new()
///     .with_volatile_prefix("tmp_")     // Scratch channels
///     .with_max_deferred_per_frame(32)  // Smaller frame budget
///     .build();
///
/// assert!(scheduler.is_volatile("tmp_scan"));
/// assert!(!scheduler.is_volatile("land"));
/// ```
pub struct SchedulerBuilder {
    config: SchedulerConfig,
}

impl SchedulerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
        }
    }

    /// Starts from a loaded configuration.
    ///
    /// # Panics
    ///
    /// Panics if the capacity or the per-frame limit is zero.
    pub fn from_config(config: SchedulerConfig) -> Self {
        Self::new()
            .with_deferred_capacity(config.deferred_capacity)
            .with_max_deferred_per_frame(config.max_deferred_per_frame)
            .with_volatile_channels(config.volatile_channels)
            .with_volatile_prefixes(config.volatile_prefixes)
    }

    /// Replaces the list of channels that are never saved.
    pub fn with_volatile_channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.volatile_channels = channels.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a channel prefix whose hooks are never saved.
    pub fn with_volatile_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.volatile_prefixes.push(prefix.into());
        self
    }

    fn with_volatile_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.config.volatile_prefixes = prefixes;
        self
    }

    /// Sets how many deferred dispatches may wait for the next update.
    ///
    /// Default: 256
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_deferred_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Deferred capacity must be positive");
        self.config.deferred_capacity = capacity;
        self
    }

    /// Sets how many deferred dispatches one update drains.
    ///
    /// Default: 100
    ///
    /// # Panics
    ///
    /// Panics if `limit == 0`.
    pub fn with_max_deferred_per_frame(mut self, limit: usize) -> Self {
        assert!(limit > 0, "Per-frame deferred limit must be positive");
        self.config.max_deferred_per_frame = limit;
        self
    }

    /// Builds the scheduler instance.
    pub fn build(self) -> Scheduler {
        let config = self.config;
        info!(
            "Scheduler ready ({} volatile channels, {} volatile prefixes, deferred {}/{} per frame)",
            config.volatile_channels.len(),
            config.volatile_prefixes.len(),
            config.max_deferred_per_frame,
            config.deferred_capacity
        );

        Scheduler {
            hooks: HookStore::new(),
            claims: ClaimRegistry::new(),
            exclusion: ExclusionQueue::new(),
            inbox: DeferredInbox::new(config.deferred_capacity, config.max_deferred_per_frame),
            depth: 0,
            config,
        }
    }
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== Scheduler ===========================================================

/// One game session's hooks and claims.
///
/// Everything runs on the thread that owns the scheduler. Callbacks get
/// it back as `&mut Scheduler` and may register, remove or dispatch
/// re-entrantly; the only cross-thread entry point is a
/// [`DeferredSender`](crate::core::deferred::DeferredSender).
#[derive(Debug)]
pub struct Scheduler {
    pub(crate) hooks: HookStore,
    pub(crate) claims: ClaimRegistry,
    pub(crate) exclusion: ExclusionQueue,
    pub(crate) inbox: DeferredInbox,
    /// Dispatch frames currently on the stack.
    pub(crate) depth: usize,
    pub(crate) config: SchedulerConfig,
}

impl Scheduler {
    //--- Registration -----------------------------------------------------

    /// Runs `function` of `parent` whenever `channel` is dispatched.
    pub fn add_channel_hook(&mut self, parent: ParentRef, function: &str, channel: &str) -> HookId {
        self.hooks
            .insert(channel, HookParent::Script(parent), function, Trigger::Channel, false)
    }

    /// Runs `function` of `parent` once, after `ms` milliseconds of
    /// timer ticks.
    ///
    /// Non-finite delays are clamped: NaN fires on the next tick, infinity
    /// becomes the largest finite delay.
    pub fn add_countdown_hook(&mut self, parent: ParentRef, function: &str, ms: f64) -> HookId {
        if !ms.is_finite() {
            warn!("Countdown hook '{}' of {} has delay {}, clamping it", function, parent, ms);
        }
        let remaining_ms = if ms.is_nan() { 0.0 } else { ms.clamp(0.0, f64::MAX) };
        self.hooks.insert(
            TIMER_CHANNEL,
            HookParent::Script(parent),
            function,
            Trigger::Countdown { remaining_ms },
            true,
        )
    }

    /// Runs `function` of `parent` every `resolution` units of game time.
    ///
    /// A resolution of zero is raised to one.
    pub fn add_calendar_hook(&mut self, parent: ParentRef, function: &str, resolution: u64) -> HookId {
        if resolution == 0 {
            warn!("Calendar hook '{}' of {} has resolution 0, using 1", function, parent);
        }
        self.hooks.insert(
            DATE_CHANNEL,
            HookParent::Script(parent),
            function,
            Trigger::Calendar {
                resolution: resolution.max(1),
                accumulated: 0,
            },
            false,
        )
    }

    /// Runs a Rust closure whenever `channel` is dispatched.
    ///
    /// Native hooks are never saved.
    pub fn add_native_hook<F>(&mut self, callback: F, channel: &str) -> HookId
    where
        F: Fn(&mut Scheduler, &mut dyn ScriptHost, &[HookArg]) -> CallbackOutcome + 'static,
    {
        self.hooks.insert(
            channel,
            HookParent::Native(NativeCallback::new(callback)),
            "",
            Trigger::Channel,
            false,
        )
    }

    //--- Hook Management --------------------------------------------------

    /// Stores an argument appended after the params each time the hook
    /// fires. Returns false if the hook isn't live.
    pub fn set_arg(&mut self, id: HookId, arg: HookArg) -> bool {
        self.hooks.set_arg(id, Some(arg))
    }

    /// Drops the hook's stored argument.
    pub fn clear_arg(&mut self, id: HookId) -> bool {
        self.hooks.set_arg(id, None)
    }

    /// Makes the hook remove itself the next time it fires.
    pub fn set_once(&mut self, id: HookId, once: bool) -> bool {
        self.hooks.set_once(id, once)
    }

    /// Marks a hook for removal. Safe to call from inside a callback and
    /// more than once.
    pub fn remove(&mut self, id: HookId) -> bool {
        let removed = self.hooks.remove(id);
        if !removed && self.hooks.get(id).is_none() {
            warn!("Removing unknown hook {}", id);
        }
        removed
    }

    /// Marks every hook of a finished mission/event for removal.
    pub fn remove_all_for_parent(&mut self, parent: ParentRef) -> usize {
        self.hooks.remove_all_for_parent(parent)
    }

    /// Live hooks still owned by `parent`.
    pub fn count_for_parent(&self, parent: ParentRef) -> usize {
        self.hooks.count_for_parent(parent)
    }

    //--- Introspection ----------------------------------------------------

    /// Any stored hook, including one waiting to be swept.
    pub fn hook(&self, id: HookId) -> Option<&Hook> {
        self.hooks.get(id)
    }

    pub fn hooks(&self) -> &HookStore {
        &self.hooks
    }

    /// Live hooks owned by `parent`, in storage order.
    pub fn hooks_for_parent(&self, parent: ParentRef) -> impl Iterator<Item = &Hook> + '_ {
        self.hooks
            .iter()
            .filter(move |h| h.is_live() && h.belongs_to(parent))
    }

    pub fn is_live(&self, id: HookId) -> bool {
        self.hooks.is_live(id)
    }

    /// Stored hooks, including ones waiting to be swept.
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Whether a dispatch frame is on the stack.
    pub fn is_dispatching(&self) -> bool {
        self.depth > 0
    }

    //--- Sweeping ---------------------------------------------------------

    /// Drops hooks marked for removal. Does nothing while dispatching.
    pub fn sweep(&mut self) -> usize {
        if self.depth > 0 {
            return 0;
        }
        self.hooks.sweep()
    }

    //--- Claims -----------------------------------------------------------

    pub fn claims(&self) -> &ClaimRegistry {
        &self.claims
    }

    pub fn claims_mut(&mut self) -> &mut ClaimRegistry {
        &mut self.claims
    }

    //--- Configuration / Lifecycle ----------------------------------------

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Whether hooks on `channel` are left out of saves.
    pub fn is_volatile(&self, channel: &str) -> bool {
        self.config.volatile_channels.iter().any(|c| c == channel)
            || self
                .config
                .volatile_prefixes
                .iter()
                .any(|p| channel.starts_with(p.as_str()))
    }

    /// Drops every hook, claim and pending dispatch.
    ///
    /// Used between game sessions.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a callback.
    pub fn clear(&mut self) {
        assert!(self.depth == 0, "Scheduler::clear() called during dispatch");

        self.hooks.clear();
        self.claims.reset();
        self.exclusion.clear();
        self.inbox.clear();
        info!("Scheduler cleared");
        debug!("Hook ids restart from 1");
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
