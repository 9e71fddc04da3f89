//=========================================================================
// Deferred Inbox
//=========================================================================
//
// Channel dispatches posted for the next frame.
//
// Architecture:
//   DeferredSender (cloneable) → bounded channel → collect_frame() → Vec
//
// Senders don't need `&mut Scheduler`, so they work from other threads
// and from callbacks alike. Draining is bounded per frame so a flood of
// requests can't stall one update.
//
//=========================================================================

//=== External Dependencies ===============================================

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use log::warn;

//=== Internal Dependencies ===============================================

use crate::core::host::HookArg;

//=== DeferredDispatch ====================================================

/// A channel dispatch requested for the next frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredDispatch {
    pub channel: String,
    pub params: Vec<HookArg>,
}

//=== DeferredSender ======================================================

/// Handle for posting deferred dispatches.
#[derive(Debug, Clone)]
pub struct DeferredSender {
    sender: Sender<DeferredDispatch>,
}

impl DeferredSender {
    /// Posts a dispatch for the next frame.
    ///
    /// Returns false if the inbox is full or the scheduler is gone.
    pub fn send(&self, channel: impl Into<String>, params: Vec<HookArg>) -> bool {
        let dispatch = DeferredDispatch {
            channel: channel.into(),
            params,
        };
        match self.sender.try_send(dispatch) {
            Ok(()) => true,
            Err(TrySendError::Full(d)) => {
                warn!("Deferred inbox full, dropping dispatch of '{}'", d.channel);
                false
            }
            Err(TrySendError::Disconnected(d)) => {
                warn!("Scheduler gone, dropping deferred dispatch of '{}'", d.channel);
                false
            }
        }
    }
}

//=== DeferredInbox =======================================================

/// Receiving side, owned by the scheduler.
#[derive(Debug)]
pub(crate) struct DeferredInbox {
    sender: Sender<DeferredDispatch>,
    receiver: Receiver<DeferredDispatch>,
    max_per_frame: usize,
}

impl DeferredInbox {
    pub(crate) fn new(capacity: usize, max_per_frame: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            max_per_frame,
        }
    }

    pub(crate) fn sender(&self) -> DeferredSender {
        DeferredSender {
            sender: self.sender.clone(),
        }
    }

    /// Takes up to `max_per_frame` pending dispatches, oldest first.
    pub(crate) fn collect_frame(&mut self) -> Vec<DeferredDispatch> {
        let mut batch = Vec::new();

        while batch.len() < self.max_per_frame {
            match self.receiver.try_recv() {
                Ok(dispatch) => batch.push(dispatch),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        if batch.len() >= self.max_per_frame && !self.receiver.is_empty() {
            warn!(
                "Deferred dispatch backlog: drained {} this frame, {} left for the next",
                batch.len(),
                self.receiver.len()
            );
        }

        batch
    }

    pub(crate) fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Discards everything pending.
    pub(crate) fn clear(&mut self) {
        while self.receiver.try_recv().is_ok() {}
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
