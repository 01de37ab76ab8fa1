//! Single-slot pending request
//!
//! Holds at most one outstanding result sink per request kind. A second
//! registration while one is outstanding is rejected with `Busy`; the slot
//! is cleared when the waiting ticket is dropped, whether it resolved,
//! failed or was abandoned.

use crate::utils::error::{CaptureError, CaptureResult, RequestKind};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

struct Slot<T> {
    ticket: u64,
    sender: oneshot::Sender<CaptureResult<T>>,
}

pub struct PendingRequest<T> {
    kind: RequestKind,
    slot: Mutex<Option<Slot<T>>>,
    next_ticket: AtomicU64,
}

impl<T: Send + 'static> PendingRequest<T> {
    pub fn new(kind: RequestKind) -> Self {
        Self {
            kind,
            slot: Mutex::new(None),
            next_ticket: AtomicU64::new(0),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Claim the slot
    pub fn register(self: &Arc<Self>) -> CaptureResult<PendingTicket<T>> {
        let mut slot = self.slot.lock();
        if slot.is_some() {
            tracing::warn!("Rejecting {} request: one is already pending", self.kind);
            return Err(CaptureError::Busy(self.kind));
        }

        let (sender, receiver) = oneshot::channel();
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        *slot = Some(Slot { ticket, sender });

        Ok(PendingTicket {
            request: Arc::clone(self),
            ticket,
            receiver,
        })
    }

    /// Deliver the result to the waiting caller.
    ///
    /// Returns false if nobody was waiting; the result is then discarded.
    pub fn resolve(&self, result: CaptureResult<T>) -> bool {
        let slot = self.slot.lock().take();
        match slot {
            Some(slot) => slot.sender.send(result).is_ok(),
            None => {
                tracing::debug!("No pending {} request; result dropped", self.kind);
                false
            }
        }
    }
}

/// Waiting side of a registered request
pub struct PendingTicket<T: Send + 'static> {
    request: Arc<PendingRequest<T>>,
    ticket: u64,
    receiver: oneshot::Receiver<CaptureResult<T>>,
}

impl<T: Send + 'static> PendingTicket<T> {
    /// Wait for the result; a dropped sink resolves to `RequestDropped`
    pub async fn wait(mut self) -> CaptureResult<T> {
        (&mut self.receiver)
            .await
            .unwrap_or(Err(CaptureError::RequestDropped))
    }
}

impl<T: Send + 'static> Drop for PendingTicket<T> {
    fn drop(&mut self) {
        let mut slot = self.request.slot.lock();
        if slot.as_ref().map(|slot| slot.ticket) == Some(self.ticket) {
            *slot = None;
        }
    }
}
