//! Event Bus - Typed publish/subscribe per monitoring session
//!
//! Thin wrapper over `tokio::sync::broadcast`. Publishing never blocks; a
//! subscriber that falls more than `capacity` items behind skips its own
//! oldest items (counted in `dropped`) while other subscribers are
//! unaffected. Capacity is rounded up to a power of two by the channel.

use std::sync::Arc;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

// ============================================================================
// SUBSCRIPTION
// ============================================================================

/// Receiving end of an `EventBus`
pub struct Subscription<T> {
    rx: broadcast::Receiver<Arc<T>>,
    dropped: u64,
    closed: bool,
}

impl<T> Subscription<T> {
    fn new(rx: broadcast::Receiver<Arc<T>>, closed: bool) -> Self {
        Self { rx, dropped: 0, closed }
    }

    /// Wait for the next notification.
    ///
    /// Returns `None` once the bus is closed and everything still queued for
    /// this subscriber has been received.
    pub async fn recv(&mut self) -> Option<Arc<T>> {
        loop {
            match self.rx.recv().await {
                Ok(item) => return Some(item),
                Err(RecvError::Lagged(n)) => self.dropped += n,
                Err(RecvError::Closed) => {
                    self.closed = true;
                    return None;
                }
            }
        }
    }

    /// Take the next pending notification without waiting
    pub fn try_recv(&mut self) -> Option<Arc<T>> {
        loop {
            match self.rx.try_recv() {
                Ok(item) => return Some(item),
                Err(TryRecvError::Lagged(n)) => self.dropped += n,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Closed) => {
                    self.closed = true;
                    return None;
                }
            }
        }
    }

    /// Notifications skipped because this subscriber fell behind.
    ///
    /// Updated as the subscriber receives.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Whether the end of the stream has been reached
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

// ============================================================================
// EVENT BUS
// ============================================================================

pub struct EventBus<T> {
    /// `None` once closed; dropping the sender ends every receiver
    sender: RwLock<Option<broadcast::Sender<Arc<T>>>>,
}

impl<T> EventBus<T> {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: RwLock::new(Some(sender)),
        }
    }

    /// Register a new subscriber. It sees only items published after this
    /// call; on a closed bus the subscription is already at its end.
    pub fn subscribe(&self) -> Subscription<T> {
        match self.sender.read().as_ref() {
            Some(sender) => Subscription::new(sender.subscribe(), false),
            None => {
                let (_, rx) = broadcast::channel(1);
                Subscription::new(rx, true)
            }
        }
    }

    /// Deliver to every live subscriber; returns how many will receive it
    pub fn publish(&self, item: T) -> usize {
        match self.sender.read().as_ref() {
            Some(sender) => sender.send(Arc::new(item)).unwrap_or(0),
            None => 0,
        }
    }

    /// Stop delivery. Receivers drain what is queued, then get `None`.
    pub fn close(&self) {
        self.sender.write().take();
    }

    pub fn is_closed(&self) -> bool {
        self.sender.read().is_none()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.read().as_ref().map_or(0, |s| s.receiver_count())
    }
}
