//! Creation Feed Subscription
//!
//! A lazy, unbounded, cancellable sequence of item-creation events.
//! The underlying connection is released exactly once: on `close` or on drop,
//! whichever comes first.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ServiceResult;
use crate::models::Item;

/// "Item created" push notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationEvent {
    pub item: Item,
}

/// Transport behind a subscription
#[async_trait]
pub trait CreationSource: Send {
    /// Next event, or `None` once the feed has ended
    async fn next_event(&mut self) -> Option<ServiceResult<CreationEvent>>;

    /// Release the connection. Called once.
    fn release(&mut self);
}

pub struct Subscription {
    source: Option<Box<dyn CreationSource>>,
}

impl Subscription {
    pub fn new(source: impl CreationSource + 'static) -> Self {
        Self {
            source: Some(Box::new(source)),
        }
    }

    /// Subscription fed by a channel; the sender side is the transport
    pub fn from_channel(rx: mpsc::Receiver<ServiceResult<CreationEvent>>) -> Self {
        Self::new(ChannelSource { rx: Some(rx) })
    }

    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    /// Wait for the next event. Always `None` after `close`.
    pub async fn next(&mut self) -> Option<ServiceResult<CreationEvent>> {
        match self.source.as_mut() {
            Some(source) => source.next_event().await,
            None => None,
        }
    }

    /// Release the connection. Returns false if it was already released.
    pub fn close(&mut self) -> bool {
        match self.source.take() {
            Some(mut source) => {
                source.release();
                true
            }
            None => false,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("open", &self.is_open())
            .finish()
    }
}

/// Source reading from an mpsc channel
pub struct ChannelSource {
    rx: Option<mpsc::Receiver<ServiceResult<CreationEvent>>>,
}

#[async_trait]
impl CreationSource for ChannelSource {
    async fn next_event(&mut self) -> Option<ServiceResult<CreationEvent>> {
        match self.rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    fn release(&mut self) {
        if let Some(mut rx) = self.rx.take() {
            rx.close();
        }
    }
}
