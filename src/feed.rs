//! Change Feed Listener
//!
//! Merges remote creation events into the store. Events stamped with our own
//! client id are echoes of optimistic creates and are dropped.

use crate::commands::CreationEvent;
use crate::identity::ClientId;
use crate::models::Item;
use crate::store::{Action, Store};

#[derive(Debug, Clone, Copy)]
pub struct FeedListener {
    client_id: ClientId,
}

impl FeedListener {
    pub fn new(client_id: ClientId) -> Self {
        Self { client_id }
    }

    /// The carried item, unless it originated here
    pub fn accept(&self, event: CreationEvent) -> Option<Item> {
        if event.item.client_id == self.client_id {
            log::debug!("dropping echo of own item {}", event.item.id);
            return None;
        }
        Some(event.item)
    }

    /// Merge one event; true if the store changed
    pub fn merge(&self, store: &mut Store, event: CreationEvent) -> bool {
        let Some(item) = self.accept(event) else {
            return false;
        };
        let before = store.state().items.len();
        store.dispatch(Action::Prepend { item });
        store.state().items.len() != before
    }
}
