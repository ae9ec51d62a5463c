//! Shared To-Do App
//!
//! Orchestrates one client session: owns the store (the single writer),
//! routes UI intents through the mutation executor, merges the creation feed,
//! and publishes snapshots to readers. Events are handled one at a time to
//! completion; network calls are the only suspension points.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

use crate::commands::{CreationEvent, Subscription, TodoBackend};
use crate::error::{ServiceResult, ValidationError};
use crate::executor::{Confirmation, MutationExecutor};
use crate::feed::FeedListener;
use crate::identity::ClientId;
use crate::models::{DraftField, Item, ItemId};
use crate::store::{Action, ListState, Store};

/// Something the UI asked for
#[derive(Debug)]
pub enum Intent {
    SetField {
        field: DraftField,
        value: String,
    },
    /// Create from the current draft; the reply carries the new id or the
    /// validation failure
    Create {
        reply: Option<oneshot::Sender<Result<ItemId, ValidationError>>>,
    },
    Delete(ItemId),
    ToggleComplete(ItemId),
}

pub struct TodoApp {
    store: Store,
    backend: Arc<dyn TodoBackend>,
    executor: MutationExecutor,
    listener: FeedListener,
    subscription: Option<Subscription>,
    snapshots: watch::Sender<ListState>,
}

impl TodoApp {
    pub fn new(backend: Arc<dyn TodoBackend>, client_id: ClientId) -> Self {
        Self::with_store(backend, client_id, Store::new())
    }

    /// Use a prepared store (e.g. `Store::traced()`)
    pub fn with_store(backend: Arc<dyn TodoBackend>, client_id: ClientId, store: Store) -> Self {
        let (snapshots, _) = watch::channel(store.state().clone());
        Self {
            executor: MutationExecutor::new(client_id, Arc::clone(&backend)),
            listener: FeedListener::new(client_id),
            backend,
            store,
            subscription: None,
            snapshots,
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.executor.client_id()
    }

    pub fn state(&self) -> &ListState {
        self.store.state()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn completed_count(&self) -> usize {
        self.store.state().completed_count()
    }

    /// Receiver of store snapshots, updated after every handled event
    pub fn watch(&self) -> watch::Receiver<ListState> {
        self.snapshots.subscribe()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.as_ref().is_some_and(Subscription::is_open)
    }

    // ========================
    // Lifecycle
    // ========================

    /// Open the creation feed, then load the full list
    ///
    /// Subscribing first means nothing created during the fetch is missed;
    /// items seen by both are not duplicated.
    pub async fn start(&mut self) {
        if self.subscription.is_none() {
            match self.backend.subscribe_creations().await {
                Ok(subscription) => self.subscription = Some(subscription),
                Err(e) => log::error!("failed to subscribe to item creations: {}", e),
            }
        }
        self.refresh().await;
    }

    /// Refetch everything, replacing local state. False if the fetch failed.
    pub async fn refresh(&mut self) -> bool {
        let fetched = self.backend.list_items().await;
        self.apply_fetch(fetched)
    }

    fn apply_fetch(&mut self, fetched: ServiceResult<Vec<Item>>) -> bool {
        let ok = match fetched {
            Ok(items) => {
                log::info!("fetched {} items", items.len());
                self.store.dispatch(Action::SetAll { items });
                true
            }
            Err(e) => {
                log::error!("failed to fetch items: {}", e);
                self.store.dispatch(Action::MarkError);
                false
            }
        };
        self.publish();
        ok
    }

    /// Release the feed. Returns false if it was already released.
    pub fn shutdown(&mut self) -> bool {
        let released = self.subscription.take().is_some_and(|mut sub| sub.close());
        if released {
            log::info!("creation feed closed for client {}", self.client_id());
        }
        released
    }

    // ========================
    // UI Intents
    // ========================

    pub fn set_field(&mut self, field: DraftField, value: impl Into<String>) {
        self.store.dispatch(Action::SetField {
            field,
            value: value.into(),
        });
        self.publish();
    }

    pub fn create(&mut self) -> Result<Confirmation, ValidationError> {
        let result = self.executor.create(&mut self.store);
        if result.is_ok() {
            self.publish();
        }
        result
    }

    pub fn delete(&mut self, id: ItemId) -> Confirmation {
        let confirmation = self.executor.delete(&mut self.store, id);
        self.publish();
        confirmation
    }

    pub fn toggle_complete(&mut self, id: ItemId) -> Option<Confirmation> {
        let confirmation = self.executor.toggle_complete(&mut self.store, id);
        if confirmation.is_some() {
            self.publish();
        }
        confirmation
    }

    /// Apply an intent; confirmations are left to finish on their own
    pub fn handle_intent(&mut self, intent: Intent) {
        match intent {
            Intent::SetField { field, value } => self.set_field(field, value),
            Intent::Create { reply } => {
                let result = self.create().map(|confirmation| confirmation.item_id());
                if let Err(e) = &result {
                    log::warn!("create rejected: {}", e);
                }
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            Intent::Delete(id) => {
                self.delete(id);
            }
            Intent::ToggleComplete(id) => {
                self.toggle_complete(id);
            }
        }
    }

    // ========================
    // Creation Feed
    // ========================

    /// Merge one feed event. Ignored once the feed has been released.
    pub fn handle_feed_event(&mut self, event: CreationEvent) -> bool {
        if !self.is_subscribed() {
            log::debug!("dropping creation {} after feed teardown", event.item.id);
            return false;
        }
        let changed = self.listener.merge(&mut self.store, event);
        if changed {
            self.publish();
        }
        changed
    }

    /// Wait for and merge one feed event
    ///
    /// Returns false once the feed is gone (never opened, closed, or ended).
    pub async fn poll_feed(&mut self) -> bool {
        let next = next_event(&mut self.subscription).await;
        self.on_feed(next)
    }

    fn on_feed(&mut self, next: Option<ServiceResult<CreationEvent>>) -> bool {
        match next {
            Some(Ok(event)) => {
                self.handle_feed_event(event);
                true
            }
            Some(Err(e)) => {
                log::warn!("creation feed error: {}", e);
                true
            }
            None => {
                if self.shutdown() {
                    log::warn!("creation feed ended");
                }
                false
            }
        }
    }

    /// Event loop: intents and feed events, one at a time
    ///
    /// Ends when every intent sender is dropped; the feed is released before
    /// returning the final state.
    pub async fn run(mut self, mut intents: mpsc::Receiver<Intent>) -> ListState {
        loop {
            let feed_open = self.is_subscribed();
            tokio::select! {
                intent = intents.recv() => match intent {
                    Some(intent) => self.handle_intent(intent),
                    None => break,
                },
                next = next_event(&mut self.subscription), if feed_open => {
                    self.on_feed(next);
                }
            }
        }
        self.shutdown();
        self.store.into_state()
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.store.state().clone());
    }
}

async fn next_event(subscription: &mut Option<Subscription>) -> Option<ServiceResult<CreationEvent>> {
    match subscription.as_mut() {
        Some(subscription) => subscription.next().await,
        None => None,
    }
}
