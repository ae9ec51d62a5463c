//! In-Memory Backend
//!
//! Reference backing service shared by any number of clients in one process.
//! Creations are fanned out to every open subscription, including the
//! creator's. Each subscription owns an unbounded queue, so a slow reader
//! never misses an event.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex as SyncMutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, Mutex};

use super::item::{DeleteItemArgs, UpdateItemArgs};
use super::subscription::{CreationEvent, CreationSource, Subscription};
use super::TodoBackend;
use crate::error::{ServiceError, ServiceResult};
use crate::models::Item;

/// Backend operation, used to inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    List,
    Create,
    Update,
    Delete,
    Subscribe,
}

pub struct InMemoryBackend {
    items: Mutex<Vec<Item>>,
    failing: Mutex<HashSet<BackendOp>>,
    subscribers: SyncMutex<Vec<mpsc::UnboundedSender<CreationEvent>>>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    pub fn with_items(items: Vec<Item>) -> Self {
        Self {
            items: Mutex::new(items),
            failing: Mutex::new(HashSet::new()),
            subscribers: SyncMutex::new(Vec::new()),
        }
    }

    /// Make every call of `op` fail until `recover`
    pub async fn fail(&self, op: BackendOp) {
        self.failing.lock().await.insert(op);
    }

    pub async fn recover(&self, op: BackendOp) {
        self.failing.lock().await.remove(&op);
    }

    /// Stored items, most recent first
    pub async fn items(&self) -> Vec<Item> {
        self.items.lock().await.clone()
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers().iter().filter(|tx| !tx.is_closed()).count()
    }

    fn subscribers(&self) -> MutexGuard<'_, Vec<mpsc::UnboundedSender<CreationEvent>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn check(&self, op: BackendOp) -> ServiceResult<()> {
        if self.failing.lock().await.contains(&op) {
            return Err(ServiceError::Unavailable(format!("{:?} is failing", op)));
        }
        Ok(())
    }

    /// Queue the creation for every live subscriber, forgetting released ones
    fn fan_out(&self, item: &Item) {
        self.subscribers().retain(|tx| tx.send(CreationEvent { item: item.clone() }).is_ok());
    }
}

#[async_trait]
impl TodoBackend for InMemoryBackend {
    async fn list_items(&self) -> ServiceResult<Vec<Item>> {
        self.check(BackendOp::List).await?;
        Ok(self.items().await)
    }

    async fn create_item(&self, item: &Item) -> ServiceResult<()> {
        self.check(BackendOp::Create).await?;
        let mut items = self.items.lock().await;
        if items.iter().any(|existing| existing.id == item.id) {
            return Err(ServiceError::Rejected(format!("item {} already exists", item.id)));
        }
        items.insert(0, item.clone());
        drop(items);

        self.fan_out(item);
        Ok(())
    }

    async fn update_item(&self, args: UpdateItemArgs) -> ServiceResult<()> {
        self.check(BackendOp::Update).await?;
        let mut items = self.items.lock().await;
        let item = items
            .iter_mut()
            .find(|item| item.id == args.id)
            .ok_or_else(|| ServiceError::NotFound(format!("item {}", args.id)))?;
        item.completed = args.completed;
        Ok(())
    }

    async fn delete_item(&self, args: DeleteItemArgs) -> ServiceResult<()> {
        self.check(BackendOp::Delete).await?;
        let mut items = self.items.lock().await;
        let index = items
            .iter()
            .position(|item| item.id == args.id)
            .ok_or_else(|| ServiceError::NotFound(format!("item {}", args.id)))?;
        items.remove(index);
        Ok(())
    }

    async fn subscribe_creations(&self) -> ServiceResult<Subscription> {
        self.check(BackendOp::Subscribe).await?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers().push(tx);
        Ok(Subscription::new(FanoutSource { rx: Some(rx) }))
    }
}

struct FanoutSource {
    rx: Option<mpsc::UnboundedReceiver<CreationEvent>>,
}

#[async_trait]
impl CreationSource for FanoutSource {
    async fn next_event(&mut self) -> Option<ServiceResult<CreationEvent>> {
        let rx = self.rx.as_mut()?;
        rx.recv().await.map(Ok)
    }

    fn release(&mut self) {
        self.rx = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ClientId;

    fn item(name: &str) -> Item {
        Item::new(ClientId::generate(), name, "desc")
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let backend = InMemoryBackend::new();
        let first = item("first");
        let second = item("second");
        backend.create_item(&first).await.unwrap();
        backend.create_item(&second).await.unwrap();

        let items = backend.list_items().await.unwrap();
        assert_eq!(items, vec![second, first]);
    }

    #[tokio::test]
    async fn test_duplicate_create_rejected() {
        let backend = InMemoryBackend::new();
        let a = item("a");
        backend.create_item(&a).await.unwrap();
        assert!(matches!(backend.create_item(&a).await, Err(ServiceError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let a = item("a");
        let backend = InMemoryBackend::with_items(vec![a.clone()]);

        backend.update_item(UpdateItemArgs { id: a.id, completed: true }).await.unwrap();
        assert!(backend.items().await[0].completed);

        backend.delete_item(DeleteItemArgs { id: a.id }).await.unwrap();
        assert!(backend.items().await.is_empty());
        assert!(matches!(
            backend.delete_item(DeleteItemArgs { id: a.id }).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let backend = InMemoryBackend::new();
        backend.fail(BackendOp::List).await;
        assert!(matches!(backend.list_items().await, Err(ServiceError::Unavailable(_))));

        backend.recover(BackendOp::List).await;
        assert!(backend.list_items().await.is_ok());
    }

    #[tokio::test]
    async fn test_subscribers_receive_creations() {
        let backend = InMemoryBackend::new();
        let mut sub = backend.subscribe_creations().await.unwrap();
        assert_eq!(backend.subscriber_count(), 1);

        let a = item("a");
        backend.create_item(&a).await.unwrap();
        let event = sub.next().await.unwrap().unwrap();
        assert_eq!(event.item, a);

        sub.close();
        assert_eq!(backend.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_slow_subscriber_receives_every_creation() {
        let backend = InMemoryBackend::new();
        let mut sub = backend.subscribe_creations().await.unwrap();
        let created: Vec<Item> = (0..300).map(|i| item(&format!("item {}", i))).collect();
        for item in &created {
            backend.create_item(item).await.unwrap();
        }

        for expected in &created {
            assert_eq!(&sub.next().await.unwrap().unwrap().item, expected);
        }
    }

    #[tokio::test]
    async fn test_released_subscriber_is_forgotten() {
        let backend = InMemoryBackend::new();
        let mut first = backend.subscribe_creations().await.unwrap();
        let mut second = backend.subscribe_creations().await.unwrap();
        assert_eq!(backend.subscriber_count(), 2);

        first.close();
        backend.create_item(&item("a")).await.unwrap();
        assert_eq!(backend.subscribers().len(), 1);
        assert!(second.next().await.unwrap().is_ok());
    }
}
