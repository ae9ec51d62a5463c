//! Shared To-Do Demo
//!
//! Two clients sharing one in-memory backend; one is driven through its
//! intent loop.
//! Usage: `shared-todo [config.json]`

use std::error::Error;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use shared_todo::{
    ClientConfig, ClientId, DraftField, InMemoryBackend, Intent, ListState, TodoApp,
};

fn print_list(label: &str, state: &ListState) {
    println!("{} ({} completed):", label, state.completed_count());
    for item in &state.items {
        let mark = if item.completed { "x" } else { " " };
        println!("  [{}] {} - {}", mark, item.name, item.description);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };

    if let Err(e) = rolling_logger::init_with(config.logger_config()) {
        eprintln!("Logging disabled: {}", e);
    }
    let _ = rolling_logger::info("Shared to-do demo starting");

    let backend = Arc::new(InMemoryBackend::new());
    let mut alice = TodoApp::new(backend.clone(), ClientId::generate());
    let mut bob = TodoApp::new(backend.clone(), ClientId::generate());
    alice.start().await;
    bob.start().await;

    // alice runs as an event loop fed by UI intents
    let mut snapshots = alice.watch();
    let (intents, rx) = mpsc::channel(config.intent_capacity);
    let session = tokio::spawn(alice.run(rx));

    intents
        .send(Intent::SetField { field: DraftField::Name, value: "Buy milk".into() })
        .await?;
    intents
        .send(Intent::SetField { field: DraftField::Description, value: "2%".into() })
        .await?;
    let (reply, created) = oneshot::channel();
    intents.send(Intent::Create { reply: Some(reply) }).await?;
    let milk_id = created.await??;
    intents.send(Intent::ToggleComplete(milk_id)).await?;

    bob.set_field(DraftField::Name, "Walk the dog");
    bob.set_field(DraftField::Description, "Before 9am");
    bob.create()?.settled().await;

    // bob's item reaches alice's loop through the feed
    snapshots
        .wait_for(|state| state.items.len() == 2 && state.completed_count() == 1)
        .await?;
    drop(intents);
    let alice_state = session.await?;

    // alice's item, then bob's own echo
    for _ in 0..2 {
        bob.poll_feed().await;
    }

    print_list("alice", &alice_state);
    print_list("bob", bob.state());

    bob.shutdown();

    let recent = rolling_logger::recent_entries();
    if !recent.is_empty() {
        println!("last log lines:");
        for line in recent.iter().rev().take(5).rev() {
            println!("  {}", line);
        }
    }
    Ok(())
}
