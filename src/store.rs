//! List Store
//!
//! Canonical in-memory list plus UI status flags.
//! Every change goes through `ListState::apply`, a pure
//! `(state, action) -> state` transition.

use serde::{Deserialize, Serialize};

use crate::counter::CompletedCounter;
use crate::models::{Draft, DraftField, Item, ItemId};

/// Snapshot exposed to the UI layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListState {
    /// Items, most recent first. Ids are unique.
    pub items: Vec<Item>,
    /// True until the initial fetch settles
    pub loading: bool,
    /// Set when the initial fetch (or a refresh) failed
    pub error: bool,
    pub draft: Draft,
    /// Number of items with `completed == true`
    pub completed: CompletedCounter,
}

impl Default for ListState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: true,
            error: false,
            draft: Draft::default(),
            completed: CompletedCounter::default(),
        }
    }
}

/// A single store transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Replace the whole collection and clear `loading`
    SetAll { items: Vec<Item> },
    /// Insert at the front (ignored if the id is already present)
    Prepend { item: Item },
    /// Drop the item with this id, if any
    Remove { id: ItemId },
    /// Flip `completed` and adjust the counter together
    ToggleCompleted { id: ItemId },
    SetField { field: DraftField, value: String },
    ResetForm,
    /// Set `error`, clear `loading`, keep items
    MarkError,
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::SetAll { .. } => "SET_ALL",
            Action::Prepend { .. } => "PREPEND",
            Action::Remove { .. } => "REMOVE",
            Action::ToggleCompleted { .. } => "TOGGLE_COMPLETED",
            Action::SetField { .. } => "SET_FIELD",
            Action::ResetForm => "RESET_FORM",
            Action::MarkError => "MARK_ERROR",
        }
    }
}

impl ListState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed_count(&self) -> usize {
        self.completed.value()
    }

    pub fn find(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.find(id).is_some()
    }

    /// Apply one transition. Total and deterministic: no hidden inputs.
    pub fn apply(mut self, action: Action) -> Self {
        match action {
            Action::SetAll { items } => {
                let mut unique: Vec<Item> = Vec::with_capacity(items.len());
                for item in items {
                    if !unique.iter().any(|kept| kept.id == item.id) {
                        unique.push(item);
                    }
                }
                self.completed = CompletedCounter::recount(&unique);
                self.items = unique;
                self.loading = false;
            }
            Action::Prepend { item } => {
                if !self.contains(item.id) {
                    self.completed = self.completed.added(&item);
                    self.items.insert(0, item);
                }
            }
            Action::Remove { id } => {
                if let Some(index) = self.items.iter().position(|item| item.id == id) {
                    let removed = self.items.remove(index);
                    self.completed = self.completed.removed(&removed);
                }
            }
            Action::ToggleCompleted { id } => {
                if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
                    item.completed = !item.completed;
                    self.completed = self.completed.toggled(item.completed);
                }
            }
            Action::SetField { field, value } => {
                self.draft = self.draft.with(field, value);
            }
            Action::ResetForm => {
                self.draft = Draft::default();
            }
            Action::MarkError => {
                self.loading = false;
                self.error = true;
            }
        }
        self
    }
}

/// Replay `actions` in order starting from `initial`
pub fn replay<I>(initial: ListState, actions: I) -> ListState
where
    I: IntoIterator<Item = Action>,
{
    actions.into_iter().fold(initial, ListState::apply)
}

/// Owner of the current state; the single writer
#[derive(Debug, Default)]
pub struct Store {
    state: ListState,
    /// Dispatched actions, when tracing is enabled
    trace: Option<Vec<Action>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that records every dispatched action
    pub fn traced() -> Self {
        Self {
            state: ListState::default(),
            trace: Some(Vec::new()),
        }
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn into_state(self) -> ListState {
        self.state
    }

    /// Recorded actions (empty unless built with `traced`)
    pub fn trace(&self) -> &[Action] {
        self.trace.as_deref().unwrap_or(&[])
    }

    pub fn dispatch(&mut self, action: Action) -> &ListState {
        log::debug!("dispatch {}", action.kind());
        if let Some(trace) = self.trace.as_mut() {
            trace.push(action.clone());
        }
        let state = std::mem::take(&mut self.state);
        self.state = state.apply(action);
        debug_assert!(self.state.completed.agrees_with(&self.state.items));
        &self.state
    }
}

// ========================
// Tests
// ========================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ClientId;

    fn item(name: &str) -> Item {
        Item::new(ClientId::generate(), name, "desc")
    }

    fn done(name: &str) -> Item {
        let mut item = item(name);
        item.completed = true;
        item
    }

    #[test]
    fn test_initial_state() {
        let state = ListState::new();
        assert!(state.loading);
        assert!(!state.error);
        assert!(state.items.is_empty());
        assert!(state.draft.is_empty());
        assert_eq!(state.completed_count(), 0);
    }

    #[test]
    fn test_set_all_clears_loading_and_recounts() {
        let items = vec![done("a"), item("b"), done("c")];
        let state = ListState::new().apply(Action::SetAll { items });
        assert!(!state.loading);
        assert_eq!(state.items.len(), 3);
        assert_eq!(state.completed_count(), 2);
    }

    #[test]
    fn test_set_all_drops_duplicate_ids() {
        let a = item("a");
        let mut twin = a.clone();
        twin.name = "twin".to_string();
        let state = ListState::new().apply(Action::SetAll { items: vec![a.clone(), twin] });
        assert_eq!(state.items, vec![a]);
    }

    #[test]
    fn test_prepend_inserts_at_front() {
        let a = item("a");
        let b = item("b");
        let state = ListState::new()
            .apply(Action::SetAll { items: vec![a.clone()] })
            .apply(Action::Prepend { item: b.clone() });
        assert_eq!(state.items, vec![b, a]);
    }

    #[test]
    fn test_prepend_existing_id_is_ignored() {
        let a = item("a");
        let state = ListState::new()
            .apply(Action::Prepend { item: a.clone() })
            .apply(Action::Prepend { item: a.clone() });
        assert_eq!(state.items.len(), 1);
    }

    #[test]
    fn test_prepend_completed_item_counts() {
        let state = ListState::new().apply(Action::Prepend { item: done("a") });
        assert_eq!(state.completed_count(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let a = done("a");
        let b = item("b");
        let start = ListState::new().apply(Action::SetAll { items: vec![a.clone(), b.clone()] });

        let once = start.clone().apply(Action::Remove { id: a.id });
        let twice = once.clone().apply(Action::Remove { id: a.id });

        assert_eq!(once, twice);
        assert_eq!(once.items, vec![b]);
        assert_eq!(once.completed_count(), 0);
    }

    #[test]
    fn test_toggle_flips_flag_and_counter() {
        let a = item("a");
        let state = ListState::new()
            .apply(Action::SetAll { items: vec![a.clone()] })
            .apply(Action::ToggleCompleted { id: a.id });
        assert!(state.find(a.id).unwrap().completed);
        assert_eq!(state.completed_count(), 1);

        let state = state.apply(Action::ToggleCompleted { id: a.id });
        assert!(!state.find(a.id).unwrap().completed);
        assert_eq!(state.completed_count(), 0);
    }

    #[test]
    fn test_toggle_unknown_id_is_noop() {
        let start = ListState::new().apply(Action::SetAll { items: vec![item("a")] });
        let after = start.clone().apply(Action::ToggleCompleted { id: uuid::Uuid::new_v4() });
        assert_eq!(start, after);
    }

    #[test]
    fn test_form_actions() {
        let state = ListState::new()
            .apply(Action::SetField { field: DraftField::Name, value: "Buy milk".into() })
            .apply(Action::SetField { field: DraftField::Description, value: "2%".into() });
        assert_eq!(state.draft, Draft::new("Buy milk", "2%"));

        let state = state.apply(Action::ResetForm);
        assert!(state.draft.is_empty());
    }

    #[test]
    fn test_mark_error_keeps_items() {
        let state = ListState::new()
            .apply(Action::SetAll { items: vec![item("a")] })
            .apply(Action::MarkError);
        assert!(state.error);
        assert!(!state.loading);
        assert_eq!(state.items.len(), 1);
    }

    #[test]
    fn test_replay_is_deterministic() {
        let a = item("a");
        let b = done("b");
        let actions = vec![
            Action::SetAll { items: vec![a.clone()] },
            Action::Prepend { item: b.clone() },
            Action::ToggleCompleted { id: a.id },
            Action::Remove { id: b.id },
            Action::SetField { field: DraftField::Name, value: "x".into() },
            Action::MarkError,
        ];

        let first = replay(ListState::new(), actions.clone());
        let second = replay(ListState::new(), actions);
        assert_eq!(first, second);
        assert!(first.completed.agrees_with(&first.items));
    }

    #[test]
    fn test_traced_store_records_actions() {
        let mut store = Store::traced();
        store.dispatch(Action::SetAll { items: vec![] });
        store.dispatch(Action::ResetForm);
        assert_eq!(store.trace().len(), 2);
        assert_eq!(store.trace()[0].kind(), "SET_ALL");

        assert!(Store::new().trace().is_empty());
    }

    #[test]
    fn test_action_wire_format() {
        let json = serde_json::to_value(Action::ResetForm).unwrap();
        assert_eq!(json["type"], "RESET_FORM");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use uuid::Uuid;

        /// Small id pool so generated actions collide often
        const ID_POOL: u128 = 4;

        fn pooled_id() -> impl Strategy<Value = ItemId> {
            (0..ID_POOL).prop_map(Uuid::from_u128)
        }

        fn arb_item() -> impl Strategy<Value = Item> {
            (pooled_id(), any::<bool>()).prop_map(|(id, completed)| Item {
                id,
                client_id: ClientId::from_uuid(Uuid::from_u128(u128::MAX)),
                name: format!("item {}", id.as_u128()),
                description: "desc".to_string(),
                completed,
            })
        }

        fn arb_action() -> impl Strategy<Value = Action> {
            prop_oneof![
                prop::collection::vec(arb_item(), 0..6).prop_map(|items| Action::SetAll { items }),
                arb_item().prop_map(|item| Action::Prepend { item }),
                pooled_id().prop_map(|id| Action::Remove { id }),
                pooled_id().prop_map(|id| Action::ToggleCompleted { id }),
                (any::<bool>(), "[a-z]{0,4}").prop_map(|(name, value)| Action::SetField {
                    field: if name { DraftField::Name } else { DraftField::Description },
                    value,
                }),
                Just(Action::ResetForm),
                Just(Action::MarkError),
            ]
        }

        proptest! {
            /// Every step keeps the counter equal to a recount and ids unique.
            #[test]
            fn prop_counter_and_ids_hold_after_every_step(
                actions in prop::collection::vec(arb_action(), 0..48)
            ) {
                let mut state = ListState::new();
                for action in actions {
                    state = state.apply(action);
                    prop_assert!(
                        state.completed.agrees_with(&state.items),
                        "counter {} disagrees with items",
                        state.completed_count()
                    );
                    let mut ids: Vec<ItemId> = state.items.iter().map(|item| item.id).collect();
                    ids.sort();
                    ids.dedup();
                    prop_assert_eq!(ids.len(), state.items.len());
                }
            }

            /// Replaying the same sequence twice yields the same state.
            #[test]
            fn prop_replay_is_deterministic(
                actions in prop::collection::vec(arb_action(), 0..48)
            ) {
                let first = replay(ListState::new(), actions.clone());
                let second = replay(ListState::new(), actions);
                prop_assert_eq!(first, second);
            }
        }
    }
}
