//! Mutable orchestration state.
//!
//! `OrchestrationState` is owned by a single caller and lent to the
//! orchestrator as `&mut` for each cycle. Character states are taken out and
//! moved into workflow tasks during fan-out, then put back.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use chorus_types::character::CharacterState;
use chorus_types::config::ChorusConfig;
use chorus_types::content::ContentItem;

use crate::thread::SharedThread;

use super::budget::HourlyCallBudget;

/// Recent outputs kept per character for repetition scoring.
pub const HISTORY_LIMIT: usize = 10;

/// An active thread and the item it was created from.
#[derive(Debug, Clone)]
pub struct ThreadEntry {
    pub thread: SharedThread,
    pub content: Arc<ContentItem>,
}

/// Everything the orchestrator mutates between cycles.
#[derive(Debug)]
pub struct OrchestrationState {
    active_characters: BTreeSet<String>,
    pending: VecDeque<ContentItem>,
    characters: BTreeMap<String, CharacterState>,
    threads: BTreeMap<Uuid, ThreadEntry>,
    processed_count: u64,
    budget: HourlyCallBudget,
    history: HashMap<String, VecDeque<String>>,
}

impl OrchestrationState {
    /// Empty state with a budget configured from `config`.
    pub fn new(config: &ChorusConfig) -> Self {
        Self::with_budget(HourlyCallBudget::new(
            config.hourly_call_budget,
            config.budget_warning_percent,
            Utc::now(),
        ))
    }

    pub fn with_budget(budget: HourlyCallBudget) -> Self {
        Self {
            active_characters: BTreeSet::new(),
            pending: VecDeque::new(),
            characters: BTreeMap::new(),
            threads: BTreeMap::new(),
            processed_count: 0,
            budget,
            history: HashMap::new(),
        }
    }

    // -- content queue --

    pub fn enqueue(&mut self, item: ContentItem) {
        self.pending.push_back(item);
    }

    pub fn enqueue_all(&mut self, items: impl IntoIterator<Item = ContentItem>) {
        self.pending.extend(items);
    }

    pub fn queue_depth(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self) -> impl Iterator<Item = &ContentItem> {
        self.pending.iter()
    }

    pub(crate) fn pop_next(&mut self) -> Option<ContentItem> {
        self.pending.pop_front()
    }

    /// Return an uncommitted item to the head of the queue.
    pub(crate) fn push_front(&mut self, item: ContentItem) {
        self.pending.push_front(item);
    }

    // -- characters --

    /// Align character states with the registered ids: create states for
    /// new ids and drop departed ones. Returns `(added, removed)`.
    pub fn sync_characters(&mut self, ids: &[String]) -> (Vec<String>, Vec<String>) {
        let wanted: BTreeSet<String> = ids.iter().cloned().collect();

        let removed: Vec<String> = self
            .active_characters
            .difference(&wanted)
            .cloned()
            .collect();
        for id in &removed {
            self.characters.remove(id);
            self.history.remove(id);
        }

        let mut added = Vec::new();
        for id in &wanted {
            if !self.characters.contains_key(id) {
                self.characters
                    .insert(id.clone(), CharacterState::new(id.clone()));
                added.push(id.clone());
            }
        }

        self.active_characters = wanted;
        (added, removed)
    }

    pub fn active_characters(&self) -> &BTreeSet<String> {
        &self.active_characters
    }

    pub fn character(&self, id: &str) -> Option<&CharacterState> {
        self.characters.get(id)
    }

    pub fn characters(&self) -> impl Iterator<Item = &CharacterState> {
        self.characters.values()
    }

    /// Mutable access for callers seeding state (e.g. restored sessions).
    pub fn character_mut(&mut self, id: &str) -> Option<&mut CharacterState> {
        self.characters.get_mut(id)
    }

    /// Clone every character state, for restoring after an aborted cycle.
    pub(crate) fn snapshot_characters(&self) -> BTreeMap<String, CharacterState> {
        self.characters.clone()
    }

    pub(crate) fn restore_characters(&mut self, snapshot: BTreeMap<String, CharacterState>) {
        self.characters = snapshot;
    }

    pub(crate) fn put_character(&mut self, state: CharacterState) {
        if self.active_characters.contains(&state.character_id) {
            self.characters.insert(state.character_id.clone(), state);
        }
    }

    // -- output history --

    /// The character's recent outputs, oldest first.
    pub fn history_for(&self, id: &str) -> Vec<String> {
        self.history
            .get(id)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn record_output(&mut self, id: &str, text: &str) {
        let entries = self.history.entry(id.to_string()).or_default();
        entries.push_back(text.to_string());
        while entries.len() > HISTORY_LIMIT {
            entries.pop_front();
        }
    }

    // -- threads --

    pub fn threads(&self) -> impl Iterator<Item = (&Uuid, &ThreadEntry)> {
        self.threads.iter()
    }

    pub fn thread(&self, id: &Uuid) -> Option<&ThreadEntry> {
        self.threads.get(id)
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    pub(crate) fn insert_thread(&mut self, id: Uuid, entry: ThreadEntry) {
        self.threads.insert(id, entry);
    }

    pub(crate) fn remove_thread(&mut self, id: &Uuid) -> Option<ThreadEntry> {
        self.threads.remove(id)
    }

    /// Drop threads idle for longer than `retention`. Returns the pruned ids.
    pub async fn prune_threads(&mut self, now: DateTime<Utc>, retention: Duration) -> Vec<Uuid> {
        let mut stale = Vec::new();
        for (id, entry) in &self.threads {
            if entry.thread.lock().await.is_inactive(now, retention) {
                stale.push(*id);
            }
        }
        for id in &stale {
            self.threads.remove(id);
        }
        stale
    }

    // -- metrics --

    pub fn processed_count(&self) -> u64 {
        self.processed_count
    }

    pub(crate) fn mark_processed(&mut self) {
        self.processed_count += 1;
    }

    pub fn budget(&self) -> &HourlyCallBudget {
        &self.budget
    }

    pub(crate) fn budget_mut(&mut self) -> &mut HourlyCallBudget {
        &mut self.budget
    }

    /// Verify every state invariant, returning the first violation.
    pub async fn check_invariants(&self) -> Result<(), String> {
        let known: BTreeSet<&String> = self.characters.keys().collect();
        let active: BTreeSet<&String> = self.active_characters.iter().collect();
        if known != active {
            return Err(format!(
                "character states {:?} do not match active set {:?}",
                known, active
            ));
        }
        for state in self.characters.values() {
            state.check_invariants()?;
        }
        for entry in self.threads.values() {
            entry.thread.lock().await.check_invariants()?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn characters_mut_for_test(&mut self) -> &mut BTreeMap<String, CharacterState> {
        &mut self.characters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::ThreadEngagementState;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn item(id: &str) -> ContentItem {
        ContentItem::new(id, format!("headline {id}"), "", vec![], 0.5)
    }

    #[test]
    fn queue_is_fifo_and_push_front_restores_head() {
        let mut state = OrchestrationState::new(&ChorusConfig::default());
        state.enqueue_all([item("a"), item("b")]);
        let first = state.pop_next().unwrap();
        assert_eq!(first.id, "a");
        state.push_front(first);
        let order: Vec<&str> = state.pending().map(|i| i.id.as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[test]
    fn sync_characters_adds_and_drops() {
        let mut state = OrchestrationState::new(&ChorusConfig::default());
        let (added, removed) = state.sync_characters(&ids(&["ada", "rex"]));
        assert_eq!(added, ids(&["ada", "rex"]));
        assert!(removed.is_empty());

        state.record_output("rex", "hello");
        let (added, removed) = state.sync_characters(&ids(&["ada", "zoe"]));
        assert_eq!(added, ids(&["zoe"]));
        assert_eq!(removed, ids(&["rex"]));
        assert!(state.character("rex").is_none());
        assert!(state.history_for("rex").is_empty());
        assert!(state.character("zoe").is_some());
    }

    #[test]
    fn put_character_ignores_departed_ids() {
        let mut state = OrchestrationState::new(&ChorusConfig::default());
        state.sync_characters(&ids(&["ada"]));
        state.put_character(CharacterState::new("ghost"));
        assert!(state.character("ghost").is_none());
    }

    #[test]
    fn history_is_bounded() {
        let mut state = OrchestrationState::new(&ChorusConfig::default());
        for i in 0..15 {
            state.record_output("ada", &format!("line {i}"));
        }
        let history = state.history_for("ada");
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.first().map(String::as_str), Some("line 5"));
        assert_eq!(history.last().map(String::as_str), Some("line 14"));
    }

    #[tokio::test]
    async fn prune_removes_only_inactive_threads() {
        let mut state = OrchestrationState::new(&ChorusConfig::default());
        let now = Utc::now();
        let old = ThreadEngagementState::new_at("n1", "old", 2, now - Duration::hours(30));
        let fresh = ThreadEngagementState::new_at("n2", "fresh", 2, now - Duration::hours(1));
        let old_id = old.thread_id();
        let fresh_id = fresh.thread_id();
        for (id, t, c) in [(old_id, old, "n1"), (fresh_id, fresh, "n2")] {
            state.insert_thread(
                id,
                ThreadEntry {
                    thread: t.into_shared(),
                    content: Arc::new(item(c)),
                },
            );
        }

        let pruned = state.prune_threads(now, Duration::hours(24)).await;
        assert_eq!(pruned, vec![old_id]);
        assert!(state.thread(&fresh_id).is_some());
        assert_eq!(state.thread_count(), 1);
    }

    #[tokio::test]
    async fn invariants_detect_mismatched_character_set() {
        let mut state = OrchestrationState::new(&ChorusConfig::default());
        state.sync_characters(&ids(&["ada"]));
        assert!(state.check_invariants().await.is_ok());

        state
            .characters_mut_for_test()
            .insert("ghost".to_string(), CharacterState::new("ghost"));
        assert!(state.check_invariants().await.is_err());
    }

    #[tokio::test]
    async fn invariants_detect_thread_overflow() {
        let mut state = OrchestrationState::new(&ChorusConfig::default());
        let mut thread = ThreadEngagementState::new("n1", "orig", 1);
        thread.add_character_reply("ada", "one");
        thread.force_reply_for_test("ada", "two");
        state.insert_thread(
            thread.thread_id(),
            ThreadEntry {
                thread: thread.into_shared(),
                content: Arc::new(item("n1")),
            },
        );
        let err = state.check_invariants().await.unwrap_err();
        assert!(err.contains("cap 1"));
    }
}
