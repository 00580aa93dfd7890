//! Per-thread reply quota and context builder.
//!
//! `ThreadEngagementState` caps how often any one character may speak in a
//! thread and renders the bounded context a character sees when replying.
//! The cap is enforced on every write, so callers never need to check before
//! appending.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Replies from other characters included in a context by default.
pub const DEFAULT_CONTEXT_REPLIES: usize = 5;

/// A thread shared between concurrently running workflows.
///
/// Locks are only held for synchronous checks and appends, never across a
/// generator call.
pub type SharedThread = Arc<Mutex<ThreadEngagementState>>;

/// One reply in thread order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadReply {
    pub character_id: String,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Bookkeeping for one discussion thread rooted at a content item.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadEngagementState {
    thread_id: Uuid,
    content_id: String,
    original_content: String,
    replies: HashMap<String, Vec<String>>,
    timeline: Vec<ThreadReply>,
    max_replies_per_character: usize,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl ThreadEngagementState {
    /// Create an empty thread with a fresh id, stamped with the current time.
    pub fn new(
        content_id: impl Into<String>,
        original_content: impl Into<String>,
        max_replies_per_character: usize,
    ) -> Self {
        Self::new_at(content_id, original_content, max_replies_per_character, Utc::now())
    }

    /// Create an empty thread stamped with `now`.
    pub fn new_at(
        content_id: impl Into<String>,
        original_content: impl Into<String>,
        max_replies_per_character: usize,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            thread_id: Uuid::now_v7(),
            content_id: content_id.into(),
            original_content: original_content.into(),
            replies: HashMap::new(),
            timeline: Vec::new(),
            max_replies_per_character,
            created_at: now,
            last_activity: now,
        }
    }

    /// Wrap the state for sharing across workflow tasks.
    pub fn into_shared(self) -> SharedThread {
        Arc::new(Mutex::new(self))
    }

    pub fn thread_id(&self) -> Uuid {
        self.thread_id
    }

    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    pub fn original_content(&self) -> &str {
        &self.original_content
    }

    pub fn max_replies_per_character(&self) -> usize {
        self.max_replies_per_character
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Replies recorded for one character, oldest first.
    pub fn replies_for(&self, character_id: &str) -> &[String] {
        self.replies
            .get(character_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn reply_count(&self, character_id: &str) -> usize {
        self.replies_for(character_id).len()
    }

    pub fn total_replies(&self) -> usize {
        self.timeline.len()
    }

    /// Every reply in the order it was accepted.
    pub fn timeline(&self) -> &[ThreadReply] {
        &self.timeline
    }

    /// Characters with at least one reply, sorted.
    pub fn participants(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.replies.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// The character who replied most recently.
    pub fn last_speaker(&self) -> Option<&str> {
        self.timeline.last().map(|r| r.character_id.as_str())
    }

    /// True iff the character is still under the per-character cap.
    pub fn can_character_reply(&self, character_id: &str) -> bool {
        self.reply_count(character_id) < self.max_replies_per_character
    }

    /// Append a reply, stamped with the current time.
    ///
    /// Writes beyond the cap are dropped silently. Returns whether the reply
    /// was stored.
    pub fn add_character_reply(&mut self, character_id: &str, text: impl Into<String>) -> bool {
        self.add_character_reply_at(character_id, text, Utc::now())
    }

    /// Append a reply stamped with `now`. Same cap semantics as
    /// [`add_character_reply`](Self::add_character_reply).
    pub fn add_character_reply_at(
        &mut self,
        character_id: &str,
        text: impl Into<String>,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.can_character_reply(character_id) {
            tracing::debug!(
                thread_id = %self.thread_id,
                character_id,
                cap = self.max_replies_per_character,
                "Thread reply cap reached, dropping reply"
            );
            return false;
        }
        let text = text.into();
        self.replies
            .entry(character_id.to_string())
            .or_default()
            .push(text.clone());
        self.timeline.push(ThreadReply {
            character_id: character_id.to_string(),
            text,
            at: now,
        });
        if now > self.last_activity {
            self.last_activity = now;
        }
        true
    }

    /// Context for `character_id` with the default number of other replies.
    pub fn get_thread_context(&self, character_id: &str) -> String {
        self.thread_context_with_limit(character_id, DEFAULT_CONTEXT_REPLIES)
    }

    /// Render the original content, up to `limit` most recent replies from
    /// other characters, and this character's own latest reply.
    pub fn thread_context_with_limit(&self, character_id: &str, limit: usize) -> String {
        let mut context = self.original_content.clone();

        let others: Vec<&ThreadReply> = self
            .timeline
            .iter()
            .filter(|r| r.character_id != character_id)
            .collect();
        let skip = others.len().saturating_sub(limit);
        let recent = &others[skip..];

        if !recent.is_empty() {
            context.push_str("\n\nRecent replies:");
            for reply in recent {
                context.push_str(&format!("\n- {}: {}", reply.character_id, reply.text));
            }
        }

        if let Some(own) = self.replies_for(character_id).last() {
            context.push_str("\n\nYour previous reply:\n");
            context.push_str(own);
        }

        context
    }

    /// Most recent reply written by someone other than `character_id`.
    pub fn latest_excerpt_for(&self, character_id: &str) -> Option<String> {
        self.timeline
            .iter()
            .rev()
            .find(|r| r.character_id != character_id)
            .map(|r| format!("{}: {}", r.character_id, r.text))
    }

    /// Whether the thread has been idle for longer than `retention`.
    pub fn is_inactive(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        now - self.last_activity > retention
    }

    /// Verify the per-character cap, returning the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        for (character_id, replies) in &self.replies {
            if replies.len() > self.max_replies_per_character {
                return Err(format!(
                    "thread {}: character '{}' has {} replies (cap {})",
                    self.thread_id,
                    character_id,
                    replies.len(),
                    self.max_replies_per_character
                ));
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn force_reply_for_test(&mut self, character_id: &str, text: &str) {
        self.replies
            .entry(character_id.to_string())
            .or_default()
            .push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread(cap: usize) -> ThreadEngagementState {
        ThreadEngagementState::new("n1", "Central bank raises rates by 50bp", cap)
    }

    #[test]
    fn cap_of_two_blocks_third_reply() {
        let mut t = thread(2);
        assert!(t.add_character_reply("alice", "first"));
        assert!(t.add_character_reply("alice", "second"));
        assert!(!t.can_character_reply("alice"));

        assert!(!t.add_character_reply("alice", "third"));
        assert_eq!(t.replies_for("alice").len(), 2);
        assert_eq!(t.replies_for("alice"), ["first", "second"]);
    }

    #[test]
    fn can_reply_false_iff_count_equals_cap() {
        for cap in 0..4 {
            let mut t = thread(cap);
            for i in 0..6 {
                let count = t.reply_count("bob");
                assert_eq!(t.can_character_reply("bob"), count < cap);
                t.add_character_reply("bob", format!("reply {i}"));
                assert!(t.reply_count("bob") <= cap);
            }
            assert_eq!(t.reply_count("bob"), cap);
            assert!(!t.can_character_reply("bob"));
        }
    }

    #[test]
    fn cap_holds_for_interleaved_writers() {
        let mut t = thread(3);
        let ids = ["a", "b", "c"];
        for i in 0..20 {
            t.add_character_reply(ids[i % 3], format!("msg {i}"));
        }
        for id in ids {
            assert_eq!(t.reply_count(id), 3);
        }
        assert_eq!(t.total_replies(), 9);
        assert!(t.check_invariants().is_ok());
    }

    #[test]
    fn context_always_contains_original() {
        let mut t = thread(5);
        assert!(t.get_thread_context("anyone").starts_with("Central bank raises rates by 50bp"));
        t.add_character_reply("alice", "Inflation hawks win again.");
        t.add_character_reply("bob", "Mortgages just got pricier.");
        for who in ["alice", "bob", "carol"] {
            assert!(t.get_thread_context(who).contains("Central bank raises rates by 50bp"));
        }
    }

    #[test]
    fn context_limits_other_replies_and_includes_own() {
        let mut t = thread(10);
        t.add_character_reply("alice", "alice one");
        for i in 0..7 {
            t.add_character_reply("bob", format!("bob {i}"));
        }
        t.add_character_reply("alice", "alice two");

        let ctx = t.get_thread_context("alice");
        assert!(!ctx.contains("bob 0"));
        assert!(!ctx.contains("bob 1"));
        for i in 2..7 {
            assert!(ctx.contains(&format!("bob {i}")));
        }
        assert!(ctx.contains("Your previous reply:\nalice two"));
        assert!(!ctx.contains("- alice:"));
    }

    #[test]
    fn context_without_replies_is_just_original() {
        let t = thread(2);
        assert_eq!(t.get_thread_context("alice"), "Central bank raises rates by 50bp");
    }

    #[test]
    fn latest_excerpt_skips_own_replies() {
        let mut t = thread(3);
        assert!(t.latest_excerpt_for("alice").is_none());
        t.add_character_reply("bob", "bob says");
        t.add_character_reply("alice", "alice says");
        assert_eq!(t.latest_excerpt_for("alice").as_deref(), Some("bob: bob says"));
        assert_eq!(t.last_speaker(), Some("alice"));
        assert_eq!(t.participants(), vec!["alice".to_string(), "bob".to_string()]);
    }

    #[test]
    fn inactivity_uses_last_accepted_reply() {
        let start = Utc::now() - Duration::hours(30);
        let mut t = ThreadEngagementState::new_at("n1", "orig", 2, start);
        let now = start + Duration::hours(30);
        assert!(t.is_inactive(now, Duration::hours(24)));

        t.add_character_reply_at("alice", "late", start + Duration::hours(20));
        assert!(!t.is_inactive(now, Duration::hours(24)));
        assert_eq!(t.created_at(), start);
    }

    #[test]
    fn dropped_reply_does_not_touch_activity() {
        let start = Utc::now() - Duration::hours(2);
        let mut t = ThreadEngagementState::new_at("n1", "orig", 0, start);
        assert!(!t.add_character_reply_at("alice", "nope", Utc::now()));
        assert_eq!(t.last_activity(), start);
        assert_eq!(t.total_replies(), 0);
    }

    #[test]
    fn invariant_check_detects_overflow() {
        let mut t = thread(1);
        t.add_character_reply("alice", "ok");
        t.force_reply_for_test("alice", "smuggled");
        assert!(t.check_invariants().is_err());
    }
}
