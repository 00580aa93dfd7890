//! Personality capability surface.
//!
//! Every character is backed by one `PersonalityProfile` implementation. The
//! engine never inspects personality data directly; it only calls the
//! capabilities below:
//! - policy values: threshold, cooldown, daily cap, thread reply cap
//! - scoring: `topic_relevance` and `engagement_probability`
//! - voice: signature phrases, fallback lines, and a `snapshot` for the generator

pub mod registry;
pub mod scoring;

use chrono::{DateTime, Utc};

use chorus_types::content::ContentItem;
use chorus_types::generation::PersonalitySnapshot;

/// Situation in which an engagement decision is being made.
#[derive(Debug, Clone, PartialEq)]
pub struct EngagementContext {
    /// True when the opportunity is a reply inside an existing thread.
    pub is_thread_reply: bool,
    /// Rendered thread context on the reply path.
    pub thread_context: Option<String>,
    /// Replies this character already has in the thread.
    pub own_replies: usize,
    pub now: DateTime<Utc>,
}

impl EngagementContext {
    /// Context for a fresh content item.
    pub fn content(now: DateTime<Utc>) -> Self {
        Self {
            is_thread_reply: false,
            thread_context: None,
            own_replies: 0,
            now,
        }
    }

    /// Context for a reply opportunity inside a thread.
    pub fn thread_reply(thread_context: String, own_replies: usize, now: DateTime<Utc>) -> Self {
        Self {
            is_thread_reply: true,
            thread_context: Some(thread_context),
            own_replies,
            now,
        }
    }
}

/// Capability interface each character exposes to the engine.
///
/// Implementations must be cheap to call and side-effect free: the
/// orchestrator calls `topic_relevance` for every character on every item,
/// and workflows call `engagement_probability` from concurrent tasks.
pub trait PersonalityProfile: Send + Sync {
    /// Stable character id (registry key).
    fn id(&self) -> &str;

    fn display_name(&self) -> &str;

    /// One-line description of the character's voice, passed to the generator.
    fn voice(&self) -> &str;

    /// Interest keywords used for topical scoring.
    fn interests(&self) -> &[String];

    /// Minimum `decision_confidence` required to engage.
    fn engagement_threshold(&self) -> f64;

    /// Minutes the character stays quiet after engaging.
    fn cooldown_minutes(&self) -> u32;

    /// Engagements allowed per UTC day. Zero means unlimited.
    fn max_daily_interactions(&self) -> u32;

    /// Replies this character considers acceptable in one thread.
    fn max_replies_per_thread(&self) -> usize;

    /// How relevant a topic set is to this character, in `[0, 1]`.
    fn topic_relevance(&self, topics: &[String]) -> f64;

    /// Probability in `[0, 1]` that the character wants to react.
    ///
    /// `history` holds the character's own most recent outputs, newest last.
    fn engagement_probability(
        &self,
        context: &EngagementContext,
        history: &[String],
        content: &ContentItem,
    ) -> f64;

    /// Phrases that mark text as written in this character's voice.
    fn signature_phrases(&self) -> &[String];

    /// Canned lines used when the generator is unavailable.
    fn fallback_responses(&self) -> Vec<String>;

    /// Read-only snapshot handed to the generator.
    fn snapshot(&self) -> PersonalitySnapshot {
        PersonalitySnapshot {
            character_id: self.id().to_string(),
            display_name: self.display_name().to_string(),
            voice: self.voice().to_string(),
            interests: self.interests().to_vec(),
            signature_phrases: self.signature_phrases().to_vec(),
        }
    }
}
