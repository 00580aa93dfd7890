//! The analyst: measured, data-driven, avoids repeating itself.

use chorus_core::personality::scoring::{repetition_ratio, text_keyword_hits};
use chorus_core::personality::{EngagementContext, PersonalityProfile};
use chorus_types::content::{ContentItem, clamp_unit};

use super::{PersonaCore, words};

/// Engages with high-relevance, on-topic items and backs off in threads.
#[derive(Debug, Clone)]
pub struct Analyst {
    core: PersonaCore,
}

impl Analyst {
    pub fn new(core: PersonaCore) -> Self {
        Self { core }
    }

    pub fn default_core(id: &str, max_replies_per_thread: usize) -> PersonaCore {
        PersonaCore {
            id: id.to_string(),
            display_name: "Ada".to_string(),
            voice: "Measured and data-driven; cites numbers, weighs second-order effects, avoids hype."
                .to_string(),
            interests: words(&[
                "economy",
                "markets",
                "finance",
                "technology",
                "science",
                "policy",
                "data",
            ]),
            signature_phrases: words(&["by the numbers", "the data suggests", "second-order effect"]),
            fallback_responses: words(&[
                "Not enough data yet to say more.",
                "Worth watching the numbers on this one.",
                "I'd wait for the follow-up figures before drawing conclusions.",
            ]),
            engagement_threshold: 0.45,
            cooldown_minutes: 15,
            max_daily_interactions: 24,
            max_replies_per_thread,
        }
    }

    pub fn core(&self) -> &PersonaCore {
        &self.core
    }
}

impl PersonalityProfile for Analyst {
    fn id(&self) -> &str {
        &self.core.id
    }

    fn display_name(&self) -> &str {
        &self.core.display_name
    }

    fn voice(&self) -> &str {
        &self.core.voice
    }

    fn interests(&self) -> &[String] {
        &self.core.interests
    }

    fn engagement_threshold(&self) -> f64 {
        self.core.engagement_threshold
    }

    fn cooldown_minutes(&self) -> u32 {
        self.core.cooldown_minutes
    }

    fn max_daily_interactions(&self) -> u32 {
        self.core.max_daily_interactions
    }

    fn max_replies_per_thread(&self) -> usize {
        self.core.max_replies_per_thread
    }

    fn topic_relevance(&self, topics: &[String]) -> f64 {
        self.core.topic_relevance(topics)
    }

    fn engagement_probability(
        &self,
        context: &EngagementContext,
        history: &[String],
        content: &ContentItem,
    ) -> f64 {
        let text = content.text();
        let relevance = self.core.topic_relevance(&content.topics);
        let hits = text_keyword_hits(&self.core.interests, &text) as f64;

        let mut p = 0.15 + 0.45 * relevance + 0.3 * content.relevance_score + (0.05 * hits).min(0.1);
        p -= 0.3 * repetition_ratio(&self.core.interests, history, &text);
        if context.is_thread_reply {
            p -= 0.1 + 0.15 * context.own_replies as f64;
        }
        clamp_unit(p)
    }

    fn signature_phrases(&self) -> &[String] {
        &self.core.signature_phrases
    }

    fn fallback_responses(&self) -> Vec<String> {
        self.core.fallback_responses.clone()
    }
}
