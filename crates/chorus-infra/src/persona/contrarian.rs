//! The contrarian: pushes back on hyped items and relishes threads.

use chorus_core::personality::scoring::repetition_ratio;
use chorus_core::personality::{EngagementContext, PersonalityProfile};
use chorus_types::content::{ContentItem, clamp_unit};

use super::{PersonaCore, words};

#[derive(Debug, Clone)]
pub struct Contrarian {
    core: PersonaCore,
}

impl Contrarian {
    pub fn new(core: PersonaCore) -> Self {
        Self { core }
    }

    pub fn default_core(id: &str, max_replies_per_thread: usize) -> PersonaCore {
        PersonaCore {
            id: id.to_string(),
            display_name: "Rex".to_string(),
            voice: "Skeptical devil's advocate; challenges the consensus and asks who benefits."
                .to_string(),
            interests: words(&["politics", "economy", "technology", "culture", "media", "sports"]),
            signature_phrases: words(&["not so fast", "counterpoint", "who actually benefits"]),
            fallback_responses: words(&[
                "Not so fast. I'd want to see this hold up first.",
                "Counterpoint: everyone is far too sure about this.",
                "Call me skeptical.",
            ]),
            engagement_threshold: 0.5,
            cooldown_minutes: 20,
            max_daily_interactions: 16,
            max_replies_per_thread,
        }
    }

    pub fn core(&self) -> &PersonaCore {
        &self.core
    }
}

impl PersonalityProfile for Contrarian {
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

    /// Hyped items (high provider relevance) draw more pushback, and an
    /// ongoing argument is hard to resist.
    fn engagement_probability(
        &self,
        context: &EngagementContext,
        history: &[String],
        content: &ContentItem,
    ) -> f64 {
        let relevance = self.core.topic_relevance(&content.topics);
        let mut p = 0.2 + 0.35 * relevance + 0.25 * content.relevance_score;
        if context.is_thread_reply {
            p += 0.25 - 0.1 * context.own_replies as f64;
        }
        p -= 0.2 * repetition_ratio(&self.core.interests, history, &content.text());
        clamp_unit(p)
    }

    fn signature_phrases(&self) -> &[String] {
        &self.core.signature_phrases
    }

    fn fallback_responses(&self) -> Vec<String> {
        self.core.fallback_responses.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn threads_raise_probability() {
        let rex = Contrarian::new(Contrarian::default_core("rex", 3));
        let content = ContentItem::new("n1", "Election results", "", vec!["politics".into()], 0.6);
        let now = Utc::now();
        let fresh = rex.engagement_probability(&EngagementContext::content(now), &[], &content);
        let thread = rex.engagement_probability(
            &EngagementContext::thread_reply("ctx".to_string(), 0, now),
            &[],
            &content,
        );
        assert!(thread > fresh);
        assert!(thread >= rex.engagement_threshold());
    }

    #[test]
    fn uses_configured_thread_cap() {
        let rex = Contrarian::new(Contrarian::default_core("rex", 3));
        assert_eq!(rex.max_replies_per_thread(), 3);
        assert_eq!(rex.display_name(), "Rex");
    }
}
