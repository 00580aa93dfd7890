//! The enthusiast: loves fresh news about launches and discoveries.

use chorus_core::personality::scoring::repetition_ratio;
use chorus_core::personality::{EngagementContext, PersonalityProfile};
use chorus_types::content::{ContentItem, clamp_unit};

use super::{PersonaCore, words};

/// Hours after publication at which an item stops counting as fresh.
const FRESHNESS_WINDOW_HOURS: f64 = 24.0;

#[derive(Debug, Clone)]
pub struct Enthusiast {
    core: PersonaCore,
}

impl Enthusiast {
    pub fn new(core: PersonaCore) -> Self {
        Self { core }
    }

    pub fn default_core(id: &str, max_replies_per_thread: usize) -> PersonaCore {
        PersonaCore {
            id: id.to_string(),
            display_name: "Sunny".to_string(),
            voice: "Upbeat early adopter; excited about new launches and discoveries.".to_string(),
            interests: words(&[
                "technology",
                "science",
                "space",
                "gaming",
                "entertainment",
                "sports",
                "startups",
            ]),
            signature_phrases: words(&["this is huge", "love to see it", "can't wait"]),
            fallback_responses: words(&[
                "Love to see it!",
                "This is huge, more soon!",
                "Can't wait to see where this goes.",
            ]),
            engagement_threshold: 0.4,
            cooldown_minutes: 10,
            max_daily_interactions: 30,
            max_replies_per_thread,
        }
    }

    pub fn core(&self) -> &PersonaCore {
        &self.core
    }
}

/// 1.0 for brand-new items, falling linearly to 0 over the freshness window.
fn freshness(context: &EngagementContext, content: &ContentItem) -> f64 {
    let age_hours = (context.now - content.published_at).num_minutes().max(0) as f64 / 60.0;
    clamp_unit(1.0 - age_hours / FRESHNESS_WINDOW_HOURS)
}

impl PersonalityProfile for Enthusiast {
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
        let relevance = self.core.topic_relevance(&content.topics);
        let mut p = 0.2
            + 0.4 * relevance
            + 0.25 * freshness(context, content)
            + 0.1 * content.relevance_score;
        if context.is_thread_reply {
            p += 0.1 - 0.1 * context.own_replies as f64;
        }
        p -= 0.15 * repetition_ratio(&self.core.interests, history, &content.text());
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
    use chrono::{Duration, Utc};

    #[test]
    fn fresh_news_beats_stale_news() {
        let sunny = Enthusiast::new(Enthusiast::default_core("sunny", 2));
        let now = Utc::now();
        let topics = vec!["space".to_string()];
        let fresh = ContentItem::new("n1", "Rocket lands", "", topics.clone(), 0.5)
            .with_published_at(now);
        let stale = ContentItem::new("n2", "Rocket lands", "", topics, 0.5)
            .with_published_at(now - Duration::hours(30));

        let ctx = EngagementContext::content(now);
        let p_fresh = sunny.engagement_probability(&ctx, &[], &fresh);
        let p_stale = sunny.engagement_probability(&ctx, &[], &stale);
        assert!(p_fresh > p_stale);
        assert!(p_fresh >= sunny.engagement_threshold());
    }

    #[test]
    fn future_timestamps_count_as_fresh() {
        let now = Utc::now();
        let item = ContentItem::new("n1", "h", "", vec![], 0.5).with_published_at(now + Duration::hours(2));
        assert_eq!(freshness(&EngagementContext::content(now), &item), 1.0);
    }
}
