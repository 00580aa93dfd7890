//! Which characters are offered a piece of content.

use std::sync::Arc;

use chorus_types::content::ContentItem;

use crate::personality::PersonalityProfile;
use crate::personality::registry::PersonalityRegistry;

/// Characters whose `topic_relevance` meets `threshold`, in id order.
///
/// Items without topics are offered to every registered character.
pub fn eligible_characters(
    registry: &PersonalityRegistry,
    content: &ContentItem,
    threshold: f64,
) -> Vec<Arc<dyn PersonalityProfile>> {
    registry
        .profiles()
        .filter(|p| !content.has_topics() || p.topic_relevance(&content.topics) >= threshold)
        .cloned()
        .collect()
}

/// Eligible characters for a reply round, excluding the last speaker.
pub fn eligible_repliers(
    registry: &PersonalityRegistry,
    content: &ContentItem,
    threshold: f64,
    last_speaker: Option<&str>,
) -> Vec<Arc<dyn PersonalityProfile>> {
    eligible_characters(registry, content, threshold)
        .into_iter()
        .filter(|p| Some(p.id()) != last_speaker)
        .collect()
}
