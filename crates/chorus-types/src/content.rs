//! Content items fed into the engagement engine.
//!
//! A `ContentItem` is a discrete unit of discussion-worthy material (a news
//! story, a post). Items are immutable once enqueued; the orchestrator shares
//! them with concurrent workflows behind an `Arc`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ContentError;

/// A single piece of content characters may react to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub headline: String,
    #[serde(default)]
    pub body: String,
    /// Topic labels attached by the content provider. May be empty.
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default = "Utc::now")]
    pub published_at: DateTime<Utc>,
    /// Provider-assigned relevance in `[0, 1]`.
    #[serde(default)]
    pub relevance_score: f64,
}

impl ContentItem {
    /// Build a content item, clamping `relevance_score` into `[0, 1]`.
    pub fn new(
        id: impl Into<String>,
        headline: impl Into<String>,
        body: impl Into<String>,
        topics: Vec<String>,
        relevance_score: f64,
    ) -> Self {
        Self {
            id: id.into(),
            headline: headline.into(),
            body: body.into(),
            topics: normalize_topics(topics),
            published_at: Utc::now(),
            relevance_score: clamp_unit(relevance_score),
        }
    }

    /// Override the publication timestamp.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = published_at;
        self
    }

    /// Validate an item that arrived through deserialization.
    ///
    /// Normalizes topics and clamps the relevance score. Rejects items with
    /// an empty id or headline, or a non-finite relevance score.
    pub fn validated(mut self) -> Result<Self, ContentError> {
        if self.id.trim().is_empty() {
            return Err(ContentError::MissingField("id"));
        }
        if self.headline.trim().is_empty() {
            return Err(ContentError::MissingField("headline"));
        }
        if !self.relevance_score.is_finite() {
            return Err(ContentError::InvalidRelevance(self.relevance_score));
        }
        self.relevance_score = clamp_unit(self.relevance_score);
        self.topics = normalize_topics(std::mem::take(&mut self.topics));
        Ok(self)
    }

    /// Whether the provider attached any topic labels.
    pub fn has_topics(&self) -> bool {
        !self.topics.is_empty()
    }

    /// The first topic label, used as the generation target topic.
    pub fn primary_topic(&self) -> Option<&str> {
        self.topics.first().map(String::as_str)
    }

    /// Headline and body joined as the canonical text of this item.
    pub fn text(&self) -> String {
        if self.body.trim().is_empty() {
            self.headline.clone()
        } else {
            format!("{}\n\n{}", self.headline, self.body)
        }
    }
}

/// Lowercase, trim and dedupe topic labels, keeping first-seen order.
fn normalize_topics(topics: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(topics.len());
    for topic in topics {
        let t = topic.trim().to_lowercase();
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}

/// Clamp a score into `[0, 1]`, mapping NaN to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clamps_relevance_and_normalizes_topics() {
        let item = ContentItem::new(
            "n1",
            "Rates rise",
            "",
            vec![" Economy ".to_string(), "economy".to_string(), "".to_string()],
            1.7,
        );
        assert_eq!(item.relevance_score, 1.0);
        assert_eq!(item.topics, vec!["economy".to_string()]);
    }

    #[test]
    fn text_omits_empty_body() {
        let item = ContentItem::new("n1", "Headline only", "  ", vec![], 0.5);
        assert_eq!(item.text(), "Headline only");

        let item = ContentItem::new("n2", "Head", "Body text", vec![], 0.5);
        assert_eq!(item.text(), "Head\n\nBody text");
    }

    #[test]
    fn validated_rejects_missing_headline() {
        let item = ContentItem {
            id: "x".to_string(),
            headline: " ".to_string(),
            body: String::new(),
            topics: vec![],
            published_at: Utc::now(),
            relevance_score: 0.2,
        };
        let err = item.validated().unwrap_err();
        assert!(err.to_string().contains("headline"));
    }

    #[test]
    fn validated_rejects_nan_relevance() {
        let item = ContentItem {
            id: "x".to_string(),
            headline: "h".to_string(),
            body: String::new(),
            topics: vec![],
            published_at: Utc::now(),
            relevance_score: f64::NAN,
        };
        assert!(matches!(
            item.validated(),
            Err(ContentError::InvalidRelevance(_))
        ));
    }

    #[test]
    fn deserialize_with_defaults() {
        let json = r#"{"id":"a","headline":"Launch day"}"#;
        let item: ContentItem = serde_json::from_str(json).unwrap();
        assert!(item.body.is_empty());
        assert!(!item.has_topics());
        assert_eq!(item.primary_topic(), None);
        assert_eq!(item.relevance_score, 0.0);
    }

    #[test]
    fn clamp_unit_handles_nan() {
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_unit(-0.5), 0.0);
        assert_eq!(clamp_unit(0.25), 0.25);
    }
}
