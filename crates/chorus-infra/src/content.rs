//! Content file loader.
//!
//! Reads a JSON array of content items, validates each one, and rejects
//! duplicate ids. The CLI enqueues the result in file order.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;

use chorus_types::content::ContentItem;
use chorus_types::error::ContentError;

/// Load and validate every item in a JSON content file.
pub async fn load_content_file(path: &Path) -> anyhow::Result<Vec<ContentItem>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read content file {}", path.display()))?;
    let items = parse_content(&raw)
        .with_context(|| format!("invalid content file {}", path.display()))?;
    tracing::debug!(count = items.len(), path = %path.display(), "Loaded content items");
    Ok(items)
}

/// Parse a JSON array of items, validating each and rejecting duplicate ids.
pub fn parse_content(raw: &str) -> Result<Vec<ContentItem>, ContentError> {
    let items: Vec<ContentItem> =
        serde_json::from_str(raw).map_err(|e| ContentError::Parse(e.to_string()))?;

    let mut seen = HashSet::new();
    let mut validated = Vec::with_capacity(items.len());
    for item in items {
        let item = item.validated()?;
        if !seen.insert(item.id.clone()) {
            return Err(ContentError::Duplicate(item.id));
        }
        validated.push(item);
    }
    Ok(validated)
}
