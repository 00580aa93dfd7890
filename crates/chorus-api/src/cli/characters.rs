//! `chorus characters`: list the registered cast.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde::Serialize;

use chorus_core::personality::PersonalityProfile;
use chorus_infra::config::load_config;
use chorus_infra::filesystem::resolve_data_dir;
use chorus_infra::persona::build_registry;

/// One character as shown by the listing.
#[derive(Debug, Serialize)]
pub struct CharacterRow {
    pub id: String,
    pub display_name: String,
    pub voice: String,
    pub engagement_threshold: f64,
    pub cooldown_minutes: u32,
    pub max_daily_interactions: u32,
    pub max_replies_per_thread: usize,
    pub interests: Vec<String>,
}

impl CharacterRow {
    fn from_profile(profile: &dyn PersonalityProfile) -> Self {
        Self {
            id: profile.id().to_string(),
            display_name: profile.display_name().to_string(),
            voice: profile.voice().to_string(),
            engagement_threshold: profile.engagement_threshold(),
            cooldown_minutes: profile.cooldown_minutes(),
            max_daily_interactions: profile.max_daily_interactions(),
            max_replies_per_thread: profile.max_replies_per_thread(),
            interests: profile.interests().to_vec(),
        }
    }
}

/// Print every character the current config registers.
pub async fn list_characters(json: bool) -> Result<()> {
    let config = load_config(&resolve_data_dir()).await;
    let registry = build_registry(&config).context("failed to register characters")?;
    let rows: Vec<CharacterRow> = registry
        .profiles()
        .map(|profile| CharacterRow::from_profile(profile.as_ref()))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!();
    println!("  {} characters registered", style(rows.len()).bold());
    println!();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Id").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Threshold").fg(Color::White),
        Cell::new("Cooldown").fg(Color::White),
        Cell::new("Daily Cap").fg(Color::White),
        Cell::new("Thread Cap").fg(Color::White),
        Cell::new("Interests").fg(Color::White),
    ]);

    for row in &rows {
        let daily = if row.max_daily_interactions == 0 {
            "unlimited".to_string()
        } else {
            row.max_daily_interactions.to_string()
        };
        table.add_row(vec![
            Cell::new(&row.id).fg(Color::Cyan),
            Cell::new(&row.display_name),
            Cell::new(format!("{:.2}", row.engagement_threshold)),
            Cell::new(format!("{}m", row.cooldown_minutes)),
            Cell::new(daily),
            Cell::new(row.max_replies_per_thread),
            Cell::new(row.interests.join(", ")).fg(Color::DarkGrey),
        ]);
    }

    println!("{table}");
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_types::config::ChorusConfig;

    #[test]
    fn rows_follow_registry_order() {
        let registry = build_registry(&ChorusConfig::default()).unwrap();
        let rows: Vec<CharacterRow> = registry
            .profiles()
            .map(|p| CharacterRow::from_profile(p.as_ref()))
            .collect();
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["ada", "rex", "sunny"]);
        assert!(rows.iter().all(|r| !r.interests.is_empty()));
    }
}
