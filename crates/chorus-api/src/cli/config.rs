//! `chorus config`: print the effective configuration.

use anyhow::Result;
use console::style;

use chorus_infra::config::{config_path, load_config};
use chorus_infra::filesystem::resolve_data_dir;
use chorus_infra::persona::default_cast;
use chorus_types::config::ChorusConfig;

/// The loaded config with the default cast filled in for an empty roster.
pub fn effective_config(mut config: ChorusConfig) -> ChorusConfig {
    if config.characters.is_empty() {
        config.characters = default_cast();
    }
    config
}

pub async fn show_config(json: bool) -> Result<()> {
    let data_dir = resolve_data_dir();
    let config = effective_config(load_config(&data_dir).await);

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let path = config_path(&data_dir);
    let source = if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        path.display().to_string()
    } else {
        format!("{} (not found, defaults)", path.display())
    };
    println!("# {}", style(source).dim());
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
