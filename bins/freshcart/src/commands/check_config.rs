//! `freshcart check-config`

use crate::config::load_settings_file;
use freshcart_cli::output::Status;
use freshcart_search::create_config;
use std::path::Path;

/// Run the strict validator over a settings file's `[search]` table
pub fn run(path: &Path) -> anyhow::Result<()> {
    let settings = load_settings_file(path)?;
    let config = create_config(&settings.search)?;

    Status::success(&format!("{} is valid", path.display()));
    Status::field("mode", config.mode.as_str());
    Status::field("radius", &format!("{} km", config.max_radius_km));
    Status::field(
        "weights",
        &format!(
            "proximity {} / freshness {}",
            config.weights.proximity_weight, config.weights.freshness_weight
        ),
    );
    if let Some(preset) = config.weight_preset {
        Status::field("preset", preset.name());
    }
    Status::field("min freshness", &format!("{}%", config.min_freshness_score));
    Status::field(
        "sort",
        &format!("{} {}", config.sort_by, config.sort_order),
    );

    Ok(())
}
