//! `freshcart presets`

use freshcart_cli::output::Status;
use freshcart_search::PresetTable;
use owo_colors::OwoColorize;

pub fn run(json: bool) -> anyhow::Result<()> {
    let table = PresetTable::STANDARD;

    if json {
        let presets: Vec<serde_json::Value> = table
            .iter()
            .map(|(preset, weights)| {
                serde_json::json!({
                    "name": preset.name(),
                    "description": preset.description(),
                    "proximity_weight": weights.proximity_weight,
                    "freshness_weight": weights.freshness_weight,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&presets)?);
        return Ok(());
    }

    Status::header("Weight presets");
    for (preset, weights) in table.iter() {
        println!(
            "  {:<18} {:>4.1} / {:<4.1}  {}",
            preset.name().bold(),
            weights.proximity_weight,
            weights.freshness_weight,
            preset.description().dimmed()
        );
    }
    println!();
    println!("  {}", "weights are proximity / freshness".dimmed());

    Ok(())
}
