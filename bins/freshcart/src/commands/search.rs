//! `freshcart search`

use anyhow::Context;
use freshcart_cli::output::{format_count, format_duration_ms, Status};
use freshcart_cli::render_results;
use freshcart_search::{
    create_config, BuyerContext, InMemoryCatalog, ProductSearch, SearchConfigInput,
    SearchEventSink, SearchResult, StorageCondition, TracingSink, WeightsInput,
};
use freshcart_telemetry::{metrics, MetricsSink, Timer};
use std::path::PathBuf;
use std::sync::Arc;

/// Flags for one search
#[derive(Debug, Clone, Default)]
pub struct SearchArgs {
    pub catalog: PathBuf,
    pub latitude: f64,
    pub longitude: f64,
    pub storage: Option<StorageCondition>,
    pub seller: Option<i64>,
    pub product_type: Option<i64>,
    pub overrides: SearchConfigInput,
    pub strict: bool,
    pub json: bool,
    pub show_metrics: bool,
}

/// Build the config overlay from individual flags
#[allow(clippy::too_many_arguments)]
pub fn overrides_from_flags(
    radius: Option<f64>,
    proximity_weight: Option<f64>,
    freshness_weight: Option<f64>,
    preset: Option<String>,
    min_freshness: Option<f64>,
    mode: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
    exclude_expired: bool,
    limit: Option<usize>,
) -> SearchConfigInput {
    let weights = (proximity_weight.is_some() || freshness_weight.is_some()).then_some(WeightsInput {
        proximity_weight,
        freshness_weight,
    });

    SearchConfigInput {
        max_radius_km: radius,
        weights,
        min_freshness_score: min_freshness,
        mode,
        sort_by,
        sort_order,
        weight_preset: preset,
        exclude_expired: exclude_expired.then_some(true),
        limit,
    }
}

pub fn run(args: SearchArgs, file_config: &SearchConfigInput, metrics_enabled: bool) -> anyhow::Result<()> {
    let input = file_config.clone().merged_with(&args.overrides);
    if args.strict {
        create_config(&input)?;
    }

    let catalog = InMemoryCatalog::from_path(&args.catalog)
        .with_context(|| format!("Failed to load catalog {}", args.catalog.display()))?;
    tracing::debug!(products = catalog.len(), "Catalog loaded");

    let mut buyer = BuyerContext::new(args.latitude, args.longitude);
    buyer.storage_capability = args.storage;

    let sink: Arc<dyn SearchEventSink> = if metrics_enabled {
        Arc::new(MetricsSink::new())
    } else {
        Arc::new(TracingSink)
    };
    let pipeline = ProductSearch::new().with_sink(sink);

    let timer = Timer::start("cli.search");
    let result = pipeline.search_source(
        &catalog,
        &buyer,
        args.seller,
        args.product_type,
        Some(&input),
    )?;
    timer.stop();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }

    if args.show_metrics {
        eprintln!("{}", serde_json::to_string_pretty(&metrics().export_json())?);
    }

    Ok(())
}

fn print_summary(result: &SearchResult) {
    let meta = &result.metadata;
    let stats = &meta.stats;

    Status::header(&format!(
        "{} ({} mode)",
        format_count(stats.output_count, "product", "products"),
        meta.resolved_config.mode
    ));
    if result.products.is_empty() {
        Status::warning("No products matched");
    } else {
        print!("{}", render_results(&result.products, true));
    }

    println!();
    Status::field("candidates", &stats.input_count.to_string());
    Status::field("passed filters", &stats.filtered_count.to_string());
    let breakdown = &stats.filter_breakdown;
    if breakdown.total() > 0 {
        Status::field(
            "filtered out",
            &format!(
                "radius {}, freshness {}, storage {}, expired {}",
                breakdown.radius, breakdown.freshness, breakdown.storage, breakdown.expired
            ),
        );
    }
    Status::field("radius", &format!("{} km", meta.resolved_config.max_radius_km));
    let weights = meta.resolved_config.weights;
    Status::field(
        "weights",
        &format!(
            "proximity {} / freshness {}{}",
            weights.proximity_weight,
            weights.freshness_weight,
            meta.resolved_config
                .weight_preset
                .map(|p| format!(" ({p})"))
                .unwrap_or_default()
        ),
    );
    Status::field("time", &format_duration_ms(meta.execution_time_ms));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_only_set_given_flags() {
        let overrides = overrides_from_flags(
            Some(4.0),
            None,
            Some(0.9),
            None,
            None,
            Some("filter".into()),
            None,
            None,
            false,
            None,
        );
        assert_eq!(overrides.max_radius_km, Some(4.0));
        let weights = overrides.weights.unwrap();
        assert_eq!(weights.proximity_weight, None);
        assert_eq!(weights.freshness_weight, Some(0.9));
        assert_eq!(overrides.exclude_expired, None);
        assert_eq!(overrides.mode.as_deref(), Some("filter"));
    }

    #[test]
    fn test_flags_win_over_file() {
        let file = SearchConfigInput::new().with_radius(2.0).with_weights(0.2, 0.8);
        let flags = overrides_from_flags(
            None, Some(0.6), None, None, None, None, None, None, true, None,
        );
        let merged = file.merged_with(&flags);

        assert_eq!(merged.max_radius_km, Some(2.0));
        let weights = merged.weights.unwrap();
        assert_eq!(weights.proximity_weight, Some(0.6));
        assert_eq!(weights.freshness_weight, Some(0.8));
        assert_eq!(merged.exclude_expired, Some(true));
    }
}
