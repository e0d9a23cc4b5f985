use anyhow::{bail, Context, Result};
use race_strategy::{
    AppConfig, CsvTelemetrySource, ModelCache, StrategyComparator, StrategySimulator,
    TelemetrySource,
};
use std::env;
use tracing::info;

// Usage: race_strategy [config.json]
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match env::args().nth(1) {
        Some(path) => AppConfig::load(&path).with_context(|| format!("failed to load config {path}"))?,
        None => AppConfig::default(),
    };
    if config.plans.is_empty() {
        bail!("no strategy plans configured");
    }

    let source = CsvTelemetrySource::from_config(&config.telemetry);
    info!(source = %source.describe(), "starting simulation");
    let laps = source
        .load_laps()
        .with_context(|| format!("failed to read laps from {}", config.telemetry.laps_csv.display()))?;

    let mut cache = ModelCache::new();
    let model = cache.get_or_train(&laps, &config.model)?;
    println!("Lap-time model MAE: ~{:.2} seconds", model.mae());

    let simulator = StrategySimulator::new(config.simulation.clone());
    let mut results = Vec::with_capacity(config.plans.len());
    for named in &config.plans {
        let trace = simulator.simulate(&named.plan, model.as_ref())?;
        results.push((named, trace));
    }

    println!(
        "\n--- Strategies (Laps: {}, Pit Loss: {}s) ---",
        config.simulation.race_laps, config.simulation.pit_loss
    );
    for (named, trace) in &results {
        println!(
            "- {:10} : {:6} pit laps {:>6} | total {:9.2}s | tyre life left {:5.1}%",
            named.name,
            named.plan.tyre,
            trace.pit_summary(),
            trace.total_time(),
            trace.final_tyre_life().unwrap_or(0.0),
        );
    }

    let comparator = StrategyComparator::new(config.comparison.clone());
    let (base, base_trace) = &results[0];
    println!("\n--- Estimated position impact vs {} ---", base.name);
    for (named, trace) in results.iter().skip(1) {
        let change = comparator.compare(trace.total_time(), base_trace.total_time());
        println!("- {}: {}", named.name, change);
    }

    Ok(())
}
