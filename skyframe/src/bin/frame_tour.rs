//! Run the synthetic frame tour.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin frame_tour
//! SKYFRAME_CONFIG=tour.yaml RUST_LOG=debug cargo run --release --bin frame_tour
//! ```

use std::time::Instant;

use anyhow::Context;
use skyframe::{run_tour, LogDisplay, Random, TourConfig};

fn main() -> anyhow::Result<()> {
    common::log_setup::setup_logging("skyframe", "info");

    let config = TourConfig::from_env().context("loading tour config")?;
    tracing::info!(
        seed = config.seed,
        n_objects = config.n_objects,
        extent = %config.extent,
        "Starting tour"
    );

    let start = Instant::now();
    let mut rng = Random::new(config.seed);
    let mut display = LogDisplay::new();
    let report = run_tour(&config, &mut rng, &mut display)?;

    println!("Gotchas:");
    for (i, gotcha) in report.gotchas.iter().enumerate() {
        println!("  {}. {}", i + 1, gotcha);
    }
    println!(
        "Before background subtraction: {} footprints, {:.1}% of pixels detected",
        report.before_subtraction.footprints,
        report.before_subtraction.coverage * 100.0
    );
    println!(
        "After background subtraction:  {} footprints for {} sources, {:.1}% of pixels detected",
        report.after_subtraction.footprints,
        report.sources.len(),
        report.after_subtraction.coverage * 100.0
    );
    println!(
        "Residual sky: median {:.2}, sigma {:.2}",
        report.residual_sky.median_clip, report.residual_sky.stdev_clip
    );
    println!(
        "Fill through view visible in parent: {}, halves combine exactly: {}",
        report.fill_visible, report.halves_match
    );
    tracing::info!(elapsed_ms = start.elapsed().as_millis() as u64, "Tour finished");
    Ok(())
}
