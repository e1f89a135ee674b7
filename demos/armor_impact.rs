//! Armor impact example
//!
//! This example shows how to:
//! - Describe a layered armor composite
//! - Launch the contact waves of a projectile impact
//! - Run the simulation over a few reverberations
//! - Check the relevant layers against their failure stresses
//!
//! Run with `RUST_LOG=stresswave=debug` to follow the progress of the run.

use stresswave::analysis::hydrostatic::StressExtremes;
use stresswave::analysis::profiles::midpoint_history;
use stresswave::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    println!("StressWave - Armor Impact Example");
    println!("=================================\n");

    // Lead projectile followed by a ceramic/polymer/backing stack
    let specs = vec![
        LayerSpec::new(18.75, 14e9, 11340.0, 12300.0, 0.431)
            .with_tension_limit(2069e6)
            .with_relevance(false),
        LayerSpec::new(5.0, 70e9, 2500.0, 12000.0, 0.22)
            .with_tension_limit(300e6)
            .with_relevance(false),
        LayerSpec::new(0.6, 91e6, 1070.0, 12000.0, 0.3)
            .with_tension_limit(450e6)
            .with_relevance(false),
        LayerSpec::new(2.0, 70e9, 2500.0, 12000.0, 0.22)
            .with_tension_limit(300e6)
            .with_relevance(false),
        LayerSpec::new(0.35, 91e6, 1070.0, 12000.0, 0.3)
            .with_tension_limit(450e6)
            .with_relevance(false),
        LayerSpec::new(6.0, 70e9, 2500.0, 12000.0, 0.22).with_tension_limit(300e6),
        LayerSpec::new(0.62, 55e6, 1070.0, 12000.0, 0.3)
            .with_tension_limit(450e6)
            .with_relevance(false),
        LayerSpec::new(2.0, 2.35e9, 1200.0, 12000.0, 0.3).with_tension_limit(278e6),
    ];

    let params = SimulationParams {
        time_step: 0.01,
        duration: Duration::Reverberations(1.0),
        execution: Execution::Parallel,
    };

    let start = std::time::Instant::now();
    let result = simulate(&specs, &impact(-436.0), &params)?;
    println!(
        "Simulated {:.2} us in {} steps ({:.3} s)\n",
        result.duration,
        result.summary.steps,
        start.elapsed().as_secs_f64()
    );

    println!("Layers:");
    for (k, layer) in result.layers.iter().enumerate() {
        let extremes = StressExtremes::of(layer);
        let mid_peak = midpoint_history(layer)
            .map(|h| h.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())))
            .unwrap_or(0.0);
        println!("  #{k} {layer}");
        println!(
            "      nodes: {}, peak hydrostatic: +{:.1} / {:.1} MPa, mid-node peak: {:.1} MPa",
            layer.node_count(),
            extremes.max_tension / 1e6,
            extremes.max_compression / 1e6,
            mid_peak / 1e6
        );
    }

    println!();
    match result.evaluate() {
        Ok(verdict) => println!("{verdict}"),
        Err(err) => println!("<< {err} >>"),
    }

    Ok(())
}
