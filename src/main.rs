//! `ferry-crossing`: run one full crossing with the configuration from `FERRY_CONFIG`
//! (or the defaults) and print a summary.
//!
//! Set `FERRY_TRACE_PATH` to write every trace event as JSON lines.

use std::fs::File;
use std::io::BufWriter;

use anyhow::Context;
use tracing::info;

use ferry_crossing::builders::SimulationBuilder;
use ferry_crossing::config::FerryConfig;
use ferry_crossing::core::{AppResult, JsonLinesSink};
use ferry_crossing::runtime::{ControllerExit, SimulationReport};
use ferry_crossing::util::init_tracing;

const TRACE_PATH_ENV: &str = "FERRY_TRACE_PATH";

fn main() -> AppResult<()> {
    init_tracing();
    let config = FerryConfig::from_env().context("loading ferry configuration")?;

    let mut builder = SimulationBuilder::new(config);
    if let Ok(path) = std::env::var(TRACE_PATH_ENV) {
        let file = File::create(&path).with_context(|| format!("creating trace file {path}"))?;
        info!(path = %path, "writing trace events");
        builder = builder.trace_sink(Box::new(JsonLinesSink::new(BufWriter::new(file))));
    }

    let report = builder.build()?.run()?;
    print_summary(&report);

    anyhow::ensure!(
        report.all_completed(),
        "only {} of {} vehicles completed",
        report.counters.completed,
        report.population
    );
    Ok(())
}

fn print_summary(report: &SimulationReport) {
    println!("run {}", report.run_id);
    println!(
        "  vehicles completed: {}/{}",
        report.counters.completed, report.population
    );
    println!("  departures:         {}", report.counters.departures);
    if let Some(controller) = report.controller {
        println!(
            "    full {} / partial {} / empty {}",
            controller.full, controller.partial, controller.empty
        );
    }
    if report.controller_exit == ControllerExit::Abandoned {
        println!("  controller:         abandoned after grace period");
    }
    for booth in &report.booths {
        println!(
            "  booth {} (side {}): {} vehicles",
            booth.id, booth.side, booth.uses
        );
    }
    println!("  elapsed:            {} ms", report.elapsed_ms);
}
