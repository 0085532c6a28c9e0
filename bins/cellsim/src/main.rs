use clap::Parser;

use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cell_config::{SharedConfig, toml_config};
use cell_core::debug;
use cell_entities::stats::StatsReport;
use cell_entities::topology;

/// Load configuration file
fn load_config_from_toml(cfg_path: &str) -> SharedConfig {
    match toml_config::from_file(cfg_path) {
        Ok(c) => c,
        Err(e) => {
            println!("Failed to load configuration from {}: {}", cfg_path, e);
            std::process::exit(1);
        }
    }
}

fn print_report(report: &StatsReport) {
    println!("Simulated time: {} s", report.time);
    println!(
        "Router: {} delivered, {} undeliverable, {} messages / {} bytes sent",
        report.router.delivered, report.router.undeliverable, report.router.messages_sent, report.router.bytes_sent
    );
    for (node, node_report) in report.nodes.iter() {
        let mut line = format!("{:>6} {:<8}", node, node_report.role.to_string());
        if let Some(pool) = node_report.pool {
            line.push_str(&format!(
                " pool idle {} tentative {} in_use {} reserved {}",
                pool.idle, pool.tentative, pool.in_use, pool.reserved
            ));
        }
        println!("{}", line);
        for (counter, value) in node_report.counters.iter() {
            println!("         {:?}: {}", counter, value);
        }
    }
}

fn write_report_json(path: &str, report: &StatsReport) -> Result<(), Box<dyn std::error::Error>> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Cellular signalling core simulator",
    long_about = "Runs a simulated mobile network (MS, BS, SC, HLR, gateway) described by a TOML configuration file"
)]
struct Args {
    /// Config file (required)
    #[arg(help = "TOML config with topology, timers and scenario script")]
    config: String,

    /// Simulated run time in seconds. Without it, runs until interrupted.
    #[arg(short, long)]
    duration: Option<f64>,

    /// Also write the final statistics as JSON to this file
    #[arg(long)]
    stats_json: Option<String>,
}

fn main() {
    eprintln!("cellsim: GSM/UMTS style layer 3 signalling simulator\n");

    let args = Args::parse();
    let cfg = load_config_from_toml(&args.config);
    let _log_guard = debug::setup_logging_default(cfg.config().debug_log.clone());

    let duration = match args.duration {
        Some(secs) if secs.is_finite() && secs > 0.0 => Some(Duration::from_secs_f64(secs)),
        Some(secs) => {
            println!("Invalid duration: {}", secs);
            std::process::exit(1);
        }
        None => None,
    };

    let mut router = topology::build_router(cfg);

    // Set up Ctrl+C handler for graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        tracing::warn!("failed to set Ctrl+C handler: {}", e);
    }

    router.run_stack(duration, Some(running));

    let report = router.stats_report();
    tracing::info!("simulation ended at {}", report.time);
    print_report(&report);

    if let Some(path) = args.stats_json {
        if let Err(e) = write_report_json(&path, &report) {
            println!("Failed to write statistics to {}: {}", path, e);
            std::process::exit(1);
        }
    }
}
