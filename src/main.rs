// Copyright 2025 Servus Altissimi (Pseudonym)

// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use csflred::engine::Params;
use csflred::prelude::*;
use csflred::simulation::SimReport;
use csflred::strategies::CurveParams;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{Level, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    verbose: bool,

    /// JSON queue disc configuration, replacing the preset's.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    Run {
        #[arg(short, long, default_value = "csfl-red")]
        strategy: String,
        #[arg(short, long, default_value_t = 60)]
        duration: u64,
        #[arg(short, long, default_value = "peak")]
        traffic: String,
        #[arg(long, default_value_t = 300.0)]
        base_rate: f64,
        #[arg(long, default_value_t = 600.0)]
        peak_rate: f64,
        #[arg(long, default_value_t = 10.0)]
        peak_duration: f64,
        #[arg(long, default_value_t = 500)]
        packet_size: u32,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
    },

    Compare {
        #[arg(short, long, default_value = "red,red-classic,ared,csfl-red,fuzzy-red")]
        strategies: String,
        #[arg(short, long, default_value_t = 60)]
        duration: u64,
        #[arg(short, long, default_value_t = 3)]
        repetitions: u32,
        #[arg(short, long, default_value = "peak")]
        traffic: String,
        #[arg(long, default_value_t = 300.0)]
        base_rate: f64,
        #[arg(long, default_value_t = 600.0)]
        peak_rate: f64,
        #[arg(long, default_value_t = 10.0)]
        peak_duration: f64,
    },

    /// Prints the drop probability against the average queue.
    Curve {
        #[arg(short, long, default_value = "csfl-red")]
        strategy: String,
        /// max_p to evaluate at; defaults to the preset's initial value.
        #[arg(long)]
        max_p: Option<f64>,
        #[arg(long, default_value_t = 20)]
        steps: u32,
    },

    List,
}

fn main() -> Result<()> {
    let program_start = Instant::now();

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();

    let override_config = cli.config.as_ref().map(|path| RedConfig::from_json_file(path)).transpose()?;

    match cli.command {
        Commands::Run {
            strategy,
            duration,
            traffic,
            base_rate,
            peak_rate,
            peak_duration,
            packet_size,
            seed,
            output,
        } => {
            let pattern = parse_traffic_pattern(&traffic, base_rate, peak_rate, peak_duration)?;
            let mut config = SimConfig {
                name: format!("{}_{}", strategy, traffic),
                strategy_name: strategy,
                duration: Duration::from_secs(duration),
                traffic_pattern: pattern,
                packet_size,
                seed,
                red: None,
            };
            if let Some(red) = override_config {
                config = config.with_red(red);
            }

            info!("CSFL-RED: Single Run");
            let sim = Simulation::new(config).with_progress(true);
            let report = sim.run()?;
            sim.save_results(&report, &output)?;
            comparison_table(&[report]);
        }

        Commands::Compare {
            strategies,
            duration,
            repetitions,
            traffic,
            base_rate,
            peak_rate,
            peak_duration,
        } => {
            let pattern = parse_traffic_pattern(&traffic, base_rate, peak_rate, peak_duration)?;
            compare_strategies(&strategies, duration, repetitions, pattern, override_config)?;
        }

        Commands::Curve { strategy, max_p, steps } => {
            let red = match override_config {
                Some(red) => red,
                None => StrategyRegistry::global()
                    .create(&strategy)
                    .ok_or_else(|| anyhow::anyhow!("Unknown strategy: {}", strategy))?,
            };
            print_curve(&red, max_p, steps)?;
        }

        Commands::List => {
            println!("\nAvailable Queue Disc Presets");

            for strategy in StrategyRegistry::global().list() {
                println!("  - {}", strategy);
            }

            println!("\nUsage: cargo run -- run --strategy <name>");
            println!("Example: cargo run -- run --strategy csfl-red --traffic poisson\n");
        }
    }

    let total_time = program_start.elapsed();
    info!("Total runtime: {:.2}s", total_time.as_secs_f64());

    Ok(())
}

fn compare_strategies(
    strategies_str: &str,
    duration: u64,
    repetitions: u32,
    pattern: TrafficPattern,
    override_config: Option<RedConfig>,
) -> Result<()> {
    let strategy_names: Vec<&str> = strategies_str.split(',').map(|s| s.trim()).collect();

    info!("CSFL-RED: Comparison");
    info!("Strategies: {}", strategy_names.join(", "));
    info!("Repetitions: {}", repetitions);
    info!("Duration per test: {}s", duration);

    let jobs: Vec<SimConfig> = strategy_names
        .iter()
        .flat_map(|name| {
            let (pattern, override_config) = (&pattern, &override_config);
            (1..=repetitions).map(move |rep| {
                let mut config = SimConfig {
                    name: format!("{}_{}", name, rep),
                    strategy_name: name.to_string(),
                    duration: Duration::from_secs(duration),
                    traffic_pattern: pattern.clone(),
                    packet_size: 500,
                    seed: rep as u64,
                    red: None,
                };
                if let Some(red) = override_config {
                    config = config.with_red(red.clone());
                }
                config
            })
        })
        .collect();

    // each run owns its clock and queue disc, so runs are independent
    let reports: Vec<SimReport> = jobs
        .into_par_iter()
        .map(|config| Simulation::new(config).run())
        .collect::<Result<_>>()?;

    let averaged: Vec<SimReport> = strategy_names
        .iter()
        .filter_map(|name| {
            let runs: Vec<&SimReport> = reports.iter().filter(|r| r.strategy == *name).collect();
            average_reports(&runs)
        })
        .collect();

    comparison_table(&averaged);

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    std::fs::create_dir_all("results")?;
    let comparison_path = format!("results/comparison_{}.json", timestamp);
    std::fs::write(&comparison_path, serde_json::to_string_pretty(&averaged)?)?;
    info!("Comparison saved to: {}", comparison_path);

    Ok(())
}

fn print_curve(red: &RedConfig, max_p: Option<f64>, steps: u32) -> Result<()> {
    red.validate()?;
    let params = Params::resolve(red);
    let max_p = max_p.unwrap_or(params.initial_max_p);
    let curve = CurveParams {
        min_th: params.min_th,
        max_th: params.max_th,
        gentle: red.gentle,
        membership: red.membership,
    };
    let hard = if red.gentle { 2.0 * params.max_th } else { params.max_th };
    let upper = hard * 1.25;

    println!("\n{} curve, max_p = {:.4}", red.curve, max_p);
    println!("{:>10}  {:>10}", "q_avg", "p");
    for i in 0..=steps {
        let q_avg = upper * i as f64 / steps.max(1) as f64;
        println!("{:>10.3}  {:>10.6}", q_avg, red.curve.probability(q_avg, max_p, &curve));
    }
    println!();
    Ok(())
}

fn parse_traffic_pattern(name: &str, base_rate: f64, peak_rate: f64, peak_duration: f64) -> Result<TrafficPattern> {
    match name.to_lowercase().as_str() {
        "constant" => Ok(TrafficPattern::Constant { rate_pps: base_rate }),
        "bursty" => Ok(TrafficPattern::Bursty {
            avg_rate_pps: base_rate,
            burst_size: 10,
        }),
        "poisson" => Ok(TrafficPattern::Poisson { lambda: base_rate }),
        "peak" => Ok(TrafficPattern::PeakTraffic {
            base_rate,
            peak_rate,
            peak_duration_s: peak_duration,
        }),
        _ => anyhow::bail!("Unknown traffic pattern: {}", name),
    }
}

fn average_reports(reports: &[&SimReport]) -> Option<SimReport> {
    let first = reports.first()?;
    let n = reports.len() as f64;
    let mean = |f: fn(&SimReport) -> f64| reports.iter().map(|r| f(r)).sum::<f64>() / n;

    let mut avg = (*first).clone();
    avg.name = first.strategy.clone();
    avg.throughput_mbps = mean(|r| r.throughput_mbps);
    avg.mean_delay_ms = mean(|r| r.mean_delay_ms);
    avg.final_q_avg = mean(|r| r.final_q_avg);
    avg.final_max_p = mean(|r| r.final_max_p);
    avg.summary.drop_rate = mean(|r| r.summary.drop_rate);
    avg.summary.mean_avg_queue = mean(|r| r.summary.mean_avg_queue);
    avg.summary.peak_avg_queue = reports.iter().map(|r| r.summary.peak_avg_queue).fold(0.0, f64::max);
    Some(avg)
}

fn comparison_table(reports: &[SimReport]) {
    println!("\n╔══════════════════════════════════════════════════════════════════════════════╗");
    println!("║                            QUEUE DISC COMPARISON                             ║");
    println!("╠═══════════════╦═══════════╦═══════════╦════════════╦════════════╦════════════╣");
    println!("║ Strategy      ║ Throughput║ Delay     ║ Loss Rate  ║ Avg Queue  ║ Final      ║");
    println!("║               ║ (mbps)    ║ (ms)      ║ (%)        ║ (packets)  ║ max_p      ║");
    println!("╠═══════════════╬═══════════╬═══════════╬════════════╬════════════╬════════════╣");

    for report in reports {
        println!(
            "║ {:<13} ║ {:>9.3} ║ {:>9.2} ║ {:>9.2}% ║ {:>10.2} ║ {:>10.4} ║",
            report.strategy,
            report.throughput_mbps,
            report.mean_delay_ms,
            report.summary.drop_rate * 100.0,
            report.summary.mean_avg_queue,
            report.final_max_p,
        );
    }

    println!("╚═══════════════╩═══════════╩═══════════╩════════════╩════════════╩════════════╝\n");

    if let Some(best_delay) = reports.iter().min_by(|a, b| a.mean_delay_ms.total_cmp(&b.mean_delay_ms)) {
        println!("Lowest Delay: {} ({:.2} ms)", best_delay.strategy, best_delay.mean_delay_ms);
    }

    if let Some(best_loss) = reports.iter().min_by(|a, b| a.summary.drop_rate.total_cmp(&b.summary.drop_rate)) {
        println!("Lowest Loss: {} ({:.2}%)", best_loss.strategy, best_loss.summary.drop_rate * 100.0);
    }

    println!();
}
