//! taxben-runner: headless runner for the tax-benefit engine.
//!
//! Usage:
//!   taxben-runner --data survey.txt --choice 1 --reform reform.json
//!   taxben-runner --synthetic 2000 --seed 7 --extract out.tsv
//!   taxben-runner --synthetic 2000 --ipc-mode

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::env;
use std::io::{self, BufRead, Write};
use std::time::Duration;
use taxben_core::{
    budget::RunBudget,
    compare::{format_signed, format_thousands, Comparison, ComparisonRow},
    config::EngineConfig,
    dataset::Dataset,
    engine::TaxBenEngine,
    output::OutputExtract,
    synth::{generate, PopulationSpec},
    types::DistributionStatistic,
};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Baseline {
        #[serde(default = "default_choice")]
        choice: u8,
    },
    Reform {
        #[serde(default = "default_choice")]
        choice: u8,
        #[serde(default)]
        params: Map<String, Value>,
    },
    Quit,
}

fn default_choice() -> u8 {
    1
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let synthetic = parse_arg(&args, "--synthetic", 0usize);
    let choice = parse_arg(&args, "--choice", 1u8);
    let budget_ms = parse_arg(&args, "--budget-ms", 0u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let data_path = arg_value(&args, "--data");
    let reform_path = arg_value(&args, "--reform");
    let extract_path = arg_value(&args, "--extract");
    let data_dir = arg_value(&args, "--data-dir");

    let config = match data_dir {
        Some(dir) => EngineConfig::load(dir)?,
        None => EngineConfig::builtin(),
    };

    let dataset = match data_path {
        Some(path) => Dataset::from_path(path).with_context(|| format!("Cannot load dataset {path}"))?,
        None => {
            let households = if synthetic > 0 { synthetic } else { 1000 };
            generate(&PopulationSpec::with_households(households), seed)?
        }
    };

    if !ipc_mode {
        println!("Tax-benefit microsimulation: taxben-runner");
        println!("  data:      {}", data_path.unwrap_or("synthetic"));
        println!("  seed:      {seed}");
        println!("  persons:   {}", dataset.len());
        println!("  data_dir:  {}", data_dir.unwrap_or("(built-in)"));
        println!();
    }

    let engine = TaxBenEngine::new(config, dataset);

    if ipc_mode {
        log::info!("IPC mode: {} persons loaded", engine.data().len());
        return run_ipc_loop(&engine);
    }

    let stat = DistributionStatistic::from_selector(choice)?;
    let overrides = match reform_path {
        Some(path) => load_overrides(path)?,
        None => Map::new(),
    };
    let budget = if budget_ms > 0 {
        RunBudget::with_limit(Duration::from_millis(budget_ms))
    } else {
        RunBudget::unlimited()
    };

    let outcome = engine.compare_within(stat, &overrides, &budget)?;
    for e in &outcome.param_errors {
        println!("  ! {e}");
    }
    print_summary(&outcome.comparison, stat);
    println!();
    println!(
        "  baseline run {} at {}",
        outcome.baseline.run.run_id,
        outcome.baseline.run.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "  reform run   {} at {}",
        outcome.reform.run.run_id,
        outcome.reform.run.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let finished = chrono::Utc::now();
    println!(
        "  wall time    {} ms",
        (finished - outcome.baseline.run.started_at).num_milliseconds()
    );

    if let Some(path) = extract_path {
        OutputExtract::from_simulation(&outcome.reform.simulated).write_tsv_path(path)?;
        println!("  extract:      {path}");
    }
    Ok(())
}

fn run_ipc_loop(engine: &TaxBenEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Malformed IPC command: {}", buffer.trim());
                writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };

        let reply = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Baseline { choice } => handle_baseline(engine, choice),
            IpcCommand::Reform { choice, params } => handle_reform(engine, choice, &params),
        };
        let reply = reply.unwrap_or_else(|e| serde_json::json!({ "error": format!("{e:#}") }));
        writeln!(stdout, "{reply}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn handle_baseline(engine: &TaxBenEngine, choice: u8) -> Result<Value> {
    let stat = DistributionStatistic::from_selector(choice)?;
    let baseline = engine.baseline(stat)?;
    Ok(serde_json::json!({
        "run": baseline.run,
        "results": baseline.bundle,
    }))
}

fn handle_reform(engine: &TaxBenEngine, choice: u8, params: &Map<String, Value>) -> Result<Value> {
    let stat = DistributionStatistic::from_selector(choice)?;
    let outcome = engine.compare(stat, params)?;
    let param_errors: Vec<String> = outcome.param_errors.iter().map(|e| e.to_string()).collect();
    Ok(serde_json::json!({
        "run": outcome.reform.run,
        "results": outcome.reform.bundle,
        "comparison": outcome.comparison,
        "param_errors": param_errors,
    }))
}

fn load_overrides(path: &str) -> Result<Map<String, Value>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    match serde_json::from_str(&content)? {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("{path}: expected a JSON object of parameter overrides"),
    }
}

fn print_summary(comparison: &Comparison, stat: DistributionStatistic) {
    println!("=== BUDGET (yearly, millions) / {} ===", stat.label());
    print_rows(&comparison.budget);

    println!();
    println!("=== SHARES (%) ===");
    print_rows(&comparison.shares);

    println!();
    println!("=== POVERTY RATE (%) ===");
    print_rows(&comparison.poverty_rate);

    println!();
    println!("=== POVERTY GAP (%) ===");
    print_rows(&comparison.poverty_gap);

    println!();
    println!("  poverty line used (yearly): {}", format_thousands(comparison.povline_yearly));
    println!();
    println!("=== POLICY CHANGES ===");
    for line in &comparison.policy_changes {
        println!("  {line}");
    }
}

fn print_rows(rows: &[ComparisonRow]) {
    for row in rows {
        match (row.baseline, row.reform, row.difference) {
            (Some(b), Some(r), Some(d)) => println!(
                "  {:<40} {:>14} {:>14} {:>12}",
                row.label,
                format_thousands(b),
                format_thousands(r),
                format_signed(d)
            ),
            _ => println!("  {}", row.label),
        }
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}
