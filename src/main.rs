//! pv-persistence entry point: CLI wiring and config-driven engine construction.

use std::path::Path;
use std::process;

use chrono::NaiveDate;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pv_persistence::config::RunConfig;
use pv_persistence::forecast::{ForecastConfig, Sample, SmartPersistence};
use pv_persistence::io::export::export_csv;
use pv_persistence::io::import::import_csv;
use pv_persistence::metrics::ForecastReport;
use pv_persistence::synthetic::SyntheticDay;

/// Day generated when neither `--input` nor `--synthetic` is given.
const DEFAULT_SYNTHETIC_DATE: (i32, u32, u32) = (2024, 6, 21);
const DEFAULT_SEED: u64 = 42;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    input: Option<String>,
    synthetic: Option<NaiveDate>,
    seed: u64,
    output: Option<String>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("pv-persistence: smart-persistence PV output forecasting");
    eprintln!();
    eprintln!("Usage: pv-persistence [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load configuration from TOML file");
    eprintln!("  --preset <name>          Use a built-in preset (stanford, stanford_geometric)");
    eprintln!("  --input <path>           Forecast samples from CSV (timestamp,actual_output)");
    eprintln!("  --synthetic <date>       Forecast a synthetic day (YYYY-MM-DD)");
    eprintln!("  --seed <u64>             Seed for the synthetic day (default: 42)");
    eprintln!("  --output <path>          Export per-sample forecasts to CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server after the batch");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the stanford preset is used.");
    eprintln!("If no --input or --synthetic is given, a synthetic 2024-06-21 is used.");
}

/// Returns the value following flag `args[*i]`, advancing `i`.
fn flag_value<'a>(args: &'a [String], i: &mut usize, what: &str) -> &'a str {
    let flag = &args[*i];
    *i += 1;
    match args.get(*i) {
        Some(v) => v.as_str(),
        None => {
            eprintln!("error: {flag} requires {what}");
            process::exit(1);
        }
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        input: None,
        synthetic: None,
        seed: DEFAULT_SEED,
        output: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                cli.scenario_path = Some(flag_value(&args, &mut i, "a path argument").to_owned());
            }
            "--preset" => {
                cli.preset = Some(flag_value(&args, &mut i, "a name argument").to_owned());
            }
            "--input" => {
                cli.input = Some(flag_value(&args, &mut i, "a path argument").to_owned());
            }
            "--synthetic" => {
                let v = flag_value(&args, &mut i, "a date argument");
                match NaiveDate::parse_from_str(v, "%Y-%m-%d") {
                    Ok(date) => cli.synthetic = Some(date),
                    Err(_) => {
                        eprintln!("error: --synthetic value \"{v}\" is not a YYYY-MM-DD date");
                        process::exit(1);
                    }
                }
            }
            "--seed" => {
                let v = flag_value(&args, &mut i, "a u64 argument");
                if let Ok(s) = v.parse::<u64>() {
                    cli.seed = s;
                } else {
                    eprintln!("error: --seed value \"{v}\" is not a valid u64");
                    process::exit(1);
                }
            }
            "--output" => {
                cli.output = Some(flag_value(&args, &mut i, "a path argument").to_owned());
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                let v = flag_value(&args, &mut i, "a u16 argument");
                if let Ok(p) = v.parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{v}\" is not a valid u16");
                    process::exit(1);
                }
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    if cli.input.is_some() && cli.synthetic.is_some() {
        eprintln!("error: --input and --synthetic are mutually exclusive");
        process::exit(1);
    }

    cli
}

/// Loads the run configuration: `--scenario` takes priority, then
/// `--preset`, then the stanford default.
fn load_config(cli: &CliArgs) -> RunConfig {
    let loaded = if let Some(ref path) = cli.scenario_path {
        RunConfig::from_toml_file(Path::new(path))
    } else if let Some(ref name) = cli.preset {
        RunConfig::from_preset(name)
    } else {
        Ok(RunConfig::stanford())
    };
    match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}

/// Reads `--input`, or generates the synthetic day.
fn load_samples(cli: &CliArgs, config: &ForecastConfig) -> Vec<Sample> {
    if let Some(ref path) = cli.input {
        return match import_csv(Path::new(path), config.civil_reference_longitude()) {
            Ok(samples) => samples,
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(1);
            }
        };
    }

    let (y, m, d) = DEFAULT_SYNTHETIC_DATE;
    let date = cli
        .synthetic
        .or_else(|| NaiveDate::from_ymd_opt(y, m, d))
        .unwrap_or_default();
    info!(%date, seed = cli.seed, "generating synthetic day");
    SyntheticDay::new(date, cli.seed).generate(config)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();
    let run_config = load_config(&cli);

    let errors = run_config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let config = match run_config.to_forecast_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };
    let engine = match SmartPersistence::from_config(&config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };
    info!(
        resolver = %config.resolver,
        strategy = %config.strategy,
        horizon_minutes = config.time_delta_minutes,
        "engine ready"
    );

    let samples = load_samples(&cli, &config);
    let forecasts = engine.run(&samples);
    let report = ForecastReport::evaluate(&forecasts, engine.horizon());

    for f in &forecasts {
        println!("{f}");
    }
    println!("\n{report}");

    if let Some(ref path) = cli.output {
        if let Err(e) = export_csv(&forecasts, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        info!(%path, "forecasts written");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        use pv_persistence::api::AppState;

        let state = Arc::new(AppState { config, engine });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(pv_persistence::api::serve(state, addr)) {
            eprintln!("error: API server failed: {e}");
            process::exit(1);
        }
    }
}
