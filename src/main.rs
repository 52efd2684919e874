use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::time::Instant;
use tracing::{error, info, warn};

use pulsejet::config::{self, Axis};
use pulsejet::engine::{evaluate_with, ModelConstants, PerformanceResult};
use pulsejet::io::{ensure_parent, CsvWriter};
use pulsejet::scoring::{design_notes, score_engine, DesignNote, ScoredResult};
use pulsejet::sweep::{sensitivity_with, sweep_grid_with, sweep_with, SensitivityReport};
use pulsejet::validator::{validate_at, Severity, ValidationLevel, ValidationReport};
use pulsejet::{logging, optimize_with, EngineConfiguration, FuelType, Objective, Optimum, SweepField};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SCHEMA_VERSION: &str = "1.0.0";

#[derive(Parser, Debug)]
#[command(name = "pulsejet")]
#[command(version)]
#[command(about = "Steady-state pulse jet engine performance evaluator")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Output path (CSV; JSON bundles are written alongside)
    #[arg(short, long, global = true)]
    out: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a single configuration
    Run {
        /// Generate JSON result bundle
        #[arg(long)]
        json: bool,
    },
    /// Sweep one field over the [sweep] axis
    Sweep {
        /// Generate JSON outputs
        #[arg(long)]
        json: bool,
    },
    /// Sweep two fields over the [grid] axes
    Grid {
        /// Generate JSON outputs
        #[arg(long)]
        json: bool,
    },
    /// Compute local sensitivities via central finite differences
    Sensitivity {
        /// Relative step size
        #[arg(long, default_value = "0.01")]
        step: f64,
    },
    /// Compare the configuration across all fuels at equal equivalence ratio
    Compare {
        /// Generate JSON outputs
        #[arg(long)]
        json: bool,
    },
    /// Exhaustive grid search over the [optimize] ranges
    Optimize {
        /// Override the configured objective
        #[arg(long)]
        objective: Option<Objective>,
        /// Override the configured points per axis
        #[arg(long)]
        points: Option<usize>,
        /// Generate JSON outputs
        #[arg(long)]
        json: bool,
    },
    /// Check a configuration file against engineering ranges
    Validate {
        /// Tolerance level: strict, normal or permissive
        #[arg(long)]
        level: Option<ValidationLevel>,
        /// Exit with an error when any error-severity finding is reported
        #[arg(long)]
        deny_errors: bool,
    },
    /// List fuel reference data
    Fuels,
    /// Print version information
    Version,
}

// ============================================================================
// JSON Output Structures
// ============================================================================

#[derive(Serialize)]
struct Manifest {
    schema_version: String,
    tool_version: String,
    timestamp_utc: String,
    platform: String,
    config_name: String,
    config_hash: String,
    config_snapshot: config::Root,
}

#[derive(Serialize)]
struct ResultBundle {
    manifest: Manifest,
    validation: ValidationReport,
    performance: PerformanceResult,
    score: ScoredResult,
    design_notes: Vec<DesignNote>,
    wall_time_ms: f64,
}

#[derive(Serialize)]
struct PointOutput {
    case: String,
    parameters: Vec<(SweepField, f64)>,
    status: &'static str,
    result: Option<PerformanceResult>,
    error: Option<String>,
}

impl PointOutput {
    fn new(
        case: String,
        parameters: Vec<(SweepField, f64)>,
        outcome: Result<&PerformanceResult, String>,
    ) -> Self {
        match outcome {
            Ok(r) => Self {
                case,
                parameters,
                status: "ok",
                result: Some(*r),
                error: None,
            },
            Err(e) => Self {
                case,
                parameters,
                status: "failed",
                result: None,
                error: Some(e),
            },
        }
    }
}

#[derive(Serialize)]
struct SweepSummary {
    manifest: Manifest,
    fields: Vec<SweepField>,
    total_runs: usize,
    successful_runs: usize,
    failed_runs: usize,
    wall_time_ms: f64,
    points: Vec<PointOutput>,
}

#[derive(Serialize)]
struct SensitivityOutput {
    manifest: Manifest,
    #[serde(flatten)]
    report: SensitivityReport,
}

#[derive(Serialize)]
struct FuelComparison {
    fuel: FuelType,
    air_fuel_ratio: f64,
    status: &'static str,
    result: Option<PerformanceResult>,
    score: Option<f64>,
    thrust_change_pct: Option<f64>,
    error: Option<String>,
}

#[derive(Serialize)]
struct ComparisonOutput {
    manifest: Manifest,
    baseline_fuel: FuelType,
    equivalence_ratio: f64,
    fuels: Vec<FuelComparison>,
}

#[derive(Serialize)]
struct OptimizationOutput {
    manifest: Manifest,
    points_per_axis: usize,
    optimum: Optimum,
    wall_time_ms: f64,
}

// ============================================================================
// Helper Functions
// ============================================================================

struct Loaded {
    root: config::Root,
    text: String,
    engine: EngineConfiguration,
    constants: ModelConstants,
}

impl Loaded {
    fn evaluator(&self) -> impl Fn(&EngineConfiguration) -> Result<PerformanceResult, pulsejet::DomainError> + Sync + '_ {
        move |c: &EngineConfiguration| evaluate_with(c, &self.constants)
    }
}

fn load(config_path: Option<&String>) -> Result<Loaded> {
    let path = config_path.context("--config required")?;
    let (root, text) = config::Root::load(path)?;
    info!(
        name = %root.metadata.name,
        version = %root.metadata.version,
        "loaded configuration {}",
        path
    );
    let engine = root.engine();
    let constants = root.constants();
    Ok(Loaded {
        root,
        text,
        engine,
        constants,
    })
}

fn compute_hash(data: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    data.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn create_manifest(loaded: &Loaded) -> Manifest {
    Manifest {
        schema_version: SCHEMA_VERSION.to_string(),
        tool_version: VERSION.to_string(),
        timestamp_utc: jiff::Timestamp::now().to_string(),
        platform: std::env::consts::OS.to_string(),
        config_name: loaded.root.metadata.name.clone(),
        config_hash: compute_hash(&loaded.text),
        config_snapshot: loaded.root.clone(),
    }
}

fn json_path(out_path: &str, suffix: &str) -> String {
    match out_path.strip_suffix(".csv") {
        Some(stem) => format!("{stem}{suffix}"),
        None => format!("{out_path}{suffix}"),
    }
}

fn write_json<T: Serialize>(path: &str, value: &T) -> Result<()> {
    ensure_parent(std::path::Path::new(path))?;
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("writing {path}"))?;
    info!("JSON: {}", path);
    Ok(())
}

fn log_findings(report: &ValidationReport) {
    for f in &report.findings {
        match f.severity {
            Severity::Error => error!(field = f.field, "{}", f.message),
            Severity::Warning => warn!(field = f.field, "{}", f.message),
            Severity::Info => info!(field = f.field, "{}", f.message),
        }
    }
}

/// Run the validator at the configured level and honor `deny_errors`.
fn precheck(loaded: &Loaded) -> Result<ValidationReport> {
    let report = validate_at(&loaded.engine, loaded.root.validation.level);
    log_findings(&report);
    if loaded.root.validation.deny_errors && report.has_errors() {
        bail!(
            "configuration has {} error finding(s) at {} level",
            report.count(Severity::Error),
            report.level
        );
    }
    Ok(report)
}

fn require_axis<'a>(axis: Option<&'a Axis>, section: &str) -> Result<&'a Axis> {
    axis.with_context(|| format!("[{section}] section required"))
}

// ============================================================================
// Run Modes
// ============================================================================

fn run_single(loaded: &Loaded, out_path: &str, json_output: bool) -> Result<()> {
    let report = precheck(loaded)?;

    let start = Instant::now();
    let result = evaluate_with(&loaded.engine, &loaded.constants)
        .context("configuration cannot be evaluated")?;
    let wall_time_ms = start.elapsed().as_secs_f64() * 1000.0;
    let scored = score_engine(&loaded.engine, &result);

    let mut w = CsvWriter::create(out_path)?;
    w.write_header(&[])?;
    w.write_row("baseline", &[], Ok(&result))?;
    w.flush()?;

    println!("{}", loaded.root.metadata.name);
    println!("  frequency          {:>10.1} Hz", result.frequency_hz);
    println!("  thrust             {:>10.2} N", result.thrust_n);
    println!("  exhaust velocity   {:>10.1} m/s", result.exhaust_velocity_m_s);
    println!("  air mass flow      {:>10.4} kg/s", result.air_mass_flow_kg_s);
    println!("  fuel consumption   {:>10.3} kg/h", result.fuel_consumption_kg_h);
    println!("  thermal efficiency {:>10.2} %", result.thermal_efficiency_pct);
    println!("  specific impulse   {:>10.1} s", result.specific_impulse_s);
    println!("  power              {:>10.2} kW", result.power_kw);
    println!(
        "  score              {:>10.1} ({:?}, {:?})",
        scored.score, scored.rank_labels.grade, scored.rank_labels.size_class
    );
    info!("CSV: {}", out_path);

    if json_output {
        let bundle = ResultBundle {
            manifest: create_manifest(loaded),
            validation: report,
            performance: result,
            score: scored,
            design_notes: design_notes(&loaded.engine, &result),
            wall_time_ms,
        };
        write_json(&json_path(out_path, ".json"), &bundle)?;
    }

    Ok(())
}

fn run_sweep(loaded: &Loaded, out_path: &str, json_output: bool) -> Result<()> {
    let axis = require_axis(loaded.root.sweep.as_ref(), "sweep")?;
    precheck(loaded)?;

    let values = axis.values();
    let start = Instant::now();
    let sweep = sweep_with(loaded.evaluator(), &loaded.engine, axis.field, &values);
    let wall_time_ms = start.elapsed().as_secs_f64() * 1000.0;

    let mut w = CsvWriter::create(out_path)?;
    w.write_header(&[axis.field.name()])?;
    let mut points = Vec::new();
    for (i, entry) in sweep.entries.iter().enumerate() {
        let case = format!("sweep_{i:04}");
        w.write_row(&case, &[entry.value], entry.outcome.as_ref().map_err(|e| &e.source))?;
        if json_output {
            points.push(PointOutput::new(
                case,
                vec![(axis.field, entry.value)],
                entry.outcome.as_ref().map_err(|e| e.to_string()),
            ));
        }
    }
    w.flush()?;

    info!(
        "sweep complete: {}/{} evaluated ({} failed) in {:.1}ms",
        sweep.successes(),
        sweep.len(),
        sweep.failures(),
        wall_time_ms
    );

    if json_output {
        let summary = SweepSummary {
            manifest: create_manifest(loaded),
            fields: vec![axis.field],
            total_runs: sweep.len(),
            successful_runs: sweep.successes(),
            failed_runs: sweep.failures(),
            wall_time_ms,
            points,
        };
        write_json(&json_path(out_path, "_summary.json"), &summary)?;
    }

    Ok(())
}

fn run_grid(loaded: &Loaded, out_path: &str, json_output: bool) -> Result<()> {
    let grid = loaded.root.grid.as_ref().context("[grid] section required")?;
    precheck(loaded)?;

    let (rows, cols) = (&grid.rows, &grid.cols);
    let start = Instant::now();
    let result = sweep_grid_with(
        loaded.evaluator(),
        &loaded.engine,
        rows.field,
        &rows.values(),
        cols.field,
        &cols.values(),
    );
    let wall_time_ms = start.elapsed().as_secs_f64() * 1000.0;

    let mut w = CsvWriter::create(out_path)?;
    w.write_header(&[rows.field.name(), cols.field.name()])?;
    let mut points = Vec::new();
    for (i, j, r, c, cell) in result.iter() {
        let case = format!("grid_{i:04}_{j:04}");
        w.write_row(&case, &[r, c], cell.as_ref().map_err(|e| &e.source))?;
        if json_output {
            points.push(PointOutput::new(
                case,
                vec![(rows.field, r), (cols.field, c)],
                cell.as_ref().map_err(|e| e.to_string()),
            ));
        }
    }
    w.flush()?;

    info!(
        "grid complete: {}/{} evaluated in {:.1}ms",
        result.successes(),
        result.cells.len(),
        wall_time_ms
    );

    if json_output {
        let summary = SweepSummary {
            manifest: create_manifest(loaded),
            fields: vec![rows.field, cols.field],
            total_runs: result.cells.len(),
            successful_runs: result.successes(),
            failed_runs: result.failures(),
            wall_time_ms,
            points,
        };
        write_json(&json_path(out_path, "_summary.json"), &summary)?;
    }

    Ok(())
}

fn opt_cell(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.6e}")).unwrap_or_default()
}

fn run_sensitivity(loaded: &Loaded, out_path: &str, step: f64) -> Result<()> {
    if !(step > 0.0 && step < 0.5) {
        bail!("--step must be in (0, 0.5)");
    }
    precheck(loaded)?;

    let report = sensitivity_with(loaded.evaluator(), &loaded.engine, &SweepField::ALL, step)
        .context("base configuration cannot be evaluated")?;

    ensure_parent(std::path::Path::new(out_path))?;
    let mut file = fs::File::create(out_path).with_context(|| format!("creating {out_path}"))?;
    writeln!(
        file,
        "parameter,base_value,step,d_thrust,d_frequency,d_specific_impulse,d_thermal_efficiency,thrust_elasticity"
    )?;
    for row in &report.rows {
        writeln!(
            file,
            "{},{:.6},{:.6e},{},{},{},{},{}",
            row.field,
            row.base_value,
            row.step,
            opt_cell(row.d_thrust),
            opt_cell(row.d_frequency),
            opt_cell(row.d_specific_impulse),
            opt_cell(row.d_thermal_efficiency),
            opt_cell(row.thrust_elasticity)
        )?;
    }

    let mut ranked: Vec<_> = report
        .rows
        .iter()
        .filter_map(|r| r.thrust_elasticity.map(|e| (r.field, e)))
        .collect();
    ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
    println!("thrust elasticity (% per %):");
    for (field, e) in &ranked {
        println!("  {:<22} {:>+8.3}", field.name(), e);
    }

    info!("sensitivity analysis complete");
    info!("CSV: {}", out_path);
    let output = SensitivityOutput {
        manifest: create_manifest(loaded),
        report,
    };
    write_json(&json_path(out_path, ".json"), &output)?;

    Ok(())
}

fn run_compare(loaded: &Loaded, out_path: &str, json_output: bool) -> Result<()> {
    precheck(loaded)?;
    let base = &loaded.engine;
    let phi = base.operating.equivalence_ratio();
    let baseline = evaluate_with(base, &loaded.constants).ok();

    let mut w = CsvWriter::create(out_path)?;
    w.write_header(&["air_fuel_ratio"])?;
    let mut fuels = Vec::new();
    for fuel in FuelType::ALL {
        let config = base.with_fuel(fuel);
        let afr = config.operating.air_fuel_ratio;
        let outcome = evaluate_with(&config, &loaded.constants);
        w.write_row(fuel.name(), &[afr], outcome.as_ref())?;

        match &outcome {
            Ok(r) => println!(
                "  {:<10} AFR {:>6.2}  thrust {:>8.2} N  Isp {:>7.1} s  eff {:>5.2} %",
                fuel.name(),
                afr,
                r.thrust_n,
                r.specific_impulse_s,
                r.thermal_efficiency_pct
            ),
            Err(e) => println!("  {:<10} AFR {:>6.2}  failed: {}", fuel.name(), afr, e),
        }

        fuels.push(FuelComparison {
            fuel,
            air_fuel_ratio: afr,
            status: if outcome.is_ok() { "ok" } else { "failed" },
            result: outcome.as_ref().ok().copied(),
            score: outcome.as_ref().ok().map(|r| score_engine(&config, r).score),
            thrust_change_pct: match (&outcome, &baseline) {
                (Ok(r), Some(b)) => Some((r.thrust_n - b.thrust_n) / b.thrust_n * 100.0),
                _ => None,
            },
            error: outcome.as_ref().err().map(|e| e.to_string()),
        });
    }
    w.flush()?;
    info!("CSV: {}", out_path);

    if json_output {
        let output = ComparisonOutput {
            manifest: create_manifest(loaded),
            baseline_fuel: base.operating.fuel,
            equivalence_ratio: phi,
            fuels,
        };
        write_json(&json_path(out_path, ".json"), &output)?;
    }

    Ok(())
}

fn run_optimize(
    loaded: &Loaded,
    out_path: &str,
    objective: Option<Objective>,
    points: Option<usize>,
    json_output: bool,
) -> Result<()> {
    let opt = loaded
        .root
        .optimize
        .as_ref()
        .context("[optimize] section required")?;
    precheck(loaded)?;

    let objective = objective.unwrap_or(opt.objective);
    let points = points.unwrap_or(opt.points);

    let start = Instant::now();
    let optimum = optimize_with(loaded.evaluator(), &loaded.engine, &opt.ranges, points, objective)?;
    let wall_time_ms = start.elapsed().as_secs_f64() * 1000.0;

    let names: Vec<&str> = optimum.parameters.iter().map(|(f, _)| f.name()).collect();
    let values: Vec<f64> = optimum.parameters.iter().map(|(_, v)| *v).collect();
    let mut w = CsvWriter::create(out_path)?;
    w.write_header(&names)?;
    w.write_row("optimum", &values, Ok(&optimum.result))?;
    w.flush()?;

    println!("best {} = {:.4}", objective, optimum.objective_value);
    for (field, value) in &optimum.parameters {
        println!("  {:<22} {:>10.3} {}", field.name(), value, field.unit());
    }
    info!(
        "grid search: {} points, {} failed, {:.1}ms",
        optimum.evaluated, optimum.failed, wall_time_ms
    );

    if json_output {
        let output = OptimizationOutput {
            manifest: create_manifest(loaded),
            points_per_axis: points,
            optimum,
            wall_time_ms,
        };
        write_json(&json_path(out_path, ".json"), &output)?;
    }

    Ok(())
}

fn run_validate(loaded: &Loaded, level: Option<ValidationLevel>, deny_errors: bool) -> Result<()> {
    let level = level.unwrap_or(loaded.root.validation.level);
    let report = validate_at(&loaded.engine, level);

    println!("Configuration: {}", loaded.root.metadata.name);
    println!("  level:    {}", report.level);
    println!("  fuel:     {}", loaded.engine.operating.fuel);
    println!("  valves:   {} x {}", loaded.engine.valves.valve_count, loaded.engine.valves.valve_type);
    if report.is_empty() {
        println!("  no findings");
    }
    for f in &report.findings {
        println!("  {f}");
    }
    println!(
        "  {} error(s), {} warning(s), {} info",
        report.count(Severity::Error),
        report.count(Severity::Warning),
        report.count(Severity::Info)
    );

    if (deny_errors || loaded.root.validation.deny_errors) && report.has_errors() {
        bail!("validation failed with {} error(s)", report.count(Severity::Error));
    }
    Ok(())
}

fn print_fuels() {
    println!(
        "{:<10} {:>8} {:>8} {:>9} {:>7} {:>11} {:>8}",
        "fuel", "LHV", "AFR", "density", "MW", "autoignite", "T_ad"
    );
    println!(
        "{:<10} {:>8} {:>8} {:>9} {:>7} {:>11} {:>8}",
        "", "MJ/kg", "", "kg/L", "g/mol", "C", "K"
    );
    for fuel in FuelType::ALL {
        let p = fuel.properties();
        println!(
            "{:<10} {:>8.1} {:>8.1} {:>9.4} {:>7.1} {:>11.0} {:>8.0}",
            p.name,
            p.lower_heating_value_mj_kg,
            p.stoichiometric_afr,
            p.density_kg_l,
            p.molecular_weight,
            p.autoignition_temp_c,
            p.adiabatic_flame_temp_k
        );
    }
}

fn print_version() {
    println!("pulsejet - steady-state pulse jet performance evaluator");
    println!();
    println!("  Version:        {}", VERSION);
    println!("  Schema Version: {}", SCHEMA_VERSION);
    println!("  Platform:       {}", std::env::consts::OS);
    println!("  Architecture:   {}", std::env::consts::ARCH);
    println!();
    println!("Model:");
    println!("  - Helmholtz resonance with end-corrected exhaust length");
    println!("  - Valve-limited intake flow with duty-cycle cap");
    println!("  - Equivalence-ratio combustion curve, isentropic expansion");
    println!("  - Choked/unchoked pressure thrust");
    println!();
    println!("Valve types: reed, flapper, rotary");
    println!(
        "Fuels:       {}",
        FuelType::ALL.map(|f| f.name()).join(", ")
    );
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    logging::setup_logging(args.verbose, args.quiet);

    match args.command {
        Commands::Version => {
            print_version();
            Ok(())
        }
        Commands::Fuels => {
            print_fuels();
            Ok(())
        }
        Commands::Validate { level, deny_errors } => {
            let loaded = load(args.config.as_ref())?;
            run_validate(&loaded, level, deny_errors)
        }
        Commands::Run { json } => {
            let loaded = load(args.config.as_ref())?;
            let out_path = args.out.unwrap_or_else(|| "results/out_baseline.csv".to_string());
            run_single(&loaded, &out_path, json)
        }
        Commands::Sweep { json } => {
            let loaded = load(args.config.as_ref())?;
            let out_path = args.out.unwrap_or_else(|| "results/out_sweep.csv".to_string());
            run_sweep(&loaded, &out_path, json)
        }
        Commands::Grid { json } => {
            let loaded = load(args.config.as_ref())?;
            let out_path = args.out.unwrap_or_else(|| "results/out_grid.csv".to_string());
            run_grid(&loaded, &out_path, json)
        }
        Commands::Sensitivity { step } => {
            let loaded = load(args.config.as_ref())?;
            let out_path = args.out.unwrap_or_else(|| "results/sensitivities.csv".to_string());
            run_sensitivity(&loaded, &out_path, step)
        }
        Commands::Compare { json } => {
            let loaded = load(args.config.as_ref())?;
            let out_path = args.out.unwrap_or_else(|| "results/fuel_comparison.csv".to_string());
            run_compare(&loaded, &out_path, json)
        }
        Commands::Optimize {
            objective,
            points,
            json,
        } => {
            let loaded = load(args.config.as_ref())?;
            let out_path = args.out.unwrap_or_else(|| "results/optimum.csv".to_string());
            run_optimize(&loaded, &out_path, objective, points, json)
        }
    }
}
