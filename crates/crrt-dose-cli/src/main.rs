//! `crrt-dose`: compute CRRT dose metrics from the command line.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crrt_dose_core::guideline::preset_by_band;
use crrt_dose_core::{
    CalculationInput, Database, DoseEngine, FieldId, FieldIssue, GuidelineThresholds, InputForm,
    Snapshot, PRESETS,
};

mod render;

#[derive(Parser)]
#[command(name = "crrt-dose", version, about = "CRRT dose calculator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging (overrides CRRT_DOSE_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Snapshot database path
    #[arg(long, global = true, env = "CRRT_DOSE_DB", default_value = "crrt-dose.db")]
    db: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute metrics, warnings and the calculation trace
    Compute(ComputeArgs),
    /// List the weight-band presets
    Presets {
        #[arg(long)]
        json: bool,
    },
    /// Show the latest saved snapshot with its recomputed report
    Load {
        #[arg(long)]
        json: bool,
        /// Guideline thresholds JSON file
        #[arg(long)]
        thresholds: Option<PathBuf>,
    },
    /// List saved snapshots, newest first
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Delete all saved snapshots
    Clear,
}

#[derive(Args)]
struct ComputeArgs {
    /// Start from a preset weight band, e.g. "60-69"
    #[arg(long, conflicts_with = "input")]
    preset: Option<String>,

    /// Start from a JSON input file (camelCase field names)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Guideline thresholds JSON file
    #[arg(long)]
    thresholds: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Save an input/result snapshot after computing
    #[arg(long)]
    save: bool,

    /// Body weight (kg)
    #[arg(long)]
    weight: Option<String>,
    /// Hematocrit (%)
    #[arg(long)]
    hematocrit: Option<String>,
    /// Blood flow rate (mL/min)
    #[arg(long)]
    blood_flow_rate: Option<String>,
    /// Pre-filter replacement (mL/hr)
    #[arg(long)]
    pre_dilution: Option<String>,
    /// Post-filter replacement (mL/hr)
    #[arg(long)]
    post_dilution: Option<String>,
    /// Dialysate (mL/hr)
    #[arg(long)]
    dialysate: Option<String>,
    /// Net ultrafiltration (mL/hr)
    #[arg(long)]
    ultra_filtration: Option<String>,
    /// Prescribed therapy time (hr)
    #[arg(long)]
    prescribed_time: Option<String>,
    /// Actual runtime (hr)
    #[arg(long)]
    actual_runtime: Option<String>,
}

impl ComputeArgs {
    /// Raw text of each field flag that was given.
    fn field_overrides(&self) -> Vec<(FieldId, &str)> {
        [
            (FieldId::Weight, &self.weight),
            (FieldId::Hematocrit, &self.hematocrit),
            (FieldId::BloodFlowRate, &self.blood_flow_rate),
            (FieldId::PreDilution, &self.pre_dilution),
            (FieldId::PostDilution, &self.post_dilution),
            (FieldId::Dialysate, &self.dialysate),
            (FieldId::UltraFiltration, &self.ultra_filtration),
            (FieldId::PrescribedTime, &self.prescribed_time),
            (FieldId::ActualRuntime, &self.actual_runtime),
        ]
        .into_iter()
        .filter_map(|(field, raw)| raw.as_deref().map(|raw| (field, raw)))
        .collect()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!(db = %cli.db.display(), "Starting crrt-dose");

    match cli.command {
        Commands::Compute(args) => run_compute(args, &cli.db),
        Commands::Presets { json } => run_presets(json),
        Commands::Load { json, thresholds } => run_load(&cli.db, json, thresholds),
        Commands::History { limit } => run_history(&cli.db, limit),
        Commands::Clear => run_clear(&cli.db),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("CRRT_DOSE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_engine(thresholds: Option<&Path>) -> Result<DoseEngine> {
    let thresholds = match thresholds {
        Some(path) => GuidelineThresholds::from_path(path)
            .with_context(|| format!("Failed to load thresholds from {}", path.display()))?,
        None => GuidelineThresholds::default(),
    };
    Ok(DoseEngine::new(thresholds))
}

fn open_db(path: &Path) -> Result<Database> {
    Database::open(path).with_context(|| format!("Failed to open database {}", path.display()))
}

fn base_input(args: &ComputeArgs) -> Result<CalculationInput> {
    if let Some(band) = &args.preset {
        let Some(preset) = preset_by_band(band) else {
            let known: Vec<_> = PRESETS.iter().map(|p| p.weight_band).collect();
            bail!("Unknown preset '{}'; expected one of {}", band, known.join(", "));
        };
        return Ok(preset.to_input());
    }

    if let Some(path) = &args.input {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let input: CalculationInput = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid input JSON in {}", path.display()))?;
        return Ok(input.sanitized());
    }

    Ok(CalculationInput::default())
}

/// Base input with the field flags applied, plus at most one issue per field.
fn build_input(args: &ComputeArgs) -> Result<(CalculationInput, Vec<FieldIssue>)> {
    let form = InputForm::new();
    let mut input = base_input(args)?;
    let mut issues = Vec::new();

    for (field, raw) in args.field_overrides() {
        let (value, issue) = form.parse_value(field, raw);
        // Range problems are reported once, from the final input below.
        if let Some(issue @ FieldIssue::InvalidNumber { .. }) = issue {
            issues.push(issue);
        }
        input.set(field, value);
    }
    let input = input.sanitized();

    let unparsed: Vec<_> = issues.iter().filter_map(FieldIssue::field).collect();
    issues.extend(
        form.check_input(&input)
            .into_iter()
            .filter(|issue| issue.field().map_or(true, |f| !unparsed.contains(&f))),
    );

    Ok((input, issues))
}

fn run_compute(args: ComputeArgs, db_path: &Path) -> Result<()> {
    let engine = load_engine(args.thresholds.as_deref())?;

    let (input, issues) = build_input(&args)?;
    for issue in &issues {
        eprintln!("{}", issue.message());
    }

    let report = engine.compute(&input);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::report(&report));
    }

    if args.save {
        let db = open_db(db_path)?;
        let snapshot = Snapshot::capture(&report.input, &report.results);
        let id = db.save_snapshot(&snapshot)?;
        eprintln!("Saved snapshot {}", id);
    }

    Ok(())
}

fn run_presets(json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&PRESETS)?);
    } else {
        print!("{}", render::presets(&PRESETS));
    }
    Ok(())
}

fn run_load(db_path: &Path, json: bool, thresholds: Option<PathBuf>) -> Result<()> {
    let engine = load_engine(thresholds.as_deref())?;
    let db = open_db(db_path)?;

    let Some(stored) = db.latest_snapshot()? else {
        println!("No saved snapshot.");
        return Ok(());
    };

    let report = engine.compute(&stored.snapshot.input());
    if json {
        let out = serde_json::json!({
            "snapshotId": stored.snapshot_id,
            "timestamp": stored.snapshot.timestamp,
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "Snapshot {} taken {}",
            stored.snapshot_id, stored.snapshot.timestamp
        );
        print!("{}", render::report(&report));
    }
    Ok(())
}

fn run_history(db_path: &Path, limit: usize) -> Result<()> {
    let db = open_db(db_path)?;
    let snapshots = db.list_snapshots(limit)?;
    if snapshots.is_empty() {
        println!("No saved snapshots.");
        return Ok(());
    }
    print!("{}", render::history(&snapshots));
    Ok(())
}

fn run_clear(db_path: &Path) -> Result<()> {
    let db = open_db(db_path)?;
    let removed = db.clear_snapshots()?;
    println!("Removed {} snapshot(s).", removed);
    Ok(())
}
