//! CLI for computing body measurements from detector landmark files.
//!
//! Usage:
//!   tailor-measure measure scan.json                       # Human-readable output
//!   tailor-measure measure scan.json --history past.json   # With accuracy report and outlier check
//!   tailor-measure measure scan.json --history a.json --history b.json  # History from stored results
//!   tailor-measure --json ensemble a.json b.json c.json    # Combine stored results as JSON
//!   tailor-measure -o result.json --json measure scan.json # Save to file

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tailor_measure::{
    analyze_accuracy, compute_measurements_with, detect_outlier, ensemble_average, AccuracyReport,
    EnsembleResult, MeasurementConfig, MeasurementResult, MeasurementSet, OutlierFlags, ScanInput,
    DEFAULT_Z_THRESHOLD,
};

#[derive(Parser, Debug)]
#[command(name = "tailor-measure")]
#[command(author, version, about = "Body measurements from pose landmarks", long_about = None)]
struct Args {
    /// Output as JSON
    #[arg(short, long, global = true)]
    json: bool,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Measure one scan (JSON ScanInput)
    Measure {
        /// Scan input file
        scan: PathBuf,

        /// TOML file overriding the measurement constants
        #[arg(long)]
        config: Option<PathBuf>,

        /// Earlier scans, oldest first: stored MeasurementResult files or
        /// JSON arrays of results or measurement sets. Repeatable.
        #[arg(long)]
        history: Vec<PathBuf>,

        /// z-score above which a value is flagged against history
        #[arg(long, default_value_t = DEFAULT_Z_THRESHOLD)]
        z_threshold: f64,
    },
    /// Combine stored measurement results into one estimate
    Ensemble {
        /// MeasurementResult JSON files
        #[arg(required = true)]
        results: Vec<PathBuf>,
    },
}

/// One stored scan: a full result or only its measurements.
#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryEntry {
    Result(MeasurementResult),
    Measurements(MeasurementSet),
}

impl HistoryEntry {
    fn into_measurements(self) -> MeasurementSet {
        match self {
            HistoryEntry::Result(result) => result.measurements,
            HistoryEntry::Measurements(set) => set,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryFile {
    Many(Vec<HistoryEntry>),
    One(HistoryEntry),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MeasureOutput {
    scan: String,
    result: MeasurementResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    accuracy: Option<AccuracyReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    outliers: Option<OutlierFlags>,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let output_str = match &args.command {
        Command::Measure {
            scan,
            config,
            history,
            z_threshold,
        } => {
            let output = measure(scan, config.as_deref(), history, *z_threshold)?;
            if args.json {
                serde_json::to_string_pretty(&output)?
            } else {
                format_measure(&output)
            }
        }
        Command::Ensemble { results } => {
            let results = results
                .iter()
                .map(|p| read_json::<MeasurementResult>(p))
                .collect::<Result<Vec<_>, _>>()?;
            let ensemble = ensemble_average(&results)?;
            if args.json {
                serde_json::to_string_pretty(&ensemble)?
            } else {
                format_ensemble(&ensemble)
            }
        }
    };

    if let Some(ref path) = args.output {
        std::fs::write(path, &output_str)?;
        tracing::info!("Output written to {}", path.display());
    } else {
        println!("{}", output_str);
    }

    Ok(())
}

fn measure(
    scan: &Path,
    config: Option<&Path>,
    history: &[PathBuf],
    z_threshold: f64,
) -> Result<MeasureOutput, Box<dyn std::error::Error>> {
    let config = match config {
        Some(path) => {
            tracing::info!("Loading config: {}", path.display());
            MeasurementConfig::load(path)?
        }
        None => MeasurementConfig::default(),
    };

    tracing::info!("Loading scan: {}", scan.display());
    let input: ScanInput = read_json(scan)?;
    let result = compute_measurements_with(&input, &config)?;

    let (accuracy, outliers) = if history.is_empty() {
        (Some(analyze_accuracy(&result, &[])), None)
    } else {
        let history = read_history(history)?;
        tracing::info!("Loaded {} historical scans", history.len());
        (
            Some(analyze_accuracy(&result, &history)),
            Some(detect_outlier(&result.measurements, &history, z_threshold)),
        )
    };

    Ok(MeasureOutput {
        scan: scan.display().to_string(),
        result,
        accuracy,
        outliers,
    })
}

/// Measurement sets of every history file, in the order given.
fn read_history(paths: &[PathBuf]) -> Result<Vec<MeasurementSet>, Box<dyn std::error::Error>> {
    let mut history = Vec::new();
    for path in paths {
        match read_json::<HistoryFile>(path)? {
            HistoryFile::Many(entries) => {
                history.extend(entries.into_iter().map(HistoryEntry::into_measurements))
            }
            HistoryFile::One(entry) => history.push(entry.into_measurements()),
        }
    }
    Ok(history)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    Ok(serde_json::from_str(&content)?)
}

fn format_measure(output: &MeasureOutput) -> String {
    let r = &output.result;
    let mut s = String::new();

    s.push_str(&format!("Scan: {}\n", output.scan));
    let angles: Vec<String> = r.metadata.angles_used.iter().map(|a| a.to_string()).collect();
    s.push_str(&format!("Angles: {}\n", angles.join(", ")));
    s.push_str(&format!("Calibration: {}\n", r.metadata.calibration_method));
    s.push_str(&format!("Overall accuracy: {:.0}%\n", r.overall_accuracy));

    s.push_str("\nMeasurements:\n");
    for (key, value) in r.measurements.iter() {
        let flag = output
            .outliers
            .as_ref()
            .and_then(|o| o.get(&key))
            .filter(|f| f.is_outlier)
            .map(|f| format!("  (!) expected ~{:.1} cm, z = {:.1}", f.expected, f.z_score))
            .unwrap_or_default();
        s.push_str(&format!(
            "  {:<10} {:>6.1} cm  ({:.0}%){}\n",
            key.as_str(),
            value,
            r.confidence_of(key),
            flag
        ));
    }

    if !r.warnings.is_empty() {
        s.push_str("\nWarnings:\n");
        for w in &r.warnings {
            s.push_str(&format!("  - {}\n    {}\n", w, w.remedy()));
        }
    }

    if let Some(report) = &output.accuracy {
        if !report.recommendations.is_empty() {
            s.push_str("\nRecommendations:\n");
            for rec in &report.recommendations {
                s.push_str(&format!("  - {}\n", rec));
            }
        }
        let p = &report.improvement_potential;
        s.push_str("\nImprovement potential:\n");
        s.push_str(&format!("  With calibration:    {:.0}%\n", p.with_calibration));
        s.push_str(&format!("  With side view:      {:.0}%\n", p.with_side_view));
        s.push_str(&format!("  With multiple scans: {:.0}%\n", p.with_multiple_scans));
    }

    s
}

fn format_ensemble(e: &EnsembleResult) -> String {
    let mut s = String::new();
    s.push_str(&format!(
        "Scans used: {} ({} outlier values removed)\n\n",
        e.scans_used, e.outliers_removed
    ));
    for (key, value) in e.measurements.iter() {
        s.push_str(&format!(
            "  {:<10} {:>6.1} cm  ({:.0}%)\n",
            key.as_str(),
            value,
            e.confidence.get(key).unwrap_or(0.0)
        ));
    }
    s
}
