//! Batch run orchestration: run folder, staged inputs, scoring, outputs.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use superblock_common::ScoringConfig;
use superblock_db::{FeatureStore, StoreFormat};
use superblock_ranker::{
    band_histogram, classify_field, run_batch, BatchOutcome, Breakpoints, BuildingSource, FileStoreAdapter,
    QuantileOutcome, ScoreReport, Weighting,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::logging::RunLog;
use crate::workspace::RunFolder;

pub const OUTPUT_STEM: &str = "superblock_scores";
pub const BUILDING_SUMS_FILE: &str = "building_score_sums.csv";
pub const MANIFEST_FILE: &str = "run_manifest.json";
/// Effective scoring configuration of the run, after CLI overrides.
pub const SCORING_CONFIG_FILE: &str = "scoring_config.yaml";
pub const CANDIDATES_ROLE: &str = "candidates";
pub const BUILDINGS_ROLE: &str = "buildings";

/// Inputs of one `superblock score` invocation.
#[derive(Debug, Clone)]
pub struct ScoreJob {
    pub input: PathBuf,
    pub buildings: Option<PathBuf>,
    pub workspace: PathBuf,
}

/// Summary of a completed run, stored next to the final dataset.
#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub run_folder: String,
    pub input: String,
    pub buildings: Option<String>,
    pub output: String,
    pub weighting: Weighting,
    pub breakpoints: Breakpoints,
    pub building_source: Option<BuildingSource>,
    pub report: ScoreReport,
}

/// Apply `--geb-weight` / `--preset` on top of the loaded scoring config.
pub fn apply_weight_override(
    scoring: &mut ScoringConfig,
    geb_weight: Option<i32>,
    preset: Option<u8>,
) -> anyhow::Result<()> {
    let weighting = match (geb_weight, preset) {
        (Some(geb), _) => Weighting::from_building_percent(geb)?,
        (None, Some(index)) => Weighting::preset(usize::from(index))?,
        (None, None) => return Ok(()),
    };
    scoring.geb_weight = weighting.geb();
    scoring.verh_weight = Some(weighting.verh());
    Ok(())
}

/// Run a complete scoring job. On failure the run folder is removed unless
/// the workspace config asks to keep it.
pub fn run_score(config: &Config, job: &ScoreJob, run_log: &RunLog) -> anyhow::Result<RunManifest> {
    // Bad weights never create a run folder.
    let weighting = Weighting::try_from(&config.scoring)?;
    config.scoring.validate()?;

    let run = RunFolder::create(&job.workspace)?;
    if let Err(e) = run_log.attach(&run.log_file) {
        warn!("Could not open {}: {e}", run.log_file.display());
    }
    info!("📂 Run folder: {}", run.root.display());
    info!("⚖️  Weighting: {weighting}");

    let result = execute(config, job, &run);
    match result {
        Ok(manifest) => {
            info!("✅ Run {} finished in {} ms", manifest.run_id, manifest.duration_ms);
            run_log.detach();
            Ok(manifest)
        }
        Err(e) => {
            error!("❌ Run failed: {e:#}");
            run_log.detach();
            if config.workspace.keep_failed_runs {
                warn!("Keeping failed run folder {}", run.root.display());
            } else if let Err(cleanup) = run.remove() {
                warn!("{cleanup:#}");
            }
            Err(e)
        }
    }
}

fn execute(config: &Config, job: &ScoreJob, run: &RunFolder) -> anyhow::Result<RunManifest> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let start = Instant::now();

    let input = run.stage_input(&job.input, CANDIDATES_ROLE)?;
    let buildings = job
        .buildings
        .as_deref()
        .map(|b| run.stage_input(b, BUILDINGS_ROLE))
        .transpose()?;
    info!("📥 Inputs staged in {}", run.prepared_input.display());

    let scoring_path = run.final_output.join(SCORING_CONFIG_FILE);
    config
        .scoring
        .to_yaml(&scoring_path)
        .with_context(|| format!("Failed to write {}", scoring_path.display()))?;

    let input_store = FeatureStore::open(&input)?;
    let output_path = run.final_output.join(output_file_name(input_store.format()));

    let mut store = FileStoreAdapter::new(input_store, FeatureStore::create(&output_path)?)
        .with_fields(config.fields.clone(), config.buildings.clone());
    if let Some(path) = &buildings {
        store = store.with_buildings(FeatureStore::open(path)?);
    }

    let BatchOutcome {
        table,
        buildings: building_summary,
        written,
    } = run_batch(&mut store, &config.scoring)?;

    if let Some(summary) = &building_summary {
        let sums_path = run.temp.join(BUILDING_SUMS_FILE);
        FeatureStore::create(&sums_path)?
            .write_rows(&summary.parcels)
            .context("Failed to write building sums")?;
        info!("🏠 {} parcel sums ({}) → {}", summary.parcels.len(), summary.source, sums_path.display());
    }

    log_report(&table.report);
    info!("💾 {written} features → {}", output_path.display());

    let manifest = RunManifest {
        run_id,
        started_at,
        finished_at: Utc::now(),
        duration_ms: start.elapsed().as_millis() as u64,
        run_folder: run.root.display().to_string(),
        input: job.input.display().to_string(),
        buildings: job.buildings.as_ref().map(|b| b.display().to_string()),
        output: output_path.display().to_string(),
        weighting: table.weighting,
        breakpoints: table.breakpoints,
        building_source: building_summary.map(|s| s.source),
        report: table.report,
    };
    let manifest_path = run.final_output.join(MANIFEST_FILE);
    std::fs::write(&manifest_path, serde_json::to_vec_pretty(&manifest)?)
        .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

    Ok(manifest)
}

fn output_file_name(format: StoreFormat) -> String {
    match format {
        StoreFormat::Csv => format!("{OUTPUT_STEM}.csv"),
        StoreFormat::GeoJson => format!("{OUTPUT_STEM}.geojson"),
    }
}

fn log_report(report: &ScoreReport) {
    info!(
        "📊 {} of {} features scored ({} null sums, {} non-numeric, {} degenerate, {} without bbox)",
        report.scored,
        report.total,
        report.nulls,
        report.skipped.len(),
        report.degenerate.len(),
        report.missing_bbox
    );
    if !report.degenerate.is_empty() {
        warn!("Degenerate bounding boxes: {:?}", report.degenerate);
    }
}

/// Breakpoints of the building score sum without writing anything.
pub fn inspect_breakpoints(config: &Config, input: &Path) -> anyhow::Result<QuantileOutcome> {
    let store = FeatureStore::open(input)?;
    let candidates = store.read_candidates(&config.fields)?;
    let outcome = classify_field(
        &config.fields.building_score_sum,
        candidates.iter().map(|c| (c.id, &c.building_score_sum)),
    )?;
    Ok(outcome)
}

pub fn format_breakpoints(outcome: &QuantileOutcome) -> String {
    let mut out = format!("Breakpoints of '{}'\n", outcome.field);
    for (k, b) in outcome.breakpoints.values().iter().enumerate() {
        out.push_str(&format!("  b{}: {b}\n", k + 1));
    }
    out.push_str("Band counts\n");
    let hist = band_histogram(outcome.scores.values().copied());
    for (i, count) in hist.iter().enumerate() {
        out.push_str(&format!("  {:+}: {count}\n", i as i32 - 3));
    }
    out.push_str(&format!(
        "{} valid, {} null, {} non-numeric\n",
        outcome.scores.len(),
        outcome.nulls,
        outcome.skipped.len()
    ));
    out
}

pub fn format_presets() -> String {
    Weighting::presets()
        .enumerate()
        .map(|(i, w)| format!("{i}: geb {:>3}% / verh {:>3}%\n", w.geb(), w.verh()))
        .collect()
}
