//! Orchestrator for a complete provisioning run
//!
//! This module coordinates the topology, the pipeline components and all
//! phases to provide a clean API for the `generate` command.

use std::path::PathBuf;

use log::info;
use rayon::ThreadPool;

use super::copy as phase3;
use super::decompress::{self as phase2, DecompressTask};
use super::download::{self as phase1, DownloadTask};
use super::emit as phase5;
use super::render as phase4;
use super::{log_skips, FileTask, Phase, PhaseReport, Planned};
use crate::catalog::{build_topology, Topology};
use crate::component::{build_pipeline_components, template_data};
use crate::config::{ClusterConfig, FeatureSelection};
use crate::error::{Error, Result};
use crate::provisioner::Provisioner;

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// One report per phase, in execution order.
    pub phases: Vec<PhaseReport>,
    pub manifest_path: PathBuf,
    pub manifest: String,
    pub topology: Topology,
}

/// Everything a run would do, computed without writing anything.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub downloads: Vec<Planned<DownloadTask>>,
    pub decompressions: Vec<Planned<DecompressTask>>,
    pub copies: Vec<Planned<FileTask>>,
    pub renders: Vec<Planned<FileTask>>,
    pub manifest: String,
    pub topology: Topology,
}

fn worker_pool(config: &ClusterConfig) -> Result<ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .thread_name(|i| format!("provision-{}", i))
        .build()
        .map_err(|e| Error::Config {
            message: format!("failed to start worker pool: {}", e),
            hint: Some("Lower --jobs".to_string()),
        })
}

/// Execute the complete provisioning run (Phases 1-5)
///
/// 1. Build and validate the topology (no I/O happens if this fails)
/// 2. Download missing artifacts
/// 3. Decompress missing archives
/// 4. Copy static files
/// 5. Render templates
/// 6. Write the manifest
///
/// Stops at the first failing phase; later phases never start.
pub fn execute(
    config: &ClusterConfig,
    selection: &FeatureSelection,
    provisioner: &Provisioner,
) -> Result<RunReport> {
    let topology = build_topology(config, selection)?;
    let components = build_pipeline_components(config, selection)?;
    let data = template_data(config, &components);
    let pool = worker_pool(config)?;

    let mut phases = Vec::new();

    // Phase 1: Download
    let downloads = phase1::plan(&components);
    phases.push(phase1::execute(&pool, &downloads, provisioner)?);

    // Phase 2: Decompress
    let decompressions = phase2::plan(&components);
    phases.push(phase2::execute(&pool, &decompressions, provisioner)?);

    // Phase 3: Static Copy
    let copies = phase3::plan(config, &components)?;
    phases.push(phase3::execute(&pool, &copies)?);

    // Phase 4: Template Render
    let renders = phase4::plan(config, &components)?;
    phases.push(phase4::execute(&pool, &renders, &data, provisioner)?);

    // Phase 5: Manifest Emit
    let (report, manifest_path, manifest) = phase5::execute(config, &topology)?;
    phases.push(report);

    for report in &phases {
        info!("{}", report);
    }

    Ok(RunReport {
        phases,
        manifest_path,
        manifest,
        topology,
    })
}

/// Plans every phase and renders the manifest without touching the target
/// tree.
pub fn plan(config: &ClusterConfig, selection: &FeatureSelection) -> Result<RunPlan> {
    let topology = build_topology(config, selection)?;
    let components = build_pipeline_components(config, selection)?;

    let plan = RunPlan {
        downloads: phase1::plan(&components),
        decompressions: phase2::plan(&components),
        copies: phase3::plan(config, &components)?,
        renders: phase4::plan(config, &components)?,
        manifest: phase5::render(config, &topology)?,
        topology,
    };

    log_skips(Phase::Download, &plan.downloads);
    log_skips(Phase::Decompress, &plan.decompressions);
    Ok(plan)
}

impl RunPlan {
    /// Per-phase counts of what would execute.
    pub fn reports(&self) -> Vec<PhaseReport> {
        vec![
            PhaseReport::from_plans(Phase::Download, &self.downloads),
            PhaseReport::from_plans(Phase::Decompress, &self.decompressions),
            PhaseReport::from_plans(Phase::StaticCopy, &self.copies),
            PhaseReport::from_plans(Phase::TemplateRender, &self.renders),
        ]
    }
}
