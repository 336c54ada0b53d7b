//! Phase 4: Template Render
//!
//! Renders every template file of each component declaring
//! [`Capability::TemplateRender`] against the merged data model and writes
//! the result with the template extension stripped. Renders always run:
//! their output depends on the current feature selection.

use std::fs;

use rayon::ThreadPool;
use serde_json::Value;

use super::{
    discover_files, ensure_parent, mark_executable_scripts, run_parallel, FileTask, Phase,
    PhaseReport, Planned,
};
use crate::component::{Capability, Component};
use crate::config::ClusterConfig;
use crate::error::{Error, Result};
use crate::provisioner::Provisioner;

pub fn plan(config: &ClusterConfig, components: &[Component]) -> Result<Vec<Planned<FileTask>>> {
    let mut plans = Vec::new();
    for component in components
        .iter()
        .filter(|c| c.has(Capability::TemplateRender))
    {
        let files = discover_files(component, &config.template_extension, true)?;
        plans.extend(files.into_iter().map(Planned::execute));
    }
    Ok(plans)
}

fn render_file(task: &FileTask, data: &Value, provisioner: &Provisioner) -> Result<()> {
    let source =
        fs::read_to_string(&task.source).map_err(|e| Error::filesystem(&task.source, e))?;
    let rendered = provisioner.engine().render(&task.source, &source, data)?;
    ensure_parent(&task.dest)?;
    fs::write(&task.dest, rendered).map_err(|e| Error::filesystem(&task.dest, e))?;
    mark_executable_scripts(&task.dest)
}

/// Executes Phase 4.
pub fn execute(
    pool: &ThreadPool,
    plans: &[Planned<FileTask>],
    data: &Value,
    provisioner: &Provisioner,
) -> Result<PhaseReport> {
    run_parallel(pool, Phase::TemplateRender, plans, |task| {
        render_file(task, data, provisioner)
    })
}
