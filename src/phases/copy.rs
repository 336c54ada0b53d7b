//! Phase 3: Static Copy
//!
//! Copies every non-template file of each component declaring
//! [`Capability::StaticCopy`] into the target tree, preserving relative
//! paths. Copies always run: the enabled components decide which files exist.

use std::fs;

use rayon::ThreadPool;

use super::{
    discover_files, ensure_parent, mark_executable_scripts, run_parallel, FileTask, Phase,
    PhaseReport, Planned,
};
use crate::component::{Capability, Component};
use crate::config::ClusterConfig;
use crate::error::{Error, Result};

pub fn plan(config: &ClusterConfig, components: &[Component]) -> Result<Vec<Planned<FileTask>>> {
    let mut plans = Vec::new();
    for component in components.iter().filter(|c| c.has(Capability::StaticCopy)) {
        let files = discover_files(component, &config.template_extension, false)?;
        plans.extend(files.into_iter().map(Planned::execute));
    }
    Ok(plans)
}

fn copy_file(task: &FileTask) -> Result<()> {
    ensure_parent(&task.dest)?;
    fs::copy(&task.source, &task.dest).map_err(|e| Error::Filesystem {
        path: task.dest.clone(),
        message: format!("failed to copy from {}: {}", task.source.display(), e),
    })?;
    mark_executable_scripts(&task.dest)
}

/// Executes Phase 3.
pub fn execute(pool: &ThreadPool, plans: &[Planned<FileTask>]) -> Result<PhaseReport> {
    run_parallel(pool, Phase::StaticCopy, plans, copy_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::build_pipeline_components;
    use crate::config::FeatureSelection;
    use tempfile::TempDir;

    #[test]
    fn test_copies_static_files_only() {
        let temp = TempDir::new().unwrap();
        let config = ClusterConfig::new(temp.path().join("templates"), temp.path().join("target"));
        let starter = config.templates_root.join("cluster-starter");
        fs::create_dir_all(&starter).unwrap();
        fs::write(starter.join("agent.py"), "print('agent')").unwrap();
        fs::write(starter.join("Dockerfile.template"), "FROM {{ base }}").unwrap();

        let components = build_pipeline_components(&config, &FeatureSelection::default()).unwrap();
        let plans = plan(&config, &components).unwrap();
        assert_eq!(plans.len(), 1);

        let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let report = execute(&pool, &plans).unwrap();
        assert_eq!(report.executed, 1);

        let copied = config.target_root.join("cluster-starter/agent.py");
        assert_eq!(fs::read_to_string(&copied).unwrap(), "print('agent')");
        assert!(!config.target_root.join("cluster-starter/Dockerfile").exists());
    }

    #[test]
    fn test_scripts_component_is_not_copied() {
        let temp = TempDir::new().unwrap();
        let config = ClusterConfig::new(temp.path().join("templates"), temp.path().join("target"));
        let scripts = config.templates_root.join("scripts");
        fs::create_dir_all(&scripts).unwrap();
        fs::write(scripts.join("README"), "not copied").unwrap();

        let components = build_pipeline_components(&config, &FeatureSelection::default()).unwrap();
        assert!(plan(&config, &components).unwrap().is_empty());
    }
}
