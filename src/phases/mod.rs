//! The provisioning pipeline.
//!
//! ## Overview
//!
//! A run goes through 5 phases, strictly in order:
//! 1. Download - fetch every artifact whose archive is not already present
//! 2. Decompress - unpack every archive whose destination is not already present
//! 3. StaticCopy - copy non-template files into the target tree
//! 4. TemplateRender - render template files into the target tree
//! 5. ManifestEmit - write the compose manifest
//!
//! Each of the first four phases plans one task per artifact or file, decides
//! whether it executes or is skipped, logs every skip, runs the executing
//! tasks on a bounded worker pool and only returns once all of them have
//! finished. If any task fails the phase returns the first error and no later
//! phase starts. Work already done stays on disk.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, info, warn};
use rayon::prelude::*;
use rayon::ThreadPool;
use walkdir::WalkDir;

use crate::component::Component;
use crate::error::{Error, Result};

pub mod copy;
pub mod decompress;
pub mod download;
pub mod emit;
pub mod orchestrator;
pub mod render;

/// A pipeline phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Download,
    Decompress,
    StaticCopy,
    TemplateRender,
    ManifestEmit,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Download => "download",
            Phase::Decompress => "decompress",
            Phase::StaticCopy => "copy",
            Phase::TemplateRender => "render",
            Phase::ManifestEmit => "emit",
        };
        f.write_str(name)
    }
}

/// Whether a planned task runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Execute,
    Skip { reason: String },
}

/// A task together with the decision made for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Planned<T> {
    pub task: T,
    pub decision: Decision,
}

impl<T> Planned<T> {
    pub fn execute(task: T) -> Self {
        Self {
            task,
            decision: Decision::Execute,
        }
    }

    pub fn skip(task: T, reason: impl Into<String>) -> Self {
        Self {
            task,
            decision: Decision::Skip {
                reason: reason.into(),
            },
        }
    }

    pub fn is_execute(&self) -> bool {
        self.decision == Decision::Execute
    }
}

/// Outcome counts of one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseReport {
    pub phase: Phase,
    pub executed: usize,
    pub skipped: usize,
}

impl PhaseReport {
    /// Counts the decisions in `plans`.
    pub fn from_plans<T>(phase: Phase, plans: &[Planned<T>]) -> Self {
        let executed = plans.iter().filter(|p| p.is_execute()).count();
        Self {
            phase,
            executed,
            skipped: plans.len() - executed,
        }
    }
}

impl fmt::Display for PhaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} executed, {} skipped",
            self.phase, self.executed, self.skipped
        )
    }
}

/// Logs every skipped task of `plans`.
pub(crate) fn log_skips<T: fmt::Display>(phase: Phase, plans: &[Planned<T>]) {
    for plan in plans {
        if let Decision::Skip { reason } = &plan.decision {
            info!("[{}] skipping {}: {}", phase, plan.task, reason);
        }
    }
}

/// Runs `run` on every executing task of `plans` on `pool` and waits for all
/// of them.
///
/// Returns the first error collected once every dispatched task finished.
pub(crate) fn run_parallel<T, F>(
    pool: &ThreadPool,
    phase: Phase,
    plans: &[Planned<T>],
    run: F,
) -> Result<PhaseReport>
where
    T: Sync + fmt::Display,
    F: Fn(&T) -> Result<()> + Sync,
{
    log_skips(phase, plans);

    let errors: Mutex<Vec<Error>> = Mutex::new(Vec::new());
    pool.install(|| {
        plans
            .par_iter()
            .filter(|plan| plan.is_execute())
            .for_each(|plan| {
                debug!("[{}] running {}", phase, plan.task);
                if let Err(e) = run(&plan.task) {
                    if let Ok(mut errors) = errors.lock() {
                        errors.push(e);
                    }
                }
            });
    });

    let collected = errors.into_inner().map_err(|_| Error::LockPoisoned {
        context: format!("{} phase errors", phase),
    })?;
    if let Some(first) = collected.into_iter().next() {
        return Err(first);
    }
    Ok(PhaseReport::from_plans(phase, plans))
}

/// A file moving from the templates tree into the target tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub component: &'static str,
    pub source: PathBuf,
    pub dest: PathBuf,
}

impl fmt::Display for FileTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.dest.display(), self.component)
    }
}

/// Files of `component`'s template directory, split by whether they carry
/// the template extension. Each entry maps a source file to its destination
/// in the target tree; templates lose their extension.
pub(crate) fn discover_files(
    component: &Component,
    extension: &str,
    templates: bool,
) -> Result<Vec<FileTask>> {
    let root = &component.template_dir;
    if !root.is_dir() {
        warn!(
            "Template directory {} for {} does not exist",
            root.display(),
            component.name()
        );
        return Ok(Vec::new());
    }

    let mut tasks = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Filesystem {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone()),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let source = entry.path();
        let is_template = source.extension().is_some_and(|ext| ext == extension);
        if is_template != templates {
            continue;
        }
        let relative = source.strip_prefix(root).map_err(|e| Error::Filesystem {
            path: source.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut dest = component.target_dir.join(relative);
        if is_template {
            dest.set_extension("");
        }
        tasks.push(FileTask {
            component: component.name(),
            source: source.to_path_buf(),
            dest,
        });
    }
    Ok(tasks)
}

/// Creates the parent directory of `path`.
pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::filesystem(parent, e))?;
    }
    Ok(())
}

/// Marks shell and python scripts executable (0755).
pub(crate) fn mark_executable_scripts(path: &Path) -> Result<()> {
    let is_script = path
        .extension()
        .is_some_and(|ext| ext == "sh" || ext == "py");
    if !is_script {
        return Ok(());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| Error::filesystem(path, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentKind;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn pool() -> ThreadPool {
        rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap()
    }

    fn component(root: &Path) -> Component {
        Component {
            kind: ComponentKind::Hadoop,
            template_dir: root.join("templates/hadoop"),
            target_dir: root.join("target/hadoop"),
            artifacts: Vec::new(),
            data: serde_json::json!({}),
        }
    }

    #[test]
    fn test_run_parallel_only_runs_execute() {
        let plans = vec![
            Planned::execute("a".to_string()),
            Planned::skip("b".to_string(), "exists"),
            Planned::execute("c".to_string()),
        ];
        let calls = AtomicUsize::new(0);
        let report = run_parallel(&pool(), Phase::Download, &plans, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(report.executed, 2);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_run_parallel_waits_for_all_then_fails() {
        let plans: Vec<_> = (0..8).map(|i| Planned::execute(i.to_string())).collect();
        let calls = AtomicUsize::new(0);
        let result = run_parallel(&pool(), Phase::Decompress, &plans, |task| {
            calls.fetch_add(1, Ordering::SeqCst);
            if task == "3" {
                Err(Error::config("boom"))
            } else {
                Ok(())
            }
        });
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_discover_files_splits_templates() {
        let temp = TempDir::new().unwrap();
        let component = component(temp.path());
        let conf = component.template_dir.join("conf");
        fs::create_dir_all(&conf).unwrap();
        fs::write(conf.join("core-site.xml.template"), "{{ x }}").unwrap();
        fs::write(conf.join("log4j.properties"), "k=v").unwrap();

        let templates = discover_files(&component, "template", true).unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(
            templates[0].dest,
            temp.path().join("target/hadoop/conf/core-site.xml")
        );

        let statics = discover_files(&component, "template", false).unwrap();
        assert_eq!(statics.len(), 1);
        assert_eq!(
            statics[0].dest,
            temp.path().join("target/hadoop/conf/log4j.properties")
        );
    }

    #[test]
    fn test_discover_files_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(discover_files(&component(temp.path()), "template", true)
            .unwrap()
            .is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_scripts_marked_executable() {
        use std::os::unix::fs::PermissionsExt;
        let temp = TempDir::new().unwrap();
        let script = temp.path().join("run.sh");
        let conf = temp.path().join("site.xml");
        fs::write(&script, "#!/bin/sh").unwrap();
        fs::write(&conf, "<x/>").unwrap();

        mark_executable_scripts(&script).unwrap();
        mark_executable_scripts(&conf).unwrap();

        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&script), 0o755);
        assert_ne!(mode(&conf), 0o755);
    }

    #[test]
    fn test_phase_report_display() {
        let report = PhaseReport {
            phase: Phase::TemplateRender,
            executed: 3,
            skipped: 0,
        };
        assert_eq!(report.to_string(), "render: 3 executed, 0 skipped");
    }
}
