//! Phase 1: Download
//!
//! One task per artifact of every component declaring
//! [`Capability::Download`]. A download is skipped when a local archive was
//! provided, or when the archive or the extracted destination already exists
//! and the artifact is not force-refreshed.

use std::fmt;
use std::path::PathBuf;

use rayon::ThreadPool;
use url::Url;

use super::{run_parallel, Phase, PhaseReport, Planned};
use crate::component::{Capability, Component};
use crate::error::Result;
use crate::provisioner::Provisioner;

/// Fetch `url` into `dest`.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadTask {
    pub component: &'static str,
    pub url: Url,
    pub dest: PathBuf,
}

impl fmt::Display for DownloadTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.url, self.component)
    }
}

/// Plans the download of every artifact.
pub fn plan(components: &[Component]) -> Vec<Planned<DownloadTask>> {
    let mut plans = Vec::new();
    for component in components.iter().filter(|c| c.has(Capability::Download)) {
        for artifact in &component.artifacts {
            let task = DownloadTask {
                component: component.name(),
                url: artifact.source_url.clone(),
                dest: artifact.archive_path.clone(),
            };
            let plan = if let Some(provided) = &artifact.provided {
                Planned::skip(task, format!("using provided archive {}", provided.display()))
            } else if artifact.force_refresh {
                Planned::execute(task)
            } else if artifact.extract_destination.exists() {
                let reason = format!("{} already exists", artifact.extract_destination.display());
                Planned::skip(task, reason)
            } else if artifact.archive_path.exists() {
                let reason = format!("{} already exists", artifact.archive_path.display());
                Planned::skip(task, reason)
            } else {
                Planned::execute(task)
            };
            plans.push(plan);
        }
    }
    plans
}

/// Executes Phase 1.
pub fn execute(
    pool: &ThreadPool,
    plans: &[Planned<DownloadTask>],
    provisioner: &Provisioner,
) -> Result<PhaseReport> {
    run_parallel(pool, Phase::Download, plans, |task| {
        provisioner.fetcher().fetch(&task.url, &task.dest)
    })
}
