//! Phase 2: Decompress
//!
//! One task per artifact of every component declaring
//! [`Capability::Decompress`]. Skipped when the extract destination exists
//! and the artifact is not force-refreshed. Provided archives are read in
//! place of the downloaded one.

use std::fmt;
use std::path::PathBuf;

use rayon::ThreadPool;

use super::{run_parallel, Phase, PhaseReport, Planned};
use crate::component::{Capability, Component};
use crate::error::Result;
use crate::provisioner::Provisioner;

/// Unpack `archive` into `dest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompressTask {
    pub component: &'static str,
    pub archive: PathBuf,
    pub dest: PathBuf,
}

impl fmt::Display for DecompressTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.archive.display(), self.component)
    }
}

pub fn plan(components: &[Component]) -> Vec<Planned<DecompressTask>> {
    components
        .iter()
        .filter(|c| c.has(Capability::Decompress))
        .flat_map(|component| {
            component.artifacts.iter().map(move |artifact| {
                let task = DecompressTask {
                    component: component.name(),
                    archive: artifact.archive_source().to_path_buf(),
                    dest: artifact.extract_destination.clone(),
                };
                if !artifact.force_refresh && artifact.extract_destination.exists() {
                    let reason =
                        format!("{} already exists", artifact.extract_destination.display());
                    Planned::skip(task, reason)
                } else {
                    Planned::execute(task)
                }
            })
        })
        .collect()
}

/// Executes Phase 2.
pub fn execute(
    pool: &ThreadPool,
    plans: &[Planned<DecompressTask>],
    provisioner: &Provisioner,
) -> Result<PhaseReport> {
    run_parallel(pool, Phase::Decompress, plans, |task| {
        provisioner.extractor().extract(&task.archive, &task.dest)
    })
}
