//! Phase 5: Manifest Emit
//!
//! Serializes the topology and writes it to the manifest path. The document
//! is written to a sibling temporary file and renamed into place, so a failed
//! run never leaves a partial manifest behind.

use std::fs;
use std::path::PathBuf;

use log::info;

use super::{Phase, PhaseReport};
use crate::catalog::Topology;
use crate::config::ClusterConfig;
use crate::error::{Error, Result};
use crate::manifest;

/// Renders the manifest text without writing it.
pub fn render(config: &ClusterConfig, topology: &Topology) -> Result<String> {
    manifest::emit(&topology.instances, &topology.auxiliary, config)
}

/// Executes Phase 5, returning the written path and the manifest text.
pub fn execute(config: &ClusterConfig, topology: &Topology) -> Result<(PhaseReport, PathBuf, String)> {
    let text = render(config, topology)?;
    let path = config.manifest_path();
    super::ensure_parent(&path)?;

    let mut staging = path.clone().into_os_string();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);
    fs::write(&staging, &text).map_err(|e| Error::filesystem(&staging, e))?;
    fs::rename(&staging, &path).map_err(|e| Error::filesystem(&path, e))?;

    info!("[{}] wrote {}", Phase::ManifestEmit, path.display());
    let report = PhaseReport {
        phase: Phase::ManifestEmit,
        executed: 1,
        skipped: 0,
    };
    Ok((report, path, text))
}
