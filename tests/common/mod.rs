//! Shared test utilities for integration and E2E tests.
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = TestFixture::new().with_archive("hadoop.tar.gz", "bin/hdfs");
//! fixture.command().arg("generate").assert().success();
//! ```

use assert_fs::prelude::*;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::selections;
    pub use super::{shipped_templates, TestFixture};
}

/// Feature-selection YAML snippets.
#[allow(dead_code)]
pub mod selections {
    pub const HIVE: &str = "hive: true\ndatanodes: 2\n";

    pub const PRESTO_CAPPED: &str = "presto: true\npresto-workers: 5\ndatanodes: 3\n";

    pub const ZERO_DATANODES: &str = "datanodes: 0\n";

    pub const INVALID_YAML: &str = "hive: [unterminated";
}

/// The template tree shipped with the crate.
pub fn shipped_templates() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("templates")
}

/// A temporary directory holding a target tree, optional selection file and
/// locally built archives.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Writes `selection.yaml` with the given content.
    #[allow(dead_code)]
    pub fn with_selection(self, content: &str) -> Self {
        self.temp_dir
            .child("selection.yaml")
            .write_str(content)
            .expect("Failed to write selection file");
        self
    }

    /// Builds a gzipped tarball at `name` holding a single file `entry`.
    #[allow(dead_code)]
    pub fn with_archive(self, name: &str, entry: &str) -> Self {
        let file = std::fs::File::create(self.path().join(name)).expect("Failed to create archive");
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        let body = format!("#!/bin/sh\necho {}\n", entry);
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, entry, body.as_bytes())
            .expect("Failed to append archive entry");
        builder
            .into_inner()
            .and_then(|encoder| encoder.finish())
            .expect("Failed to finish archive");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    #[allow(dead_code)]
    pub fn selection_path(&self) -> PathBuf {
        self.path().join("selection.yaml")
    }

    pub fn target(&self) -> PathBuf {
        self.path().join("target")
    }

    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A `docker-hadoop` command running in this fixture's directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("docker-hadoop");
        cmd.current_dir(self.path())
            .env_remove("DOCKER_HADOOP_SELECTION")
            .env_remove("DOCKER_HADOOP_TEMPLATES")
            .env_remove("DOCKER_HADOOP_TARGET");
        cmd
    }

    /// A `generate` command using the shipped templates and this fixture's
    /// target directory.
    #[allow(dead_code)]
    pub fn generate(&self) -> assert_cmd::Command {
        let mut cmd = self.command();
        cmd.arg("--color")
            .arg("never")
            .arg("generate")
            .arg("--templates")
            .arg(shipped_templates())
            .arg("--target")
            .arg(self.target());
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_builds_archive() {
        let fixture = TestFixture::new().with_archive("hadoop.tar.gz", "bin/hdfs");
        assert!(fixture.path().join("hadoop.tar.gz").is_file());
    }

    #[test]
    fn test_shipped_templates_exist() {
        assert!(shipped_templates().join("scripts").is_dir());
        assert!(shipped_templates().join("hadoop/conf").is_dir());
    }
}
