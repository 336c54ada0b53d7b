//! Feature-selection flags shared by `generate` and `topology`.
//!
//! Flags are layered on top of an optional `--selection` YAML file: a boolean
//! flag can only switch a component on, and every value flag replaces the
//! file's value when given.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use docker_hadoop::config::{self, FeatureSelection};

#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// YAML file with a feature selection; flags override it.
    #[arg(long, value_name = "FILE", env = "DOCKER_HADOOP_SELECTION")]
    pub selection: Option<PathBuf>,

    /// Run Hive server and metastore on the primary namenode.
    #[arg(long)]
    pub hive: bool,

    /// Download Spark without running any Spark service.
    #[arg(long)]
    pub spark: bool,

    /// Run the Spark history server on the secondary namenode.
    #[arg(long)]
    pub spark_history: bool,

    /// Run the Spark thrift server on the secondary namenode.
    #[arg(long)]
    pub spark_thrift: bool,

    /// Run Hue.
    #[arg(long)]
    pub hue: bool,

    /// Run a Presto coordinator on the primary namenode.
    #[arg(long)]
    pub presto: bool,

    /// Enable every optional component.
    #[arg(long)]
    pub all: bool,

    /// Number of datanodes.
    #[arg(long, value_name = "NUM")]
    pub datanodes: Option<u32>,

    /// Number of Presto workers, placed on datanodes.
    #[arg(long, value_name = "NUM")]
    pub presto_workers: Option<u32>,

    #[arg(long, value_name = "VERSION")]
    pub hadoop_version: Option<String>,

    #[arg(long, value_name = "VERSION")]
    pub hive_version: Option<String>,

    #[arg(long, value_name = "VERSION")]
    pub spark_version: Option<String>,

    #[arg(long, value_name = "VERSION")]
    pub scala_version: Option<String>,

    /// Java major version used by every image (8 or 11).
    #[arg(long, value_name = "VERSION")]
    pub java_version: Option<String>,

    #[arg(long, value_name = "VERSION")]
    pub zookeeper_version: Option<String>,

    #[arg(long, value_name = "VERSION")]
    pub hue_version: Option<String>,

    #[arg(long, value_name = "VERSION")]
    pub presto_version: Option<String>,

    /// Download and unpack Hadoop again even if it is already present.
    #[arg(long)]
    pub force_download_hadoop: bool,

    #[arg(long)]
    pub force_download_hive: bool,

    #[arg(long)]
    pub force_download_spark: bool,

    #[arg(long)]
    pub force_download_presto: bool,

    /// Local Hadoop archive used instead of downloading.
    #[arg(long, value_name = "FILE")]
    pub provided_hadoop: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    pub provided_hive: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    pub provided_spark: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    pub provided_presto: Option<PathBuf>,
}

fn override_with<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

impl SelectionArgs {
    /// Loads the selection file, if any, and applies the flags on top.
    pub fn resolve(&self) -> Result<FeatureSelection> {
        let mut selection = match &self.selection {
            Some(path) => config::load_selection(path)
                .with_context(|| format!("Failed to load selection from {}", path.display()))?,
            None => FeatureSelection::default(),
        };

        selection.hive |= self.hive;
        selection.spark |= self.spark;
        selection.spark_history |= self.spark_history;
        selection.spark_thrift |= self.spark_thrift;
        selection.hue |= self.hue;
        selection.presto |= self.presto;
        selection.all |= self.all;
        override_with(&mut selection.datanodes, &self.datanodes);
        override_with(&mut selection.presto_workers, &self.presto_workers);

        let versions = &mut selection.versions;
        override_with(&mut versions.hadoop, &self.hadoop_version);
        override_with(&mut versions.hive, &self.hive_version);
        override_with(&mut versions.spark, &self.spark_version);
        override_with(&mut versions.scala, &self.scala_version);
        override_with(&mut versions.java, &self.java_version);
        override_with(&mut versions.zookeeper, &self.zookeeper_version);
        override_with(&mut versions.hue, &self.hue_version);
        override_with(&mut versions.presto, &self.presto_version);

        let force = &mut selection.force_refresh;
        force.hadoop |= self.force_download_hadoop;
        force.hive |= self.force_download_hive;
        force.spark |= self.force_download_spark;
        force.presto |= self.force_download_presto;

        let provided = &mut selection.provided;
        if self.provided_hadoop.is_some() {
            provided.hadoop = self.provided_hadoop.clone();
        }
        if self.provided_hive.is_some() {
            provided.hive = self.provided_hive.clone();
        }
        if self.provided_spark.is_some() {
            provided.spark = self.provided_spark.clone();
        }
        if self.provided_presto.is_some() {
            provided.presto = self.provided_presto.clone();
        }

        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_flags_without_file() {
        let args = SelectionArgs {
            hive: true,
            datanodes: Some(4),
            java_version: Some("11".to_string()),
            ..SelectionArgs::default()
        };
        let selection = args.resolve().unwrap();
        assert!(selection.hive);
        assert_eq!(selection.datanodes, 4);
        assert_eq!(selection.versions.java, "11");
        assert_eq!(selection.versions.hadoop, "3.3.0");
    }

    #[test]
    fn test_flags_layer_over_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("selection.yaml");
        fs::write(&path, "presto: true\npresto-workers: 2\ndatanodes: 5\n").unwrap();

        let args = SelectionArgs {
            selection: Some(path),
            hue: true,
            datanodes: Some(3),
            ..SelectionArgs::default()
        };
        let selection = args.resolve().unwrap();
        assert!(selection.presto);
        assert!(selection.hue);
        assert_eq!(selection.presto_workers, 2);
        assert_eq!(selection.datanodes, 3);
    }

    #[test]
    fn test_missing_file_names_path() {
        let args = SelectionArgs {
            selection: Some(PathBuf::from("/nonexistent/selection.yaml")),
            ..SelectionArgs::default()
        };
        let err = args.resolve().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/selection.yaml"));
    }
}
