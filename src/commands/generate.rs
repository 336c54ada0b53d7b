//! # Generate Command Implementation
//!
//! Runs the full provisioning pipeline: downloads and unpacks the selected
//! artifacts, copies and renders every component's files into the target
//! directory, then writes `docker-compose.yml` there.
//!
//! With `--dry-run` every phase is planned but nothing is fetched or written;
//! the plan and the manifest are printed instead.

use anyhow::Result;
use clap::Args;
use std::fmt::Display;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use docker_hadoop::config::{ClusterConfig, FeatureSelection};
use docker_hadoop::output::{count, mark, Mark, OutputConfig};
use docker_hadoop::phases::{orchestrator, Decision, PhaseReport, Planned};
use docker_hadoop::provisioner::Provisioner;

use super::selection::SelectionArgs;

/// Provision the cluster tree and write docker-compose.yml
#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Directory holding one template subdirectory per component.
    #[arg(long, value_name = "DIR", env = "DOCKER_HADOOP_TEMPLATES")]
    pub templates: Option<PathBuf>,

    /// Directory the cluster is staged into.
    #[arg(long, value_name = "DIR", env = "DOCKER_HADOOP_TARGET")]
    pub target: Option<PathBuf>,

    /// Docker network every service joins.
    #[arg(long, value_name = "NAME")]
    pub network: Option<String>,

    /// Image used by every Hadoop-family container.
    #[arg(long, value_name = "IMAGE")]
    pub hadoop_image: Option<String>,

    /// Worker threads per phase (0 uses one per CPU).
    #[arg(short, long, value_name = "NUM", default_value_t = 0)]
    pub jobs: usize,

    /// Timeout in seconds for each artifact download.
    #[arg(long, value_name = "SECS")]
    pub download_timeout: Option<u64>,

    /// Plan every phase and print the manifest without touching the disk.
    #[arg(long)]
    pub dry_run: bool,

    /// Suppress status output.
    #[arg(short, long)]
    pub quiet: bool,
}

impl GenerateArgs {
    fn cluster_config(&self) -> ClusterConfig {
        let mut config = ClusterConfig::default();
        if let Some(templates) = &self.templates {
            config.templates_root = templates.clone();
        }
        if let Some(target) = &self.target {
            config.target_root = target.clone();
        }
        if let Some(network) = &self.network {
            config.network = network.clone();
        }
        if let Some(image) = &self.hadoop_image {
            config.images.hadoop = image.clone();
        }
        if let Some(secs) = self.download_timeout {
            config.download_timeout = Duration::from_secs(secs);
        }
        config.jobs = self.jobs;
        config
    }
}

/// Execute the `generate` command.
pub fn execute(args: GenerateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let config = args.cluster_config();
    let selection = args.selection.resolve()?;

    if args.dry_run {
        return dry_run(&args, &out, &config, &selection);
    }

    if !args.quiet {
        println!(
            "{} Provisioning cluster into {}",
            mark(&out, Mark::Start),
            config.target_root.display()
        );
    }

    let start = Instant::now();
    let provisioner = Provisioner::new(&config);
    match orchestrator::execute(&config, &selection, &provisioner) {
        Ok(report) => {
            if !args.quiet {
                print_reports(&out, &report.phases);
                println!(
                    "{} {} containers, {} written in {:.2}s",
                    mark(&out, Mark::Done),
                    count(&out, report.topology.all().count()),
                    report.manifest_path.display(),
                    start.elapsed().as_secs_f64()
                );
            }
            Ok(())
        }
        Err(e) => {
            if !args.quiet {
                println!("{} Generate failed", mark(&out, Mark::Fail));
            }
            Err(e.into())
        }
    }
}

fn dry_run(
    args: &GenerateArgs,
    out: &OutputConfig,
    config: &ClusterConfig,
    selection: &FeatureSelection,
) -> Result<()> {
    let plan = orchestrator::plan(config, selection)?;

    if !args.quiet {
        println!(
            "{} Dry run for {} (nothing will be written)",
            mark(out, Mark::Plan),
            config.target_root.display()
        );
        print_plans(out, "download", &plan.downloads);
        print_plans(out, "decompress", &plan.decompressions);
        print_plans(out, "copy", &plan.copies);
        print_plans(out, "render", &plan.renders);
        print_reports(out, &plan.reports());
        println!();
    }

    print!("{}", plan.manifest);
    Ok(())
}

fn print_plans<T: Display>(out: &OutputConfig, verb: &str, plans: &[Planned<T>]) {
    for planned in plans {
        match &planned.decision {
            Decision::Execute => println!("   would {} {}", verb, planned.task),
            Decision::Skip { reason } => println!(
                "   {} {} {}: {}",
                mark(out, Mark::Skip),
                verb,
                planned.task,
                reason
            ),
        }
    }
}

fn print_reports(out: &OutputConfig, reports: &[PhaseReport]) {
    for report in reports {
        println!(
            "   {}: {} executed, {} skipped",
            report.phase,
            count(out, report.executed),
            count(out, report.skipped)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(temp: &TempDir) -> GenerateArgs {
        GenerateArgs {
            selection: SelectionArgs::default(),
            templates: Some(temp.path().join("templates")),
            target: Some(temp.path().join("target")),
            network: None,
            hadoop_image: None,
            jobs: 2,
            download_timeout: None,
            dry_run: true,
            quiet: true,
        }
    }

    #[test]
    fn test_cluster_config_overrides() {
        let temp = TempDir::new().unwrap();
        let mut args = args(&temp);
        args.network = Some("lab.net".to_string());
        args.hadoop_image = Some("hadoop:dev".to_string());
        args.download_timeout = Some(5);

        let config = args.cluster_config();
        assert_eq!(config.target_root, temp.path().join("target"));
        assert_eq!(config.network, "lab.net");
        assert_eq!(config.images.hadoop, "hadoop:dev");
        assert_eq!(config.download_timeout, Duration::from_secs(5));
        assert_eq!(config.jobs, 2);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("templates")).unwrap();
        execute(args(&temp), "never").unwrap();
        assert!(!temp.path().join("target").exists());
    }

    #[test]
    fn test_invalid_selection_fails() {
        let temp = TempDir::new().unwrap();
        let mut args = args(&temp);
        args.selection.datanodes = Some(0);
        let err = execute(args, "never").unwrap_err();
        assert!(err.to_string().contains("datanode"));
    }
}
