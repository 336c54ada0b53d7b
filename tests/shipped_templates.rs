//! Renders every template shipped in `templates/` against the data model of
//! a selection, so a template referencing a missing key fails here rather
//! than in a user's run.

use std::path::Path;

use docker_hadoop::component::{build_pipeline_components, template_data};
use docker_hadoop::config::{ClusterConfig, FeatureSelection};
use docker_hadoop::template::{TemplateEngine, TeraEngine};
use walkdir::WalkDir;

fn templates_root() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("templates")
}

/// Renders the templates of every enabled component and returns how many
/// were rendered.
fn render_all(selection: &FeatureSelection) -> usize {
    let config = ClusterConfig::new(templates_root(), "target");
    let components = build_pipeline_components(&config, selection).unwrap();
    let data = template_data(&config, &components);

    let mut rendered = 0;
    for component in &components {
        for entry in WalkDir::new(&component.template_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("template") {
                continue;
            }
            let source = std::fs::read_to_string(path).unwrap();
            if let Err(e) = TeraEngine.render(path, &source, &data) {
                panic!("{} failed to render: {}", path.display(), e);
            }
            rendered += 1;
        }
    }
    rendered
}

#[test]
fn test_default_selection_renders() {
    assert!(render_all(&FeatureSelection::default()) > 10);
}

#[test]
fn test_every_component_renders() {
    let selection = FeatureSelection {
        all: true,
        datanodes: 3,
        presto_workers: 3,
        ..FeatureSelection::default()
    };
    assert!(render_all(&selection) > render_all(&FeatureSelection::default()));
}

#[test]
fn test_presto_without_workers_renders() {
    let selection = FeatureSelection {
        presto: true,
        ..FeatureSelection::default()
    };
    render_all(&selection);
}

#[test]
fn test_hue_without_hive_renders() {
    let selection = FeatureSelection {
        hue: true,
        spark_thrift: true,
        ..FeatureSelection::default()
    };
    render_all(&selection);
}

#[test]
fn test_hdfs_replication_follows_datanodes() {
    let selection = FeatureSelection {
        datanodes: 2,
        ..FeatureSelection::default()
    };
    let config = ClusterConfig::new(templates_root(), "target");
    let components = build_pipeline_components(&config, &selection).unwrap();
    let data = template_data(&config, &components);
    let path = templates_root().join("hadoop/conf/hdfs-site.xml.template");
    let source = std::fs::read_to_string(&path).unwrap();

    let rendered = TeraEngine.render(&path, &source, &data).unwrap();
    assert!(rendered.contains("<value>2</value>"));
    assert!(rendered.contains("qjournal://journalnode1:8485;journalnode2:8485;journalnode3:8485/nameservice"));
}
