use std::fs;

use tempfile::TempDir;

use diskprobe_analyze::{
    compile_ruleset, default_rules, InsightCategory, InsightConfig, InsightGenerator, PatternRule,
};
use diskprobe_core::{finalize, iter_nodes, ScanConfig, ScanNode, ScanSnapshot};
use diskprobe_scan::scan_path;

// Rules for the on-disk tests. Temp directories live under paths like
// /tmp/.tmpXYZ, so the default `**/tmp/**` rule would classify the whole
// scan root; these rule names cannot collide with any ancestor segment.
fn disk_test_rules() -> Vec<PatternRule> {
    vec![
        PatternRule::new("Scratch", "**/scratch-temp/**", InsightCategory::Temp),
        PatternRule::new("Trace Logs", "**/*.tracelog", InsightCategory::Temp),
        PatternRule::new("Depot Cache", "**/depot-cache/**", InsightCategory::Cache),
        PatternRule::new("node_modules", "**/node_modules/**", InsightCategory::BuildArtifact)
            .stop_recursion(),
    ]
}

/// Build a project-looking tree on disk and scan it for real.
fn scanned_project() -> ScanSnapshot {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("src/lib.rs"), vec![b'x'; 4_000]).unwrap();
    fs::write(root.join("README.md"), vec![b'x'; 500]).unwrap();

    fs::create_dir_all(root.join("node_modules/react")).unwrap();
    fs::write(root.join("node_modules/react/index.js"), vec![b'x'; 20_000]).unwrap();

    fs::create_dir_all(root.join("scratch-temp")).unwrap();
    fs::write(root.join("scratch-temp/run.tracelog"), vec![b'x'; 8_000]).unwrap();

    fs::create_dir_all(root.join("depot-cache")).unwrap();
    fs::write(root.join("depot-cache/blob"), vec![b'x'; 12_000]).unwrap();

    fs::write(root.join("build.tracelog"), vec![b'x'; 1_000]).unwrap();

    scan_path(&ScanConfig::new(root)).unwrap()
}

#[test]
fn test_end_to_end_classification() {
    let snapshot = scanned_project();
    let generator = InsightGenerator::new();
    let ruleset = compile_ruleset(&disk_test_rules(), &[]);
    let bundle = generator.generate(&snapshot.root, &ruleset);

    let paths: Vec<&str> = bundle.insights.iter().map(|i| i.path.as_str()).collect();

    // node_modules reported once, as a whole.
    assert!(paths.iter().any(|p| p.ends_with("/node_modules")));
    assert!(!paths.iter().any(|p| p.contains("/node_modules/")));

    // scratch-temp reported once; its contents pruned.
    assert!(paths.iter().any(|p| p.ends_with("/scratch-temp")));
    assert!(!paths.iter().any(|p| p.ends_with("run.tracelog")));

    // The stray top-level trace log is reported on its own.
    assert!(paths.iter().any(|p| p.ends_with("build.tracelog")));

    // Source files are not insights.
    assert!(!paths.iter().any(|p| p.ends_with("lib.rs")));
    assert!(!paths.iter().any(|p| p.ends_with("README.md")));

    // Output is globally ranked by reclaimable space.
    for pair in bundle.insights.windows(2) {
        assert!(pair[0].disk_usage >= pair[1].disk_usage);
    }
}

#[test]
fn test_category_stats_cover_evicted_matches() {
    let snapshot = scanned_project();
    let config = InsightConfig::builder()
        .max_insights_per_category(1usize)
        .build()
        .unwrap();
    let generator = InsightGenerator::with_config(config);
    let ruleset = compile_ruleset(&disk_test_rules(), &[]);
    let bundle = generator.generate(&snapshot.root, &ruleset);

    // scratch-temp and build.tracelog both match Temp; only one survives
    // the cut but both are aggregated.
    let temp = bundle.stats(InsightCategory::Temp);
    assert_eq!(temp.count, 2);

    let surviving = bundle.filter(&[InsightCategory::Temp]);
    assert_eq!(surviving.len(), 1);
    assert!(surviving[0].path.ends_with("/scratch-temp"));
    assert!(temp.disk_usage > surviving[0].disk_usage);
}

/// Synthetic tree whose paths exercise the default catalogue.
fn synthetic_workspace() -> ScanNode {
    fn file(path: &str, size: u64, disk: u64) -> ScanNode {
        let name = path.rsplit('/').next().unwrap().to_string();
        ScanNode::new_file(path, name, size, disk)
    }
    fn dir(path: &str, children: Vec<ScanNode>) -> ScanNode {
        let name = path.rsplit('/').next().unwrap().to_string();
        let mut node = ScanNode::new_directory(path, name);
        node.children = children;
        node
    }

    let mut root = dir(
        "/proj",
        vec![
            dir("/proj/src", vec![file("/proj/src/main.rs", 3_000, 4_096)]),
            dir(
                "/proj/node_modules",
                vec![dir(
                    "/proj/node_modules/left-pad",
                    vec![file("/proj/node_modules/left-pad/index.js", 900, 1_024)],
                )],
            ),
            dir(
                "/proj/target",
                vec![file("/proj/target/debug-binary", 90_000, 98_304)],
            ),
            dir("/proj/tmp", vec![file("/proj/tmp/scan.log", 5_000, 8_192)]),
            dir(
                "/proj/.gradle",
                vec![file("/proj/.gradle/module.bin", 40_000, 40_960)],
            ),
            file("/proj/.DS_Store", 6_148, 8_192),
            file("/proj/debug.log", 2_000, 2_048),
            file("/proj/notes.md", 100, 512),
        ],
    );
    finalize(&mut root);
    root
}

#[test]
fn test_default_rules_against_synthetic_workspace() {
    let root = synthetic_workspace();
    let generator = InsightGenerator::new();
    let ruleset = generator.compile(&default_rules());
    let bundle = generator.generate(&root, &ruleset);

    let by_path = |path: &str| bundle.insights.iter().find(|i| i.path == path);

    assert_eq!(
        by_path("/proj/node_modules").unwrap().category,
        InsightCategory::BuildArtifact
    );
    assert_eq!(
        by_path("/proj/target").unwrap().category,
        InsightCategory::BuildArtifact
    );
    assert_eq!(by_path("/proj/tmp").unwrap().category, InsightCategory::Temp);
    assert_eq!(
        by_path("/proj/.gradle").unwrap().category,
        InsightCategory::Cache
    );
    assert_eq!(
        by_path("/proj/.DS_Store").unwrap().category,
        InsightCategory::Temp
    );
    assert_eq!(by_path("/proj/debug.log").unwrap().category, InsightCategory::Temp);

    assert!(by_path("/proj/src/main.rs").is_none());
    assert!(by_path("/proj/notes.md").is_none());
    // Pruned and stopped subtrees never surface.
    assert!(by_path("/proj/node_modules/left-pad").is_none());
    assert!(by_path("/proj/target/debug-binary").is_none());
    assert!(by_path("/proj/tmp/scan.log").is_none());
    assert!(by_path("/proj/.gradle/module.bin").is_none());
}

#[test]
fn test_rule_order_does_not_change_classification() {
    let root = synthetic_workspace();

    let rules = default_rules();
    let mut reversed = rules.clone();
    reversed.reverse();

    let forward = compile_ruleset(&rules, &[]);
    let backward = compile_ruleset(&reversed, &[]);

    for node in iter_nodes(&root) {
        let lpath = node.path.to_lowercase();
        let lbase = node.name.to_lowercase();

        let mut a: Vec<InsightCategory> = forward
            .match_all(&lpath, &lbase, node.is_dir())
            .iter()
            .map(|r| r.category)
            .collect();
        let mut b: Vec<InsightCategory> = backward
            .match_all(&lpath, &lbase, node.is_dir())
            .iter()
            .map(|r| r.category)
            .collect();
        a.sort_by_key(|c| c.index());
        b.sort_by_key(|c| c.index());
        assert_eq!(a, b, "divergent categories for {}", node.path);
    }
}

#[test]
fn test_stop_recursion_descendants_never_surface() {
    let root = synthetic_workspace();
    let generator = InsightGenerator::new();
    let ruleset = generator.compile(&default_rules());
    let bundle = generator.generate(&root, &ruleset);

    let matched_roots: Vec<&str> = bundle
        .insights
        .iter()
        .filter(|i| i.category == InsightCategory::BuildArtifact)
        .map(|i| i.path.as_str())
        .collect();
    assert!(!matched_roots.is_empty());

    for insight in &bundle.insights {
        for matched in &matched_roots {
            assert!(
                !insight.path.starts_with(&format!("{matched}/")),
                "{} is inside stop-recursion match {matched}",
                insight.path
            );
        }
    }
}
