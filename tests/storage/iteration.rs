//! Directory iteration and stat through mounts.

use crate::common::{path, TestMount, DATA};
use recio::DirNode;

fn populate(mount: &TestMount) {
    mount.append("top.rio", &[b"t"]).unwrap();
    mount.append("logs/a.rio", &[b"aa"]).unwrap();
    mount.append("logs/2024/b.rio", &[b"bbb"]).unwrap();
}

fn sorted_paths(nodes: &[DirNode]) -> Vec<String> {
    let mut paths: Vec<String> = nodes.iter().map(|n| n.path.to_string()).collect();
    paths.sort();
    paths
}

#[test]
fn flat_listing_reports_directories_as_boundaries() {
    let mount = TestMount::new();
    populate(&mount);

    let nodes: Vec<DirNode> = mount
        .table
        .iterate(DATA, &path(""), false)
        .unwrap()
        .collect::<recio::Result<_>>()
        .unwrap();
    assert_eq!(sorted_paths(&nodes), vec!["/logs", "/top.rio"]);

    let logs = nodes.iter().find(|n| n.path == path("logs")).unwrap();
    assert!(logs.is_dir);
    assert_eq!(logs.location, mount.native("logs"));
}

#[test]
fn recursive_listing_expands_in_place() {
    let mount = TestMount::new();
    populate(&mount);

    let nodes: Vec<DirNode> = mount
        .table
        .iterate(DATA, &path("logs"), true)
        .unwrap()
        .collect::<recio::Result<_>>()
        .unwrap();
    assert_eq!(
        sorted_paths(&nodes),
        vec!["/logs/2024", "/logs/2024/b.rio", "/logs/a.rio"]
    );

    let dir = nodes.iter().position(|n| n.path == path("logs/2024")).unwrap();
    let child = nodes
        .iter()
        .position(|n| n.path == path("logs/2024/b.rio"))
        .unwrap();
    assert!(dir < child);
}

#[test]
fn stat_reports_size_of_stream() {
    let mount = TestMount::new();
    populate(&mount);

    let node = mount.table.stat(DATA, &path("logs/2024/b.rio")).unwrap();
    assert!(!node.is_dir);
    assert_eq!(node.size, 4);
    assert!(mount.table.stat(DATA, &path("nope")).unwrap_err().is_not_found());
}

#[test]
fn iterating_a_missing_directory_is_not_found() {
    let mount = TestMount::new();
    let result = mount.table.iterate(DATA, &path("missing"), false);
    assert!(result.err().unwrap().is_not_found());
}
