//! Building mount tables from TOML files.

use crate::common::{init_tracing, path};
use recio::{
    AccessMode, BackendKind, Error, MountConfig, MountEntry, MountId, MountTable, OpenMode,
};
use tempfile::TempDir;

#[test]
fn table_from_config_file() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir(&data).unwrap();

    let config_path = dir.path().join("mounts.toml");
    std::fs::write(
        &config_path,
        format!(
            "[[mount]]\nid = 0\nroot = {:?}\naccess = \"read-write\"\n\n\
             [[mount]]\nid = 1\nroot = {:?}\n\n\
             [[mount]]\nid = 2\nroot = \"scratch\"\nbackend = \"memory\"\naccess = \"read-write\"\n",
            data.display().to_string(),
            data.display().to_string()
        ),
    )
    .unwrap();

    let config = MountConfig::from_file(&config_path).unwrap();
    let table = MountTable::from_config(&config).unwrap();

    let mounts = table.list_mounts();
    assert_eq!(mounts.len(), 3);
    assert_eq!(mounts[0].access, AccessMode::ReadWrite);
    assert_eq!(mounts[1].access, AccessMode::ReadOnly);
    assert_eq!(mounts[2].backend, "memory");

    table
        .open(MountId(0), &path("x.rio"), OpenMode::Write)
        .unwrap();
    assert!(data.join("x.rio").exists());
    assert!(table
        .open(MountId(1), &path("x.rio"), OpenMode::Write)
        .is_err());
    assert!(table
        .open(MountId(2), &path("y.rio"), OpenMode::Write)
        .is_ok());
}

#[test]
fn invalid_config_is_a_config_error() {
    let config = MountConfig {
        mounts: vec![
            MountEntry {
                id: 5,
                root: "/a".into(),
                access: AccessMode::ReadOnly,
                backend: BackendKind::Std,
            },
            MountEntry {
                id: 5,
                root: "/b".into(),
                access: AccessMode::ReadOnly,
                backend: BackendKind::Std,
            },
        ],
    };
    assert!(matches!(
        MountTable::from_config(&config),
        Err(Error::Config(_))
    ));
}
