//! Mount resolution and access control against real directories.

use crate::common::{init_tracing, path, TestMount, DATA};
use recio::{
    AccessMode, Error, MemoryBackend, MountId, MountTable, OpenMode, RecordReader, RecordWriter,
    Sink, Status, VPath,
};
use std::sync::Arc;

#[test]
fn equivalent_paths_open_the_same_file() {
    let mount = TestMount::new();
    mount.append("dir/file.rio", &[b"x"]).unwrap();

    for raw in ["dir/file.rio", "/dir//file.rio", "dir\\file.rio", "dir/sub/../file.rio"] {
        let sink = mount.table.open(DATA, &path(raw), OpenMode::Read).unwrap();
        assert_eq!(sink.remaining(), 2, "{raw}");
    }
}

#[test]
fn escaping_the_root_is_rejected_at_parse_time() {
    let err = VPath::parse("../outside.rio").unwrap_err();
    assert!(matches!(err, Error::InvalidPath(_)));
    assert_eq!(err.status(), Status::Failure);
}

#[test]
fn read_only_mount_refuses_every_write_mode() {
    let mount = TestMount::new();
    mount.append("data.rio", &[b"original"]).unwrap();
    let before = std::fs::read(mount.native("data.rio")).unwrap();

    let read_only = MountId(7);
    mount
        .table
        .mount(read_only, mount.dir.path(), AccessMode::ReadOnly)
        .unwrap();

    for mode in [OpenMode::Write, OpenMode::Append, OpenMode::ReadWrite] {
        let err = mount
            .table
            .open(read_only, &path("data.rio"), mode)
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)), "{mode:?}");
    }
    // Write mode would have truncated; the file is intact.
    assert_eq!(std::fs::read(mount.native("data.rio")).unwrap(), before);
    // A refused create leaves no file behind.
    assert!(mount
        .table
        .open(read_only, &path("new.rio"), OpenMode::Write)
        .is_err());
    assert!(!mount.native("new.rio").exists());

    let records = recio::read_all(&mount.table, read_only, &path("data.rio")).unwrap();
    assert_eq!(records, vec![b"original".to_vec()]);
}

#[test]
fn unregistered_mount_is_not_found() {
    let mount = TestMount::new();
    let err = mount
        .table
        .open(MountId(99), &path("any.rio"), OpenMode::Read)
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status(), Status::NotFound);
}

#[test]
fn unmounted_table_stops_resolving() {
    let mount = TestMount::new();
    assert!(mount.table.unmount(DATA));
    assert!(mount.table.resolve(DATA, &VPath::root()).unwrap_err().is_not_found());
}

#[test]
fn memory_mount_hosts_record_streams() {
    init_tracing();
    let backend = Arc::new(MemoryBackend::new());
    let table = MountTable::new();
    table
        .mount_backend(MountId(3), "scratch", AccessMode::ReadWrite, backend.clone())
        .unwrap();

    let target = path("queue.rio");
    {
        let mut sink = table.open(MountId(3), &target, OpenMode::Append).unwrap();
        RecordWriter::new(&mut sink)
            .unwrap()
            .append_all([b"one".as_slice(), b"two"])
            .unwrap();
    }
    assert_eq!(
        backend.file_bytes("scratch/queue.rio"),
        Some(vec![0x03, b'o', b'n', b'e', 0x03, b't', b'w', b'o'])
    );

    let mut sink = table.open(MountId(3), &target, OpenMode::Read).unwrap();
    let mut reader = RecordReader::new(&mut sink).unwrap();
    reader.skip_forward(1).unwrap();
    assert_eq!(reader.read_next().unwrap(), b"two");
}

#[test]
fn archive_style_mount_is_read_only_by_capability() {
    let archive = MemoryBackend::read_only();
    archive.insert("pack/levels.rio", vec![0x02, b'l', b'1']);

    let table = MountTable::new();
    table
        .mount_backend(MountId(0), "pack", AccessMode::ReadWrite, Arc::new(archive))
        .unwrap();

    assert!(matches!(
        table.open(MountId(0), &path("levels.rio"), OpenMode::Append),
        Err(Error::PermissionDenied(_))
    ));
    let records = recio::read_all(&table, MountId(0), &path("levels.rio")).unwrap();
    assert_eq!(records, vec![b"l1".to_vec()]);
}

#[test]
fn mount_table_is_shareable_across_threads() {
    let mount = TestMount::new();
    mount.append("shared.rio", &[b"payload"]).unwrap();
    let table = Arc::new(mount.table);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let table = Arc::clone(&table);
            std::thread::spawn(move || recio::read_all(&table, DATA, &path("shared.rio")).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), vec![b"payload".to_vec()]);
    }
}
