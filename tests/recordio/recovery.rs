//! Recovering streams whose last append was torn.

use crate::common::{path, TestMount, DATA};
use recio::{recover, AccessMode, MountId, StopReason};

#[test]
fn clean_stream_is_untouched() {
    let mount = TestMount::new();
    mount.append("clean.rio", &[b"a", b"bb"]).unwrap();
    let before = std::fs::read(mount.native("clean.rio")).unwrap();

    let report = recover(&mount.table, DATA, &path("clean.rio")).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.records, 2);
    assert_eq!(std::fs::read(mount.native("clean.rio")).unwrap(), before);
}

#[test]
fn torn_tail_is_truncated_and_appends_resume() {
    let mount = TestMount::new();
    mount.append("torn.rio", &[b"kept", b"also kept"]).unwrap();

    // Simulate a crash halfway through a third append.
    let location = mount.native("torn.rio");
    let mut bytes = std::fs::read(&location).unwrap();
    let valid_len = bytes.len() as u64;
    bytes.extend_from_slice(&[0x20, b'p', b'a', b'r']);
    std::fs::write(&location, &bytes).unwrap();

    let report = recover(&mount.table, DATA, &path("torn.rio")).unwrap();
    assert_eq!(report.records, 2);
    assert_eq!(report.valid_end, valid_len);
    assert_eq!(report.stop_reason, StopReason::PartialRecord { offset: valid_len });
    assert_eq!(std::fs::metadata(&location).unwrap().len(), valid_len);

    mount.append("torn.rio", &[b"after recovery"]).unwrap();
    let records = recio::read_all(&mount.table, DATA, &path("torn.rio")).unwrap();
    assert_eq!(
        records,
        vec![
            b"kept".to_vec(),
            b"also kept".to_vec(),
            b"after recovery".to_vec()
        ]
    );
}

#[test]
fn corrupt_prefix_is_cut_off() {
    let mount = TestMount::new();
    mount.append("bad.rio", &[b"good"]).unwrap();

    let location = mount.native("bad.rio");
    let mut bytes = std::fs::read(&location).unwrap();
    bytes.extend_from_slice(&[0xFF; 12]);
    std::fs::write(&location, &bytes).unwrap();

    let report = recover(&mount.table, DATA, &path("bad.rio")).unwrap();
    assert!(matches!(report.stop_reason, StopReason::Corrupted { offset: 5, .. }));
    assert_eq!(report.bytes_to_truncate(), 12);
    assert_eq!(std::fs::read(&location).unwrap(), vec![0x04, b'g', b'o', b'o', b'd']);
}

#[test]
fn recovery_needs_a_writable_mount() {
    let mount = TestMount::new();
    mount.append("ro.rio", &[b"x"]).unwrap();

    let read_only = MountId(1);
    mount
        .table
        .mount(read_only, mount.dir.path(), AccessMode::ReadOnly)
        .unwrap();
    let err = recover(&mount.table, read_only, &path("ro.rio")).unwrap_err();
    assert!(matches!(err, recio::Error::PermissionDenied(_)));
}
