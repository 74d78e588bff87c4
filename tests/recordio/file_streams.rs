//! Round trips through files on a mount.

use crate::common::{path, TestMount, DATA};
use recio::{status_of, Error, OpenMode, RecordReader, RecordWriter, Sink, Status};

#[test]
fn hello_goodbye_on_disk() {
    let mount = TestMount::new();
    mount
        .append("greetings.rio", &[b"Hello World", b"Goodbye World"])
        .unwrap();

    let mut sink = mount
        .table
        .open(DATA, &path("greetings.rio"), OpenMode::Read)
        .unwrap();
    let mut reader = RecordReader::new(&mut sink).unwrap();

    reader.skip_forward(1).unwrap();
    let mut buf = [0u8; 32];
    let len = reader.read_next_record(&mut buf).unwrap();
    assert_eq!(&buf[..len], b"Goodbye World");

    assert_eq!(status_of(&reader.read_next_record(&mut buf)), Status::NotFound);
    assert_eq!(status_of(&reader.skip_forward(1)), Status::NotFound);
}

#[test]
fn byte_exact_layout() {
    let mount = TestMount::new();
    mount.append("layout.rio", &[b"abc", b"", &[0u8; 200]]).unwrap();

    let bytes = std::fs::read(mount.native("layout.rio")).unwrap();
    assert_eq!(&bytes[..5], &[0x03, b'a', b'b', b'c', 0x00]);
    assert_eq!(&bytes[5..7], &[0xC8, 0x01]);
    assert_eq!(bytes.len(), 4 + 1 + 2 + 200);
}

#[test]
fn appends_across_handles_keep_order() {
    let mount = TestMount::new();
    for i in 0..10u8 {
        mount.append("seq.rio", &[&[i; 3]]).unwrap();
    }

    let records = recio::read_all(&mount.table, DATA, &path("seq.rio")).unwrap();
    assert_eq!(records.len(), 10);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record, &vec![i as u8; 3]);
    }
}

#[test]
fn truncated_file_fails_distinctly_from_end() {
    let mount = TestMount::new();
    mount.append("cut.rio", &[b"first", b"second record"]).unwrap();

    // Chop the last four payload bytes off.
    let location = mount.native("cut.rio");
    let len = std::fs::metadata(&location).unwrap().len();
    let file = std::fs::OpenOptions::new().write(true).open(&location).unwrap();
    file.set_len(len - 4).unwrap();
    drop(file);

    let mut sink = mount.table.open(DATA, &path("cut.rio"), OpenMode::Read).unwrap();
    let mut reader = RecordReader::new(&mut sink).unwrap();
    assert_eq!(reader.read_next().unwrap(), b"first");

    let err = reader.read_next().unwrap_err();
    assert!(matches!(err, Error::IncompleteEntry { offset: 6, .. }));
    assert_eq!(err.status(), Status::Failure);
}

#[test]
fn write_mode_starts_a_fresh_stream() {
    let mount = TestMount::new();
    mount.append("fresh.rio", &[b"old"]).unwrap();

    let mut sink = mount
        .table
        .open(DATA, &path("fresh.rio"), OpenMode::Write)
        .unwrap();
    RecordWriter::new(&mut sink).unwrap().append(b"new").unwrap();
    drop(sink);

    let records = recio::read_all(&mount.table, DATA, &path("fresh.rio")).unwrap();
    assert_eq!(records, vec![b"new".to_vec()]);
}

#[test]
fn writer_on_read_write_handle_keeps_existing_records() {
    let mount = TestMount::new();
    mount.append("rw.rio", &[b"one", b"two"]).unwrap();

    // ReadWrite opens with the cursor at the start of the file.
    let mut sink = mount
        .table
        .open(DATA, &path("rw.rio"), OpenMode::ReadWrite)
        .unwrap();
    assert_eq!(sink.remaining(), 8);
    RecordWriter::new(&mut sink).unwrap().append(b"x").unwrap();
    drop(sink);

    let bytes = std::fs::read(mount.native("rw.rio")).unwrap();
    assert_eq!(
        bytes,
        vec![0x03, b'o', b'n', b'e', 0x03, b't', b'w', b'o', 0x01, b'x']
    );
    let records = recio::read_all(&mount.table, DATA, &path("rw.rio")).unwrap();
    assert_eq!(records, vec![b"one".to_vec(), b"two".to_vec(), b"x".to_vec()]);
}

#[test]
fn missing_stream_is_not_found() {
    let mount = TestMount::new();
    let err = recio::read_all(&mount.table, DATA, &path("absent.rio")).unwrap_err();
    assert!(err.is_not_found());
}
