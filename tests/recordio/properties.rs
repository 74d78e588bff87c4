//! Stream properties checked against files on a mount.

use crate::common::{path, TestMount, DATA};
use proptest::prelude::*;
use recio::{OpenMode, RecordReader};

fn payloads() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..300), 1..16)
}

proptest! {
    // Every case creates and mounts a temporary directory.
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_file_stream_preserves_order(records in payloads(), split in any::<prop::sample::Index>()) {
        let mount = TestMount::new();
        let refs: Vec<&[u8]> = records.iter().map(Vec::as_slice).collect();

        // Two separate append handles, so ordering holds across reopen.
        let at = split.index(refs.len() + 1);
        mount.append("prop.rio", &refs[..at]).unwrap();
        mount.append("prop.rio", &refs[at..]).unwrap();

        let read = recio::read_all(&mount.table, DATA, &path("prop.rio")).unwrap();
        prop_assert_eq!(read, records);
    }

    #[test]
    fn prop_skip_then_read_matches_sequential_reads(
        records in payloads(),
        pick in any::<prop::sample::Index>(),
    ) {
        let mount = TestMount::new();
        let refs: Vec<&[u8]> = records.iter().map(Vec::as_slice).collect();
        mount.append("skip.rio", &refs).unwrap();
        let k = pick.index(records.len());

        let mut sink = mount.table.open(DATA, &path("skip.rio"), OpenMode::Read).unwrap();
        let mut reader = RecordReader::new(&mut sink).unwrap();
        reader.skip_forward(k as u64).unwrap();
        prop_assert_eq!(&reader.read_next().unwrap(), &records[k]);
        prop_assert_eq!(reader.records_read(), k as u64 + 1);
    }
}
