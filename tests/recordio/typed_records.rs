//! Records carrying values in the wire format.

use crate::common::{path, TestMount, DATA};
use recio::{Error, OpenMode, RecordReader, RecordWriter, Result, Sink, VarInt, VarUInt, Wire};

#[derive(Debug, Clone, PartialEq)]
struct Event {
    id: VarUInt,
    delta: VarInt,
    name: String,
    tags: Vec<String>,
    score: Option<f64>,
}

impl Wire for Event {
    fn write_to<S: Sink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        self.id.write_to(sink)?;
        self.delta.write_to(sink)?;
        self.name.write_to(sink)?;
        VarUInt::from(self.tags.len()).write_to(sink)?;
        for tag in &self.tags {
            tag.write_to(sink)?;
        }
        self.score.write_to(sink)
    }

    fn read_from<S: Sink + ?Sized>(sink: &mut S) -> Result<Self> {
        let id = VarUInt::read_from(sink)?;
        let delta = VarInt::read_from(sink)?;
        let name = String::read_from(sink)?;
        let count = usize::try_from(VarUInt::read_from(sink)?)?;
        let mut tags = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            tags.push(String::read_from(sink)?);
        }
        let score = Option::<f64>::read_from(sink)?;
        Ok(Event {
            id,
            delta,
            name,
            tags,
            score,
        })
    }
}

fn event(id: u64) -> Event {
    Event {
        id: VarUInt::new(id),
        delta: VarInt::new(-(id as i64)),
        name: format!("event-{id}"),
        tags: vec!["a".into(), "b".into()],
        score: if id % 2 == 0 { Some(id as f64 / 2.0) } else { None },
    }
}

#[test]
fn events_round_trip_through_a_file() {
    let mount = TestMount::new();
    let events: Vec<Event> = (0..25).map(event).collect();

    {
        let mut sink = mount
            .table
            .open(DATA, &path("events/log.rio"), OpenMode::Append)
            .unwrap();
        let mut writer = RecordWriter::new(&mut sink).unwrap();
        for e in &events {
            writer.append_value(e).unwrap();
        }
        assert_eq!(writer.counters().records_appended, 25);
    }

    let mut sink = mount
        .table
        .open(DATA, &path("events/log.rio"), OpenMode::Read)
        .unwrap();
    let mut reader = RecordReader::new(&mut sink).unwrap();
    reader.skip_forward(10).unwrap();
    let tail: Vec<Event> = (10..25).map(|_| reader.read_value().unwrap()).collect();
    assert_eq!(tail, events[10..]);
    assert!(reader.read_value::<Event>().unwrap_err().is_not_found());
}

#[test]
fn record_with_trailing_garbage_is_corruption() {
    let mount = TestMount::new();
    let mut payload = recio::to_bytes(&event(1)).unwrap();
    payload.push(0xAA);
    mount.append("junk.rio", &[&payload]).unwrap();

    let mut sink = mount
        .table
        .open(DATA, &path("junk.rio"), OpenMode::Read)
        .unwrap();
    let mut reader = RecordReader::new(&mut sink).unwrap();
    assert!(matches!(
        reader.read_value::<Event>(),
        Err(Error::Corruption(_))
    ));
    // The record was consumed.
    assert!(reader.read_next().unwrap_err().is_not_found());
}
