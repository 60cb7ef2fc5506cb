use sim_core::Tick;

/// Position in an [`EventBuffer`] stream. Pass the cursor returned by the
/// previous read to receive only newer events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct EventCursor(pub u64);

/// An event tagged with the tick that produced it and its stream position.
#[derive(Clone, Debug, PartialEq)]
pub struct SequencedEvent<E> {
    pub sequence: u64,
    pub tick: Tick,
    pub event: E,
}

/// Fixed-capacity ring buffer of simulation events.
///
/// Presentation layers (HUD, audio cues, replays) poll it with a cursor
/// instead of registering callbacks on the simulation. Readers that fall
/// more than `capacity` events behind silently skip the overwritten ones.
pub struct EventBuffer<E> {
    slots: Vec<Option<SequencedEvent<E>>>,
    capacity: usize,
    next_sequence: u64,
}

impl<E: Clone> EventBuffer<E> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            capacity,
            next_sequence: 0,
        }
    }

    pub fn push(&mut self, tick: Tick, event: E) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let index = (sequence % self.capacity as u64) as usize;
        self.slots[index] = Some(SequencedEvent {
            sequence,
            tick,
            event,
        });
    }

    /// Push every event produced by one tick, preserving their order.
    pub fn extend<I: IntoIterator<Item = E>>(&mut self, tick: Tick, events: I) {
        for event in events {
            self.push(tick, event);
        }
    }

    /// Sequence number of the oldest event still held.
    pub fn oldest_sequence(&self) -> u64 {
        self.next_sequence.saturating_sub(self.capacity as u64)
    }

    /// Returns events at or after `cursor` and the cursor to resume from.
    pub fn read_from(&self, cursor: EventCursor) -> (Vec<SequencedEvent<E>>, EventCursor) {
        let start = cursor.0.max(self.oldest_sequence());
        let events = (start..self.next_sequence)
            .filter_map(|seq| {
                let index = (seq % self.capacity as u64) as usize;
                self.slots[index]
                    .as_ref()
                    .filter(|slot| slot.sequence == seq)
                    .cloned()
            })
            .collect();

        (events, EventCursor(self.next_sequence))
    }

    pub fn cursor(&self) -> EventCursor {
        EventCursor(self.next_sequence)
    }

    pub fn len(&self) -> usize {
        (self.next_sequence - self.oldest_sequence()) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.next_sequence == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_all_events_from_start() {
        let mut buffer: EventBuffer<&str> = EventBuffer::new(8);
        buffer.extend(1, ["wave_started", "zombie_spawned"]);
        buffer.push(2, "shot_fired");

        let (events, cursor) = buffer.read_from(EventCursor::default());
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].tick, 1);
        assert_eq!(events[1].event, "zombie_spawned");
        assert_eq!(events[2].sequence, 2);
        assert_eq!(cursor, EventCursor(3));
    }

    #[test]
    fn cursor_resumes_after_last_read() {
        let mut buffer: EventBuffer<u32> = EventBuffer::new(8);
        buffer.push(1, 10);
        let (_, cursor) = buffer.read_from(EventCursor(0));

        buffer.push(2, 20);
        buffer.push(2, 21);
        let (events, cursor) = buffer.read_from(cursor);
        assert_eq!(
            events.iter().map(|e| e.event).collect::<Vec<_>>(),
            vec![20, 21]
        );
        assert_eq!(cursor, buffer.cursor());

        let (events, _) = buffer.read_from(cursor);
        assert!(events.is_empty());
    }

    #[test]
    fn lagging_reader_skips_overwritten_events() {
        let mut buffer: EventBuffer<u32> = EventBuffer::new(4);
        for i in 0..10 {
            buffer.push(i, i as u32);
        }

        assert_eq!(buffer.oldest_sequence(), 6);
        assert_eq!(buffer.len(), 4);

        let (events, cursor) = buffer.read_from(EventCursor(2));
        assert_eq!(events.first().map(|e| e.sequence), Some(6));
        assert_eq!(events.len(), 4);
        assert_eq!(cursor, EventCursor(10));
    }

    #[test]
    fn empty_buffer_reads_nothing() {
        let buffer: EventBuffer<u32> = EventBuffer::new(0);
        assert!(buffer.is_empty());
        let (events, cursor) = buffer.read_from(EventCursor(0));
        assert!(events.is_empty());
        assert_eq!(cursor, EventCursor(0));
    }
}
