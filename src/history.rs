use log::warn;

/// Fixed-capacity ring of note-on pitches.
///
/// `cursor` is the slot the next pitch will be written to, so the slot just
/// before it always holds the most recent pitch. When full, the oldest
/// entry is overwritten.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    slots: Vec<Option<u8>>,
    cursor: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            warn!("History buffer capacity 0 requested, using 1");
            1
        } else {
            capacity
        };
        Self {
            slots: vec![None; capacity],
            cursor: 0,
        }
    }

    /// Record `pitch` and return the pitch that was most recent before it
    /// (None on the very first append).
    pub fn append(&mut self, pitch: u8) -> Option<u8> {
        let previous = self.latest();
        self.slots[self.cursor] = Some(pitch);
        self.cursor = (self.cursor + 1) % self.slots.len();
        previous
    }

    /// Most recently appended pitch.
    pub fn latest(&self) -> Option<u8> {
        let n = self.slots.len();
        self.slots[(self.cursor + n - 1) % n]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots written so far, saturating at capacity.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.latest().is_none()
    }

    /// Stored pitches, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        let (newer, older) = self.slots.split_at(self.cursor);
        older.iter().chain(newer.iter()).filter_map(|s| *s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_append_has_no_previous() {
        let mut buf = HistoryBuffer::new(8);
        assert!(buf.is_empty());
        assert_eq!(buf.append(60), None);
        assert_eq!(buf.append(62), Some(60));
        assert_eq!(buf.append(62), Some(62));
        assert_eq!(buf.latest(), Some(62));
    }

    #[test]
    fn test_wraparound_overwrites_oldest() {
        let cap = 1500;
        let mut buf = HistoryBuffer::new(cap);
        for i in 0..=cap {
            buf.append((i % 128) as u8);
        }
        assert_eq!(buf.cursor(), 1);
        assert_eq!(buf.len(), cap);
        // First value (0) was overwritten by value cap % 128
        assert_eq!(buf.iter().next(), Some(1));
        assert_eq!(buf.latest(), Some((cap % 128) as u8));
    }

    #[test]
    fn test_previous_is_last_written_across_wrap() {
        let mut buf = HistoryBuffer::new(3);
        buf.append(10);
        buf.append(20);
        buf.append(30);
        assert_eq!(buf.cursor(), 0);
        assert_eq!(buf.append(40), Some(30));
        assert_eq!(buf.iter().collect::<Vec<_>>(), vec![20, 30, 40]);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let mut buf = HistoryBuffer::new(0);
        assert_eq!(buf.capacity(), 1);
        assert_eq!(buf.append(5), None);
        assert_eq!(buf.append(6), Some(5));
        assert_eq!(buf.cursor(), 0);
    }
}
