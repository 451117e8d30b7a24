/// Pitches currently sounding, in the order they were pressed.
///
/// Duplicates are allowed (a second note-on for a held pitch is a separate
/// entry); a note-off removes one matching entry. Order only matters for
/// display.
#[derive(Debug, Clone, Default)]
pub struct HeldNoteSet {
    notes: Vec<u8>,
}

impl HeldNoteSet {
    pub fn new() -> Self {
        Self { notes: Vec::with_capacity(16) }
    }

    pub fn note_on(&mut self, pitch: u8) {
        self.notes.push(pitch);
    }

    /// Remove the first entry equal to `pitch`. Returns true if this
    /// emptied the set. A note-off for an unheld pitch changes nothing.
    pub fn note_off(&mut self, pitch: u8) -> bool {
        match self.notes.iter().position(|&p| p == pitch) {
            Some(i) => {
                self.notes.remove(i);
                self.notes.is_empty()
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn pitches(&self) -> &[u8] {
        &self.notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_off_then_stray_off() {
        let mut held = HeldNoteSet::new();
        held.note_on(60);
        assert!(held.note_off(60), "removing the only note empties the set");
        assert!(held.is_empty());
        assert!(!held.note_off(60), "stray note-off is a no-op");
        assert!(held.is_empty());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut held = HeldNoteSet::new();
        for p in [64, 60, 67] {
            held.note_on(p);
        }
        assert!(!held.note_off(60));
        assert_eq!(held.pitches(), &[64, 67]);
    }

    #[test]
    fn test_duplicate_pitch_needs_two_offs() {
        let mut held = HeldNoteSet::new();
        held.note_on(60);
        held.note_on(60);
        assert_eq!(held.len(), 2);
        assert!(!held.note_off(60));
        assert!(held.note_off(60));
    }

    #[test]
    fn test_off_for_other_pitch_keeps_set() {
        let mut held = HeldNoteSet::new();
        held.note_on(72);
        assert!(!held.note_off(71));
        assert_eq!(held.pitches(), &[72]);
    }
}
