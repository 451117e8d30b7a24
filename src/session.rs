use crate::classifier::GestureClassifier;
use crate::config::GestureConfig;
use crate::held_notes::HeldNoteSet;
use crate::history::HistoryBuffer;
use crate::silence::SilenceTracker;
use crate::types::*;
use log::{trace, warn};

/// One recognition session: held notes, pitch history, run-length state and
/// the silence clock for a single merged input stream.
///
/// Calls must be serialized by the host. Nothing here locks, blocks or
/// fails: malformed input is ignored or clamped. One instance per input
/// device; instances share nothing.
pub struct GestureSession {
    held: HeldNoteSet,
    history: HistoryBuffer,
    classifier: GestureClassifier,
    silence: SilenceTracker,
    tick: Tick,
    velocity_threshold: u8,
    latest: Option<Classification>,
    last_note: Option<(u8, u8)>,
}

impl GestureSession {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            held: HeldNoteSet::new(),
            history: HistoryBuffer::new(config.buffer_capacity),
            classifier: GestureClassifier::new(config.run_length_threshold),
            silence: SilenceTracker::new(config.silence_window_ticks),
            tick: 0,
            velocity_threshold: config.velocity_threshold,
            latest: None,
            last_note: None,
        }
    }

    /// Note-on from the event source. Velocity 0 is a note-off.
    /// Returns the classification this note produced, if any.
    pub fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) -> Option<Classification> {
        if velocity == 0 {
            self.note_off(channel, pitch);
            return None;
        }
        if pitch > MAX_MIDI_VALUE {
            warn!("Ignoring note-on with out-of-range pitch {}", pitch);
            return None;
        }
        let velocity = velocity.min(MAX_MIDI_VALUE);

        self.held.note_on(pitch);
        self.last_note = Some((pitch, velocity));

        let previous = self.history.append(pitch);
        let reported = self.classifier.observe(previous, pitch);
        if let Some(c) = reported {
            self.latest = Some(c);
        }
        trace!("ch{} on {} held={:?}", channel, pitch_name(pitch), self.held.pitches());
        reported
    }

    pub fn note_off(&mut self, channel: u8, pitch: u8) {
        if pitch > MAX_MIDI_VALUE {
            warn!("Ignoring note-off with out-of-range pitch {}", pitch);
            return;
        }
        if self.held.note_off(pitch) {
            self.silence.all_notes_off(self.tick);
        }
        trace!("ch{} off {} held={:?}", channel, pitch_name(pitch), self.held.pitches());
    }

    /// Dispatch a normalized event.
    pub fn handle(&mut self, event: &NoteEvent) -> Option<Classification> {
        match event.kind {
            NoteKind::On => self.note_on(event.channel, event.pitch, event.velocity),
            NoteKind::Off => {
                self.note_off(event.channel, event.pitch);
                None
            }
        }
    }

    /// Advance the clock by one display-loop period and flush if the
    /// silence window has just been exceeded.
    pub fn tick(&mut self) -> Vec<Classification> {
        self.tick += 1;
        if !self.silence.should_flush(self.tick, self.held.is_empty()) {
            return Vec::new();
        }
        let flushed = self.classifier.flush();
        if let Some(&c) = flushed.last() {
            self.latest = Some(c);
        }
        flushed
    }

    /// Latest classification, consumed: a second call returns None until
    /// something new is emitted.
    pub fn take_classification(&mut self) -> Option<Classification> {
        self.latest.take()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            tick: self.tick,
            held: self.held.pitches().to_vec(),
            run: self.classifier.run(),
            latest: self.latest,
            last_note: self.last_note,
            last_note_audible: self
                .last_note
                .is_some_and(|(_, velocity)| velocity >= self.velocity_threshold),
        }
    }

    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    pub fn held_pitches(&self) -> &[u8] {
        self.held.pitches()
    }

    pub fn run_state(&self) -> RunState {
        self.classifier.run()
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GestureSession {
        GestureSession::new(&GestureConfig::default())
    }

    /// Press and release each pitch in turn, one tick apart.
    fn play(s: &mut GestureSession, pitches: &[u8]) -> Vec<Classification> {
        let mut out = Vec::new();
        for &p in pitches {
            out.extend(s.note_on(0, p, 100));
            s.note_off(0, p);
            out.extend(s.tick());
        }
        out
    }

    #[test]
    fn test_velocity_zero_is_note_off() {
        let mut s = session();
        s.note_on(0, 60, 90);
        assert_eq!(s.held_pitches(), &[60]);
        assert_eq!(s.note_on(0, 60, 0), None);
        assert!(s.held_pitches().is_empty());
        assert_eq!(s.history().len(), 1, "velocity-0 note-on is not recorded");
    }

    #[test]
    fn test_stray_note_off_twice() {
        let mut s = session();
        s.note_on(0, 60, 80);
        s.note_off(0, 60);
        assert!(s.held_pitches().is_empty());
        s.note_off(0, 60);
        assert!(s.held_pitches().is_empty());
    }

    #[test]
    fn test_out_of_range_pitch_ignored() {
        let mut s = session();
        assert_eq!(s.note_on(0, 200, 80), None);
        s.note_off(0, 200);
        assert!(s.held_pitches().is_empty());
        assert!(s.history().is_empty());
    }

    #[test]
    fn test_silence_flush_once() {
        let mut s = session();
        // 7 rising notes: up run of 6
        let out = play(&mut s, &[60, 62, 64, 65, 67, 69, 71]);
        assert!(out.is_empty(), "flush must wait for the silence window");
        assert_eq!(s.run_state(), RunState { up: 6, down: 0, same: 0 });

        let mut flushed = Vec::new();
        for _ in 0..11 {
            flushed.extend(s.tick());
        }
        assert_eq!(
            flushed,
            vec![Classification { kind: GestureKind::Up, run_length: 6, origin: Origin::Silence }]
        );
        assert!(s.run_state().is_idle());

        for _ in 0..50 {
            assert!(s.tick().is_empty(), "no re-emission while still silent");
        }
    }

    #[test]
    fn test_flush_waits_for_window_boundary() {
        let mut s = session();
        play(&mut s, &[60, 62, 64, 65, 67, 69]);
        let released_at = s.current_tick() - 1;
        // Ticks up to released_at + 10 must not flush
        while s.current_tick() < released_at + 10 {
            assert!(s.tick().is_empty());
        }
        let out = s.tick();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].run_length, 5);
    }

    #[test]
    fn test_take_classification_since_last_read() {
        let mut s = session();
        play(&mut s, &[70, 69, 68, 67, 66, 65]);
        let c = s.note_on(0, 66, 100);
        assert_eq!(c.map(|c| (c.kind, c.run_length)), Some((GestureKind::Down, 5)));
        assert_eq!(s.snapshot().latest, c);
        assert_eq!(s.take_classification(), c);
        assert_eq!(s.take_classification(), None);
        assert_eq!(s.snapshot().latest, None);
    }

    #[test]
    fn test_snapshot_velocity_threshold_display() {
        let mut s = session();
        s.note_on(3, 64, 4);
        let snap = s.snapshot();
        assert_eq!(snap.last_note, Some((64, 4)));
        assert!(!snap.last_note_audible);
        assert_eq!(snap.last_note_name(), "E4");
        s.note_on(3, 65, 5);
        assert!(s.snapshot().last_note_audible);
        assert_eq!(s.snapshot().held, vec![64, 65]);
    }

    #[test]
    fn test_independent_sessions() {
        let mut a = session();
        let mut b = session();
        play(&mut a, &[60, 61, 62]);
        play(&mut b, &[60, 59]);
        assert_eq!(a.run_state().up, 2);
        assert_eq!(b.run_state(), RunState { up: 0, down: 1, same: 0 });
    }
}
