use crate::types::*;
use crossbeam_channel::Sender;
use log::{info, warn};
use std::thread;
use std::time::Duration;

/// Largest gap allowed between consecutive events (20 minutes of 20ms ticks).
/// Events further ahead than this are dropped from a replay.
pub const MAX_EVENT_GAP_TICKS: Tick = 60_000;

/// Plays scripted performances (or replayed recordings) into the pipeline
/// without any MIDI hardware.
///
/// The player is the session's clock: for every tick it first delivers the
/// note events due at that tick, then one [`InputEvent::Tick`], then sleeps
/// one tick period. Notes and ticks leave on the same channel, so the
/// coordinator sees them in a single well-defined order.
pub struct Simulator {
    tx: Sender<InputEvent>,
    tick_ms: u64,
    /// Extra silent ticks after the last event so pending runs get flushed
    pub tail_ticks: u64,
    /// Sleep between ticks. Off for replays that should run as fast as possible.
    pub realtime: bool,
}

impl Simulator {
    pub fn new(tx: Sender<InputEvent>, tick_ms: u64) -> Self {
        Self {
            tx,
            tick_ms,
            tail_ticks: 25,
            realtime: true,
        }
    }

    pub fn with_realtime(mut self, enabled: bool) -> Self {
        self.realtime = enabled;
        self
    }

    /// Run a named demo. Blocks the calling thread until it has played out.
    pub fn run(&self, demo: &str) {
        let moves = match demo {
            "basic" => basic_sequence(),
            "scales" => scales_sequence(),
            "improv" => improv_sequence(0x5EED, 120),
            other => {
                warn!("Unknown demo '{}', falling back to 'basic'", other);
                basic_sequence()
            }
        };
        info!("Simulator starting '{}' demo ({} moves)...", demo, moves.len());
        self.play(&compile(&moves));
    }

    /// Deliver `events` (sorted by tick) interleaved with display ticks.
    pub fn play(&self, events: &[NoteEvent]) {
        let events = plausible_events(events);
        let last = events.iter().map(|e| e.tick).max().unwrap_or(0);
        let end = last.saturating_add(self.tail_ticks);
        let mut pending = events.iter().peekable();

        for tick in 0..=end {
            while let Some(event) = pending.next_if(|e| e.tick <= tick) {
                if self.tx.send(InputEvent::Note(*event)).is_err() {
                    return;
                }
            }
            if self.tx.send(InputEvent::Tick).is_err() {
                return;
            }
            if self.realtime {
                thread::sleep(Duration::from_millis(self.tick_ms));
            }
        }
        info!("Simulator finished after {} ticks", end.saturating_add(1));
    }
}

/// Drop events that jump implausibly far past everything before them.
fn plausible_events(events: &[NoteEvent]) -> Vec<NoteEvent> {
    let mut kept = Vec::with_capacity(events.len());
    let mut horizon: Tick = 0;
    for event in events {
        if event.tick > horizon.saturating_add(MAX_EVENT_GAP_TICKS) {
            warn!(
                "Skipping {} at tick {}: {} ticks past the previous event",
                event, event.tick, event.tick - horizon
            );
            continue;
        }
        horizon = horizon.max(event.tick);
        kept.push(*event);
    }
    kept
}

// ─── Performance scripts ────────────────────────────────────────────────────

/// One step of a scripted performance. Durations are in ticks.
#[derive(Debug, Clone)]
pub enum Move {
    /// Silence
    Rest { ticks: u64 },
    /// A single note held for `ticks`, released, then the next move starts
    Play { pitch: u8, velocity: u8, ticks: u64 },
    /// Several notes struck together, pitches in the given order
    Chord { pitches: Vec<u8>, velocity: u8, ticks: u64 },
    /// Notes from `from` to `to` (either direction) every `step` semitones, legato
    Scale { from: u8, to: u8, step: u8, velocity: u8, ticks_each: u64 },
    /// The same pitch struck `count` times
    Repeat { pitch: u8, count: u32, velocity: u8, ticks_each: u64 },
}

/// Flatten a script into tick-stamped note events.
///
/// Inside a scale each note-on is sent before the previous note's
/// note-off, so the held set never empties mid-scale.
pub fn compile(moves: &[Move]) -> Vec<NoteEvent> {
    let mut events = Vec::new();
    let mut now: Tick = 0;

    for m in moves {
        match m {
            Move::Rest { ticks } => now += ticks,
            Move::Play { pitch, velocity, ticks } => {
                events.push(NoteEvent::on(now, *pitch, *velocity));
                now += (*ticks).max(1);
                events.push(NoteEvent::off(now, *pitch));
            }
            Move::Chord { pitches, velocity, ticks } => {
                for &p in pitches {
                    events.push(NoteEvent::on(now, p, *velocity));
                }
                now += (*ticks).max(1);
                for &p in pitches {
                    events.push(NoteEvent::off(now, p));
                }
            }
            Move::Scale { from, to, step, velocity, ticks_each } => {
                let step = (*step).max(1) as i16;
                let dir: i16 = if to >= from { 1 } else { -1 };
                let ticks_each = (*ticks_each).max(1);
                let mut pitch = *from as i16;
                let mut previous: Option<u8> = None;
                while (*to as i16 - pitch) * dir >= 0 {
                    let p = pitch as u8;
                    events.push(NoteEvent::on(now, p, *velocity));
                    if let Some(prev) = previous {
                        events.push(NoteEvent::off(now, prev));
                    }
                    previous = Some(p);
                    now += ticks_each;
                    pitch += step * dir;
                }
                if let Some(prev) = previous {
                    events.push(NoteEvent::off(now, prev));
                }
            }
            Move::Repeat { pitch, count, velocity, ticks_each } => {
                let ticks_each = (*ticks_each).max(1);
                for _ in 0..*count {
                    events.push(NoteEvent::on(now, *pitch, *velocity));
                    now += ticks_each;
                    events.push(NoteEvent::off(now, *pitch));
                }
            }
        }
    }
    events
}

/// A short tour: a rising line, a falling line, repeated notes, each
/// separated by enough silence to trigger a flush.
fn basic_sequence() -> Vec<Move> {
    vec![
        Move::Rest { ticks: 10 },
        // C major up an octave: 7 steps up, flushed by silence
        Move::Scale { from: 60, to: 72, step: 2, velocity: 90, ticks_each: 8 },
        Move::Rest { ticks: 20 },
        // Down a fifth chromatically, then turn back up
        Move::Scale { from: 67, to: 60, step: 1, velocity: 80, ticks_each: 6 },
        Move::Play { pitch: 64, velocity: 80, ticks: 10 },
        Move::Rest { ticks: 20 },
        // Soft repeated notes
        Move::Repeat { pitch: 69, count: 7, velocity: 40, ticks_each: 5 },
        Move::Rest { ticks: 20 },
        // A ghost note below the velocity threshold, then a chord
        Move::Play { pitch: 55, velocity: 3, ticks: 5 },
        Move::Chord { pitches: vec![48, 55, 64], velocity: 100, ticks: 30 },
        Move::Rest { ticks: 20 },
    ]
}

/// Up-and-down runs that reverse without pausing.
fn scales_sequence() -> Vec<Move> {
    let mut moves = vec![Move::Rest { ticks: 5 }];
    for (low, high) in [(48, 60), (55, 67), (60, 72)] {
        moves.push(Move::Scale { from: low, to: high, step: 1, velocity: 85, ticks_each: 4 });
        moves.push(Move::Scale { from: high - 1, to: low, step: 1, velocity: 85, ticks_each: 4 });
    }
    moves.push(Move::Rest { ticks: 20 });
    moves
}

/// Pseudo-random melodic walk, deterministic for a given seed.
fn improv_sequence(seed: u64, length: usize) -> Vec<Move> {
    let mut state = seed | 1;
    let mut next = move || {
        // xorshift64
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    let mut pitch: i16 = 64;
    let mut moves = Vec::with_capacity(length);
    for _ in 0..length {
        let r = next();
        let interval = (r % 7) as i16 - 3;
        pitch = (pitch + interval).clamp(36, 96);
        let velocity = 20 + (r >> 8) as u8 % 100;
        let ticks = 3 + (r >> 16) % 8;
        moves.push(Move::Play { pitch: pitch as u8, velocity, ticks });
        if (r >> 24) % 17 == 0 {
            moves.push(Move::Rest { ticks: 15 });
        }
    }
    moves.push(Move::Rest { ticks: 20 });
    moves
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_compile_scale_is_legato() {
        let events = compile(&[Move::Scale { from: 60, to: 64, step: 2, velocity: 90, ticks_each: 4 }]);
        let ons: Vec<u8> = events.iter().filter(|e| e.kind == NoteKind::On).map(|e| e.pitch).collect();
        assert_eq!(ons, vec![60, 62, 64]);
        // Second note-on comes before first note-off
        assert_eq!(events[1], NoteEvent::on(4, 62, 90));
        assert_eq!(events[2], NoteEvent::off(4, 60));
        assert_eq!(events.last(), Some(&NoteEvent::off(12, 64)));
    }

    #[test]
    fn test_compile_descending_scale() {
        let events = compile(&[Move::Scale { from: 64, to: 60, step: 1, velocity: 70, ticks_each: 2 }]);
        let ons: Vec<u8> = events.iter().filter(|e| e.kind == NoteKind::On).map(|e| e.pitch).collect();
        assert_eq!(ons, vec![64, 63, 62, 61, 60]);
    }

    #[test]
    fn test_compile_rest_and_repeat() {
        let events = compile(&[
            Move::Rest { ticks: 10 },
            Move::Repeat { pitch: 50, count: 2, velocity: 60, ticks_each: 3 },
        ]);
        assert_eq!(
            events,
            vec![
                NoteEvent::on(10, 50, 60),
                NoteEvent::off(13, 50),
                NoteEvent::on(13, 50, 60),
                NoteEvent::off(16, 50),
            ]
        );
    }

    #[test]
    fn test_improv_is_deterministic() {
        let a = compile(&improv_sequence(42, 30));
        let b = compile(&improv_sequence(42, 30));
        assert_eq!(a, b);
        assert!(a.iter().all(|e| e.pitch >= 36 && e.pitch <= 96));
    }

    #[test]
    fn test_play_interleaves_ticks() {
        let (tx, rx) = unbounded();
        let mut sim = Simulator::new(tx, 0).with_realtime(false);
        sim.tail_ticks = 2;
        sim.play(&[NoteEvent::on(0, 60, 90), NoteEvent::off(1, 60)]);
        drop(sim);
        let kinds: Vec<String> = rx
            .iter()
            .map(|e| match e {
                InputEvent::Note(n) => format!("{:?}", n.kind),
                InputEvent::Tick => "T".to_string(),
            })
            .collect();
        assert_eq!(kinds, vec!["On", "T", "Off", "T", "T", "T"]);
    }

    #[test]
    fn test_play_far_future_tick_does_not_overflow() {
        let (tx, rx) = unbounded();
        let mut sim = Simulator::new(tx, 0).with_realtime(false);
        sim.tail_ticks = 2;
        sim.play(&[NoteEvent::on(u64::MAX, 60, 90)]);
        drop(sim);
        let out: Vec<InputEvent> = rx.iter().collect();
        assert_eq!(out.len(), 3, "event skipped, only the tail ticks remain");
        assert!(out.iter().all(|e| matches!(e, InputEvent::Tick)));
    }

    #[test]
    fn test_play_skips_implausible_jump() {
        let (tx, rx) = unbounded();
        let mut sim = Simulator::new(tx, 0).with_realtime(false);
        sim.tail_ticks = 0;
        sim.play(&[
            NoteEvent::on(10, 60, 90),
            NoteEvent::on(10 + MAX_EVENT_GAP_TICKS + 1, 62, 90),
            NoteEvent::off(20, 60),
        ]);
        drop(sim);
        let out: Vec<InputEvent> = rx.iter().collect();
        let notes: Vec<NoteEvent> = out
            .iter()
            .filter_map(|e| match e {
                InputEvent::Note(n) => Some(*n),
                InputEvent::Tick => None,
            })
            .collect();
        assert_eq!(notes, vec![NoteEvent::on(10, 60, 90), NoteEvent::off(20, 60)]);
        assert_eq!(out.len() - notes.len(), 21, "ticks 0..=20");
    }
}
