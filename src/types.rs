use serde::{Deserialize, Serialize};
use std::fmt;

/// Host display-loop ticks since session start.
pub type Tick = u64;

/// Highest valid MIDI pitch / velocity.
pub const MAX_MIDI_VALUE: u8 = 127;

// ─── Note events ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NoteKind {
    On,
    Off,
}

/// A normalized note event as delivered by an event source.
/// Note-on with velocity 0 has already been turned into `Off` by the adapter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoteEvent {
    pub kind: NoteKind,
    /// 0–127, middle C = 60
    pub pitch: u8,
    /// 0–127, meaningful for `On` only
    #[serde(default)]
    pub velocity: u8,
    /// Tick at which the event is due
    #[serde(default)]
    pub tick: Tick,
    /// MIDI channel 0–15. Accepted but not used for classification.
    #[serde(default)]
    pub channel: u8,
}

impl NoteEvent {
    pub fn on(tick: Tick, pitch: u8, velocity: u8) -> Self {
        Self { kind: NoteKind::On, pitch, velocity, tick, channel: 0 }
    }

    pub fn off(tick: Tick, pitch: u8) -> Self {
        Self { kind: NoteKind::Off, pitch, velocity: 0, tick, channel: 0 }
    }
}

impl fmt::Display for NoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NoteKind::On => write!(
                f,
                "t={:>6}  ch{:<2} ON  {:<4} vel={}",
                self.tick, self.channel, pitch_name(self.pitch), self.velocity
            ),
            NoteKind::Off => write!(
                f,
                "t={:>6}  ch{:<2} OFF {:<4}",
                self.tick, self.channel, pitch_name(self.pitch)
            ),
        }
    }
}

// ─── Classifications ────────────────────────────────────────────────────────

/// Direction of a recognized run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GestureKind {
    Up,
    Down,
    Same,
}

impl GestureKind {
    pub fn label(&self) -> &'static str {
        match self {
            GestureKind::Up => "up",
            GestureKind::Down => "down",
            GestureKind::Same => "same",
        }
    }
}

/// What caused a classification to be emitted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Origin {
    /// A note-on reversed direction and ended the previous run
    Transition,
    /// The held set stayed empty for longer than the silence window
    Silence,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Classification {
    pub kind: GestureKind,
    /// Number of same-direction steps in the run. The note that ended the
    /// run is not counted.
    pub run_length: u32,
    pub origin: Origin,
}

impl fmt::Display for Classification {
    /// Lower-case for direction changes, upper-case for silence flushes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin {
            Origin::Transition => write!(f, "{}{}", self.kind.label(), self.run_length),
            Origin::Silence => write!(
                f,
                "{}{}",
                self.kind.label().to_uppercase(),
                self.run_length
            ),
        }
    }
}

// ─── Run state ──────────────────────────────────────────────────────────────

/// In-progress run lengths. At most one of them grows per note-on.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunState {
    pub up: u32,
    pub down: u32,
    pub same: u32,
}

impl RunState {
    pub fn is_idle(&self) -> bool {
        self.up == 0 && self.down == 0 && self.same == 0
    }
}

// ─── Presenter snapshot ─────────────────────────────────────────────────────

/// Read-only view of a session, polled by presenters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    pub tick: Tick,
    /// Held pitches in press order
    pub held: Vec<u8>,
    pub run: RunState,
    /// Latest classification emitted since the previous read, if any
    pub latest: Option<Classification>,
    /// Pitch and velocity of the most recent note-on
    pub last_note: Option<(u8, u8)>,
    /// True if the most recent note-on reached the velocity threshold
    pub last_note_audible: bool,
}

impl SessionSnapshot {
    pub fn last_note_name(&self) -> String {
        match self.last_note {
            Some((pitch, _)) => pitch_name(pitch),
            None => "none".to_string(),
        }
    }
}

/// Pipeline output: the session state after one input, plus anything it emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureReport {
    pub snapshot: SessionSnapshot,
    pub emitted: Vec<Classification>,
}

// ─── Inter-thread messages ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum InputEvent {
    Note(NoteEvent),
    /// One period of the host display loop has elapsed
    Tick,
}

// ─── Pitch names ────────────────────────────────────────────────────────────

pub const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B",
];

/// Pitch class + octave, middle C (60) = "C4".
pub fn pitch_name(pitch: u8) -> String {
    let octave = (pitch / 12) as i32 - 1;
    format!("{}{}", PITCH_CLASS_NAMES[(pitch % 12) as usize], octave)
}
