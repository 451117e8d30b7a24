use crate::types::*;
use log::{debug, trace};
use std::cmp::Ordering;

/// Pitch movement from one note-on to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Rising,
    Falling,
    Level,
}

impl Step {
    pub fn between(previous: u8, pitch: u8) -> Self {
        match pitch.cmp(&previous) {
            Ordering::Greater => Step::Rising,
            Ordering::Less => Step::Falling,
            Ordering::Equal => Step::Level,
        }
    }
}

/// Run-length state machine over successive note-on pitches.
///
/// # Transition rules
///
/// | step    | effect                                                        |
/// |---------|---------------------------------------------------------------|
/// | Rising  | report the down run if long enough, clear down and same, up += 1 |
/// | Falling | report the up run if long enough, clear up and same, down += 1   |
/// | Level   | same += 1, up and down untouched                              |
///
/// The run being reported is measured before the reversing note is counted,
/// so a run's length is the number of steps that belonged to it. The
/// reversing note becomes step 1 of the new run. A level run is never
/// reported on a direction change, only by [`flush`](Self::flush).
#[derive(Debug, Clone)]
pub struct GestureClassifier {
    run: RunState,
    /// A run must be strictly longer than this to be reported
    threshold: u32,
}

impl GestureClassifier {
    pub fn new(threshold: u32) -> Self {
        Self {
            run: RunState::default(),
            threshold,
        }
    }

    pub fn run(&self) -> RunState {
        self.run
    }

    /// Feed one note-on. `previous` is the pitch buffered before this one;
    /// None establishes the baseline without changing any run.
    pub fn observe(&mut self, previous: Option<u8>, pitch: u8) -> Option<Classification> {
        let Some(previous) = previous else {
            trace!("Baseline pitch {}", pitch);
            return None;
        };

        let step = Step::between(previous, pitch);
        let reported = match step {
            Step::Rising => {
                let ended = self.end_run(GestureKind::Down);
                self.run.same = 0;
                self.run.up += 1;
                ended
            }
            Step::Falling => {
                let ended = self.end_run(GestureKind::Up);
                self.run.same = 0;
                self.run.down += 1;
                ended
            }
            Step::Level => {
                self.run.same += 1;
                None
            }
        };

        trace!("{} -> {} {:?} run={:?}", previous, pitch, step, self.run);
        if let Some(c) = reported {
            debug!("Gesture {} at reversal", c);
        }
        reported
    }

    /// Force out any run longer than the threshold (down, up, same order),
    /// then clear all runs.
    pub fn flush(&mut self) -> Vec<Classification> {
        let mut out = Vec::new();
        for (kind, length) in [
            (GestureKind::Down, self.run.down),
            (GestureKind::Up, self.run.up),
            (GestureKind::Same, self.run.same),
        ] {
            if length > self.threshold {
                let c = Classification { kind, run_length: length, origin: Origin::Silence };
                debug!("Gesture {} at silence", c);
                out.push(c);
            }
        }
        self.run = RunState::default();
        out
    }

    /// Zero the run of `kind`, returning it as a classification if it qualified.
    fn end_run(&mut self, kind: GestureKind) -> Option<Classification> {
        let slot = match kind {
            GestureKind::Up => &mut self.run.up,
            GestureKind::Down => &mut self.run.down,
            GestureKind::Same => &mut self.run.same,
        };
        let length = std::mem::take(slot);
        (length > self.threshold).then_some(Classification {
            kind,
            run_length: length,
            origin: Origin::Transition,
        })
    }
}
