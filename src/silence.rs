use crate::types::Tick;

/// Decides when a stretch of silence should flush the classifier.
///
/// The tracker arms when the held set goes from non-empty to empty and
/// disarms when it fires, so each silence episode flushes at most once.
#[derive(Debug, Clone)]
pub struct SilenceTracker {
    last_all_notes_off: Tick,
    window: Tick,
    armed: bool,
}

impl SilenceTracker {
    pub fn new(window: Tick) -> Self {
        Self {
            last_all_notes_off: 0,
            window,
            armed: false,
        }
    }

    /// The last held note was released at `now`.
    pub fn all_notes_off(&mut self, now: Tick) {
        self.last_all_notes_off = now;
        self.armed = true;
    }

    /// Returns true exactly once per episode, on the first tick where the
    /// held set is empty and more than `window` ticks have passed since it
    /// emptied.
    pub fn should_flush(&mut self, now: Tick, held_empty: bool) -> bool {
        if self.armed && held_empty && now.saturating_sub(self.last_all_notes_off) > self.window {
            self.armed = false;
            return true;
        }
        false
    }

    pub fn last_all_notes_off(&self) -> Tick {
        self.last_all_notes_off
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}
