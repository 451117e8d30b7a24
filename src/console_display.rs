use crate::types::*;
use crossbeam_channel::Receiver;
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Columns between the left and right box edges.
const INNER_WIDTH: usize = 70;

/// Width of the held-note scope row; each column covers two pitches.
const SCOPE_WIDTH: usize = 64;

/// Renders a live ASCII dashboard of the recognizer state.
pub struct ConsoleDisplay {
    rx: Receiver<GestureReport>,
    update_hz: u32,
    velocity_threshold: u8,
    run_threshold: u32,
}

impl ConsoleDisplay {
    pub fn new(rx: Receiver<GestureReport>, update_hz: u32) -> Self {
        Self {
            rx,
            update_hz,
            velocity_threshold: 5,
            run_threshold: 4,
        }
    }

    pub fn with_thresholds(mut self, velocity: u8, run_length: u32) -> Self {
        self.velocity_threshold = velocity;
        self.run_threshold = run_length;
        self
    }

    pub fn run(&self) {
        let period = if self.update_hz == 0 {
            Duration::from_millis(50)
        } else {
            Duration::from_millis((1000 / self.update_hz).max(1) as u64)
        };
        let mut last_draw: Option<Instant> = None;
        let mut last_gesture: Option<Classification> = None;
        let mut stdout = io::stdout();

        for report in self.rx.iter() {
            if let Some(c) = report.snapshot.latest {
                last_gesture = Some(c);
            }
            let due = last_draw.map_or(true, |t| t.elapsed() >= period);
            if !due && report.emitted.is_empty() {
                continue;
            }
            last_draw = Some(Instant::now());

            let snap = &report.snapshot;

            // Clear screen and move cursor home
            print!("\x1b[2J\x1b[H");

            println!("╔{}╗", "═".repeat(INNER_WIDTH));
            println!("{}", row("  GESTURE CAPTURE — Live Monitor"));
            println!("╠{}╣", "═".repeat(INNER_WIDTH));
            println!("{}", row(&format!("  Tick: {:<10}  Velocity threshold: {}",
                snap.tick, self.velocity_threshold)));

            let note = match snap.last_note {
                Some((_, vel)) if !snap.last_note_audible => {
                    format!("{} (ghost, vel {})", snap.last_note_name(), vel)
                }
                Some((_, vel)) => format!("{} (vel {})", snap.last_note_name(), vel),
                None => "none".to_string(),
            };
            println!("{}", row(&format!("  This note: {}", note)));

            println!("{}", row(""));
            println!("{}", row("  Runs:"));
            for (label, len) in [("up", snap.run.up), ("down", snap.run.down), ("same", snap.run.same)] {
                println!("{}", row(&format!("    {:>4}: {} {}",
                    label, run_bar(len, self.run_threshold, 20), len)));
            }

            println!("{}", row(""));
            let detected = match last_gesture {
                Some(c) => c.to_string(),
                None => "---".to_string(),
            };
            println!("{}", row(&format!("  Detected: {}", detected)));

            println!("{}", row(""));
            let held: Vec<String> = snap.held.iter().map(|&p| pitch_name(p)).collect();
            println!("{}", row(&format!("  Held: {}", held.join(" "))));
            println!("{}", row(&format!("  [{}]", scope_row(&snap.held))));

            println!("╚{}╝", "═".repeat(INNER_WIDTH));
            let _ = stdout.flush();
        }
    }
}

/// One boxed dashboard line, truncated or space-padded to the box width.
fn row(content: &str) -> String {
    let mut line: String = content.chars().take(INNER_WIDTH).collect();
    let pad = INNER_WIDTH - line.chars().count();
    line.extend(std::iter::repeat(' ').take(pad));
    format!("║{}║", line)
}

/// Bar filled up to `len`, with a `|` marking the reporting threshold.
fn run_bar(len: u32, threshold: u32, width: usize) -> String {
    let filled = (len as usize).min(width);
    let mark = threshold as usize + 1;
    let mut bar = String::with_capacity(width * 3 + 2);
    bar.push('[');
    for i in 1..=width {
        if i == mark && i > filled {
            bar.push('|');
        } else if i <= filled {
            bar.push('█');
        } else {
            bar.push('░');
        }
    }
    bar.push(']');
    bar
}

/// One column per two pitches, `●` where any held pitch falls.
fn scope_row(held: &[u8]) -> String {
    let mut cols = vec!['·'; SCOPE_WIDTH];
    for &p in held {
        let col = (p as usize / 2).min(SCOPE_WIDTH - 1);
        cols[col] = '●';
    }
    cols.into_iter().collect()
}
