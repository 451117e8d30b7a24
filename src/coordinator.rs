use crate::config::GestureConfig;
use crate::session::GestureSession;
use crate::types::*;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, info, trace};

/// The coordinator owns a [`GestureSession`] and is the only thread that
/// touches it. Note events and display ticks arrive on one channel, so the
/// session sees them strictly one at a time in arrival order.
///
/// After every input it sends a [`GestureReport`] (snapshot plus anything
/// emitted) to each downstream consumer. With `report_every_tick` off, ticks
/// that emit nothing are not reported.
pub struct Coordinator {
    input_rx: Receiver<InputEvent>,
    report_txs: Vec<Sender<GestureReport>>,
    session: GestureSession,
    pub report_every_tick: bool,
}

impl Coordinator {
    pub fn new(
        input_rx: Receiver<InputEvent>,
        report_txs: Vec<Sender<GestureReport>>,
        config: &GestureConfig,
    ) -> Self {
        Self {
            input_rx,
            report_txs,
            session: GestureSession::new(config),
            report_every_tick: true,
        }
    }

    pub fn with_report_every_tick(mut self, enabled: bool) -> Self {
        self.report_every_tick = enabled;
        self
    }

    pub fn run(&mut self) {
        info!("Coordinator running");

        let mut note_count: u64 = 0;
        let mut gesture_count: u64 = 0;

        for event in self.input_rx.iter() {
            let emitted = match event {
                InputEvent::Note(note) => {
                    trace!("{}", note);
                    note_count += 1;
                    self.session.handle(&note).into_iter().collect::<Vec<_>>()
                }
                InputEvent::Tick => {
                    let flushed = self.session.tick();
                    let tick = self.session.current_tick();
                    if tick % 500 == 0 {
                        debug!("Coordinator: tick {}, {} notes, {} gestures", tick, note_count, gesture_count);
                    }
                    if flushed.is_empty() && !self.report_every_tick {
                        continue;
                    }
                    flushed
                }
            };

            gesture_count += emitted.len() as u64;
            let report = GestureReport {
                snapshot: self.session.snapshot(),
                emitted,
            };
            // Each report carries what was classified since the previous one
            self.session.take_classification();
            for tx in &self.report_txs {
                let _ = tx.send(report.clone());
            }
        }

        info!(
            "Coordinator shutting down after {} notes, {} gestures",
            note_count, gesture_count
        );
    }
}
