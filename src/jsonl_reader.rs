//! JSONL session reader — parses recorded note streams back into NoteEvents.
//!
//! Reads the header line (format, tick period) then yields events one at a
//! time. Each event line is either a normalized note event
//! (`{"kind":"On","pitch":60,"velocity":90,"tick":12}`) or raw MIDI bytes
//! with a tick (`{"tick":12,"midi":[144,60,90]}`). Raw lines that are not
//! note messages are skipped. Works with any `BufRead`: files, in-memory
//! buffers, stdin.

use crate::midi_decode;
use crate::types::{NoteEvent, Tick};
use serde::Deserialize;
use std::io::BufRead;

pub const FORMAT: &str = "gesture-capture";

/// Parsed JSONL header (first line of a session file).
#[derive(Debug)]
pub struct SessionHeader {
    pub format: String,
    /// Tick period the session was recorded at, if stated
    pub tick_ms: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EventLine {
    Note(NoteEvent),
    Raw { tick: Tick, midi: Vec<u8> },
}

/// Line-by-line JSONL session reader.
pub struct SessionReader<R: BufRead> {
    reader: R,
    pub header: SessionHeader,
    line_buf: String,
}

impl<R: BufRead> SessionReader<R> {
    /// Read and validate the header line. Returns an error if the header
    /// is missing, unparseable, or lacks a `"format": "gesture-capture"` field.
    pub fn open(mut reader: R) -> Result<Self, String> {
        let mut first_line = String::new();
        reader
            .read_line(&mut first_line)
            .map_err(|e| format!("read header: {}", e))?;

        let first_line = first_line.trim();
        if first_line.is_empty() {
            return Err("empty file".into());
        }

        let raw: serde_json::Value =
            serde_json::from_str(first_line).map_err(|e| format!("parse header: {}", e))?;

        let format = raw["format"]
            .as_str()
            .ok_or("missing \"format\" field")?
            .to_string();
        if format != FORMAT {
            return Err(format!("unknown format: {}", format));
        }

        let tick_ms = raw["tick_ms"].as_u64();

        Ok(Self {
            reader,
            header: SessionHeader { format, tick_ms },
            line_buf: String::new(),
        })
    }

    /// Read the next event. Returns `None` at EOF, `Err` for unparseable lines.
    pub fn next_event(&mut self) -> Option<Result<NoteEvent, String>> {
        loop {
            self.line_buf.clear();
            match self.reader.read_line(&mut self.line_buf) {
                Ok(0) => return None, // EOF
                Ok(_) => {
                    let trimmed = self.line_buf.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<EventLine>(trimmed) {
                        Ok(EventLine::Note(event)) => return Some(Ok(event)),
                        Ok(EventLine::Raw { tick, midi }) => match midi_decode::decode(&midi, tick) {
                            Some(event) => return Some(Ok(event)),
                            None => continue, // not a note message
                        },
                        Err(e) => return Some(Err(format!("parse event: {}", e))),
                    }
                }
                Err(e) => return Some(Err(format!("read line: {}", e))),
            }
        }
    }

    /// Read all remaining events, skipping malformed lines.
    pub fn read_all(mut self) -> Vec<NoteEvent> {
        let mut events = Vec::new();
        while let Some(result) = self.next_event() {
            if let Ok(event) = result {
                events.push(event);
            }
        }
        events
    }
}
