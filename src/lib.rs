pub mod classifier;
pub mod config;
pub mod console_display;
pub mod coordinator;
pub mod held_notes;
pub mod history;
pub mod jsonl_reader;
pub mod midi_decode;
pub mod session;
pub mod silence;
pub mod simulator;
pub mod types;
