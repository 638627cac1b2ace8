// Audio module - best-effort measurement cue playback

pub mod cue;

pub use cue::{Cue, LogToneSink, ToneSink};
