//! Audio Module
//!
//! In-memory WAV decoding, conversion to the output device layout, the cpal
//! output and the playback session built on top of them.

pub mod wav;
pub mod converter;
pub mod output;
pub mod player;

pub use wav::{DecodedAudio, AudioFormat, AudioHeader};
pub use converter::AudioConverter;
pub use output::{AudioSink, CpalOutput, SinkStatus};
pub use player::{Player, PlaybackEvent, PlaybackSession, SessionState};
