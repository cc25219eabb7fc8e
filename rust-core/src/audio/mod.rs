//! Audio plumbing around the analyzer: sample handoff, sources and the
//! processing thread

pub mod buffer;
pub mod tone;
pub mod processor;
#[cfg(feature = "capture")]
pub mod input;

pub use buffer::{AudioRingBuffer, AudioProducer, AudioConsumer, FrameReader};
pub use tone::ToneGenerator;
pub use processor::{SpectrumProcessor, ProcessorError, StartError};
#[cfg(feature = "capture")]
pub use input::{AudioInput, AudioError, default_input_sample_rate, list_input_devices};
