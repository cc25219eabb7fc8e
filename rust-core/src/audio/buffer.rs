//! Sample handoff between capture and analysis
//!
//! A single-producer, single-consumer ring of mono `f32` samples. The capture
//! callback owns the producer end and never blocks; the analysis side pulls
//! whole frames through `FrameReader`.

use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

/// Ring of mono samples, split once into its two ends
pub struct AudioRingBuffer {
    rb: HeapRb<f32>,
}

impl AudioRingBuffer {
    /// # Arguments
    /// * `capacity` - Samples the ring holds before the producer starts dropping
    pub fn new(capacity: usize) -> Self {
        Self {
            rb: HeapRb::new(capacity),
        }
    }

    pub fn split(self) -> (AudioProducer, AudioConsumer) {
        let (producer, consumer) = self.rb.split();
        (
            AudioProducer {
                inner: producer,
                dropped: 0,
            },
            AudioConsumer { inner: consumer },
        )
    }
}

/// Writing end, owned by the capture callback
pub struct AudioProducer {
    inner: HeapProducer<f32>,
    dropped: u64,
}

impl AudioProducer {
    /// Queue as many of `samples` as fit
    ///
    /// Samples that do not fit are discarded and counted; the first overflow
    /// is logged once.
    pub fn write(&mut self, samples: &[f32]) -> usize {
        let accepted = self.inner.push_slice(samples);
        let overflow = (samples.len() - accepted) as u64;
        if overflow > 0 {
            if self.dropped == 0 {
                log::warn!("sample ring full, dropping input; analysis is falling behind");
            }
            self.dropped += overflow;
        }
        accepted
    }

    /// Room left before the next write starts dropping
    pub fn free_len(&self) -> usize {
        self.inner.free_len()
    }

    /// Samples discarded so far because the ring was full
    pub fn dropped_samples(&self) -> u64 {
        self.dropped
    }
}

/// Reading end, owned by the analysis side
pub struct AudioConsumer {
    inner: HeapConsumer<f32>,
}

impl AudioConsumer {
    /// Move up to `buffer.len()` queued samples into `buffer`
    pub fn read(&mut self, buffer: &mut [f32]) -> usize {
        self.inner.pop_slice(buffer)
    }

    /// Samples currently queued
    pub fn available(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Pulls fixed-size analysis frames off the consumer end
///
/// Counts consumed samples so each frame carries its position in the stream.
pub struct FrameReader {
    consumer: AudioConsumer,
    frame_size: usize,
    sample_rate: f32,
    samples_read: u64,
}

impl std::fmt::Debug for FrameReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameReader")
            .field("frame_size", &self.frame_size)
            .field("sample_rate", &self.sample_rate)
            .field("samples_read", &self.samples_read)
            .field("queued", &self.consumer.available())
            .finish()
    }
}

impl FrameReader {
    pub fn new(consumer: AudioConsumer, frame_size: usize, sample_rate: f32) -> Self {
        Self {
            consumer,
            frame_size,
            sample_rate,
            samples_read: 0,
        }
    }

    /// Pop one complete frame into `frame`
    ///
    /// # Returns
    /// Stream time of the frame's first sample in seconds, or `None` (nothing
    /// consumed) while fewer than `frame_size` samples are queued.
    pub fn next_frame(&mut self, frame: &mut [f32]) -> Option<f64> {
        debug_assert_eq!(frame.len(), self.frame_size);

        if self.consumer.available() < self.frame_size {
            return None;
        }

        let timestamp = self.samples_read as f64 / self.sample_rate as f64;
        let read = self.consumer.read(&mut frame[..self.frame_size]);
        self.samples_read += read as u64;
        Some(timestamp)
    }

    /// Whole frames waiting in the ring
    pub fn frames_pending(&self) -> usize {
        self.consumer.available() / self.frame_size
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Samples consumed so far
    pub fn samples_read(&self) -> u64 {
        self.samples_read
    }
}
