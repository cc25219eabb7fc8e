//! Background spectrum processor
//!
//! Drains fixed-size frames from the ring buffer on a dedicated thread, runs
//! them through the analyzer and publishes the most recent result. The
//! analyzer is owned by the thread while running, so no lock guards it.

use super::buffer::FrameReader;
use crate::spectrum::{SpectrumAnalyzer, SpectrumFrame};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use thiserror::Error;

/// Idle wait when no full frame is queued
const POLL_INTERVAL: Duration = Duration::from_micros(100);

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Processor is already running")]
    AlreadyRunning,

    #[error("Frame reader delivers {reader} samples but the analyzer expects {analyzer}")]
    FrameSizeMismatch { reader: usize, analyzer: usize },

    #[error("Analyzer was lost when the processing thread panicked")]
    AnalyzerLost,

    #[error("Failed to spawn processing thread: {0}")]
    Spawn(String),
}

/// A refused `start`, carrying the frame source back to the caller
#[derive(Error, Debug)]
#[error("{kind}")]
pub struct StartError {
    kind: ProcessorError,

    /// `None` only when the thread failed to spawn
    reader: Option<FrameReader>,
}

impl StartError {
    fn new(kind: ProcessorError, reader: FrameReader) -> Self {
        Self {
            kind,
            reader: Some(reader),
        }
    }

    pub fn kind(&self) -> &ProcessorError {
        &self.kind
    }

    pub fn into_kind(self) -> ProcessorError {
        self.kind
    }

    /// Recover the reader, still attached to its ring buffer
    pub fn into_reader(self) -> Option<FrameReader> {
        self.reader
    }
}

/// Spectrum processor running the analysis loop off the capture thread
pub struct SpectrumProcessor {
    /// Analyzer, present while stopped
    analyzer: Option<SpectrumAnalyzer>,

    /// Latest analyzed frame, replaced on every frame
    latest: Arc<Mutex<Option<SpectrumFrame>>>,

    /// Frames analyzed since creation
    frames_processed: Arc<AtomicU64>,

    /// Frames rejected by the analyzer
    frames_failed: Arc<AtomicU64>,

    /// Running flag
    running: Arc<AtomicBool>,

    /// Processing thread; hands the analyzer back when joined
    process_thread: Option<JoinHandle<SpectrumAnalyzer>>,
}

impl SpectrumProcessor {
    pub fn new(analyzer: SpectrumAnalyzer) -> Self {
        Self {
            analyzer: Some(analyzer),
            latest: Arc::new(Mutex::new(None)),
            frames_processed: Arc::new(AtomicU64::new(0)),
            frames_failed: Arc::new(AtomicU64::new(0)),
            running: Arc::new(AtomicBool::new(false)),
            process_thread: None,
        }
    }

    /// Start the processing thread
    ///
    /// # Arguments
    /// * `reader` - Frame source; its frame size must match the analyzer's FFT size
    ///
    /// A refused start hands `reader` back through `StartError::into_reader`.
    pub fn start(&mut self, mut reader: FrameReader) -> Result<(), StartError> {
        if self.process_thread.is_some() {
            return Err(StartError::new(ProcessorError::AlreadyRunning, reader));
        }

        let Some(mut analyzer) = self.analyzer.take() else {
            return Err(StartError::new(ProcessorError::AnalyzerLost, reader));
        };
        let fft_size = analyzer.config().fft_size;
        if reader.frame_size() != fft_size {
            self.analyzer = Some(analyzer);
            let kind = ProcessorError::FrameSizeMismatch {
                reader: reader.frame_size(),
                analyzer: fft_size,
            };
            return Err(StartError::new(kind, reader));
        }

        self.running.store(true, Ordering::SeqCst);

        let latest = Arc::clone(&self.latest);
        let frames_processed = Arc::clone(&self.frames_processed);
        let frames_failed = Arc::clone(&self.frames_failed);
        let running = Arc::clone(&self.running);

        log::info!(
            "starting spectrum processor: fft_size={} bands={}",
            fft_size,
            analyzer.num_bands()
        );

        let spawned = std::thread::Builder::new()
            .name("spectrum-processor".into())
            .spawn(move || {
                let mut frame = vec![0.0; fft_size];

                while running.load(Ordering::SeqCst) {
                    let Some(timestamp) = reader.next_frame(&mut frame) else {
                        std::thread::sleep(POLL_INTERVAL);
                        continue;
                    };

                    match analyzer.analyze(&frame, timestamp) {
                        Ok(result) => {
                            if let Ok(mut guard) = latest.lock() {
                                *guard = Some(result);
                            }
                            frames_processed.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) => {
                            log::error!("dropping frame at {:.3}s: {}", timestamp, e);
                            frames_failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }

                analyzer
            });

        match spawned {
            Ok(handle) => {
                self.process_thread = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                Err(StartError {
                    kind: ProcessorError::Spawn(e.to_string()),
                    reader: None,
                })
            }
        }
    }

    /// Stop the processing thread and reclaim the analyzer
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.process_thread.take() {
            match handle.join() {
                Ok(analyzer) => self.analyzer = Some(analyzer),
                Err(_) => log::error!("spectrum processor thread panicked"),
            }
            log::info!(
                "spectrum processor stopped after {} frames",
                self.frames_processed()
            );
        }
    }

    pub fn is_running(&self) -> bool {
        self.process_thread.is_some()
    }

    /// Take the latest frame, if a new one arrived since the last call
    pub fn latest_frame(&self) -> Option<SpectrumFrame> {
        self.latest.lock().ok().and_then(|mut guard| guard.take())
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed.load(Ordering::Relaxed)
    }

    pub fn frames_failed(&self) -> u64 {
        self.frames_failed.load(Ordering::Relaxed)
    }

    /// Analyzer, available while stopped
    pub fn analyzer(&self) -> Option<&SpectrumAnalyzer> {
        self.analyzer.as_ref()
    }
}

impl Drop for SpectrumProcessor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::buffer::AudioRingBuffer;
    use crate::audio::tone::ToneGenerator;
    use crate::spectrum::{AnalyzerConfig, BandSpec};
    use std::time::Instant;

    fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn test_processes_tone() {
        let config = AnalyzerConfig {
            fft_size: 1024,
            sample_rate: 44100.0,
            bands: Some(BandSpec::linear(0.0, 22050.0, 64)),
            ..AnalyzerConfig::default()
        };
        let analyzer = SpectrumAnalyzer::new(config).unwrap();
        let mut processor = SpectrumProcessor::new(analyzer);

        let (mut producer, consumer) = AudioRingBuffer::new(8192).split();
        let reader = FrameReader::new(consumer, 1024, 44100.0);

        // 5 kHz sits in band 5000 / (22050 / 64) ~ 14
        let mut tone = ToneGenerator::new(5000.0, 1.0, 44100.0);
        tone.push_block(&mut producer, 4096);

        processor.start(reader).unwrap();
        assert!(processor.is_running());
        assert!(wait_for(|| processor.frames_processed() >= 4));
        processor.stop();

        assert!(!processor.is_running());
        assert!(processor.analyzer().is_some());

        let frame = processor.latest_frame().unwrap();
        assert_eq!(frame.magnitudes.len(), 64);
        assert!((frame.timestamp - 3072.0 / 44100.0).abs() < 1e-9);

        let (loudest, _) = frame
            .magnitudes
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap();
        assert_eq!(loudest, 14);

        // Taken frames are not handed out twice
        assert!(processor.latest_frame().is_none());
    }

    #[test]
    fn test_mismatched_reader_is_handed_back() {
        let analyzer = SpectrumAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let mut processor = SpectrumProcessor::new(analyzer);

        let (mut producer, consumer) = AudioRingBuffer::new(4096).split();
        let reader = FrameReader::new(consumer, 512, 44100.0);

        let err = processor.start(reader).unwrap_err();
        assert!(matches!(
            err.kind(),
            ProcessorError::FrameSizeMismatch { reader: 512, analyzer: 1024 }
        ));
        assert!(processor.analyzer().is_some());
        assert!(!processor.is_running());

        // The same ring keeps feeding a processor sized to match
        let reader = err.into_reader().unwrap();
        let analyzer = SpectrumAnalyzer::new(AnalyzerConfig {
            fft_size: 512,
            ..AnalyzerConfig::default()
        })
        .unwrap();
        let mut processor = SpectrumProcessor::new(analyzer);
        processor.start(reader).unwrap();

        ToneGenerator::new(1000.0, 1.0, 44100.0).push_block(&mut producer, 1024);
        assert!(wait_for(|| processor.frames_processed() >= 2));
        processor.stop();
        assert_eq!(processor.frames_failed(), 0);
    }

    #[test]
    fn test_double_start() {
        let analyzer = SpectrumAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let mut processor = SpectrumProcessor::new(analyzer);

        let (_p1, c1) = AudioRingBuffer::new(4096).split();
        let (_p2, c2) = AudioRingBuffer::new(4096).split();

        processor.start(FrameReader::new(c1, 1024, 44100.0)).unwrap();
        let err = processor.start(FrameReader::new(c2, 1024, 44100.0)).unwrap_err();
        assert!(matches!(err.kind(), ProcessorError::AlreadyRunning));
        assert_eq!(err.into_reader().map(|r| r.frame_size()), Some(1024));
        processor.stop();
    }
}
