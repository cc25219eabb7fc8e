use bandscope::audio::{AudioRingBuffer, FrameReader, ToneGenerator};
use bandscope::config::Config;
use bandscope::render::render_bars;
use bandscope::spectrum::{frequency_ticks, map_bands, BandSpec, FftEngine, SpectrumAnalyzer};
use bandscope::{SpectrumError, WindowType};
use std::f64::consts::PI;

const SIZE: usize = 1024;
const RATE: f32 = 44100.0;

fn bin_sine(bin: usize) -> Vec<f32> {
    (0..SIZE)
        .map(|n| (2.0 * PI * bin as f64 * n as f64 / SIZE as f64).sin() as f32)
        .collect()
}

#[test]
fn test_silence_gives_zero_spectrum() {
    let mut engine = FftEngine::new(SIZE, RATE).unwrap();
    engine.set_window_type(WindowType::None);
    engine.forward(&[0.0; SIZE]).unwrap();

    let magnitudes = engine.magnitudes().unwrap();
    assert_eq!(magnitudes.len(), 512);
    assert!(magnitudes.iter().all(|&m| m == 0.0));
}

#[test]
fn test_bin_centered_sine_peaks_at_its_bin() {
    let mut engine = FftEngine::new(SIZE, RATE).unwrap();
    engine.set_window_type(WindowType::None);
    engine.forward(&bin_sine(50)).unwrap();

    let magnitudes = engine.magnitudes().unwrap();
    let peak = magnitudes[50];
    for (i, &m) in magnitudes.iter().enumerate() {
        if i != 50 {
            assert!(m < 0.01 * peak, "bin {} = {} against peak {}", i, m, peak);
        }
    }

    let frequency = engine.bandwidth() * 50.0;
    assert_eq!(engine.magnitude_at_frequency(frequency).unwrap(), peak);
}

#[test]
fn test_full_range_linear_bands_are_the_raw_bins() {
    let mut engine = FftEngine::new(SIZE, RATE).unwrap();
    engine.set_window_type(WindowType::Hanning);
    engine.forward(&bin_sine(73)).unwrap();

    let raw = engine.magnitudes().unwrap().to_vec();
    let spec = BandSpec::linear(0.0, RATE / 2.0, SIZE / 2);
    let bands = map_bands(&raw, engine.bandwidth(), &spec).unwrap();

    assert_eq!(bands, raw);
}

#[test]
fn test_query_before_forward() {
    let engine = FftEngine::new(SIZE, RATE).unwrap();
    assert_eq!(engine.magnitude_at_band(0), Err(SpectrumError::PrecededFft));
}

#[test]
fn test_ring_buffer_to_rendered_bars() {
    let config = Config::from_toml_str(
        r#"
        [analyzer]
        fft_size = 1024
        sample_rate = 44100.0

        [bands]
        scale = "linear"
        min_frequency = 0.0
        max_frequency = 22050.0
        count = 32

        [display]
        height = 8
        "#,
    )
    .unwrap();
    config.validate().unwrap();

    let (mut producer, consumer) = AudioRingBuffer::new(config.buffer_capacity(RATE)).split();
    let mut reader = FrameReader::new(consumer, SIZE, RATE);

    // 11025 Hz lands in the middle of a 32-band linear layout
    let mut tone = ToneGenerator::new(11025.0, 1.0, RATE);
    for _ in 0..4 {
        tone.push_block(&mut producer, 512);
    }

    let mut analyzer = SpectrumAnalyzer::new(config.analyzer_config()).unwrap();
    let mut samples = vec![0.0; SIZE];
    let mut frames = Vec::new();
    while let Some(timestamp) = reader.next_frame(&mut samples) {
        frames.push(analyzer.analyze(&samples, timestamp).unwrap());
    }

    assert_eq!(frames.len(), 2);
    assert!((frames[1].timestamp - SIZE as f64 / RATE as f64).abs() < 1e-9);

    let frame = &frames[1];
    let (loudest, _) = frame
        .magnitudes
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
        .unwrap();
    assert_eq!(loudest, 16);

    let spec = config.band_spec().unwrap();
    let ticks = frequency_ticks(&spec, config.display.tick_step_hz, RATE / 2.0).unwrap();
    let text = render_bars(frame, &config.display, &ticks);
    let rows: Vec<&str> = text.lines().collect();

    assert_eq!(rows.len(), 9);
    assert!(rows.iter().all(|row| row.chars().count() == 32));
    assert_eq!(rows[7].chars().nth(16), Some('█'));
    assert_eq!(rows[7].chars().next(), Some(' '));
    assert!(rows[8].contains("10k"));
}
