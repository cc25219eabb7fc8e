use anyhow::{Context, Result};
use bandscope::audio::{
    AudioProducer, AudioRingBuffer, FrameReader, SpectrumProcessor, StartError, ToneGenerator,
};
use bandscope::config::{self, Config};
use bandscope::render::render_bars;
use bandscope::spectrum::{frequency_ticks, BandScale, SpectrumAnalyzer};
use bandscope::WindowType;
use clap::{Parser, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Samples pushed per simulated callback in tone mode
const TONE_BLOCK: usize = 512;

#[derive(Parser, Debug)]
#[command(name = "bandscope", about = "Real-time audio spectrum analyzer for the terminal")]
struct Cli {
    /// Config file (defaults to ./bandscope.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Analyze a generated sine at this frequency instead of the input device
    #[arg(long)]
    tone: Option<f32>,

    /// FFT size, a power of two
    #[arg(long)]
    fft_size: Option<usize>,

    /// Number of display bands
    #[arg(short, long)]
    bands: Option<usize>,

    /// Band spacing
    #[arg(long, value_enum)]
    scale: Option<ScaleArg>,

    /// Analysis window
    #[arg(long, value_enum)]
    window: Option<WindowArg>,

    /// Show raw FFT bins instead of bands
    #[arg(long)]
    raw: bool,

    /// Exit after rendering this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// List input devices and exit
    #[arg(long)]
    list_devices: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScaleArg {
    Linear,
    Log,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum WindowArg {
    None,
    Hanning,
    Hamming,
}

impl From<ScaleArg> for BandScale {
    fn from(arg: ScaleArg) -> Self {
        match arg {
            ScaleArg::Linear => BandScale::Linear,
            ScaleArg::Log => BandScale::Logarithmic,
        }
    }
}

impl From<WindowArg> for WindowType {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::None => WindowType::None,
            WindowArg::Hanning => WindowType::Hanning,
            WindowArg::Hamming => WindowType::Hamming,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    if cli.list_devices {
        return list_devices();
    }

    let mut config = load(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);

    match cli.tone {
        Some(frequency) => run_tone(config, frequency, cli.frames),
        None => run_capture(config, cli.frames),
    }
}

fn load(path: Option<&Path>) -> Result<Config> {
    let path = path.map(Path::to_path_buf).or_else(|| {
        let local = PathBuf::from("bandscope.toml");
        local.exists().then_some(local)
    });

    match path {
        Some(path) => {
            let config = config::load_config(&path)
                .with_context(|| format!("loading {}", path.display()))?;
            log::info!("Loaded config from {}", path.display());
            Ok(config)
        }
        None => Ok(Config::default()),
    }
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(fft_size) = cli.fft_size {
        config.analyzer.fft_size = fft_size;
    }
    if let Some(window) = cli.window {
        config.analyzer.window = window.into();
    }
    if let Some(bands) = cli.bands {
        config.bands.count = bands;
    }
    if let Some(scale) = cli.scale {
        config.bands.scale = scale.into();
    }
    if cli.raw {
        config.bands.enabled = false;
    }
}

fn run_tone(config: Config, frequency: f32, frames: Option<u64>) -> Result<()> {
    config.validate()?;
    let sample_rate = config.analyzer.sample_rate;
    log::info!("Analyzing a {} Hz test tone at {} Hz", frequency, sample_rate);

    let (producer, reader) = ring(&config, sample_rate);
    let running = Arc::new(AtomicBool::new(true));
    let tone = ToneGenerator::new(frequency, 1.0, sample_rate);
    let feeder = spawn_tone_feeder(tone, producer, Arc::clone(&running))?;

    let result = run_display(&config, reader, frames);

    running.store(false, Ordering::SeqCst);
    if feeder.join().is_err() {
        log::error!("tone feeder thread panicked");
    }
    result
}

#[cfg(feature = "capture")]
fn run_capture(mut config: Config, frames: Option<u64>) -> Result<()> {
    use bandscope::audio::{default_input_sample_rate, AudioInput};

    config.analyzer.sample_rate = default_input_sample_rate()? as f32;
    config.validate()?;

    let (producer, reader) = ring(&config, config.analyzer.sample_rate);
    let input = AudioInput::from_default_device(producer, config.capture.dc_rejection)?;
    input.start()?;

    let result = run_display(&config, reader, frames);
    input.pause()?;
    result
}

#[cfg(not(feature = "capture"))]
fn run_capture(_config: Config, _frames: Option<u64>) -> Result<()> {
    anyhow::bail!("built without the `capture` feature; pass --tone <HZ> to analyze a test tone")
}

#[cfg(feature = "capture")]
fn list_devices() -> Result<()> {
    let devices = bandscope::audio::list_input_devices()?;
    println!("Input devices:");
    for device in &devices {
        println!("  {:<40} {} Hz, {} ch", device.name, device.sample_rate, device.channels);
    }
    Ok(())
}

#[cfg(not(feature = "capture"))]
fn list_devices() -> Result<()> {
    anyhow::bail!("built without the `capture` feature")
}

fn ring(config: &Config, sample_rate: f32) -> (AudioProducer, FrameReader) {
    let (producer, consumer) = AudioRingBuffer::new(config.buffer_capacity(sample_rate)).split();
    let reader = FrameReader::new(consumer, config.analyzer.fft_size, sample_rate);
    (producer, reader)
}

/// Push tone blocks at the rate a capture callback would deliver them
fn spawn_tone_feeder(
    mut tone: ToneGenerator,
    mut producer: AudioProducer,
    running: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    let block_time = Duration::from_secs_f64(TONE_BLOCK as f64 / tone.sample_rate() as f64);

    let handle = std::thread::Builder::new()
        .name("tone-feeder".into())
        .spawn(move || {
            while running.load(Ordering::SeqCst) {
                tone.push_block(&mut producer, TONE_BLOCK);
                std::thread::sleep(block_time);
            }
        })
        .context("spawning tone feeder")?;
    Ok(handle)
}

fn run_display(config: &Config, reader: FrameReader, frames: Option<u64>) -> Result<()> {
    let analyzer = SpectrumAnalyzer::new(config.analyzer_config())?;
    let nyquist = analyzer.engine().nyquist_frequency();
    let ticks = frequency_ticks(&config.display_axis(), config.display.tick_step_hz, nyquist)?;

    let mut processor = SpectrumProcessor::new(analyzer);
    processor.start(reader).map_err(StartError::into_kind)?;

    let refresh = Duration::from_millis(config.display.refresh_ms);
    let stdout = std::io::stdout();
    let mut rendered = 0u64;

    while frames.map_or(true, |limit| rendered < limit) {
        if let Some(frame) = processor.latest_frame() {
            let mut out = stdout.lock();
            write!(out, "\x1b[H\x1b[2J{}", render_bars(&frame, &config.display, &ticks))?;
            writeln!(out, "t = {:.2}s", frame.timestamp)?;
            out.flush()?;
            rendered += 1;
        }
        std::thread::sleep(refresh);
    }

    processor.stop();
    log::info!(
        "Rendered {} frames ({} analyzed, {} failed)",
        rendered,
        processor.frames_processed(),
        processor.frames_failed()
    );
    Ok(())
}
