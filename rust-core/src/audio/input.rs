//! Live capture through cpal
//!
//! Opens an input device at its default configuration, folds interleaved
//! channels down to mono and feeds the ring buffer from the driver callback.

use super::buffer::AudioProducer;
use crate::filters::DcRejectionFilter;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No audio input device available")]
    NoDevice,

    #[error("Could not enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("Could not read device name: {0}")]
    DeviceName(#[from] cpal::DeviceNameError),

    #[error("Could not query the device's default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("Input delivers {0:?} samples; only f32 capture is supported")]
    UnsupportedSampleFormat(SampleFormat),

    #[error("Could not open input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Could not start input stream: {0}")]
    Play(#[from] cpal::PlayStreamError),

    #[error("Could not pause input stream: {0}")]
    Pause(#[from] cpal::PauseStreamError),
}

/// What a device captures at by default
#[derive(Debug, Clone)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub sample_rate: u32,
    pub channels: u16,
}

/// An open capture stream; samples flow while it is playing
pub struct AudioInput {
    stream: Stream,
    info: AudioDeviceInfo,
}

impl AudioInput {
    /// Open the host's default input device
    ///
    /// # Arguments
    /// * `producer` - Ring buffer end the callback writes mono samples into
    /// * `dc_rejection` - Run captured audio through a `DcRejectionFilter`
    pub fn from_default_device(producer: AudioProducer, dc_rejection: bool) -> Result<Self, AudioError> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or(AudioError::NoDevice)?;
        Self::from_device(device, producer, dc_rejection)
    }

    pub fn from_device(
        device: Device,
        mut producer: AudioProducer,
        dc_rejection: bool,
    ) -> Result<Self, AudioError> {
        let supported = device.default_input_config()?;
        if supported.sample_format() != SampleFormat::F32 {
            return Err(AudioError::UnsupportedSampleFormat(supported.sample_format()));
        }

        let info = AudioDeviceInfo {
            name: device.name()?,
            sample_rate: supported.sample_rate().0,
            channels: supported.channels(),
        };
        log::info!(
            "capturing from '{}' at {} Hz, {} channel(s)",
            info.name,
            info.sample_rate,
            info.channels
        );

        let config: StreamConfig = supported.into();
        let channels = usize::from(info.channels.max(1));
        let mut dc_filter = dc_rejection.then(DcRejectionFilter::default);
        let mut mono = Vec::new();

        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                downmix_into(data, channels, &mut mono);
                if let Some(filter) = dc_filter.as_mut() {
                    filter.process_block_inplace(&mut mono);
                }
                producer.write(&mono);
            },
            |err| log::error!("input stream error: {}", err),
            None,
        )?;

        Ok(Self { stream, info })
    }

    pub fn start(&self) -> Result<(), AudioError> {
        Ok(self.stream.play()?)
    }

    pub fn pause(&self) -> Result<(), AudioError> {
        Ok(self.stream.pause()?)
    }

    pub fn device_info(&self) -> &AudioDeviceInfo {
        &self.info
    }
}

/// Average each interleaved frame of `data` into one sample of `mono`
///
/// `mono` is cleared first so the callback can reuse its allocation.
pub fn downmix_into(data: &[f32], channels: usize, mono: &mut Vec<f32>) {
    mono.clear();
    if channels <= 1 {
        mono.extend_from_slice(data);
        return;
    }
    mono.extend(
        data.chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32),
    );
}

/// Sample rate the default input device captures at
pub fn default_input_sample_rate() -> Result<u32, AudioError> {
    let device = cpal::default_host()
        .default_input_device()
        .ok_or(AudioError::NoDevice)?;
    Ok(device.default_input_config()?.sample_rate().0)
}

/// Input devices that report a usable default config
pub fn list_input_devices() -> Result<Vec<AudioDeviceInfo>, AudioError> {
    let devices = cpal::default_host()
        .input_devices()?
        .filter_map(|device| {
            let name = device.name().ok()?;
            let config = device.default_input_config().ok()?;
            Some(AudioDeviceInfo {
                name,
                sample_rate: config.sample_rate().0,
                channels: config.channels(),
            })
        })
        .collect();
    Ok(devices)
}
