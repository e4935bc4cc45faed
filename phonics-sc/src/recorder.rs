//! Microphone recorder
//!
//! cpal streams cannot move between threads, so each recording runs on its
//! own capture thread that owns the stream. Stopping signals the thread,
//! which drops the stream and releases the microphone before the samples
//! are encoded.

use crate::error::CaptureError;
use bytes::Bytes;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, SampleFormat, SizedSample, Stream, StreamConfig};
use parking_lot::Mutex;
use phonics_storage::Recording;
use std::io::Cursor;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};

/// Longest recording kept; later samples are dropped.
const MAX_RECORDING_SECS: usize = 30;
const MAX_DEVICES_TO_CHECK: usize = 100;

struct ActiveCapture {
    samples: Arc<Mutex<Vec<i16>>>,
    channels: u16,
    sample_rate: u32,
    stop_tx: mpsc::Sender<()>,
    thread: JoinHandle<()>,
}

/// Records one sound at a time from an input device
#[derive(Default)]
pub struct AudioRecorder {
    device_name: Option<String>,
    active: Mutex<Option<ActiveCapture>>,
}

impl AudioRecorder {
    /// Record from the system default input device
    pub fn new() -> Self {
        Self::default()
    }

    /// Record from the first input device whose name contains `name`
    pub fn with_device(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
            active: Mutex::new(None),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Open the microphone and start capturing.
    pub fn start(&self) -> Result<(), CaptureError> {
        let mut active = self.active.lock();
        if active.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }

        let samples = Arc::new(Mutex::new(Vec::new()));
        let (ready_tx, ready_rx) = mpsc::channel();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let device_name = self.device_name.clone();
        let buffer = samples.clone();

        let thread = std::thread::Builder::new()
            .name("phonics-capture".to_string())
            .spawn(move || {
                let stream = match open_stream(device_name.as_deref(), buffer) {
                    Ok((stream, channels, sample_rate)) => {
                        let _ = ready_tx.send(Ok((channels, sample_rate)));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                // Blocks until stop() drops the sender
                let _ = stop_rx.recv();
                drop(stream);
                debug!("Microphone released");
            })?;

        let (channels, sample_rate) = ready_rx
            .recv()
            .map_err(|_| CaptureError::Capture("Capture thread exited during startup".to_string()))??;

        info!("Recording started ({} ch, {} Hz)", channels, sample_rate);
        *active = Some(ActiveCapture {
            samples,
            channels,
            sample_rate,
            stop_tx,
            thread,
        });
        Ok(())
    }

    /// Stop capturing, release the microphone and return the WAV clip.
    ///
    /// Returns an empty recording when nothing was being recorded.
    pub fn stop(&self) -> Result<Recording, CaptureError> {
        let capture = match self.active.lock().take() {
            Some(capture) => capture,
            None => {
                debug!("stop() called while not recording");
                return Ok(Recording::wav(Bytes::new()));
            }
        };

        let ActiveCapture {
            samples,
            channels,
            sample_rate,
            stop_tx,
            thread,
        } = capture;
        drop(stop_tx);
        if thread.join().is_err() {
            error!("Capture thread panicked");
        }

        let samples = std::mem::take(&mut *samples.lock());
        let audio = encode_wav(&samples, channels, sample_rate)?;
        info!(
            "Recording stopped: {} samples, {} bytes",
            samples.len(),
            audio.len()
        );
        Ok(Recording::wav(audio))
    }
}

impl Drop for AudioRecorder {
    fn drop(&mut self) {
        if let Some(capture) = self.active.lock().take() {
            drop(capture.stop_tx);
            let _ = capture.thread.join();
        }
    }
}

/// Encode interleaved 16-bit samples as a WAV file.
pub fn encode_wav(samples: &[i16], channels: u16, sample_rate: u32) -> Result<Bytes, CaptureError> {
    if channels == 0 || sample_rate == 0 {
        return Err(CaptureError::Encode(format!(
            "Invalid format: {} channels at {} Hz",
            channels, sample_rate
        )));
    }

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(Bytes::from(cursor.into_inner()))
}

/// Names of the available input devices
pub fn list_input_devices() -> Result<Vec<String>, CaptureError> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| CaptureError::Device(format!("Failed to enumerate devices: {}", e)))?;

    Ok(devices
        .take(MAX_DEVICES_TO_CHECK)
        .filter_map(|device| device.name().ok())
        .collect())
}

fn find_device(host: &Host, name: Option<&str>) -> Result<Device, CaptureError> {
    let Some(name) = name else {
        return host
            .default_input_device()
            .ok_or_else(|| CaptureError::Device("No input device available".to_string()));
    };

    if name.len() > 256 {
        return Err(CaptureError::Device("Device name too long (max 256 chars)".to_string()));
    }

    let devices = host
        .input_devices()
        .map_err(|e| CaptureError::Device(format!("Failed to enumerate devices: {}", e)))?;
    devices
        .take(MAX_DEVICES_TO_CHECK)
        .find(|device| device.name().map(|n| n.contains(name)).unwrap_or(false))
        .ok_or_else(|| CaptureError::Device(format!("No input device matching {:?}", name)))
}

fn open_stream(device_name: Option<&str>, buffer: Arc<Mutex<Vec<i16>>>) -> Result<(Stream, u16, u32), CaptureError> {
    let host = cpal::default_host();
    let device = find_device(&host, device_name)?;
    let supported = device
        .default_input_config()
        .map_err(|e| CaptureError::Device(format!("No usable input config: {}", e)))?;

    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.config();
    let channels = config.channels;
    let sample_rate = config.sample_rate.0;
    let limit = MAX_RECORDING_SECS * sample_rate as usize * channels as usize;

    debug!(
        "Opening {} ({:?}, {} ch, {} Hz)",
        device.name().unwrap_or_default(),
        sample_format,
        channels,
        sample_rate
    );

    let stream = match sample_format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, buffer, limit),
        SampleFormat::I16 => build_stream::<i16>(&device, &config, buffer, limit),
        SampleFormat::U16 => build_stream::<u16>(&device, &config, buffer, limit),
        other => return Err(CaptureError::Device(format!("Unsupported sample format {:?}", other))),
    }?;

    stream
        .play()
        .map_err(|e| CaptureError::Capture(format!("Failed to start stream: {}", e)))?;
    Ok((stream, channels, sample_rate))
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    buffer: Arc<Mutex<Vec<i16>>>,
    limit: usize,
) -> Result<Stream, CaptureError>
where
    T: SizedSample,
    i16: cpal::FromSample<T>,
{
    let mut truncated = false;
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let mut samples = buffer.lock();
                let room = limit.saturating_sub(samples.len());
                if data.len() > room && !truncated {
                    warn!("Recording reached {} s limit; dropping further audio", MAX_RECORDING_SECS);
                    truncated = true;
                }
                samples.extend(data.iter().take(room).map(|&s| s.to_sample::<i16>()));
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| CaptureError::Capture(format!("Failed to build stream: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_wav_header() {
        let audio = encode_wav(&[0, 1000, -1000, i16::MAX], 1, 16_000).unwrap();
        assert_eq!(&audio[..4], b"RIFF");
        assert_eq!(&audio[8..12], b"WAVE");
        // 44-byte header plus two bytes per sample
        assert_eq!(audio.len(), 44 + 8);
    }

    #[test]
    fn test_encode_wav_rejects_bad_format() {
        assert!(matches!(encode_wav(&[0], 0, 16_000), Err(CaptureError::Encode(_))));
        assert!(matches!(encode_wav(&[0], 1, 0), Err(CaptureError::Encode(_))));
    }

    #[test]
    fn test_stop_when_idle_returns_empty_recording() {
        let recorder = AudioRecorder::new();
        assert!(!recorder.is_recording());
        let recording = recorder.stop().unwrap();
        assert!(recording.is_empty());
        assert_eq!(recording.mime, "audio/wav");
    }
}
