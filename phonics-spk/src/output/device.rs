//! Default output device through rodio
//!
//! rodio's `OutputStream` cannot leave the thread that opened it, so a
//! dedicated thread owns it and hands back the `Send` stream handle. The
//! thread exits when the output is dropped.

use crate::error::AudioError;
use crate::output::{AudioOutput, Playback, PlaybackHandle};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use rodio::source::{Source, Zero};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::io::Cursor;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub struct RodioOutput {
    stream: OutputStreamHandle,
    shutdown: Mutex<Option<mpsc::Sender<()>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl RodioOutput {
    /// Open the system's default output device.
    pub fn open_default() -> Result<Self, AudioError> {
        let (ready_tx, ready_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let thread = std::thread::Builder::new()
            .name("phonics-audio-out".to_string())
            .spawn(move || match OutputStream::try_default() {
                Ok((stream, handle)) => {
                    let _ = ready_tx.send(Ok(handle));
                    // Blocks until the sender is dropped
                    let _ = shutdown_rx.recv();
                    drop(stream);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                }
            })?;

        let stream = ready_rx
            .recv()
            .map_err(|_| AudioError::PlaybackDevice("Output thread exited during startup".to_string()))?
            .map_err(AudioError::PlaybackDevice)?;

        info!("Opened default audio output");
        Ok(Self {
            stream,
            shutdown: Mutex::new(Some(shutdown_tx)),
            thread: Mutex::new(Some(thread)),
        })
    }

    fn new_sink(&self, volume: f32) -> Result<Sink, AudioError> {
        let sink = Sink::try_new(&self.stream).map_err(|e| AudioError::PlaybackDevice(e.to_string()))?;
        sink.set_volume(volume.clamp(0.0, 1.0));
        Ok(sink)
    }
}

impl Drop for RodioOutput {
    fn drop(&mut self) {
        self.shutdown.lock().take();
        if let Some(thread) = self.thread.lock().take() {
            if thread.join().is_err() {
                error!("Audio output thread panicked");
            }
        }
    }
}

struct SinkHandle {
    sink: Arc<Sink>,
}

impl PlaybackHandle for SinkHandle {
    fn stop(&self) {
        self.sink.stop();
    }
}

#[async_trait]
impl AudioOutput for RodioOutput {
    async fn start(&self, clip: Bytes, volume: f32) -> Result<Playback, AudioError> {
        let decoder = Decoder::new(Cursor::new(clip)).map_err(|e| AudioError::Decode(e.to_string()))?;
        let sink = Arc::new(self.new_sink(volume)?);
        sink.append(decoder);

        let (done_tx, done_rx) = oneshot::channel();
        let watched = sink.clone();
        tokio::spawn(async move {
            while !watched.empty() {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            let _ = done_tx.send(Ok(()));
        });

        debug!("Started clip on default output");
        Ok(Playback::new(Arc::new(SinkHandle { sink }), done_rx))
    }

    async fn warm_up(&self) -> Result<(), AudioError> {
        let sink = self.new_sink(0.0)?;
        sink.append(Zero::<f32>::new(1, 44_100).take_duration(Duration::from_millis(10)));
        sink.detach();
        debug!("Audio output warmed up");
        Ok(())
    }

    fn name(&self) -> &str {
        "rodio"
    }
}
