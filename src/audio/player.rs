use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// Audio output contract as seen by the navigation machine. Volume is an
/// integer percentage in 0..=100.
pub trait Playback {
    fn load(&mut self, path: &Path) -> Result<()>;
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn set_volume(&mut self, percent: u8);
    fn volume(&self) -> u8;
    fn is_playing(&self) -> bool;
    fn has_ended(&self) -> bool;
}

pub struct RodioPlayer {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    sink: Option<Sink>,
    volume: u8,
}

impl RodioPlayer {
    pub fn new(volume: u8) -> Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default()
            .context("failed to open the default audio output device")?;
        Ok(Self {
            _stream: stream,
            stream_handle,
            sink: None,
            volume: volume.min(100),
        })
    }

    fn gain(percent: u8) -> f32 {
        f32::from(percent.min(100)) / 100.0
    }
}

impl Playback for RodioPlayer {
    /// Decode `path` into a fresh paused sink, replacing whatever was loaded.
    fn load(&mut self, path: &Path) -> Result<()> {
        if let Some(old) = self.sink.take() {
            old.stop();
        }

        let file = File::open(path)
            .with_context(|| format!("failed to open audio file {}", path.display()))?;
        let source = Decoder::new(BufReader::new(file))
            .with_context(|| format!("failed to decode audio file {}", path.display()))?;

        let sink = Sink::try_new(&self.stream_handle).context("failed to create audio sink")?;
        sink.set_volume(Self::gain(self.volume));
        sink.pause();
        sink.append(source);
        self.sink = Some(sink);

        debug!(path = %path.display(), "track loaded");
        Ok(())
    }

    fn play(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn set_volume(&mut self, percent: u8) {
        self.volume = percent.min(100);
        if let Some(sink) = &self.sink {
            sink.set_volume(Self::gain(self.volume));
        }
    }

    fn volume(&self) -> u8 {
        self.volume
    }

    fn is_playing(&self) -> bool {
        self.sink
            .as_ref()
            .map(|sink| !sink.is_paused() && !sink.empty())
            .unwrap_or(false)
    }

    /// True once the loaded track has drained. Never true while nothing is
    /// loaded, so a stopped player does not auto-advance.
    fn has_ended(&self) -> bool {
        self.sink.as_ref().map(|sink| sink.empty()).unwrap_or(false)
    }
}
