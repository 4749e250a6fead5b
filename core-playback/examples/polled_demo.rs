//! # Poll-Driven Track Example
//!
//! Drives a [`PolledTrack`] against a simulated native handle whose playhead
//! freezes after a few seconds, the way an OS-suspended player does. The
//! track notices the stall and pauses itself.
//!
//! Run with: `cargo run --example polled_demo --package core-playback`

use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    HandleListener, HandleStatus, MediaHandle, MediaHandleFactory, PlayOptions,
};
use core_playback::{AudioTrack, TrackBackend};
use core_runtime::config::{CoreConfig, PlaybackConfig};
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Native handle that advances one second per pull until it is "suspended".
struct SimulatedHandle {
    listener: Arc<dyn HandleListener>,
    position: Mutex<f64>,
    running: Mutex<bool>,
    suspend_at: f64,
}

#[async_trait::async_trait]
impl MediaHandle for SimulatedHandle {
    fn duration(&self) -> f64 {
        30.0
    }

    fn buffered_fraction(&self) -> f64 {
        (*self.position.lock().unwrap() / 10.0).min(1.0)
    }

    async fn current_position(&self) -> BridgeResult<f64> {
        let mut position = self.position.lock().unwrap();
        if *self.running.lock().unwrap() && *position < self.suspend_at {
            *position += 1.0;
        }
        Ok(*position)
    }

    fn play(&self, options: PlayOptions) {
        println!("native: play (locked playback: {})", options.play_when_locked);
        *self.running.lock().unwrap() = true;
        self.listener.on_status(HandleStatus::Starting, None);
        self.listener.on_status(HandleStatus::Running, None);
    }

    fn pause(&self) {
        println!("native: pause");
        *self.running.lock().unwrap() = false;
        self.listener.on_status(HandleStatus::Paused, None);
    }

    fn stop(&self) {
        *self.running.lock().unwrap() = false;
        self.listener.on_status(HandleStatus::Stopped, None);
    }

    fn seek_to(&self, millis: u64) {
        *self.position.lock().unwrap() = millis as f64 / 1000.0;
    }

    fn set_volume(&self, volume: f64) {
        println!("native: volume {volume}");
    }

    fn release(&self) {
        println!("native: release");
    }
}

struct SimulatedBridge;

impl MediaHandleFactory for SimulatedBridge {
    fn create(
        &self,
        _src: &str,
        listener: Arc<dyn HandleListener>,
    ) -> BridgeResult<Arc<dyn MediaHandle>> {
        Ok(Arc::new(SimulatedHandle {
            listener,
            position: Mutex::new(0.0),
            running: Mutex::new(false),
            suspend_at: 4.0,
        }))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug),
    )?;

    let config = CoreConfig::builder()
        .handle_factory(Arc::new(SimulatedBridge))
        .playback(PlaybackConfig::default().with_poll_interval(Duration::from_millis(200)))
        .build()?;
    let backend = TrackBackend::from_config(&config)?;

    let track = backend.create_track("https://cdn.example.com/audio/demo.mp3");
    track.set_id(1)?;
    let mut messages = track.subscribe();

    track.play();
    track.set_volume(0.8);

    while track.is_playing() || track.progress() == 0.0 {
        let message = messages.recv().await?;
        println!(
            "{:>16} {}",
            message.event_name(),
            serde_json::to_string(message.value())?
        );
    }

    println!(
        "stopped at {:.2}s ({:.0}% of {:?}s), state {:?}",
        track.progress(),
        track.completed() * 100.0,
        track.duration(),
        track.state()
    );

    track.destroy();
    Ok(())
}
