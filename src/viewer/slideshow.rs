//! Periodic slideshow timer.
//!
//! The timer runs as a tokio task that posts [`ViewerEvent::SlideshowTick`]
//! onto the viewer's event channel. Each start bumps a generation counter so
//! ticks already queued by a stopped timer can be recognised and dropped.

use std::time::Duration;

use async_channel::Sender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use super::ViewerEvent;

pub struct Slideshow {
    interval: Duration,
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl Slideshow {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            generation: 0,
            handle: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True when a tick carrying `generation` comes from the running timer.
    pub fn accepts(&self, generation: u64) -> bool {
        self.is_active() && generation == self.generation
    }

    /// Flips the timer on or off. Returns the new state.
    pub fn toggle(&mut self, events: &Sender<ViewerEvent>) -> bool {
        if self.is_active() {
            self.stop();
        } else {
            self.start(events);
        }
        self.is_active()
    }

    pub fn start(&mut self, events: &Sender<ViewerEvent>) {
        self.stop();
        self.generation += 1;

        let generation = self.generation;
        let period = self.interval;
        let events = events.clone();
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if events
                    .send(ViewerEvent::SlideshowTick { generation })
                    .await
                    .is_err()
                {
                    break;
                }
            }
        }));
        debug!(generation, interval_ms = period.as_millis() as u64, "Slideshow started");
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!(generation = self.generation, "Slideshow stopped");
        }
    }
}

impl Drop for Slideshow {
    fn drop(&mut self) {
        self.stop();
    }
}
