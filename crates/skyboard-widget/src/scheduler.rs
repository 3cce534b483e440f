//! Update timers: one recurring chart refresh plus a one-shot fetch.
//!
//! Timers run as tokio tasks that post events back to the widget's queue.
//! Every arm cancels the previous timers first and bumps a generation
//! counter, so events already queued by a cancelled timer are recognised as
//! stale and dropped.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::event::WidgetEvent;

#[derive(Debug)]
pub struct UpdateScheduler {
    update_interval: Duration,
    events: UnboundedSender<WidgetEvent>,
    recurring: Option<JoinHandle<()>>,
    initial: Option<JoinHandle<()>>,
    generation: u64,
}

impl UpdateScheduler {
    pub fn new(update_interval: Duration, events: UnboundedSender<WidgetEvent>) -> Self {
        Self {
            // tokio intervals reject a zero period
            update_interval: update_interval.max(Duration::from_millis(1)),
            events,
            recurring: None,
            initial: None,
            generation: 0,
        }
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    /// Delay before the next fetch: a non-negative override, else the interval.
    pub fn next_load(&self, delay_override_ms: Option<i64>) -> Duration {
        match delay_override_ms {
            Some(ms) if ms >= 0 => Duration::from_millis(ms.unsigned_abs()),
            _ => self.update_interval,
        }
    }

    /// Replace any live timers with a fresh pair.
    ///
    /// Returns the generation carried by events of the new timers.
    pub fn arm(&mut self, next_load: Duration) -> u64 {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let period = self.update_interval;

        let events = self.events.clone();
        self.recurring = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if events.send(WidgetEvent::RefreshTick { generation }).is_err() {
                    break;
                }
            }
        }));

        let events = self.events.clone();
        self.initial = Some(tokio::spawn(async move {
            time::sleep(next_load).await;
            let _ = events.send(WidgetEvent::FetchDue { generation });
        }));

        tracing::debug!(
            "Armed update timers (generation {}, next load in {:?}, refresh every {:?})",
            generation,
            next_load,
            period
        );
        generation
    }

    /// Abort both timers. Safe to call with nothing armed.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.recurring.take() {
            handle.abort();
        }
        if let Some(handle) = self.initial.take() {
            handle.abort();
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    pub fn has_recurring(&self) -> bool {
        self.recurring.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for UpdateScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
