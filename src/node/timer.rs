//! Fixed-period tick source for the publishing loop.
//!
//! The first tick fires one full period after creation. Ticks missed while
//! the loop was busy are delayed rather than fired in a burst.

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

use crate::utils::{Result, TalkerError};

#[derive(Debug)]
pub struct Timer {
    interval: Interval,
    period: Duration,
    fired: u64,
}

impl Timer {
    /// Must be called from within a tokio runtime.
    pub fn new(period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(TalkerError::Config(
                "timer period must be greater than zero".to_string(),
            ));
        }
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Ok(Self {
            interval,
            period,
            fired: 0,
        })
    }

    /// Waits for the next tick and returns how many ticks have fired,
    /// including this one.
    pub async fn tick(&mut self) -> u64 {
        self.interval.tick().await;
        self.fired += 1;
        self.fired
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn fired(&self) -> u64 {
        self.fired
    }
}
