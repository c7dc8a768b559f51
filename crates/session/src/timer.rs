//! Per-call wall-clock timer

use std::time::Duration;
use tokio::time::Instant;

/// Enforces the hard duration cap on one call
///
/// Armed at session creation, fires at most once; its firing is delivered
/// into the session worker as an ordinary event.
#[derive(Debug)]
pub struct CallTimer {
    deadline: Instant,
    armed: bool,
}

impl CallTimer {
    /// Arm a timer expiring `max_duration` from now
    pub fn new(max_duration: Duration) -> Self {
        Self {
            deadline: Instant::now() + max_duration,
            armed: true,
        }
    }

    /// When the timer fires
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// True until the timer has fired or the session became terminal
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// True once the deadline lies in the past
    pub fn expired(&self) -> bool {
        self.armed && Instant::now() >= self.deadline
    }

    /// Stop the timer; it will not fire again
    pub fn disarm(&mut self) {
        self.armed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timer_expiry() {
        let mut timer = CallTimer::new(Duration::from_secs(10));
        assert!(timer.is_armed());
        assert!(!timer.expired());

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(timer.expired());

        timer.disarm();
        assert!(!timer.expired());
        assert!(!timer.is_armed());
    }
}
