use std::time::Duration;

use tokio::time::Instant;

/// Repeating timer kept as a deadline so the owner decides how to wait.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RotationTimer {
    interval: Duration,
    next: Option<Instant>,
}

impl RotationTimer {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: None,
        }
    }

    pub(crate) fn start(&mut self, now: Instant) {
        self.next = Some(now + self.interval);
    }

    pub(crate) fn stop(&mut self) {
        self.next = None;
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.next
    }

    /// Consume a due tick. Ticks missed while the owner was busy collapse
    /// into one; the cadence stays anchored to the first start.
    pub(crate) fn poll(&mut self, now: Instant) -> bool {
        let Some(due) = self.next else {
            return false;
        };
        if now < due {
            return false;
        }
        let mut next = due + self.interval;
        while next <= now {
            next += self.interval;
        }
        self.next = Some(next);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_once_per_interval() {
        let t0 = Instant::now();
        let mut timer = RotationTimer::new(Duration::from_secs(20));
        assert!(!timer.poll(t0));

        timer.start(t0);
        assert!(!timer.poll(t0 + Duration::from_secs(19)));
        assert!(timer.poll(t0 + Duration::from_secs(20)));
        assert!(!timer.poll(t0 + Duration::from_secs(21)));
        assert_eq!(timer.deadline(), Some(t0 + Duration::from_secs(40)));
    }

    #[test]
    fn missed_ticks_collapse() {
        let t0 = Instant::now();
        let mut timer = RotationTimer::new(Duration::from_secs(1));
        timer.start(t0);
        assert!(timer.poll(t0 + Duration::from_millis(3500)));
        assert_eq!(timer.deadline(), Some(t0 + Duration::from_secs(4)));
    }

    #[test]
    fn stop_clears_deadline() {
        let t0 = Instant::now();
        let mut timer = RotationTimer::new(Duration::from_secs(1));
        timer.start(t0);
        timer.stop();
        assert_eq!(timer.deadline(), None);
        assert!(!timer.poll(t0 + Duration::from_secs(5)));
    }
}
