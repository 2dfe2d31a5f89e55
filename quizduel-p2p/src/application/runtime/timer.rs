use instant::{Duration, Instant};

/// Fixed-period tick driven by the caller's clock
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    period: Duration,
    next: Option<Instant>,
}

impl IntervalTimer {
    pub fn new(period: Duration) -> Self {
        Self { period, next: None }
    }

    /// First tick one period after `now`
    pub fn start(&mut self, now: Instant) {
        self.next = Some(now + self.period);
    }

    pub fn stop(&mut self) {
        self.next = None;
    }

    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    /// True once per elapsed period. Missed ticks are not replayed; the
    /// next one is scheduled a full period after `now`.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.next {
            Some(next) if now >= next => {
                self.next = Some(now + self.period);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_each_period() {
        let t0 = Instant::now();
        let mut timer = IntervalTimer::new(Duration::from_secs(2));
        timer.start(t0);

        assert!(!timer.fire(t0 + Duration::from_secs(1)));
        assert!(timer.fire(t0 + Duration::from_secs(2)));
        assert!(!timer.fire(t0 + Duration::from_secs(3)));
        assert!(timer.fire(t0 + Duration::from_secs(4)));
    }

    #[test]
    fn test_missed_ticks_collapse() {
        let t0 = Instant::now();
        let mut timer = IntervalTimer::new(Duration::from_secs(2));
        timer.start(t0);

        assert!(timer.fire(t0 + Duration::from_secs(9)));
        assert!(!timer.fire(t0 + Duration::from_secs(10)));
    }

    #[test]
    fn test_stopped_never_fires() {
        let mut timer = IntervalTimer::new(Duration::from_millis(1));
        assert!(!timer.fire(Instant::now()));

        timer.start(Instant::now());
        timer.stop();
        assert!(!timer.is_running());
    }
}
