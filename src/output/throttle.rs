use std::time::{Duration, Instant};

/// Lets at most one write through per `min_interval`, measured from the
/// last write that succeeded.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last_written: Option<Instant>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_written: None,
        }
    }

    pub fn is_open(&self, now: Instant) -> bool {
        match self.last_written {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.min_interval,
        }
    }

    /// Starts a new window. Call only once the write went through.
    pub fn wrote(&mut self, now: Instant) {
        self.last_written = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_write_is_always_allowed() {
        let throttle = Throttle::new(Duration::from_secs(1));
        assert!(throttle.is_open(Instant::now()));
    }

    #[test]
    fn writes_inside_the_interval_are_dropped() {
        let mut throttle = Throttle::new(Duration::from_secs(1));
        let t0 = Instant::now();

        throttle.wrote(t0);
        assert!(!throttle.is_open(t0 + Duration::from_millis(999)));
        assert!(throttle.is_open(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn dropped_writes_do_not_extend_the_window() {
        let mut throttle = Throttle::new(Duration::from_secs(1));
        let t0 = Instant::now();

        throttle.wrote(t0);
        assert!(!throttle.is_open(t0 + Duration::from_millis(600)));
        assert!(throttle.is_open(t0 + Duration::from_millis(1100)));
    }

    #[test]
    fn window_only_moves_on_a_completed_write() {
        let mut throttle = Throttle::new(Duration::from_secs(1));
        let t0 = Instant::now();

        // checked but never written, e.g. the write failed
        assert!(throttle.is_open(t0));
        assert!(throttle.is_open(t0 + Duration::from_millis(10)));

        throttle.wrote(t0 + Duration::from_millis(10));
        assert!(!throttle.is_open(t0 + Duration::from_millis(500)));
    }
}
