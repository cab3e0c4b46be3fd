//! Progress reporting for downloads (bytes done, ETA, rate).
//!
//! Consumers can compute rate = bytes_done / elapsed_secs and
//! ETA = (total_bytes - bytes_done) / rate.

/// Snapshot of download progress (CLI-friendly).
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStats {
    /// Bytes on disk so far.
    pub bytes_done: u64,
    /// Total file size in bytes.
    pub total_bytes: u64,
    /// Elapsed time since download start (seconds).
    pub elapsed_secs: f64,
}

impl ProgressStats {
    /// Total download rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None if rate is 0 and bytes remain).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total_bytes.saturating_sub(self.bytes_done);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        (self.bytes_done as f64 / self.total_bytes as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(done: u64, total: u64, secs: f64) -> ProgressStats {
        ProgressStats {
            bytes_done: done,
            total_bytes: total,
            elapsed_secs: secs,
        }
    }

    #[test]
    fn rate_and_eta() {
        let s = stats(500, 1000, 2.0);
        assert_eq!(s.bytes_per_sec(), 250.0);
        assert_eq!(s.eta_secs(), Some(2.0));
        assert_eq!(s.fraction(), 0.5);
    }

    #[test]
    fn no_time_elapsed() {
        let s = stats(0, 1000, 0.0);
        assert_eq!(s.bytes_per_sec(), 0.0);
        assert_eq!(s.eta_secs(), None);
    }

    #[test]
    fn finished_and_empty() {
        assert_eq!(stats(1000, 1000, 3.0).eta_secs(), Some(0.0));
        assert_eq!(stats(0, 0, 0.0).fraction(), 1.0);
    }
}
