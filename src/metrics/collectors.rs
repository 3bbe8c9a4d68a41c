use std::time::{Duration, Instant};

/// Collects latency samples and turns them into percentile statistics
/// once per collection interval
#[derive(Debug)]
pub struct LatencyCollector {
    samples: Vec<Duration>,
    last_collection: Instant,
    collection_interval: Duration,
}

impl LatencyCollector {
    pub fn new(collection_interval: Duration) -> Self {
        Self {
            samples: Vec::new(),
            last_collection: Instant::now(),
            collection_interval,
        }
    }

    /// Add a latency sample
    pub fn record(&mut self, latency: Duration) {
        self.samples.push(latency);
    }

    /// Collect and reset statistics if interval has passed
    pub fn collect(&mut self) -> Option<LatencyStatistics> {
        if self.last_collection.elapsed() >= self.collection_interval {
            Some(self.drain())
        } else {
            None
        }
    }

    /// Collect and reset regardless of the interval
    pub fn drain(&mut self) -> LatencyStatistics {
        let stats = Self::calculate_stats(&mut self.samples);
        self.samples.clear();
        self.last_collection = Instant::now();
        stats
    }

    fn calculate_stats(samples: &mut [Duration]) -> LatencyStatistics {
        if samples.is_empty() {
            return LatencyStatistics::default();
        }

        samples.sort_unstable();

        let len = samples.len();
        let percentile = |p: f64| samples[((len as f64 * p) as usize).min(len - 1)];
        let total: Duration = samples.iter().sum();

        LatencyStatistics {
            count: len as u64,
            min: samples[0],
            max: samples[len - 1],
            mean: total / len as u32,
            p50: percentile(0.50),
            p95: percentile(0.95),
            p99: percentile(0.99),
            p999: percentile(0.999),
        }
    }
}

/// Counts operations and reports a rate per collection interval
#[derive(Debug)]
pub struct ThroughputCollector {
    counter: u64,
    last_collection: Instant,
    collection_interval: Duration,
    last_count: u64,
}

impl ThroughputCollector {
    pub fn new(collection_interval: Duration) -> Self {
        Self {
            counter: 0,
            last_collection: Instant::now(),
            collection_interval,
            last_count: 0,
        }
    }

    /// Increment by a specific amount
    pub fn add(&mut self, value: u64) {
        self.counter += value;
    }

    /// Collect throughput statistics
    pub fn collect(&mut self) -> Option<ThroughputStatistics> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_collection);

        if elapsed < self.collection_interval {
            return None;
        }

        let operations = self.counter - self.last_count;
        self.last_collection = now;
        self.last_count = self.counter;

        Some(ThroughputStatistics {
            operations,
            rate: operations as f64 / elapsed.as_secs_f64(),
            total: self.counter,
            interval: elapsed,
        })
    }

    /// Get current total count
    pub fn total(&self) -> u64 {
        self.counter
    }
}

/// Aggregated latency statistics
#[derive(Debug, Clone, Default)]
pub struct LatencyStatistics {
    pub count: u64,
    pub min: Duration,
    pub max: Duration,
    pub mean: Duration,
    pub p50: Duration,
    pub p95: Duration,
    pub p99: Duration,
    pub p999: Duration,
}

impl LatencyStatistics {
    /// Convert to microseconds for easier reading
    pub fn to_micros(&self) -> LatencyMicros {
        LatencyMicros {
            count: self.count,
            mean: self.mean.as_secs_f64() * 1e6,
            p50: self.p50.as_secs_f64() * 1e6,
            p99: self.p99.as_secs_f64() * 1e6,
            max: self.max.as_secs_f64() * 1e6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LatencyMicros {
    pub count: u64,
    pub mean: f64,
    pub p50: f64,
    pub p99: f64,
    pub max: f64,
}

/// Throughput statistics
#[derive(Debug, Clone)]
pub struct ThroughputStatistics {
    pub operations: u64,
    pub rate: f64,
    pub total: u64,
    pub interval: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_latency_collector() {
        let mut collector = LatencyCollector::new(Duration::from_millis(100));

        collector.record(Duration::from_micros(100));
        collector.record(Duration::from_micros(300));
        collector.record(Duration::from_micros(200));

        // Should not collect yet
        assert!(collector.collect().is_none());

        thread::sleep(Duration::from_millis(101));

        // Should collect now
        let stats = collector.collect().unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, Duration::from_micros(100));
        assert_eq!(stats.max, Duration::from_micros(300));
        assert_eq!(stats.p50, Duration::from_micros(200));
        assert_eq!(stats.mean, Duration::from_micros(200));
    }

    #[test]
    fn test_drain_empty() {
        let mut collector = LatencyCollector::new(Duration::from_secs(60));
        let stats = collector.drain();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.max, Duration::ZERO);
    }

    #[test]
    fn test_throughput_collector() {
        let mut collector = ThroughputCollector::new(Duration::from_millis(100));

        collector.add(1);
        collector.add(5);

        assert_eq!(collector.total(), 6);

        // Should not collect yet
        assert!(collector.collect().is_none());

        thread::sleep(Duration::from_millis(101));

        // Should collect now
        let stats = collector.collect().unwrap();
        assert_eq!(stats.operations, 6);
        assert!(stats.rate > 0.0);
    }
}
