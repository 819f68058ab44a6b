/// One per-second snapshot of live performance, used for the results graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceSample {
    pub elapsed_second: u32,
    pub wpm: u32,
    pub accuracy: u32,
}

impl PerformanceSample {
    pub fn new(elapsed_second: u32, wpm: u32, accuracy: u32) -> Self {
        Self {
            elapsed_second,
            wpm,
            accuracy,
        }
    }
}

impl From<PerformanceSample> for (f64, f64) {
    fn from(p: PerformanceSample) -> Self {
        (p.elapsed_second as f64, p.wpm as f64)
    }
}

/// Chart points (seconds, wpm) for a sample series
pub fn wpm_points(samples: &[PerformanceSample]) -> Vec<(f64, f64)> {
    samples.iter().copied().map(Into::into).collect()
}

/// Chart points (seconds, accuracy) for a sample series
pub fn accuracy_points(samples: &[PerformanceSample]) -> Vec<(f64, f64)> {
    samples
        .iter()
        .map(|p| (p.elapsed_second as f64, p.accuracy as f64))
        .collect()
}
