use serde::Serialize;

/// Compensated running sum, keeps long groups of small readings from
/// drifting
#[derive(Debug, Clone, Default)]
pub struct KahanSum {
    sum: f64,
    compensation: f64,
}

impl KahanSum {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add(&mut self, value: f64) {
        let y = value - self.compensation;
        let t = self.sum + y;
        self.compensation = (t - self.sum) - y;
        self.sum = t;
    }

    pub fn total(&self) -> f64 {
        self.sum
    }
}

/// Reduced statistics for one (interval, label) group.
///
/// `None` is the no-data marker for an empty group.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct SummaryStats {
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub count: usize,
}

impl SummaryStats {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Folds a value group into average, min, max and count.
///
/// Comparisons are numeric, so 9 sorts below 10.
pub fn reduce(values: &[f64]) -> SummaryStats {
    if values.is_empty() {
        return SummaryStats::empty();
    }

    let mut sum = KahanSum::new();
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for &value in values {
        sum.add(value);
        min = min.min(value);
        max = max.max(value);
    }

    SummaryStats {
        average: Some(sum.total() / values.len() as f64),
        min: Some(min),
        max: Some(max),
        count: values.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduce_basic_group() {
        let stats = reduce(&[2.0, 4.0, 6.0]);
        assert_eq!(stats.average, Some(4.0));
        assert_eq!(stats.min, Some(2.0));
        assert_eq!(stats.max, Some(6.0));
        assert_eq!(stats.count, 3);
    }

    #[test]
    fn test_reduce_empty_group_has_no_data_markers() {
        let stats = reduce(&[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.average, None);
        assert_eq!(stats.min, None);
        assert_eq!(stats.max, None);
        assert!(stats.is_empty());
    }

    #[test]
    fn test_reduce_single_value_reproduces_it() {
        let stats = reduce(&[17.25]);
        assert_eq!(stats.average, Some(17.25));
        assert_eq!(stats.min, Some(17.25));
        assert_eq!(stats.max, Some(17.25));
        assert_eq!(stats.count, 1);
    }

    #[test]
    fn test_min_max_are_numeric_not_lexical() {
        // "9" > "10" as text
        let stats = reduce(&[9.0, 10.0, 100.0]);
        assert_eq!(stats.min, Some(9.0));
        assert_eq!(stats.max, Some(100.0));
    }

    #[test]
    fn test_reduce_handles_negative_values() {
        let stats = reduce(&[-3.5, 1.5, -0.5]);
        assert_eq!(stats.min, Some(-3.5));
        assert_eq!(stats.max, Some(1.5));
        assert_eq!(stats.average, Some(-2.5 / 3.0));
    }

    #[test]
    fn test_kahan_sum_limits_drift() {
        let mut sum = KahanSum::new();
        for _ in 0..10_000 {
            sum.add(0.1);
        }
        assert!((sum.total() - 1000.0).abs() < 1e-9);
    }
}
