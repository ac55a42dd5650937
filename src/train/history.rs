use std::collections::VecDeque;

use serde::Serialize;

/// Samples of error kept for the live error graph.
pub const DEFAULT_HISTORY: usize = 600;

/// Sliding window over the most recent per-sample errors.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorHistory {
    capacity: usize,
    values: VecDeque<f32>,
}

impl ErrorHistory {
    pub fn new(capacity: usize) -> Self {
        ErrorHistory { capacity: capacity.max(1), values: VecDeque::with_capacity(capacity.max(1)) }
    }

    /// Appends a value, dropping the oldest once the window is full.
    pub fn push(&mut self, value: f32) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last(&self) -> Option<f32> {
        self.values.back().copied()
    }

    pub fn min(&self) -> Option<f32> {
        self.values.iter().copied().reduce(f32::min)
    }

    pub fn max(&self) -> Option<f32> {
        self.values.iter().copied().reduce(f32::max)
    }

    pub fn mean(&self) -> Option<f32> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f32>() / self.values.len() as f32)
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().copied()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl Default for ErrorHistory {
    fn default() -> Self {
        ErrorHistory::new(DEFAULT_HISTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_drops_oldest() {
        let mut h = ErrorHistory::new(3);
        for v in [4.0, 1.0, 3.0, 2.0] {
            h.push(v);
        }
        assert_eq!(h.iter().collect::<Vec<_>>(), vec![1.0, 3.0, 2.0]);
        assert_eq!(h.min(), Some(1.0));
        assert_eq!(h.max(), Some(3.0));
        assert_eq!(h.mean(), Some(2.0));
        assert_eq!(h.last(), Some(2.0));
    }

    #[test]
    fn empty_history_has_no_stats() {
        let h = ErrorHistory::default();
        assert!(h.is_empty());
        assert_eq!(h.min(), None);
        assert_eq!(h.mean(), None);
    }
}
