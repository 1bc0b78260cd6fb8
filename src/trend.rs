use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::currency::CurrencyCode;
use crate::normalize::NormalizedRateTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increased,
    Decreased,
    Unchanged,
}

impl Direction {
    pub fn between(previous: f64, current: f64) -> Self {
        if current > previous {
            Direction::Increased
        } else if current < previous {
            Direction::Decreased
        } else {
            Direction::Unchanged
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Direction::Increased => "▲",
            Direction::Decreased => "▼",
            Direction::Unchanged => " ",
        }
    }
}

/// Classifies every code in `next` against `previous`.
///
/// A code that had no previous value counts as unchanged.
pub fn classify(
    previous: &NormalizedRateTable,
    next: &NormalizedRateTable,
) -> BTreeMap<CurrencyCode, Direction> {
    next.iter()
        .map(|(code, rate)| {
            let direction = previous
                .get(code)
                .map(|prev| Direction::between(prev, rate))
                .unwrap_or(Direction::Unchanged);
            (code.clone(), direction)
        })
        .collect()
}

/// Most recent normalized values per code, oldest first.
#[derive(Debug, Clone)]
pub struct RateHistory {
    capacity: usize,
    series: HashMap<CurrencyCode, VecDeque<f64>>,
}

impl RateHistory {
    pub fn new(capacity: usize) -> Self {
        RateHistory {
            capacity: capacity.max(1),
            series: HashMap::new(),
        }
    }

    pub fn record(&mut self, table: &NormalizedRateTable) {
        for (code, rate) in table.iter() {
            let values = self.series.entry(code.clone()).or_default();
            values.push_back(rate);
            while values.len() > self.capacity {
                values.pop_front();
            }
        }
    }

    pub fn values(&self, code: &CurrencyCode) -> Vec<f64> {
        self.series
            .get(code)
            .map(|values| values.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Last sample against the first one.
    pub fn trend(&self, code: &CurrencyCode) -> Direction {
        match self.series.get(code) {
            Some(values) if values.len() >= 2 => {
                Direction::between(values[0], values[values.len() - 1])
            }
            _ => Direction::Unchanged,
        }
    }

    pub fn clear(&mut self) {
        self.series.clear();
    }
}

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Renders a series as block characters scaled between its min and max.
/// Fewer than two samples render as nothing.
pub fn sparkline(values: &[f64]) -> String {
    if values.len() < 2 {
        return String::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = if max > min { max - min } else { 1.0 };
    let top = (BARS.len() - 1) as f64;

    values
        .iter()
        .map(|v| {
            let level = (((v - min) / range) * top).round() as usize;
            BARS[level.min(BARS.len() - 1)]
        })
        .collect()
}
