use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::currency::CurrencyCode;
use crate::trend::Direction;

#[derive(Debug, Clone, Copy)]
struct Highlight {
    direction: Direction,
    expires_at: Instant,
}

/// Transient up/down markers, one independent deadline per code.
#[derive(Debug)]
pub struct Highlights {
    duration: Duration,
    active: HashMap<CurrencyCode, Highlight>,
}

impl Highlights {
    pub fn new(duration: Duration) -> Self {
        Highlights {
            duration,
            active: HashMap::new(),
        }
    }

    /// Starts or restarts the highlight for `code`. Unchanged rates leave any
    /// running highlight alone.
    pub fn mark(&mut self, code: &CurrencyCode, direction: Direction, now: Instant) {
        if direction == Direction::Unchanged {
            return;
        }
        self.active.insert(
            code.clone(),
            Highlight {
                direction,
                expires_at: now + self.duration,
            },
        );
    }

    pub fn get(&self, code: &CurrencyCode, now: Instant) -> Option<Direction> {
        self.active
            .get(code)
            .filter(|h| now < h.expires_at)
            .map(|h| h.direction)
    }

    /// Drops every expired highlight.
    pub fn sweep(&mut self, now: Instant) {
        self.active.retain(|_, h| now < h.expires_at);
    }

    /// Earliest pending expiry, if any.
    pub fn next_expiry(&self) -> Option<Instant> {
        self.active.values().map(|h| h.expires_at).min()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}
