use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::Duration;

use tokio::time::Instant;

use crate::action::{Action, COMMANDS};
use crate::alert::{AlertBook, TriggeredAlert};
use crate::config::Config;
use crate::convert::{Converter, default_converters};
use crate::currency::{CurrencyCode, currency_name, displayed_codes};
use crate::error::{ActionError, FetchError};
use crate::format::{format_amount, format_rate_result, format_timestamp};
use crate::highlight::Highlights;
use crate::normalize::{NormalizedRateTable, normalize};
use crate::poller::PollEvent;
use crate::rates::RawRateTable;
use crate::trend::{Direction, RateHistory, classify, sparkline};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    Loading,
    Live,
    /// Last fetch failed; the table on screen is from an earlier one.
    Stale(String),
}

#[derive(Debug, Default, PartialEq)]
pub struct Update {
    pub directions: BTreeMap<CurrencyCode, Direction>,
    pub alerts: Vec<TriggeredAlert>,
}

/// Everything the rate screen shows. The normalized table is rebuilt and
/// swapped in whole on every change of rates or base.
pub struct Dashboard {
    base: CurrencyCode,
    codes: Vec<CurrencyCode>,
    raw: Option<RawRateTable>,
    rates: NormalizedRateTable,
    history: RateHistory,
    highlights: Highlights,
    converters: Vec<Converter>,
    alerts: AlertBook,
    status: FeedStatus,
}

impl Dashboard {
    pub fn new(
        base: CurrencyCode,
        codes: Vec<CurrencyCode>,
        highlight_duration: Duration,
        history_len: usize,
    ) -> Self {
        let rates = NormalizedRateTable::empty(base.clone());
        let mut converters = default_converters();
        for converter in &mut converters {
            converter.recompute(&rates);
        }

        Dashboard {
            base,
            codes,
            raw: None,
            rates,
            history: RateHistory::new(history_len),
            highlights: Highlights::new(highlight_duration),
            converters,
            alerts: AlertBook::new(),
            status: FeedStatus::Loading,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.base.clone(),
            displayed_codes(),
            config.highlight_duration,
            config.history_len,
        )
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn rates(&self) -> &NormalizedRateTable {
        &self.rates
    }

    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    pub fn history(&self) -> &RateHistory {
        &self.history
    }

    pub fn highlight(&self, code: &CurrencyCode, now: Instant) -> Option<Direction> {
        self.highlights.get(code, now)
    }

    pub fn converters(&self) -> &[Converter] {
        &self.converters
    }

    pub fn alerts(&self) -> &AlertBook {
        &self.alerts
    }

    pub fn apply_event(&mut self, event: PollEvent, now: Instant) -> Option<Update> {
        match event {
            PollEvent::Rates { table, .. } => self.apply_rates(table, now),
            PollEvent::Failed { error, .. } => {
                self.record_failure(&error);
                None
            }
        }
    }

    /// Takes a freshly fetched table. Returns `None` when the table is older
    /// than the one already shown; the feed still counts as live then.
    pub fn apply_rates(&mut self, raw: RawRateTable, now: Instant) -> Option<Update> {
        self.status = FeedStatus::Live;

        if let (Some(current), Some(incoming)) = (
            self.raw.as_ref().and_then(RawRateTable::timestamp),
            raw.timestamp(),
        ) {
            if incoming < current {
                log::debug!("Ignoring rates from {} older than {}", incoming, current);
                return None;
            }
        }

        let next = normalize(&raw, &self.base, &self.codes);
        let directions = classify(&self.rates, &next);
        for (code, direction) in &directions {
            self.highlights.mark(code, *direction, now);
        }
        self.highlights.sweep(now);
        self.history.record(&next);

        self.raw = Some(raw);
        self.rates = next;
        self.recompute_converters();

        let alerts = self.alerts.check(&self.rates);
        for alert in &alerts {
            log::info!(
                "{} reached {} (alert at {})",
                alert.code,
                alert.rate,
                alert.threshold
            );
        }

        Some(Update { directions, alerts })
    }

    /// Keeps the last table and marks it stale.
    pub fn record_failure(&mut self, error: &FetchError) {
        log::warn!("Keeping last rates: {}", error);
        self.status = FeedStatus::Stale(error.to_string());
    }

    /// Switching base makes old values incomparable, so history and running
    /// highlights start over.
    pub fn set_base(&mut self, base: CurrencyCode) {
        if base == self.base {
            return;
        }
        log::info!("Display base {} -> {}", self.base, base);

        self.base = base;
        self.rates = match &self.raw {
            Some(raw) => normalize(raw, &self.base, &self.codes),
            None => NormalizedRateTable::empty(self.base.clone()),
        };
        self.history.clear();
        self.history.record(&self.rates);
        self.highlights.clear();
        self.recompute_converters();
    }

    pub fn set_converter_input(&mut self, index: usize, input: &str) -> bool {
        match self.converters.get_mut(index) {
            Some(converter) => {
                converter.set_input(input, &self.rates);
                true
            }
            None => false,
        }
    }

    pub fn swap_converter(&mut self, index: usize) -> bool {
        match self.converters.get_mut(index) {
            Some(converter) => {
                converter.swap(&self.rates);
                true
            }
            None => false,
        }
    }

    pub fn add_converter(&mut self, mut converter: Converter) {
        converter.recompute(&self.rates);
        self.converters.push(converter);
    }

    pub fn apply_action(&mut self, action: Action) -> Result<(), ActionError> {
        match action {
            Action::SetBase(base) => self.set_base(base),
            Action::SetInput { row, input } => {
                if !self.set_converter_input(row, &input) {
                    return Err(ActionError::NoSuchRow(row + 1));
                }
            }
            Action::Swap(row) => {
                if !self.swap_converter(row) {
                    return Err(ActionError::NoSuchRow(row + 1));
                }
            }
            Action::AddConverter { from, to, input } => {
                self.add_converter(Converter::new(from, to, input));
            }
            Action::SetAlert { code, threshold } => {
                let threshold = self.alerts.set(code.clone(), &threshold)?;
                log::info!("Alert armed for {} at {}", code, threshold);
            }
            Action::ClearAlert(code) => {
                if self.alerts.remove(&code).is_none() {
                    log::debug!("No alert set for {}", code);
                }
            }
        }
        Ok(())
    }

    fn recompute_converters(&mut self) {
        for converter in &mut self.converters {
            converter.recompute(&self.rates);
        }
    }

    pub fn next_highlight_expiry(&self) -> Option<Instant> {
        self.highlights.next_expiry()
    }

    /// Releases timers and per-code state when the screen goes away.
    pub fn teardown(&mut self) {
        self.highlights.clear();
        self.history.clear();
    }

    pub fn render(&self, now: Instant) -> String {
        let mut out = String::new();

        let status = match &self.status {
            FeedStatus::Loading => "loading rates...".to_string(),
            FeedStatus::Live => "live".to_string(),
            FeedStatus::Stale(reason) => format!("stale: {}", reason),
        };
        let _ = writeln!(
            out,
            "HaremFX  base {}  updated {}  [{}]",
            self.base,
            format_timestamp(self.rates.timestamp()),
            status
        );

        for code in &self.codes {
            let marker = self
                .highlights
                .get(code, now)
                .map_or(" ", Direction::arrow);
            let values = self.history.values(code);
            let _ = writeln!(
                out,
                "{} {:<3} {:<16} {:>12}  {} {}",
                marker,
                code,
                currency_name(code).unwrap_or(""),
                format_rate_result(&self.rates.get(code)),
                sparkline(&values),
                self.history.trend(code).arrow()
            );
        }

        for (row, converter) in self.converters.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}) {} {} = {} {}",
                row + 1,
                converter.input,
                converter.from,
                converter.output_text(),
                converter.to
            );
        }

        if !self.alerts.is_empty() {
            let armed: Vec<String> = self
                .alerts
                .iter()
                .map(|(code, threshold)| format!("{} >= {}", code, format_amount(threshold)))
                .collect();
            let _ = writeln!(out, "alerts: {}", armed.join(", "));
        }
        let _ = writeln!(out, "{}", COMMANDS);

        out
    }
}
