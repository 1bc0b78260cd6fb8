use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::Instant;

use haremfx::action::Action;
use haremfx::client::{OpenExchangeRates, RateRequest, RateSource};
use haremfx::config::Config;
use haremfx::convert::{ConversionResult, convert};
use haremfx::currency::{CurrencyCode, currency_name, displayed_codes, is_display_base};
use haremfx::dashboard::Dashboard;
use haremfx::format::{PLACEHOLDER, format_amount, format_timestamp, quote_line};
use haremfx::normalize::{NormalizedRateTable, normalize};
use haremfx::poller::Poller;

mod options;

use options::{Command, Options};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = Options::from_args();
    let mut config = Config::from_env()?;
    if let Some(base) = options.base {
        config.base = base;
    }
    if !is_display_base(&config.base) {
        log::warn!("{} is not one of the usual display bases", config.base);
    }

    match options.cmd.unwrap_or_else(Command::watch) {
        Command::Watch { alerts, converters } => {
            let dashboard = build_dashboard(&config, alerts.into_iter().chain(converters))?;
            watch(&config, dashboard).await
        }
        Command::Rates { date } => print_rates(&config, date.unwrap_or(RateRequest::Latest)).await,
        Command::Convert { amount, from, to } => convert_once(&config, &amount, &from, &to).await,
    }
}

fn build_dashboard(config: &Config, actions: impl IntoIterator<Item = Action>) -> Result<Dashboard> {
    let mut dashboard = Dashboard::from_config(config);
    for action in actions {
        dashboard.apply_action(action)?;
    }
    Ok(dashboard)
}

fn rate_client(config: &Config) -> Result<OpenExchangeRates> {
    let app_id = config.require_app_id()?;
    Ok(OpenExchangeRates::new(
        &config.api_url,
        app_id,
        config.request_timeout,
    )?)
}

async fn watch(config: &Config, mut dashboard: Dashboard) -> Result<()> {
    let source = Arc::new(rate_client(config)?);
    let (tx, mut rx) = mpsc::channel(16);
    let poller = Poller::new(
        source,
        RateRequest::Latest,
        config.poll_interval,
        config.max_backoff,
    )
    .spawn(tx);

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut reading = true;
    let mut redraw = tokio::time::interval(Duration::from_millis(250));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            event = rx.recv() => match event {
                Some(event) => {
                    if let Some(update) = dashboard.apply_event(event, Instant::now()) {
                        for alert in update.alerts {
                            println!("\x07{} reached the alert value of {}", alert.code, alert.threshold);
                        }
                    }
                    draw(&dashboard);
                }
                None => break,
            },
            line = input.next_line(), if reading => match line {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => {
                    let applied = line
                        .parse::<Action>()
                        .and_then(|action| dashboard.apply_action(action));
                    if let Err(err) = applied {
                        log::warn!("{}", err);
                    }
                    draw(&dashboard);
                }
                Ok(None) => reading = false,
                Err(err) => {
                    log::warn!("Stopped reading commands: {}", err);
                    reading = false;
                }
            },
            _ = redraw.tick() => draw(&dashboard),
        }
    }

    drop(rx);
    poller.shutdown().await;
    dashboard.teardown();
    Ok(())
}

fn draw(dashboard: &Dashboard) {
    print!("\x1b[2J\x1b[H{}", dashboard.render(Instant::now()));
}

async fn fetch_table(config: &Config, request: RateRequest) -> Result<NormalizedRateTable> {
    let client = rate_client(config)?;
    let raw = client.fetch(request).await?;
    Ok(normalize(&raw, &config.base, &displayed_codes()))
}

async fn print_rates(config: &Config, request: RateRequest) -> Result<()> {
    let table = fetch_table(config, request).await?;

    println!("Rate date: {}", format_timestamp(table.timestamp()));
    for code in displayed_codes() {
        let quote = match table.get(&code) {
            Ok(rate) => quote_line(&code, rate, table.base()),
            Err(err) => {
                log::warn!("{}", err);
                format!("1 {} = {} {}", code, PLACEHOLDER, table.base())
            }
        };
        println!("{:<16} {}", currency_name(&code).unwrap_or(""), quote);
    }

    Ok(())
}

async fn convert_once(
    config: &Config,
    amount: &str,
    from: &CurrencyCode,
    to: &CurrencyCode,
) -> Result<()> {
    // Same-currency conversions don't need any rates.
    let table = if from == to {
        NormalizedRateTable::empty(config.base.clone())
    } else {
        fetch_table(config, RateRequest::Latest).await?
    };

    match convert(&table, from, to, amount) {
        ConversionResult::Amount(value) => {
            println!("{} {} = {} {}", amount, from, format_amount(value), to);
            Ok(())
        }
        ConversionResult::Unavailable(reason) => Err(anyhow::anyhow!("{}", reason)),
    }
}
