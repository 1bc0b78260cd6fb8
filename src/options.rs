use structopt::StructOpt;

use haremfx::action::Action;
use haremfx::client::RateRequest;
use haremfx::convert::parse_amount;
use haremfx::currency::CurrencyCode;

#[derive(StructOpt, Debug, PartialEq)]
#[structopt(name = "haremfx", about = "Live exchange rates and currency conversion")]
pub struct Options {
    /// Display base, overrides HAREMFX_BASE
    #[structopt(short = "b", long = "base")]
    pub base: Option<CurrencyCode>,
    /// Commands available, `watch` when omitted
    #[structopt(subcommand)]
    pub cmd: Option<Command>,
}

impl Options {
    pub fn from_args() -> Self {
        StructOpt::from_args()
    }
}

#[derive(StructOpt, Debug, PartialEq)]
pub enum Command {
    /// Live rate dashboard; reads commands such as `swap 1` from stdin
    Watch {
        /// One-shot alert as CODE=VALUE, e.g. USD=31
        #[structopt(long = "alert", parse(try_from_str = parse_alert))]
        alerts: Vec<Action>,
        /// Extra converter row as AMOUNT:FROM:TO, e.g. 10:EUR:USD
        #[structopt(long = "convert", parse(try_from_str = parse_converter))]
        converters: Vec<Action>,
    },
    /// Print the latest rate table, or the one for a past day (YYYY-MM-DD)
    Rates {
        #[structopt(parse(try_from_str = RateRequest::parse_date))]
        date: Option<RateRequest>,
    },
    /// Convert an amount once with the latest rates
    Convert {
        #[structopt(allow_hyphen_values = true)]
        amount: String,
        from: CurrencyCode,
        to: CurrencyCode,
    },
}

impl Command {
    pub fn watch() -> Self {
        Command::Watch {
            alerts: Vec::new(),
            converters: Vec::new(),
        }
    }
}

fn parse_alert(s: &str) -> anyhow::Result<Action> {
    let (code, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("expected CODE=VALUE, got {:?}", s))?;
    parse_amount(value)?;

    Ok(Action::SetAlert {
        code: code.parse()?,
        threshold: value.to_string(),
    })
}

fn parse_converter(s: &str) -> anyhow::Result<Action> {
    let parts: Vec<&str> = s.split(':').collect();
    match parts.as_slice() {
        [amount, from, to] => Ok(Action::AddConverter {
            from: from.parse()?,
            to: to.parse()?,
            input: amount.to_string(),
        }),
        _ => anyhow::bail!("expected AMOUNT:FROM:TO, got {:?}", s),
    }
}
