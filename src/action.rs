use std::str::FromStr;

use crate::currency::CurrencyCode;
use crate::error::ActionError;

pub const COMMANDS: &str =
    "base CODE | set ROW AMOUNT | swap ROW | add AMOUNT FROM TO | alert CODE VALUE | unalert CODE";

/// A change the user asks for while the dashboard is up.
///
/// Rows are zero-based here. Typed commands number them from one, the way
/// they are shown on screen.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetBase(CurrencyCode),
    SetInput { row: usize, input: String },
    Swap(usize),
    AddConverter {
        from: CurrencyCode,
        to: CurrencyCode,
        input: String,
    },
    SetAlert { code: CurrencyCode, threshold: String },
    ClearAlert(CurrencyCode),
}

fn parse_row(input: &str) -> Result<usize, ActionError> {
    match input.parse::<usize>() {
        Ok(row) if row > 0 => Ok(row - 1),
        _ => Err(ActionError::InvalidRow(input.to_string())),
    }
}

impl FromStr for Action {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = s.split_whitespace().collect();

        match words.as_slice() {
            ["base", code] => Ok(Action::SetBase(code.parse()?)),
            ["set", row, amount] => Ok(Action::SetInput {
                row: parse_row(row)?,
                input: amount.to_string(),
            }),
            ["swap", row] => Ok(Action::Swap(parse_row(row)?)),
            ["add", amount, from, to] => Ok(Action::AddConverter {
                from: from.parse()?,
                to: to.parse()?,
                input: amount.to_string(),
            }),
            ["alert", code, value] => Ok(Action::SetAlert {
                code: code.parse()?,
                threshold: value.to_string(),
            }),
            ["unalert", code] => Ok(Action::ClearAlert(code.parse()?)),
            _ => Err(ActionError::Unknown(s.trim().to_string(), COMMANDS)),
        }
    }
}
