//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod account;
pub mod audit;
pub mod reconcile;
pub mod transaction;

pub use account::{handle_account_command, AccountCommands};
pub use audit::{handle_audit_command, AuditArgs};
pub use reconcile::{handle_reconcile_command, ReconcileCommands};
pub use transaction::{handle_transaction_command, TransactionCommands};

use chrono::{Local, NaiveDate};

use crate::error::{RecError, RecResult};
use crate::models::Money;

/// Parse a `YYYY-MM-DD` date argument
pub(crate) fn parse_date(input: &str) -> RecResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        RecError::Validation(format!(
            "Invalid date: '{}'. Use YYYY-MM-DD format.",
            input
        ))
    })
}

pub(crate) fn parse_date_or_today(input: Option<&str>) -> RecResult<NaiveDate> {
    match input {
        Some(s) => parse_date(s),
        None => Ok(Local::now().date_naive()),
    }
}

/// Parse an amount argument such as "1234.56" or "-$12"
pub(crate) fn parse_money(input: &str) -> RecResult<Money> {
    Money::parse(input).map_err(|e| {
        RecError::Validation(format!(
            "Invalid amount: '{}'. Use format like '1234.56'. Error: {}",
            input, e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2025-01-31").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
        );
        assert!(parse_date("01/31/2025").unwrap_err().is_validation());
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money("1,234.56").unwrap(), Money::from_cents(123456));
        assert!(parse_money("abc").unwrap_err().is_validation());
    }
}
