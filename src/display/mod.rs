//! Display formatting for terminal output
//!
//! Plain-text tables and detail views. Amounts use the configured currency
//! symbol and dates the configured `strftime` format.

pub mod account;
pub mod reconciliation;
pub mod transaction;

pub use account::{format_account_details, format_account_list};
pub use reconciliation::{
    format_bulk_outcome, format_reconciliation_detail, format_reconciliation_history,
    format_totals,
};
pub use transaction::{format_transaction_details, format_transaction_register};

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;

use crate::config::Settings;
use crate::models::Money;

pub(crate) fn money(amount: Money, settings: &Settings) -> String {
    amount.format_with_symbol(&settings.currency_symbol)
}

/// Format a date, falling back to ISO 8601 when the configured format is invalid
pub(crate) fn date(value: NaiveDate, settings: &Settings) -> String {
    let items = StrftimeItems::new(&settings.date_format);
    if items.clone().any(|item| matches!(item, Item::Error)) {
        return value.to_string();
    }
    value.format_with_items(items).to_string()
}

pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
