//! CSV format handling for ledger scripts and balance output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to ledger commands
//! - Balance output serialization
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::{LedgerCommand, Money, OperationType, ScriptError};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV record structure for deserialization
///
/// Matches the script format with columns: op, account, counterparty, amount.
/// `counterparty` is only meaningful for transfers.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    pub op: String,
    pub account: String,
    pub counterparty: Option<String>,
    pub amount: Option<String>,
}

/// One row of the balance report
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceRow {
    /// Script label of the account
    pub account: String,

    /// Final balance
    pub balance: Decimal,
}

/// Convert a CsvRecord to a LedgerCommand
///
/// This function:
/// - Parses the op string (case-insensitive) into an OperationType
/// - Parses the amount into a Decimal and validates it into Money
/// - Requires a counterparty for transfers (ignored for other ops)
///
/// # Arguments
///
/// * `csv_record` - The deserialized CSV record
/// * `line` - Line number of the record, for error messages
///
/// # Returns
///
/// * `Ok(LedgerCommand)` - Successfully converted command
/// * `Err(ScriptError::Parse)` - Malformed op, label or amount
/// * `Err(ScriptError::Ledger(InvalidAmount))` - Amount is zero or negative
pub fn convert_csv_record(csv_record: CsvRecord, line: Option<u64>) -> Result<LedgerCommand, ScriptError> {
    let op = match csv_record.op.trim().to_lowercase().as_str() {
        "open" => OperationType::Open,
        "deposit" => OperationType::Deposit,
        "withdraw" | "withdrawal" => OperationType::Withdraw,
        "transfer" => OperationType::Transfer,
        _ => {
            return Err(ScriptError::parse(
                line,
                format!("Invalid operation '{}'", csv_record.op),
            ))
        }
    };

    let account = csv_record.account.trim().to_string();
    if account.is_empty() {
        return Err(ScriptError::parse(line, format!("{:?} requires an account", op)));
    }

    let counterparty = non_empty(csv_record.counterparty);
    if op == OperationType::Transfer && counterparty.is_none() {
        return Err(ScriptError::parse(
            line,
            format!("Transfer from '{}' requires a counterparty", account),
        ));
    }

    let amount = match non_empty(csv_record.amount) {
        Some(amount_str) => Decimal::from_str(&amount_str)
            .map_err(|_| ScriptError::parse(line, format!("Invalid amount '{}'", amount_str)))?,
        None => {
            return Err(ScriptError::parse(
                line,
                format!("{:?} on '{}' requires an amount", op, account),
            ))
        }
    };

    Ok(LedgerCommand {
        op,
        account,
        counterparty: if op == OperationType::Transfer {
            counterparty
        } else {
            None
        },
        amount: Money::new(amount)?,
    })
}

fn non_empty(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Write balances to CSV format
///
/// Writes rows with columns: account, balance, sorted by account label for
/// deterministic output. Balances keep their own decimal scale.
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_balances_csv(rows: &[BalanceRow], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["account", "balance"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_rows = rows.to_vec();
    sorted_rows.sort_by(|a, b| a.account.cmp(&b.account));

    for row in sorted_rows {
        writer
            .write_record([row.account.as_str(), row.balance.to_string().as_str()])
            .map_err(|e| format!("Failed to write balance record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LedgerError;
    use rstest::rstest;

    fn record(op: &str, account: &str, counterparty: Option<&str>, amount: Option<&str>) -> CsvRecord {
        CsvRecord {
            op: op.to_string(),
            account: account.to_string(),
            counterparty: counterparty.map(str::to_string),
            amount: amount.map(str::to_string),
        }
    }

    #[rstest]
    #[case("open", OperationType::Open)]
    #[case("deposit", OperationType::Deposit)]
    #[case("withdraw", OperationType::Withdraw)]
    #[case("withdrawal", OperationType::Withdraw)]
    #[case("DEPOSIT", OperationType::Deposit)] // case insensitive
    fn test_convert_single_account_ops(#[case] op: &str, #[case] expected: OperationType) {
        let command = convert_csv_record(record(op, "alice", None, Some("100.0")), Some(2)).unwrap();

        assert_eq!(command.op, expected);
        assert_eq!(command.account, "alice");
        assert_eq!(command.counterparty, None);
        assert_eq!(command.amount.amount(), Decimal::new(1000, 1));
    }

    #[test]
    fn test_convert_transfer() {
        let command =
            convert_csv_record(record("transfer", "alice", Some("bob"), Some("70")), None).unwrap();

        assert_eq!(command.op, OperationType::Transfer);
        assert_eq!(command.account, "alice");
        assert_eq!(command.counterparty.as_deref(), Some("bob"));
    }

    #[test]
    fn test_convert_ignores_counterparty_for_non_transfer() {
        let command =
            convert_csv_record(record("deposit", "alice", Some("bob"), Some("1")), None).unwrap();
        assert_eq!(command.counterparty, None);
    }

    #[rstest]
    #[case::invalid_op(record("borrow", "alice", None, Some("1")), "Invalid operation")]
    #[case::missing_account(record("deposit", "  ", None, Some("1")), "requires an account")]
    #[case::missing_counterparty(record("transfer", "alice", None, Some("1")), "requires a counterparty")]
    #[case::blank_counterparty(record("transfer", "alice", Some(" "), Some("1")), "requires a counterparty")]
    #[case::missing_amount(record("deposit", "alice", None, None), "requires an amount")]
    #[case::empty_amount(record("open", "alice", None, Some("")), "requires an amount")]
    #[case::invalid_amount(record("deposit", "alice", None, Some("ten")), "Invalid amount")]
    fn test_convert_parse_errors(#[case] csv_record: CsvRecord, #[case] expected: &str) {
        let error = convert_csv_record(csv_record, Some(3)).unwrap_err();

        assert!(matches!(error, ScriptError::Parse { line: Some(3), .. }));
        assert!(error.to_string().contains(expected), "{}", error);
    }

    #[rstest]
    #[case::zero("0", Decimal::ZERO)]
    #[case::negative("-5.5", Decimal::new(-55, 1))]
    fn test_convert_non_positive_amount(#[case] amount: &str, #[case] expected: Decimal) {
        let error = convert_csv_record(record("deposit", "alice", None, Some(amount)), None).unwrap_err();

        assert_eq!(error, ScriptError::Ledger(LedgerError::InvalidAmount { amount: expected }));
    }

    #[rstest]
    #[case("  100.0  ", Decimal::new(1000, 1))] // whitespace trimming
    #[case("100.1234", Decimal::new(1001234, 4))]
    fn test_convert_amount_parsing(#[case] amount: &str, #[case] expected: Decimal) {
        let command = convert_csv_record(record("deposit", "a", None, Some(amount)), None).unwrap();
        assert_eq!(command.amount.amount(), expected);
    }

    #[rstest]
    #[case::sorted_by_label(
        vec![
            BalanceRow { account: "carol".to_string(), balance: Decimal::new(5, 0) },
            BalanceRow { account: "alice".to_string(), balance: Decimal::new(13000, 2) },
        ],
        "account,balance\nalice,130.00\ncarol,5\n"
    )]
    #[case::zero_balance(
        vec![BalanceRow { account: "bob".to_string(), balance: Decimal::ZERO }],
        "account,balance\nbob,0\n"
    )]
    #[case::empty(vec![], "account,balance\n")]
    fn test_write_balances_csv(#[case] rows: Vec<BalanceRow>, #[case] expected: &str) {
        let mut output = Vec::new();
        write_balances_csv(&rows, &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), expected);
    }
}
