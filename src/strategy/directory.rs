//! Label-to-account mapping for script replay
//!
//! Scripts refer to accounts by labels of their own choosing. The directory
//! records which `AccountId` the ledger assigned to each label when the
//! account was opened, and resolves later commands to identifiers.

use std::collections::BTreeMap;

use crate::core::Ledger;
use crate::io::BalanceRow;
use crate::types::{
    AccountId, AccountLabel, LedgerCommand, OperationType, ResolvedOperation, ScriptError,
};

/// Script-local directory of opened accounts
///
/// Owned by a single replay driver; it is not shared across threads.
#[derive(Debug, Default)]
pub struct AccountDirectory {
    labels: BTreeMap<AccountLabel, AccountId>,
}

impl AccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier assigned to `label`, if it has been opened
    pub fn get(&self, label: &str) -> Option<AccountId> {
        self.labels.get(label).copied()
    }

    /// Number of opened labels
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn resolve(&self, label: &str) -> Result<AccountId, ScriptError> {
        self.get(label)
            .ok_or_else(|| ScriptError::unknown_account(label))
    }

    /// Apply `open` commands and resolve everything else
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - The command was an `open` and has been applied
    /// * `Ok(Some(op))` - The command resolved to `op`, not yet applied
    /// * `Err(ScriptError::DuplicateAccount)` - `open` on a label already in use
    /// * `Err(ScriptError::UnknownAccount)` - A referenced label was never opened
    pub fn stage(
        &mut self,
        ledger: &dyn Ledger,
        command: LedgerCommand,
    ) -> Result<Option<ResolvedOperation>, ScriptError> {
        let LedgerCommand {
            op,
            account,
            counterparty,
            amount,
        } = command;

        let resolved = match op {
            OperationType::Open => {
                if self.labels.contains_key(&account) {
                    return Err(ScriptError::duplicate_account(&account));
                }
                let id = ledger.create_account(amount)?;
                self.labels.insert(account, id);
                return Ok(None);
            }
            OperationType::Deposit => ResolvedOperation::Deposit {
                id: self.resolve(&account)?,
                amount,
            },
            OperationType::Withdraw => ResolvedOperation::Withdraw {
                id: self.resolve(&account)?,
                amount,
            },
            OperationType::Transfer => {
                let to = counterparty
                    .as_deref()
                    .ok_or_else(|| ScriptError::parse(None, "Transfer requires a counterparty"))?;
                ResolvedOperation::Transfer {
                    from: self.resolve(&account)?,
                    to: self.resolve(to)?,
                    amount,
                }
            }
        };

        Ok(Some(resolved))
    }

    /// Final balance of every opened label, in label order
    pub fn balances(&self, ledger: &dyn Ledger) -> Result<Vec<BalanceRow>, ScriptError> {
        self.labels
            .iter()
            .map(|(label, id)| {
                Ok(BalanceRow {
                    account: label.clone(),
                    balance: ledger.balance(*id)?,
                })
            })
            .collect()
    }
}
