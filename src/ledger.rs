// 7.0 ledger.rs: MOCKED. the real base-asset and item ledgers are external
// collaborators; this is just balance maps so settlement flows are explicit
// and solvency is testable. no allowances, no real token transfers.

use crate::types::{AccountId, AssetId, ItemKey, MarketId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// who can hold base-asset balances. vaults back curve reserves, escrows back
// live bids, the treasury collects protocol fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Holder {
    Account(AccountId),
    MarketVault(MarketId),
    Escrow(MarketId),
    Treasury,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Decimal, need: Decimal },

    #[error("item {0} is not registered")]
    ItemNotFound(ItemKey),

    #[error("caller does not own item {0}")]
    NotItemOwner(ItemKey),
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BaseLedger {
    balances: HashMap<(AssetId, Holder), Decimal>,
}

impl BaseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, asset: &AssetId, holder: Holder) -> Decimal {
        self.balances
            .get(&(asset.clone(), holder))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    // unconditional credit. used for sim funding and reward emission.
    pub fn mint(&mut self, asset: &AssetId, to: Holder, amount: Decimal) {
        if amount.is_zero() {
            return;
        }
        *self
            .balances
            .entry((asset.clone(), to))
            .or_insert(Decimal::ZERO) += amount;
    }

    pub fn transfer(
        &mut self,
        asset: &AssetId,
        from: Holder,
        to: Holder,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Ok(());
        }
        let have = self.balance_of(asset, from);
        if have < amount {
            return Err(LedgerError::InsufficientBalance { have, need: amount });
        }
        self.balances.insert((asset.clone(), from), have - amount);
        *self
            .balances
            .entry((asset.clone(), to))
            .or_insert(Decimal::ZERO) += amount;
        Ok(())
    }
}

// which side of the protocol boundary an item sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemHolder {
    Account(AccountId),
    /// Held in custody by a market while it is listed.
    Market(MarketId),
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ItemLedger {
    owners: HashMap<ItemKey, ItemHolder>,
}

impl ItemLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // sim setup: conjure an item into an account's wallet.
    pub fn register(&mut self, item: ItemKey, owner: AccountId) {
        self.owners.insert(item, ItemHolder::Account(owner));
    }

    pub fn owner_of(&self, item: &ItemKey) -> Option<ItemHolder> {
        self.owners.get(item).copied()
    }

    pub fn ensure_account_owns(&self, item: &ItemKey, account: AccountId) -> Result<(), LedgerError> {
        match self.owner_of(item) {
            None => Err(LedgerError::ItemNotFound(item.clone())),
            Some(ItemHolder::Account(a)) if a == account => Ok(()),
            Some(_) => Err(LedgerError::NotItemOwner(item.clone())),
        }
    }

    pub fn transfer(&mut self, item: &ItemKey, to: ItemHolder) -> Result<(), LedgerError> {
        if !self.owners.contains_key(item) {
            return Err(LedgerError::ItemNotFound(item.clone()));
        }
        self.owners.insert(item.clone(), to);
        Ok(())
    }
}
