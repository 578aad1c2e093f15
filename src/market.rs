//! Market instance state.
//!
//! One `MarketState` is one fractional trading market for one version of one
//! underlying item: the curve reserves, the round balances it has minted, the
//! two buyout auction books, and the reward accumulator windows. The record is
//! created by listing, mutated by every swap/bid/accept, and permanently
//! frozen by delisting or an item buyout.

use crate::auction::{AuctionBook, BidKind};
use crate::curve;
use crate::rewards::EpochState;
use crate::types::{AccountId, AssetId, BlockNumber, ItemKey, MarketId, Version};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Immutable listing facts, fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketInfo {
    pub id: MarketId,
    pub item: ItemKey,
    pub version: Version,
    pub base_asset: AssetId,
    /// Hash of the off-chain listing description.
    pub description_hash: String,
    pub tags: Vec<String>,
    /// Smallest permitted round increment, frozen at listing.
    pub round_unit: Decimal,
}

/// Mutable market record. Everything a swap, bid, accept or checkpoint touches
/// lives here so each operation is one read-modify-write of one record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketState {
    pub info: MarketInfo,
    /// Holder of the market's ownership token.
    pub owner: AccountId,
    pub round_reserve: Decimal,
    pub base_reserve: Decimal,
    /// Net rounds minted to holders since listing (mints minus burns).
    pub total_rounds_minted: Decimal,
    pub alive: bool,
    pub round_balances: HashMap<AccountId, Decimal>,
    pub item_auction: AuctionBook,
    pub ownership_auction: AuctionBook,
    pub pair_epoch: EpochState,
    pub trader_epochs: HashMap<AccountId, EpochState>,
    /// Owner-configurable per-pair reward multiplier, default 1.
    pub reward_multiplier: Decimal,
}

impl MarketState {
    pub fn new(
        info: MarketInfo,
        owner: AccountId,
        round_reserve: Decimal,
        base_reserve: Decimal,
        bootstrap: Decimal,
        listed_at: BlockNumber,
    ) -> Self {
        let pair_epoch = EpochState::new(listed_at, base_reserve, bootstrap);
        Self {
            info,
            owner,
            round_reserve,
            base_reserve,
            total_rounds_minted: Decimal::ZERO,
            alive: true,
            round_balances: HashMap::new(),
            item_auction: AuctionBook::new(),
            ownership_auction: AuctionBook::new(),
            pair_epoch,
            trader_epochs: HashMap::new(),
            reward_multiplier: Decimal::ONE,
        }
    }

    pub fn auction(&self, kind: BidKind) -> &AuctionBook {
        match kind {
            BidKind::Item => &self.item_auction,
            BidKind::Ownership => &self.ownership_auction,
        }
    }

    pub fn auction_mut(&mut self, kind: BidKind) -> &mut AuctionBook {
        match kind {
            BidKind::Item => &mut self.item_auction,
            BidKind::Ownership => &mut self.ownership_auction,
        }
    }

    pub fn round_balance(&self, account: AccountId) -> Decimal {
        self.round_balances
            .get(&account)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Mint rounds to a holder. Amounts arrive pre-quantized.
    pub fn credit_rounds(&mut self, account: AccountId, amount: Decimal) {
        if amount.is_zero() {
            return;
        }
        *self.round_balances.entry(account).or_insert(Decimal::ZERO) += amount;
        self.total_rounds_minted += amount;
    }

    /// Burn rounds from a holder. The caller has already checked the balance.
    pub fn debit_rounds(&mut self, account: AccountId, amount: Decimal) -> Result<(), MarketError> {
        let balance = self.round_balance(account);
        if balance < amount {
            return Err(MarketError::InsufficientRounds {
                have: balance,
                need: amount,
            });
        }
        let remaining = balance - amount;
        if remaining.is_zero() {
            self.round_balances.remove(&account);
        } else {
            self.round_balances.insert(account, remaining);
        }
        self.total_rounds_minted -= amount;
        Ok(())
    }

    /// Marginal round price implied by the reserves.
    pub fn spot_price(&self) -> Decimal {
        curve::spot_price(self.round_reserve, self.base_reserve)
    }

    /// Live full-buyout quote for a bid kind. Continuous in the reserves, so
    /// every swap can flip outstanding bid validity.
    pub fn buyout_quote(&self, kind: BidKind) -> Decimal {
        match kind {
            BidKind::Item => self.base_reserve + self.spot_price() * self.total_rounds_minted,
            BidKind::Ownership => self.base_reserve * Decimal::TWO,
        }
    }

    /// A user-supplied round amount must be positive and an exact multiple of
    /// the round unit.
    pub fn validate_rounds(&self, amount: Decimal) -> Result<(), MarketError> {
        if amount <= Decimal::ZERO {
            return Err(MarketError::ZeroAmount);
        }
        if !curve::is_quantized(amount, self.info.round_unit) {
            return Err(MarketError::NotQuantized {
                amount,
                unit: self.info.round_unit,
            });
        }
        Ok(())
    }

    pub fn ensure_alive(&self) -> Result<(), MarketError> {
        if !self.alive {
            return Err(MarketError::NotAlive(self.info.id));
        }
        Ok(())
    }

    /// Freeze the record after dissolution or item-buyout settlement.
    pub fn freeze(&mut self) {
        self.alive = false;
        self.round_reserve = Decimal::ZERO;
        self.base_reserve = Decimal::ZERO;
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum MarketError {
    #[error("market {0:?} is no longer alive")]
    NotAlive(MarketId),

    #[error("market {0:?} is not the current version for its item")]
    StaleVersion(MarketId),

    #[error("amount {amount} is not a multiple of the round unit {unit}")]
    NotQuantized { amount: Decimal, unit: Decimal },

    #[error("amount must be strictly positive")]
    ZeroAmount,

    #[error("insufficient rounds: have {have}, need {need}")]
    InsufficientRounds { have: Decimal, need: Decimal },
}
