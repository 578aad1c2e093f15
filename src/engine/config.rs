// 10.1 config.rs: all settings in one place. fee numerators, auction timeout,
// epoch length, the bootstrap allotment. the subset the admin surface exposes
// has owner-only setters on the engine.

use crate::types::{AccountId, AssetId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/** 10.1.1: fee settings. numerators over a shared denominator, default 1/1000
base leg and 4/1000 round leg. a fixed share of every fee accrues to the market
owner instead of the curve. */
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub fee_denominator: Decimal,
    // fee on the base leg of every swap
    pub base_fee_num: Decimal,
    // fee on the round leg of every swap
    pub round_fee_num: Decimal,
    // surcharge escrowed with every buyout bid
    pub nft_fee_num: Decimal,
    // share of each fee paid to the market owner (0.25 = a quarter)
    pub owner_fee_share: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            fee_denominator: dec!(1000),
            base_fee_num: dec!(1),
            round_fee_num: dec!(4),
            nft_fee_num: dec!(5),
            owner_fee_share: dec!(0.25),
        }
    }
}

impl FeeSchedule {
    pub fn base_fee_rate(&self) -> Decimal {
        self.base_fee_num / self.fee_denominator
    }

    pub fn round_fee_rate(&self) -> Decimal {
        self.round_fee_num / self.fee_denominator
    }

    pub fn base_fee(&self, amount: Decimal) -> Decimal {
        amount * self.base_fee_rate()
    }

    pub fn round_fee(&self, amount: Decimal) -> Decimal {
        amount * self.round_fee_rate()
    }

    pub fn nft_fee(&self, amount: Decimal) -> Decimal {
        amount * self.nft_fee_num / self.fee_denominator
    }
}

// Complete engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    // Account allowed to touch protocol parameters and pools
    pub protocol_owner: AccountId,
    // Asset every reward blend is normalized into
    pub primary_asset: AssetId,
    // Asset minted when rewards are claimed
    pub reward_asset: AssetId,
    pub fees: FeeSchedule,
    // How long a buyout bid stays binding before it can be withdrawn
    pub bid_timeout_ms: i64,
    // Epoch window length in blocks
    pub reward_epoch_blocks: u64,
    // Protocol bootstrap round allotment: the pair-level stake in every
    // reward share ratio
    pub bootstrap_rounds: Decimal,
    // Round quantum stamped onto new listings
    pub round_unit: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            protocol_owner: AccountId(0),
            primary_asset: AssetId::new("USDC"),
            reward_asset: AssetId::new("SPARK"),
            fees: FeeSchedule::default(),
            bid_timeout_ms: 86_400_000, // 24h
            reward_epoch_blocks: 1_000,
            bootstrap_rounds: dec!(10000),
            round_unit: dec!(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fee_rates() {
        let fees = FeeSchedule::default();
        assert_eq!(fees.base_fee(dec!(1000)), dec!(1));
        assert_eq!(fees.round_fee(dec!(1000)), dec!(4));
        assert_eq!(fees.nft_fee(dec!(1000)), dec!(5));
    }
}
