// 4.0: liquidity-mining distribution. per-base-asset pools plus per-window
// accumulators that are checkpointed lazily, only ever as a side effect of a
// trade. no timers, no scheduler: if nobody trades, no window closes. 4.1 has
// the reward formula, 4.2 the checkpoint step.

use crate::types::BlockNumber;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RewardError {
    #[error("distribution pool already exists for this asset")]
    PoolAlreadyExists,

    #[error("no distribution pool for this asset")]
    PoolNotFound,

    #[error("reward parameter must be non-zero")]
    ZeroRewardParameter,

    #[error("no price-bridge route to the primary asset")]
    MissingPriceRoute,

    #[error("nothing to claim")]
    NothingToClaim,
}

// one per base asset, created once by the protocol owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionPool {
    /// Reward scale. Larger divisor, smaller emissions. Doubled by halvings.
    pub reward_rate_divisor: Decimal,
    /// Flat bonus credited to whichever trade fires a trader checkpoint.
    pub gas_reward: Decimal,
}

impl DistributionPool {
    pub fn new(reward_rate_divisor: Decimal, gas_reward: Decimal) -> Result<Self, RewardError> {
        if reward_rate_divisor.is_zero() {
            return Err(RewardError::ZeroRewardParameter);
        }
        Ok(Self {
            reward_rate_divisor,
            gas_reward,
        })
    }

    pub fn halve(&mut self) {
        self.reward_rate_divisor *= Decimal::TWO;
    }
}

// 4.0.1: one accumulator window. the pair keeps one of these, and every trader
// keeps one per market. `accrued` is the claimable balance; it only grows when
// a window closes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochState {
    pub checkpoint_block: BlockNumber,
    /// Lowest base reserve observed since the checkpoint.
    pub min_reserve: Decimal,
    /// Lowest tracked round holding since the checkpoint. For the pair this is
    /// pinned to the bootstrap allotment; for a trader it is their balance.
    pub min_holding: Decimal,
    /// Sum of base-flow magnitudes since the checkpoint.
    pub volume: Decimal,
    pub accrued: Decimal,
}

impl EpochState {
    pub fn new(block: BlockNumber, reserve: Decimal, holding: Decimal) -> Self {
        Self {
            checkpoint_block: block,
            min_reserve: reserve,
            min_holding: holding,
            volume: Decimal::ZERO,
            accrued: Decimal::ZERO,
        }
    }
}

// inputs that do not live in the window itself.
#[derive(Debug, Clone, Copy)]
pub struct RewardTerms {
    /// Protocol bootstrap round allotment; denominates every share ratio.
    pub bootstrap: Decimal,
    /// Pair's total rounds minted at window close.
    pub total_minted: Decimal,
    /// Exchange ratio into the primary asset. 1 for the primary itself.
    pub bridge_ratio: Decimal,
    pub divisor: Decimal,
    /// Per-pair extra multiplier, default 1.
    pub multiplier: Decimal,
}

// 4.1: reward for one closed window. price-normalized blend of the window's
// minimum reserve and volume, scaled by the entity's share of rounds.
pub fn window_reward(state: &EpochState, terms: &RewardTerms) -> Decimal {
    let share_denominator = terms.bootstrap + terms.total_minted;
    if share_denominator.is_zero() || terms.divisor.is_zero() {
        return Decimal::ZERO;
    }
    let blend = (state.min_reserve + state.volume) * terms.bridge_ratio;
    blend * state.min_holding / share_denominator / terms.divisor * terms.multiplier
}

// 4.2: the checkpoint step, run inside every swap for both the pair window and
// the trader window. returns the successor state plus the finalized reward, if
// any. the checkpoint block only ever advances by whole epochs.
pub fn maybe_checkpoint(
    state: &EpochState,
    now: BlockNumber,
    epoch_blocks: u64,
    post_reserve: Decimal,
    post_holding: Decimal,
    flow: Decimal,
    terms: &RewardTerms,
) -> (EpochState, Option<Decimal>) {
    let elapsed = now.elapsed_since(state.checkpoint_block);

    if epoch_blocks > 0 && elapsed >= epoch_blocks {
        let reward = window_reward(state, terms);
        let whole_epochs = elapsed / epoch_blocks;
        let next = EpochState {
            checkpoint_block: state.checkpoint_block.advance(whole_epochs * epoch_blocks),
            min_reserve: post_reserve,
            min_holding: post_holding,
            volume: Decimal::ZERO,
            accrued: state.accrued + reward,
        };
        (next, Some(reward))
    } else {
        let next = EpochState {
            checkpoint_block: state.checkpoint_block,
            min_reserve: state.min_reserve.min(post_reserve),
            min_holding: state.min_holding.min(post_holding),
            volume: state.volume + flow.abs(),
            accrued: state.accrued,
        };
        (next, None)
    }
}
