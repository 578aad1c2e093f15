// 10.5 engine/rewards.rs: distribution pools, the checkpoint feed that every
// swap runs through, and claiming. rewards are minted in the protocol reward
// asset so pool capital and emissions stay independent.

use super::core::Engine;
use super::results::EngineError;
use crate::events::{
    EpochCheckpointedEvent, EpochScope, EventPayload, PoolCreatedEvent, RewardClaimedEvent,
    RewardsHalvedEvent,
};
use crate::ledger::Holder;
use crate::rewards::{maybe_checkpoint, DistributionPool, EpochState, RewardError, RewardTerms};
use crate::types::{AccountId, AssetId, MarketId};
use rust_decimal::Decimal;

impl Engine {
    // pool administration

    /// Create the distribution pool for a base asset. One pool per asset, and
    /// a non-primary asset must already have a bridge route to the primary:
    /// a missing route is a configuration-time error, never a trade-time one.
    pub fn create_pool(
        &mut self,
        caller: AccountId,
        asset: AssetId,
        reward_rate_divisor: Decimal,
        gas_reward: Decimal,
    ) -> Result<(), EngineError> {
        if caller != self.config.protocol_owner {
            return Err(EngineError::NotProtocolOwner);
        }
        if self.pools.contains_key(&asset) {
            return Err(RewardError::PoolAlreadyExists.into());
        }
        if !self.bridge.has_route(&asset, &self.config.primary_asset) {
            return Err(RewardError::MissingPriceRoute.into());
        }
        let pool = DistributionPool::new(reward_rate_divisor, gas_reward)?;
        self.pools.insert(asset.clone(), pool);

        self.emit_event(EventPayload::PoolCreated(PoolCreatedEvent {
            asset,
            reward_rate_divisor,
            gas_reward,
        }));
        Ok(())
    }

    pub fn set_pool_divisor(
        &mut self,
        caller: AccountId,
        asset: &AssetId,
        divisor: Decimal,
    ) -> Result<(), EngineError> {
        if caller != self.config.protocol_owner {
            return Err(EngineError::NotProtocolOwner);
        }
        if divisor.is_zero() {
            return Err(RewardError::ZeroRewardParameter.into());
        }
        let pool = self
            .pools
            .get_mut(asset)
            .ok_or(RewardError::PoolNotFound)?;
        pool.reward_rate_divisor = divisor;
        Ok(())
    }

    pub fn set_pool_gas_reward(
        &mut self,
        caller: AccountId,
        asset: &AssetId,
        gas_reward: Decimal,
    ) -> Result<(), EngineError> {
        if caller != self.config.protocol_owner {
            return Err(EngineError::NotProtocolOwner);
        }
        let pool = self
            .pools
            .get_mut(asset)
            .ok_or(RewardError::PoolNotFound)?;
        pool.gas_reward = gas_reward;
        Ok(())
    }

    /// Double every pool's divisor at once.
    pub fn halve_rewards(&mut self, caller: AccountId) -> Result<(), EngineError> {
        if caller != self.config.protocol_owner {
            return Err(EngineError::NotProtocolOwner);
        }
        for pool in self.pools.values_mut() {
            pool.halve();
        }
        let pools = self.pools.len();
        self.emit_event(EventPayload::RewardsHalved(RewardsHalvedEvent { pools }));
        Ok(())
    }

    /// Per-pair extra reward multiplier, default 1.
    pub fn set_reward_multiplier(
        &mut self,
        caller: AccountId,
        market_id: MarketId,
        multiplier: Decimal,
    ) -> Result<(), EngineError> {
        if caller != self.config.protocol_owner {
            return Err(EngineError::NotProtocolOwner);
        }
        if multiplier <= Decimal::ZERO {
            return Err(RewardError::ZeroRewardParameter.into());
        }
        self.market_mut(market_id)?.reward_multiplier = multiplier;
        Ok(())
    }

    pub fn get_pool(&self, asset: &AssetId) -> Option<&DistributionPool> {
        self.pools.get(asset)
    }

    // claimable getters. rewards only move on the first trade past an epoch
    // boundary, so these are stable across any number of intra-epoch swaps.

    pub fn claimable_pair_reward(&self, market_id: MarketId) -> Decimal {
        self.registry
            .get(market_id)
            .map(|m| m.pair_epoch.accrued)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn claimable_trader_reward(&self, market_id: MarketId, trader: AccountId) -> Decimal {
        self.registry
            .get(market_id)
            .and_then(|m| m.trader_epochs.get(&trader))
            .map(|e| e.accrued)
            .unwrap_or(Decimal::ZERO)
    }

    /// Claim the pair-level accrual. Market-owner-only; works on dead markets
    /// because the balance is historical.
    pub fn claim_pair_reward(
        &mut self,
        caller: AccountId,
        market_id: MarketId,
    ) -> Result<Decimal, EngineError> {
        let amount = {
            let market = self.market(market_id)?;
            if caller != market.owner {
                return Err(EngineError::NotMarketOwner(market_id));
            }
            market.pair_epoch.accrued
        };
        if amount.is_zero() {
            return Err(RewardError::NothingToClaim.into());
        }

        self.market_mut(market_id)?.pair_epoch.accrued = Decimal::ZERO;
        let reward_asset = self.config.reward_asset.clone();
        self.base_ledger
            .mint(&reward_asset, Holder::Account(caller), amount);

        self.emit_event(EventPayload::RewardClaimed(RewardClaimedEvent {
            market_id,
            scope: EpochScope::Pair,
            claimer: caller,
            amount,
        }));
        Ok(amount)
    }

    /// Claim the caller's trader-level accrual for one market.
    pub fn claim_trader_reward(
        &mut self,
        caller: AccountId,
        market_id: MarketId,
    ) -> Result<Decimal, EngineError> {
        let amount = {
            let market = self.market(market_id)?;
            market
                .trader_epochs
                .get(&caller)
                .map(|e| e.accrued)
                .unwrap_or(Decimal::ZERO)
        };
        if amount.is_zero() {
            return Err(RewardError::NothingToClaim.into());
        }

        let market = self.market_mut(market_id)?;
        if let Some(epoch) = market.trader_epochs.get_mut(&caller) {
            epoch.accrued = Decimal::ZERO;
        }
        let reward_asset = self.config.reward_asset.clone();
        self.base_ledger
            .mint(&reward_asset, Holder::Account(caller), amount);

        self.emit_event(EventPayload::RewardClaimed(RewardClaimedEvent {
            market_id,
            scope: EpochScope::Trader(caller),
            claimer: caller,
            amount,
        }));
        Ok(amount)
    }

    // 10.5.1: the accumulator feed. runs inside every swap, after reserves and
    // balances have settled, once for the pair window and once for the
    // trader's window. returns the finalized deltas for the swap result.
    pub(super) fn apply_reward_accumulators(
        &mut self,
        market_id: MarketId,
        trader: AccountId,
        flow: Decimal,
    ) -> Result<(Option<Decimal>, Option<Decimal>), EngineError> {
        let epoch_blocks = self.config.reward_epoch_blocks;
        let now = self.current_block;
        let bootstrap = self.config.bootstrap_rounds;

        let (asset, post_reserve, post_balance, total_minted, multiplier) = {
            let market = self.market(market_id)?;
            (
                market.info.base_asset.clone(),
                market.base_reserve,
                market.round_balance(trader),
                market.total_rounds_minted,
                market.reward_multiplier,
            )
        };

        let pool = self.pools.get(&asset).ok_or(RewardError::PoolNotFound)?;
        let gas_reward = pool.gas_reward;
        // route existence was enforced when the pool was created
        let bridge_ratio = self
            .bridge
            .ratio(&asset, &self.config.primary_asset)
            .unwrap_or(Decimal::ONE);
        let terms = RewardTerms {
            bootstrap,
            total_minted,
            bridge_ratio,
            divisor: pool.reward_rate_divisor,
            multiplier,
        };

        // pair window: the tracked holding is pinned to the bootstrap allotment
        let (next_pair, pair_reward) = {
            let market = self.market(market_id)?;
            maybe_checkpoint(
                &market.pair_epoch,
                now,
                epoch_blocks,
                post_reserve,
                bootstrap,
                flow,
                &terms,
            )
        };

        // trader window: anchored at their first trade on this market
        let (next_trader, trader_reward) = {
            let market = self.market(market_id)?;
            let state = market
                .trader_epochs
                .get(&trader)
                .cloned()
                .unwrap_or_else(|| EpochState::new(now, post_reserve, post_balance));
            maybe_checkpoint(
                &state,
                now,
                epoch_blocks,
                post_reserve,
                post_balance,
                flow,
                &terms,
            )
        };

        // the flat gas bonus goes to the trade that fired the checkpoint
        let mut next_trader = next_trader;
        let trader_reward = trader_reward.map(|window| {
            next_trader.accrued += gas_reward;
            window + gas_reward
        });

        let pair_checkpoint = next_pair.checkpoint_block;
        {
            let market = self.market_mut(market_id)?;
            market.pair_epoch = next_pair;
            market.trader_epochs.insert(trader, next_trader);
        }

        if let Some(reward) = pair_reward {
            self.emit_event(EventPayload::EpochCheckpointed(EpochCheckpointedEvent {
                market_id,
                scope: EpochScope::Pair,
                checkpoint_block: pair_checkpoint,
                reward,
            }));
        }
        if let Some(reward) = trader_reward {
            self.emit_event(EventPayload::EpochCheckpointed(EpochCheckpointedEvent {
                market_id,
                scope: EpochScope::Trader(trader),
                checkpoint_block: now,
                reward,
            }));
        }

        Ok((pair_reward, trader_reward))
    }
}
