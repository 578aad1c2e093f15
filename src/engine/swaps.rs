// 10.3 engine/swaps.rs: the four swap entry points plus their pure quote
// counterparts. every mutating call follows the same ladder: deadline, live
// market, quantization, plan the whole trade against a snapshot, check the
// one-sided bound, then settle ledger and reserves as one step and feed the
// reward accumulators.

use super::core::Engine;
use super::results::{EngineError, SwapResult};
use crate::curve;
use crate::events::{EventPayload, SwapDirection, SwapEvent};
use crate::ledger::Holder;
use crate::market::{MarketError, MarketState};
use crate::types::{AccountId, MarketId, Timestamp};
use rust_decimal::Decimal;

// one fully-priced trade, computed before anything mutates.
#[derive(Debug, Clone)]
struct SwapPlan {
    direction: SwapDirection,
    /// Rounds credited to (buy) or debited from (sell) the trader.
    rounds_trader: Decimal,
    /// Owner's cut of the round-leg fee, minted to their balance.
    rounds_owner_fee: Decimal,
    /// Base the trader pays (buy) or receives (sell), fee-inclusive.
    base_trader: Decimal,
    /// Owner's cut of the base-leg fee.
    base_owner_fee: Decimal,
    /// Base moving into (buy) or out of (sell) the market vault. The reserve
    /// update and the ledger transfer both use this one figure so the vault
    /// and the reserve can never drift apart.
    base_vault_delta: Decimal,
    base_fee_total: Decimal,
    round_fee_total: Decimal,
    new_round_reserve: Decimal,
    new_base_reserve: Decimal,
}

// 10.3.1: buy-side planning. `rounds_gross` is what the curve prices; the
// trader nets that minus the round-leg fee, and the curve keeps the fee share
// the owner does not take.
fn plan_buy_exact_rounds(
    market: &MarketState,
    fees: &super::config::FeeSchedule,
    rounds_gross: Decimal,
) -> Result<SwapPlan, EngineError> {
    let unit = market.info.round_unit;
    let cost = curve::base_in_for_rounds_out(market.round_reserve, market.base_reserve, rounds_gross)?;

    let base_fee = fees.base_fee(cost);
    let base_owner = base_fee * fees.owner_fee_share;
    let base_curve = base_fee - base_owner;

    let round_fee = curve::quantize_down(fees.round_fee(rounds_gross), unit);
    let round_owner = curve::quantize_down(round_fee * fees.owner_fee_share, unit);
    let rounds_trader = rounds_gross - round_fee;

    if rounds_trader <= Decimal::ZERO {
        return Err(MarketError::ZeroAmount.into());
    }

    let vault_in = cost + base_curve;
    Ok(SwapPlan {
        direction: SwapDirection::Buy,
        rounds_trader,
        rounds_owner_fee: round_owner,
        base_trader: cost + base_fee,
        base_owner_fee: base_owner,
        base_vault_delta: vault_in,
        base_fee_total: base_fee,
        round_fee_total: round_fee,
        // only the trader's and owner's rounds actually leave the curve
        new_round_reserve: market.round_reserve - rounds_trader - round_owner,
        new_base_reserve: market.base_reserve + vault_in,
    })
}

fn plan_buy_exact_base(
    market: &MarketState,
    fees: &super::config::FeeSchedule,
    base_in: Decimal,
) -> Result<SwapPlan, EngineError> {
    if base_in <= Decimal::ZERO {
        return Err(MarketError::ZeroAmount.into());
    }
    let unit = market.info.round_unit;

    // the trader pays exactly base_in; the pricing leg is what remains after
    // the base fee is peeled off
    let net = base_in / (Decimal::ONE + fees.base_fee_rate());
    let base_fee = base_in - net;
    let base_owner = base_fee * fees.owner_fee_share;
    let base_curve = base_fee - base_owner;

    let rounds_raw = curve::rounds_out_for_base_in(market.round_reserve, market.base_reserve, net)?;
    let rounds_gross = curve::quantize_down(rounds_raw, unit);
    if rounds_gross <= Decimal::ZERO {
        return Err(MarketError::ZeroAmount.into());
    }

    let round_fee = curve::quantize_down(fees.round_fee(rounds_gross), unit);
    let round_owner = curve::quantize_down(round_fee * fees.owner_fee_share, unit);
    let rounds_trader = rounds_gross - round_fee;
    if rounds_trader <= Decimal::ZERO {
        return Err(MarketError::ZeroAmount.into());
    }

    let vault_in = net + base_curve;
    Ok(SwapPlan {
        direction: SwapDirection::Buy,
        rounds_trader,
        rounds_owner_fee: round_owner,
        base_trader: base_in,
        base_owner_fee: base_owner,
        base_vault_delta: vault_in,
        base_fee_total: base_fee,
        round_fee_total: round_fee,
        new_round_reserve: market.round_reserve - rounds_trader - round_owner,
        new_base_reserve: market.base_reserve + vault_in,
    })
}

// 10.3.2: sell-side planning. the round fee is peeled off before pricing, so
// only the net rounds push the price down.
fn plan_sell_exact_rounds(
    market: &MarketState,
    fees: &super::config::FeeSchedule,
    rounds_in: Decimal,
) -> Result<SwapPlan, EngineError> {
    let unit = market.info.round_unit;

    let round_fee = curve::quantize_down(fees.round_fee(rounds_in), unit);
    let round_owner = curve::quantize_down(round_fee * fees.owner_fee_share, unit);
    let net_rounds = rounds_in - round_fee;
    if net_rounds <= Decimal::ZERO {
        return Err(MarketError::ZeroAmount.into());
    }

    let gross_out = curve::base_out_for_rounds_in(market.round_reserve, market.base_reserve, net_rounds)?;
    let base_fee = fees.base_fee(gross_out);
    let base_owner = base_fee * fees.owner_fee_share;
    let payout = gross_out - base_fee;

    let vault_out = payout + base_owner;
    Ok(SwapPlan {
        direction: SwapDirection::Sell,
        rounds_trader: rounds_in,
        rounds_owner_fee: round_owner,
        base_trader: payout,
        base_owner_fee: base_owner,
        base_vault_delta: vault_out,
        base_fee_total: base_fee,
        round_fee_total: round_fee,
        // every round the owner does not pocket returns to the curve
        new_round_reserve: market.round_reserve + rounds_in - round_owner,
        new_base_reserve: market.base_reserve - vault_out,
    })
}

fn plan_sell_exact_base(
    market: &MarketState,
    fees: &super::config::FeeSchedule,
    base_out: Decimal,
) -> Result<SwapPlan, EngineError> {
    if base_out <= Decimal::ZERO {
        return Err(MarketError::ZeroAmount.into());
    }
    let unit = market.info.round_unit;

    // gross the payout up through the base fee, then invert the curve and the
    // round fee; snapping up keeps the trader side conservative
    let gross_out = base_out / (Decimal::ONE - fees.base_fee_rate());
    let net_rounds =
        curve::rounds_in_for_base_out(market.round_reserve, market.base_reserve, gross_out)?;
    let rounds_in = curve::quantize_up(net_rounds / (Decimal::ONE - fees.round_fee_rate()), unit);

    let round_fee = curve::quantize_down(fees.round_fee(rounds_in), unit);
    let round_owner = curve::quantize_down(round_fee * fees.owner_fee_share, unit);

    let base_fee = gross_out - base_out;
    let base_owner = base_fee * fees.owner_fee_share;

    let vault_out = base_out + base_owner;
    Ok(SwapPlan {
        direction: SwapDirection::Sell,
        rounds_trader: rounds_in,
        rounds_owner_fee: round_owner,
        base_trader: base_out,
        base_owner_fee: base_owner,
        base_vault_delta: vault_out,
        base_fee_total: base_fee,
        round_fee_total: round_fee,
        new_round_reserve: market.round_reserve + rounds_in - round_owner,
        new_base_reserve: market.base_reserve - vault_out,
    })
}

impl Engine {
    // pure quote counterparts. same failure conditions as the mutating calls
    // minus deadline and slippage.

    /// Total base a buyer pays for exactly `rounds_out` gross rounds.
    pub fn quote_buy_exact_rounds(
        &self,
        market_id: MarketId,
        rounds_out: Decimal,
    ) -> Result<Decimal, EngineError> {
        self.ensure_live(market_id)?;
        let market = self.market(market_id)?;
        market.validate_rounds(rounds_out)?;
        Ok(plan_buy_exact_rounds(market, &self.config.fees, rounds_out)?.base_trader)
    }

    /// Rounds credited for paying exactly `base_in`.
    pub fn quote_buy_exact_base(
        &self,
        market_id: MarketId,
        base_in: Decimal,
    ) -> Result<Decimal, EngineError> {
        self.ensure_live(market_id)?;
        let market = self.market(market_id)?;
        Ok(plan_buy_exact_base(market, &self.config.fees, base_in)?.rounds_trader)
    }

    /// Base paid out for selling exactly `rounds_in`.
    pub fn quote_sell_exact_rounds(
        &self,
        market_id: MarketId,
        rounds_in: Decimal,
    ) -> Result<Decimal, EngineError> {
        self.ensure_live(market_id)?;
        let market = self.market(market_id)?;
        market.validate_rounds(rounds_in)?;
        Ok(plan_sell_exact_rounds(market, &self.config.fees, rounds_in)?.base_trader)
    }

    /// Rounds required to extract exactly `base_out`.
    pub fn quote_sell_exact_base(
        &self,
        market_id: MarketId,
        base_out: Decimal,
    ) -> Result<Decimal, EngineError> {
        self.ensure_live(market_id)?;
        let market = self.market(market_id)?;
        Ok(plan_sell_exact_base(market, &self.config.fees, base_out)?.rounds_trader)
    }

    // mutating entry points

    /// Buy exactly `rounds_out` gross rounds, paying at most `max_base_in`.
    pub fn buy_exact_rounds(
        &mut self,
        trader: AccountId,
        market_id: MarketId,
        rounds_out: Decimal,
        max_base_in: Decimal,
        deadline: Timestamp,
    ) -> Result<SwapResult, EngineError> {
        self.check_deadline(deadline)?;
        self.ensure_live(market_id)?;

        let plan = {
            let market = self.market(market_id)?;
            market.validate_rounds(rounds_out)?;
            plan_buy_exact_rounds(market, &self.config.fees, rounds_out)?
        };
        if plan.base_trader > max_base_in {
            return Err(EngineError::SlippageExceeded {
                limit: max_base_in,
                actual: plan.base_trader,
            });
        }
        self.settle(trader, market_id, plan)
    }

    /// Spend exactly `base_in`, receiving at least `min_rounds_out`.
    pub fn buy_exact_base(
        &mut self,
        trader: AccountId,
        market_id: MarketId,
        base_in: Decimal,
        min_rounds_out: Decimal,
        deadline: Timestamp,
    ) -> Result<SwapResult, EngineError> {
        self.check_deadline(deadline)?;
        self.ensure_live(market_id)?;

        let plan = {
            let market = self.market(market_id)?;
            plan_buy_exact_base(market, &self.config.fees, base_in)?
        };
        if plan.rounds_trader < min_rounds_out {
            return Err(EngineError::SlippageExceeded {
                limit: min_rounds_out,
                actual: plan.rounds_trader,
            });
        }
        self.settle(trader, market_id, plan)
    }

    /// Sell exactly `rounds_in`, receiving at least `min_base_out`.
    pub fn sell_exact_rounds(
        &mut self,
        trader: AccountId,
        market_id: MarketId,
        rounds_in: Decimal,
        min_base_out: Decimal,
        deadline: Timestamp,
    ) -> Result<SwapResult, EngineError> {
        self.check_deadline(deadline)?;
        self.ensure_live(market_id)?;

        let plan = {
            let market = self.market(market_id)?;
            market.validate_rounds(rounds_in)?;
            let balance = market.round_balance(trader);
            if balance < rounds_in {
                return Err(MarketError::InsufficientRounds {
                    have: balance,
                    need: rounds_in,
                }
                .into());
            }
            plan_sell_exact_rounds(market, &self.config.fees, rounds_in)?
        };
        if plan.base_trader < min_base_out {
            return Err(EngineError::SlippageExceeded {
                limit: min_base_out,
                actual: plan.base_trader,
            });
        }
        self.settle(trader, market_id, plan)
    }

    /// Receive exactly `base_out`, selling at most `max_rounds_in`.
    pub fn sell_exact_base(
        &mut self,
        trader: AccountId,
        market_id: MarketId,
        base_out: Decimal,
        max_rounds_in: Decimal,
        deadline: Timestamp,
    ) -> Result<SwapResult, EngineError> {
        self.check_deadline(deadline)?;
        self.ensure_live(market_id)?;

        let plan = {
            let market = self.market(market_id)?;
            let plan = plan_sell_exact_base(market, &self.config.fees, base_out)?;
            let balance = market.round_balance(trader);
            if balance < plan.rounds_trader {
                return Err(MarketError::InsufficientRounds {
                    have: balance,
                    need: plan.rounds_trader,
                }
                .into());
            }
            plan
        };
        if plan.rounds_trader > max_rounds_in {
            return Err(EngineError::SlippageExceeded {
                limit: max_rounds_in,
                actual: plan.rounds_trader,
            });
        }
        self.settle(trader, market_id, plan)
    }

    // 10.3.3: settlement. all checks already passed; move base through the
    // ledger, apply the planned reserves, adjust round balances, feed the
    // reward accumulators, emit the event.
    fn settle(
        &mut self,
        trader: AccountId,
        market_id: MarketId,
        plan: SwapPlan,
    ) -> Result<SwapResult, EngineError> {
        let (asset, owner) = {
            let market = self.market(market_id)?;
            (market.info.base_asset.clone(), market.owner)
        };

        match plan.direction {
            SwapDirection::Buy => {
                // full affordability check up front so the two transfers below
                // cannot fail halfway
                let need = plan.base_vault_delta + plan.base_owner_fee;
                let have = self.base_ledger.balance_of(&asset, Holder::Account(trader));
                if have < need {
                    return Err(crate::ledger::LedgerError::InsufficientBalance { have, need }.into());
                }
                self.base_ledger.transfer(
                    &asset,
                    Holder::Account(trader),
                    Holder::MarketVault(market_id),
                    plan.base_vault_delta,
                )?;
                self.base_ledger.transfer(
                    &asset,
                    Holder::Account(trader),
                    Holder::Account(owner),
                    plan.base_owner_fee,
                )?;

                let market = self.market_mut(market_id)?;
                market.round_reserve = plan.new_round_reserve;
                market.base_reserve = plan.new_base_reserve;
                market.credit_rounds(trader, plan.rounds_trader);
                market.credit_rounds(owner, plan.rounds_owner_fee);
            }
            SwapDirection::Sell => {
                self.base_ledger.transfer(
                    &asset,
                    Holder::MarketVault(market_id),
                    Holder::Account(trader),
                    plan.base_trader,
                )?;
                self.base_ledger.transfer(
                    &asset,
                    Holder::MarketVault(market_id),
                    Holder::Account(owner),
                    plan.base_owner_fee,
                )?;

                let market = self.market_mut(market_id)?;
                market.round_reserve = plan.new_round_reserve;
                market.base_reserve = plan.new_base_reserve;
                market.debit_rounds(trader, plan.rounds_trader)?;
                market.credit_rounds(owner, plan.rounds_owner_fee);
            }
        }

        let (pair_reward, trader_reward) =
            self.apply_reward_accumulators(market_id, trader, plan.base_trader)?;

        self.emit_event(EventPayload::Swap(SwapEvent {
            market_id,
            trader,
            direction: plan.direction.clone(),
            rounds: plan.rounds_trader,
            base: plan.base_trader,
            base_fee: plan.base_fee_total,
            round_fee: plan.round_fee_total,
            new_round_reserve: plan.new_round_reserve,
            new_base_reserve: plan.new_base_reserve,
        }));

        Ok(SwapResult {
            market_id,
            trader,
            rounds: plan.rounds_trader,
            base: plan.base_trader,
            base_fee: plan.base_fee_total,
            round_fee: plan.round_fee_total,
            new_round_reserve: plan.new_round_reserve,
            new_base_reserve: plan.new_base_reserve,
            pair_reward,
            trader_reward,
        })
    }
}
