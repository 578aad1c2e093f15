// 10.2 engine/core.rs: main engine. holds the registry, pools, ledgers, bridge
// and clock; implements the listing lifecycle and the admin surface. swap and
// auction entry points live in their own files.

use super::config::EngineConfig;
use super::results::EngineError;
use crate::bridge::PriceBridge;
use crate::events::{DelistedEvent, Event, EventId, EventPayload, ListedEvent};
use crate::ledger::{BaseLedger, Holder, ItemHolder, ItemLedger};
use crate::market::{MarketError, MarketInfo, MarketState};
use crate::registry::PairRegistry;
use crate::rewards::{DistributionPool, RewardError};
use crate::types::{AccountId, AssetId, BlockNumber, ItemKey, MarketId, Timestamp};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;

/** 10.2.1: main engine struct. all state lives here */
#[derive(Debug)]
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) registry: PairRegistry,
    pub(super) pools: HashMap<AssetId, DistributionPool>,
    pub(super) base_ledger: BaseLedger,
    pub(super) item_ledger: ItemLedger,
    pub(super) bridge: PriceBridge,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) next_account_id: u64,
    pub(super) current_time: Timestamp,
    pub(super) current_block: BlockNumber,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            registry: PairRegistry::new(),
            pools: HashMap::new(),
            base_ledger: BaseLedger::new(),
            item_ledger: ItemLedger::new(),
            bridge: PriceBridge::new(),
            events: Vec::new(),
            next_event_id: 1,
            next_account_id: 1,
            current_time: Timestamp::from_millis(0),
            current_block: BlockNumber::genesis(),
        }
    }

    // clock and block height. time only moves when a caller moves it.

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn advance_time(&mut self, millis: i64) {
        self.current_time = self.current_time.plus_millis(millis);
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_blocks(&mut self, blocks: u64) {
        self.current_block = self.current_block.advance(blocks);
    }

    pub fn block(&self) -> BlockNumber {
        self.current_block
    }

    // accounts and sim funding

    pub fn create_account(&mut self) -> AccountId {
        let id = AccountId(self.next_account_id);
        self.next_account_id += 1;
        id
    }

    /// Mint base assets into an account. Sim/test setup only; production
    /// balances arrive through the external ledger.
    pub fn fund_account(&mut self, account: AccountId, asset: &AssetId, amount: Decimal) {
        self.base_ledger.mint(asset, Holder::Account(account), amount);
    }

    pub fn register_item(&mut self, item: ItemKey, owner: AccountId) {
        self.item_ledger.register(item, owner);
    }

    pub fn set_bridge_route(&mut self, from: &AssetId, to: &AssetId, ratio: Decimal) {
        self.bridge.set_route(from, to, ratio);
    }

    pub fn balance_of(&self, account: AccountId, asset: &AssetId) -> Decimal {
        self.base_ledger.balance_of(asset, Holder::Account(account))
    }

    // audit views over the non-account holders

    pub fn vault_balance(&self, market_id: MarketId) -> Decimal {
        match self.registry.get(market_id) {
            Some(market) => self
                .base_ledger
                .balance_of(&market.info.base_asset, Holder::MarketVault(market_id)),
            None => Decimal::ZERO,
        }
    }

    pub fn escrow_balance(&self, market_id: MarketId) -> Decimal {
        match self.registry.get(market_id) {
            Some(market) => self
                .base_ledger
                .balance_of(&market.info.base_asset, Holder::Escrow(market_id)),
            None => Decimal::ZERO,
        }
    }

    pub fn treasury_balance(&self, asset: &AssetId) -> Decimal {
        self.base_ledger.balance_of(asset, Holder::Treasury)
    }

    pub fn item_owner(&self, item: &ItemKey) -> Option<ItemHolder> {
        self.item_ledger.owner_of(item)
    }

    // 10.2.2: listing. requires a distribution pool for the base asset and
    // custody of the item; seeds the curve from the lister's base deposit.
    #[allow(clippy::too_many_arguments)]
    pub fn list(
        &mut self,
        caller: AccountId,
        item: ItemKey,
        base_asset: AssetId,
        description_hash: &str,
        tags: Vec<String>,
        initial_rounds: Decimal,
        initial_base: Decimal,
    ) -> Result<MarketId, EngineError> {
        if !self.pools.contains_key(&base_asset) {
            return Err(RewardError::PoolNotFound.into());
        }
        if initial_rounds <= Decimal::ZERO || initial_base <= Decimal::ZERO {
            return Err(MarketError::ZeroAmount.into());
        }
        if !crate::curve::is_quantized(initial_rounds, self.config.round_unit) {
            return Err(MarketError::NotQuantized {
                amount: initial_rounds,
                unit: self.config.round_unit,
            }
            .into());
        }
        self.item_ledger.ensure_account_owns(&item, caller)?;

        let id = self.registry.allocate_id();
        let version = self.registry.next_version(&item);

        // seed deposit first: the only fallible step, before any mutation
        self.base_ledger.transfer(
            &base_asset,
            Holder::Account(caller),
            Holder::MarketVault(id),
            initial_base,
        )?;
        self.item_ledger.transfer(&item, ItemHolder::Market(id))?;

        let info = MarketInfo {
            id,
            item: item.clone(),
            version,
            base_asset: base_asset.clone(),
            description_hash: description_hash.to_string(),
            tags,
            round_unit: self.config.round_unit,
        };
        let state = MarketState::new(
            info,
            caller,
            initial_rounds,
            initial_base,
            self.config.bootstrap_rounds,
            self.current_block,
        );
        self.registry.insert(state);

        self.emit_event(EventPayload::Listed(ListedEvent {
            market_id: id,
            item,
            version: version.0,
            owner: caller,
            base_asset,
            round_reserve: initial_rounds,
            base_reserve: initial_base,
        }));

        Ok(id)
    }

    // 10.2.3: delisting. owner dissolves the curve: round holders are bought
    // back pro rata from the reserve, the item returns to the owner, and the
    // record freezes. re-listing afterwards mints a new version.
    pub fn delist(
        &mut self,
        caller: AccountId,
        market_id: MarketId,
        deadline: Timestamp,
    ) -> Result<usize, EngineError> {
        self.check_deadline(deadline)?;
        self.ensure_live(market_id)?;

        let (owner, item) = {
            let market = self.market(market_id)?;
            (market.owner, market.info.item.clone())
        };
        if caller != owner {
            return Err(EngineError::NotMarketOwner(market_id));
        }

        let holders_paid = self.dissolve(market_id)?;
        self.item_ledger.transfer(&item, ItemHolder::Account(owner))?;

        self.emit_event(EventPayload::Delisted(DelistedEvent {
            market_id,
            item,
            holders_paid,
        }));

        Ok(holders_paid)
    }

    // buy back every outstanding round pro rata from the base reserve, then
    // freeze the record. shared by delist and item-buyout settlement.
    pub(super) fn dissolve(&mut self, market_id: MarketId) -> Result<usize, EngineError> {
        let (asset, owner, base_reserve, total_minted, mut holders) = {
            let market = self.market(market_id)?;
            let mut holders: Vec<(AccountId, Decimal)> = market
                .round_balances
                .iter()
                .map(|(account, balance)| (*account, *balance))
                .collect();
            // deterministic payout order
            holders.sort_by_key(|(account, _)| *account);
            (
                market.info.base_asset.clone(),
                market.owner,
                market.base_reserve,
                market.total_rounds_minted,
                holders,
            )
        };

        let mut paid = 0usize;
        for (account, balance) in holders.drain(..) {
            // truncate so the sum of shares never exceeds the reserve, and cap
            // at what the vault actually holds
            let share = (base_reserve * balance / total_minted)
                .round_dp_with_strategy(12, RoundingStrategy::ToZero)
                .min(
                    self.base_ledger
                        .balance_of(&asset, Holder::MarketVault(market_id)),
                );
            self.base_ledger.transfer(
                &asset,
                Holder::MarketVault(market_id),
                Holder::Account(account),
                share,
            )?;
            paid += 1;
        }

        // truncation dust, and the whole reserve when nothing was minted,
        // sweeps to the owner
        let dust = self
            .base_ledger
            .balance_of(&asset, Holder::MarketVault(market_id));
        self.base_ledger.transfer(
            &asset,
            Holder::MarketVault(market_id),
            Holder::Account(owner),
            dust,
        )?;

        let market = self.market_mut(market_id)?;
        market.round_balances.clear();
        market.total_rounds_minted = Decimal::ZERO;
        market.freeze();

        Ok(paid)
    }

    // admin surface: protocol-owner-only parameter setters

    fn ensure_protocol_owner(&self, caller: AccountId) -> Result<(), EngineError> {
        if caller != self.config.protocol_owner {
            return Err(EngineError::NotProtocolOwner);
        }
        Ok(())
    }

    fn check_fee_num(&self, numerator: Decimal) -> Result<(), EngineError> {
        if numerator < Decimal::ZERO || numerator >= self.config.fees.fee_denominator {
            return Err(EngineError::InvalidParameter(
                "fee numerator must lie below the denominator",
            ));
        }
        Ok(())
    }

    pub fn set_base_fee_num(&mut self, caller: AccountId, numerator: Decimal) -> Result<(), EngineError> {
        self.ensure_protocol_owner(caller)?;
        self.check_fee_num(numerator)?;
        self.config.fees.base_fee_num = numerator;
        Ok(())
    }

    pub fn set_round_fee_num(&mut self, caller: AccountId, numerator: Decimal) -> Result<(), EngineError> {
        self.ensure_protocol_owner(caller)?;
        self.check_fee_num(numerator)?;
        self.config.fees.round_fee_num = numerator;
        Ok(())
    }

    pub fn set_nft_fee_num(&mut self, caller: AccountId, numerator: Decimal) -> Result<(), EngineError> {
        self.ensure_protocol_owner(caller)?;
        self.check_fee_num(numerator)?;
        self.config.fees.nft_fee_num = numerator;
        Ok(())
    }

    pub fn set_bid_timeout(&mut self, caller: AccountId, millis: i64) -> Result<(), EngineError> {
        self.ensure_protocol_owner(caller)?;
        if millis <= 0 {
            return Err(EngineError::InvalidParameter("bid timeout must be positive"));
        }
        self.config.bid_timeout_ms = millis;
        Ok(())
    }

    pub fn set_reward_epoch(&mut self, caller: AccountId, blocks: u64) -> Result<(), EngineError> {
        self.ensure_protocol_owner(caller)?;
        if blocks == 0 {
            return Err(EngineError::InvalidParameter("reward epoch must be positive"));
        }
        self.config.reward_epoch_blocks = blocks;
        Ok(())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // read-only getters

    pub fn get_market(&self, market_id: MarketId) -> Option<&MarketState> {
        self.registry.get(market_id)
    }

    pub fn current_market(&self, item: &ItemKey) -> Option<&MarketState> {
        self.registry.current(item)
    }

    pub fn round_balance(&self, market_id: MarketId, account: AccountId) -> Decimal {
        self.registry
            .get(market_id)
            .map(|m| m.round_balance(account))
            .unwrap_or(Decimal::ZERO)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    // shared operation plumbing

    pub(super) fn market(&self, market_id: MarketId) -> Result<&MarketState, EngineError> {
        self.registry
            .get(market_id)
            .ok_or(EngineError::MarketNotFound(market_id))
    }

    pub(super) fn market_mut(&mut self, market_id: MarketId) -> Result<&mut MarketState, EngineError> {
        self.registry
            .get_mut(market_id)
            .ok_or(EngineError::MarketNotFound(market_id))
    }

    // every state-changing operation runs against the current, alive version
    // of a market. stale and dead ids fail here.
    pub(super) fn ensure_live(&self, market_id: MarketId) -> Result<(), EngineError> {
        let market = self.market(market_id)?;
        if !self.registry.is_current(market_id) {
            return Err(MarketError::StaleVersion(market_id).into());
        }
        market.ensure_alive()?;
        Ok(())
    }

    pub(super) fn check_deadline(&self, deadline: Timestamp) -> Result<(), EngineError> {
        if self.current_time > deadline {
            return Err(EngineError::DeadlineExpired {
                deadline,
                now: self.current_time,
            });
        }
        Ok(())
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(
            EventId(self.next_event_id),
            self.current_time,
            self.current_block,
            payload,
        );
        self.next_event_id += 1;
        self.events.push(event);
    }
}
