//! Black-box distribution engine scenarios.
//!
//! Checkpoints fire only on the first trade past an epoch boundary, rewards
//! are deterministic functions of the tracked window, and claims zero out.

use rounds_core::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const PROTOCOL: AccountId = AccountId(0);
const FAR_DEADLINE: Timestamp = Timestamp(i64::MAX);

fn setup() -> (Engine, AccountId, MarketId) {
    let mut engine = Engine::new(EngineConfig::default());
    let usdc = AssetId::new("USDC");
    engine
        .create_pool(PROTOCOL, usdc.clone(), dec!(1000), dec!(0.1))
        .unwrap();

    let lister = engine.create_account();
    engine.fund_account(lister, &usdc, dec!(10_000));
    engine.register_item(ItemKey::new("glyphs", 1), lister);
    let market_id = engine
        .list(
            lister,
            ItemKey::new("glyphs", 1),
            usdc,
            "0x00",
            Vec::new(),
            dec!(10_000),
            dec!(2_500),
        )
        .unwrap();
    (engine, lister, market_id)
}

fn funded_trader(engine: &mut Engine) -> AccountId {
    let id = engine.create_account();
    engine.fund_account(id, &AssetId::new("USDC"), dec!(100_000));
    id
}

fn buy(engine: &mut Engine, trader: AccountId, market_id: MarketId, rounds: Decimal) -> SwapResult {
    engine
        .buy_exact_rounds(trader, market_id, rounds, dec!(100_000), FAR_DEADLINE)
        .unwrap()
}

#[test]
fn rewards_untouched_inside_an_open_epoch() {
    let (mut engine, _, market_id) = setup();
    let trader = funded_trader(&mut engine);

    // any number of swaps strictly inside one epoch changes nothing claimable
    for _ in 0..5 {
        let result = buy(&mut engine, trader, market_id, dec!(200));
        assert_eq!(result.pair_reward, None);
        assert_eq!(result.trader_reward, None);
        engine.advance_blocks(100);
    }
    assert_eq!(engine.claimable_pair_reward(market_id), Decimal::ZERO);
    assert_eq!(engine.claimable_trader_reward(market_id, trader), Decimal::ZERO);
}

#[test]
fn boundary_crossing_finalizes_the_tracked_window() {
    let (mut engine, _, market_id) = setup();
    let trader = funded_trader(&mut engine);

    buy(&mut engine, trader, market_id, dec!(500));
    engine.advance_blocks(400);
    buy(&mut engine, trader, market_id, dec!(500));

    // predict both rewards from the tracked state before the crossing trade
    let (pair_state, trader_state, multiplier) = {
        let market = engine.get_market(market_id).unwrap();
        (
            market.pair_epoch.clone(),
            market.trader_epochs.get(&trader).unwrap().clone(),
            market.reward_multiplier,
        )
    };
    let pool = engine.get_pool(&AssetId::new("USDC")).unwrap();
    let gas_reward = pool.gas_reward;
    let divisor = pool.reward_rate_divisor;

    engine.advance_blocks(1_000);
    let result = buy(&mut engine, trader, market_id, dec!(100));

    let terms = RewardTerms {
        bootstrap: engine.config().bootstrap_rounds,
        total_minted: engine.get_market(market_id).unwrap().total_rounds_minted,
        bridge_ratio: Decimal::ONE,
        divisor,
        multiplier,
    };
    let expected_pair = window_reward(&pair_state, &terms);
    let expected_trader = window_reward(&trader_state, &terms) + gas_reward;

    assert_eq!(result.pair_reward, Some(expected_pair));
    assert_eq!(result.trader_reward, Some(expected_trader));
    assert!(expected_pair > Decimal::ZERO);
    assert!(expected_trader > Decimal::ZERO);

    assert_eq!(engine.claimable_pair_reward(market_id), expected_pair);
    assert_eq!(engine.claimable_trader_reward(market_id, trader), expected_trader);

    // and the new window starts clean: further intra-epoch swaps change nothing
    buy(&mut engine, trader, market_id, dec!(100));
    assert_eq!(engine.claimable_pair_reward(market_id), expected_pair);
    assert_eq!(engine.claimable_trader_reward(market_id, trader), expected_trader);
}

#[test]
fn gas_reward_goes_only_to_the_triggering_trader() {
    let (mut engine, _, market_id) = setup();
    let early = funded_trader(&mut engine);
    let late = funded_trader(&mut engine);

    buy(&mut engine, early, market_id, dec!(500));
    buy(&mut engine, late, market_id, dec!(500));

    engine.advance_blocks(1_000);

    // late crosses first; early has not traded since the boundary
    let result = buy(&mut engine, late, market_id, dec!(100));
    assert!(result.trader_reward.is_some());
    assert_eq!(engine.claimable_trader_reward(market_id, early), Decimal::ZERO);

    // early's own next trade fires their window separately
    let result = buy(&mut engine, early, market_id, dec!(100));
    assert!(result.trader_reward.is_some());
}

#[test]
fn claim_transfers_exactly_and_zeroes() {
    let (mut engine, lister, market_id) = setup();
    let trader = funded_trader(&mut engine);
    let spark = AssetId::new("SPARK");

    buy(&mut engine, trader, market_id, dec!(500));
    engine.advance_blocks(1_000);
    buy(&mut engine, trader, market_id, dec!(100));

    let claimable = engine.claimable_trader_reward(market_id, trader);
    assert!(claimable > Decimal::ZERO);

    let claimed = engine.claim_trader_reward(trader, market_id).unwrap();
    assert_eq!(claimed, claimable);
    assert_eq!(engine.balance_of(trader, &spark), claimable);
    assert_eq!(engine.claimable_trader_reward(market_id, trader), Decimal::ZERO);

    // an immediate repeat claim fails
    let err = engine.claim_trader_reward(trader, market_id).unwrap_err();
    assert!(matches!(err, EngineError::Reward(RewardError::NothingToClaim)));

    // the pair-level claim is owner-gated and zeroes the same way
    let err = engine.claim_pair_reward(trader, market_id).unwrap_err();
    assert!(matches!(err, EngineError::NotMarketOwner(_)));

    let pair_claimable = engine.claimable_pair_reward(market_id);
    assert!(pair_claimable > Decimal::ZERO);
    let claimed = engine.claim_pair_reward(lister, market_id).unwrap();
    assert_eq!(claimed, pair_claimable);
    assert_eq!(engine.balance_of(lister, &spark), pair_claimable);
    assert!(engine.claim_pair_reward(lister, market_id).is_err());
}

#[test]
fn reward_multiplier_scales_the_window() {
    let (mut engine_plain, _, market_plain) = setup();
    let (mut engine_boosted, _, market_boosted) = setup();
    engine_boosted
        .set_reward_multiplier(PROTOCOL, market_boosted, dec!(3))
        .unwrap();

    for (engine, market_id) in [
        (&mut engine_plain, market_plain),
        (&mut engine_boosted, market_boosted),
    ] {
        let trader = funded_trader(engine);
        buy(engine, trader, market_id, dec!(500));
        engine.advance_blocks(1_000);
        buy(engine, trader, market_id, dec!(100));
    }

    let plain = engine_plain.claimable_pair_reward(market_plain);
    let boosted = engine_boosted.claimable_pair_reward(market_boosted);
    assert_eq!(boosted, plain * dec!(3));
}

#[test]
fn bridge_ratio_normalizes_non_primary_assets() {
    let mut engine = Engine::new(EngineConfig::default());
    let weth = AssetId::new("WETH");

    // no route yet: pool creation is refused at configuration time
    let err = engine
        .create_pool(PROTOCOL, weth.clone(), dec!(1000), dec!(0.1))
        .unwrap_err();
    assert!(matches!(err, EngineError::Reward(RewardError::MissingPriceRoute)));

    engine.set_bridge_route(&weth, &AssetId::new("USDC"), dec!(2));
    engine
        .create_pool(PROTOCOL, weth.clone(), dec!(1000), dec!(0.1))
        .unwrap();

    let lister = engine.create_account();
    engine.fund_account(lister, &weth, dec!(10_000));
    engine.register_item(ItemKey::new("glyphs", 9), lister);
    let market_id = engine
        .list(
            lister,
            ItemKey::new("glyphs", 9),
            weth.clone(),
            "0x00",
            Vec::new(),
            dec!(10_000),
            dec!(2_500),
        )
        .unwrap();

    let trader = engine.create_account();
    engine.fund_account(trader, &weth, dec!(100_000));
    engine
        .buy_exact_rounds(trader, market_id, dec!(500), dec!(100_000), FAR_DEADLINE)
        .unwrap();

    let pair_state = engine.get_market(market_id).unwrap().pair_epoch.clone();
    engine.advance_blocks(1_000);
    engine
        .buy_exact_rounds(trader, market_id, dec!(100), dec!(100_000), FAR_DEADLINE)
        .unwrap();

    // the blend is doubled by the 2:1 bridge ratio
    let terms = RewardTerms {
        bootstrap: engine.config().bootstrap_rounds,
        total_minted: engine.get_market(market_id).unwrap().total_rounds_minted,
        bridge_ratio: dec!(2),
        divisor: dec!(1000),
        multiplier: Decimal::ONE,
    };
    assert_eq!(
        engine.claimable_pair_reward(market_id),
        window_reward(&pair_state, &terms)
    );
}

#[test]
fn pool_administration_rules() {
    let (mut engine, lister, _market_id) = setup();
    let usdc = AssetId::new("USDC");
    let dai = AssetId::new("DAI");

    // duplicate pool
    let err = engine
        .create_pool(PROTOCOL, usdc.clone(), dec!(500), dec!(0))
        .unwrap_err();
    assert!(matches!(err, EngineError::Reward(RewardError::PoolAlreadyExists)));

    // zero divisor
    engine.set_bridge_route(&dai, &usdc, Decimal::ONE);
    let err = engine
        .create_pool(PROTOCOL, dai.clone(), Decimal::ZERO, dec!(0))
        .unwrap_err();
    assert!(matches!(err, EngineError::Reward(RewardError::ZeroRewardParameter)));

    // owner-only surface
    assert!(matches!(
        engine.create_pool(lister, dai.clone(), dec!(500), dec!(0)),
        Err(EngineError::NotProtocolOwner)
    ));
    assert!(matches!(
        engine.set_pool_divisor(lister, &usdc, dec!(2000)),
        Err(EngineError::NotProtocolOwner)
    ));
    assert!(matches!(
        engine.halve_rewards(lister),
        Err(EngineError::NotProtocolOwner)
    ));

    // halving doubles every pool's divisor at once
    engine.create_pool(PROTOCOL, dai.clone(), dec!(500), dec!(0)).unwrap();
    engine.halve_rewards(PROTOCOL).unwrap();
    assert_eq!(engine.get_pool(&usdc).unwrap().reward_rate_divisor, dec!(2000));
    assert_eq!(engine.get_pool(&dai).unwrap().reward_rate_divisor, dec!(1000));

    engine.set_pool_divisor(PROTOCOL, &usdc, dec!(750)).unwrap();
    assert_eq!(engine.get_pool(&usdc).unwrap().reward_rate_divisor, dec!(750));
    engine.set_pool_gas_reward(PROTOCOL, &usdc, dec!(0.5)).unwrap();
    assert_eq!(engine.get_pool(&usdc).unwrap().gas_reward, dec!(0.5));
}

#[test]
fn checkpoint_block_advances_in_whole_epochs() {
    let (mut engine, _, market_id) = setup();
    let trader = funded_trader(&mut engine);

    buy(&mut engine, trader, market_id, dec!(100));
    // 2.5 epochs elapse before anyone trades again
    engine.advance_blocks(2_500);
    buy(&mut engine, trader, market_id, dec!(100));

    let market = engine.get_market(market_id).unwrap();
    assert_eq!(market.pair_epoch.checkpoint_block, BlockNumber(2_000));
}
