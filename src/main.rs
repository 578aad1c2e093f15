//! Fractional Market Core Simulation.
//!
//! Demonstrates the full market lifecycle including listing, bonding-curve
//! swaps, buyout auctions with price invalidation, epoch reward checkpointing,
//! and delist/relist versioning.

use rounds_core::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn main() {
    println!("Fractional NFT Market Core Engine Simulation");
    println!("Bonding Curve, Buyout Auctions, Epoch Rewards\n");

    scenario_1_listing_and_round_trip();
    scenario_2_bid_invalidation();
    scenario_3_item_buyout_settlement();
    scenario_4_epoch_rewards();
    scenario_5_delist_and_relist();

    println!("\nAll simulations completed successfully.");
}

const PROTOCOL: AccountId = AccountId(0);

fn deadline(engine: &Engine) -> Timestamp {
    engine.time().plus_millis(3_600_000)
}

fn setup() -> (Engine, AccountId, MarketId) {
    let mut engine = Engine::new(EngineConfig::default());
    let usdc = AssetId::new("USDC");
    engine.create_pool(PROTOCOL, usdc.clone(), dec!(1000), dec!(0.1)).unwrap();

    let lister = engine.create_account();
    engine.fund_account(lister, &usdc, dec!(10_000));
    engine.register_item(ItemKey::new("glyphs", 1), lister);

    let market_id = engine
        .list(
            lister,
            ItemKey::new("glyphs", 1),
            usdc,
            "0x6f1c",
            vec!["art".to_string()],
            dec!(10_000),
            dec!(2_500),
        )
        .unwrap();
    (engine, lister, market_id)
}

/// Listing, quoting and a buy/sell round trip.
fn scenario_1_listing_and_round_trip() {
    println!("Scenario 1: Listing and Round-Trip Trading\n");

    let (mut engine, _lister, market_id) = setup();
    let usdc = AssetId::new("USDC");

    let alice = engine.create_account();
    engine.fund_account(alice, &usdc, dec!(1_000));

    let quote = engine.quote_buy_exact_rounds(market_id, dec!(1000)).unwrap();
    println!("  Quote for 1000 rounds: {} USDC", quote.round_dp(4));

    let dl = deadline(&engine);
    let buy = engine
        .buy_exact_rounds(alice, market_id, dec!(1000), quote, dl)
        .unwrap();
    println!(
        "  Alice bought {} rounds for {} USDC (fees: base {}, rounds {})",
        buy.rounds,
        buy.base.round_dp(4),
        buy.base_fee.round_dp(4),
        buy.round_fee
    );

    let sell = engine
        .sell_exact_rounds(alice, market_id, buy.rounds, Decimal::ZERO, dl)
        .unwrap();
    println!(
        "  Alice sold {} rounds back for {} USDC",
        sell.rounds,
        sell.base.round_dp(4)
    );
    println!(
        "  Round trip cost her {} USDC to fees and curve movement\n",
        (buy.base - sell.base).round_dp(4)
    );
}

/// A swap raising the live quote silences an outstanding bid.
fn scenario_2_bid_invalidation() {
    println!("Scenario 2: Buyout Bid Price Invalidation\n");

    let (mut engine, _lister, market_id) = setup();
    let usdc = AssetId::new("USDC");

    let holder = engine.create_account();
    let bidder = engine.create_account();
    let whale = engine.create_account();
    engine.fund_account(holder, &usdc, dec!(1_000));
    engine.fund_account(bidder, &usdc, dec!(20_000));
    engine.fund_account(whale, &usdc, dec!(20_000));

    let dl = deadline(&engine);
    let cost = engine.quote_buy_exact_rounds(market_id, dec!(1000)).unwrap();
    let held = engine
        .buy_exact_rounds(holder, market_id, dec!(1000), cost, dl)
        .unwrap()
        .rounds;

    let quote = engine
        .get_market(market_id)
        .unwrap()
        .buyout_quote(BidKind::Item);
    engine.bid(bidder, market_id, BidKind::Item, quote, dl).unwrap();
    println!("  Bidder escrows an item-buyout bid at the live quote {}", quote.round_dp(4));

    let poll = engine.poll(market_id, BidKind::Item).unwrap();
    println!("  poll() -> {:?}", poll.map(|(a, q)| (a, q.round_dp(4))));

    let cost = engine.quote_buy_exact_rounds(market_id, dec!(3000)).unwrap();
    let bought = engine
        .buy_exact_rounds(whale, market_id, dec!(3000), cost, dl)
        .unwrap()
        .rounds;
    println!("  Whale buys 3000 rounds, pushing the quote up");

    let poll = engine.poll(market_id, BidKind::Item).unwrap();
    println!("  poll() -> {:?} (bid silenced, not deleted)", poll);

    engine
        .sell_exact_rounds(whale, market_id, bought, Decimal::ZERO, dl)
        .unwrap();
    engine
        .sell_exact_rounds(holder, market_id, held, Decimal::ZERO, dl)
        .unwrap();
    let poll = engine.poll(market_id, BidKind::Item).unwrap();
    println!("  Sell-off drops the quote back; poll() -> {:?}\n", poll.map(|(a, _)| a));
}

/// Owner accepts the sole valid item-buyout bid.
fn scenario_3_item_buyout_settlement() {
    println!("Scenario 3: Item Buyout Settlement\n");

    let (mut engine, lister, market_id) = setup();
    let usdc = AssetId::new("USDC");

    let holder = engine.create_account();
    let buyer = engine.create_account();
    engine.fund_account(holder, &usdc, dec!(1_000));
    engine.fund_account(buyer, &usdc, dec!(20_000));

    let dl = deadline(&engine);
    let cost = engine.quote_buy_exact_rounds(market_id, dec!(1000)).unwrap();
    engine
        .buy_exact_rounds(holder, market_id, dec!(1000), cost, dl)
        .unwrap();

    let quote = engine
        .get_market(market_id)
        .unwrap()
        .buyout_quote(BidKind::Item);
    engine.bid(buyer, market_id, BidKind::Item, quote, dl).unwrap();

    let before = engine.balance_of(lister, &usdc);
    let accepted = engine
        .accept(lister, market_id, BidKind::Item, Decimal::ZERO, dl)
        .unwrap();
    let after = engine.balance_of(lister, &usdc);

    println!(
        "  Accepted {} USDC bid; owner proceeds {} ({} round holders bought back)",
        accepted.amount.round_dp(4),
        accepted.owner_proceeds.round_dp(4),
        accepted.holders_paid
    );
    println!("  Owner balance moved {} USDC", (after - before).round_dp(4));
    println!(
        "  Market alive: {}\n",
        engine.get_market(market_id).unwrap().alive
    );
}

/// Swaps inside one epoch leave rewards untouched; crossing the boundary
/// finalizes the window.
fn scenario_4_epoch_rewards() {
    println!("Scenario 4: Epoch Reward Checkpointing\n");

    let (mut engine, _lister, market_id) = setup();
    let usdc = AssetId::new("USDC");

    let trader = engine.create_account();
    engine.fund_account(trader, &usdc, dec!(5_000));

    let dl = deadline(&engine);
    for _ in 0..2 {
        let cost = engine.quote_buy_exact_rounds(market_id, dec!(500)).unwrap();
        engine
            .buy_exact_rounds(trader, market_id, dec!(500), cost, dl)
            .unwrap();
        engine.advance_blocks(10);
    }
    println!(
        "  After 2 intra-epoch swaps, claimable = {}",
        engine.claimable_trader_reward(market_id, trader)
    );

    engine.advance_blocks(1_000);
    let cost = engine.quote_buy_exact_rounds(market_id, dec!(500)).unwrap();
    let result = engine
        .buy_exact_rounds(trader, market_id, dec!(500), cost, dl)
        .unwrap();
    println!(
        "  Boundary-crossing swap finalized trader reward {:?}",
        result.trader_reward.map(|r| r.round_dp(8))
    );

    let claimed = engine.claim_trader_reward(trader, market_id).unwrap();
    println!("  Claimed {} SPARK; repeat claim fails: {}\n",
        claimed.round_dp(8),
        engine.claim_trader_reward(trader, market_id).is_err()
    );
}

/// Delist, then relist the same item as a fresh versioned market.
fn scenario_5_delist_and_relist() {
    println!("Scenario 5: Delist and Relist Versioning\n");

    let (mut engine, lister, market_id) = setup();
    let usdc = AssetId::new("USDC");

    let dl = deadline(&engine);
    engine.delist(lister, market_id, dl).unwrap();
    println!("  Market v1 delisted; buys against it now fail: {}",
        engine
            .buy_exact_rounds(lister, market_id, dec!(100), dec!(1_000), dl)
            .is_err()
    );

    let new_id = engine
        .list(
            lister,
            ItemKey::new("glyphs", 1),
            usdc,
            "0x6f1c",
            vec!["art".to_string()],
            dec!(10_000),
            dec!(2_500),
        )
        .unwrap();
    let market = engine.get_market(new_id).unwrap();
    println!(
        "  Relisted as {:?} version {} (old id {:?} stays frozen)\n",
        new_id, market.info.version.0, market_id
    );
}
