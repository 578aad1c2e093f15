//! Property-based tests for stress testing the curve and engine invariants.
//!
//! These tests verify invariants hold under random inputs.

use proptest::prelude::*;
use rounds_core::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const PROTOCOL: AccountId = AccountId(0);
const FAR_DEADLINE: Timestamp = Timestamp(i64::MAX);

fn setup_market(round_reserve: Decimal, base_reserve: Decimal) -> (Engine, AccountId, MarketId) {
    let mut engine = Engine::new(EngineConfig::default());
    let usdc = AssetId::new("USDC");
    engine
        .create_pool(PROTOCOL, usdc.clone(), dec!(1000), dec!(0.1))
        .unwrap();

    let lister = engine.create_account();
    engine.fund_account(lister, &usdc, base_reserve);
    engine.register_item(ItemKey::new("glyphs", 1), lister);
    let market_id = engine
        .list(
            lister,
            ItemKey::new("glyphs", 1),
            usdc,
            "0x00",
            Vec::new(),
            round_reserve,
            base_reserve,
        )
        .unwrap();
    (engine, lister, market_id)
}

// Strategies for generating test data
fn reserve_strategy() -> impl Strategy<Value = (Decimal, Decimal)> {
    (1_000i64..100_000i64, 500i64..50_000i64)
        .prop_map(|(r, b)| (Decimal::from(r), Decimal::from(b)))
}

fn trade_size_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..500i64).prop_map(Decimal::from)
}

proptest! {
    /// Quote-buy is strictly increasing in the amount for fixed reserves.
    #[test]
    fn quote_buy_strictly_increasing(
        (rounds, base) in reserve_strategy(),
        start in 1i64..100i64,
    ) {
        let (engine, _, market_id) = setup_market(rounds, base);

        let mut last = Decimal::ZERO;
        for mult in 1..=5i64 {
            let amount = Decimal::from(start * mult);
            let quote = engine.quote_buy_exact_rounds(market_id, amount).unwrap();
            prop_assert!(quote > last, "quote {} for {} not above {}", quote, amount, last);
            last = quote;
        }
    }

    /// Buying then immediately selling the same rounds back never profits.
    #[test]
    fn round_trip_never_profits(
        (rounds, base) in reserve_strategy(),
        size in trade_size_strategy(),
    ) {
        let (mut engine, _, market_id) = setup_market(rounds, base);
        let usdc = AssetId::new("USDC");
        let trader = engine.create_account();
        engine.fund_account(trader, &usdc, dec!(1_000_000));

        let buy = engine
            .buy_exact_rounds(trader, market_id, size, dec!(1_000_000), FAR_DEADLINE)
            .unwrap();
        let sell = engine
            .sell_exact_rounds(trader, market_id, buy.rounds, Decimal::ZERO, FAR_DEADLINE)
            .unwrap();

        prop_assert!(
            sell.base <= buy.base,
            "round trip profited: paid {}, received {}",
            buy.base,
            sell.base
        );
    }

    /// Non-quantized round amounts fail on the round-denominated swaps, and
    /// the base-denominated swaps only ever move quantized round amounts.
    #[test]
    fn quantization_enforced_everywhere(
        (rounds, base) in reserve_strategy(),
        whole in 1i64..200i64,
        frac in 1i64..999i64,
    ) {
        let (mut engine, _, market_id) = setup_market(rounds, base);
        let usdc = AssetId::new("USDC");
        let trader = engine.create_account();
        engine.fund_account(trader, &usdc, dec!(1_000_000));

        let crooked = Decimal::from(whole) + Decimal::new(frac, 3);

        prop_assert!(engine
            .buy_exact_rounds(trader, market_id, crooked, dec!(1_000_000), FAR_DEADLINE)
            .is_err());
        prop_assert!(engine.quote_buy_exact_rounds(market_id, crooked).is_err());
        prop_assert!(engine
            .sell_exact_rounds(trader, market_id, crooked, Decimal::ZERO, FAR_DEADLINE)
            .is_err());
        prop_assert!(engine.quote_sell_exact_rounds(market_id, crooked).is_err());

        // base-denominated entry points derive quantized round legs
        let bought = engine
            .buy_exact_base(trader, market_id, dec!(500), Decimal::ZERO, FAR_DEADLINE)
            .unwrap();
        prop_assert!((bought.rounds % dec!(1)).is_zero());
    }

    /// The curve constant k = R*B never shrinks across swaps: fees only feed it.
    #[test]
    fn curve_constant_never_decreases(
        (rounds, base) in reserve_strategy(),
        sizes in proptest::collection::vec(1i64..200i64, 1..12),
    ) {
        let (mut engine, _, market_id) = setup_market(rounds, base);
        let usdc = AssetId::new("USDC");
        let trader = engine.create_account();
        engine.fund_account(trader, &usdc, dec!(10_000_000));

        let tolerance = dec!(0.000001);
        for (i, &raw) in sizes.iter().enumerate() {
            let market = engine.get_market(market_id).unwrap();
            let k_before = market.round_reserve * market.base_reserve;
            let size = Decimal::from(raw);

            if i % 2 == 0 {
                let _ = engine.buy_exact_rounds(trader, market_id, size, dec!(10_000_000), FAR_DEADLINE);
            } else {
                let held = engine.round_balance(market_id, trader);
                let sell = held.min(size);
                if sell > Decimal::ZERO {
                    let _ = engine.sell_exact_rounds(trader, market_id, sell, Decimal::ZERO, FAR_DEADLINE);
                }
            }

            let market = engine.get_market(market_id).unwrap();
            let k_after = market.round_reserve * market.base_reserve;
            prop_assert!(
                k_after >= k_before - tolerance,
                "k shrank from {} to {}",
                k_before,
                k_after
            );
        }
    }

    /// Conservation and solvency: outstanding rounds always equal the sum of
    /// balances, and the market vault always backs the base reserve exactly.
    #[test]
    fn conservation_and_vault_solvency(
        (rounds, base) in reserve_strategy(),
        sizes in proptest::collection::vec(1i64..150i64, 1..15),
    ) {
        let (mut engine, _, market_id) = setup_market(rounds, base);
        let usdc = AssetId::new("USDC");

        let traders: Vec<AccountId> = (0..3)
            .map(|_| {
                let id = engine.create_account();
                engine.fund_account(id, &usdc, dec!(10_000_000));
                id
            })
            .collect();

        for (i, &raw) in sizes.iter().enumerate() {
            let trader = traders[i % traders.len()];
            let size = Decimal::from(raw);
            if i % 3 == 2 {
                let held = engine.round_balance(market_id, trader);
                let sell = held.min(size);
                if sell > Decimal::ZERO {
                    let _ = engine.sell_exact_rounds(trader, market_id, sell, Decimal::ZERO, FAR_DEADLINE);
                }
            } else {
                let _ = engine.buy_exact_rounds(trader, market_id, size, dec!(10_000_000), FAR_DEADLINE);
            }

            let market = engine.get_market(market_id).unwrap();
            let balance_sum: Decimal = market.round_balances.values().copied().sum();
            prop_assert_eq!(balance_sum, market.total_rounds_minted);
            // base legs pass through independent fee splits, so allow the
            // last-ulp decimal rounding difference
            let vault_gap = (engine.vault_balance(market_id) - market.base_reserve).abs();
            prop_assert!(vault_gap < dec!(0.0000000001), "vault gap {}", vault_gap);
            prop_assert!(market.round_reserve > Decimal::ZERO);
            prop_assert!(market.base_reserve > Decimal::ZERO);
        }
    }
}
