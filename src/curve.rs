// 2.0: bonding-curve pricing. pure math over (round_reserve, base_reserve), no
// state access. the curve is constant-product: round_reserve * base_reserve = k.
// buying rounds drains round_reserve and fills base_reserve, so the marginal
// price B/R rises strictly with every unit bought. fees are applied by the
// engine on top of these raw quotes. 2.1+ has the four quote directions,
// 2.5+ the quantization helpers.

use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CurveError {
    #[error("curve reserves must be strictly positive")]
    EmptyReserves,

    #[error("requested rounds exceed the round reserve")]
    InsufficientRoundReserve,

    #[error("requested base exceeds the base reserve")]
    InsufficientBaseReserve,
}

fn check_reserves(round_reserve: Decimal, base_reserve: Decimal) -> Result<(), CurveError> {
    if round_reserve <= Decimal::ZERO || base_reserve <= Decimal::ZERO {
        return Err(CurveError::EmptyReserves);
    }
    Ok(())
}

// 2.1: base needed to pull `rounds_out` off the curve. B*r / (R - r).
// diverges as rounds_out approaches the reserve, which is the point: the last
// round is never purchasable.
pub fn base_in_for_rounds_out(
    round_reserve: Decimal,
    base_reserve: Decimal,
    rounds_out: Decimal,
) -> Result<Decimal, CurveError> {
    check_reserves(round_reserve, base_reserve)?;
    if rounds_out >= round_reserve {
        return Err(CurveError::InsufficientRoundReserve);
    }
    Ok(base_reserve * rounds_out / (round_reserve - rounds_out))
}

// 2.2: rounds received for `base_in` paid into the curve. R*b / (B + b).
pub fn rounds_out_for_base_in(
    round_reserve: Decimal,
    base_reserve: Decimal,
    base_in: Decimal,
) -> Result<Decimal, CurveError> {
    check_reserves(round_reserve, base_reserve)?;
    Ok(round_reserve * base_in / (base_reserve + base_in))
}

// 2.3: base released for `rounds_in` sold into the curve. B*r / (R + r).
pub fn base_out_for_rounds_in(
    round_reserve: Decimal,
    base_reserve: Decimal,
    rounds_in: Decimal,
) -> Result<Decimal, CurveError> {
    check_reserves(round_reserve, base_reserve)?;
    Ok(base_reserve * rounds_in / (round_reserve + rounds_in))
}

// 2.4: rounds that must be sold to extract `base_out`. R*b / (B - b).
pub fn rounds_in_for_base_out(
    round_reserve: Decimal,
    base_reserve: Decimal,
    base_out: Decimal,
) -> Result<Decimal, CurveError> {
    check_reserves(round_reserve, base_reserve)?;
    if base_out >= base_reserve {
        return Err(CurveError::InsufficientBaseReserve);
    }
    Ok(round_reserve * base_out / (base_reserve - base_out))
}

// marginal price of one round in base units.
pub fn spot_price(round_reserve: Decimal, base_reserve: Decimal) -> Decimal {
    if round_reserve.is_zero() {
        return Decimal::ZERO;
    }
    base_reserve / round_reserve
}

// 2.5: quantization. round amounts only ever move in whole multiples of the
// market's round unit. derived amounts are snapped in the curve's favor.
pub fn quantize_down(amount: Decimal, unit: Decimal) -> Decimal {
    if unit.is_zero() {
        return amount;
    }
    (amount / unit).floor() * unit
}

pub fn quantize_up(amount: Decimal, unit: Decimal) -> Decimal {
    if unit.is_zero() {
        return amount;
    }
    (amount / unit).ceil() * unit
}

pub fn is_quantized(amount: Decimal, unit: Decimal) -> bool {
    if unit.is_zero() {
        return true;
    }
    (amount % unit).is_zero()
}
