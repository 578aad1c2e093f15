// 10.0.2: result types and errors for engine operations.

use crate::auction::{AuctionError, BidKind};
use crate::curve::CurveError;
use crate::ledger::LedgerError;
use crate::market::MarketError;
use crate::rewards::RewardError;
use crate::types::{AccountId, MarketId, Timestamp};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct SwapResult {
    pub market_id: MarketId,
    pub trader: AccountId,
    /// Rounds credited to (buy) or debited from (sell) the trader.
    pub rounds: Decimal,
    /// Base paid by (buy) or received by (sell) the trader.
    pub base: Decimal,
    pub base_fee: Decimal,
    pub round_fee: Decimal,
    pub new_round_reserve: Decimal,
    pub new_base_reserve: Decimal,
    /// Pair-level reward finalized by this trade, if a window closed.
    pub pair_reward: Option<Decimal>,
    /// Trader-level reward (including the gas bonus) finalized by this trade.
    pub trader_reward: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct AcceptResult {
    pub market_id: MarketId,
    pub kind: BidKind,
    pub winner: AccountId,
    pub amount: Decimal,
    pub owner_proceeds: Decimal,
    /// Round holders bought back during item settlement (0 for ownership).
    pub holders_paid: usize,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("market {0:?} not found")]
    MarketNotFound(MarketId),

    #[error("deadline {deadline} passed at {now}")]
    DeadlineExpired { deadline: Timestamp, now: Timestamp },

    #[error("slippage bound violated: limit {limit}, actual {actual}")]
    SlippageExceeded { limit: Decimal, actual: Decimal },

    #[error("bid must equal the live quote {expected}, got {got}")]
    BidAmountMismatch { expected: Decimal, got: Decimal },

    #[error("no valid bid to accept")]
    NoValidBid,

    #[error("owner proceeds {actual} below minimum {minimum}")]
    ProceedsBelowMinimum { minimum: Decimal, actual: Decimal },

    #[error("caller is not the market owner")]
    NotMarketOwner(MarketId),

    #[error("caller is not the protocol owner")]
    NotProtocolOwner,

    #[error("the market owner cannot bid on their own market")]
    OwnerCannotBid,

    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("market error: {0}")]
    Market(#[from] MarketError),

    #[error("curve error: {0}")]
    Curve(#[from] CurveError),

    #[error("auction error: {0}")]
    Auction(#[from] AuctionError),

    #[error("reward error: {0}")]
    Reward(#[from] RewardError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
