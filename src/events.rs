// 9.0: every state change produces an event. used for audit trails, state
// reconstruction, and test assertions. the EventPayload enum lists all event
// types.

use crate::auction::BidKind;
use crate::types::{AccountId, AssetId, BlockNumber, ItemKey, MarketId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub block: BlockNumber,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, block: BlockNumber, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            block,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // lifecycle events
    Listed(ListedEvent),
    Delisted(DelistedEvent),

    // trade events
    Swap(SwapEvent),

    // auction events
    BidPlaced(BidPlacedEvent),
    BidWithdrawn(BidWithdrawnEvent),
    BuyoutAccepted(BuyoutAcceptedEvent),

    // distribution events
    PoolCreated(PoolCreatedEvent),
    RewardsHalved(RewardsHalvedEvent),
    EpochCheckpointed(EpochCheckpointedEvent),
    RewardClaimed(RewardClaimedEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListedEvent {
    pub market_id: MarketId,
    pub item: ItemKey,
    pub version: u32,
    pub owner: AccountId,
    pub base_asset: AssetId,
    pub round_reserve: Decimal,
    pub base_reserve: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelistedEvent {
    pub market_id: MarketId,
    pub item: ItemKey,
    pub holders_paid: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SwapDirection {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapEvent {
    pub market_id: MarketId,
    pub trader: AccountId,
    pub direction: SwapDirection,
    /// Rounds credited to (buy) or debited from (sell) the trader.
    pub rounds: Decimal,
    /// Base paid by (buy) or paid to (sell) the trader.
    pub base: Decimal,
    pub base_fee: Decimal,
    pub round_fee: Decimal,
    pub new_round_reserve: Decimal,
    pub new_base_reserve: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidPlacedEvent {
    pub market_id: MarketId,
    pub kind: BidKind,
    pub bidder: AccountId,
    pub amount: Decimal,
    pub expires_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidWithdrawnEvent {
    pub market_id: MarketId,
    pub kind: BidKind,
    pub bidder: AccountId,
    pub refunded: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyoutAcceptedEvent {
    pub market_id: MarketId,
    pub kind: BidKind,
    pub winner: AccountId,
    pub amount: Decimal,
    pub owner_proceeds: Decimal,
    pub holders_paid: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolCreatedEvent {
    pub asset: AssetId,
    pub reward_rate_divisor: Decimal,
    pub gas_reward: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsHalvedEvent {
    pub pools: usize,
}

// which accumulator window closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpochScope {
    Pair,
    Trader(AccountId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochCheckpointedEvent {
    pub market_id: MarketId,
    pub scope: EpochScope,
    pub checkpoint_block: BlockNumber,
    pub reward: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardClaimedEvent {
    pub market_id: MarketId,
    pub scope: EpochScope,
    pub claimer: AccountId,
    pub amount: Decimal,
}
