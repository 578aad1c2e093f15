// rounds-core: fractional NFT market engine.
// curve-first architecture: the bonding curve prices everything, auctions and
// rewards read through it. all computation is deterministic with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: MarketId, AccountId, ItemKey, BlockNumber, Timestamp
//   2.x  curve.rs: constant-product pricing math and quantization
//   3.x  auction.rs: buyout bid books, read-time validity predicate
//   4.x  rewards.rs: distribution pools, epoch windows, lazy checkpointing
//   5.x  market.rs: market instance state: reserves, balances, auctions, windows
//   6.x  registry.rs: pair registry, per-item version history
//   7.x  ledger.rs: base-asset + item ledgers (mocked collaborators)
//   8.x  bridge.rs: cross-asset price bridge (mocked)
//   9.x  events.rs: state transition events for audit
//   10.x engine/: core engine: lifecycle, swaps, auctions, rewards

// core market modules
pub mod auction;
pub mod curve;
pub mod engine;
pub mod events;
pub mod market;
pub mod registry;
pub mod rewards;
pub mod types;

// integration modules
pub mod bridge;
pub mod ledger;

// re exports for convenience
pub use auction::*;
pub use curve::*;
pub use engine::*;
pub use events::*;
pub use market::*;
pub use registry::*;
pub use rewards::*;
pub use types::*;
pub use bridge::PriceBridge;
pub use ledger::{BaseLedger, Holder, ItemHolder, ItemLedger, LedgerError};
