// 3.0: buyout auction book. each market carries two of these, one per bid kind.
// bids are never eagerly invalidated: a bid priced out by a swap stays in the
// book and regains validity if the quote falls back. validity is a pure
// predicate evaluated at read time in 3.2.

use crate::types::{AccountId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// what the bidder is trying to reclaim outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BidKind {
    /// The underlying item itself. Settlement dissolves the market.
    Item,
    /// The market's ownership token. Round liabilities move with it.
    Ownership,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub bidder: AccountId,
    /// Escrowed principal. Fixed at the live full-buyout quote when placed.
    pub amount: Decimal,
    /// Extra escrow collected on top of `amount`, returned on unbid.
    pub fee_escrow: Decimal,
    pub placed_at: Timestamp,
    pub expires_at: Timestamp,
}

impl Bid {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    // valid = not expired and still at or above the live quote. a bid placed
    // at quote Q stays valid while the market trades at or below Q.
    pub fn is_valid(&self, live_quote: Decimal, now: Timestamp) -> bool {
        !self.is_expired(now) && self.amount >= live_quote
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuctionError {
    #[error("caller already holds a bid of this kind; unbid first")]
    DuplicateBid,

    #[error("no bid of this kind from the caller")]
    BidNotFound,

    #[error("bid has not expired yet and cannot be withdrawn")]
    BidNotExpired,

    #[error("auction already settled")]
    Settled,
}

// 3.1: the per-kind bid set. keyed by bidder, at most one live bid each.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuctionBook {
    bids: Vec<Bid>,
    pub settled: bool,
}

impl AuctionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, bidder: AccountId) -> Option<&Bid> {
        self.bids.iter().find(|b| b.bidder == bidder)
    }

    pub fn insert(&mut self, bid: Bid) -> Result<(), AuctionError> {
        if self.settled {
            return Err(AuctionError::Settled);
        }
        // one bid per bidder per kind, expired or not. re-bidding requires an
        // explicit unbid first.
        if self.get(bid.bidder).is_some() {
            return Err(AuctionError::DuplicateBid);
        }
        self.bids.push(bid);
        Ok(())
    }

    // withdrawal is only permitted once the bid has expired.
    pub fn remove_expired(&mut self, bidder: AccountId, now: Timestamp) -> Result<Bid, AuctionError> {
        let idx = self
            .bids
            .iter()
            .position(|b| b.bidder == bidder)
            .ok_or(AuctionError::BidNotFound)?;
        if !self.bids[idx].is_expired(now) {
            return Err(AuctionError::BidNotExpired);
        }
        Ok(self.bids.remove(idx))
    }

    pub fn remove(&mut self, bidder: AccountId) -> Option<Bid> {
        let idx = self.bids.iter().position(|b| b.bidder == bidder)?;
        Some(self.bids.remove(idx))
    }

    // 3.2: winner selection. highest valid amount; ties break on earliest
    // placement, then lowest bidder id, so the result is deterministic no
    // matter the insertion history.
    pub fn best_valid(&self, live_quote: Decimal, now: Timestamp) -> Option<&Bid> {
        self.bids
            .iter()
            .filter(|b| b.is_valid(live_quote, now))
            .max_by(|a, b| {
                a.amount
                    .cmp(&b.amount)
                    .then(b.placed_at.cmp(&a.placed_at))
                    .then(b.bidder.cmp(&a.bidder))
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bid> {
        self.bids.iter()
    }

    pub fn len(&self) -> usize {
        self.bids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bid(bidder: u64, amount: Decimal, placed: i64, expires: i64) -> Bid {
        Bid {
            bidder: AccountId(bidder),
            amount,
            fee_escrow: Decimal::ZERO,
            placed_at: Timestamp::from_millis(placed),
            expires_at: Timestamp::from_millis(expires),
        }
    }

    #[test]
    fn duplicate_bid_rejected() {
        let mut book = AuctionBook::new();
        book.insert(bid(1, dec!(100), 0, 1000)).unwrap();
        let err = book.insert(bid(1, dec!(120), 5, 1000)).unwrap_err();
        assert_eq!(err, AuctionError::DuplicateBid);
    }

    #[test]
    fn duplicate_blocked_even_after_expiry() {
        let mut book = AuctionBook::new();
        book.insert(bid(1, dec!(100), 0, 10)).unwrap();
        // bid is long expired but still occupies the slot
        let err = book.insert(bid(1, dec!(100), 500, 2000)).unwrap_err();
        assert_eq!(err, AuctionError::DuplicateBid);
    }

    #[test]
    fn unbid_requires_expiry() {
        let mut book = AuctionBook::new();
        book.insert(bid(1, dec!(100), 0, 1000)).unwrap();

        let err = book
            .remove_expired(AccountId(1), Timestamp::from_millis(500))
            .unwrap_err();
        assert_eq!(err, AuctionError::BidNotExpired);

        let removed = book
            .remove_expired(AccountId(1), Timestamp::from_millis(1000))
            .unwrap();
        assert_eq!(removed.amount, dec!(100));
        assert!(book.is_empty());
    }

    #[test]
    fn validity_follows_live_quote() {
        let book = {
            let mut b = AuctionBook::new();
            b.insert(bid(1, dec!(100), 0, 1000)).unwrap();
            b
        };
        let now = Timestamp::from_millis(100);

        // valid while the quote sits at or below the bid
        assert!(book.best_valid(dec!(100), now).is_some());
        assert!(book.best_valid(dec!(80), now).is_some());
        // invisible the instant the quote rises above it
        assert!(book.best_valid(dec!(100.01), now).is_none());
        // and visible again once it falls back
        assert!(book.best_valid(dec!(99), now).is_some());
    }

    #[test]
    fn expired_bid_never_wins() {
        let mut book = AuctionBook::new();
        book.insert(bid(1, dec!(100), 0, 50)).unwrap();
        assert!(book.best_valid(dec!(90), Timestamp::from_millis(50)).is_none());
    }

    #[test]
    fn highest_valid_amount_wins() {
        let mut book = AuctionBook::new();
        book.insert(bid(1, dec!(100), 0, 1000)).unwrap();
        book.insert(bid(2, dec!(130), 10, 1000)).unwrap();
        book.insert(bid(3, dec!(120), 20, 1000)).unwrap();

        let winner = book.best_valid(dec!(95), Timestamp::from_millis(100)).unwrap();
        assert_eq!(winner.bidder, AccountId(2));

        // a quote above the top bid silences everyone
        assert!(book.best_valid(dec!(131), Timestamp::from_millis(100)).is_none());
    }

    #[test]
    fn ties_break_on_earliest_placement() {
        let mut book = AuctionBook::new();
        book.insert(bid(7, dec!(100), 40, 1000)).unwrap();
        book.insert(bid(3, dec!(100), 10, 1000)).unwrap();

        let winner = book.best_valid(dec!(90), Timestamp::from_millis(100)).unwrap();
        assert_eq!(winner.bidder, AccountId(3));
    }

    #[test]
    fn settled_book_rejects_new_bids() {
        let mut book = AuctionBook::new();
        book.settled = true;
        let err = book.insert(bid(1, dec!(100), 0, 1000)).unwrap_err();
        assert_eq!(err, AuctionError::Settled);
    }
}
