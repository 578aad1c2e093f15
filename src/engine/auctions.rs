// 10.4 engine/auctions.rs: buyout bidding and settlement. poll() is the single
// source of truth for the winner; accept() re-derives it against current
// reserves instead of trusting anything the caller saw earlier, so a swap
// landing between a client's poll and its accept changes the outcome, never
// the invariants.

use super::core::Engine;
use super::results::{AcceptResult, EngineError};
use crate::auction::{AuctionError, Bid, BidKind};
use crate::events::{BidPlacedEvent, BidWithdrawnEvent, BuyoutAcceptedEvent, EventPayload};
use crate::ledger::{Holder, ItemHolder};
use crate::types::{AccountId, MarketId, Timestamp};
use rust_decimal::Decimal;

impl Engine {
    /// Place a buyout bid at exactly the live quote. Escrows the bid amount
    /// plus the nft fee; the bid stays binding until `bid_timeout` elapses.
    pub fn bid(
        &mut self,
        caller: AccountId,
        market_id: MarketId,
        kind: BidKind,
        amount: Decimal,
        deadline: Timestamp,
    ) -> Result<(), EngineError> {
        self.check_deadline(deadline)?;
        self.ensure_live(market_id)?;

        let (asset, quote) = {
            let market = self.market(market_id)?;
            if caller == market.owner {
                return Err(EngineError::OwnerCannotBid);
            }
            let book = market.auction(kind);
            if book.settled {
                return Err(AuctionError::Settled.into());
            }
            if book.get(caller).is_some() {
                return Err(AuctionError::DuplicateBid.into());
            }
            (market.info.base_asset.clone(), market.buyout_quote(kind))
        };

        // no slippage band here: the bid must hit the quote exactly
        if amount != quote {
            return Err(EngineError::BidAmountMismatch {
                expected: quote,
                got: amount,
            });
        }

        let nft_fee = self.config.fees.nft_fee(amount);
        let expires_at = self.current_time.plus_millis(self.config.bid_timeout_ms);

        self.base_ledger.transfer(
            &asset,
            Holder::Account(caller),
            Holder::Escrow(market_id),
            amount + nft_fee,
        )?;

        let bid = Bid {
            bidder: caller,
            amount,
            fee_escrow: nft_fee,
            placed_at: self.current_time,
            expires_at,
        };
        self.market_mut(market_id)?.auction_mut(kind).insert(bid)?;

        self.emit_event(EventPayload::BidPlaced(BidPlacedEvent {
            market_id,
            kind,
            bidder: caller,
            amount,
            expires_at,
        }));

        Ok(())
    }

    /// Withdraw an expired bid and recover its escrow. Deliberately works on
    /// dead and superseded markets: losing escrow must never strand.
    pub fn unbid(
        &mut self,
        caller: AccountId,
        market_id: MarketId,
        kind: BidKind,
        deadline: Timestamp,
    ) -> Result<Decimal, EngineError> {
        self.check_deadline(deadline)?;
        let now = self.current_time;

        let (asset, bid) = {
            let market = self.market_mut(market_id)?;
            let asset = market.info.base_asset.clone();
            let bid = market.auction_mut(kind).remove_expired(caller, now)?;
            (asset, bid)
        };

        let refund = bid.amount + bid.fee_escrow;
        self.base_ledger.transfer(
            &asset,
            Holder::Escrow(market_id),
            Holder::Account(caller),
            refund,
        )?;

        self.emit_event(EventPayload::BidWithdrawn(BidWithdrawnEvent {
            market_id,
            kind,
            bidder: caller,
            refunded: refund,
        }));

        Ok(refund)
    }

    /// Live full-buyout quote for a market and kind.
    pub fn buyout_quote(&self, market_id: MarketId, kind: BidKind) -> Result<Decimal, EngineError> {
        Ok(self.market(market_id)?.buyout_quote(kind))
    }

    /// Best bid that is neither expired nor priced out by the live quote.
    /// Pure: bids that a price rise silenced reappear when the price falls.
    pub fn poll(
        &self,
        market_id: MarketId,
        kind: BidKind,
    ) -> Result<Option<(AccountId, Decimal)>, EngineError> {
        self.ensure_live(market_id)?;
        let market = self.market(market_id)?;
        let quote = market.buyout_quote(kind);
        Ok(market
            .auction(kind)
            .best_valid(quote, self.current_time)
            .map(|bid| (bid.bidder, bid.amount)))
    }

    /// Owner accepts the current winner, re-derived atomically. Item buyouts
    /// dissolve the market and buy every round holder back pro rata; ownership
    /// buyouts hand the market token (and its round liabilities) to the winner.
    pub fn accept(
        &mut self,
        caller: AccountId,
        market_id: MarketId,
        kind: BidKind,
        min_amount_out: Decimal,
        deadline: Timestamp,
    ) -> Result<AcceptResult, EngineError> {
        self.check_deadline(deadline)?;
        self.ensure_live(market_id)?;

        let (owner, item, asset, winner) = {
            let market = self.market(market_id)?;
            if caller != market.owner {
                return Err(EngineError::NotMarketOwner(market_id));
            }
            let book = market.auction(kind);
            if book.settled {
                return Err(AuctionError::Settled.into());
            }
            let quote = market.buyout_quote(kind);
            let winner = book
                .best_valid(quote, self.current_time)
                .cloned()
                .ok_or(EngineError::NoValidBid)?;
            (
                market.owner,
                market.info.item.clone(),
                market.info.base_asset.clone(),
                winner,
            )
        };

        let nft_fee = self.config.fees.nft_fee(winner.amount);
        let proceeds = winner.amount - nft_fee;
        if proceeds < min_amount_out {
            return Err(EngineError::ProceedsBelowMinimum {
                minimum: min_amount_out,
                actual: proceeds,
            });
        }

        // consume the winning bid and close the book
        {
            let market = self.market_mut(market_id)?;
            let book = market.auction_mut(kind);
            book.remove(winner.bidder);
            book.settled = true;
        }

        // escrow splits into owner proceeds and the treasury's fee cut
        let escrowed = winner.amount + winner.fee_escrow;
        self.base_ledger.transfer(
            &asset,
            Holder::Escrow(market_id),
            Holder::Account(owner),
            proceeds,
        )?;
        self.base_ledger.transfer(
            &asset,
            Holder::Escrow(market_id),
            Holder::Treasury,
            escrowed - proceeds,
        )?;

        let holders_paid = match kind {
            BidKind::Item => {
                self.item_ledger
                    .transfer(&item, ItemHolder::Account(winner.bidder))?;
                self.dissolve(market_id)?
            }
            BidKind::Ownership => {
                self.market_mut(market_id)?.owner = winner.bidder;
                0
            }
        };

        self.emit_event(EventPayload::BuyoutAccepted(BuyoutAcceptedEvent {
            market_id,
            kind,
            winner: winner.bidder,
            amount: winner.amount,
            owner_proceeds: proceeds,
            holders_paid,
        }));

        Ok(AcceptResult {
            market_id,
            kind,
            winner: winner.bidder,
            amount: winner.amount,
            owner_proceeds: proceeds,
            holders_paid,
        })
    }
}
