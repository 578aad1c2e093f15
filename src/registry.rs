// 6.0: the pair registry. one explicit store object owning every market record
// and, per underlying item, the ordered history of its listings. the engine
// holds exactly one of these for its whole lifetime; every component reads and
// writes markets through it.

use crate::market::MarketState;
use crate::types::{ItemKey, MarketId, Version};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PairRegistry {
    markets: HashMap<MarketId, MarketState>,
    // listing history per item, oldest first. the last entry is current.
    history: HashMap<ItemKey, Vec<MarketId>>,
    next_id: u64,
}

impl PairRegistry {
    pub fn new() -> Self {
        Self {
            markets: HashMap::new(),
            history: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn allocate_id(&mut self) -> MarketId {
        let id = MarketId(self.next_id);
        self.next_id += 1;
        id
    }

    // version for the next listing of this item: one past the number of
    // listings it has had.
    pub fn next_version(&self, item: &ItemKey) -> Version {
        match self.history.get(item) {
            Some(ids) => Version(ids.len() as u32 + 1),
            None => Version::first(),
        }
    }

    pub fn insert(&mut self, state: MarketState) {
        let id = state.info.id;
        let item = state.info.item.clone();
        self.history.entry(item).or_default().push(id);
        self.markets.insert(id, state);
    }

    pub fn get(&self, id: MarketId) -> Option<&MarketState> {
        self.markets.get(&id)
    }

    pub fn get_mut(&mut self, id: MarketId) -> Option<&mut MarketState> {
        self.markets.get_mut(&id)
    }

    // the highest-version market id for an item, if it was ever listed.
    pub fn current_id(&self, item: &ItemKey) -> Option<MarketId> {
        self.history.get(item).and_then(|ids| ids.last().copied())
    }

    pub fn current(&self, item: &ItemKey) -> Option<&MarketState> {
        self.current_id(item).and_then(|id| self.get(id))
    }

    // a market is current while no later version of its item exists.
    pub fn is_current(&self, id: MarketId) -> bool {
        match self.markets.get(&id) {
            Some(state) => self.current_id(&state.info.item) == Some(id),
            None => false,
        }
    }

    pub fn versions(&self, item: &ItemKey) -> &[MarketId] {
        self.history.get(item).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MarketId, &MarketState)> {
        self.markets.iter()
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}
