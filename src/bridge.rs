// 8.0 bridge.rs: MOCKED. stands in for the external liquidity-oracle bridge.
// the engine only ever asks one question: the current exchange ratio from a
// base asset into the primary asset, used to price-normalize reward math.
// routes are checked when a pool is created, never at trade time.

use crate::types::AssetId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PriceBridge {
    routes: HashMap<(AssetId, AssetId), Decimal>,
}

impl PriceBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_route(&mut self, from: &AssetId, to: &AssetId, ratio: Decimal) {
        self.routes.insert((from.clone(), to.clone()), ratio);
    }

    pub fn has_route(&self, from: &AssetId, to: &AssetId) -> bool {
        from == to || self.routes.contains_key(&(from.clone(), to.clone()))
    }

    pub fn ratio(&self, from: &AssetId, to: &AssetId) -> Option<Decimal> {
        if from == to {
            return Some(Decimal::ONE);
        }
        self.routes.get(&(from.clone(), to.clone())).copied()
    }
}
