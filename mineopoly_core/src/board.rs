use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Position, ResourceKind, TileKind, map::Grid};

/// Read-only view of the board handed to a strategy for a single turn.
///
/// The view borrows the host's grid, so a strategy cannot keep it past the call.
#[derive(Debug, Clone, Copy)]
pub struct BoardView<'a> {
    pub tiles: &'a Grid<TileKind>,
    pub location: Position,
    pub opponent_location: Option<Position>,
    pub turn: u64,
}

impl<'a> BoardView<'a> {
    pub fn new(tiles: &'a Grid<TileKind>, location: Position) -> Self {
        BoardView {
            tiles,
            location,
            opponent_location: None,
            turn: 0,
        }
    }

    /// Tile kind at `position`, or `None` when it lies outside the board.
    pub fn tile_at(&self, position: Position) -> Option<TileKind> {
        self.tiles.get(position).copied()
    }

    /// Tile kind under the viewing player.
    pub fn own_tile(&self) -> Option<TileKind> {
        self.tile_at(self.location)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    #[error("price for {kind:?} must be positive")]
    NonPositive { kind: ResourceKind },
}

/// Current unit sell price for each resource kind.
///
/// Iterates in [`ResourceKind`] declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTable {
    prices: BTreeMap<ResourceKind, u32>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(kind, price)` pairs, rejecting zero prices.
    pub fn from_prices(
        prices: impl IntoIterator<Item = (ResourceKind, u32)>,
    ) -> Result<Self, PriceError> {
        let mut table = PriceTable::new();
        for (kind, price) in prices {
            table.set(kind, price)?;
        }
        Ok(table)
    }

    pub fn set(&mut self, kind: ResourceKind, price: u32) -> Result<(), PriceError> {
        if price == 0 {
            return Err(PriceError::NonPositive { kind });
        }
        self.prices.insert(kind, price);
        Ok(())
    }

    pub fn get(&self, kind: ResourceKind) -> Option<u32> {
        self.prices.get(&kind).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, u32)> + '_ {
        self.prices.iter().map(|(kind, price)| (*kind, *price))
    }
}
