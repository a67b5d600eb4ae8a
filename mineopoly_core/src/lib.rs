use serde::{Deserialize, Serialize};

pub mod board;
pub mod config;
pub mod environment;
pub mod locator;
pub mod map;
pub mod navigator;
pub mod strategy;
pub mod valuation;

/// Represents a 2D coordinate. (0, 0) is the bottom-left corner of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    /// Returns manhattan distance between two positions
    pub fn manhattan_distance(&self, other: &Position) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// The kinds of resource that can be mined and sold.
///
/// Declaration order matters: it is the tie-break order used when two
/// resources share the highest price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Ruby,
    Emerald,
    Diamond,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Ruby,
        ResourceKind::Emerald,
        ResourceKind::Diamond,
    ];

    /// Number of consecutive mine actions needed before the resource can be picked up.
    pub const fn mines_required(self) -> u32 {
        match self {
            ResourceKind::Ruby => 1,
            ResourceKind::Emerald => 2,
            ResourceKind::Diamond => 3,
        }
    }

    /// The ground tile this resource is mined from.
    pub const fn tile(self) -> TileKind {
        match self {
            ResourceKind::Ruby => TileKind::ResourceRuby,
            ResourceKind::Emerald => TileKind::ResourceEmerald,
            ResourceKind::Diamond => TileKind::ResourceDiamond,
        }
    }
}

/// Represents what occupies a single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Empty,
    ResourceRuby,
    ResourceEmerald,
    ResourceDiamond,
    Recharge,
    MarketRed,
    MarketBlue,
}

impl TileKind {
    /// The resource mined from this tile, if it is a resource tile.
    pub const fn resource(self) -> Option<ResourceKind> {
        match self {
            TileKind::ResourceRuby => Some(ResourceKind::Ruby),
            TileKind::ResourceEmerald => Some(ResourceKind::Emerald),
            TileKind::ResourceDiamond => Some(ResourceKind::Diamond),
            _ => None,
        }
    }
}

/// The two sides of a round. Each side sells at its own market color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Faction {
    #[default]
    Red,
    Blue,
}

impl Faction {
    /// Red is the primary faction.
    pub const fn is_primary(self) -> bool {
        matches!(self, Faction::Red)
    }

    /// The market tile this faction sells at.
    pub const fn market(self) -> TileKind {
        match self {
            Faction::Red => TileKind::MarketRed,
            Faction::Blue => TileKind::MarketBlue,
        }
    }
}
