use serde::{Deserialize, Serialize};

use crate::Faction;

/// Per-round settings handed to a strategy when the round starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    /// Length of one side of the square board.
    pub board_size: usize,
    /// Maximum number of items carried at once.
    pub max_inventory: u32,
    /// Charge of a fully charged robot. One unit is spent per move or mine.
    pub max_charge: u32,
    /// The first player to reach this score wins the round.
    pub winning_score: u32,
    pub faction: Faction,
}

impl Default for RoundConfig {
    fn default() -> Self {
        RoundConfig {
            board_size: 16,
            max_inventory: 5,
            max_charge: 80,
            winning_score: 480,
            faction: Faction::Red,
        }
    }
}

impl RoundConfig {
    /// True at or below a quarter of the maximum charge.
    pub fn is_low_charge(&self, charge: u32) -> bool {
        charge <= self.max_charge && u64::from(charge) * 4 <= u64::from(self.max_charge)
    }
}
