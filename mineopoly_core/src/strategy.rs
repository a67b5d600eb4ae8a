use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    Position, ResourceKind, TileKind,
    board::{BoardView, PriceTable},
    config::RoundConfig,
    locator::{nearest_other_tile_of_kind, nearest_tile_of_kind},
    navigator::{Direction, step_toward},
    valuation::most_valuable_resource,
};

/// Represents actions a strategy can decide to take on its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Move(Direction),
    Mine,
    Collect,
    NoAction,
}

/// What the strategy was doing on its last turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    SeekingResource,
    Mining,
    AwaitingPickup,
    SeekingMarket,
    Recharging,
    LockedOnCharger,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StrategyError {
    #[error("board is {width}x{height}, expected {expected}x{expected}")]
    BoardSizeMismatch {
        width: usize,
        height: usize,
        expected: usize,
    },
    #[error("player position ({x}, {y}) is outside the board")]
    OutOfBounds { x: usize, y: usize },
    #[error("received an item with a full inventory of {capacity}")]
    InventoryOverflow { capacity: u32 },
}

/// Contract between the host game and a player strategy.
///
/// The host calls [`initialize`](Self::initialize) once per round, then
/// [`decide_turn`](Self::decide_turn) once per turn, and reports pickups and
/// sales through the callbacks.
pub trait MinePlayerStrategy {
    fn initialize(
        &mut self,
        config: RoundConfig,
        starting_board: &BoardView,
        start: Position,
        rng: &mut StdRng,
    );

    /// Picks this turn's action. Never fails: a turn that cannot be decided is
    /// reported as [`Action::NoAction`].
    fn decide_turn(
        &mut self,
        view: &BoardView,
        prices: &PriceTable,
        current_charge: u32,
        is_primary_turn: bool,
    ) -> Action;

    fn on_item_received(&mut self, item: ResourceKind) -> Result<(), StrategyError>;

    fn on_inventory_sold(&mut self, total_price: u32);

    fn on_round_end(&mut self, own_score: u32, opponent_score: u32);

    fn name(&self) -> &'static str;
}

/// Mines the most valuable resource until the inventory is full, sells at the
/// nearest market of its faction, and recharges when a quarter charge is left.
#[derive(Debug, Default)]
pub struct GreedyMiner {
    config: RoundConfig,
    current_location: Position,
    destination: Option<Position>,
    mine_count: u32,
    inventory_size: u32,
    score: u32,
    phase: Phase,
}

impl GreedyMiner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    pub fn destination(&self) -> Option<Position> {
        self.destination
    }

    pub fn current_location(&self) -> Position {
        self.current_location
    }

    pub fn mine_count(&self) -> u32 {
        self.mine_count
    }

    pub fn inventory_size(&self) -> u32 {
        self.inventory_size
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Changing the destination always restarts the mine count.
    fn set_destination(&mut self, destination: Option<Position>) {
        if self.destination != destination {
            self.destination = destination;
            self.mine_count = 0;
        }
    }

    fn validate(&self, view: &BoardView) -> Result<(), StrategyError> {
        let expected = self.config.board_size;
        let (width, height) = (view.tiles.width(), view.tiles.height());
        if width != expected || height != expected {
            return Err(StrategyError::BoardSizeMismatch {
                width,
                height,
                expected,
            });
        }
        if !view.tiles.contains(view.location) {
            return Err(StrategyError::OutOfBounds {
                x: view.location.x,
                y: view.location.y,
            });
        }
        Ok(())
    }

    fn plan(
        &mut self,
        view: &BoardView,
        prices: &PriceTable,
        charge: u32,
    ) -> Result<Action, StrategyError> {
        self.validate(view)?;
        let here = view.location;
        self.current_location = here;

        // Cannot leave a charger until full.
        if charge < self.config.max_charge && view.own_tile() == Some(TileKind::Recharge) {
            self.phase = Phase::LockedOnCharger;
            return Ok(Action::NoAction);
        }

        if self.config.is_low_charge(charge) {
            self.phase = Phase::Recharging;
            let charger = nearest_tile_of_kind(view.tiles, TileKind::Recharge, here);
            return Ok(self.head_to(here, charger));
        }

        let wanted = most_valuable_resource(prices);
        let capacity = self.config.max_inventory;
        if self.inventory_size < capacity {
            Ok(self.gather(view, wanted))
        } else if self.inventory_size == capacity {
            Ok(self.sell(view, wanted))
        } else {
            Ok(Action::NoAction)
        }
    }

    /// Retargets to `target` and steps toward it. Keeps the current
    /// destination when there is nothing to target.
    fn head_to(&mut self, here: Position, target: Option<Position>) -> Action {
        match target {
            Some(target) => {
                self.set_destination(Some(target));
                step(here, target)
            }
            None => {
                debug!(phase = ?self.phase, "no target tile on the board");
                Action::NoAction
            }
        }
    }

    /// Keeps walking to whatever destination is already set.
    fn hold_course(&self, here: Position) -> Action {
        self.destination
            .map_or(Action::NoAction, |destination| step(here, destination))
    }

    fn gather(&mut self, view: &BoardView, wanted: Option<ResourceKind>) -> Action {
        let here = view.location;
        self.phase = Phase::SeekingResource;
        let Some(kind) = wanted else {
            return self.hold_course(here);
        };
        let tile = kind.tile();

        // The destination must still show the resource being pursued.
        let destination = match self.destination.filter(|d| view.tile_at(*d) == Some(tile)) {
            Some(destination) => destination,
            None => match nearest_tile_of_kind(view.tiles, tile, here) {
                Some(found) => {
                    self.set_destination(Some(found));
                    found
                }
                None => return self.hold_course(here),
            },
        };

        if here != destination {
            return step(here, destination);
        }

        if self.mine_count < kind.mines_required() {
            self.mine_count += 1;
            self.phase = Phase::Mining;
            return Action::Mine;
        }

        self.phase = Phase::AwaitingPickup;
        let next = nearest_other_tile_of_kind(view.tiles, tile, here);
        self.set_destination(next);
        self.mine_count = 0;
        Action::Collect
    }

    fn sell(&mut self, view: &BoardView, wanted: Option<ResourceKind>) -> Action {
        let here = view.location;
        self.phase = Phase::SeekingMarket;
        let Some(market) = nearest_tile_of_kind(view.tiles, self.config.faction.market(), here)
        else {
            debug!(faction = ?self.config.faction, "no market for this faction");
            return Action::NoAction;
        };
        self.set_destination(Some(market));
        if here != market {
            return step(here, market);
        }

        // The host sells on arrival, so head straight back out.
        self.phase = Phase::SeekingResource;
        let next = wanted.and_then(|kind| nearest_tile_of_kind(view.tiles, kind.tile(), here));
        self.head_to(here, next)
    }
}

fn step(here: Position, destination: Position) -> Action {
    step_toward(here, destination).map_or(Action::NoAction, Action::Move)
}

impl MinePlayerStrategy for GreedyMiner {
    fn initialize(
        &mut self,
        config: RoundConfig,
        starting_board: &BoardView,
        start: Position,
        _rng: &mut StdRng,
    ) {
        *self = GreedyMiner {
            config,
            current_location: start,
            ..GreedyMiner::default()
        };
        // Prices may not be populated yet; diamonds are worth the most at round start.
        let first = nearest_tile_of_kind(starting_board.tiles, TileKind::ResourceDiamond, start);
        self.set_destination(first);
        info!(
            strategy = self.name(),
            ?config,
            destination = ?self.destination,
            "round initialized"
        );
    }

    fn decide_turn(
        &mut self,
        view: &BoardView,
        prices: &PriceTable,
        current_charge: u32,
        _is_primary_turn: bool,
    ) -> Action {
        match self.plan(view, prices, current_charge) {
            Ok(action) => {
                debug!(
                    turn = view.turn,
                    ?action,
                    phase = ?self.phase,
                    destination = ?self.destination,
                    charge = current_charge,
                    "turn decided"
                );
                action
            }
            Err(err) => {
                warn!(turn = view.turn, error = %err, "turn degraded to no action");
                Action::NoAction
            }
        }
    }

    fn on_item_received(&mut self, item: ResourceKind) -> Result<(), StrategyError> {
        let capacity = self.config.max_inventory;
        if self.inventory_size >= capacity {
            warn!(?item, capacity, "item received with a full inventory");
            return Err(StrategyError::InventoryOverflow { capacity });
        }
        self.inventory_size += 1;
        debug!(?item, inventory = self.inventory_size, "item received");
        Ok(())
    }

    fn on_inventory_sold(&mut self, total_price: u32) {
        self.score = self.score.saturating_add(total_price);
        self.inventory_size = 0;
        info!(total_price, score = self.score, "inventory sold");
    }

    fn on_round_end(&mut self, own_score: u32, opponent_score: u32) {
        info!(own_score, opponent_score, "round over");
        *self = GreedyMiner::default();
    }

    fn name(&self) -> &'static str {
        "greedy-miner"
    }
}
