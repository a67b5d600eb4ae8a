use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    Position, ResourceKind, TileKind,
    board::{BoardView, PriceTable},
    config::RoundConfig,
    map::{Grid, GridError},
    strategy::{Action, MinePlayerStrategy},
};

/// Charge restored for every turn ended on a recharge tile.
pub const RECHARGE_PER_TURN: u32 = 10;
/// Price drop applied per unit sold.
pub const PRICE_DROP_PER_SALE: u32 = 20;
/// Price regained each turn until the base price is reached again.
pub const PRICE_RECOVERY_PER_TURN: u32 = 2;

pub const DEFAULT_PRICES: [(ResourceKind, u32); 3] = [
    (ResourceKind::Ruby, 50),
    (ResourceKind::Emerald, 120),
    (ResourceKind::Diamond, 200),
];

/// Represents the outcome of processing a player's action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult {
    Success,
    Failure(String),
    Win,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("Map string is empty.")]
    Empty,
    #[error("Inconsistent width at row {row}: expected {expected}, found {found}")]
    InconsistentWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Map is {width}x{height}, boards must be square.")]
    NotSquare { width: usize, height: usize },
    #[error("Unknown map code '{code}' at position ({x}, {y}).")]
    UnknownCode { code: String, x: usize, y: usize },
    #[error("Multiple start positions ('ST') found.")]
    MultipleStarts,
    #[error("No start position ('ST') found in map.")]
    MissingStart,
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Holds the host-side state of the player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub position: Position,
    pub charge: u32,
    pub items: Vec<ResourceKind>,
    pub score: u32,
    /// Mine actions spent on the current tile.
    pub mine_progress: u32,
}

/// A parsed map: the tiles plus the start marker, if the map had one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBoard {
    pub tiles: Grid<TileKind>,
    pub start: Option<Position>,
}

/// Runs a single player through a round: asks the strategy for an action
/// each turn and applies the game rules to it.
pub struct Environment<S> {
    pub tiles: Grid<TileKind>,
    pub prices: PriceTable,
    pub player: PlayerState,
    pub config: RoundConfig,
    base_prices: PriceTable,
    strategy: S,
    turn: u64,
    rng: StdRng,
    finished: bool,
}

impl<S: MinePlayerStrategy> Environment<S> {
    /// Creates the environment and initializes the strategy for the round.
    pub fn new(
        tiles: Grid<TileKind>,
        start: Position,
        config: RoundConfig,
        prices: PriceTable,
        mut strategy: S,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        strategy.initialize(config, &BoardView::new(&tiles, start), start, &mut rng);
        Environment {
            player: PlayerState {
                position: start,
                charge: config.max_charge,
                items: Vec::new(),
                score: 0,
                mine_progress: 0,
            },
            tiles,
            base_prices: prices.clone(),
            prices,
            config,
            strategy,
            turn: 0,
            rng,
            finished: false,
        }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Processes one turn for the player.
    pub fn process_turn(&mut self) -> ActionResult {
        if self.finished {
            return ActionResult::Failure("The round is already over.".to_string());
        }
        self.turn += 1;

        let view = BoardView {
            tiles: &self.tiles,
            location: self.player.position,
            opponent_location: None,
            turn: self.turn,
        };
        let action = self.strategy.decide_turn(
            &view,
            &self.prices,
            self.player.charge,
            self.config.faction.is_primary(),
        );

        let result = self.process_action(action);
        if let ActionResult::Failure(reason) = &result {
            debug!(turn = self.turn, ?action, %reason, "action failed");
        }
        self.settle_tile();
        self.recover_prices();

        if self.player.score >= self.config.winning_score {
            self.finished = true;
            self.strategy.on_round_end(self.player.score, 0);
            info!(turn = self.turn, score = self.player.score, "winning score reached");
            return ActionResult::Win;
        }
        result
    }

    /// Applies a single action to the player.
    pub fn process_action(&mut self, action: Action) -> ActionResult {
        let position = self.player.position;
        match action {
            Action::NoAction => ActionResult::Success,
            Action::Move(direction) => {
                if self.player.charge == 0 {
                    return ActionResult::Failure("Out of charge.".to_string());
                }
                let Some(target) =
                    direction.apply(position, self.tiles.width(), self.tiles.height())
                else {
                    return ActionResult::Failure("Target position is out of bounds.".to_string());
                };
                self.player.position = target;
                self.player.charge -= 1;
                self.player.mine_progress = 0;
                ActionResult::Success
            }
            Action::Mine => {
                if self.player.charge == 0 {
                    return ActionResult::Failure("Out of charge.".to_string());
                }
                if self.tiles[position].resource().is_none() {
                    return ActionResult::Failure("Nothing to mine here.".to_string());
                }
                self.player.mine_progress += 1;
                self.player.charge -= 1;
                ActionResult::Success
            }
            Action::Collect => {
                let Some(kind) = self.tiles[position].resource() else {
                    return ActionResult::Failure("Nothing to collect here.".to_string());
                };
                if self.player.mine_progress < kind.mines_required() {
                    return ActionResult::Failure(format!(
                        "{kind:?} needs {} mines, only {} done.",
                        kind.mines_required(),
                        self.player.mine_progress
                    ));
                }
                if self.player.items.len() >= self.config.max_inventory as usize {
                    return ActionResult::Failure("Inventory is full.".to_string());
                }
                self.tiles[position] = TileKind::Empty;
                self.player.mine_progress = 0;
                self.player.items.push(kind);
                self.respawn(kind);
                match self.strategy.on_item_received(kind) {
                    Ok(()) => ActionResult::Success,
                    Err(err) => ActionResult::Failure(err.to_string()),
                }
            }
        }
    }

    /// Recharges or sells depending on the tile the player ended the turn on.
    fn settle_tile(&mut self) {
        let tile = self.tiles[self.player.position];
        if tile == TileKind::Recharge {
            self.player.charge =
                (self.player.charge + RECHARGE_PER_TURN).min(self.config.max_charge);
        } else if tile == self.config.faction.market() && !self.player.items.is_empty() {
            self.sell_inventory();
        }
    }

    fn sell_inventory(&mut self) {
        let items = std::mem::take(&mut self.player.items);
        let total: u32 = items
            .iter()
            .map(|kind| self.prices.get(*kind).unwrap_or(0))
            .sum();
        self.player.score = self.player.score.saturating_add(total);
        for kind in &items {
            let price = self.prices.get(*kind).unwrap_or(0);
            self.reprice(*kind, price.saturating_sub(PRICE_DROP_PER_SALE));
        }
        info!(
            turn = self.turn,
            sold = items.len(),
            total,
            score = self.player.score,
            "inventory sold"
        );
        self.strategy.on_inventory_sold(total);
    }

    fn recover_prices(&mut self) {
        let targets: Vec<(ResourceKind, u32)> = self.base_prices.iter().collect();
        for (kind, base) in targets {
            let current = self.prices.get(kind).unwrap_or(base);
            if current < base {
                self.reprice(kind, (current + PRICE_RECOVERY_PER_TURN).min(base));
            }
        }
    }

    fn reprice(&mut self, kind: ResourceKind, price: u32) {
        // Prices never fall below one.
        if let Err(err) = self.prices.set(kind, price.max(1)) {
            warn!(%err, "price update rejected");
        }
    }

    /// Places a new resource of `kind` on a random empty tile.
    fn respawn(&mut self, kind: ResourceKind) {
        let player = self.player.position;
        let empty: Vec<Position> = self
            .tiles
            .enumerate()
            .filter(|(position, tile)| **tile == TileKind::Empty && *position != player)
            .map(|(position, _)| position)
            .collect();
        if empty.is_empty() {
            return;
        }
        let spot = empty[self.rng.random_range(0..empty.len())];
        self.tiles[spot] = kind.tile();
        debug!(?kind, ?spot, "resource respawned");
    }
}

/// Parses a map of whitespace-separated two-letter codes.
///
/// The first line is the top row of the board (highest `y`).
pub fn parse_board(map_string: &str) -> Result<ParsedBoard, LoadError> {
    let lines: Vec<&str> = map_string
        .trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        return Err(LoadError::Empty);
    }

    let height = lines.len();
    let width = lines[0].split_whitespace().count();
    if width != height {
        return Err(LoadError::NotSquare { width, height });
    }

    let mut rows: Vec<Vec<TileKind>> = Vec::with_capacity(height);
    let mut start: Option<Position> = None;

    for (row, line) in lines.iter().enumerate() {
        let y = height - 1 - row;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != width {
            return Err(LoadError::InconsistentWidth {
                row,
                expected: width,
                found: tokens.len(),
            });
        }
        let mut cells = Vec::with_capacity(width);
        for (x, token) in tokens.into_iter().enumerate() {
            let tile = match token {
                "ST" => {
                    if start.is_some() {
                        return Err(LoadError::MultipleStarts);
                    }
                    start = Some(Position::new(x, y));
                    TileKind::Empty
                }
                ".." => TileKind::Empty,
                "RU" => TileKind::ResourceRuby,
                "EM" => TileKind::ResourceEmerald,
                "DI" => TileKind::ResourceDiamond,
                "RC" => TileKind::Recharge,
                "MR" => TileKind::MarketRed,
                "MB" => TileKind::MarketBlue,
                unknown => {
                    return Err(LoadError::UnknownCode {
                        code: unknown.to_string(),
                        x,
                        y,
                    });
                }
            };
            cells.push(tile);
        }
        rows.push(cells);
    }

    // Text runs top-down, the grid bottom-up.
    rows.reverse();
    Ok(ParsedBoard {
        tiles: Grid::from_rows(rows)?,
        start,
    })
}

/// Loads a map and starts a round on it. The board size in `config` is taken
/// from the map.
pub fn load_environment_from_string<S: MinePlayerStrategy>(
    map_string: &str,
    config: RoundConfig,
    prices: PriceTable,
    strategy: S,
    seed: u64,
) -> Result<Environment<S>, LoadError> {
    let ParsedBoard { tiles, start } = parse_board(map_string)?;
    let start = start.ok_or(LoadError::MissingStart)?;
    let config = RoundConfig {
        board_size: tiles.width(),
        ..config
    };
    Ok(Environment::new(tiles, start, config, prices, strategy, seed))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::{navigator::Direction, strategy::StrategyError};

    /// Replays a fixed list of actions and records the callbacks it receives.
    #[derive(Debug, Default)]
    struct Scripted {
        actions: VecDeque<Action>,
        received: Vec<ResourceKind>,
        sold: Vec<u32>,
        round_end: Option<(u32, u32)>,
    }

    impl Scripted {
        fn new(actions: impl IntoIterator<Item = Action>) -> Self {
            Scripted {
                actions: actions.into_iter().collect(),
                ..Scripted::default()
            }
        }
    }

    impl MinePlayerStrategy for Scripted {
        fn initialize(&mut self, _: RoundConfig, _: &BoardView, _: Position, _: &mut StdRng) {}

        fn decide_turn(&mut self, _: &BoardView, _: &PriceTable, _: u32, _: bool) -> Action {
            self.actions.pop_front().unwrap_or(Action::NoAction)
        }

        fn on_item_received(&mut self, item: ResourceKind) -> Result<(), StrategyError> {
            self.received.push(item);
            Ok(())
        }

        fn on_inventory_sold(&mut self, total_price: u32) {
            self.sold.push(total_price);
        }

        fn on_round_end(&mut self, own_score: u32, opponent_score: u32) {
            self.round_end = Some((own_score, opponent_score));
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    const MAP: &str = "
        .. .. RC
        ST RU MR
        .. .. ..
    ";

    fn prices() -> PriceTable {
        PriceTable::from_prices(DEFAULT_PRICES).unwrap()
    }

    fn env(
        actions: impl IntoIterator<Item = Action>,
        config: RoundConfig,
    ) -> Environment<Scripted> {
        load_environment_from_string(MAP, config, prices(), Scripted::new(actions), 3).unwrap()
    }

    #[test]
    fn parse_board_puts_first_line_on_top() {
        let board = parse_board(MAP).unwrap();
        assert_eq!(board.start, Some(Position::new(0, 1)));
        assert_eq!(board.tiles[Position::new(2, 2)], TileKind::Recharge);
        assert_eq!(board.tiles[Position::new(1, 1)], TileKind::ResourceRuby);
        assert_eq!(board.tiles[Position::new(0, 0)], TileKind::Empty);
    }

    #[test]
    fn parse_board_errors() {
        assert_eq!(parse_board("  \n "), Err(LoadError::Empty));
        assert_eq!(
            parse_board("RU RU\nRU RU RU").unwrap_err(),
            LoadError::InconsistentWidth {
                row: 1,
                expected: 2,
                found: 3
            }
        );
        assert_eq!(
            parse_board("RU RU").unwrap_err(),
            LoadError::NotSquare {
                width: 2,
                height: 1
            }
        );
        assert_eq!(
            parse_board("ST ..\n.. XX").unwrap_err(),
            LoadError::UnknownCode {
                code: "XX".to_string(),
                x: 1,
                y: 0
            }
        );
        assert_eq!(
            parse_board("ST ..\n.. ST").unwrap_err(),
            LoadError::MultipleStarts
        );
    }

    #[test]
    fn loading_requires_a_start() {
        let result = load_environment_from_string(
            "RU ..\n.. ..",
            RoundConfig::default(),
            prices(),
            Scripted::default(),
            0,
        );
        assert!(matches!(result, Err(LoadError::MissingStart)));
    }

    #[test]
    fn board_size_comes_from_the_map() {
        let env = env([], RoundConfig::default());
        assert_eq!(env.config.board_size, 3);
    }

    #[test]
    fn mine_collect_and_sell() {
        let mut env = env(
            [
                Action::Move(Direction::Right),
                Action::Collect,
                Action::Mine,
                Action::Collect,
                Action::Move(Direction::Right),
            ],
            RoundConfig::default(),
        );
        assert_eq!(env.process_turn(), ActionResult::Success);
        assert_eq!(env.player.position, Position::new(1, 1));
        assert!(matches!(env.process_turn(), ActionResult::Failure(_)));
        assert_eq!(env.process_turn(), ActionResult::Success);
        assert_eq!(env.process_turn(), ActionResult::Success);
        assert_eq!(env.player.items, vec![ResourceKind::Ruby]);
        assert_eq!(env.tiles[Position::new(1, 1)], TileKind::Empty);
        assert_eq!(env.strategy().received, vec![ResourceKind::Ruby]);
        // The collected ruby reappears somewhere else.
        let rubies = env
            .tiles
            .enumerate()
            .filter(|(_, tile)| **tile == TileKind::ResourceRuby)
            .count();
        assert_eq!(rubies, 1);

        assert_eq!(env.process_turn(), ActionResult::Success);
        assert!(env.player.items.is_empty());
        assert_eq!(env.player.score, 50);
        assert_eq!(env.strategy().sold, vec![50]);
        assert!(env.prices.get(ResourceKind::Ruby).unwrap() < 50);
    }

    #[test]
    fn moves_spend_charge_and_chargers_restore_it() {
        let mut env = env(
            [
                Action::Move(Direction::Up),
                Action::Move(Direction::Right),
                Action::Move(Direction::Right),
                Action::NoAction,
            ],
            RoundConfig {
                max_charge: 30,
                ..RoundConfig::default()
            },
        );
        env.process_turn();
        env.process_turn();
        assert_eq!(env.player.charge, 28);
        env.process_turn();
        assert_eq!(env.player.position, Position::new(2, 2));
        assert_eq!(env.player.charge, 30);
    }

    #[test]
    fn cannot_walk_off_the_board() {
        let mut env = env([Action::Move(Direction::Left)], RoundConfig::default());
        assert!(matches!(env.process_turn(), ActionResult::Failure(_)));
        assert_eq!(env.player.position, Position::new(0, 1));
    }

    #[test]
    fn reaching_the_winning_score_ends_the_round() {
        let mut env = env(
            [
                Action::Move(Direction::Right),
                Action::Mine,
                Action::Collect,
                Action::Move(Direction::Right),
            ],
            RoundConfig {
                winning_score: 40,
                ..RoundConfig::default()
            },
        );
        for _ in 0..3 {
            assert_eq!(env.process_turn(), ActionResult::Success);
        }
        assert_eq!(env.process_turn(), ActionResult::Win);
        assert!(env.is_finished());
        assert_eq!(env.strategy().round_end, Some((50, 0)));
        assert!(matches!(env.process_turn(), ActionResult::Failure(_)));
    }
}
