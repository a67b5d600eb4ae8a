use mineopoly_core::{
    Faction, Position,
    board::PriceTable,
    config::RoundConfig,
    environment::{ActionResult, DEFAULT_PRICES, Environment, load_environment_from_string},
    strategy::{GreedyMiner, MinePlayerStrategy, Phase},
};

const MAP: &str = include_str!("../../maps/mine01.txt");

fn round(config: RoundConfig, seed: u64) -> Environment<GreedyMiner> {
    let prices = PriceTable::from_prices(DEFAULT_PRICES).unwrap();
    load_environment_from_string(MAP, config, prices, GreedyMiner::new(), seed).unwrap()
}

fn config(faction: Faction) -> RoundConfig {
    RoundConfig {
        board_size: 0,
        max_inventory: 3,
        max_charge: 60,
        winning_score: 1500,
        faction,
    }
}

/// Plays until the round is won, checking the strategy's bookkeeping against
/// the host after every turn.
fn play_to_win(env: &mut Environment<GreedyMiner>) -> u64 {
    for _ in 0..3000 {
        let result = env.process_turn();
        assert!(env.tiles.contains(env.player.position));
        assert!(env.player.items.len() <= env.config.max_inventory as usize);
        if result == ActionResult::Win {
            return env.turn();
        }
        assert_eq!(
            env.strategy().inventory_size() as usize,
            env.player.items.len()
        );
        assert_eq!(env.strategy().score(), env.player.score);
        assert!(env.player.charge > 0, "ran dry at turn {}", env.turn());
    }
    panic!("round not won, score {}", env.player.score);
}

#[test]
fn greedy_miner_wins_a_round_as_red() {
    let mut env = round(config(Faction::Red), 11);
    assert_eq!(env.config.board_size, 8);
    assert_eq!(env.strategy().destination(), Some(Position::new(1, 6)));
    play_to_win(&mut env);
    assert!(env.player.score >= 1500);
    assert!(env.is_finished());
}

#[test]
fn greedy_miner_wins_a_round_as_blue() {
    let mut env = round(config(Faction::Blue), 5);
    play_to_win(&mut env);
    assert!(env.player.score >= 1500);
}

#[test]
fn first_turns_walk_to_the_nearest_diamond_and_mine_it() {
    let mut env = round(config(Faction::Red), 1);
    // Start (0, 7), diamond at (1, 6): right then down.
    env.process_turn();
    assert_eq!(env.player.position, Position::new(1, 7));
    env.process_turn();
    assert_eq!(env.player.position, Position::new(1, 6));
    for _ in 0..3 {
        env.process_turn();
        assert_eq!(env.strategy().phase(), Phase::Mining);
    }
    env.process_turn();
    assert_eq!(env.strategy().phase(), Phase::AwaitingPickup);
    assert_eq!(env.player.items.len(), 1);
    assert_eq!(env.strategy().inventory_size(), 1);
}

#[test]
fn same_seed_replays_the_same_round() {
    let mut first = round(config(Faction::Red), 42);
    let mut second = round(config(Faction::Red), 42);
    for _ in 0..200 {
        first.process_turn();
        second.process_turn();
        assert_eq!(first.player.position, second.player.position);
        assert_eq!(first.player.score, second.player.score);
    }
    assert_eq!(first.tiles, second.tiles);
}

#[test]
fn strategy_name_is_stable() {
    assert_eq!(GreedyMiner::new().name(), "greedy-miner");
}
