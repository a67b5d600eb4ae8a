use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use mineopoly_core::{
    Faction, Position, TileKind,
    board::PriceTable,
    config::RoundConfig,
    environment::{ActionResult, DEFAULT_PRICES, Environment, load_environment_from_string},
    strategy::GreedyMiner,
};
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    fs::File,
    io::{self, Stdout},
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FactionArg {
    Red,
    Blue,
}

impl From<FactionArg> for Faction {
    fn from(arg: FactionArg) -> Self {
        match arg {
            FactionArg::Red => Faction::Red,
            FactionArg::Blue => Faction::Blue,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Map file to load
    #[arg(short, long, value_name = "MAP_FILE", default_value = "maps/mine01.txt")]
    map: PathBuf,
    /// Seed for resource respawns
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long, default_value_t = 5)]
    max_inventory: u32,
    #[arg(long, default_value_t = 80)]
    max_charge: u32,
    #[arg(long, default_value_t = 480)]
    winning_score: u32,
    #[arg(long, value_enum, default_value_t = FactionArg::Red)]
    faction: FactionArg,
    /// Milliseconds between turns in the terminal view
    #[arg(long, default_value_t = 250)]
    tick_ms: u64,
    /// Run without the terminal view and print a summary
    #[arg(long)]
    headless: bool,
    /// Turn limit for headless runs
    #[arg(long, default_value_t = 1000)]
    turns: u64,
    /// Write logs to this file (the terminal view has no log output otherwise)
    #[arg(long, value_name = "LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn round_config(&self) -> RoundConfig {
        RoundConfig {
            max_inventory: self.max_inventory,
            max_charge: self.max_charge,
            winning_score: self.winning_score,
            faction: self.faction.into(),
            ..RoundConfig::default()
        }
    }
}

struct App {
    /// The round being played.
    environment: Environment<GreedyMiner>,
    /// Flag to control the main loop.
    should_quit: bool,
    /// Flag to control if the round is over.
    game_over: bool,
    /// Outcome of the last turn, shown in the status line.
    last_result: ActionResult,
}

impl App {
    fn new(args: &Args) -> Result<Self> {
        let map = std::fs::read_to_string(&args.map)
            .with_context(|| format!("Failed to read map file {}", args.map.display()))?;
        let prices = PriceTable::from_prices(DEFAULT_PRICES)?;
        let environment = load_environment_from_string(
            &map,
            args.round_config(),
            prices,
            GreedyMiner::new(),
            args.seed,
        )
        .context("Failed to load environment")?;

        Ok(App {
            environment,
            should_quit: false,
            game_over: false,
            last_result: ActionResult::Success,
        })
    }

    /// Handles one step of the simulation.
    fn tick(&mut self) {
        if self.game_over {
            return;
        }
        self.last_result = self.environment.process_turn();
        if self.last_result == ActionResult::Win {
            self.game_over = true;
        }
    }

    /// Sets the quit flag.
    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();
    if !args.map.exists() {
        return Err(anyhow::anyhow!(
            "Map file does not exist: {}",
            args.map.display()
        ));
    }
    init_logging(args.log_file.as_deref(), args.headless)?;

    let mut app = App::new(&args)?;

    if args.headless {
        return run_headless(&mut app, args.turns);
    }

    // Set up the terminal
    let mut terminal = setup_terminal()?;

    // Run the main application loop
    let result = run_app(&mut terminal, &mut app, Duration::from_millis(args.tick_ms));

    // Restore the terminal state
    restore_terminal(&mut terminal)?;

    result
}

/// Installs the tracing subscriber. `RUST_LOG` overrides the default filter.
fn init_logging(log_file: Option<&Path>, headless: bool) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "mineopoly_core=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            registry
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .init();
        }
        // The terminal view only logs with --log-file.
        None if headless => registry.with(fmt::layer().with_writer(io::stderr)).init(),
        None => {}
    }
    Ok(())
}

/// Plays up to `turns` turns without a terminal and prints the outcome.
fn run_headless(app: &mut App, turns: u64) -> Result<()> {
    while !app.game_over && app.environment.turn() < turns {
        app.tick();
    }
    let env = &app.environment;
    info!(
        turns = env.turn(),
        score = env.player.score,
        won = app.game_over,
        "headless run finished"
    );
    println!(
        "turns: {}  score: {}/{}  {}",
        env.turn(),
        env.player.score,
        env.config.winning_score,
        if app.game_over { "won" } else { "turn limit reached" }
    );
    Ok(())
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?; // Put terminal in raw mode
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                    _ => {}
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(65), // Area for the map
            Constraint::Percentage(25), // Area for player status
            Constraint::Percentage(10), // Area for help
        ])
        .split(frame.area());

    render_map(frame, main_layout[0], &app.environment);
    render_status(frame, main_layout[1], app);

    let help_text = Paragraph::new("Press 'q' or 'Esc' to quit.")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

/// Renders charge, inventory, score, prices and what the strategy is doing.
fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let env = &app.environment;
    let miner = env.strategy();
    let destination = miner
        .destination()
        .map_or_else(|| "none".to_string(), |d| format!("({}, {})", d.x, d.y));
    let prices: Vec<String> = env
        .prices
        .iter()
        .map(|(kind, price)| format!("{kind:?} {price}"))
        .collect();
    let outcome = match &app.last_result {
        ActionResult::Success => Span::raw("ok"),
        ActionResult::Failure(reason) => {
            Span::styled(reason.clone(), Style::default().fg(Color::Red))
        }
        ActionResult::Win => Span::styled("won!", Style::default().fg(Color::Green).bold()),
    };

    let lines = vec![
        Line::from(format!(
            "Turn: {}  Pos: ({}, {})  Charge: {}/{}",
            env.turn(),
            env.player.position.x,
            env.player.position.y,
            env.player.charge,
            env.config.max_charge
        )),
        Line::from(format!(
            "Inventory: {}/{}  Score: {}/{}",
            env.player.items.len(),
            env.config.max_inventory,
            env.player.score,
            env.config.winning_score
        )),
        Line::from(format!(
            "Phase: {:?}  Destination: {}  Mines: {}",
            miner.phase(),
            destination,
            miner.mine_count()
        )),
        Line::from(format!("Prices: {}", prices.join("  "))),
        Line::from(vec![Span::raw("Last turn: "), outcome]),
    ];

    let status = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("{:?} player", env.config.faction)),
    );
    frame.render_widget(status, area);
}

fn tile_span(tile: TileKind) -> Span<'static> {
    match tile {
        TileKind::Empty => Span::raw("."),
        TileKind::ResourceRuby => Span::styled("r", Style::default().fg(Color::Red)),
        TileKind::ResourceEmerald => Span::styled("e", Style::default().fg(Color::Green)),
        TileKind::ResourceDiamond => Span::styled("d", Style::default().fg(Color::Cyan)),
        TileKind::Recharge => Span::styled("+", Style::default().fg(Color::Yellow)),
        TileKind::MarketRed => Span::styled("M", Style::default().fg(Color::Red).bold()),
        TileKind::MarketBlue => Span::styled("M", Style::default().fg(Color::Blue).bold()),
    }
}

/// Renders the board onto the frame, top row first.
fn render_map(frame: &mut Frame, area: Rect, environment: &Environment<GreedyMiner>) {
    let tiles = &environment.tiles;
    let player = environment.player.position;

    let mut lines: Vec<Line> = Vec::with_capacity(tiles.height());
    for y in (0..tiles.height()).rev() {
        let mut spans: Vec<Span> = Vec::with_capacity(tiles.width() * 2);
        for x in 0..tiles.width() {
            let position = Position::new(x, y);
            if position == player {
                spans.push(Span::styled("@", Style::default().fg(Color::Magenta).bold()));
            } else {
                spans.push(tile_span(tiles[position]));
            }
            spans.push(Span::raw(" "));
        }
        lines.push(Line::from(spans));
    }

    let map_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Mineopoly").borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(map_paragraph, area);
}
