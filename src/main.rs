//! # Board Arena
//!
//! Terminal front-end for the ten board game engines. Plays human against AI
//! or AI against AI, with the board redrawn after every move.
//!
//! ## Usage
//! ```text
//! play --game chess --human-side 1 --chess-service http://localhost:8000
//! play --game ludo --ai-only --seed 7
//! ```
//!
//! Set `RUST_LOG=debug` to see every applied move and AI decision.

use anyhow::Context;
use arena::config::ArenaConfig;
use arena::game_controller::{GameController, MoveResult};
use arena::game_wrapper::{GameKind, GameWrapper, MoveWrapper};
use arena::games::carrom::{CarromMove, CarromState, PhysicsLoop};
use arena::games::chess::service::{AnswerSource, ChessClient, HttpChessService};
use arena::games::chess::Square;
use arena::search::init_thread_pool;
use arena::{GameRng, Outcome, Player};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(short, long, value_enum, default_value_t = GameKind::Connect4)]
    game: GameKind,

    /// Let the computer play every side
    #[clap(long, action = clap::ArgAction::SetTrue)]
    ai_only: bool,

    /// Seat of the human player (1 or -1; 1 to 4 in Ludo)
    #[clap(long, default_value_t = 1, allow_hyphen_values = true)]
    human_side: Player,

    /// Seed for dice, fleet placement and AI tie-breaking
    #[clap(short, long)]
    seed: Option<u64>,

    /// Search depth of the alpha-beta games
    #[clap(short, long)]
    depth: Option<u32>,

    /// Search threads, 0 for one per core
    #[clap(short = 'n', long)]
    threads: Option<usize>,

    /// JSON configuration file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Base URL of a remote chess move service
    #[clap(long)]
    chess_service: Option<String>,

    /// Stop after this many moves
    #[clap(long, default_value_t = 1000)]
    max_turns: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;
    init_thread_pool(config.search.effective_threads());

    let seed = args.seed.unwrap_or_else(clock_seed);
    info!(game = %args.game, seed, "starting");
    let mut session = Session::new(&args, config, seed)?;
    session.run().await
}

/// Defaults, then the config file and environment, then command line flags.
fn build_config(args: &Args) -> anyhow::Result<ArenaConfig> {
    let mut config = match &args.config {
        Some(path) => ArenaConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => ArenaConfig::from_env(),
    };
    if let Some(seed) = args.seed {
        config.set_seed(seed);
    }
    if let Some(depth) = args.depth {
        config.set_depth(depth);
    }
    if let Some(threads) = args.threads {
        config.search.threads = threads;
    }
    if let Some(url) = &args.chess_service {
        config.chess_service.base_url = Some(url.clone());
    }
    config.validate()?;
    Ok(config)
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

enum Command {
    Play(MoveWrapper),
    Quit,
}

struct Session {
    controller: GameController,
    config: ArenaConfig,
    rng: GameRng,
    chess: Option<ChessClient<HttpChessService>>,
    human: Option<Player>,
    max_turns: usize,
    input: Lines<BufReader<Stdin>>,
}

impl Session {
    fn new(args: &Args, config: ArenaConfig, seed: u64) -> anyhow::Result<Self> {
        let game = GameWrapper::new_game(args.game, &config);
        let chess = match args.game {
            GameKind::Chess => Some(ChessClient::connect(
                config.chess_service.base_url.as_deref(),
                config.chess_service.timeout(),
            )?),
            _ => None,
        };
        Ok(Self {
            controller: GameController::new(game),
            config,
            rng: GameRng::new(seed),
            chess,
            human: (!args.ai_only).then_some(args.human_side),
            max_turns: args.max_turns,
            input: BufReader::new(tokio::io::stdin()).lines(),
        })
    }

    async fn run(&mut self) -> anyhow::Result<()> {
        println!("{}", format!("=== {} ===", self.controller.kind()).bold());
        if let Some(chess) = &self.chess {
            match chess.status().await {
                Some(status) => println!("Chess service: {}", format!("{:?}", status).green()),
                None if chess.is_online() => println!("{}", "Chess service unreachable, playing locally".yellow()),
                None => {}
            }
        }
        if self.human.is_some() {
            println!("Moves: {}. Commands: hint, undo, moves [origin], history, quit", self.controller.kind().move_help());
        }
        println!("{}", self.controller.get_render_state());

        while !self.controller.is_game_over() {
            if self.controller.move_count() >= self.max_turns {
                warn!(moves = self.max_turns, "turn limit reached");
                println!("{}", "Turn limit reached, stopping.".yellow());
                break;
            }
            let player = self.controller.get_current_player();
            let mv = if self.human == Some(player) {
                match self.human_move().await? {
                    Command::Play(mv) => mv,
                    Command::Quit => return Ok(()),
                }
            } else {
                match self.ai_move().await {
                    Some(mv) => mv,
                    None => {
                        warn!(player, "AI found no move");
                        println!("{}", "The AI has no move to play.".yellow());
                        break;
                    }
                }
            };
            self.play(mv).await;
        }

        println!("\n{}", self.controller.format_history());
        Ok(())
    }

    async fn play(&mut self, mv: MoveWrapper) {
        if let (GameWrapper::Carrom(state), MoveWrapper::Carrom(strike)) = (self.controller.get_render_state(), &mv) {
            let state = state.clone();
            self.animate_strike(&state, strike).await;
        }
        let player = self.controller.get_current_player();
        let name = self.controller.player_name(player);
        match self.controller.try_make_move(mv) {
            MoveResult::Success { move_made, effects, outcome, .. } => {
                println!("{} plays {}: {}", name.bold(), move_made.to_string().cyan(), effects);
                println!("{}", self.controller.get_render_state());
                self.announce(outcome);
            }
            MoveResult::Invalid { reason } => println!("{}", reason.to_string().red()),
            MoveResult::GameOver => println!("{}", "The game is already over.".red()),
        }
    }

    fn announce(&self, outcome: Outcome) {
        match outcome {
            Outcome::Win(p) => println!("{}", format!("{} wins!", self.controller.player_name(p)).green().bold()),
            Outcome::Draw(reason) => println!("{}", format!("Draw ({:?})", reason).yellow().bold()),
            Outcome::InProgress => {}
        }
    }

    async fn ai_move(&mut self) -> Option<MoveWrapper> {
        if let (Some(chess), GameWrapper::Chess(state)) = (&self.chess, self.controller.get_render_state()) {
            let answer = chess.ai_move(state, &mut self.rng).await?;
            report_source(answer.source);
            return Some(MoveWrapper::Chess(answer.value));
        }
        let state = self.controller.get_state_for_search();
        let mut rng = self.rng.fork();
        // Search blocks; keep it off the runtime's worker threads.
        tokio::task::spawn_blocking(move || state.ai_move(&mut rng)).await.ok().flatten()
    }

    async fn human_move(&mut self) -> anyhow::Result<Command> {
        loop {
            let name = self.controller.player_name(self.controller.get_current_player());
            print!("{} > ", name.bold());
            tokio::io::stdout().flush().await?;
            let Some(line) = self.input.next_line().await? else {
                return Ok(Command::Quit);
            };
            let line = line.trim();
            let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
            match command {
                "" => continue,
                "quit" | "q" | "exit" => return Ok(Command::Quit),
                "help" | "?" => println!("Moves: {}", self.controller.kind().move_help()),
                "history" => println!("{}", self.controller.format_history()),
                "hint" => self.show_hint().await,
                "undo" => self.undo_to_human(),
                "moves" => self.show_moves(rest.trim()).await,
                _ => match self.controller.get_render_state().parse_move(line) {
                    Ok(mv) => match self.controller.validate_move(&mv) {
                        Ok(()) => return Ok(Command::Play(mv)),
                        Err(e) => println!("{}", e.to_string().red()),
                    },
                    Err(e) => println!("{} {}", e.red(), format!("(expected {})", self.controller.kind().move_help()).dimmed()),
                },
            }
        }
    }

    async fn show_hint(&mut self) {
        let hint = match (&self.chess, self.controller.get_render_state()) {
            (Some(chess), GameWrapper::Chess(state)) => chess.hint(state).await.map(|answer| {
                report_source(answer.source);
                MoveWrapper::Chess(answer.value)
            }),
            _ => self.controller.hint(&mut self.rng),
        };
        match hint {
            Some(mv) => println!("Hint: {}", mv.to_string().cyan()),
            None => println!("No hint available."),
        }
    }

    async fn show_moves(&self, origin: &str) {
        let moves: Vec<String> = match (&self.chess, self.controller.get_render_state(), origin) {
            (Some(chess), GameWrapper::Chess(state), sq) if !sq.is_empty() => match sq.parse::<Square>() {
                Ok(square) => {
                    let answer = chess.valid_moves(state, square).await;
                    report_source(answer.source);
                    answer.value.iter().map(ToString::to_string).collect()
                }
                Err(e) => {
                    println!("{}", e.red());
                    return;
                }
            },
            (_, _, "") => self.controller.get_legal_moves(None).iter().map(ToString::to_string).collect(),
            (_, _, pair) => match parse_origin(pair) {
                Some(origin) => self
                    .controller
                    .get_legal_moves(Some(origin))
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
                None => {
                    println!("{}", "Expected an origin as r,c".red());
                    return;
                }
            },
        };
        if moves.is_empty() {
            println!("No legal moves.");
        } else {
            println!("{}", moves.join("  "));
        }
    }

    /// Takes back moves until it is the human's turn again.
    fn undo_to_human(&mut self) {
        let mut undone = 0;
        while let Ok(mv) = self.controller.undo() {
            undone += 1;
            info!(%mv, "undone");
            if Some(self.controller.get_current_player()) == self.human {
                break;
            }
        }
        if undone == 0 {
            println!("{}", "Nothing to undo.".yellow());
        } else {
            println!("{}", self.controller.get_render_state());
        }
    }

    /// Plays the strike out on a frame driver so it can be interrupted with Ctrl-C.
    async fn animate_strike(&self, state: &CarromState, strike: &CarromMove) {
        let physics = PhysicsLoop::new(state.strike_table(strike));
        let worker = Arc::clone(&physics);
        let max_ticks = self.config.carrom.max_ticks;
        let run = tokio::task::spawn_blocking(move || worker.run(max_ticks));
        tokio::select! {
            events = run => match events {
                Ok(events) => {
                    for e in events {
                        println!("  tick {:>4}: {:?} pocketed in pocket {}", e.tick, e.kind, e.pocket);
                    }
                }
                Err(e) => warn!(error = %e, "physics task failed"),
            },
            _ = tokio::signal::ctrl_c() => {
                physics.cancel();
                println!("{}", "Animation skipped.".dimmed());
            }
        }
    }
}

fn parse_origin(s: &str) -> Option<(usize, usize)> {
    let (r, c) = s.split_once(',')?;
    Some((r.trim().parse().ok()?, c.trim().parse().ok()?))
}

fn report_source(source: AnswerSource) {
    if source == AnswerSource::LocalFallback {
        info!("chess answer computed locally");
    }
}
