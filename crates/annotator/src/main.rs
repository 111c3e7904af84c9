//! Annotator CLI
//!
//! Annotates every game a player won in a PGN file with native Stockfish, or
//! classifies a single move between two positions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use shakmaty::Color;
use tracing::{error, info};

use annotator::annotate::{self, AnnotateOptions, PositionRequest};
use annotator::output;
use annotator::pool::WorkerPool;
use annotator::{AnalysisCache, AnnotatorConfig, StockfishEngine};
use chess_core::{notation, pgn, sides, OpeningBook};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Annotate all games won by a player
    Analyze {
        /// Player name, "First Last" or "Last, First"
        player: String,

        /// PGN file with one or more games
        games: PathBuf,

        /// Games annotated in parallel, one engine each (defaults to CPU count).
        /// Each engine uses ENGINE_THREADS threads and ENGINE_HASH_MB of hash
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Search depth per position
        #[arg(short, long)]
        depth: Option<u32>,
    },

    /// Classify one move between two positions
    Position {
        /// Side of the principal player
        #[arg(long, value_enum)]
        side: SideArg,

        /// FEN before the move
        #[arg(long)]
        before: String,

        /// FEN after the move
        #[arg(long)]
        after: String,

        /// Move played, in SAN
        #[arg(long)]
        san: String,

        /// The opponent's previous move was a blunder
        #[arg(long)]
        opponent_blundered: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SideArg {
    White,
    Black,
}

impl From<SideArg> for Color {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::White => Color::White,
            SideArg::Black => Color::Black,
        }
    }
}

/// One engine process with its own analysis cache
struct Worker {
    engine: StockfishEngine,
    cache: AnalysisCache,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = AnnotatorConfig::from_env();

    match cli.command {
        Command::Analyze {
            player,
            games,
            jobs,
            depth,
        } => {
            if let Some(depth) = depth {
                config.analysis_depth = depth;
            }
            run_analyze(&config, &player, &games, jobs).await
        }
        Command::Position {
            side,
            before,
            after,
            san,
            opponent_blundered,
        } => run_position(&config, side.into(), &before, &after, &san, opponent_blundered).await,
    }
}

async fn run_analyze(
    config: &AnnotatorConfig,
    player: &str,
    games_path: &Path,
    jobs: Option<usize>,
) -> Result<()> {
    info!(
        stockfish_path = %config.stockfish_path,
        depth = config.analysis_depth,
        multipv = config.analysis_multipv,
        "Annotator config loaded"
    );

    let text = tokio::fs::read_to_string(games_path)
        .await
        .with_context(|| format!("Failed to read PGN file: {}", games_path.display()))?;
    let games = annotate::prepare_games(player, pgn::read_games(text.as_bytes())?);
    if games.is_empty() {
        info!("No valid games to annotate");
        return Ok(());
    }

    let book = Arc::new(
        OpeningBook::load_dir(&config.eco_dir)
            .with_context(|| format!("Failed to load ECO tables from {}", config.eco_dir.display()))?,
    );

    // Create engine pool (one Stockfish process per job)
    let num_workers = jobs.unwrap_or_else(num_cpus::get).clamp(1, games.len());
    info!(num_workers, games = games.len(), "Creating Stockfish engine pool");

    let mut workers = Vec::with_capacity(num_workers);
    for i in 0..num_workers {
        let engine = StockfishEngine::new(
            &config.stockfish_path,
            config.engine_threads,
            config.engine_hash_mb,
        )
        .await?;
        info!(engine_id = i, "Stockfish engine ready");
        workers.push(Worker {
            engine,
            cache: AnalysisCache::new(),
        });
    }
    let mut pool = WorkerPool::new(workers);

    let options = AnnotateOptions::from(config);
    let player = Arc::new(player.to_string());
    let mut handles = Vec::with_capacity(games.len());

    for (game_id, game) in games.into_iter().enumerate() {
        let mut worker = pool.checkout().await.context("Engine pool is empty")?;
        let home = pool.return_handle();
        let book = book.clone();
        let player = player.clone();

        handles.push(tokio::spawn(async move {
            let Worker { engine, cache } = &mut worker;
            let result =
                annotate::annotate_game(engine, cache, &book, &player, &game, &options).await;

            // The pool outlives every task
            let _ = home.send(worker).await;
            (game_id, result)
        }));
    }

    // Collect in input order
    let output_player = sides::normalize_player_name(&player);
    let mut analyzed_games = Vec::new();
    for handle in handles {
        let (game_id, result) = handle.await?;
        match result {
            Ok(Some(game)) => {
                info!(game_id, "Analysis complete");
                game.save(&config.output_dir, &output_player)?;
                analyzed_games.push(game);
            }
            Ok(None) => {}
            Err(e) => error!(game_id, error = %e, "Analysis failed"),
        }
    }

    let stem = games_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "games".to_string());
    output::save_merged(&config.output_dir, &output_player, &stem, &analyzed_games)?;

    // Clean up engines
    info!("Shutting down Stockfish engines");
    for mut worker in pool.into_workers().await {
        worker.engine.quit().await;
    }

    Ok(())
}

async fn run_position(
    config: &AnnotatorConfig,
    principal: Color,
    before: &str,
    after: &str,
    san: &str,
    opponent_blundered: bool,
) -> Result<()> {
    let before = notation::parse_fen(before)?;
    let request = PositionRequest {
        principal,
        played: notation::parse_san(&before, san)?,
        after: notation::parse_fen(after)?,
        before,
        last_opponent_move_was_blunder: opponent_blundered,
    };

    let mut engine = StockfishEngine::new(
        &config.stockfish_path,
        config.engine_threads,
        config.engine_hash_mb,
    )
    .await?;
    let mut cache = AnalysisCache::new();

    let evaluation = annotate::evaluate_position(
        &mut engine,
        &mut cache,
        &request,
        config.analysis_multipv,
        config.search_limit(),
    )
    .await;
    engine.quit().await;

    println!("{}", serde_json::to_string_pretty(&evaluation?)?);
    Ok(())
}
