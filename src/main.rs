use std::process::ExitCode;

use chess_rules::config::{AppConfig, OutputFormat};
use chess_rules::engine::{ChessError, Game, Position};
use chess_rules::report::GameSnapshot;

fn main() -> ExitCode {
    let config = AppConfig::from_env();

    // Initialize tracing (structured logging) on stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .init();

    tracing::info!("chess-rules v{} ({} output)", env!("CARGO_PKG_VERSION"), config.output);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Play `e2e4`-style moves from the start; a trailing bare square selects
/// that piece.
fn run(args: &[String], config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut game = Game::new();

    for (i, arg) in args.iter().enumerate() {
        match arg.len() {
            4 => {
                let (from, to) = arg
                    .split_at_checked(2)
                    .ok_or_else(|| ChessError::InvalidSquare(arg.clone()))?;
                game.play(from.parse::<Position>()?, to.parse::<Position>()?)?;
            }
            2 if i + 1 == args.len() => {
                game.select(arg.parse()?)?;
            }
            _ => return Err(ChessError::InvalidSquare(arg.clone()).into()),
        }
    }

    match config.output {
        OutputFormat::Json => {
            let snapshot = GameSnapshot::from_game(&game)?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        OutputFormat::Text => print_text(&game)?,
    }
    Ok(())
}

fn print_text(game: &Game) -> Result<(), ChessError> {
    let state = game.state();
    println!("{state}");
    println!();
    println!("to move:  {}", state.active_player());
    println!("status:   {}", game.status());
    if !state.captured_pieces().is_empty() {
        let captured: Vec<String> = state.captured_pieces().iter().map(|p| p.id()).collect();
        println!("captured: {}", captured.join(", "));
    }
    if let Some(piece) = game.selected() {
        let mut moves = game.legal_moves_at(state.locate(&piece)?)?;
        moves.sort();
        let moves: Vec<String> = moves.iter().map(|m| m.to_algebraic()).collect();
        println!("{piece}: {}", moves.join(" "));
    }
    Ok(())
}
