use std::thread;
use std::time::Duration;

use clap::Parser;
use minesweeper_ai::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Autonomous minesweeper bot: plays provably safe cells, guesses otherwise.
#[derive(Parser, Debug)]
#[command(name = "minesweeper-ai", version)]
struct Cli {
    /// Board height in rows.
    #[arg(long, default_value_t = 8)]
    height: usize,

    /// Board width in columns.
    #[arg(long, default_value_t = 8)]
    width: usize,

    /// Number of mines to place.
    #[arg(long, default_value_t = 8)]
    mines: usize,

    /// Seed for mine placement and guesses; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Pause between moves, in milliseconds.
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,

    /// Cross-check every move against the SAT oracle.
    #[arg(long)]
    audit: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // --- 1. Initialization ---
    let seed = cli.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut game = Game::random(cli.height, cli.width, cli.mines, &mut rng)?;
    tracing::info!(
        seed,
        height = cli.height,
        width = cli.width,
        mines = cli.mines,
        "starting game"
    );

    println!("--- Autonomous Minesweeper Bot ---");
    println!("Strategy: Prioritize logically safe moves, guess by safety score otherwise.");
    print_board(&game);

    // --- 2. Game Loop ---
    let mut move_count = 0;
    let mut guesses = 0;
    let mut missed = 0;
    while game.state() == GameState::Playing {
        move_count += 1;
        println!("\n--- Move #{} ---", move_count);

        let Some(choice) = game.ai_step(&mut rng)? else {
            println!("No valid moves left for the bot to make.");
            break;
        };
        match choice {
            Move::Safe(cell) => println!("Logic found a guaranteed safe cell: {cell}"),
            Move::Guess(guess) => {
                guesses += 1;
                println!(
                    "No logically safe move found. Guessing {} ({:.1}% safe)",
                    guess.cell, guess.safety
                );
            }
        }
        print_board(&game);

        if cli.audit && game.state() == GameState::Playing {
            let constraints = game.build_constraints()?;
            let found = oracle::missed_deductions(game.knowledge(), &constraints)?;
            if !found.is_empty() {
                tracing::warn!(count = found.len(), "oracle resolves cells the knowledge base does not");
                missed += found.len();
            }
        }

        thread::sleep(Duration::from_millis(cli.delay_ms));
    }

    // --- 3. Final Result ---
    println!("\n--- Game Over ---");
    match game.state() {
        GameState::Won => println!("Result: The bot won!"),
        GameState::Lost => println!("Result: The bot hit a mine and lost."),
        GameState::Playing => println!("Result: The game ended unexpectedly."),
    }
    println!("Moves: {move_count}, guesses: {guesses}");
    if cli.audit {
        println!("Deductions missed by the knowledge base: {missed}");
    }
    Ok(())
}

fn print_board(game: &Game) {
    // Print header
    print!("   ");
    for col in 0..game.width() {
        print!("{:^3}", col);
    }
    println!("\n  +{}", "---".repeat(game.width()));

    let lost = game.state() == GameState::Lost;
    for (row, tiles) in game.tiles().iter().enumerate() {
        print!("{:^2}|", row);
        for (col, tile) in tiles.iter().enumerate() {
            let cell = Cell::new(row, col);
            let display = match tile {
                Tile::Hidden if lost && game.board().is_mine(cell) => " * ".to_string(),
                Tile::Hidden if game.flags().contains(&cell) => " F ".to_string(),
                Tile::Hidden => " ■ ".to_string(),
                Tile::Revealed(0) => " . ".to_string(),
                Tile::Revealed(n) => format!(" {} ", n),
            };
            print!("{}", display);
        }
        println!();
    }
    println!();
}
