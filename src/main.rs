use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use pgn_heatmap::attacks::RayColor;
use pgn_heatmap::render::raster::{save_session, OutputFormat};
use pgn_heatmap::render::terminal;
use pgn_heatmap::{
    build_timelines_native, parse_game_collection, parse_game_file, HeatmapConfig, HeatmapError,
    HeatmapSession, IllegalMovePolicy, Timeline, TimelineBuilder,
};

/// Visualize chess games as heatmaps based on piece values.
///
/// Piece values: Queen 10, Rook 5, King 4, Bishop 3, Knight 3, Pawn 1.
#[derive(clap::Parser)]
#[clap(version)]
struct Args {
    /// PGN file containing the game.
    pgn_file: PathBuf,
    /// Game to show from a multi-game file, 0 being the first.
    #[clap(short, long, default_value_t = 0)]
    game: usize,
    /// Print a summary of every game in the file and exit.
    #[clap(long)]
    list: bool,
    /// Threads used by --list, defaults to the number of CPUs.
    #[clap(long)]
    threads: Option<usize>,
    /// TOML configuration file. Command line flags take precedence.
    #[clap(short, long)]
    config: Option<PathBuf>,
    /// Play through the game instead of stepping manually.
    #[clap(short, long)]
    animate: bool,
    /// Milliseconds between moves.
    #[clap(short, long)]
    interval: Option<u64>,
    /// Write the heatmap to a file instead of opening the viewer (.png or .gif).
    #[clap(short, long)]
    save: Option<PathBuf>,
    /// Position to show, 0 being the initial position.
    #[clap(short, long = "move")]
    move_index: Option<usize>,
    /// Start over from the first position after the last one.
    #[clap(long)]
    repeat: bool,
    /// Hide the attack overlay.
    #[clap(long)]
    no_rays: bool,
    /// Show piece values in the squares instead of piece symbols.
    #[clap(long)]
    values: bool,
    #[clap(long, value_enum)]
    ray_color: Option<RayColor>,
    /// Wave animation frames per position in GIF output.
    #[clap(long)]
    frames_per_move: Option<u32>,
    /// Square size in pixels for image output.
    #[clap(long)]
    cell_size: Option<u32>,
    /// What to do with an illegal move in the mainline.
    #[clap(long, value_enum)]
    illegal_moves: Option<IllegalMovePolicy>,
}

impl Args {
    fn config(&self) -> Result<HeatmapConfig, HeatmapError> {
        let mut config = match &self.config {
            Some(path) => HeatmapConfig::from_toml_file(path)?,
            None => HeatmapConfig::default(),
        };
        if let Some(interval) = self.interval {
            config.interval_ms = interval;
        }
        if let Some(index) = self.move_index {
            config.start_move = index;
        }
        if self.repeat {
            config.repeat = true;
        }
        if self.no_rays {
            config.show_rays = false;
        }
        if self.values {
            config.show_pieces = false;
        }
        if let Some(color) = self.ray_color {
            config.ray_color = color;
        }
        if let Some(frames) = self.frames_per_move {
            config.frames_per_move = frames;
        }
        if let Some(size) = self.cell_size {
            config.cell_size = size;
        }
        if let Some(policy) = self.illegal_moves {
            config.illegal_moves = policy;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), HeatmapError> {
    let config = args.config()?;
    let builder = TimelineBuilder::new(config.piece_values).with_policy(config.illegal_moves);

    if args.list {
        return list_games(&args.pgn_file, &builder, args.threads);
    }

    println!("Loading game from {}...", args.pgn_file.display());
    let game = parse_game_file(&args.pgn_file, args.game)?;
    let timeline = builder.build(&game)?;
    println!("Game loaded with {} positions", timeline.len());
    print_game_info(&timeline);

    let mut session = HeatmapSession::new(timeline, &config)?;

    if let Some(path) = &args.save {
        return save(&session, &config, path);
    }

    if let Some(index) = args.move_index {
        println!("Displaying position at move {}...", index);
    }
    if args.animate {
        if session.on_toggle_play().schedule.is_empty() {
            println!("Already at the last position, nothing to animate");
        } else {
            println!("Animating game (interval: {}ms)...", config.interval_ms);
        }
    }
    terminal::run(&mut session)?;
    Ok(())
}

fn print_game_info(timeline: &Timeline) {
    if timeline.headers().is_empty() {
        return;
    }
    println!("\nGame Information:");
    if let Some(event) = timeline.header("Event") {
        println!("  Event: {}", event);
    }
    if let (Some(white), Some(black)) = (timeline.header("White"), timeline.header("Black")) {
        println!("  Players: {} vs {}", white, black);
    }
    if let Some(date) = timeline.header("Date") {
        println!("  Date: {}", date);
    }
    if let Some(result) = timeline.header("Result") {
        println!("  Result: {}", result);
    }
    if let Some(truncation) = timeline.truncation() {
        println!(
            "  Incomplete: stopped before ply {} ({})",
            truncation.ply, truncation.reason
        );
    }
    println!();
}

fn list_games(path: &Path, builder: &TimelineBuilder, threads: Option<usize>) -> Result<(), HeatmapError> {
    let games = parse_game_collection(path)?;
    let parsed: Vec<_> = games.iter().filter_map(|g| g.as_ref().ok()).cloned().collect();
    let mut timelines = build_timelines_native(&parsed, builder, threads)?.into_iter();

    for (index, game) in games.iter().enumerate() {
        let game = match game {
            Ok(game) => game,
            Err(err) => {
                println!("{:>4}  error: {}", index, err);
                continue;
            }
        };
        let white = game.header("White").unwrap_or("?");
        let black = game.header("Black").unwrap_or("?");
        let result = game.header("Result").unwrap_or("*");
        match timelines.next() {
            Some(Ok(timeline)) => println!(
                "{:>4}  {} vs {} ({})  {} plies{}",
                index,
                white,
                black,
                result,
                timeline.last_index(),
                if timeline.is_complete() { "" } else { " (truncated)" }
            ),
            Some(Err(err)) => println!("{:>4}  {} vs {} ({})  error: {}", index, white, black, result, err),
            None => {}
        }
    }
    Ok(())
}

fn save(session: &HeatmapSession, config: &HeatmapConfig, path: &Path) -> Result<(), HeatmapError> {
    match OutputFormat::from_path(path)? {
        OutputFormat::Png => println!("Saving position {} to {}...", session.cursor(), path.display()),
        OutputFormat::Gif => println!("Saving animation to {}...", path.display()),
    }
    let frames = save_session(session, config, path)?;
    println!("Saved {} frame(s) to {}", frames, path.display());
    Ok(())
}
