//! Chess games from PGN rendered as 8x8 piece-value heatmaps.
//!
//! Reading goes PGN text → [`ParsedGame`] → [`Timeline`]; a [`HeatmapSession`]
//! steps through the timeline and hands frames to a [`render::Renderer`].

use pgn_reader::Reader;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

pub mod attacks;
pub mod autoplay;
pub mod comment_parsing;
pub mod config;
pub mod error;
pub mod navigation;
#[cfg(feature = "python")]
mod python_bindings;
pub mod render;
pub mod session;
pub mod snapshot;
pub mod timeline;
pub mod timer;
pub mod visitor;

pub use config::HeatmapConfig;
pub use error::{
    ConfigError, GameLoadError, HeatmapError, MalformedGameError, OutOfRangeError, RenderError,
};
pub use navigation::Navigator;
pub use session::{Event, HeatmapSession, Response};
pub use snapshot::{PieceValues, Snapshot};
pub use timeline::{IllegalMovePolicy, Timeline, TimelineBuilder, TimelineEntry};
pub use visitor::{GameVisitor, ParsedGame};

/// Every game in `input`, in order. A game with a bad setup does not stop the
/// games after it; only a failure of the reader itself does.
pub fn read_games<R: Read>(input: R) -> Result<Vec<Result<ParsedGame, GameLoadError>>, GameLoadError> {
    let mut reader = Reader::new(input);
    let mut visitor = GameVisitor::new();
    let mut games = Vec::new();
    while let Some(game) = reader
        .read_game(&mut visitor)
        .map_err(GameLoadError::Reader)?
    {
        games.push(game);
    }
    Ok(games)
}

/// The first game in `pgn`.
pub fn parse_game_str(pgn: &str) -> Result<ParsedGame, GameLoadError> {
    let mut reader = Reader::new(Cursor::new(pgn));
    let mut visitor = GameVisitor::new();
    match reader.read_game(&mut visitor) {
        Ok(Some(game)) => game,
        Ok(None) => Err(GameLoadError::NoGame),
        Err(err) => Err(GameLoadError::Reader(err)),
    }
}

fn open(path: &Path) -> Result<BufReader<File>, GameLoadError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| GameLoadError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Game number `index` (0-based) of a PGN file.
pub fn parse_game_file(path: &Path, index: usize) -> Result<ParsedGame, GameLoadError> {
    let mut games = read_games(open(path)?)?;
    let count = games.len();
    if count == 0 {
        return Err(GameLoadError::NoGame);
    }
    if index >= count {
        return Err(GameLoadError::NoSuchGame { index, count });
    }
    let game = games.swap_remove(index)?;
    log::info!(
        "loaded game {} of {} from {} ({} plies)",
        index,
        count,
        path.display(),
        game.moves.len()
    );
    Ok(game)
}

/// All games of a PGN file.
pub fn parse_game_collection(path: &Path) -> Result<Vec<Result<ParsedGame, GameLoadError>>, GameLoadError> {
    let games = read_games(open(path)?)?;
    log::info!("read {} game(s) from {}", games.len(), path.display());
    Ok(games)
}

/// Load one game from a file and replay it.
pub fn load_timeline(
    path: &Path,
    index: usize,
    builder: &TimelineBuilder,
) -> Result<Timeline, HeatmapError> {
    let game = parse_game_file(path, index)?;
    Ok(builder.build(&game)?)
}

/// Build the timelines of many games in parallel.
///
/// Results keep the input order. `num_threads` defaults to the number of CPUs.
pub fn build_timelines_native(
    games: &[ParsedGame],
    builder: &TimelineBuilder,
    num_threads: Option<usize>,
) -> Result<Vec<Result<Timeline, MalformedGameError>>, HeatmapError> {
    let num_threads = num_threads.unwrap_or_else(num_cpus::get);
    let thread_pool = ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()?;

    Ok(thread_pool.install(|| games.par_iter().map(|game| builder.build(game)).collect()))
}

/// Parse and replay many single-game PGN strings in parallel.
pub fn parse_timelines_native(
    pgns: &[String],
    builder: &TimelineBuilder,
    num_threads: Option<usize>,
) -> Result<Vec<Result<Timeline, HeatmapError>>, HeatmapError> {
    let num_threads = num_threads.unwrap_or_else(num_cpus::get);
    let thread_pool = ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()?;

    Ok(thread_pool.install(|| {
        pgns.par_iter()
            .map(|pgn| -> Result<Timeline, HeatmapError> {
                let game = parse_game_str(pgn)?;
                Ok(builder.build(&game)?)
            })
            .collect()
    }))
}
