//! Python module `pgn_heatmap`, built with the `python` feature.

use crate::render::raster::save_session;
use crate::session::HeatmapSession;
use crate::snapshot::Snapshot;
use crate::{
    parse_game_str, parse_timelines_native, HeatmapConfig, HeatmapError, OutOfRangeError,
    TimelineBuilder,
};
use pyo3::exceptions::{PyIOError, PyIndexError, PyValueError};
use pyo3::prelude::*;
use std::path::PathBuf;

fn to_py_err(err: HeatmapError) -> PyErr {
    match err {
        HeatmapError::OutOfRange(e) => PyIndexError::new_err(e.to_string()),
        HeatmapError::Render(e) => PyIOError::new_err(e.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

// Python-side grids are lists of ints, not bytes.
fn grid(snapshot: &Snapshot) -> Vec<Vec<u32>> {
    snapshot
        .rows()
        .iter()
        .map(|row| row.iter().map(|&v| u32::from(v)).collect())
        .collect()
}

/// Step-through viewer over one game.
#[pyclass(name = "HeatmapSession")]
pub struct PyHeatmapSession {
    inner: HeatmapSession,
    config: HeatmapConfig,
}

#[pymethods]
impl PyHeatmapSession {
    #[new]
    #[pyo3(signature = (pgn, start_move = 0, interval_ms = 500, truncate_illegal = false))]
    fn new(pgn: &str, start_move: usize, interval_ms: u64, truncate_illegal: bool) -> PyResult<Self> {
        let config = HeatmapConfig {
            start_move,
            interval_ms,
            illegal_moves: if truncate_illegal {
                crate::IllegalMovePolicy::Truncate
            } else {
                crate::IllegalMovePolicy::Reject
            },
            ..HeatmapConfig::default()
        };
        config.validate().map_err(|e| to_py_err(e.into()))?;

        let game = parse_game_str(pgn).map_err(|e| to_py_err(e.into()))?;
        let timeline = TimelineBuilder::new(config.piece_values)
            .with_policy(config.illegal_moves)
            .build(&game)
            .map_err(|e| to_py_err(e.into()))?;
        let inner = HeatmapSession::new(timeline, &config).map_err(|e| to_py_err(e.into()))?;
        Ok(PyHeatmapSession { inner, config })
    }

    fn __len__(&self) -> usize {
        self.inner.timeline().len()
    }

    fn __repr__(&self) -> String {
        format!(
            "<HeatmapSession {}/{}>",
            self.inner.cursor(),
            self.inner.timeline().last_index()
        )
    }

    #[getter]
    fn cursor(&self) -> usize {
        self.inner.cursor()
    }

    #[getter]
    fn title(&self) -> String {
        self.inner.title()
    }

    #[getter]
    fn description(&self) -> String {
        self.inner.current().description.clone()
    }

    #[getter]
    fn is_complete(&self) -> bool {
        self.inner.timeline().is_complete()
    }

    #[getter]
    fn outcome(&self) -> Option<String> {
        self.inner.timeline().outcome().map(str::to_string)
    }

    #[getter]
    fn headers(&self) -> Vec<(String, String)> {
        self.inner.timeline().headers().to_vec()
    }

    /// Returns whether the cursor moved.
    fn next(&mut self) -> bool {
        self.inner.on_next().redraw
    }

    /// Returns whether the cursor moved.
    fn previous(&mut self) -> bool {
        self.inner.on_previous().redraw
    }

    fn jump(&mut self, index: usize) -> PyResult<()> {
        self.inner
            .on_jump(index)
            .map_err(|e| to_py_err(e.into()))?;
        Ok(())
    }

    /// Returns whether the cursor moved.
    fn reset(&mut self) -> bool {
        self.inner.on_first().redraw
    }

    /// Value grid of a position, the current one by default.
    #[pyo3(signature = (index = None))]
    fn snapshot(&self, index: Option<usize>) -> PyResult<Vec<Vec<u32>>> {
        let index = index.unwrap_or_else(|| self.inner.cursor());
        let timeline = self.inner.timeline();
        let entry = timeline.get(index).ok_or_else(|| {
            to_py_err(
                OutOfRangeError {
                    index,
                    last: timeline.last_index(),
                }
                .into(),
            )
        })?;
        Ok(grid(&entry.snapshot))
    }

    fn snapshots(&self) -> Vec<Vec<Vec<u32>>> {
        self.inner
            .timeline()
            .iter()
            .map(|entry| grid(&entry.snapshot))
            .collect()
    }

    /// Write the current position to a .png, or the rest of the game to a .gif.
    fn save(&self, path: PathBuf) -> PyResult<()> {
        save_session(&self.inner, &self.config, &path).map_err(to_py_err)?;
        Ok(())
    }
}

/// Value grids of every position of a single game.
#[pyfunction]
fn game_snapshots(pgn: &str) -> PyResult<Vec<Vec<Vec<u32>>>> {
    let game = parse_game_str(pgn).map_err(|e| to_py_err(e.into()))?;
    let timeline = TimelineBuilder::default()
        .build(&game)
        .map_err(|e| to_py_err(e.into()))?;
    Ok(timeline.iter().map(|entry| grid(&entry.snapshot)).collect())
}

/// In parallel, value grids of every position of many games.
#[pyfunction]
#[pyo3(signature = (pgns, num_threads = None))]
fn games_snapshots(
    py: Python<'_>,
    pgns: Vec<String>,
    num_threads: Option<usize>,
) -> PyResult<Vec<Vec<Vec<Vec<u32>>>>> {
    let builder = TimelineBuilder::default();
    let results = py
        .allow_threads(|| parse_timelines_native(&pgns, &builder, num_threads))
        .map_err(to_py_err)?;
    results
        .into_iter()
        .map(|timeline| -> PyResult<Vec<Vec<Vec<u32>>>> {
            let timeline = timeline.map_err(to_py_err)?;
            Ok(timeline.iter().map(|entry| grid(&entry.snapshot)).collect())
        })
        .collect()
}

/// Chess games as piece-value heatmaps
#[pymodule]
fn pgn_heatmap(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(game_snapshots, m)?)?;
    m.add_function(wrap_pyfunction!(games_snapshots, m)?)?;
    m.add_class::<PyHeatmapSession>()?;
    Ok(())
}
