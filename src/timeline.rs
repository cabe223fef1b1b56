//! Game timeline: one heatmap snapshot per ply, starting with the root position.

use crate::comment_parsing::Annotations;
use crate::error::MalformedGameError;
use crate::snapshot::{PieceValues, Snapshot};
use crate::visitor::ParsedGame;
use serde::{Deserialize, Serialize};
use shakmaty::{uci::UciMove, Chess, Position};

/// What to do when the rules engine rejects a mainline move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IllegalMovePolicy {
    /// Fail the whole load.
    #[default]
    Reject,
    /// Keep the positions up to the last legal ply and mark the timeline truncated.
    Truncate,
}

/// The move that produced a timeline entry.
#[derive(Clone, Debug)]
pub struct PlayedMove {
    pub san: String,
    pub uci: String,
    pub annotations: Annotations,
}

#[derive(Clone, Debug)]
pub struct TimelineEntry {
    pub ply: usize,
    pub snapshot: Snapshot,
    pub description: String,
    pub position: Chess,
    /// None for the initial position.
    pub played: Option<PlayedMove>,
}

/// Where and why a timeline stopped short of the end of the game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Truncation {
    /// 1-based ply of the first rejected move.
    pub ply: usize,
    pub reason: String,
}

/// Ordered snapshots of a game, index i holding the position after i plies.
#[derive(Clone, Debug)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
    headers: Vec<(String, String)>,
    outcome: Option<String>,
    truncation: Option<Truncation>,
}

impl Timeline {
    /// Number of entries, always at least one.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the final position.
    pub fn last_index(&self) -> usize {
        self.entries.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&TimelineEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimelineEntry> {
        self.entries.iter()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn outcome(&self) -> Option<&str> {
        self.outcome.as_deref()
    }

    pub fn truncation(&self) -> Option<&Truncation> {
        self.truncation.as_ref()
    }

    /// False when an illegal move cut the game short.
    pub fn is_complete(&self) -> bool {
        self.truncation.is_none()
    }
}

/// Replays parsed games into timelines.
#[derive(Clone, Debug, Default)]
pub struct TimelineBuilder {
    values: PieceValues,
    policy: IllegalMovePolicy,
}

impl TimelineBuilder {
    pub fn new(values: PieceValues) -> Self {
        TimelineBuilder {
            values,
            policy: IllegalMovePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: IllegalMovePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(&self, game: &ParsedGame) -> Result<Timeline, MalformedGameError> {
        let mut pos = game.root.clone();
        let mut entries = Vec::with_capacity(game.moves.len() + 1);
        entries.push(TimelineEntry {
            ply: 0,
            snapshot: Snapshot::extract(&pos, &self.values),
            description: "Initial Position".to_string(),
            position: pos.clone(),
            played: None,
        });

        let mut truncation = None;
        for (i, recorded) in game.moves.iter().enumerate() {
            let ply = i + 1;
            let m = match recorded.san.san.to_move(&pos) {
                Ok(m) => m,
                Err(source) => {
                    let err = MalformedGameError {
                        ply,
                        san: recorded.san.to_string(),
                        source,
                    };
                    match self.policy {
                        IllegalMovePolicy::Reject => return Err(err),
                        IllegalMovePolicy::Truncate => {
                            log::warn!("timeline truncated after ply {}: {}", ply - 1, err);
                            truncation = Some(Truncation {
                                ply,
                                reason: err.to_string(),
                            });
                            break;
                        }
                    }
                }
            };

            let uci = UciMove::from_standard(m).to_string();
            pos.play_unchecked(m);
            entries.push(TimelineEntry {
                ply,
                snapshot: Snapshot::extract(&pos, &self.values),
                description: format!("Move {}: {}", ply, uci),
                position: pos.clone(),
                played: Some(PlayedMove {
                    san: recorded.san.to_string(),
                    uci,
                    annotations: recorded.annotations.clone(),
                }),
            });
        }

        log::debug!(
            "built timeline with {} positions from {} moves",
            entries.len(),
            game.moves.len()
        );

        Ok(Timeline {
            entries,
            headers: game.headers.clone(),
            outcome: game.outcome.clone(),
            truncation,
        })
    }
}
