//! PGN visitor collecting the mainline of a game.
//!
//! The visitor only records what the PGN says: headers, the root position and
//! the SAN of every mainline move. Moves are resolved and checked later by the
//! timeline builder, so a game with an illegal move still parses here.

use crate::comment_parsing::Annotations;
use crate::error::GameLoadError;
use pgn_reader::{KnownOutcome, Outcome, RawComment, RawTag, SanPlus, Skip, Visitor};
use shakmaty::{fen::Fen, CastlingMode, Chess};
use std::ops::ControlFlow;

/// One mainline move as written in the PGN.
#[derive(Clone, Debug)]
pub struct RecordedMove {
    pub san: SanPlus,
    pub annotations: Annotations,
}

/// A game as read from PGN, before any move has been played.
#[derive(Clone, Debug)]
pub struct ParsedGame {
    pub headers: Vec<(String, String)>,
    pub root: Chess,
    pub moves: Vec<RecordedMove>,
    /// "White", "Black", "Draw", "Unknown", or None if the movetext has no result.
    pub outcome: Option<String>,
}

impl ParsedGame {
    /// Case-insensitive header lookup.
    pub fn header(&self, key: &str) -> Option<&str> {
        find_header(&self.headers, key)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], key: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.as_str())
}

/// Root position from the `FEN` and `Variant` headers, defaulting to the standard start.
fn root_position(headers: &[(String, String)]) -> Result<Chess, GameLoadError> {
    let castling_mode = match find_header(headers, "Variant") {
        Some(v) if v.eq_ignore_ascii_case("chess960") => CastlingMode::Chess960,
        _ => CastlingMode::Standard,
    };

    let Some(fen_str) = find_header(headers, "FEN") else {
        return Ok(Chess::default());
    };

    let fen_error = |reason: String| GameLoadError::Fen {
        fen: fen_str.to_string(),
        reason,
    };
    let fen = fen_str
        .parse::<Fen>()
        .map_err(|e| fen_error(format!("{}", e)))?;
    fen.into_position::<Chess>(castling_mode)
        .map_err(|e| fen_error(format!("{}", e)))
}

/// Visitor building a [`ParsedGame`] for every game in the input.
#[derive(Default)]
pub struct GameVisitor {
    headers: Vec<(String, String)>,
}

impl GameVisitor {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Movetext state for the game currently being read.
pub struct Movetext {
    root: Chess,
    moves: Vec<RecordedMove>,
    outcome: Option<String>,
}

impl Visitor for GameVisitor {
    type Tags = Vec<(String, String)>;
    type Movetext = Movetext;
    type Output = Result<ParsedGame, GameLoadError>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(Vec::with_capacity(10))
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        key: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        let key_str = String::from_utf8_lossy(key).into_owned();
        let value_str = String::from_utf8_lossy(value.as_bytes()).into_owned();
        tags.push((key_str, value_str));
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        let root = match root_position(&tags) {
            Ok(root) => root,
            Err(err) => return ControlFlow::Break(Err(err)),
        };
        self.headers = tags;
        ControlFlow::Continue(Movetext {
            root,
            moves: Vec::with_capacity(80),
            outcome: None,
        })
    }

    fn san(&mut self, movetext: &mut Self::Movetext, san_plus: SanPlus) -> ControlFlow<Self::Output> {
        movetext.moves.push(RecordedMove {
            san: san_plus,
            annotations: Annotations::default(),
        });
        ControlFlow::Continue(())
    }

    fn comment(
        &mut self,
        movetext: &mut Self::Movetext,
        comment: RawComment<'_>,
    ) -> ControlFlow<Self::Output> {
        // comments before the first move belong to the game, not a move
        if let Some(last) = movetext.moves.last_mut() {
            last.annotations
                .absorb(&String::from_utf8_lossy(comment.as_bytes()));
        }
        ControlFlow::Continue(())
    }

    fn begin_variation(
        &mut self,
        _movetext: &mut Self::Movetext,
    ) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true)) // Skip variations, stay in mainline
    }

    fn outcome(
        &mut self,
        movetext: &mut Self::Movetext,
        outcome: Outcome,
    ) -> ControlFlow<Self::Output> {
        movetext.outcome = Some(match outcome {
            Outcome::Known(known) => match known {
                KnownOutcome::Decisive { winner } => format!("{:?}", winner),
                KnownOutcome::Draw => "Draw".to_string(),
            },
            Outcome::Unknown => "Unknown".to_string(),
        });
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, movetext: Self::Movetext) -> Self::Output {
        Ok(ParsedGame {
            headers: std::mem::take(&mut self.headers),
            root: movetext.root,
            moves: movetext.moves,
            outcome: movetext.outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment_parsing::Eval;
    use pgn_reader::Reader;
    use shakmaty::{Color, Position};
    use std::io::Cursor;

    fn read_one(pgn: &str) -> Result<ParsedGame, GameLoadError> {
        let mut reader = Reader::new(Cursor::new(pgn));
        let mut visitor = GameVisitor::new();
        reader
            .read_game(&mut visitor)
            .expect("io error")
            .expect("no game")
    }

    #[test]
    fn test_parse_simple_game() {
        let pgn = r#"[Event "Test"]
[White "Player1"]
[Black "Player2"]
[Result "1-0"]

1. e4 e5 2. Nf3 Nc6 1-0"#;

        let game = read_one(pgn).unwrap();
        assert_eq!(game.moves.len(), 4);
        assert_eq!(game.header("event"), Some("Test"));
        assert_eq!(game.outcome, Some("White".to_string()));
        assert_eq!(game.root.board(), Chess::default().board());
    }

    #[test]
    fn test_annotations_attach_to_moves() {
        let pgn = "1. e4 { [%eval 0.17] [%clk 0:03:00] } 1... e5 { [%eval #-2] } 1-0";

        let game = read_one(pgn).unwrap();
        assert_eq!(game.moves[0].annotations.eval, Some(Eval::Pawns(0.17)));
        assert_eq!(
            game.moves[0].annotations.clock.map(|c| c.as_seconds()),
            Some(180)
        );
        assert_eq!(game.moves[1].annotations.eval, Some(Eval::Mate(-2)));
    }

    #[test]
    fn test_variations_skipped() {
        let pgn = "1. e4 (1. d4 d5) 1... e5 2. Nf3 1/2-1/2";

        let game = read_one(pgn).unwrap();
        let sans: Vec<String> = game.moves.iter().map(|m| m.san.to_string()).collect();
        assert_eq!(sans, vec!["e4", "e5", "Nf3"]);
        assert_eq!(game.outcome, Some("Draw".to_string()));
    }

    #[test]
    fn test_illegal_move_still_recorded() {
        let game = read_one("1. e4 Ke2 0-1").unwrap();
        assert_eq!(game.moves.len(), 2);
    }

    #[test]
    fn test_parse_game_with_fen() {
        let pgn = r#"[fen "r1bqkbnr/pppp1ppp/2n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3"]

3... a6 4. Ba4 1-0"#;

        let game = read_one(pgn).unwrap();
        assert_eq!(game.root.turn(), Color::Black);
        assert_eq!(game.moves.len(), 2);
    }

    #[test]
    fn test_parse_chess960_root() {
        let pgn = r#"[Variant "Chess960"]
[FEN "brkrqnnb/pppppppp/8/8/8/8/PPPPPPPP/BRKRQNNB w KQkq - 0 1"]

1. g3 d5 1-0"#;

        let game = read_one(pgn).unwrap();
        assert_ne!(game.root.board(), Chess::default().board());
    }

    #[test]
    fn test_invalid_fen_is_load_error() {
        let pgn = r#"[FEN "invalid fen string"]

1. e4 e5 1-0"#;

        assert!(matches!(read_one(pgn), Err(GameLoadError::Fen { .. })));
    }
}
