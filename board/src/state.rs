//! Immutable snapshots of a position, read from and written to FEN

use core::{fmt, str::FromStr};

use crate::{Color, Dimensions, MoveRequest, Piece, PieceKind, Square};

/// The FEN at which to start a traditional game
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    #[error("FEN string has no piece placement")]
    MissingPlacement,
    #[error("FEN placement has {found} ranks, expected {expected}")]
    RankCount { expected: u8, found: usize },
    #[error("FEN rank {rank} covers {found} files, expected {expected}")]
    RankWidth { rank: u8, expected: u8, found: usize },
    #[error("invalid piece character: {0}")]
    InvalidPiece(char),
    #[error("invalid side to move: {0:?}")]
    InvalidTurn(String),
    #[error("invalid move counter: {0:?}")]
    InvalidClock(String),
    #[error("board of {files}x{ranks} is not supported")]
    UnsupportedDimensions { files: u8, ranks: u8 },
}

/// A snapshot of a position
///
/// A state is never edited in place. Every change to the position produces a new one, so holding
/// on to a state (to animate away from it, say) is always safe.
#[derive(Clone, PartialEq, Eq)]
pub struct BoardState {
    dimensions: Dimensions,
    /// Cells in rank-major order, starting from a1
    cells: Box<[Option<Piece>]>,
    turn: Color,
    // The remaining fields are carried through so the FEN round-trips
    castling: String,
    en_passant: String,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl BoardState {
    /// A board of the given size with nothing on it and white to move
    pub fn empty(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            cells: vec![None; dimensions.area()].into_boxed_slice(),
            turn: Color::White,
            castling: "-".to_string(),
            en_passant: "-".to_string(),
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// The state at the start of a traditional game
    pub fn starting() -> Self {
        Self::from_fen(STARTING_FEN).expect("starting FEN is valid")
    }

    /// Parse an 8x8 board from the given FEN
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        Self::from_fen_sized(fen, Dimensions::STANDARD)
    }

    /// Parse a board of the given size from the given FEN
    ///
    /// Only the placement is required. Missing trailing fields take the values `w - - 0 1`.
    pub fn from_fen_sized(fen: &str, dimensions: Dimensions) -> Result<Self, FenError> {
        if dimensions.files == 0
            || dimensions.ranks == 0
            || dimensions.files > Dimensions::MAX_FILES
        {
            return Err(FenError::UnsupportedDimensions {
                files: dimensions.files,
                ranks: dimensions.ranks,
            });
        }
        let mut fields = fen.split_whitespace();
        let placement = fields.next().ok_or(FenError::MissingPlacement)?;
        let mut state = Self::empty(dimensions);

        let rows: Vec<&str> = placement.split('/').collect();
        if rows.len() != usize::from(dimensions.ranks) {
            return Err(FenError::RankCount {
                expected: dimensions.ranks,
                found: rows.len(),
            });
        }
        for (row_idx, row) in rows.iter().enumerate() {
            // FEN lists the last rank first
            let rank = dimensions.ranks - 1 - row_idx as u8;
            let mut file = 0usize;
            let mut run = 0usize;
            for c in row.chars() {
                if let Some(digit) = c.to_digit(10) {
                    let widened = run
                        .checked_mul(10)
                        .and_then(|run| run.checked_add(digit as usize))
                        .map(|run| file.saturating_add(run));
                    match widened {
                        Some(width) if width <= usize::from(dimensions.files) => {
                            run = width - file;
                        }
                        _ => {
                            return Err(FenError::RankWidth {
                                rank: rank + 1,
                                expected: dimensions.files,
                                found: widened.unwrap_or(usize::MAX),
                            })
                        }
                    }
                    continue;
                }
                file += run;
                run = 0;
                let piece = Piece::from_fen_letter(c).ok_or(FenError::InvalidPiece(c))?;
                if file >= usize::from(dimensions.files) {
                    return Err(FenError::RankWidth {
                        rank: rank + 1,
                        expected: dimensions.files,
                        found: file + 1,
                    });
                }
                let idx = state.index(Square::new(file as u8, rank));
                state.cells[idx] = Some(piece);
                file += 1;
            }
            file += run;
            if file != usize::from(dimensions.files) {
                return Err(FenError::RankWidth {
                    rank: rank + 1,
                    expected: dimensions.files,
                    found: file,
                });
            }
        }

        state.turn = match fields.next() {
            None | Some("w") => Color::White,
            Some("b") => Color::Black,
            Some(other) => return Err(FenError::InvalidTurn(other.to_string())),
        };
        if let Some(castling) = fields.next() {
            state.castling = castling.to_string();
        }
        if let Some(en_passant) = fields.next() {
            state.en_passant = en_passant.to_string();
        }
        if let Some(clock) = fields.next() {
            state.halfmove_clock = clock
                .parse()
                .map_err(|_| FenError::InvalidClock(clock.to_string()))?;
        }
        if let Some(number) = fields.next() {
            state.fullmove_number = number
                .parse()
                .map_err(|_| FenError::InvalidClock(number.to_string()))?;
        }
        Ok(state)
    }

    /// Convert to a FEN string
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(self.cells.len() + 16);
        for rank in (0..self.dimensions.ranks).rev() {
            let mut empty = 0;
            for file in 0..self.dimensions.files {
                match self.cells[self.index(Square::new(file, rank))] {
                    Some(piece) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        fen.push(piece.fen_letter());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }
        fen.push(' ');
        fen.push(self.turn.fen_letter());
        fen.push(' ');
        fen.push_str(&self.castling);
        fen.push(' ');
        fen.push_str(&self.en_passant);
        fen.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        fen
    }

    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// The side to move
    pub const fn turn(&self) -> Color {
        self.turn
    }

    pub fn castling(&self) -> &str {
        &self.castling
    }

    pub fn en_passant(&self) -> &str {
        &self.en_passant
    }

    pub const fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub const fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub const fn contains(&self, square: Square) -> bool {
        self.dimensions.contains(square)
    }

    /// The piece on the given square, or `None` if it's empty or off the board
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        if self.contains(square) {
            self.cells[self.index(square)]
        } else {
            None
        }
    }

    /// Every square with its contents, in rank-major order starting from a1
    pub fn squares(&self) -> impl Iterator<Item = (Square, Option<Piece>)> + '_ {
        let files = self.dimensions.files;
        self.cells.iter().enumerate().map(move |(idx, piece)| {
            let square = Square::new((idx % usize::from(files)) as u8, (idx / usize::from(files)) as u8);
            (square, *piece)
        })
    }

    /// Every occupied square with its piece, in rank-major order
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.squares()
            .filter_map(|(square, piece)| piece.map(|piece| (square, piece)))
    }

    /// Where the king of the given color stands, if it's on the board
    pub fn king(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, piece)| *piece == Piece::new(PieceKind::King, color))
            .map(|(square, _)| square)
    }

    /// A new state with the piece on `mv.from` lifted onto `mv.to`, with no rule checks
    ///
    /// Whatever stood on the target is removed and the promotion, if any, replaces the moving
    /// piece's kind. The side to move and the counters are untouched. Moving from an empty or
    /// off-board square gives back an identical state.
    pub fn relocated(&self, mv: &MoveRequest) -> Self {
        let mut next = self.clone();
        let Some(mut piece) = self.piece_at(mv.from) else {
            return next;
        };
        if !self.contains(mv.to) {
            return next;
        }
        if let Some(kind) = mv.promotion {
            piece.kind = kind;
        }
        let from = next.index(mv.from);
        let to = next.index(mv.to);
        next.cells[from] = None;
        next.cells[to] = Some(piece);
        next
    }

    /// A new state with the counters advanced as after a move by the side to move
    ///
    /// `reset_clock` is for pawn moves and captures, which restart the fifty-move clock. The
    /// side to move flips and en passant is cleared.
    pub fn advanced(&self, reset_clock: bool) -> Self {
        Self {
            turn: self.turn.other(),
            en_passant: "-".to_string(),
            halfmove_clock: if reset_clock {
                0
            } else {
                self.halfmove_clock.saturating_add(1)
            },
            fullmove_number: if self.turn.is_black() {
                self.fullmove_number.saturating_add(1)
            } else {
                self.fullmove_number
            },
            ..self.clone()
        }
    }

    fn index(&self, square: Square) -> usize {
        usize::from(square.rank) * usize::from(self.dimensions.files) + usize::from(square.file)
    }
}

impl fmt::Debug for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoardState").field(&self.to_fen()).finish()
    }
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fen())
    }
}

impl FromStr for BoardState {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::starting()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn test_starting_position() {
        let state = BoardState::starting();
        assert_eq!(
            state.piece_at(sq("a1")),
            Some(Piece::new(PieceKind::Rook, Color::White))
        );
        assert_eq!(
            state.piece_at(sq("e1")),
            Some(Piece::new(PieceKind::King, Color::White))
        );
        assert_eq!(
            state.piece_at(sq("d8")),
            Some(Piece::new(PieceKind::Queen, Color::Black))
        );
        assert_eq!(state.piece_at(sq("e4")), None);
        assert_eq!(state.piece_at(sq("i1")), None);
        assert_eq!(state.turn(), Color::White);
        assert_eq!(state.to_fen(), STARTING_FEN);
    }

    #[test]
    fn test_partial_fen_gets_defaults() {
        let state = BoardState::from_fen("8/8/8/8/8/8/8/8").unwrap();
        assert_eq!(state.pieces().count(), 0);
        assert_eq!(state.to_fen(), "8/8/8/8/8/8/8/8 w - - 0 1");
    }

    #[test]
    fn test_auxiliary_fields_round_trip() {
        let fen = "r3k2r/8/8/3pP3/8/8/8/R3K2R w Kq d6 7 42";
        let state = BoardState::from_fen(fen).unwrap();
        assert_eq!(state.castling(), "Kq");
        assert_eq!(state.en_passant(), "d6");
        assert_eq!(state.halfmove_clock(), 7);
        assert_eq!(state.fullmove_number(), 42);
        assert_eq!(state.to_fen(), fen);
    }

    #[test]
    fn test_wide_board() {
        let dims = Dimensions::new(10, 10);
        let fen = "rnbqkkbqnr/10/10/10/10/10/10/10/10/RNBQKKBQNR b - - 0 1";
        let state = BoardState::from_fen_sized(fen, dims).unwrap();
        assert_eq!(
            state.piece_at(sq("j1")),
            Some(Piece::new(PieceKind::Rook, Color::White))
        );
        assert_eq!(
            state.piece_at(sq("a10")),
            Some(Piece::new(PieceKind::Rook, Color::Black))
        );
        assert_eq!(state.to_fen(), fen);
    }

    #[test]
    fn test_bad_fens() {
        assert_eq!(BoardState::from_fen(""), Err(FenError::MissingPlacement));
        assert!(matches!(
            BoardState::from_fen("8/8/8/8/8/8/8 w - - 0 1"),
            Err(FenError::RankCount { found: 7, .. })
        ));
        assert!(matches!(
            BoardState::from_fen("9/8/8/8/8/8/8/8"),
            Err(FenError::RankWidth { rank: 8, found: 9, .. })
        ));
        assert!(matches!(
            BoardState::from_fen("99999999999999999999999/8/8/8/8/8/8/8 w - - 0 1"),
            Err(FenError::RankWidth { rank: 8, .. })
        ));
        assert!(matches!(
            BoardState::from_fen("3p44/8/8/8/8/8/8/8"),
            Err(FenError::RankWidth { rank: 8, found: 48, .. })
        ));
        assert!(matches!(
            BoardState::from_fen("ppppppppp/8/8/8/8/8/8/8"),
            Err(FenError::RankWidth { .. })
        ));
        assert_eq!(
            BoardState::from_fen("7x/8/8/8/8/8/8/8"),
            Err(FenError::InvalidPiece('x'))
        );
        assert_eq!(
            BoardState::from_fen("8/8/8/8/8/8/8/8 x"),
            Err(FenError::InvalidTurn("x".to_string()))
        );
        assert!(matches!(
            BoardState::from_fen("8/8/8/8/8/8/8/8 w - - z 1"),
            Err(FenError::InvalidClock(_))
        ));
    }

    #[test]
    fn test_relocated_leaves_original_alone() {
        let start = BoardState::starting();
        let mv = MoveRequest::new(sq("e2"), sq("e4"));
        let next = start.relocated(&mv);
        assert_eq!(start.piece_at(sq("e2")).map(|p| p.kind), Some(PieceKind::Pawn));
        assert_eq!(next.piece_at(sq("e2")), None);
        assert_eq!(next.piece_at(sq("e4")).map(|p| p.kind), Some(PieceKind::Pawn));
        assert_eq!(next.turn(), Color::White);

        let promoted = BoardState::from_fen("8/P7/8/8/8/8/8/8")
            .unwrap()
            .relocated(&MoveRequest::new(sq("a7"), sq("a8")).with_promotion(Some(PieceKind::Knight)));
        assert_eq!(
            promoted.piece_at(sq("a8")),
            Some(Piece::new(PieceKind::Knight, Color::White))
        );

        let empty_source = start.relocated(&MoveRequest::new(sq("e4"), sq("e5")));
        assert_eq!(empty_source, start);
    }

    #[test]
    fn test_advanced_counters() {
        let state = BoardState::from_fen("8/8/8/8/8/8/8/8 b - e3 4 9").unwrap();
        let next = state.advanced(false);
        assert_eq!(next.turn(), Color::White);
        assert_eq!(next.halfmove_clock(), 5);
        assert_eq!(next.fullmove_number(), 10);
        assert_eq!(next.en_passant(), "-");
        assert_eq!(next.advanced(true).halfmove_clock(), 0);
        assert_eq!(next.advanced(true).fullmove_number(), 10);
    }
}
