use core::{fmt, str::FromStr};

mod rules;
mod state;

pub use crate::rules::{IllegalMove, MoveDetails, RulesAdapter, RulesError};
pub use crate::state::{BoardState, FenError, STARTING_FEN};

/// The types of pieces there are
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PieceKind {
    Pawn,
    Rook,
    Knight,
    Bishop,
    Queen,
    King,
}
impl PieceKind {
    /// The kinds a pawn may promote into, most valuable first
    pub const PROMOTIONS: [PieceKind; 4] = [Self::Queen, Self::Rook, Self::Bishop, Self::Knight];

    /// The capitalized version of the letter used for this piece in FEN
    pub const fn fen_letter(self) -> char {
        match self {
            Self::Pawn => 'P',
            Self::Rook => 'R',
            Self::Knight => 'N',
            Self::Bishop => 'B',
            Self::Queen => 'Q',
            Self::King => 'K',
        }
    }

    /// Parse the kind from its letter, in either case
    ///
    /// ```
    /// # use board::PieceKind;
    /// assert_eq!(PieceKind::from_letter('n'), Some(PieceKind::Knight));
    /// assert_eq!(PieceKind::from_letter('x'), None);
    /// ```
    pub const fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'P' => Some(Self::Pawn),
            'R' => Some(Self::Rook),
            'N' => Some(Self::Knight),
            'B' => Some(Self::Bishop),
            'Q' => Some(Self::Queen),
            'K' => Some(Self::King),
            _ => None,
        }
    }

    /// Whether a pawn can promote into this kind of piece
    pub const fn is_promotable(self) -> bool {
        match self {
            PieceKind::Pawn | PieceKind::King => false,
            PieceKind::Rook | PieceKind::Queen | PieceKind::Knight | PieceKind::Bishop => true,
        }
    }
}

/// The colors a piece can have
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Color {
    White,
    Black,
}
impl Color {
    pub const BOTH: [Color; 2] = [Color::White, Color::Black];

    pub const fn other(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub const fn is_black(self) -> bool {
        match self {
            Color::White => false,
            Color::Black => true,
        }
    }

    pub const fn is_white(self) -> bool {
        match self {
            Color::White => true,
            Color::Black => false,
        }
    }

    /// The letter used for this side in the side-to-move field of FEN
    pub const fn fen_letter(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }
}
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Color::White => "white",
            Color::Black => "black",
        })
    }
}

/// A piece
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}
impl Piece {
    pub const fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    pub const fn fen_letter(self) -> char {
        match self.color {
            Color::White => self.kind.fen_letter().to_ascii_uppercase(),
            Color::Black => self.kind.fen_letter().to_ascii_lowercase(),
        }
    }

    /// Read a piece from its FEN letter, where uppercase is white
    ///
    /// ```
    /// # use board::{Color, Piece, PieceKind};
    /// assert_eq!(Piece::from_fen_letter('q'), Some(Piece::new(PieceKind::Queen, Color::Black)));
    /// assert_eq!(Piece::from_fen_letter('R'), Some(Piece::new(PieceKind::Rook, Color::White)));
    /// ```
    pub const fn from_fen_letter(letter: char) -> Option<Self> {
        let color = if letter.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        match PieceKind::from_letter(letter) {
            Some(kind) => Some(Self { kind, color }),
            None => None,
        }
    }
}

/// The possible outcomes of a game
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GameOutcome {
    /// White checkmated black
    WhiteCheckmate,
    /// Black checkmated white
    BlackCheckmate,
    /// Draw because one player couldn't make any moves
    Draw,
}
impl GameOutcome {
    /// The outcome where `winner` has checkmated the other side
    pub const fn checkmate_by(winner: Color) -> Self {
        match winner {
            Color::White => Self::WhiteCheckmate,
            Color::Black => Self::BlackCheckmate,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CheckStatus {
    None,
    Check,
    Checkmate,
}
/// Returns the status as appended to a move in algebraic notation
impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "",
            Self::Check => "+",
            Self::Checkmate => "#",
        })
    }
}

/// How many files and ranks a board has
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dimensions {
    pub files: u8,
    pub ranks: u8,
}
impl Dimensions {
    /// The traditional 8x8 board
    pub const STANDARD: Self = Self { files: 8, ranks: 8 };

    /// The number of files that can be named with a single letter
    pub const MAX_FILES: u8 = 26;

    pub const fn new(files: u8, ranks: u8) -> Self {
        Self { files, ranks }
    }

    /// The number of cells on the board
    pub const fn area(self) -> usize {
        self.files as usize * self.ranks as usize
    }

    /// Whether the square lies on a board of this size
    pub const fn contains(self, square: Square) -> bool {
        square.file < self.files && square.rank < self.ranks
    }

    /// The rank on which pawns of the given color promote
    pub const fn promotion_rank(self, color: Color) -> u8 {
        match color {
            Color::White => self.ranks.saturating_sub(1),
            Color::Black => 0,
        }
    }
}
impl Default for Dimensions {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// A square on the board, as zero-based file and rank
///
/// Squares are named in coordinate notation: a file letter followed by the 1-based rank, so
/// `e4` is file 4 and rank 3. Boards may be wider or taller than 8, which only requires the rank
/// to take more digits (`b10`) and the file to use more of the alphabet.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Square {
    pub file: u8,
    pub rank: u8,
}
impl Square {
    pub const fn new(file: u8, rank: u8) -> Self {
        Self { file, rank }
    }

    /// The letter naming this square's file
    pub const fn file_letter(self) -> char {
        (b'a' + self.file) as char
    }

    /// Offset by the given number of files and ranks, returning `None` off the low edges
    ///
    /// Whether the result is on a given board is left to [`Dimensions::contains`].
    ///
    /// ```
    /// # use board::Square;
    /// let e4: Square = "e4".parse().unwrap();
    /// assert_eq!(e4.offset(1, 2), Some("f6".parse().unwrap()));
    /// assert_eq!(Square::new(0, 0).offset(-1, 0), None);
    /// ```
    pub fn offset(self, files: i8, ranks: i8) -> Option<Self> {
        let file = u8::try_from(i16::from(self.file) + i16::from(files)).ok()?;
        let rank = u8::try_from(i16::from(self.rank) + i16::from(ranks)).ok()?;
        Some(Self { file, rank })
    }
}
impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Square({self})")
    }
}
impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_letter(), u16::from(self.rank) + 1)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("board position string was invalid")]
pub struct SquareParseError;

impl FromStr for Square {
    type Err = SquareParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let file = match chars.next() {
            Some(c @ 'a'..='z') => c as u8 - b'a',
            _ => return Err(SquareParseError),
        };
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SquareParseError);
        }
        let rank: u16 = digits.parse().map_err(|_| SquareParseError)?;
        if rank == 0 || rank > u16::from(u8::MAX) {
            return Err(SquareParseError);
        }
        Ok(Self {
            file,
            rank: (rank - 1) as u8,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MoveParseError {
    #[error("move notation must name a source and a target square")]
    Malformed,
    #[error("invalid square in move: {0}")]
    Square(#[from] SquareParseError),
    #[error("invalid promotion piece '{0}'")]
    Promotion(char),
}

/// A move as the user expressed it: where from, where to, and what to promote into
///
/// This is also the representation of a premove while it waits in its queue. It is written in
/// long algebraic notation, like `e2e4` or `e7e8q`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveRequest {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}
impl MoveRequest {
    pub const fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub const fn with_promotion(self, promotion: Option<PieceKind>) -> Self {
        Self { promotion, ..self }
    }
}
impl fmt::Debug for MoveRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MoveRequest({self})")
    }
}
impl fmt::Display for MoveRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.fen_letter().to_ascii_lowercase())?;
        }
        Ok(())
    }
}
impl FromStr for MoveRequest {
    type Err = MoveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.is_ascii() {
            return Err(MoveParseError::Malformed);
        }
        // The target square starts at the second letter
        let split = s
            .char_indices()
            .skip(1)
            .find(|(_, c)| c.is_ascii_lowercase())
            .map(|(idx, _)| idx)
            .ok_or(MoveParseError::Malformed)?;
        let (from, rest) = s.split_at(split);
        let (to, promotion) = match rest.char_indices().skip(1).find(|(_, c)| c.is_ascii_alphabetic()) {
            Some((idx, _)) => (&rest[..idx], Some(&rest[idx..])),
            None => (rest, None),
        };
        let promotion = match promotion {
            None => None,
            Some(letter) => {
                let mut chars = letter.chars();
                let (Some(c), None) = (chars.next(), chars.next()) else {
                    return Err(MoveParseError::Malformed);
                };
                match PieceKind::from_letter(c) {
                    Some(kind) if kind.is_promotable() => Some(kind),
                    _ => return Err(MoveParseError::Promotion(c)),
                }
            }
        };
        Ok(Self {
            from: from.parse()?,
            to: to.parse()?,
            promotion,
        })
    }
}

#[cfg(feature = "serde")]
mod serde_impls {
    //! Squares and moves serialize through their notation

    use super::{MoveRequest, Square};
    use core::str::FromStr;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Square {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for Square {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let s = String::deserialize(deserializer)?;
            Square::from_str(&s).map_err(de::Error::custom)
        }
    }

    impl Serialize for MoveRequest {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for MoveRequest {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let s = String::deserialize(deserializer)?;
            MoveRequest::from_str(&s).map_err(de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;

    #[test]
    fn test_square_names() {
        assert_eq!(Square::from_str("a1").unwrap(), Square::new(0, 0));
        assert_eq!(Square::from_str("h8").unwrap(), Square::new(7, 7));
        assert_eq!(Square::from_str("b10").unwrap(), Square::new(1, 9));
        assert_eq!(Square::new(4, 3).to_string(), "e4");
        for bad in ["", "a", "a0", "1a", "A1", "e-1", "e4 ", "z256"] {
            assert!(Square::from_str(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_move_request_notation() {
        let mv = MoveRequest::from_str("e7e8q").unwrap();
        assert_eq!(mv.from, Square::new(4, 6));
        assert_eq!(mv.to, Square::new(4, 7));
        assert_eq!(mv.promotion, Some(PieceKind::Queen));
        assert_eq!(mv.to_string(), "e7e8q");

        let wide = MoveRequest::from_str("a10b10").unwrap();
        assert_eq!(wide.from, Square::new(0, 9));
        assert_eq!(wide.to, Square::new(1, 9));
        assert_eq!(wide.promotion, None);

        assert!(matches!(
            MoveRequest::from_str("e7e8k"),
            Err(MoveParseError::Promotion('k'))
        ));
        assert!(MoveRequest::from_str("e2").is_err());
        assert!(MoveRequest::from_str("hello").is_err());
    }

    #[test]
    fn test_promotion_rank() {
        assert_eq!(Dimensions::STANDARD.promotion_rank(Color::White), 7);
        assert_eq!(Dimensions::STANDARD.promotion_rank(Color::Black), 0);
        assert_eq!(Dimensions::new(10, 10).promotion_rank(Color::White), 9);
    }

    quickcheck! {
        fn prop_square_display_parses_back(file: u8, rank: u8) -> bool {
            let square = Square::new(file % Dimensions::MAX_FILES, rank);
            Square::from_str(&square.to_string()).ok() == Some(square)
        }
    }
}
