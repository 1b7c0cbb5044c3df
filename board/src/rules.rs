//! The seam between the board and whatever knows the rules of the game

use crate::{CheckStatus, FenError, MoveRequest, Piece, PieceKind, Square};

/// Why a rules engine refused a move
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct IllegalMove {
    pub reason: String,
}
impl IllegalMove {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RulesError {
    #[error("position could not be read: {0}")]
    InvalidFen(#[from] FenError),
    #[error("position rejected by rules engine: {0}")]
    Rejected(String),
}

/// Everything a rules engine knows about a move it just made
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveDetails {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
    /// The piece that moved, as it was before any promotion
    pub piece: Piece,
    pub captured: Option<Piece>,
    /// Whether the move leaves the opponent in check(mate)
    pub check: CheckStatus,
    /// The move in standard algebraic notation
    pub san: String,
    /// The position after the move
    pub fen: String,
}
impl MoveDetails {
    /// The request which would reproduce this move
    pub const fn request(&self) -> MoveRequest {
        MoveRequest {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        }
    }
}

/// Functionality belonging to all rules engines a board can be played with
///
/// The board never inspects the rules of the game itself. It asks the adapter, which owns its
/// own copy of the position, whether a move is legal and what the position is afterwards.
pub trait RulesAdapter {
    /// Convert the current position to a FEN string
    fn fen(&self) -> String;

    /// Replace the current position
    fn set_fen(&mut self, fen: &str) -> Result<(), RulesError>;

    /// Make the given move, in place
    ///
    /// Returns the details of the move if it is legal, or the reason it isn't. An illegal move
    /// leaves the position unchanged.
    fn make_move(&mut self, mv: MoveRequest) -> Result<MoveDetails, IllegalMove>;

    /// All legal moves starting on the given square
    ///
    /// Pawn moves onto the last rank are listed once per promotion choice.
    fn moves_from(&self, square: Square) -> Vec<MoveRequest>;

    /// Take back the last move, returning whether there was one to take back
    fn undo(&mut self) -> bool;

    /// Check a move without making it
    fn is_legal(&self, mv: &MoveRequest) -> bool {
        self.moves_from(mv.from).contains(mv)
    }

    /// Returns if the side to move is currently in check
    fn in_check(&self) -> bool {
        false
    }

    fn is_checkmate(&self) -> bool {
        false
    }

    fn is_stalemate(&self) -> bool {
        false
    }

    /// The moves made so far, oldest first
    fn history(&self) -> Vec<MoveDetails> {
        Vec::new()
    }
}
