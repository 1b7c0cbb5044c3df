//! A permissive rules engine for boards of any size
//!
//! Pieces move in their usual patterns and can't jump over each other (except knights), but
//! there's no castling, no en passant and no check detection beyond reporting it. A side which
//! has had its king captured is checkmated. It's meant for demos, analysis boards and tests,
//! where something needs to answer "is this a move" without a full rules implementation.

use board::{
    BoardState, CheckStatus, Color, Dimensions, FenError, IllegalMove, MoveDetails, MoveRequest,
    Piece, PieceKind, RulesAdapter, RulesError, Square,
};

mod movement;

pub use crate::movement::reaches;

/// Rules which accept any move matching the moving piece's pattern
#[derive(Clone, Debug)]
pub struct SandboxRules {
    state: BoardState,
    /// The positions before each move, alongside the move
    history: Vec<(BoardState, MoveDetails)>,
}

impl SandboxRules {
    /// Play from the standard starting position
    pub fn new() -> Self {
        Self::with_state(BoardState::starting())
    }

    /// Play from an 8x8 position given in FEN
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        BoardState::from_fen(fen).map(Self::with_state)
    }

    /// Play from a position of any size given in FEN
    pub fn from_fen_sized(fen: &str, dimensions: Dimensions) -> Result<Self, FenError> {
        BoardState::from_fen_sized(fen, dimensions).map(Self::with_state)
    }

    pub fn with_state(state: BoardState) -> Self {
        Self {
            state,
            history: Vec::new(),
        }
    }

    /// The current position
    pub fn state(&self) -> &BoardState {
        &self.state
    }

    /// Decide whether the move could be made, and what it would capture
    fn check(&self, mv: &MoveRequest) -> Result<(Piece, Option<Piece>), IllegalMove> {
        let state = &self.state;
        let Some(piece) = state.piece_at(mv.from) else {
            return Err(IllegalMove::new(format!("no piece on {}", mv.from)));
        };
        if piece.color != state.turn() {
            return Err(IllegalMove::new(format!("it is {}'s turn", state.turn())));
        }
        if !state.contains(mv.to) {
            return Err(IllegalMove::new(format!("{} is not on the board", mv.to)));
        }
        if mv.from == mv.to {
            return Err(IllegalMove::new("a piece must leave its square"));
        }
        let captured = state.piece_at(mv.to);
        if captured.is_some_and(|target| target.color == piece.color) {
            return Err(IllegalMove::new(format!(
                "{} is occupied by a {} piece",
                mv.to, piece.color
            )));
        }
        if !movement::reaches(state, mv.from, mv.to) {
            return Err(IllegalMove::new(format!(
                "{:?} cannot move from {} to {}",
                piece.kind, mv.from, mv.to
            )));
        }
        let promotes = piece.kind == PieceKind::Pawn
            && mv.to.rank == state.dimensions().promotion_rank(piece.color);
        match (promotes, mv.promotion) {
            (true, None) => return Err(IllegalMove::new("a promotion piece is required")),
            (true, Some(kind)) if !kind.is_promotable() => {
                return Err(IllegalMove::new(format!("cannot promote into {kind:?}")));
            }
            (false, Some(_)) => {
                return Err(IllegalMove::new(
                    "only a pawn reaching the last rank can promote",
                ));
            }
            _ => {}
        }
        Ok((piece, captured))
    }

    /// Whether `color` attacks the other side's king in the given position
    fn gives_check(state: &BoardState, color: Color) -> bool {
        let Some(king) = state.king(color.other()) else {
            return false;
        };
        state
            .pieces()
            .filter(|(_, piece)| piece.color == color)
            .any(|(square, _)| movement::reaches(state, square, king))
    }

    /// Standard algebraic notation for the move, without disambiguation
    fn san(piece: Piece, mv: &MoveRequest, capture: bool, check: CheckStatus) -> String {
        let mut san = String::new();
        if piece.kind == PieceKind::Pawn {
            if capture {
                san.push(mv.from.file_letter());
            }
        } else {
            san.push(piece.kind.fen_letter());
        }
        if capture {
            san.push('x');
        }
        san.push_str(&mv.to.to_string());
        if let Some(kind) = mv.promotion {
            san.push('=');
            san.push(kind.fen_letter());
        }
        san.push_str(&check.to_string());
        san
    }
}

impl Default for SandboxRules {
    fn default() -> Self {
        Self::new()
    }
}

impl RulesAdapter for SandboxRules {
    fn fen(&self) -> String {
        self.state.to_fen()
    }

    fn set_fen(&mut self, fen: &str) -> Result<(), RulesError> {
        self.state = BoardState::from_fen_sized(fen, self.state.dimensions())?;
        self.history.clear();
        Ok(())
    }

    fn make_move(&mut self, mv: MoveRequest) -> Result<MoveDetails, IllegalMove> {
        let (piece, captured) = self.check(&mv)?;
        let next = self
            .state
            .relocated(&mv)
            .advanced(piece.kind == PieceKind::Pawn || captured.is_some());
        let check = if next.king(next.turn()).is_none() {
            CheckStatus::Checkmate
        } else if Self::gives_check(&next, piece.color) {
            CheckStatus::Check
        } else {
            CheckStatus::None
        };
        let details = MoveDetails {
            from: mv.from,
            to: mv.to,
            promotion: mv.promotion,
            piece,
            captured,
            check,
            san: Self::san(piece, &mv, captured.is_some(), check),
            fen: next.to_fen(),
        };
        log::trace!("sandbox move {} ({})", mv, details.san);
        let previous = core::mem::replace(&mut self.state, next);
        self.history.push((previous, details.clone()));
        Ok(details)
    }

    fn moves_from(&self, square: Square) -> Vec<MoveRequest> {
        let Some(piece) = self.state.piece_at(square) else {
            return Vec::new();
        };
        if piece.color != self.state.turn() {
            return Vec::new();
        }
        let promotion_rank = self.state.dimensions().promotion_rank(piece.color);
        let mut moves = Vec::new();
        for (target, _) in self.state.squares() {
            let mv = MoveRequest::new(square, target);
            if piece.kind == PieceKind::Pawn && target.rank == promotion_rank {
                for kind in PieceKind::PROMOTIONS {
                    let mv = mv.with_promotion(Some(kind));
                    if self.check(&mv).is_ok() {
                        moves.push(mv);
                    }
                }
            } else if self.check(&mv).is_ok() {
                moves.push(mv);
            }
        }
        moves
    }

    fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some((previous, _)) => {
                self.state = previous;
                true
            }
            None => false,
        }
    }

    fn is_legal(&self, mv: &MoveRequest) -> bool {
        self.check(mv).is_ok()
    }

    fn in_check(&self) -> bool {
        Self::gives_check(&self.state, self.state.turn().other())
    }

    fn is_checkmate(&self) -> bool {
        self.state.king(self.state.turn()).is_none()
    }

    fn is_stalemate(&self) -> bool {
        !self.is_checkmate()
            && self
                .state
                .pieces()
                .filter(|(_, piece)| piece.color == self.state.turn())
                .all(|(square, _)| self.moves_from(square).is_empty())
    }

    fn history(&self) -> Vec<MoveDetails> {
        self.history
            .iter()
            .map(|(_, details)| details.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(notation: &str) -> MoveRequest {
        notation.parse().unwrap()
    }

    #[test]
    fn test_opening_moves() {
        let mut rules = SandboxRules::new();
        let details = rules.make_move(mv("e2e4")).unwrap();
        assert_eq!(details.san, "e4");
        assert_eq!(
            details.fen,
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
        assert_eq!(rules.make_move(mv("g8f6")).unwrap().san, "Nf6");
        assert_eq!(rules.state().fullmove_number(), 2);
    }

    #[test]
    fn test_illegal_moves_leave_state() {
        let mut rules = SandboxRules::new();
        let before = rules.fen();
        for illegal in ["e7e5", "e2e5", "d1h5", "a1a2", "e3e4", "b1b3"] {
            assert!(rules.make_move(mv(illegal)).is_err(), "{illegal} was accepted");
        }
        assert_eq!(rules.fen(), before);
        assert!(rules.history().is_empty());
    }

    #[test]
    fn test_promotion_is_mandatory() {
        let mut rules = SandboxRules::from_fen("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        assert_eq!(
            rules.make_move(mv("a7a8")).unwrap_err().reason,
            "a promotion piece is required"
        );
        assert!(rules.make_move(mv("a1a2q")).is_err());
        let details = rules.make_move(mv("a7a8q")).unwrap();
        assert_eq!(details.san, "a8=Q+");
        assert_eq!(details.check, CheckStatus::Check);
        assert!(rules.in_check());
    }

    #[test]
    fn test_moves_from_lists_promotions() {
        let rules = SandboxRules::from_fen("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let moves = rules.moves_from("a7".parse().unwrap());
        assert_eq!(moves.len(), 4);
        assert!(moves.iter().all(|mv| mv.promotion.is_some()));
        assert!(rules.moves_from("h8".parse().unwrap()).is_empty());
    }

    #[test]
    fn test_capturing_the_king_ends_the_game() {
        let mut rules = SandboxRules::from_fen("k7/8/8/8/8/8/8/R6K w - - 0 1").unwrap();
        let details = rules.make_move(mv("a1a8")).unwrap();
        assert_eq!(details.check, CheckStatus::Checkmate);
        assert_eq!(details.san, "Rxa8#");
        assert!(rules.is_checkmate());
        assert!(!rules.is_stalemate());
    }

    #[test]
    fn test_undo() {
        let mut rules = SandboxRules::new();
        assert!(!rules.undo());
        rules.make_move(mv("e2e4")).unwrap();
        rules.make_move(mv("e7e5")).unwrap();
        assert_eq!(rules.history().len(), 2);
        assert!(rules.undo());
        assert_eq!(
            rules.fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
        assert_eq!(rules.history().len(), 1);
    }

    #[test]
    fn test_set_fen_keeps_dimensions() {
        let dims = Dimensions::new(10, 8);
        let mut rules =
            SandboxRules::from_fen_sized("10/10/10/10/10/10/10/K8k w - - 0 1", dims).unwrap();
        assert!(rules.set_fen("8/8/8/8/8/8/8/K6k w - - 0 1").is_err());
        rules.set_fen("k9/10/10/10/10/10/10/9K b - - 0 1").unwrap();
        assert_eq!(rules.state().dimensions(), dims);
        assert!(rules.make_move(mv("a8b8")).is_ok());
    }
}
