use board::{BoardState, Color, PieceKind, Square};

/// Whether the piece on `from` can reach `to` by its movement pattern
///
/// Sliding pieces must have a clear path, and pawns only move diagonally to capture an enemy
/// piece and only straight ahead onto empty squares. Nothing else about the target is checked,
/// so capturing one's own pieces has to be ruled out by the caller.
///
/// ```
/// # use board::BoardState;
/// let state = BoardState::starting();
/// let sq = |name: &str| name.parse().unwrap();
/// assert!(sandbox::reaches(&state, sq("g1"), sq("f3")));
/// assert!(sandbox::reaches(&state, sq("e2"), sq("e4")));
/// assert!(!sandbox::reaches(&state, sq("f1"), sq("c4")));
/// ```
pub fn reaches(state: &BoardState, from: Square, to: Square) -> bool {
    let Some(piece) = state.piece_at(from) else {
        return false;
    };
    if from == to || !state.contains(to) {
        return false;
    }
    let files = i16::from(to.file) - i16::from(from.file);
    let ranks = i16::from(to.rank) - i16::from(from.rank);
    match piece.kind {
        PieceKind::Pawn => {
            let (forward, home_rank) = match piece.color {
                Color::White => (1, 1),
                Color::Black => (-1, i16::from(state.dimensions().ranks) - 2),
            };
            let target = state.piece_at(to);
            if files.abs() == 1 && ranks == forward {
                target.is_some_and(|target| target.color != piece.color)
            } else if files == 0 && ranks == forward {
                target.is_none()
            } else if files == 0 && ranks == 2 * forward && i16::from(from.rank) == home_rank {
                target.is_none() && clear_path(state, from, to)
            } else {
                false
            }
        }
        PieceKind::Knight => {
            files.abs() == 2 && ranks.abs() == 1 || files.abs() == 1 && ranks.abs() == 2
        }
        PieceKind::King => files.abs() <= 1 && ranks.abs() <= 1,
        PieceKind::Rook => (files == 0 || ranks == 0) && clear_path(state, from, to),
        PieceKind::Bishop => files.abs() == ranks.abs() && clear_path(state, from, to),
        PieceKind::Queen => {
            (files == 0 || ranks == 0 || files.abs() == ranks.abs())
                && clear_path(state, from, to)
        }
    }
}

/// Whether every square strictly between two squares on a line is empty
fn clear_path(state: &BoardState, from: Square, to: Square) -> bool {
    let file_step = (i16::from(to.file) - i16::from(from.file)).signum() as i8;
    let rank_step = (i16::from(to.rank) - i16::from(from.rank)).signum() as i8;
    let mut current = from;
    loop {
        current = match current.offset(file_step, rank_step) {
            Some(next) => next,
            None => return false,
        };
        if current == to {
            return true;
        }
        if !state.contains(current) || state.piece_at(current).is_some() {
            return false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use board::{Dimensions, Piece};
    use quickcheck::quickcheck;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn test_sliding_pieces_are_blocked() {
        let state = BoardState::from_fen("8/8/8/3p4/8/8/8/R2Q3B w - - 0 1").unwrap();
        assert!(reaches(&state, sq("a1"), sq("c1")));
        assert!(!reaches(&state, sq("a1"), sq("h1")));
        assert!(reaches(&state, sq("d1"), sq("d5")));
        assert!(!reaches(&state, sq("d1"), sq("d6")));
        assert!(reaches(&state, sq("h1"), sq("d5")));
        assert!(!reaches(&state, sq("h1"), sq("c6")));
    }

    #[test]
    fn test_pawns() {
        let state = BoardState::from_fen("8/3p4/8/8/8/2n5/3P4/8 w - - 0 1").unwrap();
        assert!(reaches(&state, sq("d2"), sq("c3")));
        assert!(!reaches(&state, sq("d2"), sq("e3")));
        assert!(reaches(&state, sq("d2"), sq("d4")));
        assert!(!reaches(&state, sq("d2"), sq("d1")));
        assert!(reaches(&state, sq("d7"), sq("d5")));
        assert!(!reaches(&state, sq("d7"), sq("d4")));
    }

    #[test]
    fn test_black_home_rank_on_tall_board() {
        let dims = Dimensions::new(8, 10);
        let state =
            BoardState::from_fen_sized("8/4p3/8/8/8/8/8/8/8/8 b - - 0 1", dims).unwrap();
        assert_eq!(
            state.piece_at(sq("e9")),
            Some(Piece::new(PieceKind::Pawn, Color::Black))
        );
        assert!(reaches(&state, sq("e9"), sq("e7")));
    }

    quickcheck! {
        fn prop_knight_moves_ignore_blockers(file: u8, rank: u8) -> bool {
            // A knight boxed in by pawns still jumps out
            let state = BoardState::from_fen("8/8/8/2PPP3/2PNP3/2PPP3/8/8 w - - 0 1").unwrap();
            let target = Square::new(file % 8, rank % 8);
            let d4 = sq("d4");
            let files = (i16::from(target.file) - 3).abs();
            let ranks = (i16::from(target.rank) - 3).abs();
            let expected = files == 1 && ranks == 2 || files == 2 && ranks == 1;
            reaches(&state, d4, target) == expected
        }
    }
}
