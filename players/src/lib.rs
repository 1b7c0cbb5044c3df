//! Traits for an automatic opponent

use board::{BoardState, MoveRequest, RulesAdapter};

/// A player in a game
///
/// This trait is generic over how the player decides what to do, so anything from a random mover
/// to a real engine can sit across the board from a human.
pub trait Player {
    /// Decide on a move to make in the given position
    ///
    /// `rules` is in the same position as `state` and can be asked which moves are legal. The
    /// player doesn't make the move itself; returning `None` means it has no move to make.
    fn choose_move(&mut self, state: &BoardState, rules: &dyn RulesAdapter) -> Option<MoveRequest>;
}

impl<P: Player + ?Sized> Player for Box<P> {
    fn choose_move(&mut self, state: &BoardState, rules: &dyn RulesAdapter) -> Option<MoveRequest> {
        (**self).choose_move(state, rules)
    }
}
