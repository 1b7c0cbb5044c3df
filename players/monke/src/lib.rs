//! A player which makes purely random moves

use board::{BoardState, MoveRequest, RulesAdapter};

use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};

/// A player which makes purely random moves
///
/// The name is pronounced like "Monkey"
#[derive(Debug)]
pub struct MonkePlayer {
    /// How we decide what to do
    rng: SmallRng,
}

impl MonkePlayer {
    /// Create a new player
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Create a player which makes the same choices every time
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl players::Player for MonkePlayer {
    fn choose_move(&mut self, state: &BoardState, rules: &dyn RulesAdapter) -> Option<MoveRequest> {
        let moves: Vec<MoveRequest> = state
            .pieces()
            .filter(|(_, piece)| piece.color == state.turn())
            .flat_map(|(square, _)| rules.moves_from(square))
            .collect();
        moves.choose(&mut self.rng).copied()
    }
}

impl Default for MonkePlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use players::Player;
    use sandbox::SandboxRules;

    #[test]
    fn test_moves_are_legal() {
        let mut rules = SandboxRules::new();
        let mut player = MonkePlayer::seeded(7);
        for _ in 0..40 {
            let state = rules.state().clone();
            let Some(mv) = player.choose_move(&state, &rules) else {
                break;
            };
            assert!(rules.is_legal(&mv), "{mv} in {state}");
            rules.make_move(mv).unwrap();
        }
    }

    #[test]
    fn test_no_moves() {
        let rules = SandboxRules::from_fen("8/8/8/8/8/8/8/8 w - - 0 1").unwrap();
        let state = rules.state().clone();
        assert_eq!(MonkePlayer::seeded(1).choose_move(&state, &rules), None);
    }
}
