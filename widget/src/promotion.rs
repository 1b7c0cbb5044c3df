//! Waiting for the player to pick what a pawn promotes into
//!
//! At most one request is open at a time. Each request carries a token, and only the request
//! holding the latest token can be resolved or cancelled; anything older is a leftover (a
//! dialog for a move that was superseded, say) and is quietly ignored.

use board::{Color, PieceKind, RulesAdapter, Square};

use crate::board::Board;
use crate::render::Renderer;

/// What happens once the promotion piece is known
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromotionMode {
    /// Play the move right away
    Move,
    /// Queue the move as a premove
    Premove,
}

/// A promotion choice the host needs to make
///
/// The request is a handle: keep it around while the choice is being made, then hand it back
/// with [`PromotionRequest::resolve`] or [`PromotionRequest::cancel`]. A request which has been
/// superseded does nothing when used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PromotionRequest {
    pub token: u64,
    pub from: Square,
    pub to: Square,
    pub color: Color,
    pub mode: PromotionMode,
}

impl PromotionRequest {
    /// Finish the move by promoting into `piece`
    ///
    /// Returns false if the request is stale or the piece can't be promoted into.
    pub fn resolve<R: RulesAdapter, V: Renderer>(
        self,
        board: &mut Board<R, V>,
        piece: PieceKind,
    ) -> bool {
        board.resolve_promotion(self.token, piece)
    }

    /// Give up on the move
    ///
    /// Returns false if the request is stale.
    pub fn cancel<R: RulesAdapter, V: Renderer>(self, board: &mut Board<R, V>) -> bool {
        board.cancel_promotion(self.token)
    }
}

/// Decides on a promotion piece when a request opens
///
/// Returning `Some` resolves the request on the spot. Returning `None` leaves it open for the
/// host to resolve later.
pub type PromotionHandler = Box<dyn FnMut(&PromotionRequest) -> Option<PieceKind>>;

/// Tracks the one open promotion request
#[derive(Debug, Default)]
pub struct PromotionCoordinator {
    last_token: u64,
    pending: Option<PromotionRequest>,
}

impl PromotionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new request, handing back the new request and the one it superseded
    pub fn begin(
        &mut self,
        from: Square,
        to: Square,
        color: Color,
        mode: PromotionMode,
    ) -> (PromotionRequest, Option<PromotionRequest>) {
        let superseded = self.pending.take();
        self.last_token += 1;
        let request = PromotionRequest {
            token: self.last_token,
            from,
            to,
            color,
            mode,
        };
        if let Some(old) = &superseded {
            log::debug!("promotion {} superseded by {}", old.token, request.token);
        }
        self.pending = Some(request);
        (request, superseded)
    }

    /// Close the request with the given token, if it's the open one
    pub fn take_current(&mut self, token: u64) -> Option<PromotionRequest> {
        match self.pending {
            Some(request) if request.token == token => self.pending.take(),
            _ => {
                log::debug!("ignoring stale promotion token {token}");
                None
            }
        }
    }

    /// Close whatever request is open
    pub fn clear(&mut self) -> Option<PromotionRequest> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<&PromotionRequest> {
        self.pending.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The most recently issued token
    pub fn last_token(&self) -> u64 {
        self.last_token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn test_new_request_supersedes() {
        let mut coordinator = PromotionCoordinator::new();
        let (first, superseded) =
            coordinator.begin(sq("a7"), sq("a8"), Color::White, PromotionMode::Move);
        assert_eq!(superseded, None);
        let (second, superseded) =
            coordinator.begin(sq("c7"), sq("c8"), Color::White, PromotionMode::Premove);
        assert_eq!(superseded, Some(first));
        assert!(second.token > first.token);
        assert_eq!(coordinator.take_current(first.token), None);
        assert!(coordinator.is_pending());
        assert_eq!(coordinator.take_current(second.token), Some(second));
        assert!(!coordinator.is_pending());
    }

    #[test]
    fn test_tokens_never_repeat() {
        let mut coordinator = PromotionCoordinator::new();
        let (first, _) = coordinator.begin(sq("a7"), sq("a8"), Color::White, PromotionMode::Move);
        coordinator.clear();
        let (second, _) = coordinator.begin(sq("a7"), sq("a8"), Color::White, PromotionMode::Move);
        assert_ne!(first.token, second.token);
        assert_eq!(coordinator.take_current(first.token), None);
        assert_eq!(coordinator.last_token(), second.token);
    }
}
