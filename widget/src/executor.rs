//! Deciding what becomes of a move the player asked for
//!
//! A move for the side to move is handed to the rules engine. A move for the other side is a
//! premove and goes into that side's queue. Either way, a pawn reaching the last rank without
//! a promotion piece first has to wait for the player to pick one.

use board::{IllegalMove, MoveDetails, MoveRequest, PieceKind, RulesAdapter, Square};

use crate::board::Board;
use crate::events::Event;
use crate::premove::Premove;
use crate::promotion::PromotionMode;
use crate::render::Renderer;

/// What became of a move submitted to the board
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The move was made
    Moved,
    /// The move was queued as a premove
    Premoved,
    /// The move waits on the promotion request with this token
    PromotionPending(u64),
    /// The piece was put back on its own square
    NoOp,
    Rejected(Rejection),
}
impl MoveOutcome {
    /// Whether the board took the move, even if only to wait on it
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

/// Why the board turned a move down
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("there is no piece to move")]
    NoPiece,
    #[error("another promotion is waiting for a choice")]
    PromotionPending,
    #[error("premoves are switched off")]
    PremovesDisabled,
    #[error("{0}")]
    Illegal(String),
}

impl<R: RulesAdapter, V: Renderer> Board<R, V> {
    /// Try to move the piece on `from` to `to`
    ///
    /// Returns false if the board refused the move outright; see [`Board::submit_move`] for the
    /// details of what happened.
    pub fn attempt_move(&mut self, from: Square, to: Square, promotion: Option<PieceKind>) -> bool {
        self.submit_move(MoveRequest::new(from, to).with_promotion(promotion))
            .is_accepted()
    }

    /// Read a move in coordinate notation (`e2e4`, `e7e8q`) and submit it
    ///
    /// Returns `None` if the text isn't a move.
    pub fn submit_notation(&mut self, notation: &str) -> Option<MoveOutcome> {
        let request = notation.trim().parse::<MoveRequest>().ok()?;
        Some(self.submit_move(request))
    }

    /// Submit a move on behalf of the player
    pub fn submit_move(&mut self, request: MoveRequest) -> MoveOutcome {
        let MoveRequest {
            from,
            to,
            promotion,
        } = request;

        if let Some(pending) = self.promotion.pending() {
            if pending.mode == PromotionMode::Move {
                if (pending.from, pending.to) == (from, to) {
                    return MoveOutcome::PromotionPending(pending.token);
                }
                log::debug!("refusing {request} while promotion {} is open", pending.token);
                return MoveOutcome::Rejected(Rejection::PromotionPending);
            }
        }

        let Some(piece) = self.piece_for(from) else {
            return MoveOutcome::Rejected(Rejection::NoPiece);
        };

        if from == to {
            self.core.selection = None;
            self.redraw();
            return MoveOutcome::NoOp;
        }

        if piece.color != self.core.state.turn() {
            if !self.core.config.allow_premoves || !self.premoves.is_enabled(piece.color) {
                return MoveOutcome::Rejected(Rejection::PremovesDisabled);
            }
            if promotion.is_none() && self.needs_promotion(piece, to) {
                if self.core.config.promotion.auto_queen {
                    return self.queue_premove(piece.color, request.with_promotion(Some(PieceKind::Queen)));
                }
                return self.begin_promotion(from, to, piece.color, PromotionMode::Premove);
            }
            return self.queue_premove(piece.color, request);
        }

        if promotion.is_none() && self.needs_promotion(piece, to) {
            if self.core.config.promotion.auto_queen {
                return self.execute(request.with_promotion(Some(PieceKind::Queen)));
            }
            return self.begin_promotion(from, to, piece.color, PromotionMode::Move);
        }

        self.execute(request)
    }

    /// Make a move which didn't come from the player, such as the opponent's reply
    ///
    /// The move goes straight to the rules engine, with no premove or promotion handling, and
    /// is otherwise treated like any other move.
    pub fn play_move(&mut self, request: MoveRequest) -> Result<MoveDetails, IllegalMove> {
        let result = match self.core.rules.make_move(request) {
            Ok(details) => self
                .core
                .commit(details.clone())
                .map(|()| details)
                .map_err(IllegalMove::new),
            Err(illegal) => Err(illegal),
        };
        if let Err(illegal) = &result {
            self.core.emit(Event::Illegal {
                from: request.from,
                to: request.to,
                reason: illegal.reason.clone(),
            });
        }
        self.redraw();
        result
    }

    /// Replace the position
    ///
    /// Any transition and any pending promotion are abandoned. Queued premoves are kept, and get
    /// checked against the new position shortly.
    pub fn set_fen(&mut self, fen: &str) -> crate::Result<()> {
        let mut state = self.core.parse(fen)?;
        self.core.rules.set_fen(fen)?;
        match self.core.parse(&self.core.rules.fen()) {
            Ok(normalized) => state = normalized,
            Err(err) => log::warn!("rules engine reports a position it cannot read back: {err}"),
        }
        self.core.animation.cancel();
        self.abandon_promotion();
        self.core.state = state;
        self.core.selection = None;
        self.core.drag = None;
        self.core.last_move = None;
        self.core.emit(Event::Update {
            fen: self.core.state.to_fen(),
        });
        self.core
            .schedule_replay(self.core.config.premove.replay_buffer());
        self.redraw();
        Ok(())
    }

    /// Take back the last move, returning whether there was one to take back
    ///
    /// Premoves rarely survive a takeback intact, so both queues are emptied.
    pub fn undo(&mut self) -> bool {
        if !self.core.rules.undo() {
            return false;
        }
        let state = match self.core.parse(&self.core.rules.fen()) {
            Ok(state) => state,
            Err(err) => {
                log::error!("rules engine reports an unreadable position after undo: {err}");
                return false;
            }
        };
        self.abandon_promotion();
        self.premoves.clear_all();
        self.core
            .scheduler
            .retain(|task| !matches!(task, crate::board::Task::ApplyPremove { .. }));
        let previous = core::mem::replace(&mut self.core.state, state);
        self.core.selection = None;
        self.core.last_move = self
            .core
            .rules
            .history()
            .last()
            .map(|details| (details.from, details.to));
        let now = self.core.now;
        self.core
            .animation
            .animate_to(&self.core.state, &previous, now);
        self.core.emit(Event::Update {
            fen: self.core.state.to_fen(),
        });
        self.redraw();
        true
    }

    /// Finish the promotion with the given token by promoting into `piece`
    ///
    /// Returns false, changing nothing, if the token isn't the one of the pending request or the
    /// piece isn't one a pawn can become.
    pub fn resolve_promotion(&mut self, token: u64, piece: PieceKind) -> bool {
        self.complete_promotion(token, piece).is_some()
    }

    /// Abandon the promotion with the given token
    ///
    /// Returns false if the token isn't the one of the pending request.
    pub fn cancel_promotion(&mut self, token: u64) -> bool {
        let Some(request) = self.promotion.take_current(token) else {
            return false;
        };
        self.core.emit(Event::PromotionCancelled(request));
        self.redraw();
        true
    }

    fn complete_promotion(&mut self, token: u64, piece: PieceKind) -> Option<MoveOutcome> {
        if !piece.is_promotable() {
            log::debug!("cannot promote into {piece:?}");
            return None;
        }
        let request = self.promotion.take_current(token)?;
        let mv = MoveRequest::new(request.from, request.to).with_promotion(Some(piece));
        Some(match request.mode {
            PromotionMode::Move => self.execute(mv),
            PromotionMode::Premove => self.queue_premove(request.color, mv),
        })
    }

    /// Open a promotion request, letting the handler answer it if there is one
    fn begin_promotion(
        &mut self,
        from: Square,
        to: Square,
        color: board::Color,
        mode: PromotionMode,
    ) -> MoveOutcome {
        let (request, superseded) = self.promotion.begin(from, to, color, mode);
        if let Some(superseded) = superseded {
            self.core.emit(Event::PromotionCancelled(superseded));
        }
        log::debug!("promotion {} opened for {from}{to} ({mode:?})", request.token);
        self.core.selection = None;
        self.core.emit(Event::Promotion(request));
        let choice = self
            .promotion_handler
            .as_mut()
            .and_then(|handler| handler(&request));
        if let Some(outcome) = choice.and_then(|piece| self.complete_promotion(request.token, piece)) {
            return outcome;
        }
        self.redraw();
        MoveOutcome::PromotionPending(request.token)
    }

    /// Add a premove to its side's queue
    pub(crate) fn queue_premove(&mut self, color: board::Color, premove: Premove) -> MoveOutcome {
        if let Some(off) = [premove.from, premove.to]
            .into_iter()
            .find(|&square| !self.core.state.contains(square))
        {
            return self.refuse(premove, format!("{off} is off the board"));
        }
        if !self.core.config.allow_premoves || !self.premoves.enqueue(color, premove) {
            return MoveOutcome::Rejected(Rejection::PremovesDisabled);
        }
        let queued = self.premoves.queue(color).len();
        log::debug!("{color} premoved {premove} ({queued} queued)");
        self.core.emit(Event::PremoveQueued {
            color,
            premove,
            queued,
        });
        self.core.selection = None;
        // The side may have come to move while the premove was being made
        self.premoves.replay_if_valid(color, &mut self.core);
        self.redraw();
        MoveOutcome::Premoved
    }

    /// Hand a move to the rules engine and take on the result
    fn execute(&mut self, request: MoveRequest) -> MoveOutcome {
        let result = self
            .core
            .rules
            .make_move(request)
            .map_err(|illegal| illegal.reason)
            .and_then(|details| self.core.commit(details));
        match result {
            Ok(()) => {
                self.redraw();
                MoveOutcome::Moved
            }
            Err(reason) => self.refuse(request, reason),
        }
    }

    fn refuse(&mut self, request: MoveRequest, reason: String) -> MoveOutcome {
        log::debug!("{request} refused: {reason}");
        self.core.emit(Event::Illegal {
            from: request.from,
            to: request.to,
            reason: reason.clone(),
        });
        self.redraw();
        MoveOutcome::Rejected(Rejection::Illegal(reason))
    }
}
