//! The board itself, and everything on it that isn't about making moves

use core::time::Duration;

use board::{
    BoardState, Color, GameOutcome, MoveDetails, Piece, PieceKind, RulesAdapter, Square,
};

use crate::animation::{AnimationEngine, AnimationPlan, Frame};
use crate::config::Config;
use crate::events::{Event, EventBus, Subscription};
use crate::executor::MoveOutcome;
use crate::geometry::{Geometry, Point};
use crate::premove::{Premove, PremoveHost, PremoveQueueManager};
use crate::promotion::{PromotionCoordinator, PromotionHandler, PromotionMode, PromotionRequest};
use crate::render::{Drag, Marks, Overlay, Renderer, Scene};
use crate::schedule::Scheduler;

/// Work the board has put off until a later tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Task {
    /// See whether the side to move has a premove to play
    Replay,
    /// Play a premove which was found to be playable
    ApplyPremove { color: Color, premove: Premove },
}

/// The parts of a board the premove queues get to work with
pub(crate) struct Core<R, V> {
    pub(crate) rules: R,
    pub(crate) renderer: V,
    pub(crate) config: Config,
    pub(crate) state: BoardState,
    pub(crate) geometry: Geometry,
    pub(crate) selection: Option<Square>,
    pub(crate) last_move: Option<(Square, Square)>,
    pub(crate) drag: Option<Drag>,
    pub(crate) animation: AnimationEngine,
    pub(crate) events: EventBus,
    pub(crate) scheduler: Scheduler<Task>,
    /// The board's clock, as of the last tick or the task being run
    pub(crate) now: Duration,
}

impl<R: RulesAdapter, V: Renderer> Core<R, V> {
    pub(crate) fn emit(&self, event: Event) {
        self.events.emit(&event);
    }

    /// Read a position handed over by the rules engine
    pub(crate) fn parse(&self, fen: &str) -> crate::Result<BoardState> {
        Ok(BoardState::from_fen_sized(fen, self.config.dimensions)?)
    }

    /// Take on the position after a move the rules engine made
    ///
    /// If the engine's position can't be read, the move is taken back on the engine and the
    /// board stays as it was.
    pub(crate) fn commit(&mut self, details: MoveDetails) -> Result<(), String> {
        let state = match self.parse(&details.fen) {
            Ok(state) => state,
            Err(err) => {
                log::error!(
                    "rules engine produced an unreadable position {:?} after {}: {err}",
                    details.fen,
                    details.request()
                );
                self.rules.undo();
                return Err(format!("the resulting position could not be read: {err}"));
            }
        };
        let previous = core::mem::replace(&mut self.state, state);
        self.selection = None;
        self.last_move = Some((details.from, details.to));
        self.animation.animate_to(&self.state, &previous, self.now);
        log::debug!("{} played {}", previous.turn(), details.san);
        self.emit(Event::Move {
            from: details.from,
            to: details.to,
            fen: details.fen.clone(),
            san: details.san,
        });
        self.emit(Event::Update { fen: details.fen });
        if let Some(outcome) = self.outcome() {
            log::debug!("game over: {outcome:?}");
            self.emit(Event::GameOver(outcome));
        }
        self.schedule_replay(self.config.animation_window() + self.config.premove.replay_buffer());
        Ok(())
    }

    pub(crate) fn schedule_replay(&mut self, after: Duration) {
        log::trace!("replay check at {:?}", self.now + after);
        self.scheduler.schedule(self.now + after, Task::Replay);
    }

    pub(crate) fn outcome(&self) -> Option<GameOutcome> {
        if self.rules.is_checkmate() {
            Some(GameOutcome::checkmate_by(self.state.turn().other()))
        } else if self.rules.is_stalemate() {
            Some(GameOutcome::Draw)
        } else {
            None
        }
    }

    /// Draw the current position, or the current frame of the transition into it
    pub(crate) fn draw(&mut self, overlay: &Overlay) {
        match self.animation.frame(self.now, &self.geometry) {
            Some(frame) if !frame.finished => self.draw_frame(&frame, overlay),
            _ => self.renderer.render_all(&Scene {
                state: &self.state,
                geometry: &self.geometry,
                overlay,
                drag: self.drag.as_ref(),
            }),
        }
    }

    fn draw_frame(&mut self, frame: &Frame, overlay: &Overlay) {
        log::trace!("frame {} at {:.3}", frame.plan_id, frame.progress);
        self.renderer.draw_board(&self.geometry);
        self.renderer.clear_pieces();
        for (square, piece) in self.state.pieces() {
            if frame.pieces.iter().any(|(mv, _)| mv.to == square) {
                continue;
            }
            self.renderer.draw_piece(piece, self.geometry.center(square));
        }
        for (mv, point) in &frame.pieces {
            self.renderer.draw_piece(mv.piece, *point);
        }
        self.renderer.draw_overlay(overlay, &self.geometry);
    }
}

impl<R: RulesAdapter, V: Renderer> PremoveHost for Core<R, V> {
    fn side_to_move(&self) -> Color {
        self.state.turn()
    }

    fn validate(&self, premove: &Premove) -> Result<(), String> {
        if self.rules.is_legal(premove) {
            Ok(())
        } else {
            Err(format!("{premove} is not legal in the current position"))
        }
    }

    fn schedule_apply(&mut self, color: Color, premove: Premove) {
        let task = Task::ApplyPremove { color, premove };
        if self.scheduler.contains(&task) {
            return;
        }
        self.scheduler
            .schedule(self.now + self.config.premove.delay(), task);
    }

    fn apply(&mut self, premove: Premove) -> Result<(), String> {
        let details = self
            .rules
            .make_move(premove)
            .map_err(|illegal| illegal.reason)?;
        self.commit(details)
    }

    fn applied(&mut self, color: Color, premove: Premove, remaining: usize) {
        self.emit(Event::PremoveApplied {
            from: premove.from,
            to: premove.to,
            color,
            promotion: premove.promotion,
            remaining,
        });
    }

    fn invalidated(&mut self, color: Color, premove: Premove, reason: String) {
        self.emit(Event::PremoveInvalidated {
            color,
            premove,
            reason,
        });
    }
}

/// An interactive board
///
/// The board holds the current position and turns the player's clicks and drags into moves,
/// premoves and promotion requests, checking each one with its [`RulesAdapter`]. Whatever it
/// does is reported through [`Event`]s and drawn through its [`Renderer`].
///
/// Nothing happens in the background: the host calls [`Board::tick`] every frame, which drives
/// animations and plays premoves once they're due.
pub struct Board<R, V> {
    pub(crate) core: Core<R, V>,
    pub(crate) premoves: PremoveQueueManager,
    pub(crate) promotion: PromotionCoordinator,
    pub(crate) promotion_handler: Option<PromotionHandler>,
}

impl<R: RulesAdapter, V: Renderer> Board<R, V> {
    /// Set up a board showing the position the rules engine is in
    pub fn new(rules: R, renderer: V, config: Config) -> crate::Result<Self> {
        let state = BoardState::from_fen_sized(&rules.fen(), config.dimensions)?;
        let geometry = Geometry::new(config.dimensions, config.square_size, config.orientation);
        let animation = AnimationEngine::new(
            config.show_animations,
            Duration::from_millis(config.animation.duration_ms),
            config.animation.easing,
        );
        let premoves = PremoveQueueManager::new(
            config.premove.multi,
            config.premove.white,
            config.premove.black,
        );
        let last_move = rules.history().last().map(|details| (details.from, details.to));
        let mut board = Self {
            core: Core {
                rules,
                renderer,
                config,
                state,
                geometry,
                selection: None,
                last_move,
                drag: None,
                animation,
                events: EventBus::new(),
                scheduler: Scheduler::new(),
                now: Duration::ZERO,
            },
            premoves,
            promotion: PromotionCoordinator::new(),
            promotion_handler: None,
        };
        board.redraw();
        Ok(board)
    }

    pub fn state(&self) -> &BoardState {
        &self.core.state
    }

    pub fn fen(&self) -> String {
        self.core.state.to_fen()
    }

    pub fn turn(&self) -> Color {
        self.core.state.turn()
    }

    pub fn rules(&self) -> &R {
        &self.core.rules
    }

    pub fn renderer(&self) -> &V {
        &self.core.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut V {
        &mut self.core.renderer
    }

    pub fn config(&self) -> &Config {
        &self.core.config
    }

    pub fn geometry(&self) -> &Geometry {
        &self.core.geometry
    }

    /// The from and to squares of the last move made
    pub fn last_move(&self) -> Option<(Square, Square)> {
        self.core.last_move
    }

    /// How the game ended, if it has
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.core.outcome()
    }

    /// The board's clock, as of the last tick
    pub fn now(&self) -> Duration {
        self.core.now
    }

    /// When the board next has deferred work to do, if it has any
    pub fn next_due(&self) -> Option<Duration> {
        self.core.scheduler.next_due()
    }

    /// Call `handler` with every [`Event`] from now on
    pub fn subscribe(&self, handler: impl FnMut(&Event) + 'static) -> Subscription {
        self.core.events.subscribe(handler)
    }

    /// Advance the board's clock to `now`
    ///
    /// Deferred work which has come due runs first, in the order it's due, each piece seeing
    /// the clock at the time it was due. The board is then drawn as it is at `now`.
    pub fn tick(&mut self, now: Duration) {
        let mut changed = false;
        while let Some((due, task)) = self.core.scheduler.pop_due(now) {
            self.core.now = due.max(self.core.now);
            log::trace!("running {task:?} at {due:?}");
            match task {
                Task::Replay => {
                    let color = self.core.state.turn();
                    self.premoves.replay_if_valid(color, &mut self.core);
                }
                Task::ApplyPremove { color, premove } => {
                    self.premoves.apply_scheduled(color, premove, &mut self.core);
                }
            }
            changed = true;
        }
        self.core.now = now.max(self.core.now);
        if changed || self.core.animation.is_animating() {
            self.redraw();
        }
    }

    /// Draw the board from scratch
    pub fn redraw(&mut self) {
        let overlay = self.overlay();
        self.core.draw(&overlay);
    }

    /// The highlights for the board as it is now
    pub fn overlay(&self) -> Overlay {
        let core = &self.core;
        let mut overlay = Overlay::new();
        if let Some((from, to)) = core.last_move {
            overlay.mark(from, Marks::LastMove);
            overlay.mark(to, Marks::LastMove);
        }
        for color in Color::BOTH {
            for premove in self.premoves.queue(color) {
                overlay.mark(premove.from, Marks::Premove);
                overlay.mark(premove.to, Marks::Premove);
            }
        }
        if let Some(selected) = core.selection {
            overlay.mark(selected, Marks::Selected);
            for target in self.selection_targets() {
                overlay.mark(target, Marks::MoveTarget);
            }
        }
        if core.rules.in_check() {
            if let Some(king) = core.state.king(core.state.turn()) {
                overlay.mark(king, Marks::Check);
            }
        }
        if let Some(request) = self.promotion.pending() {
            overlay.mark(request.to, Marks::Promotion);
        }
        overlay
    }

    /// The piece a move from `square` would pick up
    ///
    /// Usually that's whatever stands there. An empty square can still be moved from by the
    /// side waiting for its turn, if one of its premoves will have put a piece there.
    pub(crate) fn piece_for(&self, square: Square) -> Option<Piece> {
        let state = &self.core.state;
        if let Some(piece) = state.piece_at(square) {
            return Some(piece);
        }
        let waiting = state.turn().other();
        if self.premoves.queue(waiting).is_empty() {
            return None;
        }
        self.premoves
            .projected(state, waiting)
            .piece_at(square)
            .filter(|piece| piece.color == waiting)
    }

    /// Whether a pawn moving from `from` to `to` would need to choose a promotion
    pub(crate) fn needs_promotion(&self, piece: Piece, to: Square) -> bool {
        piece.kind == PieceKind::Pawn
            && self.core.state.contains(to)
            && to.rank == self.core.state.dimensions().promotion_rank(piece.color)
    }

    // Selection and dragging

    pub fn selected(&self) -> Option<Square> {
        self.core.selection
    }

    /// Select the piece on `square`, or clear the selection if there's no piece to select
    pub fn select(&mut self, square: Square) {
        self.core.selection = self.piece_for(square).map(|_| square);
        self.redraw();
    }

    pub fn deselect(&mut self) {
        self.core.selection = None;
        self.redraw();
    }

    /// The squares the selected piece could move to right now
    pub fn selection_targets(&self) -> Vec<Square> {
        let Some(selected) = self.core.selection else {
            return Vec::new();
        };
        let mut targets: Vec<Square> = self
            .core
            .rules
            .moves_from(selected)
            .into_iter()
            .map(|mv| mv.to)
            .collect();
        targets.dedup();
        targets
    }

    /// Handle a click on `square`
    ///
    /// The first click selects a piece and the second moves it. Returns how the move went, or
    /// `None` if the click only changed the selection.
    pub fn click(&mut self, square: Square) -> Option<MoveOutcome> {
        match self.core.selection {
            None => {
                self.select(square);
                None
            }
            Some(selected) if selected == square => {
                self.deselect();
                None
            }
            Some(selected) => {
                let outcome =
                    self.submit_move(board::MoveRequest::new(selected, square));
                if !outcome.is_accepted() && self.piece_for(square).is_some() {
                    self.select(square);
                }
                Some(outcome)
            }
        }
    }

    /// Pick up the piece on `square`, returning false if there's nothing to pick up
    pub fn drag_start(&mut self, square: Square) -> bool {
        let Some(piece) = self.piece_for(square) else {
            return false;
        };
        self.core.drag = Some(Drag {
            from: square,
            piece,
            point: None,
        });
        self.core.selection = Some(square);
        self.redraw();
        true
    }

    /// Move the held piece to follow the pointer
    pub fn drag_move(&mut self, point: Point) {
        if let Some(drag) = self.core.drag.as_mut() {
            drag.point = Some(point);
            self.redraw();
        }
    }

    pub fn dragging(&self) -> Option<&Drag> {
        self.core.drag.as_ref()
    }

    /// Put the held piece down on `square`, returning how the move went
    pub fn drop_on(&mut self, square: Square) -> Option<MoveOutcome> {
        let drag = self.core.drag.take()?;
        let outcome = self.submit_move(board::MoveRequest::new(drag.from, square));
        self.redraw();
        Some(outcome)
    }

    /// Put the held piece down wherever the pointer is, or back where it was if that's off
    /// the board
    pub fn drop_at(&mut self, point: Point) -> Option<MoveOutcome> {
        match self.core.geometry.square_at(point) {
            Some(square) => self.drop_on(square),
            None => {
                self.cancel_drag();
                None
            }
        }
    }

    /// Put the held piece back where it came from
    pub fn cancel_drag(&mut self) {
        if self.core.drag.take().is_some() {
            self.redraw();
        }
    }

    // Display

    /// Swap which side is drawn at the bottom
    pub fn flip(&mut self) {
        let orientation = self.core.geometry.orientation.other();
        self.core.geometry.orientation = orientation;
        self.core.config.orientation = orientation;
        self.redraw();
    }

    pub fn is_animating(&self) -> bool {
        self.core.animation.is_animating()
    }

    /// The pieces travelling in the transition in flight
    pub fn animation_plan(&self) -> Option<&AnimationPlan> {
        self.core.animation.plan()
    }

    /// Stop the transition in flight and draw the position as it is
    pub fn clear_animation(&mut self) {
        self.core.animation.cancel();
        self.redraw();
    }

    pub fn set_show_animations(&mut self, show: bool) {
        let config = &mut self.core.config;
        config.show_animations = show;
        self.core.animation.configure(
            show,
            Duration::from_millis(config.animation.duration_ms),
            config.animation.easing,
        );
        self.redraw();
    }

    // Premoves

    pub fn premove_queue(&self, color: Color) -> &[Premove] {
        self.premoves.queue(color)
    }

    /// Queue a premove for `color`, returning false if premoves are off for that side
    pub fn set_premove(&mut self, premove: Premove, color: Color) -> bool {
        self.queue_premove(color, premove).is_accepted()
    }

    /// Empty one side's premove queue, or both
    pub fn clear_premoves(&mut self, color: Option<Color>) {
        match color {
            Some(color) => self.premoves.clear(color),
            None => self.premoves.clear_all(),
        }
        self.drop_stale_applications();
        self.redraw();
    }

    /// Switch premoves on or off for both sides
    pub fn set_allow_premoves(&mut self, allow: bool) {
        self.core.config.allow_premoves = allow;
        if !allow {
            self.premoves.clear_all();
            self.drop_stale_applications();
            self.cancel_premove_promotion(None);
        }
        self.redraw();
    }

    /// Switch premoves on or off for one side
    pub fn set_premoves_enabled(&mut self, color: Color, enabled: bool) {
        match color {
            Color::White => self.core.config.premove.white = enabled,
            Color::Black => self.core.config.premove.black = enabled,
        }
        self.premoves.set_enabled(color, enabled);
        if !enabled {
            self.drop_stale_applications();
            self.cancel_premove_promotion(Some(color));
        }
        self.redraw();
    }

    /// Switch between a queue of premoves per side and a single one
    pub fn set_multi_premoves(&mut self, multi: bool) {
        self.core.config.premove.multi = multi;
        self.premoves.set_multi(multi);
        self.drop_stale_applications();
        self.redraw();
    }

    /// Forget scheduled premove applications whose premove has left its queue
    fn drop_stale_applications(&mut self) {
        let premoves = &self.premoves;
        self.core.scheduler.retain(|task| match task {
            Task::ApplyPremove { color, premove } => premoves.contains(*color, premove),
            Task::Replay => true,
        });
    }

    // Promotion

    pub fn is_promotion_pending(&self) -> bool {
        self.promotion.is_pending()
    }

    pub fn pending_promotion(&self) -> Option<&PromotionRequest> {
        self.promotion.pending()
    }

    /// Decide promotions as they come up
    ///
    /// The handler is called with every new request. Returning a piece kind resolves the
    /// request immediately; returning `None` leaves it pending.
    pub fn set_promotion_handler(
        &mut self,
        handler: impl FnMut(&PromotionRequest) -> Option<PieceKind> + 'static,
    ) {
        self.promotion_handler = Some(Box::new(handler));
    }

    pub fn clear_promotion_handler(&mut self) {
        self.promotion_handler = None;
    }

    /// Withdraw the pending promotion, if there is one
    pub(crate) fn abandon_promotion(&mut self) {
        if let Some(request) = self.promotion.clear() {
            self.core.emit(Event::PromotionCancelled(request));
        }
    }

    /// Withdraw a pending premove promotion, for one side or either
    fn cancel_premove_promotion(&mut self, color: Option<Color>) {
        let affected = self.promotion.pending().is_some_and(|request| {
            request.mode == PromotionMode::Premove
                && color.map_or(true, |color| color == request.color)
        });
        if affected {
            self.abandon_promotion();
        }
    }
}

impl<R, V> core::fmt::Debug for Board<R, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Board")
            .field("state", &self.core.state)
            .field("selection", &self.core.selection)
            .field("premoves", &self.premoves)
            .field("promotion", &self.promotion)
            .finish_non_exhaustive()
    }
}
