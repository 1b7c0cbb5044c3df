//! Smooth transitions between two positions
//!
//! A transition starts by diffing the old and new [`BoardState`] into an [`AnimationPlan`], a list
//! of pieces that travelled from one square to another. Every frame afterwards, the engine turns
//! the elapsed time into an eased fraction and hands back where each travelling piece currently
//! is. Only one transition exists at a time.

use core::time::Duration;

use board::{BoardState, Piece, Square};
use serde::{Deserialize, Serialize};

use crate::geometry::{Geometry, Point};

/// The curves along which a transition can progress
///
/// Every curve maps 0 to 0 and 1 to 1 and never decreases in between.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    EaseOutQuad,
    #[default]
    EaseOutCubic,
    EaseInOutCubic,
}
impl Easing {
    /// Apply the curve to a fraction, which is clamped to `[0, 1]` first
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// A piece which travels during a transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PieceMove {
    pub piece: Piece,
    pub from: Square,
    pub to: Square,
}

/// Which pieces moved between two positions
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnimationPlan {
    moves: Vec<PieceMove>,
}
impl AnimationPlan {
    /// Work out which pieces moved from `start` to reach `target`
    ///
    /// Every square in `start` whose piece is gone or replaced in `target` looks, in rank-major
    /// order, for the first square of `target` which gained that same piece and hasn't already
    /// been claimed. With two identical pieces this picks by scan order, which can pair them up
    /// differently from how they really moved. Pieces without a match (captures, promotions,
    /// anything placed from nowhere) don't travel.
    pub fn diff(start: &BoardState, target: &BoardState) -> Self {
        let mut claimed: Vec<Square> = Vec::new();
        let mut moves = Vec::new();
        for (from, piece) in start.pieces() {
            if target.piece_at(from) == Some(piece) {
                continue;
            }
            let destination = target.pieces().find(|&(to, gained)| {
                gained == piece && start.piece_at(to) != Some(piece) && !claimed.contains(&to)
            });
            if let Some((to, _)) = destination {
                claimed.push(to);
                moves.push(PieceMove { piece, from, to });
            }
        }
        Self { moves }
    }

    pub fn moves(&self) -> &[PieceMove] {
        &self.moves
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Where the piece arriving on `square` came from, if it travels
    pub fn source_of(&self, square: Square) -> Option<Square> {
        self.moves
            .iter()
            .find(|mv| mv.to == square)
            .map(|mv| mv.from)
    }
}

/// A transition in progress
#[derive(Clone, Debug)]
struct Animation {
    plan_id: u64,
    started_at: Duration,
    cancelled: bool,
    plan: AnimationPlan,
}

/// One rendered step of a transition
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub plan_id: u64,
    /// Eased progress through the transition
    pub progress: f32,
    /// The travelling pieces and where to draw them now
    pub pieces: Vec<(PieceMove, Point)>,
    /// Whether this is the final frame, with everything in its exact place
    pub finished: bool,
}

/// Drives at most one transition at a time
#[derive(Debug)]
pub struct AnimationEngine {
    enabled: bool,
    duration: Duration,
    easing: Easing,
    current: Option<Animation>,
    next_id: u64,
}

impl AnimationEngine {
    pub fn new(enabled: bool, duration: Duration, easing: Easing) -> Self {
        Self {
            enabled,
            duration,
            easing,
            current: None,
            next_id: 1,
        }
    }

    pub fn configure(&mut self, enabled: bool, duration: Duration, easing: Easing) {
        self.enabled = enabled;
        self.duration = duration;
        self.easing = easing;
        if !self.enabled || self.duration.is_zero() {
            self.cancel();
        }
    }

    /// Start animating from `start` to `target`, cancelling any transition in flight
    ///
    /// Returns the id of the new plan, or `None` if there's nothing to animate and the caller
    /// should draw `target` as it is: animations are off, the duration is zero, or no piece
    /// moved.
    pub fn animate_to(
        &mut self,
        target: &BoardState,
        start: &BoardState,
        now: Duration,
    ) -> Option<u64> {
        self.cancel();
        if !self.enabled || self.duration.is_zero() {
            return None;
        }
        let plan = AnimationPlan::diff(start, target);
        if plan.is_empty() {
            return None;
        }
        let plan_id = self.next_id;
        self.next_id += 1;
        log::trace!("animation {plan_id} starts with {} pieces", plan.moves.len());
        self.current = Some(Animation {
            plan_id,
            started_at: now,
            cancelled: false,
            plan,
        });
        Some(plan_id)
    }

    /// Stop the transition in flight, if any
    ///
    /// Nothing is drawn by cancelling, so whoever cancels is responsible for redrawing.
    pub fn cancel(&mut self) -> bool {
        match self.current.as_mut() {
            Some(animation) if !animation.cancelled => {
                log::trace!("animation {} cancelled", animation.plan_id);
                animation.cancelled = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|animation| !animation.cancelled)
    }

    /// The plan of the transition in flight
    pub fn plan(&self) -> Option<&AnimationPlan> {
        self.current
            .as_ref()
            .filter(|animation| !animation.cancelled)
            .map(|animation| &animation.plan)
    }

    /// Compute the frame for the given time
    ///
    /// Returns `None` when nothing is animating. The frame at which the duration has elapsed
    /// is marked finished and ends the transition.
    pub fn frame(&mut self, now: Duration, geometry: &Geometry) -> Option<Frame> {
        let animation = self.current.as_ref()?;
        if animation.cancelled {
            self.current = None;
            return None;
        }
        let elapsed = now.saturating_sub(animation.started_at);
        let fraction = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        let finished = fraction >= 1.0;
        let progress = if finished {
            1.0
        } else {
            self.easing.apply(fraction)
        };
        let pieces = animation
            .plan
            .moves
            .iter()
            .map(|mv| {
                let from = geometry.center(mv.from);
                let to = geometry.center(mv.to);
                (*mv, if finished { to } else { from.lerp(to, progress) })
            })
            .collect();
        let frame = Frame {
            plan_id: animation.plan_id,
            progress,
            pieces,
            finished,
        };
        if finished {
            log::trace!("animation {} finished", animation.plan_id);
            self.current = None;
        }
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use board::{Color, Dimensions, MoveRequest, PieceKind, STARTING_FEN};
    use quickcheck::quickcheck;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn geometry() -> Geometry {
        Geometry::new(Dimensions::STANDARD, 10.0, Color::White)
    }

    #[test]
    fn test_diff_single_pawn_push() {
        let start = BoardState::from_fen(STARTING_FEN).unwrap();
        let target =
            BoardState::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1")
                .unwrap();
        let plan = AnimationPlan::diff(&start, &target);
        assert_eq!(
            plan.moves(),
            &[PieceMove {
                piece: Piece::new(PieceKind::Pawn, Color::White),
                from: sq("e2"),
                to: sq("e4"),
            }]
        );
    }

    #[test]
    fn test_diff_capture() {
        let start = BoardState::from_fen("8/8/8/3p4/4P3/8/8/8 w - - 0 1").unwrap();
        let target = start.relocated(&MoveRequest::new(sq("e4"), sq("d5")));
        let plan = AnimationPlan::diff(&start, &target);
        assert_eq!(plan.moves().len(), 1);
        assert_eq!(plan.source_of(sq("d5")), Some(sq("e4")));
    }

    #[test]
    fn test_diff_castling_moves_both_pieces() {
        let start = BoardState::from_fen("8/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        let target = BoardState::from_fen("8/8/8/8/8/8/8/5RK1 b - - 1 1").unwrap();
        let plan = AnimationPlan::diff(&start, &target);
        assert_eq!(plan.source_of(sq("g1")), Some(sq("e1")));
        assert_eq!(plan.source_of(sq("f1")), Some(sq("h1")));
    }

    #[test]
    fn test_diff_duplicate_pieces_claim_distinct_targets() {
        let start = BoardState::from_fen("8/8/8/8/8/8/8/R6R w - - 0 1").unwrap();
        let target = BoardState::from_fen("8/8/8/8/8/8/R6R/8 w - - 0 1").unwrap();
        let plan = AnimationPlan::diff(&start, &target);
        assert_eq!(plan.moves().len(), 2);
        assert_eq!(plan.source_of(sq("a2")), Some(sq("a1")));
        assert_eq!(plan.source_of(sq("h2")), Some(sq("h1")));
    }

    #[test]
    fn test_promotion_does_not_travel() {
        let start = BoardState::from_fen("8/P7/8/8/8/8/8/8 w - - 0 1").unwrap();
        let target = start.relocated(
            &MoveRequest::new(sq("a7"), sq("a8")).with_promotion(Some(PieceKind::Queen)),
        );
        assert!(AnimationPlan::diff(&start, &target).is_empty());
    }

    #[test]
    fn test_frames_interpolate_then_finish() {
        let start = BoardState::starting();
        let target = start.relocated(&MoveRequest::new(sq("a2"), sq("a4")));
        let mut engine = AnimationEngine::new(true, Duration::from_millis(100), Easing::Linear);
        let id = engine.animate_to(&target, &start, Duration::from_millis(1000)).unwrap();

        let frame = engine.frame(Duration::from_millis(1050), &geometry()).unwrap();
        assert_eq!(frame.plan_id, id);
        assert!(!frame.finished);
        let halfway = frame.pieces[0].1;
        assert_eq!(halfway.x, 5.0);
        assert!((halfway.y - 55.0).abs() < 1e-3, "{halfway:?}");

        let frame = engine.frame(Duration::from_millis(1100), &geometry()).unwrap();
        assert!(frame.finished);
        assert_eq!(frame.pieces[0].1, geometry().center(sq("a4")));
        assert!(!engine.is_animating());
        assert_eq!(engine.frame(Duration::from_millis(1200), &geometry()), None);
    }

    #[test]
    fn test_new_animation_cancels_old() {
        let start = BoardState::starting();
        let middle = start.relocated(&MoveRequest::new(sq("a2"), sq("a4")));
        let end = middle.relocated(&MoveRequest::new(sq("h2"), sq("h4")));
        let mut engine = AnimationEngine::new(true, Duration::from_millis(100), Easing::Linear);
        let first = engine.animate_to(&middle, &start, Duration::ZERO).unwrap();
        let second = engine.animate_to(&end, &middle, Duration::from_millis(10)).unwrap();
        assert_ne!(first, second);
        let frame = engine.frame(Duration::from_millis(20), &geometry()).unwrap();
        assert_eq!(frame.plan_id, second);
        assert_eq!(frame.pieces.len(), 1);
        assert_eq!(frame.pieces[0].0.from, sq("h2"));
    }

    #[test]
    fn test_disabled_or_instant_snaps() {
        let start = BoardState::starting();
        let target = start.relocated(&MoveRequest::new(sq("a2"), sq("a4")));
        let mut engine = AnimationEngine::new(false, Duration::from_millis(100), Easing::Linear);
        assert_eq!(engine.animate_to(&target, &start, Duration::ZERO), None);
        engine.configure(true, Duration::ZERO, Easing::Linear);
        assert_eq!(engine.animate_to(&target, &start, Duration::ZERO), None);
        assert!(!engine.is_animating());
    }

    #[test]
    fn test_cancel_stops_frames() {
        let start = BoardState::starting();
        let target = start.relocated(&MoveRequest::new(sq("a2"), sq("a4")));
        let mut engine = AnimationEngine::new(true, Duration::from_millis(100), Easing::Linear);
        engine.animate_to(&target, &start, Duration::ZERO).unwrap();
        assert!(engine.cancel());
        assert!(!engine.cancel());
        assert!(engine.plan().is_none());
        assert_eq!(engine.frame(Duration::from_millis(50), &geometry()), None);
    }

    quickcheck! {
        fn prop_easing_stays_in_bounds(a: f32, b: f32) -> bool {
            if !a.is_finite() || !b.is_finite() {
                return true;
            }
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            [Easing::Linear, Easing::EaseOutQuad, Easing::EaseOutCubic, Easing::EaseInOutCubic]
                .into_iter()
                .all(|easing| {
                    let (x, y) = (easing.apply(lo), easing.apply(hi));
                    (0.0..=1.0).contains(&x) && (0.0..=1.0).contains(&y) && x <= y + 1e-6
                })
        }
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::EaseOutQuad, Easing::EaseOutCubic, Easing::EaseInOutCubic] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6);
        }
    }
}
