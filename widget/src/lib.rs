//! The core of an interactive chessboard
//!
//! A [`Board`] sits between a player and a [`RulesAdapter`](::board::RulesAdapter): it takes clicks, drags and
//! moves typed in as text, works out whether each is a move, a premove or a promotion waiting
//! on a choice, and animates the board from one position to the next. Drawing is left to a
//! [`Renderer`] and everything of interest is published as an [`Event`].
//!
//! ```
//! use board::{Color, Square};
//! use sandbox::SandboxRules;
//! use widget::{Board, Config, Event, NullRenderer};
//!
//! let mut board = Board::new(SandboxRules::new(), NullRenderer, Config::default()).unwrap();
//! let sq = |name: &str| name.parse::<Square>().unwrap();
//! assert!(board.attempt_move(sq("e2"), sq("e4"), None));
//! assert_eq!(board.turn(), Color::Black);
//! ```

mod animation;
mod board;
mod config;
mod events;
mod executor;
mod geometry;
mod premove;
mod promotion;
mod render;
mod schedule;


pub use crate::animation::{AnimationEngine, AnimationPlan, Easing, Frame, PieceMove};
pub use crate::board::Board;
pub use crate::config::{AnimationConfig, Config, PremoveConfig, PromotionConfig};
pub use crate::events::{Event, EventBus, Subscription};
pub use crate::executor::{MoveOutcome, Rejection};
pub use crate::geometry::{Geometry, Point};
pub use crate::premove::{Premove, PremoveHost, PremoveQueueManager, Replay};
pub use crate::promotion::{PromotionHandler, PromotionMode, PromotionRequest};
pub use crate::render::{Drag, Marks, NullRenderer, Overlay, Renderer, Scene};
pub use crate::schedule::Scheduler;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("error reading position: {0}")]
    Fen(#[from] ::board::FenError),
    #[error("error from rules engine: {0}")]
    Rules(#[from] ::board::RulesError),
    #[error("error reading configuration: {0}")]
    Config(#[from] serde_json::Error),
}
