//! Notifications from the board to its host

use core::cell::RefCell;
use std::rc::{Rc, Weak};

use board::{Color, GameOutcome, PieceKind, Square};

use crate::premove::Premove;
use crate::promotion::PromotionRequest;

/// Something the host may want to react to
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A move was made on the board
    Move {
        from: Square,
        to: Square,
        fen: String,
        san: String,
    },
    /// The rules engine refused a move
    Illegal {
        from: Square,
        to: Square,
        reason: String,
    },
    /// The position was replaced
    Update { fen: String },
    /// A premove joined its side's queue
    PremoveQueued {
        color: Color,
        premove: Premove,
        /// Length of the queue including this premove
        queued: usize,
    },
    /// A queued premove was played
    PremoveApplied {
        from: Square,
        to: Square,
        color: Color,
        promotion: Option<PieceKind>,
        remaining: usize,
    },
    /// A queued premove turned out not to be playable and was dropped
    PremoveInvalidated {
        color: Color,
        premove: Premove,
        reason: String,
    },
    /// A promotion choice is needed
    Promotion(PromotionRequest),
    /// A promotion request was withdrawn without being resolved
    PromotionCancelled(PromotionRequest),
    GameOver(GameOutcome),
}

type Handler = Rc<RefCell<dyn FnMut(&Event)>>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    handlers: Vec<(u64, Handler)>,
}

/// Publishes [`Event`]s to every subscribed handler
///
/// Handlers are called in the order they subscribed. A handler may dispose of its own (or any
/// other) subscription while it's being called, and a disposed handler is skipped for the rest
/// of the event being delivered.
#[derive(Default)]
pub struct EventBus {
    listeners: Rc<RefCell<Listeners>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `handler` with every event from now on, until the subscription is disposed
    pub fn subscribe(&self, handler: impl FnMut(&Event) + 'static) -> Subscription {
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.handlers.push((id, Rc::new(RefCell::new(handler))));
        Subscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    pub fn emit(&self, event: &Event) {
        log::trace!("event {event:?}");
        // Handlers can unsubscribe while being called, so work from a snapshot
        let handlers: Vec<(u64, Handler)> = self
            .listeners
            .borrow()
            .handlers
            .iter()
            .map(|(id, handler)| (*id, Rc::clone(handler)))
            .collect();
        for (id, handler) in handlers {
            let still_subscribed = self
                .listeners
                .borrow()
                .handlers
                .iter()
                .any(|(other, _)| *other == id);
            if still_subscribed {
                (handler.borrow_mut())(event);
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.borrow().handlers.len()
    }
}

/// A handler's registration with an [`EventBus`]
///
/// Dropping this keeps the handler subscribed; call [`Subscription::dispose`] to remove it.
#[must_use = "the handler can only be removed through its subscription"]
pub struct Subscription {
    id: u64,
    listeners: Weak<RefCell<Listeners>>,
}

impl Subscription {
    /// Stop the handler from receiving further events
    pub fn dispose(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .borrow_mut()
                .handlers
                .retain(|(id, _)| *id != self.id);
        }
    }

    /// Turn the subscription into a closure which disposes it
    pub fn into_disposer(self) -> impl FnOnce() {
        move || self.dispose()
    }
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
