//! Moves made ahead of one's turn
//!
//! Each side has its own queue. Once it's a side's turn, the head of its queue is checked
//! against the position as it is at that moment: a playable premove is scheduled to be played
//! after a short delay, and an unplayable one is dropped so the next one can be tried. A bad
//! premove never holds up the ones behind it.

use board::{BoardState, Color, MoveRequest};

/// A move waiting for its side's turn
pub type Premove = MoveRequest;

/// What the queues need from the board they belong to
pub trait PremoveHost {
    /// The side to move in the current position
    fn side_to_move(&self) -> Color;

    /// Check a premove against the current position
    fn validate(&self, premove: &Premove) -> Result<(), String>;

    /// Arrange for [`PremoveQueueManager::apply_scheduled`] to be called later for this premove
    fn schedule_apply(&mut self, color: Color, premove: Premove);

    /// Play the premove, replacing the current position
    fn apply(&mut self, premove: Premove) -> Result<(), String>;

    /// A premove was played
    fn applied(&mut self, color: Color, premove: Premove, remaining: usize);

    /// A premove was dropped without being played
    fn invalidated(&mut self, color: Color, premove: Premove, reason: String);
}

/// How a replay check ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Replay {
    /// The side isn't to move, so nothing was checked
    NotToMove,
    /// No premoves are left
    Empty,
    /// The head of the queue is playable and has been scheduled
    Scheduled(Premove),
}

/// The premove queues of both sides
#[derive(Clone, Debug)]
pub struct PremoveQueueManager {
    white: Vec<Premove>,
    black: Vec<Premove>,
    multi: bool,
    white_enabled: bool,
    black_enabled: bool,
}

impl PremoveQueueManager {
    pub fn new(multi: bool, white_enabled: bool, black_enabled: bool) -> Self {
        Self {
            white: Vec::new(),
            black: Vec::new(),
            multi,
            white_enabled,
            black_enabled,
        }
    }

    pub fn queue(&self, color: Color) -> &[Premove] {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    fn queue_mut(&mut self, color: Color) -> &mut Vec<Premove> {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    pub fn is_enabled(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_enabled,
            Color::Black => self.black_enabled,
        }
    }

    /// Switch premoves on or off for one side, emptying its queue when switched off
    pub fn set_enabled(&mut self, color: Color, enabled: bool) {
        match color {
            Color::White => self.white_enabled = enabled,
            Color::Black => self.black_enabled = enabled,
        }
        if !enabled {
            self.clear(color);
        }
    }

    /// Switch between a queue per side and a single slot per side
    ///
    /// Going down to a single slot keeps only the premove at the head of each queue.
    pub fn set_multi(&mut self, multi: bool) {
        self.multi = multi;
        if !multi {
            self.white.truncate(1);
            self.black.truncate(1);
        }
    }

    /// Add a premove for the given side
    ///
    /// With a single slot, the premove replaces whatever was there. Returns false, changing
    /// nothing, if the side has premoves switched off.
    pub fn enqueue(&mut self, color: Color, premove: Premove) -> bool {
        if !self.is_enabled(color) {
            return false;
        }
        let multi = self.multi;
        let queue = self.queue_mut(color);
        if !multi {
            queue.clear();
        }
        queue.push(premove);
        true
    }

    /// Remove the first queued premove equal to the given one, returning whether there was one
    pub fn dequeue_matching(&mut self, color: Color, premove: &Premove) -> bool {
        let queue = self.queue_mut(color);
        match queue.iter().position(|queued| queued == premove) {
            Some(idx) => {
                queue.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn head(&self, color: Color) -> Option<Premove> {
        self.queue(color).first().copied()
    }

    pub fn contains(&self, color: Color, premove: &Premove) -> bool {
        self.queue(color).contains(premove)
    }

    pub fn clear(&mut self, color: Color) {
        self.queue_mut(color).clear();
    }

    pub fn clear_all(&mut self) {
        self.white.clear();
        self.black.clear();
    }

    /// The position as it would look with the side's queued premoves played out in order
    ///
    /// The premoves are only lifted from square to square, with no rules consulted, so this is
    /// a picture of the player's intent rather than a position that could arise.
    pub fn projected(&self, state: &BoardState, color: Color) -> BoardState {
        self.queue(color)
            .iter()
            .fold(state.clone(), |state, premove| state.relocated(premove))
    }

    /// Look for a premove to play now that it's `color`'s turn
    ///
    /// Unplayable premoves at the head of the queue are dropped, one at a time, until one is
    /// found that can be played (which is scheduled) or the queue runs dry.
    pub fn replay_if_valid(&mut self, color: Color, host: &mut impl PremoveHost) -> Replay {
        loop {
            if host.side_to_move() != color {
                return Replay::NotToMove;
            }
            let Some(head) = self.head(color) else {
                return Replay::Empty;
            };
            match host.validate(&head) {
                Ok(()) => {
                    log::debug!("premove {head} for {color} is playable");
                    host.schedule_apply(color, head);
                    return Replay::Scheduled(head);
                }
                Err(reason) => {
                    log::debug!("dropping premove {head} for {color}: {reason}");
                    self.dequeue_matching(color, &head);
                    host.invalidated(color, head, reason);
                }
            }
        }
    }

    /// Play a premove which [`Self::replay_if_valid`] scheduled earlier
    ///
    /// Nothing happens if the premove has left the queue in the meantime (it was cleared, or
    /// already played) or if it's no longer its side's turn. If the position changed so that
    /// the premove can't be played after all, it's dropped like any other invalid premove and
    /// the rest of the queue is tried.
    pub fn apply_scheduled(
        &mut self,
        color: Color,
        premove: Premove,
        host: &mut impl PremoveHost,
    ) -> Replay {
        if !self.contains(color, &premove) {
            log::trace!("scheduled premove {premove} is no longer queued");
            return Replay::Empty;
        }
        if host.side_to_move() != color {
            return Replay::NotToMove;
        }
        match host.apply(premove) {
            Ok(()) => {
                self.dequeue_matching(color, &premove);
                let remaining = self.queue(color).len();
                host.applied(color, premove, remaining);
                // The move may have made another premove playable
                let next = host.side_to_move();
                self.replay_if_valid(next, host)
            }
            Err(reason) => {
                log::debug!("premove {premove} for {color} failed when played: {reason}");
                self.dequeue_matching(color, &premove);
                host.invalidated(color, premove, reason);
                self.replay_if_valid(color, host)
            }
        }
    }
}

impl Default for PremoveQueueManager {
    fn default() -> Self {
        Self::new(false, true, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use board::{PieceKind, Square};
    use quickcheck::quickcheck;

    fn premove(notation: &str) -> Premove {
        notation.parse().unwrap()
    }

    /// A host which accepts a fixed list of moves and records what happens
    struct ScriptedHost {
        turn: Color,
        playable: Vec<Premove>,
        log: Vec<String>,
        scheduled: Vec<(Color, Premove)>,
    }

    impl ScriptedHost {
        fn new(turn: Color, playable: &[&str]) -> Self {
            Self {
                turn,
                playable: playable.iter().map(|p| premove(p)).collect(),
                log: Vec::new(),
                scheduled: Vec::new(),
            }
        }
    }

    impl PremoveHost for ScriptedHost {
        fn side_to_move(&self) -> Color {
            self.turn
        }

        fn validate(&self, premove: &Premove) -> Result<(), String> {
            if self.playable.contains(premove) {
                Ok(())
            } else {
                Err("not playable".to_string())
            }
        }

        fn schedule_apply(&mut self, color: Color, premove: Premove) {
            self.scheduled.push((color, premove));
        }

        fn apply(&mut self, premove: Premove) -> Result<(), String> {
            self.validate(&premove)?;
            self.turn = self.turn.other();
            Ok(())
        }

        fn applied(&mut self, color: Color, premove: Premove, remaining: usize) {
            self.log.push(format!("applied {color} {premove} {remaining}"));
        }

        fn invalidated(&mut self, color: Color, premove: Premove, reason: String) {
            self.log.push(format!("invalidated {color} {premove} {reason}"));
        }
    }

    #[test]
    fn test_single_slot_replaces() {
        let mut queues = PremoveQueueManager::default();
        assert!(queues.enqueue(Color::White, premove("e2e4")));
        assert!(queues.enqueue(Color::White, premove("d2d4")));
        assert_eq!(queues.queue(Color::White), &[premove("d2d4")]);
        assert!(queues.queue(Color::Black).is_empty());
    }

    #[test]
    fn test_multi_appends_and_truncates_to_head() {
        let mut queues = PremoveQueueManager::new(true, true, true);
        queues.enqueue(Color::Black, premove("e7e5"));
        queues.enqueue(Color::Black, premove("g8f6"));
        assert_eq!(queues.queue(Color::Black).len(), 2);
        queues.set_multi(false);
        assert_eq!(queues.queue(Color::Black), &[premove("e7e5")]);
    }

    #[test]
    fn test_disabled_side_stays_empty() {
        let mut queues = PremoveQueueManager::new(true, false, true);
        assert!(!queues.enqueue(Color::White, premove("e2e4")));
        assert!(queues.queue(Color::White).is_empty());
        queues.enqueue(Color::Black, premove("e7e5"));
        queues.set_enabled(Color::Black, false);
        assert!(queues.queue(Color::Black).is_empty());
    }

    #[test]
    fn test_dequeue_matching_compares_promotion() {
        let mut queues = PremoveQueueManager::new(true, true, true);
        let queen = premove("a7a8q");
        let knight = premove("a7a8n");
        queues.enqueue(Color::White, queen);
        queues.enqueue(Color::White, knight);
        assert!(queues.dequeue_matching(Color::White, &knight));
        assert!(!queues.dequeue_matching(Color::White, &knight));
        assert_eq!(queues.queue(Color::White), &[queen]);
        assert_eq!(queen.promotion, Some(PieceKind::Queen));
    }

    #[test]
    fn test_replay_skips_invalid_heads() {
        let mut queues = PremoveQueueManager::new(true, true, true);
        queues.enqueue(Color::Black, premove("d8h4"));
        queues.enqueue(Color::Black, premove("e7e5"));
        let mut host = ScriptedHost::new(Color::Black, &["e7e5"]);
        assert_eq!(
            queues.replay_if_valid(Color::Black, &mut host),
            Replay::Scheduled(premove("e7e5"))
        );
        assert_eq!(host.log, vec!["invalidated black d8h4 not playable"]);
        assert_eq!(host.scheduled, vec![(Color::Black, premove("e7e5"))]);
        // Still queued until it's actually played
        assert_eq!(queues.queue(Color::Black), &[premove("e7e5")]);
    }

    #[test]
    fn test_replay_waits_for_turn_and_stops_when_empty() {
        let mut queues = PremoveQueueManager::default();
        let mut host = ScriptedHost::new(Color::White, &[]);
        assert_eq!(queues.replay_if_valid(Color::White, &mut host), Replay::Empty);
        queues.enqueue(Color::Black, premove("e7e5"));
        assert_eq!(
            queues.replay_if_valid(Color::Black, &mut host),
            Replay::NotToMove
        );
        assert!(host.log.is_empty());
    }

    #[test]
    fn test_apply_scheduled() {
        let mut queues = PremoveQueueManager::new(true, true, true);
        queues.enqueue(Color::Black, premove("e7e5"));
        queues.enqueue(Color::Black, premove("g8f6"));
        let mut host = ScriptedHost::new(Color::Black, &["e7e5", "g8f6"]);
        assert_eq!(
            queues.apply_scheduled(Color::Black, premove("e7e5"), &mut host),
            Replay::Empty
        );
        assert_eq!(host.log, vec!["applied black e7e5 1"]);
        assert_eq!(host.turn, Color::White);

        // Played already, so a second attempt is a no-op
        assert_eq!(
            queues.apply_scheduled(Color::Black, premove("e7e5"), &mut host),
            Replay::Empty
        );
        assert_eq!(
            queues.apply_scheduled(Color::Black, premove("g8f6"), &mut host),
            Replay::NotToMove
        );
        assert_eq!(host.log.len(), 1);
    }

    #[test]
    fn test_apply_failure_moves_on() {
        let mut queues = PremoveQueueManager::new(true, true, true);
        queues.enqueue(Color::White, premove("e2e4"));
        queues.enqueue(Color::White, premove("d2d4"));
        let mut host = ScriptedHost::new(Color::White, &["d2d4"]);
        assert_eq!(
            queues.apply_scheduled(Color::White, premove("e2e4"), &mut host),
            Replay::Scheduled(premove("d2d4"))
        );
        assert_eq!(host.log, vec!["invalidated white e2e4 not playable"]);
    }

    #[test]
    fn test_projection_follows_queue() {
        let mut queues = PremoveQueueManager::new(true, true, true);
        queues.enqueue(Color::Black, premove("e7e5"));
        queues.enqueue(Color::Black, premove("e5e4"));
        let state = BoardState::starting();
        let projected = queues.projected(&state, Color::Black);
        let sq = |name: &str| name.parse::<Square>().unwrap();
        assert_eq!(projected.piece_at(sq("e7")), None);
        assert_eq!(projected.piece_at(sq("e5")), None);
        assert_eq!(
            projected.piece_at(sq("e4")).map(|piece| piece.color),
            Some(Color::Black)
        );
        assert_eq!(state.piece_at(sq("e4")), None);
    }

    quickcheck! {
        fn prop_single_slot_never_exceeds_one(ops: Vec<(bool, u8, u8)>) -> bool {
            let mut queues = PremoveQueueManager::new(false, true, true);
            ops.into_iter().all(|(white, from, to)| {
                let color = if white { Color::White } else { Color::Black };
                let mv = Premove::new(Square::new(from % 8, from / 8 % 8), Square::new(to % 8, to / 8 % 8));
                queues.enqueue(color, mv);
                queues.queue(Color::White).len() <= 1 && queues.queue(Color::Black).len() <= 1
            })
        }
    }
}
