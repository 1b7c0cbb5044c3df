//! A game at the terminal between a human and an automatic opponent

use core::cell::RefCell;
use core::time::Duration;
use std::io::{BufRead, Write};
use std::rc::Rc;

use board::{Color, GameOutcome};
use players::Player;
use sandbox::SandboxRules;
use terminal_ui::{Command, ParseError, TerminalRenderer};
use widget::{Board, Config, Event, MoveOutcome, Rejection, Subscription};

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("error talking to the terminal: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Widget(#[from] widget::Error),
    #[error("error reading position: {0}")]
    Fen(#[from] board::FenError),
}

/// Whether to keep reading commands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A backend which relays the human's commands to the board and answers with the opponent's
/// moves until the human quits
///
/// Time only passes when there's something waiting for it: the board's clock jumps straight to
/// the next premove check or the end of the animation, so nothing is ever waited on.
pub struct Backend<P> {
    board: Board<SandboxRules, TerminalRenderer>,
    human: Color,
    opponent: P,
    clock: Duration,
    /// What the board has had to say since the last output
    messages: Rc<RefCell<Vec<String>>>,
    _subscription: Subscription,
}

impl<P: Player> Backend<P> {
    /// Set up a game with the human playing `human`
    pub fn new(rules: SandboxRules, config: Config, human: Color, opponent: P) -> Result<Self> {
        let board = Board::new(rules, TerminalRenderer::new(), config)?;
        let messages = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&messages);
        let subscription = board.subscribe(move |event| {
            if let Some(message) = describe(event) {
                sink.borrow_mut().push(message);
            }
        });
        log::info!("new game with the human playing {human}");
        Ok(Self {
            board,
            human,
            opponent,
            clock: Duration::ZERO,
            messages,
            _subscription: subscription,
        })
    }

    pub fn board(&self) -> &Board<SandboxRules, TerminalRenderer> {
        &self.board
    }

    fn say(&self, message: impl Into<String>) {
        self.messages.borrow_mut().push(message.into());
    }

    /// Everything to show the human since the last call: messages, then the board if it changed
    pub fn take_output(&mut self) -> String {
        let mut output: String = self
            .messages
            .borrow_mut()
            .drain(..)
            .map(|message| message + "\n")
            .collect();
        if let Some(frame) = self.board.renderer_mut().take_frame() {
            output.push_str(&frame);
        }
        output
    }

    /// Run the board's clock forward until it has nothing left to do
    fn settle(&mut self) {
        loop {
            if let Some(due) = self.board.next_due() {
                self.clock = self.clock.max(due);
            } else if self.board.is_animating() {
                self.clock += Duration::from_millis(self.board.config().animation.duration_ms);
            } else {
                break;
            }
            self.board.tick(self.clock);
        }
    }

    /// Let the opponent move for as long as it's their turn
    pub fn opponent_turns(&mut self) {
        while self.board.turn() != self.human && self.board.outcome().is_none() {
            let Some(mv) = self
                .opponent
                .choose_move(self.board.state(), self.board.rules())
            else {
                self.say("the opponent has no move to make");
                break;
            };
            log::debug!("opponent chose {mv}");
            if self.board.play_move(mv).is_err() {
                break;
            }
            self.settle();
        }
    }

    /// Carry out one command, then let the opponent answer
    pub fn handle(&mut self, command: Command) -> Flow {
        match command {
            Command::Move(mv) => match self.board.submit_move(mv) {
                MoveOutcome::Rejected(Rejection::Illegal(_)) => {}
                MoveOutcome::Rejected(rejection) => self.say(format!("cannot play {mv}: {rejection}")),
                MoveOutcome::PromotionPending(_) => {
                    self.say("choose a piece with \"promote <piece>\"");
                }
                MoveOutcome::Moved | MoveOutcome::Premoved | MoveOutcome::NoOp => {}
            },
            Command::Promote(kind) => match self.board.pending_promotion().copied() {
                Some(request) => {
                    if !request.resolve(&mut self.board, kind) {
                        self.say(format!("cannot promote into {kind:?}"));
                    }
                }
                None => self.say("no promotion is waiting"),
            },
            Command::Undo => {
                if !self.board.undo() {
                    self.say("there is nothing to take back");
                } else if self.board.turn() != self.human {
                    // Take back the human's move as well as the reply
                    self.board.undo();
                }
            }
            Command::Flip => self.board.flip(),
            Command::Fen(fen) => {
                if let Err(err) = self.board.set_fen(&fen) {
                    self.say(err.to_string());
                }
            }
            Command::Help => self.say(Command::HELP),
            Command::Quit => return Flow::Quit,
        }
        self.settle();
        self.opponent_turns();
        Flow::Continue
    }

    /// Handle a line of text typed by the human
    pub fn handle_line(&mut self, line: &str) -> Flow {
        match line.parse::<Command>() {
            Ok(command) => self.handle(command),
            Err(ParseError::Empty) => Flow::Continue,
            Err(err) => {
                self.say(err.to_string());
                Flow::Continue
            }
        }
    }

    /// Play the game until the human quits or the input runs out
    pub fn play_game(&mut self, input: impl BufRead, mut output: impl Write) -> Result<()> {
        self.opponent_turns();
        write!(output, "{}> ", self.take_output())?;
        output.flush()?;
        for line in input.lines() {
            let flow = self.handle_line(&line?);
            write!(output, "{}", self.take_output())?;
            if flow == Flow::Quit {
                break;
            }
            write!(output, "> ")?;
            output.flush()?;
        }
        Ok(())
    }
}

/// How an event is reported to the human
fn describe(event: &Event) -> Option<String> {
    Some(match event {
        Event::Move { san, .. } => format!("move: {san}"),
        Event::Illegal { from, to, reason } => format!("illegal move {from}{to}: {reason}"),
        Event::Update { .. } => return None,
        Event::PremoveQueued {
            color,
            premove,
            queued,
        } => format!("premove {premove} queued for {color} ({queued} waiting)"),
        Event::PremoveApplied { from, to, .. } => format!("premove {from}{to} played"),
        Event::PremoveInvalidated {
            premove, reason, ..
        } => format!("premove {premove} dropped: {reason}"),
        Event::Promotion(request) => format!("promotion on {}", request.to),
        Event::PromotionCancelled(request) => format!("promotion on {} cancelled", request.to),
        Event::GameOver(outcome) => match outcome {
            GameOutcome::WhiteCheckmate => "game over: white wins".to_string(),
            GameOutcome::BlackCheckmate => "game over: black wins".to_string(),
            GameOutcome::Draw => "game over: draw".to_string(),
        },
    })
}
