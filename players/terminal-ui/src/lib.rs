//! Playing at the terminal: drawing the board as text and reading typed commands

use core::str::FromStr;

use board::{MoveRequest, Piece, PieceKind, Square};
use widget::{Geometry, Marks, Overlay, Point, Renderer};

/// Draws the board into a grid of characters
///
/// Each square is three characters wide: the piece letter (or `.`), wrapped in a pair of
/// brackets showing the square's highlights.
#[derive(Clone, Debug, Default)]
pub struct TerminalRenderer {
    geometry: Option<Geometry>,
    /// Rows from the top of the screen
    cells: Vec<Vec<Option<Piece>>>,
    overlay: Overlay,
    /// Set whenever something is drawn, and cleared by [`TerminalRenderer::take_frame`]
    dirty: bool,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The square drawn at the given column and row from the top-left
    fn square_at(geometry: &Geometry, column: usize, row: usize) -> Option<Square> {
        let size = geometry.square_size;
        geometry.square_at(Point::new(
            (column as f32 + 0.5) * size,
            (row as f32 + 0.5) * size,
        ))
    }

    /// The board as it was last drawn
    pub fn render(&self) -> String {
        let Some(geometry) = &self.geometry else {
            return String::new();
        };
        let mut out = String::new();
        for (row, cells) in self.cells.iter().enumerate() {
            let rank_label = Self::square_at(geometry, 0, row)
                .map_or(String::new(), |square| (square.rank + 1).to_string());
            out.push_str(&format!("{rank_label:>2} "));
            for (column, piece) in cells.iter().enumerate() {
                let marks = Self::square_at(geometry, column, row)
                    .map_or(Marks::empty(), |square| self.overlay.marks_at(square));
                let (open, close) = Self::brackets(marks);
                let letter = match piece {
                    Some(piece) => piece.fen_letter(),
                    None if marks.contains(Marks::MoveTarget) => '*',
                    None => '.',
                };
                out.push(open);
                out.push(letter);
                out.push(close);
            }
            out.push('\n');
        }
        out.push_str("   ");
        for column in 0..self.cells.first().map_or(0, Vec::len) {
            let file = Self::square_at(geometry, column, 0).map_or(' ', Square::file_letter);
            out.push(' ');
            out.push(file);
            out.push(' ');
        }
        out.push('\n');
        out
    }

    /// The board as text, if anything was drawn since the last call
    pub fn take_frame(&mut self) -> Option<String> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.render())
    }

    fn brackets(marks: Marks) -> (char, char) {
        if marks.contains(Marks::Selected) {
            ('(', ')')
        } else if marks.contains(Marks::Promotion) {
            ('<', '>')
        } else if marks.contains(Marks::Check) {
            ('!', '!')
        } else if marks.contains(Marks::Premove) {
            ('{', '}')
        } else if marks.contains(Marks::LastMove) {
            ('[', ']')
        } else {
            (' ', ' ')
        }
    }
}

impl Renderer for TerminalRenderer {
    fn draw_board(&mut self, geometry: &Geometry) {
        let files = usize::from(geometry.dimensions.files);
        let ranks = usize::from(geometry.dimensions.ranks);
        self.cells = vec![vec![None; files]; ranks];
        self.geometry = Some(*geometry);
        self.dirty = true;
    }

    fn clear_pieces(&mut self) {
        self.cells.iter_mut().flatten().for_each(|cell| *cell = None);
        self.dirty = true;
    }

    fn draw_piece(&mut self, piece: Piece, at: Point) {
        let Some(geometry) = &self.geometry else {
            return;
        };
        // A piece in flight is drawn on whichever square it's passing over
        if let Some(square) = geometry.square_at(at) {
            let (column, row) = geometry.cell(square);
            self.cells[usize::from(row)][usize::from(column)] = Some(piece);
            self.dirty = true;
        }
    }

    fn draw_overlay(&mut self, overlay: &Overlay, _geometry: &Geometry) {
        self.overlay = overlay.clone();
        self.dirty = true;
    }
}

/// Something typed in by the player
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// A move in coordinate notation
    Move(MoveRequest),
    Undo,
    Flip,
    /// Answer the pending promotion
    Promote(PieceKind),
    /// Start again from the given position
    Fen(String),
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("no command given")]
    Empty,
    #[error("unknown command {0:?}, try \"help\"")]
    Unknown(String),
    #[error("{0:?} is not a piece a pawn can promote into")]
    Piece(String),
    #[error("\"{0}\" needs an argument")]
    MissingArgument(&'static str),
}

impl Command {
    pub const HELP: &'static str = "\
commands:
  e2e4, e7e8q     make a move, or a premove when it's not your turn
  promote <piece> choose the piece for a pending promotion (queen, rook, bishop, knight)
  undo            take back the last move
  flip            turn the board around
  fen <fen>       start again from a position
  quit            leave";
}

/// Parse a promotion piece, by letter or by name
fn parse_piece(text: &str) -> Result<PieceKind, ParseError> {
    let kind = match text.to_ascii_lowercase().as_str() {
        "queen" => Some(PieceKind::Queen),
        "rook" => Some(PieceKind::Rook),
        "bishop" => Some(PieceKind::Bishop),
        "knight" => Some(PieceKind::Knight),
        letter if letter.len() == 1 => letter.chars().next().and_then(PieceKind::from_letter),
        _ => None,
    };
    kind.filter(|kind| kind.is_promotable())
        .ok_or_else(|| ParseError::Piece(text.to_string()))
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (word, rest) = match s.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (s, ""),
        };
        match word {
            "" => Err(ParseError::Empty),
            "undo" => Ok(Self::Undo),
            "flip" => Ok(Self::Flip),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            "promote" if rest.is_empty() => Err(ParseError::MissingArgument("promote")),
            "promote" => parse_piece(rest).map(Self::Promote),
            "fen" if rest.is_empty() => Err(ParseError::MissingArgument("fen")),
            "fen" => Ok(Self::Fen(rest.to_string())),
            _ => s
                .parse::<MoveRequest>()
                .map(Self::Move)
                .map_err(|_| ParseError::Unknown(s.to_string())),
        }
    }
}
