//! The seam to whatever puts pixels on screen

use board::{BoardState, Piece, Square};

use crate::geometry::{Geometry, Point};

bitflags::bitflags! {
    /// Highlights drawn on top of a square
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Marks: u8 {
        const Selected = 0b0000_0001;
        const LastMove = 0b0000_0010;
        const Premove = 0b0000_0100;
        const Check = 0b0000_1000;
        /// A legal destination for the selected piece
        const MoveTarget = 0b0001_0000;
        /// The square of a promotion waiting for a choice
        const Promotion = 0b0010_0000;
    }
}

/// Every highlighted square, with its highlights
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Overlay {
    marks: Vec<(Square, Marks)>,
}
impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add highlights to a square, on top of any it has
    pub fn mark(&mut self, square: Square, marks: Marks) {
        match self.marks.iter_mut().find(|(other, _)| *other == square) {
            Some((_, existing)) => *existing |= marks,
            None => self.marks.push((square, marks)),
        }
    }

    pub fn marks_at(&self, square: Square) -> Marks {
        self.marks
            .iter()
            .find(|(other, _)| *other == square)
            .map_or(Marks::empty(), |(_, marks)| *marks)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Square, Marks)> + '_ {
        self.marks.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

/// A piece held under the pointer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Drag {
    pub from: Square,
    pub piece: Piece,
    /// Where the pointer is, or `None` before it first moves
    pub point: Option<Point>,
}

/// Everything needed to draw the board from scratch
#[derive(Clone, Copy, Debug)]
pub struct Scene<'a> {
    pub state: &'a BoardState,
    pub geometry: &'a Geometry,
    pub overlay: &'a Overlay,
    pub drag: Option<&'a Drag>,
}

/// Draws the board
///
/// The board calls this after every state change and on every animation frame. It only knows
/// where things go, never how they look, and an implementation only provides the primitives;
/// [`Renderer::render_all`] composes them for a full redraw.
pub trait Renderer {
    /// Draw the empty board
    fn draw_board(&mut self, geometry: &Geometry);

    /// Remove every piece from the piece layer
    fn clear_pieces(&mut self);

    /// Draw a piece centered on the given point
    fn draw_piece(&mut self, piece: Piece, at: Point);

    /// Replace the highlights
    fn draw_overlay(&mut self, overlay: &Overlay, geometry: &Geometry);

    /// Redraw everything
    fn render_all(&mut self, scene: &Scene<'_>) {
        self.draw_board(scene.geometry);
        self.clear_pieces();
        let dragged = scene.drag.filter(|drag| drag.point.is_some());
        for (square, piece) in scene.state.pieces() {
            if dragged.is_some_and(|drag| drag.from == square) {
                continue;
            }
            self.draw_piece(piece, scene.geometry.center(square));
        }
        self.draw_overlay(scene.overlay, scene.geometry);
        if let Some(Drag {
            piece,
            point: Some(point),
            ..
        }) = dragged
        {
            self.draw_piece(*piece, *point);
        }
    }
}

/// A renderer which draws nothing, for boards without a screen
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw_board(&mut self, _geometry: &Geometry) {}

    fn clear_pieces(&mut self) {}

    fn draw_piece(&mut self, _piece: Piece, _at: Point) {}

    fn draw_overlay(&mut self, _overlay: &Overlay, _geometry: &Geometry) {}
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn draw_board(&mut self, geometry: &Geometry) {
        (**self).draw_board(geometry)
    }

    fn clear_pieces(&mut self) {
        (**self).clear_pieces()
    }

    fn draw_piece(&mut self, piece: Piece, at: Point) {
        (**self).draw_piece(piece, at)
    }

    fn draw_overlay(&mut self, overlay: &Overlay, geometry: &Geometry) {
        (**self).draw_overlay(overlay, geometry)
    }

    fn render_all(&mut self, scene: &Scene<'_>) {
        (**self).render_all(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use board::{Color, Dimensions, PieceKind};

    #[derive(Default)]
    struct Counting {
        boards: usize,
        pieces: Vec<(Piece, Point)>,
        overlays: usize,
    }

    impl Renderer for Counting {
        fn draw_board(&mut self, _geometry: &Geometry) {
            self.boards += 1;
        }

        fn clear_pieces(&mut self) {
            self.pieces.clear();
        }

        fn draw_piece(&mut self, piece: Piece, at: Point) {
            self.pieces.push((piece, at));
        }

        fn draw_overlay(&mut self, _overlay: &Overlay, _geometry: &Geometry) {
            self.overlays += 1;
        }
    }

    #[test]
    fn test_render_all_draws_every_piece() {
        let state = BoardState::starting();
        let geometry = Geometry::new(Dimensions::STANDARD, 10.0, Color::White);
        let overlay = Overlay::new();
        let mut renderer = Counting::default();
        renderer.render_all(&Scene {
            state: &state,
            geometry: &geometry,
            overlay: &overlay,
            drag: None,
        });
        assert_eq!(renderer.boards, 1);
        assert_eq!(renderer.overlays, 1);
        assert_eq!(renderer.pieces.len(), 32);
    }

    #[test]
    fn test_dragged_piece_follows_pointer() {
        let state = BoardState::starting();
        let geometry = Geometry::new(Dimensions::STANDARD, 10.0, Color::White);
        let overlay = Overlay::new();
        let pawn = Piece::new(PieceKind::Pawn, Color::White);
        let drag = Drag {
            from: "e2".parse().unwrap(),
            piece: pawn,
            point: Some(Point::new(44.0, 33.0)),
        };
        let mut renderer = Counting::default();
        renderer.render_all(&Scene {
            state: &state,
            geometry: &geometry,
            overlay: &overlay,
            drag: Some(&drag),
        });
        assert_eq!(renderer.pieces.len(), 32);
        assert_eq!(renderer.pieces.last(), Some(&(pawn, Point::new(44.0, 33.0))));
        assert!(!renderer
            .pieces
            .contains(&(pawn, geometry.center("e2".parse().unwrap()))));
    }

    #[test]
    fn test_overlay_merges_marks() {
        let mut overlay = Overlay::new();
        let e4 = "e4".parse().unwrap();
        overlay.mark(e4, Marks::LastMove);
        overlay.mark(e4, Marks::Premove);
        assert_eq!(overlay.marks_at(e4), Marks::LastMove | Marks::Premove);
        assert_eq!(overlay.marks_at("e5".parse().unwrap()), Marks::empty());
        assert_eq!(overlay.iter().count(), 1);
    }
}
