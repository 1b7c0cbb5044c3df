//! Where squares are on screen

use board::{Color, Dimensions, Square};

/// A position in pixels, with the origin at the top-left corner of the board
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}
impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// The point a fraction `t` of the way from `self` to `other`
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// The layout of the board on screen
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    pub dimensions: Dimensions,
    pub square_size: f32,
    /// The side drawn at the bottom
    pub orientation: Color,
}
impl Geometry {
    pub const fn new(dimensions: Dimensions, square_size: f32, orientation: Color) -> Self {
        Self {
            dimensions,
            square_size,
            orientation,
        }
    }

    /// The column and row (from the top-left) at which the square is drawn
    pub const fn cell(&self, square: Square) -> (u8, u8) {
        match self.orientation {
            Color::White => (square.file, self.dimensions.ranks - 1 - square.rank),
            Color::Black => (self.dimensions.files - 1 - square.file, square.rank),
        }
    }

    /// The top-left corner of the square
    pub fn origin(&self, square: Square) -> Point {
        let (column, row) = self.cell(square);
        Point::new(
            f32::from(column) * self.square_size,
            f32::from(row) * self.square_size,
        )
    }

    /// The center of the square
    ///
    /// ```
    /// # use board::{Color, Dimensions};
    /// # use widget::{Geometry, Point};
    /// let geometry = Geometry::new(Dimensions::STANDARD, 10.0, Color::White);
    /// assert_eq!(geometry.center("a1".parse().unwrap()), Point::new(5.0, 75.0));
    /// assert_eq!(geometry.center("h8".parse().unwrap()), Point::new(75.0, 5.0));
    /// ```
    pub fn center(&self, square: Square) -> Point {
        let origin = self.origin(square);
        let half = self.square_size / 2.0;
        Point::new(origin.x + half, origin.y + half)
    }

    /// The square under the given point, if the point is on the board
    pub fn square_at(&self, point: Point) -> Option<Square> {
        if point.x < 0.0 || point.y < 0.0 || self.square_size <= 0.0 {
            return None;
        }
        let column = (point.x / self.square_size) as u32;
        let row = (point.y / self.square_size) as u32;
        if column >= u32::from(self.dimensions.files) || row >= u32::from(self.dimensions.ranks) {
            return None;
        }
        let (column, row) = (column as u8, row as u8);
        Some(match self.orientation {
            Color::White => Square::new(column, self.dimensions.ranks - 1 - row),
            Color::Black => Square::new(self.dimensions.files - 1 - column, row),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn test_black_orientation_flips() {
        let geometry = Geometry::new(Dimensions::STANDARD, 10.0, Color::Black);
        assert_eq!(geometry.center(sq("h8")), Point::new(5.0, 75.0));
        assert_eq!(geometry.center(sq("a1")), Point::new(75.0, 5.0));
    }

    #[test]
    fn test_square_at_inverts_center() {
        for orientation in Color::BOTH {
            let geometry = Geometry::new(Dimensions::new(10, 8), 32.0, orientation);
            for file in 0..10 {
                for rank in 0..8 {
                    let square = Square::new(file, rank);
                    assert_eq!(geometry.square_at(geometry.center(square)), Some(square));
                }
            }
            assert_eq!(geometry.square_at(Point::new(-1.0, 5.0)), None);
            assert_eq!(geometry.square_at(Point::new(320.0, 5.0)), None);
            assert_eq!(geometry.square_at(Point::new(5.0, 256.0)), None);
        }
    }

    #[test]
    fn test_lerp() {
        let a = Point::new(0.0, 10.0);
        let b = Point::new(10.0, 30.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Point::new(5.0, 20.0));
    }
}
