//! Geometry primitives: affine transforms, rectangles and colors
//!
//! Raster space has its origin at the top-left and y growing downward.
//! PDF user space has its origin at the bottom-left; `AffineTransform`
//! values are in PDF space until scaled and flipped by the extractor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A PDF text matrix `[a, b, c, d, e, f]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AffineTransform(pub [f64; 6]);

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AffineTransform {
    pub const IDENTITY: AffineTransform = AffineTransform([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self([a, b, c, d, e, f])
    }

    /// Build from a slice of at least six numbers; extra entries are ignored.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [a, b, c, d, e, f, ..] => Some(Self([*a, *b, *c, *d, *e, *f])),
            _ => None,
        }
    }

    pub fn translation(&self) -> Point {
        Point::new(self.0[4], self.0[5])
    }

    /// Glyph height in pixels at `scale`.
    ///
    /// Uses the length of the first column so rotated and skewed runs
    /// report the same height as upright ones.
    pub fn font_height(&self, scale: f64) -> f64 {
        self.0[0].hypot(self.0[1]) * scale
    }

    pub fn apply(&self, point: Point) -> Point {
        let [a, b, c, d, e, f] = self.0;
        Point::new(a * point.x + c * point.y + e, b * point.x + d * point.y + f)
    }

    /// Concatenate: the result applies `self` first, then `other`.
    pub fn then(&self, other: &AffineTransform) -> AffineTransform {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        AffineTransform([
            a1 * a2 + b1 * c2,
            a1 * b2 + b1 * d2,
            c1 * a2 + d1 * c2,
            c1 * b2 + d1 * d2,
            e1 * a2 + f1 * c2 + e2,
            e1 * b2 + f1 * d2 + f2,
        ])
    }

    pub fn scaled(&self, scale: f64) -> AffineTransform {
        self.then(&AffineTransform::new(scale, 0.0, 0.0, scale, 0.0, 0.0))
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

/// Scale that fits a page into the target box while keeping its aspect ratio.
pub fn fit_scale(page_width: f64, page_height: f64, target_width: f64, target_height: f64) -> f64 {
    (target_width / page_width).min(target_height / page_height)
}

/// Axis-aligned rectangle in raster space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The box spanned by two opposite corners, in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let left = a.x.min(b.x);
        let top = a.y.min(b.y);
        Self::new(left, top, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Strict overlap: rectangles that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Inclusive point containment.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.left().min(other.left());
        let top = self.top().min(other.top());
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(left, top, right - left, bottom - top)
    }

    /// Smallest rectangle covering every input, or `None` for an empty input.
    pub fn bounding<I>(rects: I) -> Option<Rect>
    where
        I: IntoIterator<Item = Rect>,
    {
        rects.into_iter().reduce(|acc, r| acc.union(&r))
    }
}

/// An sRGB color with 8-bit channels. Serializes as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Map a unit-interval channel to 0..=255, rounding exact halves down.
fn unit_to_channel(value: f64) -> u8 {
    let value = if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    };
    (value * 255.0 - 0.5).ceil().clamp(0.0, 255.0) as u8
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert a unit-interval color tuple.
    ///
    /// Three or more components are RGB, one component is grayscale.
    /// Anything else (including an empty tuple) is black.
    pub fn from_components(components: &[f64]) -> Color {
        match components {
            [r, g, b, ..] => Color::rgb(
                unit_to_channel(*r),
                unit_to_channel(*g),
                unit_to_channel(*b),
            ),
            [gray] => {
                let v = unit_to_channel(*gray);
                Color::rgb(v, v, v)
            }
            _ => Color::BLACK,
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Parse `#rrggbb`, `#rgb` or `rgb(r, g, b)`.
    pub fn parse(input: &str) -> Option<Color> {
        let s = input.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return match hex.len() {
                6 => Some(Color::rgb(
                    u8::from_str_radix(hex.get(0..2)?, 16).ok()?,
                    u8::from_str_radix(hex.get(2..4)?, 16).ok()?,
                    u8::from_str_radix(hex.get(4..6)?, 16).ok()?,
                )),
                3 => {
                    let mut channels = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
                    Some(Color::rgb(
                        channels.next()??,
                        channels.next()??,
                        channels.next()??,
                    ))
                }
                _ => None,
            };
        }
        let inner = s.strip_prefix("rgb(")?.strip_suffix(')')?;
        let mut parts = inner.split(',').map(|p| p.trim().parse::<u8>().ok());
        let color = Color::rgb(parts.next()??, parts.next()??, parts.next()??);
        if parts.next().is_some() {
            return None;
        }
        Some(color)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s).ok_or_else(|| format!("Invalid color: {}", s))
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn component() -> impl Strategy<Value = f64> {
        -500.0f64..500.0
    }

    fn rect() -> impl Strategy<Value = Rect> {
        (0.0f64..500.0, 0.0f64..500.0, 0.1f64..200.0, 0.1f64..200.0)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    proptest! {
        /// Translation never changes the glyph height
        #[test]
        fn font_height_ignores_translation(
            a in component(), b in component(), c in component(), d in component(),
            tx in component(), ty in component(), scale in 0.1f64..4.0,
        ) {
            let base = AffineTransform::new(a, b, c, d, 0.0, 0.0);
            let moved = AffineTransform::new(a, b, c, d, tx, ty);
            prop_assert_eq!(base.font_height(scale), moved.font_height(scale));
            let expected = (a * a + b * b).sqrt() * scale;
            prop_assert!((moved.font_height(scale) - expected).abs() < 1e-6);
        }

        #[test]
        fn overlap_is_symmetric(r1 in rect(), r2 in rect()) {
            prop_assert_eq!(r1.overlaps(&r2), r2.overlaps(&r1));
        }

        #[test]
        fn union_covers_both(r1 in rect(), r2 in rect()) {
            let u = r1.union(&r2);
            let eps = 1e-9;
            for r in [r1, r2] {
                prop_assert!(u.left() <= r.left() && u.top() <= r.top());
                prop_assert!(u.right() + eps >= r.right() && u.bottom() + eps >= r.bottom());
            }
        }
    }
}
