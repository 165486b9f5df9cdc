//! Pan/zoom/rotate state for the displayed image.
//!
//! The rendered transform is `translate(position) · scale(scale) · rotate(rotation)`:
//! translation happens in screen space, scaling and rotation act on the image box.

use std::fmt;

/// Minimum zoom scale allowed
pub const MIN_SCALE: f64 = 0.5;
/// Maximum zoom scale allowed
pub const MAX_SCALE: f64 = 4.0;
/// Zoom step for the zoom keys and buttons
pub const ZOOM_STEP: f64 = 0.1;

/// Quarter-turn rotation, clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Next quarter turn, wrapping at 360.
    pub fn rotated(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f64,
    /// Screen-space offset in pixels. Not clamped; the viewport clips.
    pub position: (f64, f64),
    pub rotation: Rotation,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        scale: 1.0,
        position: (0.0, 0.0),
        rotation: Rotation::Deg0,
    };

    pub fn zoom_in(&mut self) {
        self.scale = (self.scale + ZOOM_STEP).min(MAX_SCALE);
    }

    pub fn zoom_out(&mut self) {
        self.scale = (self.scale - ZOOM_STEP).max(MIN_SCALE);
    }

    pub fn rotate(&mut self) {
        self.rotation = self.rotation.rotated();
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.position.0 += dx;
        self.position.1 += dy;
    }

    pub fn reset(&mut self) {
        *self = Self::IDENTITY;
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Maps a point relative to the image box center to screen offset.
    pub fn apply(&self, (x, y): (f64, f64)) -> (f64, f64) {
        let (rx, ry) = match self.rotation {
            Rotation::Deg0 => (x, y),
            Rotation::Deg90 => (-y, x),
            Rotation::Deg180 => (-x, -y),
            Rotation::Deg270 => (y, -x),
        };
        (
            rx * self.scale + self.position.0,
            ry * self.scale + self.position.1,
        )
    }

    /// CSS form of the transform, e.g. `translate(5px, -3px) scale(1.2) rotate(90deg)`.
    pub fn css(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "translate({}px, {}px) scale({}) rotate({}deg)",
            self.position.0,
            self.position.1,
            (self.scale * 100.0).round() / 100.0,
            self.rotation.degrees()
        )
    }
}

/// Active drag gesture. Exists between pointer-down and pointer-up/leave.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanGesture {
    last: (f64, f64),
}

impl PanGesture {
    pub fn begin(x: f64, y: f64) -> Self {
        Self { last: (x, y) }
    }

    /// Consumes a pointer move and returns the delta since the previous one.
    pub fn update(&mut self, x: f64, y: f64) -> (f64, f64) {
        let delta = (x - self.last.0, y - self.last.1);
        self.last = (x, y);
        delta
    }
}
