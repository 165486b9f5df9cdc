//! Transient edit parameters for the current image.

use std::fmt;

/// Neutral value for brightness and contrast.
pub const NEUTRAL_PERCENT: u16 = 100;
/// Upper bound for brightness and contrast.
pub const MAX_PERCENT: u16 = 200;

/// Color filter applied before brightness and contrast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorFilter {
    #[default]
    None,
    Grayscale,
    Sepia,
    Invert,
}

impl ColorFilter {
    pub const ALL: [ColorFilter; 4] = [
        ColorFilter::None,
        ColorFilter::Grayscale,
        ColorFilter::Sepia,
        ColorFilter::Invert,
    ];

    /// CSS filter function, as recorded alongside saved edits.
    pub fn css(&self) -> &'static str {
        match self {
            ColorFilter::None => "",
            ColorFilter::Grayscale => "grayscale(100%)",
            ColorFilter::Sepia => "sepia(100%)",
            ColorFilter::Invert => "invert(100%)",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Some(ColorFilter::None),
            "grayscale" | "greyscale" | "grayscale(100%)" => Some(ColorFilter::Grayscale),
            "sepia" | "sepia(100%)" => Some(ColorFilter::Sepia),
            "invert" | "invert(100%)" => Some(ColorFilter::Invert),
            _ => None,
        }
    }
}

/// Percentage in `[0, 200]`; 100 leaves the image unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Percent(u16);

impl Percent {
    pub const NEUTRAL: Percent = Percent(NEUTRAL_PERCENT);

    /// Values above 200 are clamped.
    pub fn new(value: u16) -> Self {
        Self(value.min(MAX_PERCENT))
    }

    pub fn value(self) -> u16 {
        self.0
    }

    pub fn as_factor(self) -> f32 {
        f32::from(self.0) / 100.0
    }

    pub fn is_neutral(self) -> bool {
        self.0 == NEUTRAL_PERCENT
    }
}

impl Default for Percent {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Filter, brightness and contrast of an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditParams {
    pub filter: ColorFilter,
    pub brightness: Percent,
    pub contrast: Percent,
}

impl EditParams {
    pub fn is_identity(&self) -> bool {
        self.filter == ColorFilter::None && self.brightness.is_neutral() && self.contrast.is_neutral()
    }

    /// Live-preview filter string, e.g. `sepia(100%) brightness(120%) contrast(80%)`.
    pub fn css(&self) -> String {
        let filter = self.filter.css();
        let mut css = String::with_capacity(48);
        if !filter.is_empty() {
            css.push_str(filter);
            css.push(' ');
        }
        css.push_str(&format!(
            "brightness({}) contrast({})",
            self.brightness, self.contrast
        ));
        css
    }
}

/// Rectangle in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle is non-empty and lies wholly inside a `width` x `height` image.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.x.checked_add(self.width).is_some_and(|x1| x1 <= width)
            && self.y.checked_add(self.height).is_some_and(|y1| y1 <= height)
    }

    /// Intersection with a `width` x `height` image, `None` if empty.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<PixelRect> {
        let x0 = self.x.min(width);
        let y0 = self.y.min(height);
        let x1 = self.x.saturating_add(self.width).min(width);
        let y1 = self.y.saturating_add(self.height).min(height);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(PixelRect::new(x0, y0, x1 - x0, y1 - y0))
    }
}

/// Rectangle in on-screen coordinates of the displayed image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A crop selection, either already in source pixels or as drawn on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropRegion {
    Source(PixelRect),
    Display {
        rect: DisplayRect,
        /// Size the image was displayed at when the region was drawn.
        display_width: f64,
        display_height: f64,
    },
}

impl CropRegion {
    /// Maps the region into source pixels of a `natural_width` x `natural_height`
    /// image. Source regions are taken exactly and must lie inside the image.
    /// Display regions are clipped to it. `None` if no usable region remains.
    pub fn to_source(&self, natural_width: u32, natural_height: u32) -> Option<PixelRect> {
        match *self {
            CropRegion::Source(rect) => rect.fits(natural_width, natural_height).then_some(rect),
            CropRegion::Display {
                rect,
                display_width,
                display_height,
            } => {
                if display_width <= 0.0 || display_height <= 0.0 {
                    return None;
                }
                let sx = f64::from(natural_width) / display_width;
                let sy = f64::from(natural_height) / display_height;

                let x0 = (rect.x * sx).round().max(0.0);
                let y0 = (rect.y * sy).round().max(0.0);
                let x1 = ((rect.x + rect.width) * sx).round().max(0.0);
                let y1 = ((rect.y + rect.height) * sy).round().max(0.0);
                if x1 <= x0 || y1 <= y0 {
                    return None;
                }

                PixelRect::new(x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32)
                    .clamp_to(natural_width, natural_height)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub(crate) u64);

/// Live edit state. Exists only while the viewer is editing.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    id: SessionId,
    pub crop: Option<CropRegion>,
    pub params: EditParams,
}

impl EditSession {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            crop: None,
            params: EditParams::default(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn preview_css(&self) -> String {
        self.params.css()
    }
}
