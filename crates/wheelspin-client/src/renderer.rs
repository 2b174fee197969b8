//! Wheel geometry: slices, colors, labels and the pointer.
//!
//! Rendering is a pure function from `(participants, rotation, geometry)` to
//! a [`WheelFrame`], a description any drawing backend can paint. Angles use
//! the canvas convention: radians, clockwise from the positive x axis, y
//! pointing down. Slice `i` spans
//! `[rotation + i·w, rotation + (i+1)·w]` with `w = 2π / n`.
//!
//! The pointer sits at the top of the wheel, [`POINTER_ANGLE`].

use std::f64::consts::{FRAC_PI_2, TAU};

use wheelspin_protocol::Participant;

/// Fill colors, cycled in participant order.
pub const PALETTE: [&str; 10] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#FFA07A", "#98D8C8", "#F7DC6F",
    "#BB8FCE", "#85C1E2", "#F8B4D9", "#A8E6CF",
];

/// Angle of the fixed pointer: straight up.
pub const POINTER_ANGLE: f64 = -FRAC_PI_2;

/// Label font size before any shrinking, in px.
pub const LABEL_FONT_MAX: f64 = 16.0;

/// Smallest label font size; below this the label is truncated instead.
pub const LABEL_FONT_MIN: f64 = 10.0;

/// Gap between the rim and the label's outer (right-aligned) end.
const LABEL_RIM_INSET: f64 = 20.0;

/// Average glyph advance as a fraction of the font size (bold sans-serif).
const GLYPH_WIDTH_RATIO: f64 = 0.6;

const ELLIPSIS: char = '…';

/// Size of the drawing surface and the wheel on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelGeometry {
    pub width: f64,
    pub height: f64,
    pub radius: f64,
    /// Radius of the white hub drawn over the center.
    pub hub_radius: f64,
}

impl WheelGeometry {
    /// Center of the wheel on the surface.
    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// Radial room a label may occupy: from the hub out to the inset.
    pub fn label_budget(&self) -> f64 {
        (self.radius - LABEL_RIM_INSET - self.hub_radius).max(0.0)
    }
}

impl Default for WheelGeometry {
    fn default() -> Self {
        Self {
            width: 500.0,
            height: 500.0,
            radius: 200.0,
            hub_radius: 20.0,
        }
    }
}

/// Text drawn along a slice's bisector, right-aligned at `anchor_radius`.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceLabel {
    pub text: String,
    pub font_size: f64,
    pub angle: f64,
    pub anchor_radius: f64,
}

/// One participant's wedge.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub index: usize,
    pub start_angle: f64,
    pub end_angle: f64,
    pub color: &'static str,
    pub label: SliceLabel,
}

/// Everything needed to paint one frame of the wheel.
#[derive(Debug, Clone, PartialEq)]
pub struct WheelFrame {
    pub center: (f64, f64),
    pub radius: f64,
    pub hub_radius: f64,
    pub rotation: f64,
    /// Empty when there are no participants; nothing but the surface is
    /// drawn then.
    pub slices: Vec<Slice>,
}

impl WheelFrame {
    /// Returns `true` if there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

/// Turns participants and a rotation into a [`WheelFrame`].
#[derive(Debug, Clone, Default)]
pub struct WheelRenderer {
    geometry: WheelGeometry,
}

impl WheelRenderer {
    /// Creates a renderer for `geometry`.
    pub fn new(geometry: WheelGeometry) -> Self {
        Self { geometry }
    }

    /// The geometry in use.
    pub fn geometry(&self) -> &WheelGeometry {
        &self.geometry
    }

    /// Lays out one frame.
    pub fn render(&self, participants: &[Participant], rotation: f64) -> WheelFrame {
        let g = &self.geometry;
        let mut frame = WheelFrame {
            center: g.center(),
            radius: g.radius,
            hub_radius: g.hub_radius,
            rotation,
            slices: Vec::with_capacity(participants.len()),
        };
        if participants.is_empty() {
            return frame;
        }

        let width = slice_width(participants.len());
        let budget = g.label_budget();
        for (index, participant) in participants.iter().enumerate() {
            let start_angle = rotation + index as f64 * width;
            let (text, font_size) = fit_label(&participant.name, budget);
            frame.slices.push(Slice {
                index,
                start_angle,
                end_angle: start_angle + width,
                color: PALETTE[index % PALETTE.len()],
                label: SliceLabel {
                    text,
                    font_size,
                    angle: start_angle + width / 2.0,
                    anchor_radius: g.radius - LABEL_RIM_INSET,
                },
            });
        }
        frame
    }
}

/// Angular width of one slice when there are `count` participants.
pub fn slice_width(count: usize) -> f64 {
    TAU / count.max(1) as f64
}

/// Wraps an angle into `[0, 2π)`.
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Index of the slice under the pointer at `rotation`, or `None` for an
/// empty wheel.
pub fn slice_at_pointer(count: usize, rotation: f64) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let offset = normalize_angle(POINTER_ANGLE - rotation);
    let index = (offset / slice_width(count)) as usize;
    Some(index.min(count - 1))
}

/// Rotation in `[0, 2π)` that puts the middle of slice `index` under the
/// pointer.
pub fn landing_rotation(index: usize, count: usize) -> f64 {
    let width = slice_width(count);
    normalize_angle(POINTER_ANGLE - (index as f64 + 0.5) * width)
}

/// Measured width of `text` at `font_size`.
fn text_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * GLYPH_WIDTH_RATIO
}

/// Shrinks the font one px at a time down to the minimum; if the label
/// still overflows, truncates it with an ellipsis at the minimum size.
fn fit_label(name: &str, budget: f64) -> (String, f64) {
    let mut size = LABEL_FONT_MAX;
    while size >= LABEL_FONT_MIN {
        if text_width(name, size) <= budget {
            return (name.to_string(), size);
        }
        size -= 1.0;
    }

    let max_chars = (budget / (LABEL_FONT_MIN * GLYPH_WIDTH_RATIO)) as usize;
    let keep = max_chars.saturating_sub(1);
    let mut text: String = name.chars().take(keep).collect();
    text.push(ELLIPSIS);
    (text, LABEL_FONT_MIN)
}
