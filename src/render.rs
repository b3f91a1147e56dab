//! This module turns a `History` into pixels: a space-time diagram with one row per step
//! and one column per tape position.
//!
//! Two modes are provided. `Viewport::render` draws through a pan/zoom transform onto any
//! `Surface`, and `trace_to_image` writes a fixed-size RGBA buffer for static export.

use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::ops::{Range, RangeInclusive};

use crate::history::History;
use crate::types::{Machine, BLANK};

/// An RGBA color.
pub type Rgba = [u8; 4];

/// Head colors, indexed by state. States past the end of the palette get no head trace.
pub const PALETTE: [Rgba; 7] = [
    [255, 0, 0, 255],
    [255, 128, 0, 255],
    [0, 0, 255, 255],
    [0, 255, 0, 255],
    [255, 0, 255, 255],
    [0, 255, 255, 255],
    [255, 255, 0, 255],
];

/// Color of a cell holding 1.
pub const FILLED: Rgba = [255, 255, 255, 255];
/// Color of an occupied cell holding 0 in exported images.
pub const EMPTY: Rgba = [0, 0, 0, 255];
/// Color of a cleared surface.
pub const TRANSPARENT: Rgba = [0, 0, 0, 0];
/// Head color in head-move mode when the head just moved right.
pub const MOVED_RIGHT: Rgba = [255, 0, 0, 255];
/// Head color in head-move mode when the head just moved left.
pub const MOVED_LEFT: Rgba = [0, 255, 0, 255];

/// Largest width or height of a `PixelBuffer`. Larger requests are clamped.
pub const MAX_IMAGE_SIDE: usize = 8192;

/// Initial zoom of a new viewport, in pixels per cell.
pub const DEFAULT_ZOOM: f64 = 10.0;
/// How far the first row may be scrolled down from the top edge, in pixels.
pub const MAX_SCROLL_Y: f64 = 20.0;

/// Returns the head color for a state index, if the palette has one.
pub fn state_color(state: usize) -> Option<Rgba> {
    PALETTE.get(state).copied()
}

/// A 2D drawing target supplied by the caller.
pub trait Surface {
    /// Resets every pixel to `TRANSPARENT`.
    fn clear(&mut self);

    /// Fills an axis-aligned rectangle given in pixel coordinates.
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgba);
}

/// A width x height RGBA pixel buffer, row-major, 4 bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Creates a fully transparent buffer, each side clamped to `MAX_IMAGE_SIDE`.
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.min(MAX_IMAGE_SIDE);
        let height = height.min(MAX_IMAGE_SIDE);
        Self {
            width,
            height,
            data: vec![0; width * height * 4],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw RGBA bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the color at `(x, y)`, or `None` outside the buffer.
    pub fn get(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let i = 4 * (y * self.width + x);
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Sets the color at `(x, y)`. Coordinates outside the buffer are ignored.
    pub fn set(&mut self, x: i64, y: i64, color: Rgba) {
        let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
            return;
        };
        if x >= self.width || y >= self.height {
            return;
        }

        let i = 4 * (y * self.width + x);
        self.data[i..i + 4].copy_from_slice(&color);
    }

    /// Writes the buffer as a binary PPM, transparent pixels composited onto black.
    pub fn write_ppm<W: Write>(&self, mut out: W) -> io::Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;

        let rgb: Vec<u8> = self
            .data
            .chunks_exact(4)
            .flat_map(|px| {
                let alpha = u16::from(px[3]);
                [0, 1, 2].map(|c| (u16::from(px[c]) * alpha / 255) as u8)
            })
            .collect();

        out.write_all(&rgb)
    }
}

impl Surface for PixelBuffer {
    fn clear(&mut self) {
        self.data.fill(0);
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgba) {
        let (x0, x1) = pixel_span(x, width);
        let (y0, y1) = pixel_span(y, height);

        for py in y0.max(0)..y1.min(self.height as i64) {
            for px in x0.max(0)..x1.min(self.width as i64) {
                self.set(px, py, color);
            }
        }
    }
}

/// Rounds a `[start, start + len)` interval to whole pixels, never narrower than one pixel.
fn pixel_span(start: f64, len: f64) -> (i64, i64) {
    let from = start.round() as i64;
    let to = (start + len).round() as i64;
    (from, to.max(from + 1))
}

/// A recorded draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCall {
    Clear,
    FillRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: Rgba,
    },
}

/// A `Surface` that records draw calls for replay against another drawing API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    pub calls: Vec<DrawCall>,
}

impl Surface for DrawList {
    fn clear(&mut self) {
        self.calls.push(DrawCall::Clear);
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgba) {
        self.calls.push(DrawCall::FillRect {
            x,
            y,
            width,
            height,
            color,
        });
    }
}

/// The pan/zoom transform of an interactive view.
///
/// Cell `(position, row)` covers the screen rectangle starting at
/// `(position * zoom + offset_x, row * zoom + offset_y)` with side `zoom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Screen width in pixels.
    pub width: f64,
    /// Screen height in pixels.
    pub height: f64,
    /// Pixels per cell. Always positive.
    pub zoom: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Viewport {
    /// Creates a view with position 0 at `origin_x * width` and row 0 at the top edge.
    pub fn new(width: f64, height: f64, origin_x: f64) -> Self {
        Self {
            width,
            height,
            zoom: DEFAULT_ZOOM,
            offset_x: width * origin_x,
            offset_y: 0.0,
        }
    }

    /// Moves the content by `(dx, dy)` pixels.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
        self.clamp();
    }

    /// Scrolls the view by a wheel delta: content moves opposite to the delta.
    pub fn scroll(&mut self, delta_x: f64, delta_y: f64) {
        self.pan(-delta_x, -delta_y);
    }

    /// Scales the zoom by `scale`, keeping the screen point `(x, y)` fixed.
    ///
    /// Non-positive or non-finite scales are ignored.
    pub fn zoom_at(&mut self, scale: f64, x: f64, y: f64) {
        if !(scale.is_finite() && scale > 0.0) {
            return;
        }

        self.offset_x = (self.offset_x - x) * scale + x;
        self.offset_y = (self.offset_y - y) * scale + y;
        self.zoom *= scale;
        self.clamp();
    }

    fn clamp(&mut self) {
        self.offset_y = self.offset_y.min(MAX_SCROLL_Y);
    }

    /// Leftmost visible cell column and the number of columns that fit on screen.
    fn columns(&self) -> (i64, i64) {
        (
            (-self.offset_x / self.zoom).floor() as i64,
            (self.width / self.zoom).ceil() as i64,
        )
    }

    /// Tape positions that can appear on screen.
    pub fn visible_positions(&self) -> RangeInclusive<i64> {
        let (min_x, width) = self.columns();
        min_x..=min_x.saturating_add(width)
    }

    /// History rows that can appear on screen, for a history of `len` rows.
    pub fn visible_rows(&self, len: usize) -> Range<usize> {
        let min_y = (-self.offset_y / self.zoom).floor() as i64;
        let height = (self.height / self.zoom).ceil() as i64;

        let start = usize::try_from(min_y.max(0)).unwrap_or(usize::MAX);
        let end = usize::try_from(min_y.saturating_add(height).saturating_add(1).max(0))
            .unwrap_or(usize::MAX)
            .min(len);

        start..end.max(start)
    }

    /// Screen rectangle `(x, y, width, height)` of a cell.
    pub fn cell_rect(&self, position: i64, row: usize) -> (f64, f64, f64, f64) {
        (
            position as f64 * self.zoom + self.offset_x,
            row as f64 * self.zoom + self.offset_y,
            self.zoom,
            self.zoom,
        )
    }

    /// The `(position, row)` cell under a screen point. Rows above the first are negative.
    pub fn cell_at(&self, x: f64, y: f64) -> (i64, i64) {
        (
            ((x - self.offset_x) / self.zoom).floor() as i64,
            ((y - self.offset_y) / self.zoom).floor() as i64,
        )
    }

    /// Draws the visible part of `history` onto `surface`.
    ///
    /// The tape pass fills every visible cell holding 1; cells holding 0 keep the cleared
    /// background. The head pass then paints the head of each row in its state's palette
    /// color on top, so the head trace stays visible over filled cells.
    pub fn render<S: Surface>(&self, history: &History, surface: &mut S) {
        surface.clear();

        let rows = self.visible_rows(history.len());
        let positions = self.visible_positions();

        for row in rows.clone() {
            let Some(snapshot) = history.get(row) else {
                continue;
            };

            for (position, symbol) in snapshot.tape.occupied() {
                if symbol == BLANK || !positions.contains(&position) {
                    continue;
                }
                self.fill_cell(surface, position, row, FILLED);
            }
        }

        for row in rows {
            let Some(snapshot) = history.get(row) else {
                continue;
            };
            let Some(color) = snapshot.state.index().and_then(state_color) else {
                continue;
            };

            if positions.contains(&snapshot.head) {
                self.fill_cell(surface, snapshot.head, row, color);
            }
        }
    }

    fn fill_cell<S: Surface>(&self, surface: &mut S, position: i64, row: usize, color: Rgba) {
        let (x, y, w, h) = self.cell_rect(position, row);
        surface.fill_rect(x, y, w, h, color);
    }
}

/// Settings of a static image export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageOptions {
    pub width: usize,
    /// Image height, which is also the number of steps simulated by `render_image`.
    pub height: usize,
    /// Column of position 0, as a fraction of the width.
    pub origin_x: f64,
    /// Color the head cell by the direction of its last move.
    pub show_head_move: bool,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            width: 900,
            height: 1000,
            origin_x: 0.5,
            show_head_move: false,
        }
    }
}

/// Renders `history` one pixel per cell, position `p` of row `r` at
/// `(p + floor(width * origin_x), r)`.
///
/// Visited cells are `FILLED` or `EMPTY`; cells the head never reached stay `TRANSPARENT`.
/// On the halted row the cell read by the halting transition counts as visited. With
/// `show_head_move`, the head cell of every running row after the first is colored
/// `MOVED_RIGHT` or `MOVED_LEFT` by comparing its position with the previous row's.
pub fn trace_to_image(history: &History, options: &ImageOptions) -> PixelBuffer {
    let mut image = PixelBuffer::new(options.width, options.height);
    let origin = (options.width as f64 * options.origin_x).floor() as i64;

    for (row, snapshot) in history.snapshots().iter().enumerate() {
        if row >= options.height {
            break;
        }
        let y = row as i64;

        // Written cells form one contiguous run, so the bounds are exactly the visited cells.
        let mut visited = snapshot.tape.bounds();
        if snapshot.state.is_halted() {
            let head = snapshot.head;
            visited = Some(visited.map_or((head, head), |(lo, hi)| (lo.min(head), hi.max(head))));
        }

        if let Some((lo, hi)) = visited {
            for position in lo..=hi {
                let color = if snapshot.tape.get(position) == BLANK {
                    EMPTY
                } else {
                    FILLED
                };
                image.set(position + origin, y, color);
            }
        }

        if options.show_head_move && row > 0 && !snapshot.state.is_halted() {
            let last = history.snapshots()[row - 1].head;
            let color = if snapshot.head > last {
                MOVED_RIGHT
            } else {
                MOVED_LEFT
            };
            image.set(snapshot.head + origin, y, color);
        }
    }

    image
}

/// Simulates `machine` for `options.height` steps and renders the result.
pub fn render_image(machine: &Machine, initial_tape: &str, options: &ImageOptions) -> PixelBuffer {
    let history = History::run(machine, initial_tape, options.height);
    trace_to_image(&history, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_MAX_STEPS;

    fn bb2() -> Machine {
        Machine::new(vec![1, 0, 2, 1, 1, 2, 1, 1, 1, 1, 0, 0]).unwrap()
    }

    fn runner() -> Machine {
        Machine::new(vec![1, 0, 1, 1, 0, 1]).unwrap()
    }

    /// A 1x1 viewport showing exactly cell `(position, row)`.
    fn single_cell(position: i64, row: usize) -> Viewport {
        Viewport {
            width: 1.0,
            height: 1.0,
            zoom: 1.0,
            offset_x: -position as f64,
            offset_y: -(row as f64),
        }
    }

    #[test]
    fn test_head_color_overrides_tape() {
        let history = History::from_blank(&bb2());
        // Row 5 is the last running row: state B on a cell holding 1.
        let snapshot = history.get(5).unwrap();
        assert_eq!(snapshot.state.index(), Some(1));
        assert_eq!(snapshot.tape.get(snapshot.head), 1);

        let mut buffer = PixelBuffer::new(1, 1);
        single_cell(snapshot.head, 5).render(&history, &mut buffer);

        assert_eq!(buffer.get(0, 0), Some(PALETTE[1]));
    }

    #[test]
    fn test_filled_cell_without_head() {
        let history = History::from_blank(&bb2());
        // Row 5 has the head at -1; position 0 holds 1.
        let mut buffer = PixelBuffer::new(1, 1);
        single_cell(0, 5).render(&history, &mut buffer);

        assert_eq!(buffer.get(0, 0), Some(FILLED));
    }

    #[test]
    fn test_halted_row_has_no_head_trace() {
        let history = History::from_blank(&bb2());
        let last = history.len() - 1;
        let head = history.get(last).unwrap().head;

        let mut buffer = PixelBuffer::new(1, 1);
        single_cell(head, last).render(&history, &mut buffer);

        // The halting transition read a 1, so only the tape pass paints.
        assert_eq!(buffer.get(0, 0), Some(FILLED));
    }

    #[test]
    fn test_states_beyond_palette_are_not_traced() {
        // Eight states chained A -> B -> ... -> H -> H, writing nothing.
        let mut bytes = Vec::new();
        for s in 0..8u8 {
            let next = (s + 2).min(8);
            bytes.extend_from_slice(&[0, 0, next, 0, 0, next]);
        }
        let history = History::run(&Machine::new(bytes).unwrap(), "0", 10);
        let row = 7;
        assert_eq!(history.get(row).unwrap().state.index(), Some(7));

        let mut list = DrawList::default();
        single_cell(history.get(row).unwrap().head, row).render(&history, &mut list);

        assert_eq!(list.calls, vec![DrawCall::Clear]);
    }

    #[test]
    fn test_render_clips_to_history() {
        let history = History::run(&runner(), "0", 3);
        let mut viewport = Viewport::new(100.0, 100.0, 0.5);
        viewport.zoom = 1.0;

        assert_eq!(viewport.visible_rows(history.len()), 0..4);

        viewport.offset_y = -50.0;
        assert!(viewport.visible_rows(history.len()).is_empty());

        let mut list = DrawList::default();
        viewport.render(&history, &mut list);
        assert_eq!(list.calls, vec![DrawCall::Clear]);
    }

    #[test]
    fn test_render_draw_calls() {
        let history = History::run(&runner(), "0", 2);
        let viewport = Viewport::new(200.0, 100.0, 0.5);

        let mut list = DrawList::default();
        viewport.render(&history, &mut list);

        // Tape pass: row 1 has one 1, row 2 has two. Head pass: one per row.
        let fills: Vec<_> = list
            .calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::FillRect { x, y, color, .. } => Some((*x, *y, *color)),
                DrawCall::Clear => None,
            })
            .collect();

        assert_eq!(list.calls[0], DrawCall::Clear);
        assert_eq!(fills.len(), 6);
        assert_eq!(fills[0], (100.0, 10.0, FILLED));
        assert_eq!(fills[3], (100.0, 0.0, PALETTE[0]));
        assert_eq!(fills[5], (120.0, 20.0, PALETTE[0]));
    }

    #[test]
    fn test_viewport_defaults() {
        let viewport = Viewport::new(900.0, 600.0, 0.5);

        assert_eq!(viewport.zoom, DEFAULT_ZOOM);
        assert_eq!(viewport.offset_x, 450.0);
        assert_eq!(viewport.offset_y, 0.0);
        assert_eq!(viewport.visible_positions(), -45..=45);
        assert_eq!(viewport.cell_at(455.0, 25.0), (0, 2));
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut viewport = Viewport::new(900.0, 600.0, 0.5);
        let before = viewport.cell_at(300.0, 200.0);

        viewport.zoom_at(2.0, 300.0, 200.0);

        assert_eq!(viewport.zoom, 20.0);
        assert_eq!(viewport.cell_at(300.0, 200.0), before);
        assert_eq!(viewport.offset_x, 600.0);
    }

    #[test]
    fn test_zoom_ignores_invalid_scale() {
        let mut viewport = Viewport::new(900.0, 600.0, 0.5);

        viewport.zoom_at(0.0, 10.0, 10.0);
        viewport.zoom_at(f64::NAN, 10.0, 10.0);

        assert_eq!(viewport, Viewport::new(900.0, 600.0, 0.5));
    }

    #[test]
    fn test_scroll_clamps_top() {
        let mut viewport = Viewport::new(900.0, 600.0, 0.5);

        viewport.scroll(10.0, -100.0);
        assert_eq!(viewport.offset_x, 440.0);
        assert_eq!(viewport.offset_y, MAX_SCROLL_Y);

        viewport.scroll(0.0, 300.0);
        assert_eq!(viewport.offset_y, MAX_SCROLL_Y - 300.0);
    }

    #[test]
    fn test_pan_moves_content() {
        let mut viewport = Viewport::new(900.0, 600.0, 0.5);

        viewport.pan(-30.0, -45.0);
        assert_eq!(viewport.cell_at(450.0, 0.0), (3, 4));

        viewport.pan(0.0, 1000.0);
        assert_eq!(viewport.offset_y, MAX_SCROLL_Y);
    }

    #[test]
    fn test_pixel_buffer_clamps_size() {
        let buffer = PixelBuffer::new(usize::MAX, 2);

        assert_eq!(buffer.width(), MAX_IMAGE_SIDE);
        assert_eq!(buffer.height(), 2);
        assert_eq!(buffer.data().len(), MAX_IMAGE_SIDE * 2 * 4);
    }

    #[test]
    fn test_pixel_buffer_clips() {
        let mut buffer = PixelBuffer::new(2, 2);

        buffer.set(-1, 0, FILLED);
        buffer.set(2, 0, FILLED);
        buffer.fill_rect(1.0, 1.0, 5.0, 5.0, FILLED);

        assert_eq!(buffer.get(0, 0), Some(TRANSPARENT));
        assert_eq!(buffer.get(1, 1), Some(FILLED));
        assert_eq!(buffer.get(2, 2), None);
    }

    #[test]
    fn test_trace_to_image() {
        let history = History::run(&runner(), "0", 3);
        let options = ImageOptions {
            width: 8,
            height: 4,
            origin_x: 0.5,
            show_head_move: false,
        };

        let image = trace_to_image(&history, &options);

        // Position 0 is column 4; row 0 only holds the initial blank cell.
        assert_eq!(image.get(4, 0), Some(EMPTY));
        assert_eq!(image.get(3, 0), Some(TRANSPARENT));
        assert_eq!(image.get(4, 1), Some(FILLED));
        assert_eq!(image.get(5, 3), Some(FILLED));
        assert_eq!(image.get(6, 3), Some(FILLED));
        assert_eq!(image.get(7, 3), Some(TRANSPARENT));
        // The head only ever moved right, so position -1 was never visited.
        assert_eq!(image.get(3, 3), Some(TRANSPARENT));
        assert_eq!(image.get(2, 3), Some(TRANSPARENT));
    }

    #[test]
    fn test_trace_to_image_halted_cell_is_visited() {
        // Halts at once on an empty tape: only the cell read by the halting transition shows.
        let machine = Machine::new(vec![0, 0, 0, 0, 0, 0]).unwrap();
        let history = History::run(&machine, "", DEFAULT_MAX_STEPS);
        let options = ImageOptions {
            width: 4,
            height: 4,
            origin_x: 0.5,
            show_head_move: true,
        };

        let image = trace_to_image(&history, &options);

        assert_eq!(image.get(2, 0), Some(TRANSPARENT));
        assert_eq!(image.get(2, 1), Some(EMPTY));
        assert_eq!(image.get(1, 1), Some(TRANSPARENT));
    }

    #[test]
    fn test_trace_to_image_head_move() {
        let history = History::from_blank(&bb2());
        let options = ImageOptions {
            width: 8,
            height: 8,
            origin_x: 0.5,
            show_head_move: true,
        };

        let image = trace_to_image(&history, &options);

        // Row 1: head moved right to 1. Row 3: head moved left to -1.
        assert_eq!(image.get(5, 1), Some(MOVED_RIGHT));
        assert_eq!(image.get(3, 3), Some(MOVED_LEFT));
        // Row 6 is halted: the head cell keeps its symbol color.
        assert_eq!(image.get(3, 6), Some(FILLED));
        // Row 0 keeps its symbol color.
        assert_eq!(image.get(4, 0), Some(EMPTY));
    }

    #[test]
    fn test_render_image_truncates_to_height() {
        let options = ImageOptions {
            width: 4,
            height: 2,
            ..ImageOptions::default()
        };

        let image = render_image(&runner(), "0", &options);

        assert_eq!(image.height(), 2);
        assert_eq!(image.data().len(), 4 * 2 * 4);
        assert_eq!(
            History::run(&runner(), "0", DEFAULT_MAX_STEPS).len(),
            DEFAULT_MAX_STEPS + 1
        );
    }

    #[test]
    fn test_write_ppm() {
        let mut buffer = PixelBuffer::new(2, 1);
        buffer.set(0, 0, FILLED);

        let mut out = Vec::new();
        buffer.write_ppm(&mut out).unwrap();

        let header = b"P6\n2 1\n255\n";
        assert_eq!(&out[..header.len()], header);
        assert_eq!(&out[header.len()..], &[255, 255, 255, 0, 0, 0]);
    }
}
