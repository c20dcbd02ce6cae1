use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{
        canvas::{Canvas, Circle, Context, Line as CanvasLine, Points},
        Block, Borders, Widget,
    },
};
use unicode_width::UnicodeWidthStr;

use crate::palette::{hex_to_rgb, label_color, slice_color};
use crate::wheel::{Geometry, RotationFrame};

/// Wheel radius in canvas units. The canvas is a little larger to leave room
/// for the pointer.
const RADIUS: f64 = 1.0;
const EXTENT: f64 = 1.25;
const LABEL_RADIUS: f64 = 0.62;
const MAX_LABEL_WIDTH: usize = 12;

pub fn rgb(hex: &str) -> Color {
    hex_to_rgb(hex)
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(Color::White)
}

/// Canvas bounds that keep the wheel round. A terminal cell is roughly twice
/// as tall as it is wide.
pub fn bounds(inner: Rect) -> ([f64; 2], [f64; 2]) {
    if inner.width == 0 || inner.height == 0 {
        return ([-EXTENT, EXTENT], [-EXTENT, EXTENT]);
    }
    let ratio = inner.width as f64 / (2.0 * inner.height as f64);
    if ratio >= 1.0 {
        ([-EXTENT * ratio, EXTENT * ratio], [-EXTENT, EXTENT])
    } else {
        ([-EXTENT, EXTENT], [-EXTENT / ratio, EXTENT / ratio])
    }
}

/// Label shortened to fit inside a slice, measured in terminal columns.
pub fn fit_label(name: &str, max_width: usize) -> String {
    if name.width() <= max_width {
        return name.to_string();
    }
    let mut out = String::new();
    for c in name.chars() {
        let next = format!("{out}{c}");
        if next.width() + 1 > max_width {
            break;
        }
        out = next;
    }
    out.push('…');
    out
}

pub struct WheelCanvas<'a> {
    pub names: &'a [String],
    pub frame: RotationFrame,
    /// Slot of the current winner, drawn with a rim.
    pub highlight: Option<usize>,
    pub title: &'a str,
}

impl WheelCanvas<'_> {
    fn paint(&self, ctx: &mut Context<'_>, x_per_col: f64) {
        let geometry = Geometry::for_len(self.names.len());
        let rotation = self.frame.rotation;

        for index in 0..geometry.len {
            let color = rgb(slice_color(index));
            let start = geometry.start_angle(index) + rotation;
            let steps = (geometry.slice_angle / 2.0).ceil().max(1.0) as usize;
            let mut coords = Vec::with_capacity(steps * 12);
            for s in 0..=steps {
                let angle = (start + geometry.slice_angle * s as f64 / steps as f64).to_radians();
                for r in 1..=12 {
                    let r = RADIUS * r as f64 / 12.0;
                    coords.push((r * angle.cos(), r * angle.sin()));
                }
            }
            ctx.draw(&Points {
                coords: &coords,
                color,
            });

            if self.names.len() > 1 {
                let edge = start.to_radians();
                ctx.draw(&CanvasLine {
                    x1: 0.0,
                    y1: 0.0,
                    x2: RADIUS * edge.cos(),
                    y2: RADIUS * edge.sin(),
                    color: Color::Black,
                });
            }
        }

        ctx.draw(&Circle {
            x: 0.0,
            y: 0.0,
            radius: RADIUS,
            color: Color::Gray,
        });

        if let Some(index) = self.highlight.filter(|i| *i < geometry.len) {
            let start = geometry.start_angle(index) + rotation;
            for edge in [start, start + geometry.slice_angle] {
                let a = edge.to_radians();
                ctx.draw(&CanvasLine {
                    x1: 0.0,
                    y1: 0.0,
                    x2: RADIUS * a.cos(),
                    y2: RADIUS * a.sin(),
                    color: Color::Yellow,
                });
            }
        }

        // Pointer at 12 o'clock, tip touching the rim.
        ctx.draw(&CanvasLine {
            x1: -0.1,
            y1: EXTENT - 0.05,
            x2: 0.0,
            y2: RADIUS + 0.02,
            color: Color::Red,
        });
        ctx.draw(&CanvasLine {
            x1: 0.1,
            y1: EXTENT - 0.05,
            x2: 0.0,
            y2: RADIUS + 0.02,
            color: Color::Red,
        });

        // Labels ride along only while resting; mid-spin they would smear.
        if self.frame.animating {
            return;
        }
        ctx.layer();
        for (index, name) in self.names.iter().enumerate() {
            let angle = (geometry.center_angle(index) + rotation).to_radians();
            let label = fit_label(name, MAX_LABEL_WIDTH);
            let half = label.width() as f64 * x_per_col / 2.0;
            let style = Style::default()
                .fg(rgb(label_color(slice_color(index))))
                .bg(rgb(slice_color(index)))
                .add_modifier(Modifier::BOLD);
            ctx.print(
                LABEL_RADIUS * angle.cos() - half,
                LABEL_RADIUS * angle.sin(),
                Span::styled(label, style),
            );
        }
    }
}

impl Widget for WheelCanvas<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title(self.title);
        let inner = block.inner(area);
        let (x_bounds, y_bounds) = bounds(inner);
        let x_per_col = if inner.width > 0 {
            (x_bounds[1] - x_bounds[0]) / inner.width as f64
        } else {
            0.0
        };

        Canvas::default()
            .block(block)
            .marker(Marker::Braille)
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .paint(|ctx| self.paint(ctx, x_per_col))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_keep_the_wheel_round() {
        let (x, y) = bounds(Rect::new(0, 0, 80, 20));
        assert_eq!(y, [-EXTENT, EXTENT]);
        assert!((x[1] - EXTENT * 2.0).abs() < 1e-9);

        let (x, y) = bounds(Rect::new(0, 0, 20, 20));
        assert_eq!(x, [-EXTENT, EXTENT]);
        assert!((y[1] - EXTENT * 2.0).abs() < 1e-9);
    }

    #[test]
    fn long_labels_are_truncated_by_width() {
        assert_eq!(fit_label("Keta", 12), "Keta");
        let cut = fit_label("Bartholomew-Fitzgerald", 8);
        assert_eq!(cut.width(), 8);
        assert!(cut.ends_with('…'));
        // Wide glyphs count double.
        assert!(fit_label("漢字漢字漢字漢字", 6).width() <= 6);
    }

    #[test]
    fn unknown_hex_falls_back_to_white() {
        assert_eq!(rgb("#FF6B7A"), Color::Rgb(0xFF, 0x6B, 0x7A));
        assert_eq!(rgb("salmon"), Color::White);
    }
}
