// SPDX-License-Identifier: Apache-2.0

//! Social-preview card rendering.
//!
//! The wire contract is "200 with image/png for any existing todo"; pixel
//! derivation sits behind [`PreviewRenderer`] so a real text-layout
//! collaborator can replace the built-in card without touching handlers.

use image::{ImageBuffer, ImageFormat, Rgb};
use shimekiri_model::{DueStatus, Todo};
use std::io::Cursor;

#[derive(Debug)]
pub struct PreviewError(pub String);

impl std::fmt::Display for PreviewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for PreviewError {}

pub trait PreviewRenderer: Send + Sync + 'static {
    fn render(&self, todo: &Todo, due_status: DueStatus) -> Result<Vec<u8>, PreviewError>;
}

/// Glyph-free card: banner color carries the due status, the bar strip is a
/// deterministic function of the content, the bottom ticks of the due date.
pub struct CardRenderer {
    width: u32,
    height: u32,
}

impl CardRenderer {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for CardRenderer {
    fn default() -> Self {
        Self::new(1200, 630)
    }
}

const BODY: Rgb<u8> = Rgb([247, 246, 242]);
const INK: Rgb<u8> = Rgb([38, 38, 38]);
const WITHIN: Rgb<u8> = Rgb([46, 125, 90]);
const OVERDUE: Rgb<u8> = Rgb([192, 57, 43]);

impl PreviewRenderer for CardRenderer {
    fn render(&self, todo: &Todo, due_status: DueStatus) -> Result<Vec<u8>, PreviewError> {
        let (w, h) = (self.width, self.height);
        let banner = match due_status {
            DueStatus::WithinDeadline => WITHIN,
            DueStatus::Overdue => OVERDUE,
        };
        let mut img = ImageBuffer::from_pixel(w, h, BODY);

        let banner_height = (h / 5).max(1);
        for y in 0..banner_height {
            for x in 0..w {
                img.put_pixel(x, y, banner);
            }
        }

        // One bar per content byte, height keyed to the byte value.
        let margin = (w / 24).max(1);
        let bar_width = 8u32;
        let gap = 6u32;
        let base_y = h.saturating_sub(margin + h / 8);
        let max_bar = base_y.saturating_sub(banner_height + margin);
        let mut x = margin;
        for byte in todo.content.as_str().bytes() {
            if x + bar_width + margin > w {
                break;
            }
            let bar = (u32::from(byte) % max_bar.max(1)).max(12).min(max_bar);
            for dx in 0..bar_width {
                for dy in 0..bar {
                    img.put_pixel(x + dx, base_y - dy, INK);
                }
            }
            x += bar_width + gap;
        }

        // Due-date ticks along the bottom edge.
        let tick_y = h.saturating_sub(margin / 2 + 1);
        let mut x = margin;
        for byte in todo.due_date.as_str().bytes() {
            if x + bar_width + margin > w {
                break;
            }
            let tick = if byte.is_ascii_digit() { banner } else { INK };
            for dx in 0..bar_width {
                img.put_pixel(x + dx, tick_y, tick);
            }
            x += bar_width + gap;
        }

        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png)
            .map_err(|e| PreviewError(format!("png encoding failed: {e}")))?;
        Ok(out.into_inner())
    }
}
