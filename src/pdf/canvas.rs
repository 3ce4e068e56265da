//! Page-oriented drawing surface.
//!
//! All coordinates are millimetres with the origin at the top-left corner of
//! the page and y growing downward; text `y` is the baseline. The canvas only
//! records [`DrawOp`]s per page. Turning them into PDF objects is the
//! exporter's job, which keeps layout free of any PDF state.
//!
//! The canvas does not own a vertical cursor. Callers thread the cursor
//! through their own calls; [`Canvas::new_page`] hands back the cursor value
//! a fresh page starts at.

use crate::error::Error;
use crate::fonts::FontWeight;
use crate::model::PLACEHOLDER;

use super::layout::TextMeasurer;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl PageGeometry {
    pub fn a4() -> Self {
        Self {
            width: 210.0,
            height: 297.0,
            margin_top: 20.0,
            margin_bottom: 30.0,
            margin_left: 14.0,
            margin_right: 16.0,
        }
    }

    /// Lowest y content may reach before the footer band.
    pub fn content_bottom(&self) -> f32 {
        self.height - self.margin_bottom
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Blend toward white, keeping `amount` of the original colour.
    pub fn tint(self, amount: f32) -> Rgb {
        let mix = |c: u8| (c as f32 * amount + 255.0 * (1.0 - amount)).round() as u8;
        Rgb(mix(self.0), mix(self.1), mix(self.2))
    }

    pub(crate) fn unit(self) -> (f32, f32, f32) {
        (
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub weight: FontWeight,
    /// Points.
    pub size: f32,
    pub color: Rgb,
    pub align: Align,
}

impl TextStyle {
    pub fn regular(size: f32, color: Rgb) -> Self {
        Self {
            weight: FontWeight::Regular,
            size,
            color,
            align: Align::Left,
        }
    }

    pub fn bold(size: f32, color: Rgb) -> Self {
        Self {
            weight: FontWeight::Bold,
            ..Self::regular(size, color)
        }
    }

    pub fn aligned(self, align: Align) -> Self {
        Self { align, ..self }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    FillRect {
        rect: Rect,
        color: Rgb,
    },
    RoundedRect {
        rect: Rect,
        radius: f32,
        fill: Option<Rgb>,
        stroke: Option<Rgb>,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        color: Rgb,
        width: f32,
    },
    /// `x` is the resolved left edge after alignment.
    Text {
        text: String,
        x: f32,
        y: f32,
        width: f32,
        style: TextStyle,
    },
    Link {
        rect: Rect,
        url: String,
    },
}

#[derive(Clone, Debug, Default)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = (&str, f32, f32)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, x, y, .. } => Some((text.as_str(), *x, *y)),
            _ => None,
        })
    }

    pub fn links(&self) -> impl Iterator<Item = (&Rect, &str)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Link { rect, url } => Some((rect, url.as_str())),
            _ => None,
        })
    }
}

/// Text drawn with characters the font cannot show. Those characters are
/// left out of the exported PDF.
#[derive(Clone, Debug, PartialEq)]
pub struct UnmappedText {
    /// 1-based page number.
    pub page: usize,
    pub text: String,
    pub chars: Vec<char>,
}

pub struct Canvas {
    geometry: PageGeometry,
    measurer: TextMeasurer,
    pages: Vec<Page>,
    current: usize,
    unmapped: Vec<UnmappedText>,
}

impl Canvas {
    /// A canvas with one empty page.
    pub fn new(geometry: PageGeometry, measurer: TextMeasurer) -> Self {
        Self {
            geometry,
            measurer,
            pages: vec![Page::default()],
            current: 0,
            unmapped: Vec::new(),
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn measurer(&self) -> &TextMeasurer {
        &self.measurer
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn current_page(&self) -> usize {
        self.current
    }

    /// Drain the texts recorded with unmappable characters since the last
    /// call.
    pub fn take_unmapped(&mut self) -> Vec<UnmappedText> {
        std::mem::take(&mut self.unmapped)
    }

    /// Direct subsequent draws to an existing page. Out-of-range indices
    /// are clamped to the last page.
    pub fn set_current_page(&mut self, index: usize) {
        self.current = index.min(self.pages.len() - 1);
    }

    /// Append a page, make it current, and return the top-margin cursor.
    pub fn new_page(&mut self) -> f32 {
        self.pages.push(Page::default());
        self.current = self.pages.len() - 1;
        log::debug!("Canvas: started page {}", self.pages.len());
        self.geometry.margin_top
    }

    fn push(&mut self, op: DrawOp) {
        self.pages[self.current].ops.push(op);
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.push(DrawOp::FillRect { rect, color });
    }

    pub fn rounded_rect(&mut self, rect: Rect, radius: f32, fill: Option<Rgb>, stroke: Option<Rgb>) {
        if fill.is_none() && stroke.is_none() {
            return;
        }
        let radius = radius.max(0.0).min(rect.width / 2.0).min(rect.height / 2.0);
        self.push(DrawOp::RoundedRect {
            rect,
            radius,
            fill,
            stroke,
        });
    }

    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb, width: f32) {
        self.push(DrawOp::Line {
            from,
            to,
            color,
            width,
        });
    }

    /// Draw a single line of text and return its width. Blank text renders
    /// the placeholder.
    pub fn text(&mut self, value: &str, x: f32, y: f32, style: &TextStyle) -> Result<f32, Error> {
        let text = if value.trim().is_empty() {
            PLACEHOLDER
        } else {
            value
        };
        let width = self.measurer.width(text, style.weight, style.size)?;
        let missing = self.measurer.fonts().face(style.weight).missing_chars(text);
        if !missing.is_empty() {
            log::warn!(
                "No glyph for {missing:?} in {:?} on page {}; dropped from {text:?}",
                self.measurer.fonts().face(style.weight).family(),
                self.current + 1
            );
            self.unmapped.push(UnmappedText {
                page: self.current + 1,
                text: text.to_string(),
                chars: missing,
            });
        }
        let left = match style.align {
            Align::Left => x,
            Align::Center => x - width / 2.0,
            Align::Right => x - width,
        };
        self.push(DrawOp::Text {
            text: text.to_string(),
            x: left,
            y,
            width,
            style: *style,
        });
        Ok(width)
    }

    /// Draw wrapped lines `line_height` apart. Interior blank lines only
    /// take up space; the placeholder stands in for a value that is blank as
    /// a whole.
    pub fn text_lines(
        &mut self,
        lines: &[String],
        x: f32,
        y: f32,
        line_height: f32,
        style: &TextStyle,
    ) -> Result<(), Error> {
        if lines.iter().all(|l| l.trim().is_empty()) {
            self.text("", x, y, style)?;
            return Ok(());
        }
        for (i, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            self.text(line, x, y + i as f32 * line_height, style)?;
        }
        Ok(())
    }

    /// Draw text and make its box clickable, opening `url`.
    pub fn link_region(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        url: &str,
        style: &TextStyle,
    ) -> Result<f32, Error> {
        let width = self.text(text, x, y, style)?;
        let left = match style.align {
            Align::Left => x,
            Align::Center => x - width / 2.0,
            Align::Right => x - width,
        };
        let size_mm = style.size * super::layout::PT_TO_MM;
        self.push(DrawOp::Link {
            rect: Rect::new(left, y - size_mm * 0.8, width, size_mm),
            url: url.to_string(),
        });
        Ok(width)
    }
}
