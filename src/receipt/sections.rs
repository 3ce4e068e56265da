//! Semantic layout blocks of the receipt.
//!
//! Every block takes the cursor it starts at and returns the cursor below
//! what it drew.

use crate::config::Branding;
use crate::error::Error;
use crate::fonts::FontWeight;
use crate::model::{Status, display};
use crate::pdf::canvas::{Align, Canvas, Rect, Rgb, TextStyle};

use super::pagination::Paginator;

pub mod palette {
    use crate::pdf::canvas::Rgb;

    pub const PRIMARY: Rgb = Rgb(30, 64, 175);
    pub const SECONDARY: Rgb = Rgb(243, 244, 246);
    pub const TEXT: Rgb = Rgb(31, 41, 55);
    pub const SUBTEXT: Rgb = Rgb(107, 114, 128);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BORDER: Rgb = Rgb(209, 213, 219);
    pub const HEADER_SUBTITLE: Rgb = Rgb(200, 200, 255);
    pub const TABLE_HEADER: Rgb = Rgb(245, 245, 245);
    pub const LINK: Rgb = Rgb(37, 99, 235);
    pub const FOOTER_BG: Rgb = Rgb(248, 250, 252);
    pub const REJECT_BG: Rgb = Rgb(254, 242, 242);
    pub const REJECT_BORDER: Rgb = Rgb(254, 202, 202);
    pub const REJECT_LABEL: Rgb = Rgb(220, 38, 38);
    pub const REJECT_TEXT: Rgb = Rgb(60, 10, 10);
}

pub const SECTION_HEADER_HEIGHT: f32 = 8.0;
pub const HEADER_BODY_GAP: f32 = 5.0;
pub const LINE_HEIGHT: f32 = 5.0;
pub const ROW_GAP: f32 = 3.0;
/// Space after a two-column block, below the deeper column.
pub const SECTION_GAP: f32 = 8.0;
/// Space after a single-column section.
pub const TRAILING_GAP: f32 = 5.0;
pub const LEFT_X: f32 = 16.0;
pub const LABEL_WIDTH: f32 = 35.0;
pub const ATTACHMENT_ROW_HEIGHT: f32 = 6.0;
pub const FOOTER_HEIGHT: f32 = 25.0;
const HEADER_BAND_HEIGHT: f32 = 40.0;
const BADGE_HEIGHT: f32 = 10.0;
const BADGE_PADDING: f32 = 16.0;
const EDGE_INSET: f32 = 15.0;

const LABEL_SIZE: f32 = 9.0;

/// One label/value pair. The value is already normalized for display.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
}

impl Field {
    pub fn new(label: &'static str, value: Option<&str>) -> Self {
        Self {
            label,
            value: display(value),
        }
    }
}

/// One attachment line ready to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct AttachmentLine {
    pub label: String,
    pub url: Option<String>,
    pub uploaded: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum WarningKind {
    /// Content ran past the bottom of the page because it could not be
    /// split. It may be clipped by the footer.
    Overflow { overflow_mm: f32 },
    /// `text` contains characters the font has no glyph for. They are left
    /// out of the PDF.
    MissingGlyphs { text: String, chars: Vec<char> },
}

/// A problem found during layout. Rendering continues past it.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutWarning {
    pub section: String,
    /// 1-based page number.
    pub page: usize,
    pub kind: WarningKind,
}

pub struct SectionRenderer<'c> {
    canvas: &'c mut Canvas,
    paginator: Paginator,
    section: &'static str,
    warnings: Vec<LayoutWarning>,
}

impl<'c> SectionRenderer<'c> {
    pub fn new(canvas: &'c mut Canvas) -> Self {
        let paginator = Paginator::new(canvas.geometry());
        Self {
            canvas,
            paginator,
            section: "",
            warnings: Vec::new(),
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &*self.canvas
    }

    pub(crate) fn canvas_mut(&mut self) -> &mut Canvas {
        &mut *self.canvas
    }

    pub fn paginator(&self) -> Paginator {
        self.paginator
    }

    pub fn warnings(&self) -> &[LayoutWarning] {
        &self.warnings
    }

    /// All warnings, including glyph reports for the section in progress.
    pub fn into_warnings(mut self) -> Vec<LayoutWarning> {
        self.collect_unmapped();
        self.warnings
    }

    /// Attach the canvas' unmappable-text records to the current section.
    fn collect_unmapped(&mut self) {
        for gap in self.canvas.take_unmapped() {
            self.warnings.push(LayoutWarning {
                section: self.section.to_string(),
                page: gap.page,
                kind: WarningKind::MissingGlyphs {
                    text: gap.text,
                    chars: gap.chars,
                },
            });
        }
    }

    fn enter(&mut self, section: &'static str) {
        self.collect_unmapped();
        self.section = section;
    }

    fn page_width(&self) -> f32 {
        self.canvas.geometry().width
    }

    pub fn new_page(&mut self) -> f32 {
        self.canvas.new_page()
    }

    fn record_overflow(&mut self, overflow_mm: f32) {
        let page = self.canvas.current_page() + 1;
        log::warn!(
            "Layout overflow in {:?} on page {page}: {overflow_mm:.1}mm past the content area",
            self.section
        );
        self.warnings.push(LayoutWarning {
            section: self.section.to_string(),
            page,
            kind: WarningKind::Overflow { overflow_mm },
        });
    }

    /// Make room for an unsplittable unit of `required` height. Units taller
    /// than a whole page are placed where they are and reported.
    pub(crate) fn place(&mut self, required: f32, y: f32) -> f32 {
        if required > self.paginator.capacity() {
            let overflow = y + required - self.paginator.bottom();
            if overflow > 0.0 {
                self.record_overflow(overflow);
            }
            return y;
        }
        let y = self.paginator.ensure_space(self.canvas, required, y);
        if !self.paginator.fits(required, y) {
            self.record_overflow(y + required - self.paginator.bottom());
        }
        y
    }

    pub fn section_header(&mut self, title: &str, y: f32) -> Result<f32, Error> {
        let w = self.page_width();
        self.canvas.fill_rect(
            Rect::new(14.0, y - 5.0, w - 28.0, SECTION_HEADER_HEIGHT),
            palette::SECONDARY,
        );
        self.canvas.text(
            &title.to_uppercase(),
            LEFT_X,
            y,
            &TextStyle::bold(10.0, palette::PRIMARY),
        )?;
        Ok(y + SECTION_HEADER_HEIGHT)
    }

    /// Header for a new section, moved to the next page unless the header
    /// and the first body unit fit. Returns the cursor for the body.
    pub fn begin_section(&mut self, title: &'static str, first_unit: f32, y: f32) -> Result<f32, Error> {
        self.enter(title);
        let required = SECTION_HEADER_HEIGHT + HEADER_BODY_GAP + first_unit;
        let y = self
            .paginator
            .ensure_space(self.canvas, required.min(self.paginator.capacity()), y);
        let y = self.section_header(title, y)?;
        Ok(y + HEADER_BODY_GAP)
    }

    /// Width from the value's x to the right margin. In a two-column block
    /// the left column gets the same full width, so a long left value may
    /// run underneath the right column.
    fn value_width(&self, x_start: f32, label_width: f32) -> f32 {
        self.page_width() - x_start - label_width - self.canvas.geometry().margin_right
    }

    fn wrap_value(&self, value: &str, x_start: f32, label_width: f32) -> Result<Vec<String>, Error> {
        self.canvas.measurer().wrap(
            value,
            FontWeight::Bold,
            LABEL_SIZE,
            self.value_width(x_start, label_width),
        )
    }

    /// Height a [`label_value_row`](Self::label_value_row) call will advance.
    pub fn row_height(&self, value: &str, x_start: f32, label_width: f32) -> Result<f32, Error> {
        let lines = self.wrap_value(&display(Some(value)), x_start, label_width)?;
        Ok(lines.len() as f32 * LINE_HEIGHT + ROW_GAP)
    }

    pub fn label_value_row(
        &mut self,
        label: &str,
        value: &str,
        y: f32,
        x_start: f32,
        label_width: f32,
    ) -> Result<f32, Error> {
        self.canvas
            .text(label, x_start, y, &TextStyle::regular(LABEL_SIZE, palette::SUBTEXT))?;

        let lines = self.wrap_value(&display(Some(value)), x_start, label_width)?;
        let style = TextStyle::bold(LABEL_SIZE, palette::TEXT);
        self.canvas
            .text_lines(&lines, x_start + label_width, y, LINE_HEIGHT, &style)?;
        Ok(y + lines.len() as f32 * LINE_HEIGHT + ROW_GAP)
    }

    /// Height of a column of rows.
    pub fn column_height(&self, fields: &[Field], x_start: f32, label_width: f32) -> Result<f32, Error> {
        fields.iter().try_fold(0.0, |acc, f| {
            Ok(acc + self.row_height(&f.value, x_start, label_width)?)
        })
    }

    /// Single-column rows; each row gets its own page check.
    pub fn rows(&mut self, fields: &[Field], y: f32, x_start: f32, label_width: f32) -> Result<f32, Error> {
        let mut y = y;
        for field in fields {
            let h = self.row_height(&field.value, x_start, label_width)?;
            y = self.place(h, y);
            y = self.label_value_row(field.label, &field.value, y, x_start, label_width)?;
        }
        Ok(y)
    }

    pub fn right_column_x(&self) -> f32 {
        self.page_width() / 2.0 + 5.0
    }

    /// Height of a two-column block, before the trailing section gap.
    pub fn two_column_height(&self, left: &[Field], right: &[Field]) -> Result<f32, Error> {
        let l = self.column_height(left, LEFT_X, LABEL_WIDTH)?;
        let r = self.column_height(right, self.right_column_x(), LABEL_WIDTH)?;
        Ok(l.max(r))
    }

    /// Left and right columns laid out independently from the same start,
    /// leaving the block below whichever column ends lower. Left values wrap
    /// at the right margin, not at the right column.
    pub fn two_columns(&mut self, left: &[Field], right: &[Field], y: f32) -> Result<f32, Error> {
        let right_x = self.right_column_x();
        let mut left_y = y;
        for field in left {
            left_y = self.label_value_row(field.label, &field.value, left_y, LEFT_X, LABEL_WIDTH)?;
        }
        let mut right_y = y;
        for field in right {
            right_y = self.label_value_row(field.label, &field.value, right_y, right_x, LABEL_WIDTH)?;
        }
        let end = left_y.max(right_y);
        if end > self.paginator.bottom() {
            self.record_overflow(end - self.paginator.bottom());
        }
        Ok(end + SECTION_GAP)
    }

    /// Full-width band at the top of the first page. Returns the cursor for
    /// the status badge.
    pub fn document_header(&mut self, branding: &Branding, date: &str, time: &str) -> Result<f32, Error> {
        self.enter("Header");
        let w = self.page_width();
        self.canvas
            .fill_rect(Rect::new(0.0, 0.0, w, HEADER_BAND_HEIGHT), palette::PRIMARY);
        self.canvas
            .text(&branding.title, EDGE_INSET, 20.0, &TextStyle::bold(22.0, palette::WHITE))?;
        self.canvas.text(
            &branding.subtitle,
            EDGE_INSET,
            28.0,
            &TextStyle::regular(10.0, palette::HEADER_SUBTITLE),
        )?;
        let stamp = TextStyle::regular(9.0, palette::WHITE).aligned(Align::Right);
        self.canvas
            .text(&format!("Date: {date}"), w - EDGE_INSET, 20.0, &stamp)?;
        self.canvas
            .text(&format!("Time: {time}"), w - EDGE_INSET, 28.0, &stamp)?;
        Ok(HEADER_BAND_HEIGHT + 5.0)
    }

    /// Right-aligned status badge, plus a highlighted callout with the
    /// reason when the record was rejected.
    pub fn status_badge(&mut self, status: &Status, rejection_reason: Option<&str>, y: f32) -> Result<f32, Error> {
        self.enter("Status");
        let w = self.page_width();
        let color = status_color(status);
        let label = status.label();
        let style = TextStyle::bold(10.0, color).aligned(Align::Center);

        let text_w = self.canvas.measurer().width(&label, style.weight, style.size)?;
        let box_w = text_w + BADGE_PADDING;
        let box_x = w - box_w - EDGE_INSET;
        self.canvas.rounded_rect(
            Rect::new(box_x, y, box_w, BADGE_HEIGHT),
            2.0,
            Some(color.tint(0.1)),
            Some(color),
        );
        self.canvas.text(&label, box_x + box_w / 2.0, y + 6.5, &style)?;

        let reason = match (status, rejection_reason.map(str::trim)) {
            (Status::Rejected, Some(r)) if !r.is_empty() => r,
            _ => return Ok(y + BADGE_HEIGHT + 10.0),
        };

        let y = y + BADGE_HEIGHT + 5.0;
        let lines = self
            .canvas
            .measurer()
            .wrap(reason, FontWeight::Regular, LABEL_SIZE, w - 35.0)?;
        let block_h = (lines.len() + 1) as f32 * LINE_HEIGHT + 3.0;
        let y = self.place(block_h, y);

        self.canvas.rounded_rect(
            Rect::new(EDGE_INSET - 2.0, y - 5.0, w - 2.0 * (EDGE_INSET - 2.0), block_h + 2.0),
            1.5,
            Some(palette::REJECT_BG),
            Some(palette::REJECT_BORDER),
        );
        self.canvas.text(
            "REJECTION REASON:",
            EDGE_INSET,
            y,
            &TextStyle::bold(LABEL_SIZE, palette::REJECT_LABEL),
        )?;
        let body = TextStyle::regular(LABEL_SIZE, palette::REJECT_TEXT);
        self.canvas
            .text_lines(&lines, EDGE_INSET, y + LINE_HEIGHT, LINE_HEIGHT, &body)?;
        Ok(y + lines.len() as f32 * LINE_HEIGHT + 15.0)
    }

    /// One clickable line per attachment, in input order.
    pub fn attachment_list(&mut self, attachments: &[AttachmentLine], y: f32) -> Result<f32, Error> {
        let w = self.page_width();
        let link_style = TextStyle::regular(LABEL_SIZE, palette::LINK);
        let hint_style = TextStyle::regular(8.0, palette::SUBTEXT);
        let mut y = y;

        for item in attachments {
            y = self.place(ATTACHMENT_ROW_HEIGHT, y);
            let bullet = format!("\u{2022} {}", item.label);
            match &item.url {
                Some(url) => {
                    let text_w = self.canvas.link_region(&bullet, LEFT_X, y, url, &link_style)?;
                    self.canvas
                        .text("(Click to view)", LEFT_X + text_w + 2.0, y, &hint_style)?;
                }
                None => {
                    log::warn!("Attachment {:?} has no path; listed without a link", item.label);
                    self.canvas.text(&bullet, LEFT_X, y, &hint_style)?;
                }
            }
            if let Some(uploaded) = &item.uploaded {
                self.canvas.text(
                    &format!("Uploaded {uploaded}"),
                    w - LEFT_X,
                    y,
                    &hint_style.aligned(Align::Right),
                )?;
            }
            y += ATTACHMENT_ROW_HEIGHT;
        }
        Ok(y + 10.0)
    }

    /// Footer band on the current page.
    pub fn footer(&mut self, branding: &Branding, page: usize, pages: usize) -> Result<(), Error> {
        self.enter("Footer");
        let geometry = *self.canvas.geometry();
        let (w, footer_y) = (geometry.width, geometry.height - FOOTER_HEIGHT);
        self.canvas
            .fill_rect(Rect::new(0.0, footer_y, w, FOOTER_HEIGHT), palette::FOOTER_BG);
        self.canvas
            .line((0.0, footer_y), (w, footer_y), palette::PRIMARY, 0.5);

        let style = TextStyle::regular(8.0, palette::SUBTEXT).aligned(Align::Center);
        self.canvas
            .text(&branding.footer_notice, w / 2.0, footer_y + 8.0, &style)?;
        self.canvas
            .text(&branding.system_name, w / 2.0, footer_y + 13.0, &style)?;
        self.canvas
            .text(&format!("Page {page} of {pages}"), w / 2.0, footer_y + 18.0, &style)?;
        Ok(())
    }
}

pub fn status_color(status: &Status) -> Rgb {
    match status {
        Status::Pending => Rgb(245, 158, 11),
        Status::Completed => Rgb(59, 130, 246),
        Status::Verified => Rgb(16, 185, 129),
        Status::Rejected => Rgb(220, 38, 38),
        Status::Other(_) => Rgb(107, 114, 128),
    }
}
