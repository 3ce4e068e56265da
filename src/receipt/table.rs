//! Services table: one row per named service, then a divider and the
//! total of the listed rows.

use crate::error::Error;
use crate::fonts::FontWeight;
use crate::model::{ServiceSlot, services_total};
use crate::pdf::canvas::{Rect, TextStyle};

use super::sections::{LEFT_X, LINE_HEIGHT, SectionRenderer, palette};

const TYPE_X: f32 = 20.0;
const DETAILS_X: f32 = 70.0;
/// Distance of the amount column from the right page edge.
const AMOUNT_INSET: f32 = 40.0;
const HEADER_STRIP_HEIGHT: f32 = 6.0;
const HEADER_ADVANCE: f32 = 10.0;
pub const ROW_HEIGHT: f32 = 7.0;
const TOTAL_BLOCK_HEIGHT: f32 = 8.0;
const TOTAL_ADVANCE: f32 = 15.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableOutcome {
    pub cursor: f32,
    pub total: i64,
}

/// Digits grouped in threes with commas: `1234567` → `1,234,567`.
pub fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

impl SectionRenderer<'_> {
    fn details_width(&self) -> f32 {
        self.canvas().geometry().width - AMOUNT_INSET - DETAILS_X - 4.0
    }

    fn service_lines(&self, name: &str) -> Result<Vec<String>, Error> {
        self.canvas()
            .measurer()
            .wrap(name, FontWeight::Regular, 9.0, self.details_width())
    }

    /// Height of the header strip plus the first row, for the section check.
    pub fn services_table_lead(&self, slots: &[ServiceSlot]) -> Result<f32, Error> {
        let first = match slots.iter().find_map(|s| s.name.as_deref()) {
            Some(name) => self.service_row_height(name)?,
            None => TOTAL_BLOCK_HEIGHT,
        };
        Ok(HEADER_ADVANCE + first)
    }

    fn service_row_height(&self, name: &str) -> Result<f32, Error> {
        let lines = self.service_lines(name)?.len();
        Ok(ROW_HEIGHT.max(lines as f32 * LINE_HEIGHT + 2.0))
    }

    fn table_header(&mut self, y: f32) -> Result<f32, Error> {
        let w = self.canvas().geometry().width;
        let canvas = self.canvas_mut();
        canvas.fill_rect(
            Rect::new(LEFT_X, y, w - 2.0 * LEFT_X, HEADER_STRIP_HEIGHT),
            palette::TABLE_HEADER,
        );
        let style = TextStyle::bold(8.0, palette::SUBTEXT);
        canvas.text("SERVICE TYPE", TYPE_X, y + 4.0, &style)?;
        canvas.text("DETAILS", DETAILS_X, y + 4.0, &style)?;
        canvas.text("AMOUNT", w - AMOUNT_INSET, y + 4.0, &style)?;
        Ok(y + HEADER_ADVANCE)
    }

    /// Draw the rows for slots with a service name, in slot order. The
    /// header strip is repeated when rows continue on a new page.
    pub fn services_table(&mut self, slots: &[ServiceSlot], currency: &str, y: f32) -> Result<TableOutcome, Error> {
        let w = self.canvas().geometry().width;
        let amount_x = w - AMOUNT_INSET;
        let row_style = TextStyle::regular(9.0, palette::TEXT);

        let mut y = self.table_header(y)?;
        for slot in slots {
            let Some(name) = slot.name.as_deref() else {
                continue;
            };
            let lines = self.service_lines(name)?;
            let height = self.service_row_height(name)?;
            let placed = self.place(height, y);
            if placed != y {
                y = self.table_header(placed)?;
            }

            let canvas = self.canvas_mut();
            canvas.text(slot.kind.label(), TYPE_X, y, &row_style)?;
            canvas.text_lines(&lines, DETAILS_X, y, LINE_HEIGHT, &row_style)?;
            canvas.text(
                &format!("{currency} {}", format_amount(slot.cost)),
                amount_x,
                y,
                &row_style,
            )?;
            y += height;
        }

        let total = services_total(slots);
        y = self.place(TOTAL_BLOCK_HEIGHT, y);
        let canvas = self.canvas_mut();
        canvas.line(
            (LEFT_X, y - 2.0),
            (w - LEFT_X, y - 2.0),
            palette::BORDER,
            0.2,
        );
        y += 2.0;
        let bold = TextStyle::bold(9.0, palette::TEXT);
        canvas.text("TOTAL PAID", DETAILS_X, y + 4.0, &bold)?;
        canvas.text(
            &format!("{currency} {}", format_amount(total)),
            amount_x,
            y + 4.0,
            &bold,
        )?;

        Ok(TableOutcome {
            cursor: y + TOTAL_ADVANCE,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::format_amount;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(999), "999");
        assert_eq!(format_amount(1000), "1,000");
        assert_eq!(format_amount(1234567), "1,234,567");
        assert_eq!(format_amount(-2500), "-2,500");
        assert_eq!(format_amount(i64::MIN), "-9,223,372,036,854,775,808");
    }
}
