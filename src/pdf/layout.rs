use crate::error::Error;
use crate::fonts::{FontBook, FontWeight};

/// Points to millimetres.
pub const PT_TO_MM: f32 = 25.4 / 72.0;

/// Measures and wraps text against the receipt's fonts. Font sizes are in
/// points, widths in millimetres.
#[derive(Clone)]
pub struct TextMeasurer {
    fonts: FontBook,
}

fn check_size(font_size: f32) -> Result<(), Error> {
    if font_size.is_finite() && font_size > 0.0 {
        Ok(())
    } else {
        Err(Error::Measurement(format!("invalid font size {font_size}")))
    }
}

impl TextMeasurer {
    pub fn new(fonts: FontBook) -> Self {
        Self { fonts }
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    pub fn width(&self, text: &str, weight: FontWeight, font_size: f32) -> Result<f32, Error> {
        check_size(font_size)?;
        Ok(self.raw_width(text, weight, font_size))
    }

    fn raw_width(&self, text: &str, weight: FontWeight, font_size: f32) -> f32 {
        self.fonts.face(weight).text_width_1000(text) * font_size / 1000.0 * PT_TO_MM
    }

    /// Greedy word wrap into lines no wider than `max_width`.
    ///
    /// Words are never split: a word that is wider than `max_width` on its
    /// own gets a line to itself. Runs of whitespace collapse to one space,
    /// `\n` forces a break, and empty input yields a single empty line.
    pub fn wrap(
        &self,
        text: &str,
        weight: FontWeight,
        font_size: f32,
        max_width: f32,
    ) -> Result<Vec<String>, Error> {
        check_size(font_size)?;
        if !(max_width.is_finite() && max_width > 0.0) {
            return Err(Error::Measurement(format!("invalid wrap width {max_width}")));
        }

        let space_w = self.raw_width(" ", weight, font_size);
        let mut lines: Vec<String> = Vec::new();

        for paragraph in text.split('\n') {
            let mut current = String::new();
            let mut current_w: f32 = 0.0;

            for word in paragraph.split_whitespace() {
                let ww = self.raw_width(word, weight, font_size);
                if current.is_empty() {
                    current.push_str(word);
                    current_w = ww;
                } else if current_w + space_w + ww <= max_width {
                    current.push(' ');
                    current.push_str(word);
                    current_w += space_w + ww;
                } else {
                    lines.push(std::mem::take(&mut current));
                    current.push_str(word);
                    current_w = ww;
                }
            }
            lines.push(current);
        }

        // Trailing newlines should not add blank lines at the bottom.
        while lines.len() > 1 && lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        Ok(lines)
    }
}
