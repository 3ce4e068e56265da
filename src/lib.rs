pub mod config;
pub mod dates;
mod error;
pub mod fonts;
pub mod model;
pub mod pdf;
pub mod receipt;

pub use config::{Branding, ReceiptOptions};
pub use dates::{DateFormatter, ShortDateFormatter};
pub use error::Error;
pub use model::Record;
pub use receipt::sections::{LayoutWarning, WarningKind};
pub use receipt::{ReceiptLayout, SectionId};

use std::path::{Path, PathBuf};
use std::time::Instant;

use fonts::FontBook;
use model::ReceiptData;
use pdf::canvas::Canvas;
use pdf::layout::TextMeasurer;
use pdf::{DocumentMeta, export};
use receipt::ReceiptAssembler;

/// A generated receipt document.
#[derive(Clone, Debug)]
pub struct Receipt {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub page_count: usize,
    pub sections: Vec<SectionId>,
    /// Sum of the listed service costs.
    pub total: i64,
    pub warnings: Vec<LayoutWarning>,
}

/// Lay out a record without serializing it.
pub fn layout_receipt(
    record: &Record,
    dates: &dyn DateFormatter,
    options: &ReceiptOptions,
) -> Result<ReceiptLayout, Error> {
    let data = ReceiptData::from_record(record, dates);
    let fonts = FontBook::resolve(options.font_family.as_deref())?;
    let canvas = Canvas::new(options.geometry, TextMeasurer::new(fonts));
    ReceiptAssembler::new(&data, options).assemble(canvas)
}

pub fn generate_receipt(
    record: &Record,
    dates: &dyn DateFormatter,
    options: &ReceiptOptions,
) -> Result<Receipt, Error> {
    let t0 = Instant::now();

    let layout = layout_receipt(record, dates, options)?;
    let t_layout = t0.elapsed();

    let meta = DocumentMeta {
        title: &options.branding.title,
        generated_at: options.generated_at(),
    };
    let artifact = export(&layout.canvas, &meta)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: layout={:.1}ms, export={:.1}ms, total={:.1}ms ({} pages, {} warnings)",
        t_layout.as_secs_f64() * 1000.0,
        (t_total - t_layout).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        layout.canvas.page_count(),
        layout.warnings.len(),
    );

    Ok(Receipt {
        bytes: artifact.bytes,
        filename: artifact.filename,
        page_count: layout.canvas.page_count(),
        sections: layout.sections,
        total: layout.total,
        warnings: layout.warnings,
    })
}

pub fn generate_receipt_from_json(
    json: &str,
    dates: &dyn DateFormatter,
    options: &ReceiptOptions,
) -> Result<Receipt, Error> {
    let record = Record::from_json(json)?;
    generate_receipt(&record, dates, options)
}

/// Generate a receipt and write it into `out_dir` under its generated
/// filename. Returns the path written.
pub fn write_receipt(
    record: &Record,
    dates: &dyn DateFormatter,
    options: &ReceiptOptions,
    out_dir: &Path,
) -> Result<PathBuf, Error> {
    let receipt = generate_receipt(record, dates, options)?;
    std::fs::create_dir_all(out_dir).map_err(Error::Io)?;
    let path = out_dir.join(&receipt.filename);
    std::fs::write(&path, &receipt.bytes).map_err(Error::Io)?;
    log::info!("Wrote {} ({} bytes)", path.display(), receipt.bytes.len());
    Ok(path)
}
