pub mod canvas;
pub mod layout;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Datelike, Local, Timelike};
use pdf_writer::{Content, Filter, Name, Pdf, Rect as PdfRect, Ref, Str, TextStr};

use crate::error::Error;
use crate::fonts::{FontBook, FontEntry, FontWeight, register_font};

use canvas::{Canvas, DrawOp, Rect};
use layout::PT_TO_MM;

/// Millimetres to points.
const MM_TO_PT: f32 = 1.0 / PT_TO_MM;

/// Bézier handle ratio for quarter circles.
const KAPPA: f32 = 0.552_284_8;

/// A finished receipt document.
#[derive(Clone, Debug)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub filename: String,
}

pub struct DocumentMeta<'a> {
    pub title: &'a str,
    pub generated_at: DateTime<Local>,
}

static LAST_TOKEN: AtomicI64 = AtomicI64::new(0);

/// `Receipt-{millis}.pdf`, strictly increasing within the process even when
/// called twice in the same millisecond.
pub fn receipt_filename(now: DateTime<Local>) -> String {
    let millis = now.timestamp_millis();
    let mut prev = LAST_TOKEN.load(Ordering::Relaxed);
    let token = loop {
        let next = millis.max(prev + 1);
        match LAST_TOKEN.compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => break next,
            Err(actual) => prev = actual,
        }
    };
    format!("Receipt-{token}.pdf")
}

/// Flips a top-down millimetre y into bottom-up PDF points.
struct PageSpace {
    height_mm: f32,
}

impl PageSpace {
    fn x(&self, x_mm: f32) -> f32 {
        x_mm * MM_TO_PT
    }

    fn y(&self, y_mm: f32) -> f32 {
        (self.height_mm - y_mm) * MM_TO_PT
    }

    fn rect(&self, r: &Rect) -> (f32, f32, f32, f32) {
        (
            self.x(r.x),
            self.y(r.bottom()),
            r.width * MM_TO_PT,
            r.height * MM_TO_PT,
        )
    }
}

fn rounded_rect_path(content: &mut Content, x: f32, y: f32, w: f32, h: f32, r: f32) {
    if r <= 0.0 {
        content.rect(x, y, w, h);
        return;
    }
    let k = r * KAPPA;
    content.move_to(x + r, y);
    content.line_to(x + w - r, y);
    content.cubic_to(x + w - r + k, y, x + w, y + r - k, x + w, y + r);
    content.line_to(x + w, y + h - r);
    content.cubic_to(x + w, y + h - r + k, x + w - r + k, y + h, x + w - r, y + h);
    content.line_to(x + r, y + h);
    content.cubic_to(x + r - k, y + h, x, y + h - r + k, x, y + h - r);
    content.line_to(x, y + r);
    content.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    content.close_path();
}

fn render_page(
    content: &mut Content,
    ops: &[DrawOp],
    space: &PageSpace,
    fonts: &HashMap<FontWeight, FontEntry>,
) -> Result<(), Error> {
    for op in ops {
        match op {
            DrawOp::FillRect { rect, color } => {
                let (x, y, w, h) = space.rect(rect);
                let (r, g, b) = color.unit();
                content.set_fill_rgb(r, g, b);
                content.rect(x, y, w, h);
                content.fill_nonzero();
            }
            DrawOp::RoundedRect {
                rect,
                radius,
                fill,
                stroke,
            } => {
                let (x, y, w, h) = space.rect(rect);
                content.save_state();
                if let Some(c) = fill {
                    let (r, g, b) = c.unit();
                    content.set_fill_rgb(r, g, b);
                }
                if let Some(c) = stroke {
                    let (r, g, b) = c.unit();
                    content.set_stroke_rgb(r, g, b);
                    content.set_line_width(0.5);
                }
                rounded_rect_path(content, x, y, w, h, radius * MM_TO_PT);
                match (fill.is_some(), stroke.is_some()) {
                    (true, true) => content.fill_nonzero_and_stroke(),
                    (true, false) => content.fill_nonzero(),
                    _ => content.stroke(),
                };
                content.restore_state();
            }
            DrawOp::Line {
                from,
                to,
                color,
                width,
            } => {
                let (r, g, b) = color.unit();
                content.save_state();
                content.set_stroke_rgb(r, g, b);
                content.set_line_width(width * MM_TO_PT);
                content.move_to(space.x(from.0), space.y(from.1));
                content.line_to(space.x(to.0), space.y(to.1));
                content.stroke();
                content.restore_state();
            }
            DrawOp::Text { text, x, y, style, .. } => {
                let entry = fonts.get(&style.weight).ok_or_else(|| {
                    Error::serialization(format!("no font registered for {:?}", style.weight))
                })?;
                let (r, g, b) = style.color.unit();
                content.set_fill_rgb(r, g, b);
                content.begin_text();
                content.set_font(Name(entry.pdf_name.as_bytes()), style.size);
                content.next_line(space.x(*x), space.y(*y));
                content.show(Str(&entry.encode(text)));
                content.end_text();
            }
            DrawOp::Link { .. } => {}
        }
    }
    Ok(())
}

/// Serialize a laid-out canvas into PDF bytes.
pub fn export(canvas: &Canvas, meta: &DocumentMeta) -> Result<Artifact, Error> {
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();

    // Phase 1: fonts, subset to the characters each weight actually shows
    let mut used_chars: HashMap<FontWeight, HashSet<char>> = HashMap::new();
    for page in canvas.pages() {
        for op in &page.ops {
            if let DrawOp::Text { text, style, .. } = op {
                used_chars.entry(style.weight).or_default().extend(text.chars());
            }
        }
    }

    let book: &FontBook = canvas.measurer().fonts();
    let mut fonts: HashMap<FontWeight, FontEntry> = HashMap::new();
    let mut font_order: Vec<FontWeight> = Vec::new();
    for weight in [FontWeight::Regular, FontWeight::Bold] {
        let Some(chars) = used_chars.get(&weight) else {
            continue;
        };
        let pdf_name = format!("F{}", font_order.len() + 1);
        let entry = register_font(&mut pdf, book.face(weight), pdf_name, &mut alloc, chars)?;
        fonts.insert(weight, entry);
        font_order.push(weight);
    }

    let t_fonts = t0.elapsed();

    // Phase 2: content streams and link annotations
    let space = PageSpace {
        height_mm: canvas.geometry().height,
    };
    let n = canvas.page_count();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    let mut page_annot_refs: Vec<Vec<Ref>> = Vec::with_capacity(n);
    for (i, page) in canvas.pages().iter().enumerate() {
        let mut content = Content::new();
        render_page(&mut content, &page.ops, &space, &fonts)?;
        let raw = content.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed)
            .filter(Filter::FlateDecode);

        let annots = page
            .links()
            .map(|(rect, url)| {
                let annot_ref = alloc();
                let (x, y, w, h) = space.rect(rect);
                let mut annot = pdf.annotation(annot_ref);
                annot
                    .subtype(pdf_writer::types::AnnotationType::Link)
                    .rect(PdfRect::new(x, y, x + w, y + h))
                    .border(0.0, 0.0, 0.0, None);
                annot
                    .action()
                    .action_type(pdf_writer::types::ActionType::Uri)
                    .uri(Str(url.as_bytes()));
                annot_ref
            })
            .collect();
        page_annot_refs.push(annots);
    }

    let t_content = t0.elapsed();

    // Phase 3: document structure
    let page_count = i32::try_from(n)
        .map_err(|_| Error::serialization(format!("too many pages ({n})")))?;
    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(page_count);

    let width_pt = canvas.geometry().width * MM_TO_PT;
    let height_pt = canvas.geometry().height * MM_TO_PT;
    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(PdfRect::new(0.0, 0.0, width_pt, height_pt))
            .parent(pages_id)
            .contents(content_ids[i]);
        if !page_annot_refs[i].is_empty() {
            page.annotations(page_annot_refs[i].iter().copied());
        }
        let mut resources = page.resources();
        let mut font_dict = resources.fonts();
        for weight in &font_order {
            let entry = &fonts[weight];
            font_dict.pair(Name(entry.pdf_name.as_bytes()), entry.font_ref);
        }
    }

    let at = meta.generated_at;
    let created = pdf_writer::Date::new(at.year().clamp(0, 9999) as u16)
        .month(at.month() as u8)
        .day(at.day() as u8)
        .hour(at.hour() as u8)
        .minute(at.minute() as u8)
        .second(at.second() as u8);
    pdf.document_info(info_id)
        .title(TextStr(meta.title))
        .producer(TextStr(concat!("burial-receipt ", env!("CARGO_PKG_VERSION"))))
        .creation_date(created);

    let bytes = pdf.finish();

    log::info!(
        "Export phases: fonts={:.1}ms, content={:.1}ms, assembly={:.1}ms ({} pages, {} bytes)",
        t_fonts.as_secs_f64() * 1000.0,
        (t_content - t_fonts).as_secs_f64() * 1000.0,
        (t0.elapsed() - t_content).as_secs_f64() * 1000.0,
        n,
        bytes.len(),
    );

    Ok(Artifact {
        bytes,
        filename: receipt_filename(meta.generated_at),
    })
}
