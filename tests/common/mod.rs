#![allow(dead_code)]

use burial_receipt::fonts::FontBook;
use burial_receipt::pdf::canvas::{Canvas, PageGeometry};
use burial_receipt::pdf::layout::TextMeasurer;
use burial_receipt::{ReceiptOptions, Record};
use chrono::{Local, TimeZone};
use serde_json::json;

/// Formatter that prints record dates unchanged.
pub fn echo_dates(raw: &str) -> String {
    raw.to_string()
}

pub fn measurer() -> TextMeasurer {
    TextMeasurer::new(FontBook::helvetica())
}

pub fn canvas() -> Canvas {
    Canvas::new(PageGeometry::a4(), measurer())
}

/// Default options with a fixed generation time and the builtin fonts.
pub fn options() -> ReceiptOptions {
    ReceiptOptions {
        generated_at: Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).single(),
        ..ReceiptOptions::default()
    }
}

/// A complete record: every optional section present, two attachments,
/// services totalling 6000.
pub fn sample_record() -> Record {
    Record::from_value(json!({
        "firstName": "Amina",
        "middleName": "Wanjiru",
        "lastName": "Otieno",
        "idPassportNo": "12345678",
        "gender": "Female",
        "age": 67,
        "ageCategory": "Adult",
        "dateOfDeath": "2024-02-28",
        "dateOfBurial": "2024-03-04",
        "nextOfKinName": "Peter Otieno",
        "nextOfKinRelationship": "Son",
        "nextOfKinContact": "0712 345 678",
        "burialLocation": "Lang'ata Cemetery, Block C",
        "primaryService": "Burial plot",
        "amountPaidBurial": 5000,
        "secondaryService": "Tent hire",
        "amountPaidSecondary": "1,000",
        "tertiaryService": "",
        "amountPaidTertiary": 999,
        "receiptNo": "RCPT-0042",
        "mpesaRefNo": "QWE123RTY",
        "burialPermitNumber": "BP-7781",
        "burialPermitDate": "2024-03-01",
        "burialPermitIssuedBy": "Registrar of Deaths",
        "burialPermitIssuedTo": "Peter Otieno",
        "applicantName": "Peter Otieno",
        "applicantEmail": "peter@example.com",
        "applicantPhone": "0712 345 678",
        "status": "Verified",
        "attachments": [
            { "filename": "death-certificate.pdf", "path": "uploads/dc.pdf", "uploadedAt": "2024-03-02" },
            { "originalName": "permit.jpg", "url": "https://files.example.com/permit.jpg" }
        ]
    }))
    .unwrap()
}

/// Every text drawn on every page, in draw order.
pub fn all_texts(canvas: &Canvas) -> Vec<String> {
    canvas
        .pages()
        .iter()
        .flat_map(|p| p.texts().map(|(t, _, _)| t.to_string()))
        .collect()
}

/// First occurrence of `needle`: (page index, left x, baseline y).
pub fn find_text(canvas: &Canvas, needle: &str) -> Option<(usize, f32, f32)> {
    canvas.pages().iter().enumerate().find_map(|(i, page)| {
        page.texts()
            .find(|(t, _, _)| *t == needle)
            .map(|(_, x, y)| (i, x, y))
    })
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}
