mod common;

use burial_receipt::fonts::FontWeight;
use burial_receipt::{
    Error, Record, SectionId, WarningKind, generate_receipt, generate_receipt_from_json,
    layout_receipt, write_receipt,
};
use lopdf::Document;
use serde_json::json;

use common::{all_texts, approx, echo_dates, find_text, measurer, options, sample_record};

fn link_uris(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    let mut uris = Vec::new();
    for (_, page_id) in doc.get_pages() {
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let Ok(annots) = page.get(b"Annots").and_then(|a| a.as_array()) else {
            continue;
        };
        for annot in annots {
            let annot = doc
                .get_object(annot.as_reference().unwrap())
                .unwrap()
                .as_dict()
                .unwrap();
            let action = annot.get(b"A").unwrap().as_dict().unwrap();
            let uri = action.get(b"URI").unwrap().as_str().unwrap();
            uris.push(String::from_utf8_lossy(uri).into_owned());
        }
    }
    uris
}

fn texts_for(record: &Record) -> Vec<String> {
    let layout = layout_receipt(record, &echo_dates, &options()).unwrap();
    all_texts(&layout.canvas)
}

#[test]
fn full_record_renders_every_section() {
    let receipt = generate_receipt(&sample_record(), &echo_dates, &options()).unwrap();
    assert_eq!(
        receipt.sections,
        vec![
            SectionId::Header,
            SectionId::StatusBadge,
            SectionId::DeceasedInfo,
            SectionId::NextOfKin,
            SectionId::BurialServices,
            SectionId::PaymentVerification,
            SectionId::BurialPermit,
            SectionId::ApplicantDetails,
            SectionId::Attachments,
            SectionId::Footer,
        ]
    );
    assert_eq!(receipt.total, 6000);
    assert!(receipt.warnings.is_empty());
    assert!(receipt.bytes.starts_with(b"%PDF"));

    let doc = Document::load_mem(&receipt.bytes).unwrap();
    assert_eq!(doc.get_pages().len(), receipt.page_count);
}

#[test]
fn empty_record_keeps_the_fixed_sections_only() {
    let layout = layout_receipt(&Record::new(), &echo_dates, &options()).unwrap();
    assert_eq!(
        layout.sections,
        vec![
            SectionId::Header,
            SectionId::StatusBadge,
            SectionId::DeceasedInfo,
            SectionId::NextOfKin,
            SectionId::BurialServices,
            SectionId::Footer,
        ]
    );
    assert_eq!(layout.total, 0);
    assert_eq!(layout.canvas.page_count(), 1);

    let texts = all_texts(&layout.canvas);
    assert!(texts.contains(&"PENDING VERIFICATION".to_string()));
    assert!(texts.contains(&"-".to_string()));
    assert!(texts.contains(&"Page 1 of 1".to_string()));
    assert!(!texts.contains(&"PAYMENT VERIFICATION".to_string()));
    assert!(!texts.contains(&"ATTACHMENTS".to_string()));
}

#[test]
fn payment_section_accepts_the_receipt_number_alias() {
    let record = Record::new().with("receiptNumber", "RCPT-9");
    let layout = layout_receipt(&record, &echo_dates, &options()).unwrap();
    assert!(layout.sections.contains(&SectionId::PaymentVerification));
    assert!(!layout.sections.contains(&SectionId::BurialPermit));

    let texts = all_texts(&layout.canvas);
    assert!(texts.contains(&"RCPT-9".to_string()));
    assert!(texts.contains(&"M-Pesa Ref".to_string()));
}

#[test]
fn labels_are_drawn_without_a_trailing_colon() {
    let texts = texts_for(&sample_record());
    for label in ["Full Name", "Date of Burial", "Relationship", "Receipt No", "Issued To", "Email"] {
        assert!(texts.contains(&label.to_string()), "missing {label:?}");
        assert!(!texts.contains(&format!("{label}:")), "{label:?} has a colon");
    }
}

#[test]
fn wrapped_deceased_name_pushes_next_of_kin_below_the_deeper_column() {
    let m = measurer();
    let middle = (1..40)
        .map(|n| vec!["Wanjiru"; n].join(" "))
        .find(|middle| {
            m.wrap(&format!("Amina {middle} Otieno"), FontWeight::Bold, 9.0, 143.0)
                .unwrap()
                .len()
                == 3
        })
        .unwrap();
    let mut record = sample_record();
    record.set("middleName", middle.as_str());

    let layout = layout_receipt(&record, &echo_dates, &options()).unwrap();
    // Deceased body starts at 78: 3 wrapped lines + 2 single rows on the left
    // (34mm) against 3 single rows on the right (24mm), then the section gap.
    let (page, _, baseline) = find_text(&layout.canvas, "NEXT OF KIN").unwrap();
    assert_eq!(page, 0);
    assert!(approx(baseline, 78.0 + (3.0 * 5.0 + 3.0) + 2.0 * 8.0 + 8.0), "{baseline}");
}

#[test]
fn characters_without_a_glyph_are_reported() {
    let mut record = sample_record();
    record.set("firstName", "Łukasz");
    record.set("lastName", "张伟");
    let receipt = generate_receipt(&record, &echo_dates, &options()).unwrap();

    assert_eq!(receipt.warnings.len(), 1, "{:?}", receipt.warnings);
    let warning = &receipt.warnings[0];
    assert_eq!(warning.section, "Deceased Information");
    assert_eq!(warning.page, 1);
    assert_eq!(
        warning.kind,
        WarningKind::MissingGlyphs {
            text: "Łukasz Wanjiru 张伟".to_string(),
            chars: vec!['Ł', '张', '伟'],
        }
    );
}

#[test]
fn applicant_falls_back_to_submitter_fields() {
    let record = Record::new()
        .with("submitterName", "Jane Doe")
        .with("submitterEmail", "jane@example.com")
        .with("applicantMobile", "0700 000 000");
    let texts = texts_for(&record);
    assert!(texts.contains(&"APPLICANT DETAILS".to_string()));
    assert!(texts.contains(&"Jane Doe".to_string()));
    assert!(texts.contains(&"jane@example.com".to_string()));
    assert!(texts.contains(&"0700 000 000".to_string()));
}

#[test]
fn deceased_details_use_the_date_formatter() {
    let record = sample_record();
    let dates = |raw: &str| format!("on {raw}");
    let layout = layout_receipt(&record, &dates, &options()).unwrap();
    let texts = all_texts(&layout.canvas);
    assert!(texts.contains(&"Amina Wanjiru Otieno".to_string()));
    assert!(texts.contains(&"67 years (Adult)".to_string()));
    assert!(texts.contains(&"on 2024-02-28".to_string()));
    assert!(texts.contains(&"on 2024-03-01".to_string()));
}

#[test]
fn header_shows_generation_time() {
    let texts = texts_for(&sample_record());
    assert!(texts.contains(&"BURIAL RECORD".to_string()));
    assert!(texts.contains(&"Date: 3/5/2024".to_string()));
    assert!(texts.contains(&"Time: 2:07:09 PM".to_string()));
    assert!(texts.contains(&"VERIFIED".to_string()));
}

#[test]
fn next_of_kin_id_row_only_when_present() {
    let count = |texts: &[String]| texts.iter().filter(|t| *t == "ID/Passport").count();

    let without = texts_for(&sample_record());
    assert_eq!(count(&without), 1);

    let mut record = sample_record();
    record.set("nextOfKinIdPassport", "A1234567");
    let with = texts_for(&record);
    assert_eq!(count(&with), 2);
    assert!(with.contains(&"A1234567".to_string()));
}

#[test]
fn rejected_record_shows_the_reason() {
    let record = Record::new()
        .with("status", "Rejected")
        .with("rejectionReason", "Permit number does not match the registry");
    let texts = texts_for(&record);
    assert!(texts.contains(&"REJECTED".to_string()));
    assert!(texts.contains(&"REJECTION REASON:".to_string()));
    assert!(texts.contains(&"Permit number does not match the registry".to_string()));
}

#[test]
fn two_attachments_give_two_links_in_order() {
    let receipt = generate_receipt(&sample_record(), &echo_dates, &options()).unwrap();
    assert_eq!(
        link_uris(&receipt.bytes),
        vec![
            "http://localhost:5000/uploads/dc.pdf".to_string(),
            "https://files.example.com/permit.jpg".to_string(),
        ]
    );
}

#[test]
fn base_url_is_configurable() {
    let mut opts = options();
    opts.base_url = "https://records.example.org/".to_string();
    let record = Record::new().with("attachments", json!(["/uploads/a.pdf"]));
    let receipt = generate_receipt(&record, &echo_dates, &opts).unwrap();
    assert_eq!(
        link_uris(&receipt.bytes),
        vec!["https://records.example.org/uploads/a.pdf".to_string()]
    );
    let layout = layout_receipt(&record, &echo_dates, &opts).unwrap();
    assert!(all_texts(&layout.canvas).contains(&"\u{2022} Document 1".to_string()));
}

#[test]
fn filenames_are_unique_and_increasing() {
    let record = Record::new();
    let a = generate_receipt(&record, &echo_dates, &options()).unwrap();
    let b = generate_receipt(&record, &echo_dates, &options()).unwrap();

    let token = |name: &str| -> i64 {
        name.strip_prefix("Receipt-")
            .and_then(|s| s.strip_suffix(".pdf"))
            .unwrap()
            .parse()
            .unwrap()
    };
    assert!(token(&b.filename) > token(&a.filename));
}

#[test]
fn non_object_json_is_rejected() {
    for input in ["[1, 2]", "not json", "\"text\""] {
        let err = generate_receipt_from_json(input, &echo_dates, &options()).unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { .. }), "{input}: {err}");
    }
}

#[test]
fn json_input_round_trips_into_a_receipt() {
    let json = json!({ "firstName": "Amina", "primaryService": "Burial plot", "amountPaidBurial": "2,500.75" });
    let receipt = generate_receipt_from_json(&json.to_string(), &echo_dates, &options()).unwrap();
    assert_eq!(receipt.total, 2500);
}

#[test]
fn write_receipt_creates_the_file() {
    let dir = std::env::temp_dir().join(format!("burial-receipt-{}", std::process::id()));
    let path = write_receipt(&sample_record(), &echo_dates, &options(), &dir).unwrap();
    assert!(path.exists());
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("Receipt-") && name.ends_with(".pdf"));
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    std::fs::remove_dir_all(&dir).unwrap();
}
