mod common;

use burial_receipt::fonts::{FontBook, FontWeight, installed_families};
use burial_receipt::generate_receipt;
use lopdf::Document;

use common::{echo_dates, options, sample_record};

const UNICODE_FAMILIES: [&str; 4] = ["dejavu sans", "liberation sans", "noto sans", "arial"];

/// A common Unicode TrueType family from `RECEIPT_FONT_DIRS` or the system
/// font directories, if one is installed.
fn unicode_family() -> Option<String> {
    let installed = installed_families();
    UNICODE_FAMILIES
        .iter()
        .find(|family| installed.iter().any(|i| i == *family))
        .map(|family| family.to_string())
}

#[test]
fn installed_truetype_family_is_embedded_as_type0() {
    let Some(family) = unicode_family() else {
        println!("  [SKIP] none of {UNICODE_FAMILIES:?} is installed");
        return;
    };
    let mut opts = options();
    opts.font_family = Some(family.clone());
    let receipt = generate_receipt(&sample_record(), &echo_dates, &opts).unwrap();
    let doc = Document::load_mem(&receipt.bytes).unwrap();
    assert_eq!(doc.get_pages().len(), receipt.page_count);

    let type0: Vec<_> = doc
        .objects
        .values()
        .filter_map(|obj| obj.as_dict().ok())
        .filter(|dict| {
            dict.get(b"Subtype")
                .and_then(|s| s.as_name())
                .is_ok_and(|name| name == b"Type0")
        })
        .collect();
    assert!(!type0.is_empty(), "no Type0 font embedded for {family}");

    for font in type0 {
        let cmap = font.get(b"ToUnicode").and_then(|r| r.as_reference()).unwrap();
        let stream = doc.get_object(cmap).unwrap().as_stream().unwrap();
        assert!(!stream.content.is_empty());
        assert!(font.get(b"DescendantFonts").is_ok());
    }
}

#[test]
fn truetype_face_covers_latin_extended() {
    let Some(family) = unicode_family() else {
        println!("  [SKIP] none of {UNICODE_FAMILIES:?} is installed");
        return;
    };
    let fonts = FontBook::resolve(Some(&family)).unwrap();
    let face = fonts.face(FontWeight::Regular);
    assert!(!face.is_builtin());
    assert!(face.missing_chars("Łukasz Łódź").is_empty());
    assert!(face.text_width_1000("Łukasz") > 0.0);
}
