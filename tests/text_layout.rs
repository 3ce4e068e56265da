mod common;

use burial_receipt::Error;
use burial_receipt::fonts::{FontBook, FontWeight};
use burial_receipt::pdf::layout::PT_TO_MM;

use common::{approx, measurer};

#[test]
fn width_uses_helvetica_metrics() {
    let m = measurer();
    // 'a' is 556 units in Helvetica.
    let w = m.width("a", FontWeight::Regular, 10.0).unwrap();
    assert!(approx(w, 5.56 * PT_TO_MM));
    assert_eq!(m.width("", FontWeight::Regular, 10.0).unwrap(), 0.0);

    let aa = m.width("aa", FontWeight::Regular, 10.0).unwrap();
    assert!(approx(aa, 2.0 * w));
    let double = m.width("a", FontWeight::Regular, 20.0).unwrap();
    assert!(approx(double, 2.0 * w));
}

#[test]
fn bold_is_wider_than_regular() {
    let m = measurer();
    let regular = m.width("Hello world", FontWeight::Regular, 9.0).unwrap();
    let bold = m.width("Hello world", FontWeight::Bold, 9.0).unwrap();
    assert!(bold > regular);
}

#[test]
fn empty_input_wraps_to_one_empty_line() {
    let lines = measurer().wrap("", FontWeight::Regular, 9.0, 50.0).unwrap();
    assert_eq!(lines, vec![String::new()]);
}

#[test]
fn short_text_stays_on_one_line() {
    let lines = measurer()
        .wrap("Lang'ata Cemetery", FontWeight::Bold, 9.0, 143.0)
        .unwrap();
    assert_eq!(lines, vec!["Lang'ata Cemetery".to_string()]);
}

#[test]
fn overlong_word_gets_its_own_line_unsplit() {
    let m = measurer();
    let narrow = m.width("a", FontWeight::Regular, 9.0).unwrap() + 0.1;
    let lines = m
        .wrap("a Supercalifragilistic b", FontWeight::Regular, 9.0, narrow)
        .unwrap();
    assert_eq!(lines, vec!["a", "Supercalifragilistic", "b"]);
}

#[test]
fn lines_respect_max_width() {
    let m = measurer();
    let text = "The family requests that the burial proceed after the evening \
                prayers at the chapel near the main gate of the cemetery";
    let max = 60.0;
    let lines = m.wrap(text, FontWeight::Regular, 9.0, max).unwrap();
    assert!(lines.len() > 1);
    for line in &lines {
        assert!(m.width(line, FontWeight::Regular, 9.0).unwrap() <= max + 1e-3, "{line}");
    }
    // Nothing lost, nothing split.
    assert_eq!(lines.join(" "), text.split_whitespace().collect::<Vec<_>>().join(" "));
}

#[test]
fn wrap_is_deterministic() {
    let m = measurer();
    let text = "Peter Otieno, son of the deceased, residing in Kibera";
    let a = m.wrap(text, FontWeight::Bold, 9.0, 40.0).unwrap();
    let b = m.wrap(text, FontWeight::Bold, 9.0, 40.0).unwrap();
    assert_eq!(a, b);
}

#[test]
fn newline_forces_a_break() {
    let lines = measurer()
        .wrap("first line\nsecond line\n", FontWeight::Regular, 9.0, 150.0)
        .unwrap();
    assert_eq!(lines, vec!["first line", "second line"]);
}

#[test]
fn invalid_size_is_a_measurement_error() {
    let m = measurer();
    assert!(matches!(
        m.width("x", FontWeight::Regular, 0.0),
        Err(Error::Measurement(_))
    ));
    assert!(matches!(
        m.wrap("x", FontWeight::Regular, f32::NAN, 10.0),
        Err(Error::Measurement(_))
    ));
    assert!(matches!(
        m.wrap("x", FontWeight::Regular, 9.0, -1.0),
        Err(Error::Measurement(_))
    ));
}

#[test]
fn helvetica_reports_characters_outside_winansi() {
    let fonts = FontBook::helvetica();
    let face = fonts.face(FontWeight::Regular);
    assert_eq!(face.missing_chars("Łódź Łódź"), vec!['Ł', 'ź']);
    assert!(face.missing_chars("Café \u{2022} 1,000 \u{20ac}").is_empty());
    assert!(face.missing_chars("tab\there").is_empty());
}
