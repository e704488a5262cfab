use expo_pdf::{BuiltinFont, FontFamily, FontMetrics, FontRef, FontStyle, PdfDocument, TextStyle};

#[test]
fn helvetica_space_width() {
    assert_eq!(FontMetrics::char_width(BuiltinFont::Helvetica, ' '), 278);
    assert_eq!(FontMetrics::char_width(BuiltinFont::HelveticaBold, ' '), 278);
}

#[test]
fn unmapped_char_measures_as_question_mark() {
    assert_eq!(FontMetrics::char_width(BuiltinFont::Helvetica, '\n'), 556);
    assert_eq!(FontMetrics::char_width(BuiltinFont::Helvetica, '漢'), 556);
    assert_eq!(FontMetrics::char_width(BuiltinFont::HelveticaBold, '漢'), 611);
}

#[test]
fn oeuvre_measures_with_the_ligature_glyph() {
    // œ=944, u=556, v=500, r=333, e=556 => 2889 units
    let w = FontMetrics::measure_text("œuvre", BuiltinFont::Helvetica, 10.0);
    assert!((w - 28.89).abs() < 1e-9);
}

#[test]
fn measure_text_hello() {
    // H=722, e=556, l=222, l=222, o=556 => 2278 units
    let w = FontMetrics::measure_text("Hello", BuiltinFont::Helvetica, 12.0);
    assert!((w - 27.336).abs() < 1e-9);
}

#[test]
fn bold_is_wider() {
    let regular = FontMetrics::measure_text("Responsable", BuiltinFont::Helvetica, 8.0);
    let bold = FontMetrics::measure_text("Responsable", BuiltinFont::HelveticaBold, 8.0);
    assert!(bold > regular);
}

#[test]
fn document_measures_like_metrics() {
    let doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    let style = TextStyle {
        font: BuiltinFont::HelveticaOblique.into(),
        font_size: 8.0,
    };
    let expected = FontMetrics::measure_text("École Buffon", BuiltinFont::HelveticaOblique, 8.0);
    assert!((doc.measure_text("École Buffon", &style) - expected).abs() < 1e-9);
}

#[test]
fn default_family_is_helvetica() {
    let family = FontFamily::default();
    assert_eq!(family.face(FontStyle::Regular), FontRef::Builtin(BuiltinFont::Helvetica));
    assert_eq!(family.face(FontStyle::Bold), FontRef::Builtin(BuiltinFont::HelveticaBold));
}
