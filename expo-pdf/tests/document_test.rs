use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use expo_pdf::{BuiltinFont, PdfDocument, TextStyle};

const A4: (f64, f64) = (595.28, 841.89);

fn helvetica(size: f64) -> TextStyle {
    TextStyle {
        font: BuiltinFont::Helvetica.into(),
        font_size: size,
    }
}

#[test]
fn create_empty_document() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.begin_page(A4.0, A4.1).unwrap();
    doc.end_page().unwrap();
    let bytes = doc.end_document().unwrap();
    let output = String::from_utf8_lossy(&bytes);
    assert!(output.starts_with("%PDF-1.7"));
    assert!(output.contains("/Count 1"));
    assert!(output.trim_end().ends_with("%%EOF"));
}

#[test]
fn set_info_appears_in_output() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.set_info("Creator", "expo-invoice")
        .set_info("Title", "Relevé (mars)");
    doc.begin_page(A4.0, A4.1).unwrap();
    let bytes = doc.end_document().unwrap();
    let output = String::from_utf8_lossy(&bytes);
    assert!(output.contains("/Creator (expo-invoice)"));
    assert!(output.contains("/Title <FEFF00520065006C0065007600E900200028006D0061007200730029>"));
    assert!(output.contains("/Info"));
}

#[test]
fn place_text_in_content_stream() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.begin_page(A4.0, A4.1).unwrap();
    doc.place_text("Total", 20.0, 20.0, &helvetica(8.0)).unwrap();
    let bytes = doc.end_document().unwrap();
    let output = String::from_utf8_lossy(&bytes);
    assert!(output.contains("/F1 8 Tf"));
    assert!(output.contains("20 20 Td"));
    assert!(output.contains("(Total) Tj"));
}

#[test]
fn euro_and_accents_use_winansi() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.begin_page(A4.0, A4.1).unwrap();
    doc.place_text("Activité 12,50 €", 20.0, 20.0, &helvetica(8.0)).unwrap();
    let bytes = doc.end_document().unwrap();
    let output = String::from_utf8_lossy(&bytes);
    assert!(output.contains("(Activit\\351 12,50 \\200) Tj"));
    assert!(output.contains("/Encoding /WinAnsiEncoding"));
}

#[test]
fn page_resources_list_only_used_fonts() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.begin_page(A4.0, A4.1).unwrap();
    let bold = TextStyle {
        font: BuiltinFont::HelveticaBold.into(),
        font_size: 14.0,
    };
    doc.place_text("Relevé", 20.0, 800.0, &bold).unwrap();
    let bytes = doc.end_document().unwrap();
    let output = String::from_utf8_lossy(&bytes);
    assert!(output.contains("/F2"));
    assert!(!output.contains("/F1 "));
    assert!(output.contains("/BaseFont /Helvetica-Bold"));
}

#[test]
fn lines_and_rectangles_are_stroked() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.begin_page(A4.0, A4.1).unwrap();
    doc.stroke_line(10.0, 10.0, 100.0, 10.0, 0.5).unwrap();
    doc.stroke_rect(10.0, 20.0, 50.0, 30.0, 0.5).unwrap();
    let bytes = doc.end_document().unwrap();
    let output = String::from_utf8_lossy(&bytes);
    assert!(output.contains("10 10 m\n100 10 l\nS"));
    assert!(output.contains("10 20 50 30 re\nS"));
}

/// Verifies that end_page flushes page data to the writer
/// incrementally, rather than buffering everything until
/// end_document.
#[test]
fn end_page_flushes_to_writer() {
    struct TrackingWriter {
        byte_count: Rc<RefCell<usize>>,
        inner: Vec<u8>,
    }

    impl Write for TrackingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = self.inner.write(buf)?;
            *self.byte_count.borrow_mut() += n;
            Ok(n)
        }
        fn flush(&mut self) -> io::Result<()> {
            self.inner.flush()
        }
    }

    let counter = Rc::new(RefCell::new(0usize));
    let writer = TrackingWriter {
        byte_count: counter.clone(),
        inner: Vec::new(),
    };

    let mut doc = PdfDocument::new(writer).unwrap();
    let after_init = *counter.borrow();

    doc.begin_page(A4.0, A4.1).unwrap();
    doc.place_text("Page 1", 20.0, 20.0, &helvetica(7.0)).unwrap();
    assert_eq!(*counter.borrow(), after_init);

    doc.end_page().unwrap();
    assert!(*counter.borrow() > after_init);
}

#[test]
fn begin_page_closes_open_page() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.begin_page(A4.0, A4.1).unwrap();
    doc.place_text("Page 1", 20.0, 20.0, &helvetica(7.0)).unwrap();
    doc.begin_page(A4.0, A4.1).unwrap();
    doc.place_text("Page 2", 20.0, 20.0, &helvetica(7.0)).unwrap();
    assert_eq!(doc.page_count(), 2);
    let bytes = doc.end_document().unwrap();
    let output = String::from_utf8_lossy(&bytes);
    assert!(output.contains("/Count 2"));
}

#[test]
fn compression_shrinks_repetitive_pages() {
    let make_pdf = |compress: bool| -> Vec<u8> {
        let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
        doc.set_compression(compress);
        for i in 0..5 {
            doc.begin_page(A4.0, A4.1).unwrap();
            for y in 0..30 {
                let line = format!("EX-123-45{:02} Visite guidée page {}", y, i);
                doc.place_text(&line, 45.0, 800.0 - y as f64 * 20.0, &helvetica(8.0)).unwrap();
            }
            doc.end_page().unwrap();
        }
        doc.end_document().unwrap()
    };

    let plain = make_pdf(false);
    let compressed = make_pdf(true);
    assert!(compressed.len() < plain.len());
    assert!(String::from_utf8_lossy(&compressed).contains("/Filter /FlateDecode"));
    assert!(!String::from_utf8_lossy(&plain).contains("FlateDecode"));
}

#[test]
fn garbage_font_bytes_are_rejected() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    assert!(doc.load_font_bytes(vec![0, 1, 2, 3]).is_err());
    assert!(doc.load_font_file("/nonexistent/DejaVuSans.ttf").is_err());
}
