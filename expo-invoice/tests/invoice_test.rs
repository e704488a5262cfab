use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use expo_invoice::output::{render_combined, render_group};
use expo_invoice::schema::*;
use expo_invoice::{
    generate_invoices, group_records, open_source, BillingRules, ComposeOptions, Config, CsvSource, InvoiceError,
    OutputMode, RecordSource,
};

const LONG_ACTIVITY: &str = "Atelier découverte des squelettes, fossiles et minéraux de la grande \
                             galerie de l'évolution, suivi d'une visite commentée des serres tropicales";

const BASE_HEADERS: [&str; 10] = [
    RECIPIENT_NAME,
    RECIPIENT_STREET,
    RECIPIENT_POSTAL_CODE,
    RECIPIENT_CITY,
    ACTIVITY,
    BOOKER,
    CUSTOMER_NAME,
    BOOKING_NUMBER,
    END_DATETIME,
    PRICE,
];

fn export(headers: &[&str], rows: &[Vec<&str>]) -> Vec<u8> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers).unwrap();
    for row in rows {
        writer.write_record(row).unwrap();
    }
    writer.into_inner().unwrap()
}

fn booking<'a>(recipient: &'a str, activity: &'a str, number: &'a str, price: &'a str) -> Vec<&'a str> {
    vec![
        recipient,
        "57 rue Cuvier",
        "75005",
        "Paris",
        activity,
        "Jeanne Martin",
        "École Buffon CM2",
        number,
        "12/03/2024 10:30",
        price,
    ]
}

fn two_recipients() -> Vec<u8> {
    export(
        &BASE_HEADERS,
        &[
            booking("Mairie de Paris", LONG_ACTIVITY, "1234567", "12.50"),
            booking("Commune d'Orsay", "Visite libre", "2345678", "30.00"),
            booking("Mairie de Paris", "Visite libre", "3456789", "7.25"),
            booking("Commune d'Orsay", LONG_ACTIVITY, "4567890", "15"),
        ],
    )
}

fn options() -> ComposeOptions {
    ComposeOptions {
        compress: false,
        ..ComposeOptions::default()
    }
}

fn pdf_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("data").join(name)
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("expo-invoice-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn one_document_per_recipient_with_padded_rows() {
    let records = CsvSource::new(two_recipients().as_slice(), b',').read_records().unwrap();
    let groups = group_records(&records, &BillingRules::default()).unwrap();
    assert_eq!(groups.len(), 2);

    let opts = options();
    for group in &groups {
        let (bytes, summary) = render_group(Vec::new(), group, &opts).unwrap();
        assert_eq!(summary.items, 2);
        assert_eq!(summary.pages, 1);

        let long_row = summary
            .item_rows
            .iter()
            .find(|row| row.line_count() > 1)
            .expect("the long activity wraps");
        for column in long_row.columns() {
            assert_eq!(column.len(), long_row.line_count());
        }
        assert!(summary.item_rows.iter().any(|row| row.line_count() == 1));

        let text = pdf_text(&bytes);
        assert!(text.starts_with("%PDF-1.7"));
        assert!(text.contains("/Count 1"));
        assert!(text.contains("(Page 1) Tj"));
        assert!(text.contains("(Total) Tj"));
    }
}

#[test]
fn document_content() {
    let records = CsvSource::new(two_recipients().as_slice(), b',').read_records().unwrap();
    let groups = group_records(&records, &BillingRules::default()).unwrap();
    let (bytes, _) = render_group(Vec::new(), &groups[0], &options()).unwrap();
    let text = pdf_text(&bytes);

    assert!(text.contains("(Relev\\351 des visites organis\\351es par le MNHN) Tj"));
    assert!(text.contains("(Adresse de facturation pour la commune"));
    assert!(text.contains("(57 rue Cuvier) Tj"));
    assert!(text.contains("(75005 Paris) Tj"));
    assert!(text.contains("(Date / # Activit\\351) Tj"));
    assert!(text.contains("(Prix) Tj"));
    assert!(text.contains("(EX-123-4567) Tj"));
    assert!(text.contains("(EX-345-6789) Tj"));
    assert!(text.contains("(12,50 \\200) Tj"));
    assert!(text.contains("(7,25 \\200) Tj"));
    assert!(text.contains("(19,75 \\200) Tj"));
    assert!(text.contains("(\\311cole Buffon CM2) Tj"));
    assert!(text.contains("(12/03/2024 10:30) Tj"));
    assert!(!text.contains("EX-234-5678"));
}

#[test]
fn group_total_is_exact() {
    let data = export(
        &BASE_HEADERS,
        &[
            booking("Mairie de Sceaux", "Visite", "1000001", "12.50"),
            booking("Mairie de Sceaux", "Visite", "1000002", "7.25"),
            booking("Mairie de Sceaux", "Visite", "1000003", "30.00"),
        ],
    );
    let records = CsvSource::new(data.as_slice(), b',').read_records().unwrap();
    let groups = group_records(&records, &BillingRules::default()).unwrap();
    let (bytes, _) = render_group(Vec::new(), &groups[0], &options()).unwrap();
    assert!(pdf_text(&bytes).contains("(49,75 \\200) Tj"));
}

#[test]
fn payment_method_selects_billed_items() {
    let mut headers = BASE_HEADERS.to_vec();
    headers.extend([PAYMENT_METHOD, TITLE_HOLDER, PURCHASE_ORDER]);
    let mut billed = booking("Mairie de Sceaux", "Visite contée", "1111111", "10");
    billed.extend(["Invoice", "Mme Dupont", "BC-2024-17"]);
    let mut paid = booking("Mairie de Sceaux", "Atelier", "2222222", "99");
    paid.extend(["Credit card", "", ""]);
    let mut unbilled = booking("Mairie de Bagneux", "Atelier", "3333333", "5");
    unbilled.extend(["Credit card", "", ""]);

    let data = export(&headers, &[billed, paid, unbilled]);
    let records = CsvSource::new(data.as_slice(), b',').read_records().unwrap();
    let rules = BillingRules::default();
    let groups = group_records(&records, &rules).unwrap();
    assert_eq!(groups.len(), 2);
    assert!(!groups[1].has_billable_items(&rules));

    let (bytes, summary) = render_group(Vec::new(), &groups[0], &options()).unwrap();
    assert_eq!(summary.items, 1);
    assert_eq!(summary.item_rows[0].line_count(), 2);
    let text = pdf_text(&bytes);
    assert!(text.contains("(EX-111-1111) Tj"));
    assert!(!text.contains("EX-222-2222"));
    assert!(text.contains("(Mme Dupont) Tj"));
    assert!(text.contains("(BC-2024-17) Tj"));
    assert!(text.contains("(10,00 \\200) Tj"));
}

#[test]
fn blank_or_missing_payment_method_is_not_billed() {
    let mut headers = BASE_HEADERS.to_vec();
    headers.push(PAYMENT_METHOD);
    let mut billed = booking("Mairie de Sceaux", "Visite contée", "1111111", "10");
    billed.push("Invoice");
    let mut blank = booking("Mairie de Sceaux", "Atelier", "2222222", "99");
    blank.push("");
    let mut data = export(&headers, &[billed, blank]);
    // A row cut short before the payment-method column.
    data.extend_from_slice(
        "Mairie de Sceaux,57 rue Cuvier,75005,Paris,Atelier,Jeanne Martin,École Buffon,3333333,12/03/2024 10:30,45\n"
            .as_bytes(),
    );

    let records = CsvSource::new(data.as_slice(), b',').read_records().unwrap();
    assert_eq!(records.len(), 3);
    let rules = BillingRules::default();
    let groups = group_records(&records, &rules).unwrap();
    assert_eq!(groups[0].items.len(), 3);
    assert_eq!(groups[0].billable_items(&rules).count(), 1);

    let (bytes, summary) = render_group(Vec::new(), &groups[0], &options()).unwrap();
    assert_eq!(summary.items, 1);
    let text = pdf_text(&bytes);
    assert!(text.contains("(EX-111-1111) Tj"));
    assert!(!text.contains("EX-222-2222"));
    assert!(!text.contains("EX-333-3333"));
    assert!(!text.contains("(154,00 \\200) Tj"));
    assert!(!text.contains("(55,00 \\200) Tj"));
    assert_eq!(text.matches("(10,00 \\200) Tj").count(), 2);
}

#[test]
fn xlsx_export_reads_the_first_worksheet() {
    let mut source = open_source(&fixture("bookings.xlsx"), b',').unwrap();
    let records = source.read_records().unwrap();
    assert_eq!(records.len(), 2);
    // The blank sheet row between the two bookings still counts.
    assert_eq!(records[0].row(), 1);
    assert_eq!(records[1].row(), 3);
    assert_eq!(records[0].get(RECIPIENT_NAME), Some("Mairie de Paris"));
    assert_eq!(records[0].get(RECIPIENT_POSTAL_CODE), Some("75005"));
    assert_eq!(records[0].get(BOOKING_NUMBER), Some("1234567"));
    assert_eq!(records[1].get(BOOKING_NUMBER), Some("2345678"));
    assert_eq!(records[0].get(END_DATETIME), Some("12/03/2024 10:30"));
    assert_eq!(records[0].get(PRICE), Some("12.5"));

    let rules = BillingRules::default();
    let groups = group_records(&records, &rules).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].billable_items(&rules).count(), 1);

    let (bytes, _) = render_group(Vec::new(), &groups[0], &options()).unwrap();
    let text = pdf_text(&bytes);
    assert!(text.contains("(EX-123-4567) Tj"));
    assert!(text.contains("(12/03/2024 10:30) Tj"));
    assert!(text.contains("(\\311cole Buffon CM2) Tj"));
    assert!(!text.contains("EX-234-5678"));
    assert_eq!(text.matches("(12,50 \\200) Tj").count(), 2);
}

#[test]
fn xlsx_export_end_to_end() {
    let dir = temp_dir("xlsx");
    let mut config = Config::default();
    config.output.directory = dir.clone();
    let date = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();

    let written = generate_invoices(&fixture("bookings.xlsx"), &config, date).unwrap();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].path, dir.join("invoice_MairiedeParis.pdf"));
    assert!(fs::read(&written[0].path).unwrap().starts_with(b"%PDF-1.7"));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn long_group_spans_pages_with_local_numbers() {
    let rows: Vec<Vec<&str>> = (0..40)
        .map(|i| booking(if i < 37 { "Mairie de Paris" } else { "Mairie de Vanves" }, LONG_ACTIVITY, "1234567", "1"))
        .collect();
    let data = export(&BASE_HEADERS, &rows);
    let records = CsvSource::new(data.as_slice(), b',').read_records().unwrap();
    let groups = group_records(&records, &BillingRules::default()).unwrap();

    let (bytes, summaries) = render_combined(Vec::new(), &groups, &options()).unwrap();
    assert_eq!(summaries.len(), 2);
    assert!(summaries[0].pages >= 2);
    assert_eq!(summaries[1].pages, 1);

    let text = pdf_text(&bytes);
    let total_pages = summaries[0].pages + summaries[1].pages;
    assert!(text.contains(&format!("/Count {}", total_pages)));
    assert_eq!(text.matches("(Page 1) Tj").count(), 2);
    assert!(text.contains("(Page 2) Tj"));
    assert!(text.contains("(37,00 \\200) Tj"));
    assert!(text.contains("(3,00 \\200) Tj"));
}

#[test]
fn per_recipient_files_on_disk() {
    let dir = temp_dir("per-recipient");
    let input = dir.join("export.csv");
    fs::write(&input, two_recipients()).unwrap();

    let mut config = Config::default();
    config.document.compress = false;
    config.output.directory = dir.join("out");
    let date = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();

    let written = generate_invoices(&input, &config, date).unwrap();
    let names: Vec<String> = written
        .iter()
        .map(|doc| doc.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["invoice_MairiedeParis.pdf", "invoice_CommunedOrsay.pdf"]);
    for doc in &written {
        let bytes = fs::read(&doc.path).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
    }
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn combined_file_on_disk() {
    let dir = temp_dir("combined");
    let input = dir.join("export.csv");
    fs::write(&input, two_recipients()).unwrap();

    let mut config = Config::default();
    config.output.directory = dir.clone();
    config.output.mode = OutputMode::Combined;
    let date = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();

    let written = generate_invoices(&input, &config, date).unwrap();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].path, dir.join("invoice_2024-04-02.pdf"));
    assert_eq!(written[0].groups.len(), 2);
    let bytes = fs::read(&written[0].path).unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("/Filter /FlateDecode"));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn semicolon_export_with_config() {
    let dir = temp_dir("semicolon");
    let input = dir.join("export.csv");
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(Vec::new());
    writer.write_record(BASE_HEADERS).unwrap();
    writer
        .write_record(booking("Mairie de Paris", "Visite", "1234567", "12,50"))
        .unwrap();
    fs::write(&input, writer.into_inner().unwrap()).unwrap();

    let config = Config::from_toml_str(&format!(
        "[input]\ncsv_delimiter = \";\"\n[output]\ndirectory = {:?}\n[billing]\nbooking_prefix = \"MN\"\n",
        dir.display().to_string()
    ))
    .unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
    let written = generate_invoices(&input, &config, date).unwrap();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].groups[0].items, 1);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn unsupported_extension_writes_nothing() {
    let dir = temp_dir("unsupported");
    let input = dir.join("export.json");
    fs::write(&input, "{}").unwrap();
    let mut config = Config::default();
    config.output.directory = dir.join("out");

    let date = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
    let err = generate_invoices(&input, &config, date).unwrap_err();
    assert!(matches!(err, InvoiceError::UnsupportedFormat { .. }));
    assert!(!dir.join("out").exists());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn short_booking_number_aborts_the_run() {
    let data = export(
        &BASE_HEADERS,
        &[
            booking("Mairie de Paris", "Visite", "1234567", "1"),
            booking("Mairie de Paris", "Visite", "12345", "1"),
        ],
    );
    let records = CsvSource::new(data.as_slice(), b',').read_records().unwrap();
    let err = group_records(&records, &BillingRules::default()).unwrap_err();
    assert!(err.to_string().contains("record 2"));
}

#[test]
fn missing_column_is_reported() {
    let data = export(&BASE_HEADERS[..9], &[booking("Mairie de Paris", "Visite", "1234567", "1")[..9].to_vec()]);
    let records = CsvSource::new(data.as_slice(), b',').read_records().unwrap();
    let err = group_records(&records, &BillingRules::default()).unwrap_err();
    match err {
        InvoiceError::FieldMissing { field, row } => {
            assert_eq!(field, PRICE);
            assert_eq!(row, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}
