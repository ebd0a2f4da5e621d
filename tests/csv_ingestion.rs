use query_whisperer::ingestion::csv::{ingest_csv_from_path, ingest_csv_from_reader, ingest_csv_from_str};
use query_whisperer::ingestion::{ingest_from_path, IngestionOptions};
use query_whisperer::types::DataType;
use query_whisperer::IngestionError;

#[test]
fn ingest_csv_from_path_happy_path() {
    let ds = ingest_csv_from_path("tests/fixtures/people.csv", b',').unwrap();

    assert_eq!(ds.row_count(), 2);
    assert_eq!(ds.header_names().collect::<Vec<_>>(), vec!["Name", "Age"]);
    assert_eq!(ds.row(0), vec![Some("Alice"), Some("30")]);
    assert_eq!(ds.field("Age").unwrap().data_type(), DataType::Number);
}

#[test]
fn column_types_come_from_the_first_data_row() {
    let ds = ingest_csv_from_path("tests/fixtures/sales.csv", b',').unwrap();

    let types: Vec<DataType> = ds.fields.iter().map(|f| f.data_type()).collect();
    assert_eq!(
        types,
        vec![
            DataType::String,
            DataType::Number,
            DataType::Date,
            DataType::Bool,
            DataType::String,
        ]
    );
    assert_eq!(ds.row_count(), 5);
    assert_eq!(ds.row(1)[4], Some(""));
}

#[test]
fn cell_indices_are_contiguous() {
    let ds = ingest_csv_from_path("tests/fixtures/sales.csv", b',').unwrap();
    for field in &ds.fields {
        let indices: Vec<usize> = field.data.iter().map(|c| c.index).collect();
        assert_eq!(indices, (0..field.len()).collect::<Vec<_>>());
    }
}

#[test]
fn tsv_extension_selects_tab_delimiter() {
    let ds = ingest_from_path("tests/fixtures/cities.tsv", &IngestionOptions::default()).unwrap();
    assert_eq!(ds.header_names().collect::<Vec<_>>(), vec!["City", "Population"]);
    assert_eq!(ds.row(1), vec![Some("Bergen"), Some("291000")]);
}

#[test]
fn explicit_delimiter_overrides_extension() {
    let opts = IngestionOptions {
        delimiter: Some(b','),
        ..Default::default()
    };
    let ds = ingest_from_path("tests/fixtures/cities.tsv", &opts).unwrap();
    assert_eq!(ds.field_count(), 1);
    assert_eq!(ds.fields[0].name(), "City\tPopulation");
}

#[test]
fn existing_reader_is_accepted() {
    let input = "id;active\n7;false\n";
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b';')
        .from_reader(input.as_bytes());

    let ds = ingest_csv_from_reader(&mut rdr).unwrap();
    assert_eq!(ds.field("active").unwrap().data_type(), DataType::Bool);
    assert_eq!(ds.row(0), vec![Some("7"), Some("false")]);
}

#[test]
fn empty_input_has_no_header() {
    let err = ingest_csv_from_path("tests/fixtures/empty.csv", b',').unwrap_err();
    assert!(matches!(err, IngestionError::MissingHeader));

    let err = ingest_csv_from_str("", b',').unwrap_err();
    assert!(matches!(err, IngestionError::MissingHeader));
}

#[test]
fn header_only_input_is_an_empty_table() {
    let ds = ingest_csv_from_str("Name,Age\n", b',').unwrap();
    assert_eq!(ds.field_count(), 2);
    assert_eq!(ds.row_count(), 0);
    assert_eq!(ds.field("Age").unwrap().data_type(), DataType::String);
}
