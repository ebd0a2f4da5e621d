use query_whisperer::ingestion::csv::ingest_csv_from_str;
use query_whisperer::ingestion::{ingest_from_path, to_csv_string, write_csv, write_csv_to_path, IngestionOptions};
use query_whisperer::types::{DataSet, DataType, Field, Header};

#[test]
fn egress_of_ingested_fixture_is_stable() {
    let ds = ingest_from_path("tests/fixtures/sales.csv", &IngestionOptions::default()).unwrap();
    let first = to_csv_string(&ds).unwrap();
    let again = to_csv_string(&ingest_csv_from_str(&first, b',').unwrap()).unwrap();

    assert_eq!(first, std::fs::read_to_string("tests/fixtures/sales.csv").unwrap());
    assert_eq!(again, first);
}

#[test]
fn egress_writes_cells_present_at_each_row() {
    let ds = DataSet::new(vec![
        Field::from_values(Header::new("a", DataType::Number, 0), ["1", "2"]),
        Field::from_values(Header::new("b", DataType::String, 1), ["x"]),
    ]);

    assert_eq!(to_csv_string(&ds).unwrap(), "a,b\n1,x\n2\n");
}

#[test]
fn egress_honours_delimiter() {
    let ds = ingest_csv_from_str("Name,Age\nAlice,30\n", b',').unwrap();
    let mut buf = Vec::new();
    write_csv(&ds, &mut buf, b'\t').unwrap();
    assert_eq!(String::from_utf8(buf).unwrap(), "Name\tAge\nAlice\t30\n");
}

#[test]
fn egress_to_path_round_trips() {
    let path = std::env::temp_dir().join(format!("query-whisperer-egress-{}.csv", std::process::id()));
    let ds = ingest_csv_from_str("Name,Age\nAlice,30\nBob,25\n", b',').unwrap();

    write_csv_to_path(&ds, &path, b',').unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(text, "Name,Age\nAlice,30\nBob,25\n");
}
