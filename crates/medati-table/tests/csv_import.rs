use medati_table::{
    read_csv_table, sniff_delimiter, write_csv, CsvDelimiter, CsvImportError, CsvOptions,
    CsvTextEncoding, CsvWriteOptions, TableError, Value,
};
use pretty_assertions::assert_eq;

fn read(input: &[u8]) -> medati_table::Table {
    read_csv_table(input, &CsvOptions::default()).expect("import csv")
}

#[test]
fn sniffs_common_delimiters() {
    assert_eq!(sniff_delimiter(b"id,region,year\n1,DE,2020\n"), b',');
    assert_eq!(sniff_delimiter(b"id;region;year\n1;DE;2020\n"), b';');
    assert_eq!(sniff_delimiter(b"id\tregion\n1\tDE\n"), b'\t');
    assert_eq!(sniff_delimiter(b"id|region\n1|DE\n"), b'|');
}

#[test]
fn sniffing_prefers_the_consistent_candidate() {
    // Decimal commas appear in data rows, the semicolon count stays constant.
    let input = b"id;value;unit\n1;1,5;MW\n2;2,25;MW\n";
    assert_eq!(sniff_delimiter(input), b';');
}

#[test]
fn sniffing_ignores_delimiters_inside_quotes() {
    let input = b"id;\"name, long\";year\n1;\"a, b, c\";2020\n";
    assert_eq!(sniff_delimiter(input), b';');
}

#[test]
fn sniffing_falls_back_to_comma() {
    assert_eq!(sniff_delimiter(b"single\n1\n2\n"), b',');
    assert_eq!(sniff_delimiter(b""), b',');
}

#[test]
fn infers_column_types() {
    let table = read(
        b"id;region;year;value;flag;comment\n1;DE;2020;1.5;true;\n2;FR;2021;2;False;checked\n",
    );

    assert_eq!(
        table.column_names(),
        vec!["id", "region", "year", "value", "flag", "comment"]
    );
    assert_eq!(
        table.column("id").unwrap().values(),
        &[Value::Integer(1), Value::Integer(2)]
    );
    assert_eq!(
        table.column("value").unwrap().values(),
        &[Value::Float(1.5), Value::Float(2.0)]
    );
    assert_eq!(
        table.column("flag").unwrap().values(),
        &[Value::Boolean(true), Value::Boolean(false)]
    );
    assert_eq!(
        table.column("comment").unwrap().values(),
        &[Value::Null, Value::from("checked")]
    );
}

#[test]
fn short_rows_are_padded_and_blank_lines_skipped() {
    let table = read(b"id,region,year\n1,DE\n\n2,FR,2020\n");
    assert_eq!(table.row_count(), 2);
    assert_eq!(
        table.column("year").unwrap().values(),
        &[Value::Null, Value::Integer(2020)]
    );
}

#[test]
fn long_rows_are_rejected_with_their_row_number() {
    let err = read_csv_table(b"id,region\n1,DE\n2,FR,extra\n", &CsvOptions::default()).unwrap_err();
    match err {
        CsvImportError::TooManyFields {
            row,
            expected,
            found,
        } => {
            assert_eq!((row, expected, found), (3, 2, 3));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn empty_input_is_an_error() {
    assert!(matches!(
        read_csv_table(b"", &CsvOptions::default()),
        Err(CsvImportError::EmptyInput)
    ));
}

#[test]
fn duplicate_headers_are_rejected() {
    let err = read_csv_table(b"id,id\n1,2\n", &CsvOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        CsvImportError::Table(TableError::DuplicateColumn { ref name }) if name == "id"
    ));
}

#[test]
fn strips_utf8_bom_and_falls_back_to_windows_1252() {
    let mut input = vec![0xEF, 0xBB, 0xBF];
    input.extend_from_slice(b"id;Gr\xF6\xDFe\n1;2\n");
    let table = read(&input);
    assert_eq!(table.column_names(), vec!["id", "Größe"]);

    let strict = CsvOptions {
        delimiter: CsvDelimiter::Fixed(';'),
        encoding: CsvTextEncoding::Utf8,
    };
    assert!(matches!(
        read_csv_table(b"id;Gr\xF6\xDFe\n1;2\n", &strict),
        Err(CsvImportError::Parse { row: 1, column: 2, .. })
    ));
}

#[test]
fn fixed_delimiter_overrides_sniffing() {
    let options = CsvOptions {
        delimiter: CsvDelimiter::Fixed(','),
        ..CsvOptions::default()
    };
    let table = read_csv_table(b"a;b,c\n1;2,3\n", &options).unwrap();
    assert_eq!(table.column_names(), vec!["a;b", "c"]);
}

#[test]
fn export_uses_semicolons_and_pandas_rendering() {
    let table = read(b"id,value,flag,comment\n1,2,TRUE,\n2,2.5,false,x\n");
    let mut out = Vec::new();
    write_csv(&table, &mut out, &CsvWriteOptions::default()).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "id;value;flag;comment\n1;2.0;True;\n2;2.5;False;x\n"
    );
}
