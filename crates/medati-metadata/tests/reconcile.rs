use medati_metadata::{reconcile, Document};
use pretty_assertions::assert_eq;
use serde_json::Value;

const CAPACITY: &str = r#"{
    "name": "energy_capacity",
    "title": "Installed capacity per region",
    "language": ["en-GB", "de-DE"],
    "resources": [
        {
            "profile": "tabular-data-resource",
            "name": "model_draft.energy_capacity",
            "path": "http://openenergyplatform.org/dataedit/view/model_draft/energy_capacity",
            "format": "PostgreSQL",
            "schema": {
                "fields": [
                    {"name": "ID", "description": "Unique identifier", "type": "serial"},
                    {"name": "Region Name", "description": "NUTS region", "type": "text"},
                    {"name": "Year", "type": "integer"},
                    {"name": "Installed Capacity (MW)", "type": "float", "unit": "MW"}
                ],
                "primaryKey": ["id"],
                "foreignKeys": []
            }
        }
    ],
    "metaMetadata": {"metadataVersion": "OEP-1.5.2"}
}"#;

const COLUMNS: [&str; 5] = ["id", "region_name", "year", "installed_capacity__mw_", "comment"];

fn capacity() -> Document {
    Document::from_json_slice(CAPACITY.as_bytes()).expect("parse metadata")
}

#[test]
fn every_field_takes_its_column_name() {
    let mut doc = capacity();
    reconcile(&mut doc, &COLUMNS).unwrap();
    assert_eq!(
        doc.field_names(),
        vec!["id", "region_name", "year", "installed_capacity__mw_"]
    );
    for name in doc.field_names() {
        assert!(COLUMNS.contains(&name.as_str()), "{name}");
    }
}

#[test]
fn reconciled_document_keeps_everything_else() {
    let mut doc = capacity();
    reconcile(&mut doc, &COLUMNS).unwrap();

    let mut out = Vec::new();
    doc.to_writer(&mut out).unwrap();
    let mut written: Value = serde_json::from_slice(&out).unwrap();
    let mut original: Value = serde_json::from_str(CAPACITY).unwrap();

    let renamed = ["id", "region_name", "year", "installed_capacity__mw_"];
    let fields = original["resources"][0]["schema"]["fields"]
        .as_array_mut()
        .unwrap();
    for (field, name) in fields.iter_mut().zip(renamed) {
        field["name"] = Value::from(name);
    }
    assert_eq!(written, original);

    let unit = written["resources"][0]["schema"]["fields"][3]["unit"].take();
    assert_eq!(unit, Value::from("MW"));
}

#[test]
fn one_unmatched_field_leaves_the_document_unchanged() {
    let mut doc = capacity();
    let before = doc.clone();
    let columns = ["id", "region_name", "installed_capacity__mw_"];

    let err = reconcile(&mut doc, &columns).unwrap_err();
    assert_eq!(doc, before);
    assert_eq!(err.document, "energy_capacity");
    assert_eq!(err.field, "Year");
    assert_eq!(err.source.target, "year");
    assert_eq!(err.source.candidates, columns.to_vec());
    assert_eq!(
        err.to_string(),
        "metadata `energy_capacity`: field `Year` does not match any column"
    );
}

#[test]
fn documents_without_fields_reconcile_trivially() {
    let mut doc = Document::from_json_slice(br#"{"name":"empty","resources":[]}"#).unwrap();
    reconcile(&mut doc, &["id"]).unwrap();
    assert!(doc.field_names().is_empty());
}

const TWO_RESOURCES: &str = r#"{
    "name": "regional_demand",
    "resources": [
        {
            "name": "model_draft.regions",
            "schema": {"fields": [{"name": "Region"}, {"name": "Year"}]}
        },
        {"name": "model_draft.notes", "path": "notes.txt"},
        {
            "name": "model_draft.demand",
            "schema": {"fields": [{"name": "ID"}, {"name": "Values", "unit": "MWh"}]}
        }
    ]
}"#;

const DEMAND_COLUMNS: [&str; 4] = ["region", "year", "id", "value"];

#[test]
fn fields_are_reconciled_resource_by_resource() {
    let mut doc = Document::from_json_slice(TWO_RESOURCES.as_bytes()).unwrap();
    reconcile(&mut doc, &DEMAND_COLUMNS).unwrap();

    assert_eq!(doc.field_names(), vec!["region", "year", "id", "value"]);
    let demand = doc.resources[2].schema.as_ref().unwrap();
    assert_eq!(demand.fields[1].name(), "value");
    assert_eq!(demand.fields[1].extra.get("unit"), Some(&Value::from("MWh")));
    assert!(doc.resources[1].schema.is_none());
}

#[test]
fn a_failure_in_a_later_resource_leaves_earlier_resources_unrenamed() {
    let json = TWO_RESOURCES.replace("\"Values\"", "\"Weather\"");
    let mut doc = Document::from_json_slice(json.as_bytes()).unwrap();
    let before = doc.clone();

    let err = reconcile(&mut doc, &DEMAND_COLUMNS).unwrap_err();
    assert_eq!(err.document, "regional_demand");
    assert_eq!(err.field, "Weather");
    assert_eq!(doc, before);
    assert_eq!(doc.field_names(), vec!["Region", "Year", "ID", "Weather"]);
}
