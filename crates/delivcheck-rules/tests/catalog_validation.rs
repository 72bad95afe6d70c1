use delivcheck_rules::{
    IssueSeverity, RuleCatalog, RuleKind, RuleSource, catalog_json_schema_value,
    load_catalog_document, validate_catalog_document, validate_catalog_json,
};
use serde_json::{Value, json};

fn sample_catalog() -> Value {
    json!({
        "catalog_version": "0.1",
        "projects": [
            {"id": "web-101", "name": "Intro to web", "allow_late_submission": false}
        ],
        "rules": [
            {"id": "size", "type": "max_size_file", "max_size": 1048576},
            {"id": "readme", "type": "file_presence", "file_name": "README.md"},
            {
                "id": "pkg-name",
                "type": "file_content_match",
                "file_name": "package.json",
                "pattern": "\"name\"\\s*:\\s*\"test-project\"",
                "match_type": "regex"
            },
            {
                "id": "layout",
                "type": "folder_structure",
                "expected_structure": "{\"src\":{\"index.js\":\"file\"}}"
            }
        ],
        "deliverables": [
            {"id": "d-1", "project_id": "web-101", "archive_size": 524288, "deadline": "2024-06-01T12:00:00Z"}
        ],
        "assignments": [
            {"rule_id": "size", "project_id": "web-101"},
            {"rule_id": "readme", "project_id": "web-101"},
            {"rule_id": "pkg-name", "project_id": "web-101"},
            {"rule_id": "layout", "project_id": "web-101"}
        ]
    })
}

#[test]
fn sample_catalog_validates_against_schema() {
    let schema = catalog_json_schema_value().expect("serialize schema");
    let catalog_json = sample_catalog();

    let structural = validate_catalog_json(&catalog_json, &schema).expect("compile schema");
    assert!(structural.errors.is_empty(), "structural errors: {:?}", structural.errors);

    let validated =
        validate_catalog_document(&catalog_json, &schema).expect("catalog should validate");
    assert!(validated.warnings.is_empty(), "unexpected warnings: {:?}", validated.warnings);

    let resolved = validated
        .catalog
        .deliverable_rules("d-1")
        .expect("deliverable resolves");
    assert_eq!(resolved.rules.len(), 4);
    assert!(matches!(resolved.rules[3].kind, RuleKind::FolderStructure(_)));
    assert_eq!(resolved.deliverable.recorded_size(), 524288);
}

#[test]
fn unknown_rule_type_is_a_schema_violation() {
    let schema = catalog_json_schema_value().expect("serialize schema");
    let mut catalog_json = sample_catalog();
    catalog_json["rules"][0] = json!({"id": "size", "type": "max_lines", "max_lines": 10});

    let report = validate_catalog_document(&catalog_json, &schema).unwrap_err();
    assert!(!report.errors.is_empty());
    assert!(report.errors.iter().all(|issue| issue.code == "schema_violation"));
}

#[test]
fn dangling_references_are_reported() {
    let schema = catalog_json_schema_value().expect("serialize schema");
    let mut catalog_json = sample_catalog();
    catalog_json["assignments"][1] = json!({"rule_id": "ghost", "project_id": "web-101"});
    catalog_json["deliverables"][0]["project_id"] = json!("web-999");

    let report = validate_catalog_document(&catalog_json, &schema).unwrap_err();
    let codes: Vec<_> = report.errors.iter().map(|issue| issue.code.as_str()).collect();
    assert!(codes.contains(&"assignment_unknown_rule"));
    assert!(codes.contains(&"deliverable_unknown_project"));
    // "readme" lost its only assignment.
    assert_eq!(report.with_code("rule_unassigned").count(), 1);
}

#[test]
fn loading_for_a_run_tolerates_rule_lint() {
    let schema = catalog_json_schema_value().expect("serialize schema");
    let mut catalog_json = sample_catalog();
    catalog_json["rules"][2]["pattern"] = json!("[");

    assert!(validate_catalog_document(&catalog_json, &schema).is_err());

    let loaded = load_catalog_document(&catalog_json, &schema).expect("load for a run");
    let invalid: Vec<_> = loaded
        .warnings
        .iter()
        .filter(|issue| issue.code == "regex_invalid")
        .collect();
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0].severity, IssueSeverity::Warning);
    assert_eq!(loaded.catalog.deliverable_rules("d-1").expect("resolve").rules.len(), 4);
}

#[test]
fn loading_for_a_run_still_rejects_schema_violations() {
    let schema = catalog_json_schema_value().expect("serialize schema");
    let mut catalog_json = sample_catalog();
    catalog_json["rules"][0] = json!({"id": "size", "type": "max_lines", "max_lines": 10});

    let report = load_catalog_document(&catalog_json, &schema).unwrap_err();
    assert!(report.errors.iter().all(|issue| issue.code == "schema_violation"));
}

#[test]
fn catalog_survives_a_save_and_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("catalog.json");

    let catalog: RuleCatalog = serde_json::from_value(sample_catalog()).expect("parse catalog");
    catalog.save(&path).expect("save catalog");
    let loaded = RuleCatalog::load(&path).expect("load catalog");

    assert_eq!(loaded.rules.len(), catalog.rules.len());
    assert_eq!(loaded.assignments, catalog.assignments);
    assert!(!loaded.projects[0].allow_late_submission);
}
