use std::io::{Cursor, Write};

use delivcheck_core::Deliverable;
use delivcheck_eval::{EvalError, EvaluateOptions, ValidationEngine, validate_rules};
use delivcheck_rules::{
    FileContentMatchRule, FilePresenceRule, FolderStructureRule, MatchType, MaxSizeFileRule,
    Project, Rule, RuleCatalog, RuleKind, RuleType, StructureSource, catalog_json_schema_value,
    load_catalog_document,
};
use serde_json::json;
use zip::{CompressionMethod, ZipWriter};
use zip::write::SimpleFileOptions;

fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (path, content) in files {
        if path.ends_with('/') {
            writer.add_directory(*path, options).expect("add dir");
        } else {
            writer.start_file(*path, options).expect("start file");
            writer.write_all(content.as_bytes()).expect("write file");
        }
    }
    writer.finish().expect("finish zip").into_inner()
}

fn project_archive() -> Vec<u8> {
    zip_bytes(&[
        ("src/", ""),
        ("src/index.js", "console.log('hi');"),
        ("src/README.md", "# Project"),
        ("package.json", r#"{"name": "test-project", "version": "1.0.0"}"#),
        ("extra.txt", "not required"),
    ])
}

fn max_size(id: &str, max_size: u64) -> Rule {
    Rule::new(id, RuleKind::MaxSizeFile(MaxSizeFileRule { max_size }))
}

fn presence(id: &str, file_name: &str) -> Rule {
    Rule::new(
        id,
        RuleKind::FilePresence(FilePresenceRule {
            file_name: file_name.to_string(),
        }),
    )
}

fn content(id: &str, file_name: &str, pattern: &str, match_type: MatchType) -> Rule {
    Rule::new(
        id,
        RuleKind::FileContentMatch(FileContentMatchRule {
            file_name: file_name.to_string(),
            pattern: pattern.to_string(),
            match_type,
        }),
    )
}

fn layout(id: &str, expected: &str) -> Rule {
    Rule::new(
        id,
        RuleKind::FolderStructure(FolderStructureRule {
            expected_structure: StructureSource::Serialized(expected.to_string()),
        }),
    )
}

fn catalog_with(rules: Vec<Rule>, archive_size: Option<u64>) -> RuleCatalog {
    let mut catalog = RuleCatalog::new();
    catalog.add_project(Project::new("p-1")).expect("project");
    let mut deliverable = Deliverable::new("d-1", "p-1");
    deliverable.archive_size = archive_size;
    catalog.add_deliverable(deliverable).expect("deliverable");
    for rule in rules {
        let id = rule.id.clone();
        catalog.create_rule(rule).expect("rule");
        catalog.assign_rule(&id, "p-1").expect("assign");
    }
    catalog
}

fn engine(catalog: &RuleCatalog) -> ValidationEngine<&RuleCatalog> {
    ValidationEngine::new(catalog, EvaluateOptions::default())
}

#[test]
fn results_follow_rule_order_and_summary_adds_up() {
    let catalog = catalog_with(
        vec![
            presence("readme", "README.md"),
            max_size("size", 1000),
            content("license", "LICENSE", "MIT", MatchType::Contains),
            layout("layout", r#"{"src": {"index.js": "file"}}"#),
        ],
        Some(5000),
    );
    let archive = project_archive();
    let report = engine(&catalog)
        .validate("d-1", Some(archive.as_slice()))
        .expect("validate");

    let types: Vec<_> = report.results.iter().map(|result| result.rule_type).collect();
    assert_eq!(
        types,
        vec![
            RuleType::FilePresence,
            RuleType::MaxSizeFile,
            RuleType::FileContentMatch,
            RuleType::FolderStructure,
        ]
    );
    let validity: Vec<_> = report.results.iter().map(|result| result.is_valid).collect();
    assert_eq!(validity, vec![true, false, false, true]);

    assert_eq!(report.summary.total_rules, report.results.len());
    assert_eq!(report.summary.passed_rules, 2);
    assert_eq!(report.summary.failed_rules, 2);
    assert_eq!(
        report.summary.passed_rules + report.summary.failed_rules,
        report.summary.total_rules
    );
    assert!(!report.is_valid);
}

#[test]
fn size_limit_is_inclusive() {
    let at_limit = catalog_with(vec![max_size("size", 1024)], Some(1024));
    let report = engine(&at_limit).validate("d-1", None).expect("validate");
    assert!(report.is_valid);
    assert_eq!(report.results[0].message, "File size 1 KB is within limit");

    let over = catalog_with(vec![max_size("size", 1024)], Some(1025));
    let report = engine(&over).validate("d-1", None).expect("validate");
    assert!(!report.is_valid);
    assert_eq!(
        report.results[0].message,
        "File size 1 KB exceeds maximum of 1 KB"
    );
    let details = report.results[0].details.as_ref().expect("details");
    assert_eq!(details["actual_size"], json!(1025));
    assert_eq!(details["max_size"], json!(1024));
}

#[test]
fn presence_accepts_basename_or_full_path() {
    let catalog = catalog_with(
        vec![
            presence("by-name", "README.md"),
            presence("by-path", "src/README.md"),
            presence("absent", "LICENSE"),
        ],
        None,
    );
    let archive = project_archive();
    let report = engine(&catalog)
        .validate("d-1", Some(archive.as_slice()))
        .expect("validate");

    assert!(report.results[0].is_valid);
    assert!(report.results[1].is_valid);
    assert!(!report.results[2].is_valid);
    assert_eq!(
        report.results[2].message,
        "Required file 'LICENSE' not found in archive"
    );
    let found = &report.results[0].details.as_ref().expect("details")["found_files"];
    assert_eq!(
        found,
        &json!(["src/index.js", "src/README.md", "package.json", "extra.txt"])
    );
}

#[test]
fn regex_rule_matches_package_name() {
    let catalog = catalog_with(
        vec![content(
            "pkg-name",
            "package.json",
            r#""name"\s*:\s*"test-project""#,
            MatchType::Regex,
        )],
        None,
    );
    let archive = project_archive();
    let report = engine(&catalog)
        .validate("d-1", Some(archive.as_slice()))
        .expect("validate");
    assert!(report.is_valid);
}

#[test]
fn malformed_regex_yields_invalid_result() {
    let rules = vec![content("bad", "package.json", "[", MatchType::Regex)];
    let archive = project_archive();
    let report = validate_rules(
        &rules,
        &Deliverable::new("d-1", "p-1"),
        Some(archive.as_slice()),
        &EvaluateOptions::default(),
    );
    assert_eq!(report.summary.failed_rules, 1);
    assert!(report.results[0].message.contains("'['"));
}

#[test]
fn folder_structure_ignores_extras_and_reports_missing() {
    let archive = project_archive();
    let deliverable = Deliverable::new("d-1", "p-1");
    let options = EvaluateOptions::default();

    let satisfied = vec![layout("layout", r#"{"src": {"index.js": "file"}}"#)];
    let report = validate_rules(&satisfied, &deliverable, Some(archive.as_slice()), &options);
    assert!(report.is_valid);
    assert_eq!(
        report.results[0].message,
        "Folder structure matches expected structure"
    );

    let missing_file = zip_bytes(&[("src/", ""), ("src/app.js", ""), ("extra.txt", "")]);
    let report = validate_rules(&satisfied, &deliverable, Some(missing_file.as_slice()), &options);
    assert!(!report.is_valid);
    assert!(report.results[0].message.contains("src/index.js"));
    let details = report.results[0].details.as_ref().expect("details");
    assert_eq!(details["missing_paths"], json!(["src/index.js"]));
    assert_eq!(details["extra_paths"], json!([]));
}

#[test]
fn unknown_deliverable_is_an_error() {
    let catalog = catalog_with(vec![presence("readme", "README.md")], None);
    let err = engine(&catalog)
        .validate("d-404", None)
        .expect_err("missing deliverable");
    assert!(matches!(err, EvalError::DeliverableNotFound(id) if id == "d-404"));
}

#[test]
fn dangling_assignment_is_a_bad_request() {
    let mut catalog = catalog_with(vec![presence("readme", "README.md")], None);
    catalog.rules.clear();
    let err = engine(&catalog)
        .validate("d-1", None)
        .expect_err("dangling rule");
    assert!(matches!(err, EvalError::BadRequest(_)));
}

#[test]
fn missing_buffer_fails_archive_rules_only() {
    let catalog = catalog_with(
        vec![
            max_size("size", 10),
            presence("readme", "README.md"),
            layout("layout", r#"{"src": "file"}"#),
        ],
        Some(5),
    );
    let report = engine(&catalog).validate("d-1", None).expect("validate");
    assert!(report.results[0].is_valid);
    for result in &report.results[1..] {
        assert!(!result.is_valid);
        assert_eq!(result.message, "No file buffer provided for validation");
    }
}

#[test]
fn corrupt_archive_fails_every_archive_rule() {
    let catalog = catalog_with(
        vec![
            presence("readme", "README.md"),
            content("pkg", "package.json", "name", MatchType::Contains),
            max_size("size", 100),
        ],
        Some(10),
    );
    let report = engine(&catalog)
        .validate("d-1", Some(&b"this is not a zip archive"[..]))
        .expect("validate");
    assert!(report.results[0].message.starts_with("Error reading archive:"));
    assert!(report.results[1].message.starts_with("Error reading archive:"));
    assert!(report.results[2].is_valid);
    assert_eq!(report.summary.failed_rules, 2);
}

#[test]
fn project_without_rules_is_valid() {
    let catalog = catalog_with(Vec::new(), None);
    let report = engine(&catalog).validate("d-1", None).expect("validate");
    assert!(report.is_valid);
    assert_eq!(report.summary.total_rules, 0);
}

#[test]
fn catalog_with_broken_rules_still_yields_a_full_report() {
    let catalog_json = json!({
        "catalog_version": "0.1",
        "projects": [{"id": "p-1"}, {"id": "p-2"}],
        "rules": [
            {"id": "size", "type": "max_size_file", "max_size": 1048576},
            {"id": "readme", "type": "file_presence", "file_name": "README.md"},
            {
                "id": "bad-regex",
                "type": "file_content_match",
                "file_name": "package.json",
                "pattern": "[",
                "match_type": "regex"
            },
            {"id": "bad-layout", "type": "folder_structure", "expected_structure": "{not json"}
        ],
        "deliverables": [{"id": "d-1", "project_id": "p-1", "archive_size": 2048}],
        "assignments": [
            {"rule_id": "size", "project_id": "p-1"},
            {"rule_id": "bad-regex", "project_id": "p-1"},
            {"rule_id": "readme", "project_id": "p-1"},
            {"rule_id": "bad-layout", "project_id": "p-2"}
        ]
    });
    let schema = catalog_json_schema_value().expect("serialize schema");
    let loaded = load_catalog_document(&catalog_json, &schema).expect("catalog loads");
    let codes: Vec<_> = loaded.warnings.iter().map(|issue| issue.code.as_str()).collect();
    assert!(codes.contains(&"regex_invalid"));
    assert!(codes.contains(&"structure_invalid"));

    let archive = project_archive();
    let report = engine(&loaded.catalog)
        .validate("d-1", Some(archive.as_slice()))
        .expect("validate");

    let ids: Vec<_> = report.results.iter().map(|result| result.rule_id.as_str()).collect();
    assert_eq!(ids, vec!["size", "bad-regex", "readme"]);
    assert!(report.results[0].is_valid);
    assert!(!report.results[1].is_valid);
    assert!(report.results[1].message.starts_with("Invalid regex pattern '['"));
    assert!(report.results[2].is_valid);
    assert_eq!(report.summary.failed_rules, 1);
}

#[test]
fn unreadable_entry_fails_only_its_own_rule() {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    writer.start_file("a.txt", stored).expect("start file");
    writer.write_all(b"hello world").expect("write file");
    let mut archive = writer.finish().expect("finish zip").into_inner();

    // stored data sits verbatim in the buffer; flipping a byte breaks the crc
    let at = archive
        .windows(b"hello world".len())
        .position(|window| window == b"hello world")
        .expect("stored content");
    archive[at] ^= 0x20;

    let catalog = catalog_with(
        vec![
            content("greeting", "a.txt", "hello", MatchType::Contains),
            presence("present", "a.txt"),
        ],
        None,
    );
    let report = engine(&catalog)
        .validate("d-1", Some(archive.as_slice()))
        .expect("validate");

    assert!(!report.results[0].is_valid);
    assert!(
        report.results[0].message.starts_with("Validation error:"),
        "unexpected message: {}",
        report.results[0].message
    );
    assert!(report.results[1].is_valid);
    assert_eq!(report.summary.total_rules, 2);
    assert_eq!(report.summary.failed_rules, 1);
}

#[test]
fn directory_entries_match_presence_but_have_no_content() {
    let archive = zip_bytes(&[("docs/", ""), ("docs/guide.md", "# Guide")]);
    let catalog = catalog_with(
        vec![
            presence("dir", "docs/"),
            presence("bare", "docs"),
            content("dir-content", "docs/", "Guide", MatchType::Contains),
        ],
        None,
    );
    let report = engine(&catalog)
        .validate("d-1", Some(archive.as_slice()))
        .expect("validate");

    assert!(report.results[0].is_valid);
    assert!(!report.results[1].is_valid);
    assert!(!report.results[2].is_valid);
    assert_eq!(report.results[2].message, "File 'docs/' not found in archive");
}
