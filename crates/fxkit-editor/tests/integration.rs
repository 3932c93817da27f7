//! Integration tests for fxkit-editor
//!
//! Whole editing sessions against files on disk: open, edit, save, library
//! scanning and the command line tool.

use std::path::Path;
use std::process::Command;

use fxkit_editor::{Editor, EditorConfig, EditorError};
use fxkit_fxom::{ErrorKind, ReferenceSite};
use fxkit_job::{InsertFragmentJob, InsertTarget, ModifyValueJob};
use fxkit_metadata::PropertyName;

const MAIN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>

<?import javafx.scene.control.*?>
<?import javafx.scene.layout.*?>

<VBox xmlns:fx="http://javafx.com/fxml/1" fx:controller="app.Main">
    <Label fx:id="title" text="Title"/>
    <fx:include source="row.fxml"/>
    <Button text="Go">
        <graphic>
            <fx:reference source="title"/>
        </graphic>
    </Button>
    <fx:script>function go() {}</fx:script>
</VBox>
"#;

const ROW: &str = r#"<HBox><Button fx:id="title" text="Inner"/></HBox>"#;

const CATALOG: &str = r#"[
    { "qualified_name": "acme.Gauge", "superclass": "javafx.scene.layout.Region",
      "properties": [ { "name": "level", "value": "Double" } ] }
]"#;

fn write(dir: &Path, name: &str, text: &str) {
    std::fs::write(dir.join(name), text).unwrap();
}

// ============================================================================
// SESSION
// ============================================================================

#[test]
fn test_open_edit_save() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.fxml", MAIN);
    write(dir.path(), "row.fxml", ROW);

    let editor = Editor::new(EditorConfig::default()).unwrap();
    let mut document = editor.open(dir.path().join("main.fxml")).unwrap();
    assert!(document.query_errors().is_empty());
    assert_eq!(document.save().text, MAIN);

    let title = document.document().lookup("title").unwrap();
    let job = ModifyValueJob::new(document.document(), title, PropertyName::new("text"), Some("Welcome".into()));
    document.push_job(Box::new(job)).unwrap();
    assert!(document.is_dirty());

    document.write().unwrap();
    assert!(!document.is_dirty());
    let saved = std::fs::read_to_string(dir.path().join("main.fxml")).unwrap();
    assert_eq!(saved, MAIN.replace(r#"text="Title""#, r#"text="Welcome""#));

    // Saved state is tracked through the history
    document.undo().unwrap();
    assert!(document.is_dirty());
    document.redo().unwrap();
    assert!(!document.is_dirty());
}

#[test]
fn test_collectors() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.fxml", MAIN);
    write(dir.path(), "row.fxml", ROW);

    let editor = Editor::new(EditorConfig::default()).unwrap();
    let document = editor.open(dir.path().join("main.fxml")).unwrap();
    assert_eq!(document.scripts().count(), 1);
    assert_eq!(document.comments().count(), 0);

    let references: Vec<ReferenceSite> = document.references().collect();
    assert_eq!(references.len(), 1);
    // The included document has its own ids
    let target = document.document().resolve_site(references[0]).unwrap();
    assert_eq!(document.document().lookup("title"), Some(target));
}

#[test]
fn test_missing_include_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.fxml", MAIN);

    let editor = Editor::new(EditorConfig::default()).unwrap();
    let mut document = editor.open(dir.path().join("main.fxml")).unwrap();
    let kinds: Vec<ErrorKind> = document.query_errors().iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![ErrorKind::UnresolvedLocation]);

    // The document stays editable and round-trips
    assert_eq!(document.save().text, MAIN);

    write(dir.path(), "row.fxml", ROW);
    let mut reopened = editor.open(dir.path().join("main.fxml")).unwrap();
    assert!(reopened.query_errors().is_empty());
}

#[test]
fn test_errors_follow_stylesheet_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.fxml", r#"<VBox stylesheets="@app.css"/>"#);

    let editor = Editor::new(EditorConfig::default()).unwrap();
    let mut document = editor.open(dir.path().join("main.fxml")).unwrap();
    let kinds = |document: &mut fxkit_editor::EditorDocument| -> Vec<ErrorKind> {
        document.query_errors().iter().map(|e| e.kind).collect()
    };
    assert_eq!(kinds(&mut document), vec![ErrorKind::UnresolvedLocation]);

    write(dir.path(), "app.css", "..root { }");
    assert_eq!(kinds(&mut document), vec![ErrorKind::InvalidEmbeddedContent]);

    write(dir.path(), "app.css", ".root { -fx-padding: 4; }");
    assert!(kinds(&mut document).is_empty());

    std::fs::remove_file(dir.path().join("app.css")).unwrap();
    assert_eq!(kinds(&mut document), vec![ErrorKind::UnresolvedLocation]);
}

#[test]
fn test_open_missing_file() {
    let editor = Editor::new(EditorConfig::default()).unwrap();
    let result = editor.open("/nonexistent/main.fxml");
    assert!(matches!(result, Err(EditorError::Io { .. })));
}

#[test]
fn test_malformed_document() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "bad.fxml", "<VBox><Label></VBox>");
    let editor = Editor::new(EditorConfig::default()).unwrap();
    let result = editor.open(dir.path().join("bad.fxml"));
    assert!(matches!(result, Err(EditorError::Document(_))));
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[test]
fn test_config_file_with_catalog() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "acme.json", CATALOG);
    let config = format!(
        r#"{{ "compact": true, "history_limit": 1, "catalogs": [{:?}] }}"#,
        dir.path().join("acme.json")
    );
    write(dir.path(), "fxkit.json", &config);

    let config = EditorConfig::load(dir.path().join("fxkit.json")).unwrap();
    assert!(config.compact);
    let editor = Editor::new(config).unwrap();
    assert!(editor.registry().lookup("acme.Gauge").is_some());

    let mut document = editor
        .parse("<VBox>\n    <!-- note -->\n    <Gauge level=\"0.5\"/>\n</VBox>", None, None)
        .unwrap();
    assert_eq!(document.save().text, "<VBox><Gauge level=\"0.5\"/></VBox>");
    assert!(document.query_errors().is_empty());
}

#[test]
fn test_history_limit_from_config() {
    let config = EditorConfig {
        history_limit: 1,
        ..EditorConfig::default()
    };
    let editor = Editor::new(config).unwrap();
    let mut document = editor.parse(r#"<Label text="a"/>"#, None, None).unwrap();
    for value in ["b", "c"] {
        let root = document.document().root().unwrap();
        let job = ModifyValueJob::new(document.document(), root, PropertyName::new("text"), Some(value.into()));
        document.push_job(Box::new(job)).unwrap();
    }
    assert_eq!(document.history().len(), 1);
    document.undo().unwrap();
    assert!(matches!(document.undo(), Err(EditorError::Job(_))));
}

#[test]
fn test_bad_catalog_path() {
    let config = EditorConfig {
        catalogs: vec!["/nonexistent/catalog.json".into()],
        ..EditorConfig::default()
    };
    assert!(matches!(Editor::new(config), Err(EditorError::Io { .. })));
}

// ============================================================================
// LIBRARY
// ============================================================================

#[test]
fn test_scan_apply_and_insert() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "acme.json", CATALOG);
    write(dir.path(), "toolbar.fxml", r#"<HBox><Button fx:id="title" text="Save"/></HBox>"#);

    let config = EditorConfig {
        library_paths: vec![dir.path().to_path_buf()],
        ..EditorConfig::default()
    };
    let mut editor = Editor::new(config).unwrap();
    let handle = editor.scan_library();
    let library = handle.wait().completed().unwrap();
    assert_eq!(editor.apply_library(library), 2);
    assert_eq!(editor.library_items()[0].root_type, "HBox");

    let mut document = editor
        .parse(r#"<VBox><Label fx:id="title"/></VBox>"#, None, None)
        .unwrap();
    let root = document.document().root().unwrap();
    let fragment = editor.library_fragment("toolbar").unwrap();
    let job = InsertFragmentJob::new(
        fragment,
        InsertTarget::Owner {
            owner: root,
            name: None,
            position: None,
        },
    );
    document.push_job(Box::new(job)).unwrap();

    // The pasted id collided and was renamed
    let pasted = document.document().lookup("title1").unwrap();
    assert_eq!(document.document().text_value(pasted, "text"), Some("Save"));
    document.undo().unwrap();
    assert!(document.document().lookup("title1").is_none());
}

#[test]
fn test_cancelled_scan_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "acme.json", CATALOG);
    let config = EditorConfig {
        library_paths: vec![dir.path().to_path_buf()],
        ..EditorConfig::default()
    };
    let editor = Editor::new(config).unwrap();
    let components = editor.registry().len();

    let handle = editor.scan_library();
    handle.cancel();
    // Cancelled late or early, the outcome carries no result
    assert!(handle.wait().completed().is_none());
    assert_eq!(editor.registry().len(), components);
}

// ============================================================================
// COMMAND LINE
// ============================================================================

fn fxkit(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_fxkit"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

#[test]
fn test_cli_format() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.fxml", MAIN);
    write(dir.path(), "row.fxml", ROW);
    let file = dir.path().join("main.fxml");

    let output = fxkit(&["format", file.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), MAIN);

    let output = fxkit(&["format", file.to_str().unwrap(), "--compact"]);
    let compact = String::from_utf8(output.stdout).unwrap();
    assert!(!compact.contains("\n    "));
    assert!(compact.contains("<fx:script>function go() {}</fx:script>"));
}

#[test]
fn test_cli_check() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.fxml", MAIN);
    let file = dir.path().join("main.fxml");

    let output = fxkit(&["check", file.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8(output.stdout).unwrap().contains("row.fxml"));

    write(dir.path(), "row.fxml", ROW);
    let output = fxkit(&["check", file.to_str().unwrap()]);
    assert!(output.status.success());
}

#[test]
fn test_cli_usage_errors() {
    assert!(!fxkit(&[]).status.success());
    assert!(!fxkit(&["lint", "x.fxml"]).status.success());
    assert!(!fxkit(&["format"]).status.success());
}
