//! Comprehensive tests for fxkit-fxom
//!
//! Round trips, cloning, references and error reports over whole documents.

use std::sync::Arc;

use fxkit_fxom::{
    structurally_equal, CloneOptions, ErrorKind, ErrorReport, FxomDocument, FxomFragment,
    IdPolicy, LoadContext, MemoryLoader, ObjectKind, ReferenceSite, SaveOptions,
};
use url::Url;

fn parse(text: &str) -> FxomDocument {
    FxomDocument::parse(text, &LoadContext::default()).unwrap()
}

const FORM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>

<?import javafx.scene.control.*?>
<?import javafx.scene.layout.*?>

<GridPane xmlns:fx="http://javafx.com/fxml/1" fx:controller="app.Form" hgap="8">
    <columnConstraints>
        <ColumnConstraints minWidth="80"/>
    </columnConstraints>
    <children>
        <Label fx:id="nameLabel" text="Name" GridPane.rowIndex="0"/>
        <TextField fx:id="name" promptText="$nameLabel" GridPane.columnIndex="1"/>
        <!-- actions -->
        <HBox spacing="4" GridPane.rowIndex="1">
            <Button fx:id="ok" text="OK" defaultButton="true"/>
            <Button text="Cancel" cancelButton="true"/>
        </HBox>
    </children>
</GridPane>
"#;

// ============================================================================
// ROUND TRIP
// ============================================================================

#[test]
fn test_round_trip_scenario() {
    let text = r#"<Pane><children><Button text="Included Button"/></children></Pane>"#;
    let doc = parse(text);
    let saved = doc.save(&SaveOptions::for_version("1".parse().unwrap()));
    assert_eq!(saved.text.trim(), text.trim());
}

#[test]
fn test_round_trip_form() {
    let doc = parse(FORM);
    assert_eq!(doc.to_text(), FORM);
    assert_eq!(doc.index().len(), 3);
}

#[test]
fn test_round_trip_after_reparse() {
    let once = parse(FORM).to_text();
    let twice = parse(&once).to_text();
    assert_eq!(once, twice);
}

#[test]
fn test_static_properties_kept() {
    let doc = parse(FORM);
    let name = doc.lookup("name").unwrap();
    let static_names: Vec<String> = doc
        .object(name)
        .unwrap()
        .properties()
        .iter()
        .map(|p| doc.property(*p).unwrap().name().to_string())
        .filter(|n| n.contains('.'))
        .collect();
    assert_eq!(static_names, ["GridPane.columnIndex"]);
}

// ============================================================================
// COLLECTORS
// ============================================================================

#[test]
fn test_collectors() {
    let doc = parse(FORM);
    assert_eq!(doc.comments().count(), 1);
    assert_eq!(doc.scripts().count(), 0);
    assert_eq!(doc.instances().count(), 7);

    let sites: Vec<ReferenceSite> = doc.references().collect();
    assert_eq!(sites.len(), 1);
    assert_eq!(doc.resolve_site(sites[0]), doc.lookup("nameLabel"));
    assert_eq!(doc.site_object(sites[0]), doc.lookup("name"));
}

// ============================================================================
// CLONING
// ============================================================================

#[test]
fn test_every_object_clones_equal() {
    let mut doc = parse(FORM);
    let objects: Vec<_> = doc.walk().collect();
    for id in objects {
        let copy = doc.clone_object(id, CloneOptions::subtree()).unwrap();
        assert_ne!(copy, id);
        assert!(structurally_equal(&doc, id, &doc, copy));
    }
}

#[test]
fn test_paste_with_renamed_ids() {
    let mut doc = parse(FORM);
    let ok = doc.lookup("ok").unwrap();
    let fragment = FxomFragment::extract(&doc, ok).unwrap();
    let copy = doc
        .adopt(&fragment, CloneOptions::subtree().with_ids(IdPolicy::Rename))
        .unwrap();
    let row = doc.parent_property(ok).unwrap();
    doc.add_value(row, copy, None).unwrap();
    assert_eq!(doc.lookup("ok1"), Some(copy));
    assert_eq!(doc.lookup("ok"), Some(ok));
}

#[test]
fn test_clone_document_is_independent() {
    let doc = parse(FORM);
    let mut copy = doc.clone_document().unwrap();
    let ok = copy.lookup("ok").unwrap();
    copy.remove_value(ok).unwrap();
    assert!(doc.lookup("ok").is_some());
    assert!(copy.lookup("ok").is_none());
    assert_eq!(doc.to_text(), FORM);
}

// ============================================================================
// REFERENCES
// ============================================================================

#[test]
fn test_missing_reference_resolves_to_nothing() {
    let doc = parse(r#"<VBox><children><fx:reference source="myRef"/></children></VBox>"#);
    let site = doc.references().next().unwrap();
    assert_eq!(doc.resolve_site(site), None);
    assert!(doc.lookup("myRef").is_none());
}

#[test]
fn test_reference_follows_target_removal() {
    let mut doc = parse(
        r#"<VBox><children><Label fx:id="target"/><fx:reference source="target"/></children></VBox>"#,
    );
    let target = doc.lookup("target").unwrap();
    let site = doc.references().next().unwrap();
    assert_eq!(doc.resolve_site(site), Some(target));
    doc.remove_value(target).unwrap();
    assert_eq!(doc.resolve_site(site), None);
}

// ============================================================================
// INCLUDES AND ERROR REPORT
// ============================================================================

#[test]
fn test_include_embeds_and_saves_marker() {
    let loader = MemoryLoader::new().with(
        &Url::parse("mem:/app/toolbar.fxml").unwrap(),
        r#"<ToolBar fx:id="bar"><items><Button fx:id="ok"/></items></ToolBar>"#,
    );
    let context = LoadContext::default()
        .with_location(Url::parse("mem:/app/main.fxml").unwrap())
        .with_loader(Arc::new(loader));
    let text = r#"<BorderPane><top><fx:include fx:id="tools" source="toolbar.fxml"/></top><center><Button fx:id="ok"/></center></BorderPane>"#;
    let doc = FxomDocument::parse(text, &context).unwrap();

    let include = doc.lookup("tools").unwrap();
    let ObjectKind::Intrinsic(intrinsic) = doc.object(include).unwrap().kind() else {
        panic!("expected an intrinsic");
    };
    assert_eq!(intrinsic.tag(), "fx:include");
    assert_eq!(doc.to_text(), text);
    assert!(ErrorReport::collect(&doc).is_empty());
}

#[test]
fn test_error_report_scenario() {
    let text = r#"<VBox stylesheets="@theme.css"><children><com.acme.Gauge/><fx:include source="nowhere.fxml"/><Label text="%missing"/></children></VBox>"#;
    let context = LoadContext::default()
        .with_location(Url::parse("mem:/main.fxml").unwrap())
        .with_loader(Arc::new(MemoryLoader::new()));
    let doc = FxomDocument::parse(text, &context).unwrap();

    let mut report = ErrorReport::new();
    let kinds: Vec<ErrorKind> = report.query(&doc).iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        [
            ErrorKind::UnresolvedLocation,
            ErrorKind::UnresolvedClass,
            ErrorKind::UnresolvedLocation,
            ErrorKind::UnresolvedResource,
        ]
    );
    // Document stays usable and round-trips
    assert_eq!(doc.to_text(), text);
}
