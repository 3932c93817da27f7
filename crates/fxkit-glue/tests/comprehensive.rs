//! Comprehensive tests for fxkit-glue
//!
//! Parse/write fidelity and malformed input handling.

use fxkit_glue::{GlueDocument, GlueElement, GlueError, GlueNode, GlueParser, GlueSerializer};

fn round_trip(text: &str) -> String {
    let doc = GlueParser::new().parse(text).unwrap();
    GlueSerializer::new(false).serialize(&doc)
}

// ============================================================================
// ROUND TRIP
// ============================================================================

#[test]
fn test_round_trip_unformatted() {
    let text = r#"<Pane><children><Button text="Included Button"/></children></Pane>"#;
    assert_eq!(round_trip(text), text);
}

#[test]
fn test_round_trip_attribute_order() {
    let text = r#"<Button text="a" fx:id="b" layoutX="1" layoutY="2" xmlns:fx="http://javafx.com/fxml/1"/>"#;
    assert_eq!(round_trip(text), text);
}

#[test]
fn test_round_trip_script_body() {
    let text = "<VBox>\n    <fx:script>\n        function go() { return 1; }\n    </fx:script>\n</VBox>";
    assert_eq!(round_trip(text), text);
}

#[test]
fn test_round_trip_cdata() {
    let text = "<fx:script><![CDATA[if (a < b) {}]]></fx:script>";
    assert_eq!(round_trip(text), text);
}

#[test]
fn test_round_trip_escaped_text() {
    let text = "<text>a &amp; b &lt; c</text>";
    assert_eq!(round_trip(text), text);
}

#[test]
fn test_round_trip_full_document() {
    let text = r#"<?xml version="1.0" encoding="UTF-8"?>

<!-- Copyright header -->

<?import javafx.scene.control.*?>
<?import javafx.scene.layout.VBox?>

<VBox spacing="4.0" xmlns="http://javafx.com/javafx/8" xmlns:fx="http://javafx.com/fxml/1">
    <children>
        <!-- first -->
        <Label text="Name" />
        <TextField fx:id="name" promptText="Your name"/>
    </children>
</VBox>
"#;
    let doc = GlueParser::new().parse(text).unwrap();
    let written = GlueSerializer::new(false).serialize(&doc);
    // Self-closing tags are written without the space before "/>"
    assert_eq!(written.trim(), text.replace("\" />", "\"/>").trim());
}

// ============================================================================
// STRUCTURE
// ============================================================================

#[test]
fn test_imports_are_instructions() {
    let text = "<?import a.B?><?import c.*?><B/>";
    let doc = GlueParser::new().parse(text).unwrap();
    let imports: Vec<_> = doc.instructions("import").collect();
    assert_eq!(imports, vec!["a.B", "c.*"]);
}

#[test]
fn test_entities_unescaped_in_attributes() {
    let doc = GlueParser::new()
        .parse(r#"<Label text="Tom &amp; Jerry &#65;"/>"#)
        .unwrap();
    assert_eq!(doc.root.unwrap().attribute("text"), Some("Tom & Jerry A"));
}

#[test]
fn test_build_and_write_synthetic_tree() {
    let mut doc = GlueDocument::with_declaration();
    let button = GlueElement::synthetic("Button").with_attribute("text", "OK");
    let children = GlueElement::synthetic("children").with_child(GlueNode::Element(button));
    doc.root = Some(GlueElement::synthetic("Pane").with_child(GlueNode::Element(children)));
    doc.update_indent();

    let text = GlueSerializer::new(false).serialize(&doc);
    assert_eq!(
        text,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Pane>\n    <children>\n        <Button text=\"OK\"/>\n    </children>\n</Pane>"
    );
}

// ============================================================================
// MALFORMED INPUT
// ============================================================================

#[test]
fn test_empty_input_has_no_root() {
    let doc = GlueParser::new().parse("").unwrap();
    assert!(doc.is_empty());
}

#[test]
fn test_multiple_roots_rejected() {
    let err = GlueParser::new().parse("<a/><b/>").unwrap_err();
    assert!(matches!(err, GlueError::Malformed { .. }));
}

#[test]
fn test_text_outside_root_rejected() {
    assert!(GlueParser::new().parse("hello <a/>").is_err());
}

#[test]
fn test_unknown_entity_rejected() {
    assert!(GlueParser::new().parse("<a>&nbsp;</a>").is_err());
}

#[test]
fn test_error_location_is_one_based() {
    let err = GlueParser::new().parse("<a>\n<b>\n</c>\n</a>").unwrap_err();
    let (line, column) = err.location();
    assert_eq!(line, 3);
    assert!(column >= 1);
}
