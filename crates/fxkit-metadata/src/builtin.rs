//! Built-in component catalog
//!
//! The common layout and control classes with the properties the editor
//! needs to bind markup to. Not exhaustive: unknown properties are still
//! kept by the document model, they just have no descriptor.

use crate::{ComponentDescriptor, PropertyDescriptor, ValueKind};

const POS: &[&str] = &[
    "TOP_LEFT", "TOP_CENTER", "TOP_RIGHT",
    "CENTER_LEFT", "CENTER", "CENTER_RIGHT",
    "BOTTOM_LEFT", "BOTTOM_CENTER", "BOTTOM_RIGHT",
    "BASELINE_LEFT", "BASELINE_CENTER", "BASELINE_RIGHT",
];
const PRIORITY: &[&str] = &["ALWAYS", "SOMETIMES", "NEVER"];
const ORIENTATION: &[&str] = &["HORIZONTAL", "VERTICAL"];
const SIDE: &[&str] = &["TOP", "BOTTOM", "LEFT", "RIGHT"];
const HPOS: &[&str] = &["LEFT", "CENTER", "RIGHT"];
const VPOS: &[&str] = &["TOP", "CENTER", "BASELINE", "BOTTOM"];

fn text(name: &str) -> PropertyDescriptor {
    PropertyDescriptor::new(name, ValueKind::Text)
}

fn boolean(name: &str, default: bool) -> PropertyDescriptor {
    PropertyDescriptor::new(name, ValueKind::Boolean).with_default(default.to_string())
}

fn double(name: &str, default: &str) -> PropertyDescriptor {
    PropertyDescriptor::new(name, ValueKind::Double).with_default(default)
}

fn integer(name: &str, default: &str) -> PropertyDescriptor {
    PropertyDescriptor::new(name, ValueKind::Integer).with_default(default)
}

fn enumeration(name: &str, values: &[&str], default: Option<&str>) -> PropertyDescriptor {
    let prop = PropertyDescriptor::new(
        name,
        ValueKind::Enum {
            values: values.iter().map(|v| v.to_string()).collect(),
        },
    );
    match default {
        Some(d) => prop.with_default(d),
        None => prop,
    }
}

fn component(name: &str) -> PropertyDescriptor {
    PropertyDescriptor::new(name, ValueKind::Component { collection: false })
}

fn components(name: &str) -> PropertyDescriptor {
    PropertyDescriptor::new(name, ValueKind::Component { collection: true })
}

fn urls(name: &str) -> PropertyDescriptor {
    PropertyDescriptor::new(name, ValueKind::Url { collection: true })
}

fn class(name: &str, superclass: Option<&str>) -> ComponentDescriptor {
    let desc = ComponentDescriptor::new(name);
    match superclass {
        Some(s) => desc.extends(s),
        None => desc,
    }
}

const NODE: &str = "javafx.scene.Node";
const PARENT: &str = "javafx.scene.Parent";
const REGION: &str = "javafx.scene.layout.Region";
const PANE: &str = "javafx.scene.layout.Pane";
const CONTROL: &str = "javafx.scene.control.Control";
const LABELED: &str = "javafx.scene.control.Labeled";
const BUTTON_BASE: &str = "javafx.scene.control.ButtonBase";
const TEXT_INPUT: &str = "javafx.scene.control.TextInputControl";
const MENU_ITEM: &str = "javafx.scene.control.MenuItem";
const SHAPE: &str = "javafx.scene.shape.Shape";

pub(crate) fn catalog() -> Vec<ComponentDescriptor> {
    vec![
        // Scene graph roots
        class(NODE, None)
            .abstract_type()
            .property(text("id"))
            .property(text("style"))
            .property(text("styleClass"))
            .property(boolean("disable", false))
            .property(boolean("visible", true))
            .property(boolean("managed", true))
            .property(boolean("mouseTransparent", false))
            .property(double("opacity", "1.0"))
            .property(double("layoutX", "0.0"))
            .property(double("layoutY", "0.0"))
            .property(double("rotate", "0.0"))
            .property(double("translateX", "0.0"))
            .property(double("translateY", "0.0"))
            .property(double("scaleX", "1.0"))
            .property(double("scaleY", "1.0"))
            .property(component("effect"))
            .property(component("clip"))
            .property(text("accessibleText").since("8"))
            .property(double("viewOrder", "0.0").since("9")),
        class(PARENT, Some(NODE))
            .abstract_type()
            .property(urls("stylesheets")),
        class("javafx.scene.Group", Some(PARENT))
            .property(components("children"))
            .property(boolean("autoSizeChildren", true))
            .default_property("children"),
        // Layout
        class(REGION, Some(PARENT))
            .property(double("prefWidth", "-1.0"))
            .property(double("prefHeight", "-1.0"))
            .property(double("minWidth", "-1.0"))
            .property(double("minHeight", "-1.0"))
            .property(double("maxWidth", "-1.0"))
            .property(double("maxHeight", "-1.0"))
            .property(component("padding"))
            .property(component("background"))
            .property(component("border")),
        class(PANE, Some(REGION))
            .property(components("children"))
            .default_property("children"),
        class("javafx.scene.layout.VBox", Some(PANE))
            .property(double("spacing", "0.0"))
            .property(enumeration("alignment", POS, Some("TOP_LEFT")))
            .property(boolean("fillWidth", true))
            .static_property(enumeration("vgrow", PRIORITY, None))
            .static_property(component("margin")),
        class("javafx.scene.layout.HBox", Some(PANE))
            .property(double("spacing", "0.0"))
            .property(enumeration("alignment", POS, Some("TOP_LEFT")))
            .property(boolean("fillHeight", true))
            .static_property(enumeration("hgrow", PRIORITY, None))
            .static_property(component("margin")),
        class("javafx.scene.layout.StackPane", Some(PANE))
            .property(enumeration("alignment", POS, Some("CENTER")))
            .static_property(enumeration("alignment", POS, None))
            .static_property(component("margin")),
        class("javafx.scene.layout.AnchorPane", Some(PANE))
            .static_property(double("topAnchor", "-1.0"))
            .static_property(double("bottomAnchor", "-1.0"))
            .static_property(double("leftAnchor", "-1.0"))
            .static_property(double("rightAnchor", "-1.0")),
        class("javafx.scene.layout.BorderPane", Some(PANE))
            .property(component("top"))
            .property(component("bottom"))
            .property(component("left"))
            .property(component("right"))
            .property(component("center"))
            .static_property(enumeration("alignment", POS, None))
            .static_property(component("margin")),
        class("javafx.scene.layout.FlowPane", Some(PANE))
            .property(double("hgap", "0.0"))
            .property(double("vgap", "0.0"))
            .property(enumeration("orientation", ORIENTATION, Some("HORIZONTAL"))),
        class("javafx.scene.layout.GridPane", Some(PANE))
            .property(double("hgap", "0.0"))
            .property(double("vgap", "0.0"))
            .property(boolean("gridLinesVisible", false))
            .property(components("columnConstraints"))
            .property(components("rowConstraints"))
            .static_property(integer("rowIndex", "0"))
            .static_property(integer("columnIndex", "0"))
            .static_property(integer("rowSpan", "1"))
            .static_property(integer("columnSpan", "1"))
            .static_property(enumeration("halignment", HPOS, None))
            .static_property(enumeration("valignment", VPOS, None))
            .static_property(enumeration("hgrow", PRIORITY, None))
            .static_property(enumeration("vgrow", PRIORITY, None))
            .static_property(component("margin")),
        class("javafx.scene.layout.ColumnConstraints", None)
            .property(double("percentWidth", "-1.0"))
            .property(double("minWidth", "-1.0"))
            .property(double("prefWidth", "-1.0"))
            .property(enumeration("hgrow", PRIORITY, None)),
        class("javafx.scene.layout.RowConstraints", None)
            .property(double("percentHeight", "-1.0"))
            .property(double("minHeight", "-1.0"))
            .property(double("prefHeight", "-1.0"))
            .property(enumeration("vgrow", PRIORITY, None)),
        class("javafx.geometry.Insets", None)
            .property(double("top", "0.0"))
            .property(double("right", "0.0"))
            .property(double("bottom", "0.0"))
            .property(double("left", "0.0")),
        class("javafx.scene.text.Font", None)
            .property(text("name"))
            .property(double("size", "12.0")),
        // Controls
        class(CONTROL, Some(REGION))
            .abstract_type()
            .property(component("tooltip"))
            .property(component("contextMenu")),
        class(LABELED, Some(CONTROL))
            .abstract_type()
            .property(text("text"))
            .property(component("font"))
            .property(component("graphic"))
            .property(boolean("wrapText", false))
            .property(boolean("underline", false))
            .property(boolean("mnemonicParsing", false))
            .property(text("textFill"))
            .property(enumeration("alignment", POS, Some("CENTER_LEFT")))
            .property(double("lineSpacing", "0.0").since("8")),
        class("javafx.scene.control.Label", Some(LABELED)).property(component("labelFor")),
        class(BUTTON_BASE, Some(LABELED))
            .abstract_type()
            .property(text("onAction")),
        class("javafx.scene.control.Button", Some(BUTTON_BASE))
            .property(boolean("defaultButton", false))
            .property(boolean("cancelButton", false)),
        class("javafx.scene.control.ToggleButton", Some(BUTTON_BASE))
            .property(boolean("selected", false))
            .property(component("toggleGroup")),
        class("javafx.scene.control.RadioButton", Some("javafx.scene.control.ToggleButton")),
        class("javafx.scene.control.CheckBox", Some(BUTTON_BASE))
            .property(boolean("selected", false))
            .property(boolean("indeterminate", false))
            .property(boolean("allowIndeterminate", false)),
        class("javafx.scene.control.ToggleGroup", None),
        class(TEXT_INPUT, Some(CONTROL))
            .abstract_type()
            .property(text("text"))
            .property(text("promptText"))
            .property(boolean("editable", true)),
        class("javafx.scene.control.TextField", Some(TEXT_INPUT))
            .property(integer("prefColumnCount", "12"))
            .property(text("onAction")),
        class("javafx.scene.control.PasswordField", Some("javafx.scene.control.TextField")),
        class("javafx.scene.control.TextArea", Some(TEXT_INPUT))
            .property(boolean("wrapText", false))
            .property(integer("prefRowCount", "10")),
        class("javafx.scene.control.Separator", Some(CONTROL))
            .property(enumeration("orientation", ORIENTATION, Some("HORIZONTAL"))),
        class("javafx.scene.control.ProgressBar", Some(CONTROL)).property(double("progress", "-1.0")),
        class("javafx.scene.control.Slider", Some(CONTROL))
            .property(double("min", "0.0"))
            .property(double("max", "100.0"))
            .property(double("value", "0.0")),
        class("javafx.scene.control.ComboBox", Some(CONTROL))
            .property(text("promptText"))
            .property(components("items")),
        class("javafx.scene.control.ListView", Some(CONTROL)).property(components("items")),
        class("javafx.scene.control.DatePicker", Some(CONTROL))
            .since("8")
            .property(text("promptText")),
        class("javafx.scene.control.Spinner", Some(CONTROL))
            .since("8")
            .property(boolean("editable", false)),
        class("javafx.scene.control.ScrollPane", Some(CONTROL))
            .property(component("content"))
            .property(boolean("fitToWidth", false))
            .property(boolean("fitToHeight", false))
            .default_property("content"),
        class("javafx.scene.control.SplitPane", Some(CONTROL))
            .property(components("items"))
            .property(enumeration("orientation", ORIENTATION, Some("HORIZONTAL")))
            .default_property("items"),
        class("javafx.scene.control.TabPane", Some(CONTROL))
            .property(components("tabs"))
            .property(enumeration("side", SIDE, Some("TOP")))
            .default_property("tabs"),
        class("javafx.scene.control.Tab", None)
            .property(text("text"))
            .property(text("id"))
            .property(component("content"))
            .property(component("graphic"))
            .property(boolean("closable", true))
            .default_property("content"),
        class("javafx.scene.control.TitledPane", Some(LABELED))
            .property(component("content"))
            .property(boolean("expanded", true))
            .property(boolean("collapsible", true))
            .default_property("content"),
        class("javafx.scene.control.Accordion", Some(CONTROL))
            .property(components("panes"))
            .default_property("panes"),
        class("javafx.scene.control.ToolBar", Some(CONTROL))
            .property(components("items"))
            .property(enumeration("orientation", ORIENTATION, Some("HORIZONTAL")))
            .default_property("items"),
        class("javafx.scene.control.MenuBar", Some(CONTROL))
            .property(components("menus"))
            .default_property("menus"),
        class(MENU_ITEM, None)
            .property(text("text"))
            .property(text("id"))
            .property(text("onAction"))
            .property(text("accelerator"))
            .property(boolean("disable", false))
            .property(component("graphic")),
        class("javafx.scene.control.Menu", Some(MENU_ITEM))
            .property(components("items"))
            .default_property("items"),
        class("javafx.scene.control.ContextMenu", None)
            .property(components("items"))
            .default_property("items"),
        class("javafx.scene.control.Tooltip", None).property(text("text")),
        // Shapes and images
        class(SHAPE, Some(NODE))
            .abstract_type()
            .property(text("fill"))
            .property(text("stroke"))
            .property(double("strokeWidth", "1.0")),
        class("javafx.scene.shape.Rectangle", Some(SHAPE))
            .property(double("width", "0.0"))
            .property(double("height", "0.0"))
            .property(double("arcWidth", "0.0"))
            .property(double("arcHeight", "0.0")),
        class("javafx.scene.shape.Circle", Some(SHAPE))
            .property(double("radius", "0.0"))
            .property(double("centerX", "0.0"))
            .property(double("centerY", "0.0")),
        class("javafx.scene.image.ImageView", Some(NODE))
            .property(component("image"))
            .property(double("fitWidth", "0.0"))
            .property(double("fitHeight", "0.0"))
            .property(boolean("preserveRatio", false))
            .property(boolean("smooth", true)),
        class("javafx.scene.image.Image", None).property(PropertyDescriptor::new(
            "url",
            ValueKind::Url { collection: false },
        )),
        // Values
        class("java.lang.String", None),
        class("java.lang.Double", None),
        class("java.lang.Integer", None),
        class("java.lang.Boolean", None),
        class("javafx.collections.FXCollections", None),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names_unique() {
        let catalog = catalog();
        let mut names: Vec<_> = catalog.iter().map(|d| d.qualified_name.as_str()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_superclasses_are_registered() {
        let catalog = catalog();
        for desc in &catalog {
            if let Some(superclass) = &desc.superclass {
                assert!(
                    catalog.iter().any(|d| &d.qualified_name == superclass),
                    "{} extends unknown {}",
                    desc.qualified_name,
                    superclass
                );
            }
        }
    }
}
