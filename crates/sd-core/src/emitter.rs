//! Emitter: `Document` → SD markup.
//!
//! Produces canonical output that round-trips through the parser: every
//! object slot is written as an explicit property element, text properties
//! as attributes in their stored order.

use crate::id::NodeId;
use crate::metadata::{PropertyName, Registry};
use crate::model::{Document, NodeKind, PropertyValue};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Layout options for emitted markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitConfig {
    /// Spaces per nesting level. Default: **4**.
    pub indent: usize,

    /// Start with the XML declaration. Default: **true**.
    pub declaration: bool,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            indent: 4,
            declaration: true,
        }
    }
}

/// Emit a document with the default layout.
#[must_use]
pub fn emit_document(doc: &Document, registry: &Registry) -> String {
    emit_document_with(doc, registry, &EmitConfig::default())
}

#[must_use]
pub fn emit_document_with(doc: &Document, registry: &Registry, config: &EmitConfig) -> String {
    let mut out = String::with_capacity(1024);

    if config.declaration {
        out.push_str(XML_DECLARATION);
        out.push('\n');
    }

    let imports = collect_imports(doc, registry);
    if !imports.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        for import in &imports {
            let _ = writeln!(out, "<?import {import}?>");
        }
    }

    if let Some(root) = doc.root() {
        if !out.is_empty() {
            out.push('\n');
        }
        emit_node(&mut out, doc, root, 0, config);
    }
    out
}

fn package_of(qualified: &str) -> &str {
    qualified.rsplit_once('.').map_or("", |(package, _)| package)
}

/// Document imports, plus one for every used class they do not cover.
fn collect_imports(doc: &Document, registry: &Registry) -> Vec<String> {
    let mut imports = doc.imports.clone();
    let Some(root) = doc.root() else {
        return imports;
    };

    for id in std::iter::once(root).chain(doc.descendants(root)) {
        let Some(node) = doc.node(id) else { continue };
        if matches!(node.kind, NodeKind::Intrinsic(_)) || node.type_name.contains('.') {
            continue;
        }
        let Some(qualified) = node.class.and_then(|c| registry.qualified_name(c)) else {
            continue;
        };
        let package = package_of(qualified);
        let covered = package == "java.lang"
            || imports
                .iter()
                .any(|i| i == qualified || i.strip_suffix(".*") == Some(package));
        if !covered {
            imports.push(qualified.to_string());
        }
    }
    imports
}

fn indent(out: &mut String, depth: usize, config: &EmitConfig) {
    for _ in 0..depth * config.indent {
        out.push(' ');
    }
}

fn emit_attribute(out: &mut String, name: &str, value: &str) {
    let _ = write!(out, " {name}=\"{}\"", escape_attribute(value));
}

fn emit_node(out: &mut String, doc: &Document, id: NodeId, depth: usize, config: &EmitConfig) {
    let Some(node) = doc.node(id) else { return };
    let tag = match node.kind {
        NodeKind::Intrinsic(intrinsic) => intrinsic.tag(),
        _ => node.type_name.as_str(),
    };

    indent(out, depth, config);
    out.push('<');
    out.push_str(tag);

    if doc.root() == Some(id) {
        for (name, uri) in &doc.namespaces {
            emit_attribute(out, name, uri);
        }
    }
    if let Some(controller) = &node.controller {
        emit_attribute(out, "fx:controller", controller);
    }
    if let Some(fx_id) = &node.fx_id {
        emit_attribute(out, "fx:id", fx_id);
    }
    if let NodeKind::Value { text } = &node.kind {
        emit_attribute(out, "fx:value", text);
    }

    let mut slots: Vec<(&PropertyName, &[NodeId])> = Vec::new();
    for (name, value) in &node.properties {
        match value {
            PropertyValue::Text(text) => emit_attribute(out, &name.to_string(), text),
            PropertyValue::Nodes(list) if !list.is_empty() => slots.push((name, list.as_slice())),
            PropertyValue::Nodes(_) => {}
        }
    }

    if slots.is_empty() {
        out.push_str("/>\n");
        return;
    }
    out.push_str(">\n");
    for (slot, children) in slots {
        indent(out, depth + 1, config);
        let _ = writeln!(out, "<{slot}>");
        for child in children {
            emit_node(out, doc, *child, depth + 2, config);
        }
        indent(out, depth + 1, config);
        let _ = writeln!(out, "</{slot}>");
    }
    indent(out, depth, config);
    let _ = writeln!(out, "</{tag}>");
}

/// Escape a value for a double-quoted attribute.
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::RegistryResolver;

    fn roundtrip(input: &str) -> String {
        let registry = Registry::builtin();
        let doc = Document::load(input, &registry, &RegistryResolver::new(&registry)).unwrap();
        emit_document(&doc, &registry)
    }

    #[test]
    fn emit_canonical_form() {
        let output = roundtrip(
            r#"<?import javafx.scene.control.*?><?import javafx.scene.layout.*?>
<VBox spacing="4" xmlns:fx="http://javafx.com/fxml/1"><Button fx:id="ok" text="OK"/></VBox>"#,
        );
        let expected = r#"<?xml version="1.0" encoding="UTF-8"?>

<?import javafx.scene.control.*?>
<?import javafx.scene.layout.*?>

<VBox xmlns:fx="http://javafx.com/fxml/1" spacing="4">
    <children>
        <Button fx:id="ok" text="OK"/>
    </children>
</VBox>
"#;
        assert_eq!(output, expected);
    }

    #[test]
    fn missing_imports_are_added() {
        let output = roundtrip(
            r#"<?import javafx.scene.layout.*?>
<javafx.scene.layout.VBox><javafx.scene.control.Label text="x"/></javafx.scene.layout.VBox>"#,
        );
        assert!(!output.contains("<?import javafx.scene.control.Label?>"));

        let registry = Registry::builtin();
        let mut doc = Document::load(
            r#"<?import javafx.scene.control.Button?>
<Button/>"#,
            &registry,
            &RegistryResolver::new(&registry),
        )
        .unwrap();
        doc.imports.clear();
        let output = emit_document(&doc, &registry);
        assert!(output.contains("<?import javafx.scene.control.Button?>"));
    }

    #[test]
    fn attribute_escaping() {
        assert_eq!(escape_attribute("a<\"b\">&\n"), "a&lt;&quot;b&quot;&gt;&amp;&#10;");
    }

    #[test]
    fn emit_is_stable_after_one_pass() {
        let first = roundtrip(
            r#"<?import javafx.scene.control.*?>
<?import javafx.scene.layout.*?>
<GridPane hgap="2">
  <Label GridPane.columnIndex="1" text="a &amp; b"/>
  <String fx:value="v"/>
</GridPane>"#,
        );
        assert_eq!(roundtrip(&first), first);
    }

    #[test]
    fn custom_indent_without_declaration() {
        let registry = Registry::builtin();
        let doc = Document::load(
            "<?import javafx.scene.layout.*?><VBox><VBox/></VBox>",
            &registry,
            &RegistryResolver::new(&registry),
        )
        .unwrap();
        let config = EmitConfig {
            indent: 2,
            declaration: false,
        };
        assert_eq!(
            emit_document_with(&doc, &registry, &config),
            "<?import javafx.scene.layout.*?>\n\n<VBox>\n  <children>\n    <VBox/>\n  </children>\n</VBox>\n"
        );
    }
}
