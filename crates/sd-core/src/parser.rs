//! Parser for SD markup → `Document`.
//!
//! Built on `winnow` 0.7. Handles the XML subset the designer reads and
//! writes: the XML declaration, `<?import ...?>` instructions, comments,
//! CDATA, elements with single- or double-quoted attributes, entities and
//! text content.
//!
//! Loading happens in two steps: `parse_markup` produces a raw element tree,
//! and the builder classifies elements (objects, property elements,
//! `fx:` directives) into document nodes.

use crate::error::LoadError;
use crate::id::NodeId;
use crate::metadata::{PropertyName, Registry};
use crate::model::{DocNode, Document, Intrinsic, NodeKind, PropertyValue};
use crate::resolve::TypeResolver;
use smallvec::SmallVec;
use winnow::ascii::multispace0;
use winnow::combinator::{alt, delimited, opt};
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::{take_till, take_until, take_while};

// ─── Raw tree ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawDocument {
    /// Targets of `<?import ...?>` instructions, in order.
    pub imports: Vec<String>,
    pub root: Option<RawElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawElement {
    pub name: String,
    /// Unescaped attribute values in source order.
    pub attributes: Vec<(String, String)>,
    pub content: Vec<RawContent>,
    /// 1-based line of the start tag.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawContent {
    Element(RawElement),
    Text(String),
}

impl RawElement {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &RawElement> {
        self.content.iter().filter_map(|c| match c {
            RawContent::Element(e) => Some(e),
            RawContent::Text(_) => None,
        })
    }

    /// Concatenated text content, trimmed. `None` when only whitespace.
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .content
            .iter()
            .filter_map(|c| match c {
                RawContent::Text(t) => Some(t.as_str()),
                RawContent::Element(_) => None,
            })
            .collect();
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    fn push_text(&mut self, text: &str) {
        if let Some(RawContent::Text(last)) = self.content.last_mut() {
            last.push_str(text);
        } else {
            self.content.push(RawContent::Text(text.to_string()));
        }
    }
}

// ─── Entry points ────────────────────────────────────────────────────────

/// Parse markup text into a raw element tree.
#[must_use = "parsing result should be used"]
pub fn parse_markup(input: &str) -> Result<RawDocument, LoadError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut cursor = Cursor {
        source: input,
        rest: input,
    };

    let mut imports = Vec::new();
    cursor.skip_misc(&mut imports)?;
    if cursor.rest.is_empty() {
        return Ok(RawDocument { imports, root: None });
    }
    if !cursor.rest.starts_with('<') {
        return Err(cursor.syntax("expected the root element"));
    }
    let root = parse_element(&mut cursor)?;

    cursor.skip_misc(&mut Vec::new())?;
    if !cursor.rest.is_empty() {
        return Err(LoadError::TrailingContent {
            line: cursor.line(),
        });
    }
    Ok(RawDocument {
        imports,
        root: Some(root),
    })
}

/// Parse markup and build a document from it.
pub fn load_document(
    input: &str,
    registry: &Registry,
    resolver: &dyn TypeResolver,
) -> Result<Document, LoadError> {
    let raw = parse_markup(input)?;
    let mut doc = Document::new();
    doc.imports = raw.imports.clone();

    if let Some(root) = &raw.root {
        let builder = Builder {
            registry,
            resolver,
            imports: &raw.imports,
        };
        let root = builder.build(&mut doc, root, true)?;
        doc.set_root(Some(root));
        link_references(&mut doc);
    }

    for id in doc.unresolved_nodes() {
        if let Some(node) = doc.node(id) {
            log::warn!("unresolved type `{}` ({id})", node.type_name);
        }
    }
    Ok(doc)
}

// ─── Cursor ──────────────────────────────────────────────────────────────

struct Cursor<'a> {
    source: &'a str,
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn line(&self) -> usize {
        let consumed = self.source.len() - self.rest.len();
        self.source[..consumed].matches('\n').count() + 1
    }

    fn syntax(&self, message: impl Into<String>) -> LoadError {
        LoadError::Syntax {
            line: self.line(),
            message: message.into(),
        }
    }

    /// Run a winnow parser on the remaining input, mapping failure to a
    /// syntax error on the current line.
    fn run<O>(
        &mut self,
        mut parser: impl FnMut(&mut &'a str) -> ModalResult<O>,
        what: &str,
    ) -> Result<O, LoadError> {
        let line = self.line();
        parser(&mut self.rest).map_err(|_| LoadError::Syntax {
            line,
            message: format!("expected {what}"),
        })
    }

    /// Skip whitespace, comments, doctype and processing instructions,
    /// collecting import targets.
    fn skip_misc(&mut self, imports: &mut Vec<String>) -> Result<(), LoadError> {
        loop {
            skip_space(&mut self.rest);
            if self.rest.starts_with("<?") {
                let (target, body) = self.run(parse_instruction, "a processing instruction")?;
                if target == "import" {
                    imports.push(body.to_string());
                }
            } else if self.rest.starts_with("<!--") {
                self.run(parse_comment, "the end of a comment")?;
            } else if self.rest.starts_with("<!DOCTYPE") {
                self.run(parse_doctype, "the end of the doctype")?;
            } else {
                return Ok(());
            }
        }
    }
}

// ─── Low-level parsers ──────────────────────────────────────────────────

/// Consume optional whitespace (concrete error type avoids inference issues).
fn skip_space(input: &mut &str) {
    let _: Result<&str, winnow::error::ErrMode<ContextError>> = multispace0.parse_next(input);
}

fn parse_name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| {
        c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
    })
    .parse_next(input)
}

fn parse_quoted<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    alt((
        delimited('"', take_till(0.., '"'), '"'),
        delimited('\'', take_till(0.., '\''), '\''),
    ))
    .parse_next(input)
}

fn parse_attribute<'a>(input: &mut &'a str) -> ModalResult<(&'a str, &'a str)> {
    let name = parse_name(input)?;
    skip_space(input);
    '='.parse_next(input)?;
    skip_space(input);
    let value = parse_quoted(input)?;
    Ok((name, value))
}

fn parse_comment(input: &mut &str) -> ModalResult<()> {
    delimited("<!--", take_until(0.., "-->"), "-->")
        .void()
        .parse_next(input)
}

fn parse_doctype(input: &mut &str) -> ModalResult<()> {
    ("<!DOCTYPE", take_till(0.., '>'), '>').void().parse_next(input)
}

fn parse_cdata<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    delimited("<![CDATA[", take_until(0.., "]]>"), "]]>").parse_next(input)
}

fn parse_instruction<'a>(input: &mut &'a str) -> ModalResult<(&'a str, &'a str)> {
    "<?".parse_next(input)?;
    let target = parse_name(input)?;
    let body = take_until(0.., "?>").parse_next(input)?;
    "?>".parse_next(input)?;
    Ok((target, body.trim()))
}

struct StartTag<'a> {
    name: &'a str,
    attributes: Vec<(&'a str, &'a str)>,
    self_closing: bool,
}

fn parse_start_tag<'a>(input: &mut &'a str) -> ModalResult<StartTag<'a>> {
    '<'.parse_next(input)?;
    let name = parse_name(input)?;
    let mut attributes = Vec::new();
    loop {
        skip_space(input);
        if opt("/>").parse_next(input)?.is_some() {
            return Ok(StartTag {
                name,
                attributes,
                self_closing: true,
            });
        }
        if opt('>').parse_next(input)?.is_some() {
            return Ok(StartTag {
                name,
                attributes,
                self_closing: false,
            });
        }
        attributes.push(parse_attribute(input)?);
    }
}

fn parse_end_tag<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    "</".parse_next(input)?;
    let name = parse_name(input)?;
    skip_space(input);
    '>'.parse_next(input)?;
    Ok(name)
}

fn parse_text<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_till(1.., '<').parse_next(input)
}

fn parse_element(cursor: &mut Cursor<'_>) -> Result<RawElement, LoadError> {
    let line = cursor.line();
    let tag = cursor.run(parse_start_tag, "a well-formed start tag")?;
    let mut element = RawElement {
        name: tag.name.to_string(),
        attributes: tag
            .attributes
            .into_iter()
            .map(|(k, v)| (k.to_string(), unescape(v)))
            .collect(),
        content: Vec::new(),
        line,
    };
    if tag.self_closing {
        return Ok(element);
    }

    loop {
        let rest = cursor.rest;
        if rest.is_empty() {
            return Err(cursor.syntax(format!("unexpected end of input inside <{}>", element.name)));
        } else if rest.starts_with("</") {
            let line = cursor.line();
            let found = cursor.run(parse_end_tag, "an end tag")?;
            if found != element.name {
                return Err(LoadError::MismatchedTag {
                    expected: element.name,
                    found: found.to_string(),
                    line,
                });
            }
            return Ok(element);
        } else if rest.starts_with("<!--") {
            cursor.run(parse_comment, "the end of a comment")?;
        } else if rest.starts_with("<![CDATA[") {
            let text = cursor.run(parse_cdata, "the end of a CDATA section")?;
            element.push_text(text);
        } else if rest.starts_with("<?") {
            cursor.run(parse_instruction, "a processing instruction")?;
        } else if rest.starts_with('<') {
            let child = parse_element(cursor)?;
            element.content.push(RawContent::Element(child));
        } else {
            let text = cursor.run(parse_text, "text")?;
            element.push_text(&unescape(text));
        }
    }
}

/// Decode the predefined entities and character references. Unknown
/// entities are kept literally.
pub fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let decoded = rest
            .find(';')
            .and_then(|end| decode_entity(&rest[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let reference = name.strip_prefix('#')?;
            let code = match reference.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => reference.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

// ─── Builder ─────────────────────────────────────────────────────────────

/// Objects declared for reference only. Kept as a slot of their owner that
/// no container exposes, so they are never laid out.
pub const DEFINE_SLOT: &str = "fx:define";

/// Lowercase last segment: `text`, `GridPane.columnIndex`.
fn is_property_element(name: &str) -> bool {
    !name.starts_with("fx:")
        && name
            .rsplit('.')
            .next()
            .is_some_and(|last| last.starts_with(|c: char| c.is_ascii_lowercase()))
}

fn simple_name(type_name: &str) -> &str {
    type_name.rsplit(['.', ':']).next().unwrap_or(type_name)
}

struct Builder<'r> {
    registry: &'r Registry,
    resolver: &'r dyn TypeResolver,
    imports: &'r [String],
}

impl Builder<'_> {
    fn build(&self, doc: &mut Document, element: &RawElement, is_root: bool) -> Result<NodeId, LoadError> {
        let name = element.name.as_str();
        let kind = if let Some(intrinsic) = Intrinsic::from_tag(name) {
            NodeKind::Intrinsic(intrinsic)
        } else if name.starts_with("fx:") {
            log::warn!("unknown directive <{name}> on line {}", element.line);
            NodeKind::Instance
        } else if let Some(text) = element.attribute("fx:value") {
            NodeKind::Value {
                text: text.to_string(),
            }
        } else if let (None, Some(text)) = (element.elements().next(), element.text()) {
            NodeKind::Value { text }
        } else {
            NodeKind::Instance
        };

        let class = match kind {
            NodeKind::Intrinsic(Intrinsic::Include) => self.registry.resolve_simple_name("Node"),
            NodeKind::Intrinsic(Intrinsic::Root) => element
                .attribute("type")
                .and_then(|t| self.resolver.resolve(t, self.imports)),
            // Linked to their source once the whole tree exists.
            NodeKind::Intrinsic(_) => None,
            _ if name.starts_with("fx:") => None,
            _ => self.resolver.resolve(name, self.imports),
        };

        let mut node = DocNode::new(NodeId::with_prefix(simple_name(name)), kind, name);
        node.class = class;
        for (key, value) in &element.attributes {
            match key.as_str() {
                "fx:id" => node.fx_id = Some(value.clone()),
                "fx:controller" => node.controller = Some(value.clone()),
                "fx:value" => {}
                k if is_root && (k == "xmlns" || k.starts_with("xmlns:")) => {
                    doc.namespaces.insert(k.to_string(), value.clone());
                }
                k => {
                    node.properties
                        .insert(PropertyName::parse(k), PropertyValue::Text(value.clone()));
                }
            }
        }

        let default_slot = class
            .and_then(|c| self.registry.describe(c))
            .and_then(|d| d.default_property)
            .unwrap_or_else(|| PropertyName::new("children"));

        let mut attachments = Vec::new();
        for content in &element.content {
            match content {
                RawContent::Text(text) => {
                    if !text.trim().is_empty() && matches!(node.kind, NodeKind::Instance) {
                        log::debug!("ignoring text inside <{name}> on line {}", element.line);
                    }
                }
                RawContent::Element(child) if child.name == DEFINE_SLOT => {
                    let slot = PropertyName::new(DEFINE_SLOT);
                    ensure_slot(&mut node, slot);
                    for object in child.elements() {
                        let id = self.build(doc, object, false)?;
                        attachments.push((slot, id));
                    }
                }
                RawContent::Element(child) if is_property_element(&child.name) => {
                    let slot = PropertyName::parse(&child.name);
                    if child.elements().next().is_none()
                        && let Some(text) = child.text()
                    {
                        node.properties.insert(slot, PropertyValue::Text(text));
                        continue;
                    }
                    ensure_slot(&mut node, slot);
                    for object in child.elements() {
                        let id = self.build(doc, object, false)?;
                        attachments.push((slot, id));
                    }
                }
                RawContent::Element(child) => {
                    ensure_slot(&mut node, default_slot);
                    let id = self.build(doc, child, false)?;
                    attachments.push((default_slot, id));
                }
            }
        }

        let id = doc.create_node(node);
        for (slot, child) in attachments {
            let index = doc.children(id, &slot).len();
            doc.attach(id, slot, index, child);
        }
        Ok(id)
    }
}

fn ensure_slot(node: &mut DocNode, slot: PropertyName) {
    if !matches!(node.properties.get(&slot), Some(PropertyValue::Nodes(_))) {
        node.properties
            .insert(slot, PropertyValue::Nodes(SmallVec::new()));
    }
}

/// `fx:reference` and `fx:copy` take the class of the node they name.
fn link_references(doc: &mut Document) {
    let source = PropertyName::new("source");
    let pending: Vec<(NodeId, String)> = doc
        .graph
        .node_weights()
        .filter(|n| {
            matches!(
                n.kind,
                NodeKind::Intrinsic(Intrinsic::Reference | Intrinsic::Copy)
            )
        })
        .filter_map(|n| n.text(&source).map(|s| (n.id, s.to_string())))
        .collect();

    for (id, fx_id) in pending {
        let class = doc
            .node_by_fx_id(&fx_id)
            .and_then(|target| doc.class_of(target));
        doc.node_mut(id).class = class;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ClassName;
    use crate::resolve::RegistryResolver;

    fn load(input: &str) -> Document {
        let registry = Registry::builtin();
        load_document(input, &registry, &RegistryResolver::new(&registry)).unwrap()
    }

    #[test]
    fn parse_prolog_and_imports() {
        let raw = parse_markup(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- generated -->
<?import javafx.scene.control.Button?>
<?import javafx.scene.layout.*?>
<VBox/>"#,
        )
        .unwrap();
        assert_eq!(
            raw.imports,
            vec!["javafx.scene.control.Button", "javafx.scene.layout.*"]
        );
        assert_eq!(raw.root.unwrap().name, "VBox");
    }

    #[test]
    fn parse_attributes_entities_and_cdata() {
        let raw = parse_markup(
            r#"<Label text='a &lt;b&gt; &amp; &#65;' style="x"><![CDATA[<raw>]]></Label>"#,
        )
        .unwrap();
        let root = raw.root.unwrap();
        assert_eq!(root.attribute("text"), Some("a <b> & A"));
        assert_eq!(root.attribute("style"), Some("x"));
        assert_eq!(root.text().as_deref(), Some("<raw>"));
    }

    #[test]
    fn parse_empty_document() {
        assert_eq!(parse_markup("  \n").unwrap(), RawDocument::default());
    }

    #[test]
    fn mismatched_tag_reports_line() {
        let err = parse_markup("<VBox>\n  <Button>\n  </Label>\n</VBox>").unwrap_err();
        assert_eq!(
            err,
            LoadError::MismatchedTag {
                expected: "Button".into(),
                found: "Label".into(),
                line: 3,
            }
        );
    }

    #[test]
    fn unterminated_and_trailing_content() {
        assert!(matches!(
            parse_markup("<VBox>\n<Button/>"),
            Err(LoadError::Syntax { line: 2, .. })
        ));
        assert_eq!(
            parse_markup("<VBox/>\n<VBox/>"),
            Err(LoadError::TrailingContent { line: 2 })
        );
    }

    #[test]
    fn build_slots_and_default_property() {
        let doc = load(
            r#"<?import javafx.scene.control.*?>
<?import javafx.scene.layout.*?>
<BorderPane xmlns:fx="http://javafx.com/fxml/1" fx:controller="app.Main">
  <top>
    <Label text="Title"/>
  </top>
  <center>
    <VBox>
      <Button fx:id="ok" text="OK"/>
      <Button text="Cancel"/>
    </VBox>
  </center>
</BorderPane>"#,
        );
        let root = doc.root().unwrap();
        let node = doc.node(root).unwrap();
        assert_eq!(node.controller.as_deref(), Some("app.Main"));
        assert_eq!(doc.namespaces.get("xmlns:fx").map(String::as_str), Some("http://javafx.com/fxml/1"));
        assert_eq!(
            doc.slots(root),
            vec![PropertyName::new("top"), PropertyName::new("center")]
        );

        let vbox = doc.children(root, &PropertyName::new("center"))[0];
        let buttons = doc.children(vbox, &PropertyName::new("children"));
        assert_eq!(buttons.len(), 2);
        assert_eq!(doc.node(buttons[0]).unwrap().fx_id.as_deref(), Some("ok"));
        assert_eq!(doc.class_of(buttons[1]), Some(ClassName::of("Button")));
        assert!(doc.unresolved_nodes().is_empty());
        doc.check_integrity().unwrap();
    }

    #[test]
    fn text_property_elements_and_values() {
        let doc = load(
            r#"<?import javafx.scene.control.*?>
<?import javafx.scene.layout.*?>
<HBox>
  <Label><text>Hello</text></Label>
  <String fx:value="plain"/>
  <GridPane.columnIndex>2</GridPane.columnIndex>
</HBox>"#,
        );
        let root = doc.root().unwrap();
        assert_eq!(
            doc.text_property(root, &PropertyName::resided("GridPane", "columnIndex")),
            Some("2")
        );
        let items = doc.children(root, &PropertyName::new("children"));
        assert_eq!(doc.text_property(items[0], &PropertyName::new("text")), Some("Hello"));
        assert_eq!(
            doc.node(items[1]).unwrap().kind,
            NodeKind::Value {
                text: "plain".into()
            }
        );
    }

    #[test]
    fn unresolved_types_are_kept() {
        let doc = load(
            r#"<?import javafx.scene.layout.*?>
<VBox><com.example.Gauge value="3"/></VBox>"#,
        );
        let unresolved = doc.unresolved_nodes();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(doc.node(unresolved[0]).unwrap().type_name, "com.example.Gauge");
    }

    #[test]
    fn references_take_their_source_class() {
        let doc = load(
            r#"<?import javafx.scene.control.*?>
<?import javafx.scene.layout.*?>
<VBox>
  <Button fx:id="ok"/>
  <fx:reference source="ok"/>
  <fx:include source="footer.fxml"/>
</VBox>"#,
        );
        let items = doc.children(doc.root().unwrap(), &PropertyName::new("children"));
        assert_eq!(doc.class_of(items[1]), Some(ClassName::of("Button")));
        assert_eq!(doc.class_of(items[2]), Some(ClassName::of("Node")));
    }

    #[test]
    fn unknown_directive_is_kept_unresolved() {
        let doc = load("<?import javafx.scene.layout.*?><VBox><fx:script/><Pane/></VBox>");
        let unresolved = doc.unresolved_nodes();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(doc.node(unresolved[0]).unwrap().type_name, "fx:script");
        assert_eq!(doc.children(doc.root().unwrap(), &PropertyName::new("children")).len(), 2);
    }

    #[test]
    fn fx_root_takes_its_type() {
        let doc = load(
            r#"<?import javafx.scene.control.*?>
<?import javafx.scene.layout.*?>
<fx:root type="javafx.scene.layout.VBox" xmlns:fx="http://javafx.com/fxml/1">
  <Button fx:id="ok"/>
</fx:root>"#,
        );
        let root = doc.root().unwrap();
        assert_eq!(doc.node(root).unwrap().kind, NodeKind::Intrinsic(Intrinsic::Root));
        assert_eq!(doc.class_of(root), Some(ClassName::of("VBox")));
        let ok = doc.node_by_fx_id("ok").unwrap();
        assert_eq!(doc.parent(ok), Some(root));
        assert!(doc.unresolved_nodes().is_empty());
    }

    #[test]
    fn define_block_holds_unlaid_objects() {
        let doc = load(
            r#"<?import javafx.scene.control.*?>
<?import javafx.scene.layout.*?>
<VBox>
  <fx:define>
    <Tooltip fx:id="group" text="Shared"/>
  </fx:define>
  <Button fx:id="ok"/>
  <fx:reference source="group"/>
</VBox>"#,
        );
        let root = doc.root().unwrap();
        let defined = doc.children(root, &PropertyName::new(DEFINE_SLOT));
        assert_eq!(defined.len(), 1);
        assert_eq!(doc.node_by_fx_id("group"), Some(defined[0]));
        let items = doc.children(root, &PropertyName::new("children"));
        assert_eq!(items.len(), 2);
        assert_eq!(doc.class_of(items[1]), Some(ClassName::of("Tooltip")));
    }
}
