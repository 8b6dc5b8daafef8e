//! Property metadata registry.
//!
//! Static knowledge of which properties each component class exposes, what
//! kind of value they hold, and how a raw edit is validated and
//! canonicalized. The registry is an explicit value owned by the editing
//! context; nothing here is process-global.
//!
//! Descriptors are merged once per class (own properties layered over the
//! superclass chain) and cached by class identity. User-supplied classes are
//! merged at registration from their nearest known ancestor.

use crate::error::{RegistryError, ValidationError};
use crate::id::Name;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

// ─── Names ───────────────────────────────────────────────────────────────

/// Identity of a component class (simple name, e.g. `GridPane`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassName(Name);

impl ClassName {
    pub fn of(name: &str) -> Self {
        ClassName(Name::intern(name))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a property: its name plus, for static properties such as
/// `GridPane.columnIndex`, the container class it resides on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyName {
    pub residence: Option<ClassName>,
    pub name: Name,
}

impl PropertyName {
    pub fn new(name: &str) -> Self {
        Self {
            residence: None,
            name: Name::intern(name),
        }
    }

    pub fn resided(residence: &str, name: &str) -> Self {
        Self {
            residence: Some(ClassName::of(residence)),
            name: Name::intern(name),
        }
    }

    /// Parse a markup attribute or element name. `GridPane.columnIndex`
    /// becomes a static property; anything else is a plain name.
    pub fn parse(s: &str) -> Self {
        if let Some((residence, name)) = s.rsplit_once('.')
            && residence.starts_with(|c: char| c.is_ascii_uppercase())
            && !name.is_empty()
        {
            return Self::resided(residence, name);
        }
        Self::new(s)
    }

    pub fn is_static(&self) -> bool {
        self.residence.is_some()
    }
}

impl fmt::Debug for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.residence {
            Some(residence) => write!(f, "{residence}.{}", self.name),
            None => f.write_str(self.name.as_str()),
        }
    }
}

// ─── Containers ──────────────────────────────────────────────────────────

/// Row or column of a grid container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridAxis {
    Column,
    Row,
}

impl GridAxis {
    /// Static property holding a cell's index on this axis.
    pub fn index_property(self) -> PropertyName {
        match self {
            GridAxis::Column => PropertyName::resided("GridPane", "columnIndex"),
            GridAxis::Row => PropertyName::resided("GridPane", "rowIndex"),
        }
    }

    pub fn span_property(self) -> PropertyName {
        match self {
            GridAxis::Column => PropertyName::resided("GridPane", "columnSpan"),
            GridAxis::Row => PropertyName::resided("GridPane", "rowSpan"),
        }
    }

    /// Slot holding the per-line constraint objects.
    pub fn constraints_property(self) -> PropertyName {
        match self {
            GridAxis::Column => PropertyName::new("columnConstraints"),
            GridAxis::Row => PropertyName::new("rowConstraints"),
        }
    }

    pub fn constraints_class(self) -> &'static str {
        match self {
            GridAxis::Column => "ColumnConstraints",
            GridAxis::Row => "RowConstraints",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GridAxis::Column => "Column",
            GridAxis::Row => "Row",
        }
    }
}

/// Named single-valued child slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accessory {
    Root,
    Scene,
    Content,
    Graphic,
    Top,
    Bottom,
    Left,
    Right,
    Center,
    Tooltip,
    ContextMenu,
    Clip,
}

impl Accessory {
    pub const ALL: [Accessory; 12] = [
        Accessory::Root,
        Accessory::Scene,
        Accessory::Content,
        Accessory::Graphic,
        Accessory::Top,
        Accessory::Bottom,
        Accessory::Left,
        Accessory::Right,
        Accessory::Center,
        Accessory::Tooltip,
        Accessory::ContextMenu,
        Accessory::Clip,
    ];

    pub fn property_name(self) -> &'static str {
        match self {
            Accessory::Root => "root",
            Accessory::Scene => "scene",
            Accessory::Content => "content",
            Accessory::Graphic => "graphic",
            Accessory::Top => "top",
            Accessory::Bottom => "bottom",
            Accessory::Left => "left",
            Accessory::Right => "right",
            Accessory::Center => "center",
            Accessory::Tooltip => "tooltip",
            Accessory::ContextMenu => "contextMenu",
            Accessory::Clip => "clip",
        }
    }

    pub fn property(self) -> PropertyName {
        PropertyName::new(self.property_name())
    }
}

// ─── Values ──────────────────────────────────────────────────────────────

/// Designated non-numeric values accepted by some numeric properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentinel {
    /// `-1`: let the container compute the size.
    UseComputedSize,
    /// `-Infinity`: use the preferred size.
    UsePrefSize,
    /// Span to the last row/column.
    Remaining,
}

impl Sentinel {
    pub fn keyword(self) -> &'static str {
        match self {
            Sentinel::UseComputedSize => "USE_COMPUTED_SIZE",
            Sentinel::UsePrefSize => "USE_PREF_SIZE",
            Sentinel::Remaining => "REMAINING",
        }
    }

    pub fn value(self) -> f64 {
        match self {
            Sentinel::UseComputedSize => -1.0,
            Sentinel::UsePrefSize => f64::NEG_INFINITY,
            Sentinel::Remaining => 2_147_483_647.0,
        }
    }

    pub fn to_markup(self) -> &'static str {
        match self {
            Sentinel::UseComputedSize => "-1",
            Sentinel::UsePrefSize => "-Infinity",
            Sentinel::Remaining => "2147483647",
        }
    }

    /// Accepts the keyword or the numeric encoding.
    pub fn matches(self, raw: &str) -> bool {
        raw == self.keyword() || raw.parse::<f64>().ok() == Some(self.value())
    }
}

/// A validated, canonical property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Boolean(bool),
    Number(f64),
    Integer(i64),
    Text(String),
    Sentinel(Sentinel),
}

impl Value {
    /// Text stored in the markup attribute.
    pub fn to_markup(&self) -> String {
        match self {
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_num(*n),
            Value::Integer(i) => i.to_string(),
            Value::Text(s) => s.clone(),
            Value::Sentinel(s) => s.to_markup().to_string(),
        }
    }
}

/// Shortest round-trippable text for a number (`10`, `0.25`).
pub fn format_num(n: f64) -> String {
    if n.is_finite() && n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

// ─── Kinds ───────────────────────────────────────────────────────────────

/// Validation and canonicalization rule of a floating point property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericKind {
    Unrestricted,
    /// Non-negative.
    Size,
    /// Non-negative, or one of the listed sentinels.
    SizeWithSentinel(&'static [Sentinel]),
    /// `-1` or 0 to 100. Canonicalization does not clamp.
    Percentage,
    /// Wrapped by the truncated signed remainder by 360.
    Angle,
    /// Opacity and progress: clamped to [0, 1].
    Opacity,
}

impl NumericKind {
    pub fn is_valid(self, v: f64) -> bool {
        if v.is_nan() {
            return false;
        }
        match self {
            NumericKind::Unrestricted | NumericKind::Angle | NumericKind::Opacity => v.is_finite(),
            NumericKind::Size | NumericKind::SizeWithSentinel(_) => v.is_finite() && v >= 0.0,
            NumericKind::Percentage => v == -1.0 || (0.0..=100.0).contains(&v),
        }
    }

    /// Angles use the IEEE 754 remainder, so they land in [-180, 180]:
    /// 370 wraps to 10, 190 to -170 and 540 to -180.
    pub fn canonicalize(self, v: f64) -> f64 {
        match self {
            NumericKind::Angle => v - 360.0 * (v / 360.0).round_ties_even(),
            NumericKind::Opacity => v.clamp(0.0, 1.0),
            _ => v,
        }
    }

    fn bounds(self) -> (f64, f64) {
        match self {
            NumericKind::Size | NumericKind::SizeWithSentinel(_) => (0.0, f64::MAX),
            NumericKind::Percentage => (0.0, 100.0),
            _ => (f64::MIN, f64::MAX),
        }
    }
}

/// Validation rule of an integer property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerKind {
    Unrestricted,
    NonNegative,
    /// Cell index; bounded by the line count of the selected grid.
    GridIndex(GridAxis),
    /// Cell span; bounded by the line count of the selected grid.
    GridSpan(GridAxis),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyKind {
    Boolean,
    Number(NumericKind),
    Integer(IntegerKind),
    Enumeration(&'static [&'static str]),
    Text,
    /// Child slot holding objects of class `accepted` (or subclasses).
    Object {
        accepted: &'static str,
        multiple: bool,
        accessory: Option<Accessory>,
    },
}

/// Row/column counts of the grid the current selection lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridExtent {
    pub columns: usize,
    pub rows: usize,
}

impl GridExtent {
    pub fn count(&self, axis: GridAxis) -> usize {
        match axis {
            GridAxis::Column => self.columns,
            GridAxis::Row => self.rows,
        }
    }
}

/// Per-call inputs to validation that depend on the current selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationContext {
    pub grid: Option<GridExtent>,
}

// ─── Descriptors ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub name: PropertyName,
    pub kind: PropertyKind,
    /// Markup text of the default value, when there is one.
    pub default: Option<&'static str>,
    pub read_write: bool,
    /// Geometry expressed relative to the parent.
    pub parent_related: bool,
}

impl PropertyDescriptor {
    pub fn new(name: PropertyName, kind: PropertyKind) -> Self {
        Self {
            name,
            kind,
            default: None,
            read_write: true,
            parent_related: false,
        }
    }

    fn default(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    fn read_only(mut self) -> Self {
        self.read_write = false;
        self
    }

    fn parent_related(mut self) -> Self {
        self.parent_related = true;
        self
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, PropertyKind::Object { .. })
    }

    pub fn accessory(&self) -> Option<Accessory> {
        match self.kind {
            PropertyKind::Object { accessory, .. } => accessory,
            _ => None,
        }
    }

    /// Check `raw` against this property's rule and return its canonical value.
    pub fn validate(&self, raw: &str, ctx: &ValidationContext) -> Result<Value, ValidationError> {
        let property = self.name.to_string();
        if !self.read_write {
            return Err(ValidationError::ReadOnly(property));
        }
        let trimmed = raw.trim();

        match self.kind {
            PropertyKind::Text => Ok(Value::Text(raw.to_string())),
            PropertyKind::Boolean => match trimmed {
                "true" => Ok(Value::Boolean(true)),
                "false" => Ok(Value::Boolean(false)),
                _ => Err(ValidationError::NotABoolean {
                    raw: trimmed.to_string(),
                }),
            },
            PropertyKind::Enumeration(allowed) => {
                if allowed.contains(&trimmed) {
                    Ok(Value::Text(trimmed.to_string()))
                } else {
                    Err(ValidationError::NotInEnumeration {
                        property,
                        raw: trimmed.to_string(),
                        allowed,
                    })
                }
            }
            PropertyKind::Number(kind) => {
                if let NumericKind::SizeWithSentinel(sentinels) = kind
                    && let Some(sentinel) = sentinels.iter().find(|s| s.matches(trimmed))
                {
                    return Ok(Value::Sentinel(*sentinel));
                }
                let v: f64 = trimmed.parse().map_err(|_| ValidationError::NotANumber {
                    property: property.clone(),
                    raw: trimmed.to_string(),
                })?;
                if !kind.is_valid(v) {
                    let (min, max) = kind.bounds();
                    return Err(ValidationError::OutOfRange {
                        property,
                        value: v,
                        min,
                        max,
                    });
                }
                Ok(Value::Number(kind.canonicalize(v)))
            }
            PropertyKind::Integer(kind) => {
                if matches!(kind, IntegerKind::GridSpan(_)) && Sentinel::Remaining.matches(trimmed) {
                    return Ok(Value::Sentinel(Sentinel::Remaining));
                }
                let v: i64 = trimmed.parse().map_err(|_| ValidationError::NotAnInteger {
                    property: property.clone(),
                    raw: trimmed.to_string(),
                })?;
                let (min, max) = match kind {
                    IntegerKind::Unrestricted => (i64::MIN, i64::MAX),
                    IntegerKind::NonNegative => (0, i64::MAX),
                    IntegerKind::GridIndex(axis) => {
                        let grid = ctx
                            .grid
                            .ok_or_else(|| ValidationError::NoGridContext(property.clone()))?;
                        (0, grid.count(axis).saturating_sub(1) as i64)
                    }
                    IntegerKind::GridSpan(axis) => {
                        let grid = ctx
                            .grid
                            .ok_or_else(|| ValidationError::NoGridContext(property.clone()))?;
                        (1, grid.count(axis).max(1) as i64)
                    }
                };
                if v < min || v > max {
                    return Err(ValidationError::OutOfRange {
                        property,
                        value: v as f64,
                        min: min as f64,
                        max: max as f64,
                    });
                }
                Ok(Value::Integer(v))
            }
            PropertyKind::Object { .. } => Err(ValidationError::ObjectValued { property }),
        }
    }
}

/// Merged view of everything a class exposes.
#[derive(Debug, Clone)]
pub struct ComponentDescriptor {
    pub class: ClassName,
    pub properties: IndexMap<PropertyName, PropertyDescriptor>,
    /// Slot receiving object elements written without a property wrapper.
    pub default_property: Option<PropertyName>,
}

impl ComponentDescriptor {
    pub fn property(&self, name: &PropertyName) -> Option<&PropertyDescriptor> {
        self.properties.get(name)
    }

    pub fn accessory(&self, kind: Accessory) -> Option<&PropertyDescriptor> {
        self.properties
            .values()
            .find(|p| p.accessory() == Some(kind))
    }

    pub fn accessories(&self) -> impl Iterator<Item = (Accessory, &PropertyDescriptor)> {
        self.properties
            .values()
            .filter_map(|p| p.accessory().map(|kind| (kind, p)))
    }

    /// The ordered child list that drag-and-drop and z-ordering act on.
    pub fn sub_component_property(&self) -> Option<&PropertyDescriptor> {
        let name = self.default_property?;
        let descriptor = self.properties.get(&name)?;
        match descriptor.kind {
            PropertyKind::Object { multiple: true, .. } => Some(descriptor),
            _ => None,
        }
    }
}

// ─── Class table ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct ClassInfo {
    qualified: String,
    superclass: Option<ClassName>,
    properties: Vec<PropertyDescriptor>,
    hidden: Vec<&'static str>,
    default_property: Option<&'static str>,
}

struct ClassSpec {
    name: &'static str,
    package: &'static str,
    superclass: Option<&'static str>,
    properties: Vec<PropertyDescriptor>,
    statics: Vec<PropertyDescriptor>,
    hidden: Vec<&'static str>,
    default_property: Option<&'static str>,
}

impl ClassSpec {
    fn new(name: &'static str, package: &'static str, superclass: Option<&'static str>) -> Self {
        Self {
            name,
            package,
            superclass,
            properties: Vec::new(),
            statics: Vec::new(),
            hidden: Vec::new(),
            default_property: None,
        }
    }

    fn prop(mut self, descriptor: PropertyDescriptor) -> Self {
        self.properties.push(descriptor);
        self
    }

    fn statics(mut self, kind_by_name: &[(&'static str, PropertyKind, Option<&'static str>)]) -> Self {
        for &(name, kind, default) in kind_by_name {
            let mut descriptor = PropertyDescriptor::new(PropertyName::resided(self.name, name), kind);
            descriptor.default = default;
            self.statics.push(descriptor);
        }
        self
    }

    fn hide(mut self, name: &'static str) -> Self {
        self.hidden.push(name);
        self
    }

    fn default_property(mut self, name: &'static str) -> Self {
        self.default_property = Some(name);
        self
    }
}

const POS: &[&str] = &[
    "TOP_LEFT",
    "TOP_CENTER",
    "TOP_RIGHT",
    "CENTER_LEFT",
    "CENTER",
    "CENTER_RIGHT",
    "BOTTOM_LEFT",
    "BOTTOM_CENTER",
    "BOTTOM_RIGHT",
    "BASELINE_LEFT",
    "BASELINE_CENTER",
    "BASELINE_RIGHT",
];
const HPOS: &[&str] = &["LEFT", "CENTER", "RIGHT"];
const VPOS: &[&str] = &["TOP", "CENTER", "BASELINE", "BOTTOM"];
const PRIORITY: &[&str] = &["ALWAYS", "SOMETIMES", "NEVER"];
const SCROLLBAR_POLICY: &[&str] = &["NEVER", "ALWAYS", "AS_NEEDED"];
const SIDE: &[&str] = &["TOP", "BOTTOM", "LEFT", "RIGHT"];

const COMPUTED: &[Sentinel] = &[Sentinel::UseComputedSize];
const COMPUTED_OR_PREF: &[Sentinel] = &[Sentinel::UseComputedSize, Sentinel::UsePrefSize];

fn number(name: &str, kind: NumericKind) -> PropertyDescriptor {
    PropertyDescriptor::new(PropertyName::new(name), PropertyKind::Number(kind))
}

fn boolean(name: &str) -> PropertyDescriptor {
    PropertyDescriptor::new(PropertyName::new(name), PropertyKind::Boolean)
}

fn text(name: &str) -> PropertyDescriptor {
    PropertyDescriptor::new(PropertyName::new(name), PropertyKind::Text)
}

fn choice(name: &str, values: &'static [&'static str]) -> PropertyDescriptor {
    PropertyDescriptor::new(PropertyName::new(name), PropertyKind::Enumeration(values))
}

fn objects(name: &str, accepted: &'static str) -> PropertyDescriptor {
    PropertyDescriptor::new(
        PropertyName::new(name),
        PropertyKind::Object {
            accepted,
            multiple: true,
            accessory: None,
        },
    )
}

fn object(name: &str, accepted: &'static str) -> PropertyDescriptor {
    PropertyDescriptor::new(
        PropertyName::new(name),
        PropertyKind::Object {
            accepted,
            multiple: false,
            accessory: None,
        },
    )
}

fn accessory(kind: Accessory, accepted: &'static str) -> PropertyDescriptor {
    PropertyDescriptor::new(
        kind.property(),
        PropertyKind::Object {
            accepted,
            multiple: false,
            accessory: Some(kind),
        },
    )
}

fn builtin_classes() -> Vec<ClassSpec> {
    use NumericKind as N;

    vec![
        ClassSpec::new("Object", "java.lang", None),
        ClassSpec::new("String", "java.lang", Some("Object")),
        ClassSpec::new("Double", "java.lang", Some("Object")),
        ClassSpec::new("Integer", "java.lang", Some("Object")),
        ClassSpec::new("Boolean", "java.lang", Some("Object")),
        ClassSpec::new("Window", "javafx.stage", Some("Object"))
            .prop(number("width", N::Size))
            .prop(number("height", N::Size))
            .prop(accessory(Accessory::Scene, "Scene"))
            .default_property("scene"),
        ClassSpec::new("Stage", "javafx.stage", Some("Window"))
            .prop(text("title"))
            .prop(boolean("resizable").default("true")),
        ClassSpec::new("Scene", "javafx.scene", Some("Object"))
            .prop(number("width", N::Size))
            .prop(number("height", N::Size))
            .prop(text("fill"))
            .prop(accessory(Accessory::Root, "Parent"))
            .default_property("root"),
        ClassSpec::new("Node", "javafx.scene", Some("Object"))
            .prop(text("id"))
            .prop(number("layoutX", N::Unrestricted).parent_related().default("0"))
            .prop(number("layoutY", N::Unrestricted).parent_related().default("0"))
            .prop(number("translateX", N::Unrestricted).default("0"))
            .prop(number("translateY", N::Unrestricted).default("0"))
            .prop(number("scaleX", N::Unrestricted).default("1"))
            .prop(number("scaleY", N::Unrestricted).default("1"))
            .prop(number("rotate", N::Angle).default("0"))
            .prop(number("opacity", N::Opacity).default("1"))
            .prop(boolean("visible").default("true"))
            .prop(boolean("disable").default("false"))
            .prop(text("style"))
            .prop(accessory(Accessory::Clip, "Node")),
        ClassSpec::new("Parent", "javafx.scene", Some("Node")),
        ClassSpec::new("Region", "javafx.scene.layout", Some("Parent"))
            .prop(number("prefWidth", N::SizeWithSentinel(COMPUTED)).default("-1"))
            .prop(number("prefHeight", N::SizeWithSentinel(COMPUTED)).default("-1"))
            .prop(number("minWidth", N::SizeWithSentinel(COMPUTED_OR_PREF)).default("-1"))
            .prop(number("minHeight", N::SizeWithSentinel(COMPUTED_OR_PREF)).default("-1"))
            .prop(number("maxWidth", N::SizeWithSentinel(COMPUTED_OR_PREF)).default("-1"))
            .prop(number("maxHeight", N::SizeWithSentinel(COMPUTED_OR_PREF)).default("-1"))
            .prop(number("width", N::Size).read_only())
            .prop(number("height", N::Size).read_only()),
        ClassSpec::new("Pane", "javafx.scene.layout", Some("Region"))
            .prop(objects("children", "Node"))
            .default_property("children"),
        ClassSpec::new("HBox", "javafx.scene.layout", Some("Pane"))
            .prop(number("spacing", N::Size).default("0"))
            .prop(choice("alignment", POS).default("TOP_LEFT"))
            .prop(boolean("fillHeight").default("true"))
            .statics(&[("hgrow", PropertyKind::Enumeration(PRIORITY), None)]),
        ClassSpec::new("VBox", "javafx.scene.layout", Some("Pane"))
            .prop(number("spacing", N::Size).default("0"))
            .prop(choice("alignment", POS).default("TOP_LEFT"))
            .prop(boolean("fillWidth").default("true"))
            .statics(&[("vgrow", PropertyKind::Enumeration(PRIORITY), None)]),
        ClassSpec::new("StackPane", "javafx.scene.layout", Some("Pane"))
            .prop(choice("alignment", POS).default("CENTER"))
            .statics(&[("alignment", PropertyKind::Enumeration(POS), None)]),
        ClassSpec::new("AnchorPane", "javafx.scene.layout", Some("Pane")).statics(&[
            ("topAnchor", PropertyKind::Number(N::Unrestricted), None),
            ("bottomAnchor", PropertyKind::Number(N::Unrestricted), None),
            ("leftAnchor", PropertyKind::Number(N::Unrestricted), None),
            ("rightAnchor", PropertyKind::Number(N::Unrestricted), None),
        ]),
        ClassSpec::new("BorderPane", "javafx.scene.layout", Some("Pane"))
            .hide("children")
            .prop(accessory(Accessory::Top, "Node"))
            .prop(accessory(Accessory::Bottom, "Node"))
            .prop(accessory(Accessory::Left, "Node"))
            .prop(accessory(Accessory::Right, "Node"))
            .prop(accessory(Accessory::Center, "Node"))
            .statics(&[("alignment", PropertyKind::Enumeration(POS), None)]),
        ClassSpec::new("GridPane", "javafx.scene.layout", Some("Pane"))
            .prop(number("hgap", N::Size).default("0"))
            .prop(number("vgap", N::Size).default("0"))
            .prop(choice("alignment", POS).default("TOP_LEFT"))
            .prop(boolean("gridLinesVisible").default("false"))
            .prop(objects("columnConstraints", "ColumnConstraints"))
            .prop(objects("rowConstraints", "RowConstraints"))
            .statics(&[
                (
                    "columnIndex",
                    PropertyKind::Integer(IntegerKind::GridIndex(GridAxis::Column)),
                    Some("0"),
                ),
                (
                    "rowIndex",
                    PropertyKind::Integer(IntegerKind::GridIndex(GridAxis::Row)),
                    Some("0"),
                ),
                (
                    "columnSpan",
                    PropertyKind::Integer(IntegerKind::GridSpan(GridAxis::Column)),
                    Some("1"),
                ),
                (
                    "rowSpan",
                    PropertyKind::Integer(IntegerKind::GridSpan(GridAxis::Row)),
                    Some("1"),
                ),
                ("halignment", PropertyKind::Enumeration(HPOS), None),
                ("valignment", PropertyKind::Enumeration(VPOS), None),
                ("hgrow", PropertyKind::Enumeration(PRIORITY), None),
                ("vgrow", PropertyKind::Enumeration(PRIORITY), None),
            ]),
        ClassSpec::new("ColumnConstraints", "javafx.scene.layout", Some("Object"))
            .prop(number("percentWidth", N::Percentage).default("-1"))
            .prop(number("prefWidth", N::SizeWithSentinel(COMPUTED)).default("-1"))
            .prop(number("minWidth", N::SizeWithSentinel(COMPUTED_OR_PREF)).default("-1"))
            .prop(number("maxWidth", N::SizeWithSentinel(COMPUTED_OR_PREF)).default("-1"))
            .prop(choice("hgrow", PRIORITY))
            .prop(choice("halignment", HPOS))
            .prop(boolean("fillWidth").default("true")),
        ClassSpec::new("RowConstraints", "javafx.scene.layout", Some("Object"))
            .prop(number("percentHeight", N::Percentage).default("-1"))
            .prop(number("prefHeight", N::SizeWithSentinel(COMPUTED)).default("-1"))
            .prop(number("minHeight", N::SizeWithSentinel(COMPUTED_OR_PREF)).default("-1"))
            .prop(number("maxHeight", N::SizeWithSentinel(COMPUTED_OR_PREF)).default("-1"))
            .prop(choice("vgrow", PRIORITY))
            .prop(choice("valignment", VPOS))
            .prop(boolean("fillHeight").default("true")),
        ClassSpec::new("Control", "javafx.scene.control", Some("Region"))
            .prop(accessory(Accessory::Tooltip, "Tooltip"))
            .prop(accessory(Accessory::ContextMenu, "ContextMenu")),
        ClassSpec::new("Labeled", "javafx.scene.control", Some("Control"))
            .prop(text("text"))
            .prop(boolean("wrapText").default("false"))
            .prop(boolean("mnemonicParsing").default("false"))
            .prop(choice("alignment", POS).default("CENTER_LEFT"))
            .prop(accessory(Accessory::Graphic, "Node")),
        ClassSpec::new("Label", "javafx.scene.control", Some("Labeled")),
        ClassSpec::new("Button", "javafx.scene.control", Some("Labeled"))
            .prop(boolean("defaultButton").default("false"))
            .prop(boolean("cancelButton").default("false")),
        ClassSpec::new("CheckBox", "javafx.scene.control", Some("Labeled"))
            .prop(boolean("selected").default("false"))
            .prop(boolean("indeterminate").default("false")),
        ClassSpec::new("ProgressIndicator", "javafx.scene.control", Some("Control"))
            .prop(number("progress", N::Opacity)),
        ClassSpec::new("ProgressBar", "javafx.scene.control", Some("ProgressIndicator")),
        ClassSpec::new("ScrollPane", "javafx.scene.control", Some("Control"))
            .prop(accessory(Accessory::Content, "Node"))
            .prop(boolean("fitToWidth").default("false"))
            .prop(boolean("fitToHeight").default("false"))
            .prop(choice("hbarPolicy", SCROLLBAR_POLICY).default("AS_NEEDED"))
            .prop(choice("vbarPolicy", SCROLLBAR_POLICY).default("AS_NEEDED"))
            .default_property("content"),
        ClassSpec::new("TitledPane", "javafx.scene.control", Some("Labeled"))
            .prop(accessory(Accessory::Content, "Node"))
            .prop(boolean("expanded").default("true"))
            .prop(boolean("collapsible").default("true"))
            .default_property("content"),
        ClassSpec::new("SplitPane", "javafx.scene.control", Some("Control"))
            .prop(objects("items", "Node"))
            .default_property("items"),
        ClassSpec::new("TabPane", "javafx.scene.control", Some("Control"))
            .prop(objects("tabs", "Tab"))
            .prop(choice("side", SIDE).default("TOP"))
            .default_property("tabs"),
        ClassSpec::new("Tab", "javafx.scene.control", Some("Object"))
            .prop(text("text"))
            .prop(boolean("closable").default("true"))
            .prop(accessory(Accessory::Content, "Node"))
            .prop(accessory(Accessory::Graphic, "Node"))
            .prop(accessory(Accessory::Tooltip, "Tooltip"))
            .default_property("content"),
        ClassSpec::new("Tooltip", "javafx.scene.control", Some("Object"))
            .prop(text("text"))
            .prop(accessory(Accessory::Graphic, "Node")),
        ClassSpec::new("MenuItem", "javafx.scene.control", Some("Object")).prop(text("text")),
        ClassSpec::new("ContextMenu", "javafx.scene.control", Some("Object"))
            .prop(objects("items", "MenuItem"))
            .default_property("items"),
        ClassSpec::new("ImageView", "javafx.scene.image", Some("Node"))
            .prop(object("image", "Image"))
            .prop(number("fitWidth", N::Size).default("0"))
            .prop(number("fitHeight", N::Size).default("0"))
            .prop(boolean("preserveRatio").default("false"))
            .prop(boolean("smooth").default("true"))
            .default_property("image"),
        ClassSpec::new("Image", "javafx.scene.image", Some("Object"))
            .prop(text("url"))
            .prop(number("requestedWidth", N::Size).default("0"))
            .prop(number("requestedHeight", N::Size).default("0"))
            .prop(boolean("backgroundLoading").default("false")),
        ClassSpec::new("Shape", "javafx.scene.shape", Some("Node"))
            .prop(text("fill"))
            .prop(text("stroke"))
            .prop(number("strokeWidth", N::Size).default("1")),
        ClassSpec::new("Rectangle", "javafx.scene.shape", Some("Shape"))
            .prop(number("width", N::Size).default("0"))
            .prop(number("height", N::Size).default("0"))
            .prop(number("arcWidth", N::Size).default("0"))
            .prop(number("arcHeight", N::Size).default("0")),
        ClassSpec::new("Circle", "javafx.scene.shape", Some("Shape"))
            .prop(number("radius", N::Size).default("0")),
    ]
}

// ─── Registry ────────────────────────────────────────────────────────────

/// Explicitly constructed metadata registry.
#[derive(Debug, Clone)]
pub struct Registry {
    classes: HashMap<ClassName, ClassInfo>,
    by_qualified: HashMap<String, ClassName>,
    /// Merged descriptors, keyed by class identity.
    descriptors: HashMap<ClassName, ComponentDescriptor>,
    statics: HashMap<PropertyName, PropertyDescriptor>,
    structural: HashSet<PropertyName>,
}

impl Registry {
    /// Registry holding the builtin component classes.
    pub fn builtin() -> Self {
        let mut registry = Self {
            classes: HashMap::new(),
            by_qualified: HashMap::new(),
            descriptors: HashMap::new(),
            statics: HashMap::new(),
            structural: HashSet::new(),
        };

        let specs = builtin_classes();
        let names: Vec<ClassName> = specs.iter().map(|s| ClassName::of(s.name)).collect();
        for spec in specs {
            registry.insert_class(spec);
        }
        for class in names {
            let descriptor = registry.merge(class);
            registry.descriptors.insert(class, descriptor);
        }
        registry
    }

    fn insert_class(&mut self, spec: ClassSpec) {
        let class = ClassName::of(spec.name);
        let qualified = format!("{}.{}", spec.package, spec.name);
        for descriptor in spec.properties.iter().chain(spec.statics.iter()) {
            if descriptor.parent_related {
                self.structural.insert(descriptor.name);
            }
        }
        for descriptor in spec.statics {
            self.statics.insert(descriptor.name, descriptor);
        }
        self.by_qualified.insert(qualified.clone(), class);
        self.classes.insert(
            class,
            ClassInfo {
                qualified,
                superclass: spec.superclass.map(ClassName::of),
                properties: spec.properties,
                hidden: spec.hidden,
                default_property: spec.default_property,
            },
        );
    }

    /// Layer each class's own properties over its superclass chain.
    fn merge(&self, class: ClassName) -> ComponentDescriptor {
        let mut chain = Vec::new();
        let mut current = Some(class);
        while let Some(c) = current {
            let Some(info) = self.classes.get(&c) else {
                break;
            };
            chain.push(info);
            current = info.superclass;
        }

        let mut properties: IndexMap<PropertyName, PropertyDescriptor> = IndexMap::new();
        let mut default_property = None;
        for info in chain.iter().rev() {
            for hidden in &info.hidden {
                properties.shift_remove(&PropertyName::new(hidden));
            }
            for descriptor in &info.properties {
                properties.insert(descriptor.name, descriptor.clone());
            }
            if let Some(name) = info.default_property {
                default_property = Some(PropertyName::new(name));
            }
        }
        let default_property = default_property.filter(|name| properties.contains_key(name));

        ComponentDescriptor {
            class,
            properties,
            default_property,
        }
    }

    /// Register a user-supplied component class. `ancestry` lists its
    /// superclasses nearest first; the first one the registry knows supplies
    /// the property set, which is cached under the new class.
    pub fn register_custom(
        &mut self,
        name: &str,
        qualified: &str,
        ancestry: &[&str],
    ) -> Result<ClassName, RegistryError> {
        let class = ClassName::of(name);
        if self.classes.contains_key(&class) {
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }
        let known = ancestry
            .iter()
            .map(|a| ClassName::of(a))
            .find(|a| self.classes.contains_key(a))
            .ok_or_else(|| RegistryError::NoKnownAncestor(name.to_string()))?;

        log::debug!("registering custom class {qualified} over {known}");
        self.by_qualified.insert(qualified.to_string(), class);
        self.classes.insert(
            class,
            ClassInfo {
                qualified: qualified.to_string(),
                superclass: Some(known),
                properties: Vec::new(),
                hidden: Vec::new(),
                default_property: None,
            },
        );
        let descriptor = self.merge(class);
        self.descriptors.insert(class, descriptor);
        Ok(class)
    }

    pub fn contains(&self, class: ClassName) -> bool {
        self.classes.contains_key(&class)
    }

    pub fn resolve_simple_name(&self, name: &str) -> Option<ClassName> {
        let class = ClassName::of(name);
        self.contains(class).then_some(class)
    }

    pub fn resolve_qualified(&self, qualified: &str) -> Option<ClassName> {
        self.by_qualified.get(qualified).copied()
    }

    pub fn qualified_name(&self, class: ClassName) -> Option<&str> {
        self.classes.get(&class).map(|info| info.qualified.as_str())
    }

    pub fn superclass(&self, class: ClassName) -> Option<ClassName> {
        self.classes.get(&class).and_then(|info| info.superclass)
    }

    /// True when `class` is `ancestor` or inherits from it.
    pub fn is_subclass(&self, class: ClassName, ancestor: ClassName) -> bool {
        let mut current = Some(class);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.superclass(c);
        }
        false
    }

    pub fn describe(&self, class: ClassName) -> Option<&ComponentDescriptor> {
        self.descriptors.get(&class)
    }

    /// Look up a property as seen on an instance of `class` whose parent is
    /// an instance of `parent`. Static properties only resolve when the
    /// parent is (a subclass of) their residence class.
    pub fn property(
        &self,
        class: ClassName,
        parent: Option<ClassName>,
        name: &PropertyName,
    ) -> Option<&PropertyDescriptor> {
        match name.residence {
            Some(residence) => {
                let parent = parent?;
                if !self.is_subclass(parent, residence) {
                    return None;
                }
                self.statics.get(name)
            }
            None => self.describe(class)?.property(name),
        }
    }

    /// Properties whose edits carry parent-relative meaning.
    pub fn is_structural(&self, name: &PropertyName) -> bool {
        name.is_static() || self.structural.contains(name)
    }

    pub fn validate(
        &self,
        class: ClassName,
        parent: Option<ClassName>,
        name: &PropertyName,
        raw: &str,
        ctx: &ValidationContext,
    ) -> Result<Value, ValidationError> {
        self.property(class, parent, name)
            .ok_or_else(|| ValidationError::UnknownProperty(name.to_string()))?
            .validate(raw, ctx)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}
