//! # Document Model
//!
//! The canonical, serializable document: nodes, frames, and component
//! definitions, each keyed by its structural id.
//!
//! Sibling order is the order of a parent's `children` list; there is no
//! separate z-index. Parentage is not stored on the child; it is derived on
//! demand (see [`crate::ParentIndex`]).
//!
//! A node's JSON shape is what property paths address:
//!
//! ```text
//! {
//!   "id": "title", "name": "Title",
//!   "type": "text", "props": { "text": "Hello", ... },
//!   "layout": { "position": { "mode": "auto", "x": 0, "y": 0 }, ... },
//!   "style": { "fill": { "color": { "hex": "#000000" } }, ... },
//!   "children": []
//! }
//! ```

use crate::errors::DocumentResult;
use designer_common::{read_json_file, ComponentId, FrameId, NodeId, Point, Size};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Canonical document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub nodes: BTreeMap<NodeId, Node>,

    #[serde(default)]
    pub frames: BTreeMap<FrameId, Frame>,

    #[serde(default)]
    pub components: BTreeMap<ComponentId, ComponentDef>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(source: &str) -> DocumentResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn load(path: &Path) -> DocumentResult<Self> {
        Ok(read_json_file(path)?)
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn frame(&self, id: &FrameId) -> Option<&Frame> {
        self.frames.get(id)
    }

    pub fn component(&self, id: &ComponentId) -> Option<&ComponentDef> {
        self.components.get(id)
    }

    /// Finds the parent of `id` by scanning every child list.
    ///
    /// This is the slow path used by the pure apply function; the store keeps
    /// a [`crate::ParentIndex`] for repeated lookups.
    pub fn find_parent(&self, id: &NodeId) -> Option<&NodeId> {
        self.nodes
            .values()
            .find(|node| node.children.contains(id))
            .map(|node| &node.id)
    }

    /// Builder-style insertion, mostly for fixtures.
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.insert(node.id.clone(), node);
        self
    }

    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frames.insert(frame.id.clone(), frame);
        self
    }

    pub fn with_component(mut self, component: ComponentDef) -> Self {
        self.components.insert(component.id.clone(), component);
        self
    }
}

/// A visual element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,

    #[serde(default)]
    pub name: String,

    /// Type tag and its property payload
    #[serde(flatten)]
    pub kind: NodeKind,

    #[serde(default)]
    pub layout: Layout,

    #[serde(default)]
    pub style: Style,

    /// Ordered child ids; order is paint and flow order
    #[serde(default)]
    pub children: Vec<NodeId>,

    /// Set when this node is slot content owned by (and deleted with) an instance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_instance_id: Option<NodeId>,

    /// Set when this node belongs to a component template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<TemplateSource>,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, kind: NodeKind) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            kind,
            layout: Layout::default(),
            style: Style::default(),
            children: Vec::new(),
            owner_instance_id: None,
            source: None,
        }
    }

    pub fn container(id: impl Into<NodeId>) -> Self {
        Self::new(id, NodeKind::Container(ContainerProps::default()))
    }

    pub fn text(id: impl Into<NodeId>, text: impl Into<String>) -> Self {
        Self::new(
            id,
            NodeKind::Text(TextProps {
                text: text.into(),
                ..TextProps::default()
            }),
        )
    }

    pub fn instance(id: impl Into<NodeId>, component_id: impl Into<ComponentId>) -> Self {
        Self::new(
            id,
            NodeKind::Instance(InstanceProps {
                component_id: component_id.into(),
                overrides: BTreeMap::new(),
                slot_assignments: BTreeMap::new(),
            }),
        )
    }

    pub fn slot(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Slot(SlotProps { name: name.into() }))
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = impl Into<NodeId>>) -> Self {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_auto_layout(mut self, auto_layout: AutoLayout) -> Self {
        self.layout.auto_layout = Some(auto_layout);
        self
    }

    pub fn with_source(mut self, component_id: impl Into<ComponentId>, template_local_id: impl Into<String>) -> Self {
        self.source = Some(TemplateSource {
            component_id: component_id.into(),
            template_local_id: template_local_id.into(),
        });
        self
    }

    pub fn with_owner(mut self, instance_id: impl Into<NodeId>) -> Self {
        self.owner_instance_id = Some(instance_id.into());
        self
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    /// True if this node arranges its children with auto-layout
    pub fn has_auto_layout(&self) -> bool {
        self.layout.auto_layout.is_some()
    }

    pub fn as_instance(&self) -> Option<&InstanceProps> {
        match &self.kind {
            NodeKind::Instance(props) => Some(props),
            _ => None,
        }
    }

    pub fn as_slot(&self) -> Option<&SlotProps> {
        match &self.kind {
            NodeKind::Slot(props) => Some(props),
            _ => None,
        }
    }
}

/// Where a template node came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSource {
    pub component_id: ComponentId,
    pub template_local_id: String,
}

/// Node type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    Container,
    Text,
    Image,
    Icon,
    Spacer,
    Instance,
    Slot,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Container => "container",
            NodeType::Text => "text",
            NodeType::Image => "image",
            NodeType::Icon => "icon",
            NodeType::Spacer => "spacer",
            NodeType::Instance => "instance",
            NodeType::Slot => "slot",
        }
    }
}

/// Type-specific property payload, keyed by the type tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "props", rename_all = "camelCase")]
pub enum NodeKind {
    Container(ContainerProps),
    Text(TextProps),
    Image(ImageProps),
    Icon(IconProps),
    Spacer(SpacerProps),
    Instance(InstanceProps),
    Slot(SlotProps),
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Container(_) => NodeType::Container,
            NodeKind::Text(_) => NodeType::Text,
            NodeKind::Image(_) => NodeType::Image,
            NodeKind::Icon(_) => NodeType::Icon,
            NodeKind::Spacer(_) => NodeType::Spacer,
            NodeKind::Instance(_) => NodeType::Instance,
            NodeKind::Slot(_) => NodeType::Slot,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerProps {
    pub clip_content: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextProps {
    pub text: String,
    pub font_size: f64,
    pub font_weight: u16,
    pub text_align: TextAlign,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 14.0,
            font_weight: 400,
            text_align: TextAlign::Start,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextAlign {
    #[default]
    Start,
    Center,
    End,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageProps {
    pub src: String,
    pub fit: ImageFit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageFit {
    #[default]
    Cover,
    Contain,
    Fill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IconProps {
    pub name: String,
    pub size: f64,
}

impl Default for IconProps {
    fn default() -> Self {
        Self {
            name: String::new(),
            size: 16.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpacerProps {}

/// Payload of an instance of a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceProps {
    pub component_id: ComponentId,

    /// Property overrides, keyed by template-local id or by the fully
    /// namespaced id (`componentId::localId`). Values are deep-merged into
    /// the target template node's `props`.
    #[serde(default)]
    pub overrides: BTreeMap<String, Value>,

    /// Slot name → root of an externally owned content subtree
    #[serde(default)]
    pub slot_assignments: BTreeMap<String, NodeId>,
}

/// Named extension point inside a component template. The slot node's own
/// children are its default content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SlotProps {
    pub name: String,
}

/// Layout data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Layout {
    pub position: Position,
    pub width: SizeMode,
    pub height: SizeMode,

    /// Present when this node arranges its own children
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_layout: Option<AutoLayout>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Position {
    pub mode: PositionMode,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PositionMode {
    /// Placed by the parent's auto-layout
    #[default]
    Auto,
    /// Free-floating at `x`/`y`
    Absolute,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum SizeMode {
    Fixed { value: f64 },
    Hug,
    Fill,
}

impl Default for SizeMode {
    fn default() -> Self {
        SizeMode::Hug
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutoLayout {
    pub direction: Direction,
    pub gap: f64,
    pub padding: Padding,
    pub main_align: Align,
    pub cross_align: Align,
}

impl Default for AutoLayout {
    fn default() -> Self {
        Self {
            direction: Direction::Vertical,
            gap: 0.0,
            padding: Padding::default(),
            main_align: Align::Start,
            cross_align: Align::Start,
        }
    }
}

impl AutoLayout {
    pub fn horizontal(gap: f64) -> Self {
        Self {
            direction: Direction::Horizontal,
            gap,
            ..Self::default()
        }
    }

    pub fn vertical(gap: f64) -> Self {
        Self {
            direction: Direction::Vertical,
            gap,
            ..Self::default()
        }
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Horizontal,
    #[default]
    Vertical,
}

impl Direction {
    pub fn axis(self) -> designer_common::Axis {
        match self {
            Direction::Horizontal => designer_common::Axis::Horizontal,
            Direction::Vertical => designer_common::Axis::Vertical,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Padding {
    pub fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Align {
    #[default]
    Start,
    Center,
    End,
    Stretch,
    SpaceBetween,
}

/// Style data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Style {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fill>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Stroke>,

    pub corner_radii: CornerRadii,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow: Option<Shadow>,

    pub opacity: f64,
    pub visible: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            corner_radii: CornerRadii::default(),
            shadow: None,
            opacity: 1.0,
            visible: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Color {
    pub hex: String,
    pub alpha: f64,
}

impl Default for Color {
    fn default() -> Self {
        Self {
            hex: "#000000".to_string(),
            alpha: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Fill {
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            color: Color::default(),
            width: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CornerRadii {
    pub top_left: f64,
    pub top_right: f64,
    pub bottom_right: f64,
    pub bottom_left: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Shadow {
    pub x: f64,
    pub y: f64,
    pub blur: f64,
    pub color: Color,
}

/// A named canvas placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub id: FrameId,

    #[serde(default)]
    pub name: String,

    /// World-space position of the frame's top-left corner
    #[serde(default)]
    pub position: Point,

    #[serde(default)]
    pub size: Size,

    pub root_node_id: NodeId,

    /// Set for component-editing frames, whose root is the component's own root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<ComponentId>,
}

impl Frame {
    pub fn new(id: impl Into<FrameId>, root_node_id: impl Into<NodeId>) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            position: Point::default(),
            size: Size::default(),
            root_node_id: root_node_id.into(),
            component_id: None,
        }
    }

    pub fn at(mut self, position: Point, size: Size) -> Self {
        self.position = position;
        self.size = size;
        self
    }

    /// Marks this frame as the editing surface of a component
    pub fn editing(mut self, component_id: impl Into<ComponentId>) -> Self {
        self.component_id = Some(component_id.into());
        self
    }
}

/// Reusable template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDef {
    pub id: ComponentId,

    #[serde(default)]
    pub name: String,

    /// Root of the template subtree (a namespaced `componentId::localId`)
    pub root_node_id: NodeId,
}

impl ComponentDef {
    pub fn new(id: impl Into<ComponentId>, root_node_id: impl Into<NodeId>) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            root_node_id: root_node_id.into(),
        }
    }
}
