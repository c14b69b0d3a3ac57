use std::sync::{Arc, OnceLock};

use thiserror::Error;

use crate::{
    flow::flow_type::{Image, ValueKind},
    nodes::{
        add, basic, debug, filter,
        node_description::{NodeType, UiHint},
    },
};

/// Registry id of a node type. Also used as connector type tag and in the
/// persisted text format.
pub type NodeTypeId = usize;

pub const INT: NodeTypeId = 0;
pub const FLOAT: NodeTypeId = 1;
pub const STRING: NodeTypeId = 2;
pub const IMAGE: NodeTypeId = 3;
pub const BRIGHTNESS: NodeTypeId = 4;
pub const IMAGE_INPUT: NodeTypeId = 5;
pub const IMAGE_OUTPUT: NodeTypeId = 6;
pub const SEPIA: NodeTypeId = 7;
pub const INVERT: NodeTypeId = 8;
pub const ADD: NodeTypeId = 9;
pub const DOUBLE: NodeTypeId = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown node type id {0}.")]
    UnknownTypeId(NodeTypeId),

    #[error("Node type ids must equal their position: expected {expected}, found {found}.")]
    NonSequentialId { expected: NodeTypeId, found: NodeTypeId },
}

/// Immutable catalog of node types, indexed by id in declaration order.
#[derive(Debug)]
pub struct NodeTypeRegistry {
    types: Vec<Arc<NodeType>>,
}

impl NodeTypeRegistry {
    pub fn new(types: Vec<NodeType>) -> Result<Self, RegistryError> {
        let types = types
            .into_iter()
            .enumerate()
            .map(|(expected, t)| {
                if t.id == expected {
                    Ok(Arc::new(t))
                } else {
                    Err(RegistryError::NonSequentialId { expected, found: t.id })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { types })
    }

    /// The process-wide built-in catalog.
    pub fn builtin() -> Arc<NodeTypeRegistry> {
        static BUILTIN: OnceLock<Arc<NodeTypeRegistry>> = OnceLock::new();
        BUILTIN
            .get_or_init(|| {
                Arc::new(Self {
                    types: builtin_types().into_iter().map(Arc::new).collect(),
                })
            })
            .clone()
    }

    pub fn get(&self, id: NodeTypeId) -> Result<Arc<NodeType>, RegistryError> {
        self.types
            .get(id)
            .cloned()
            .ok_or(RegistryError::UnknownTypeId(id))
    }

    pub fn list_all(&self) -> &[Arc<NodeType>] {
        &self.types
    }

    /// Types the user may place from the palette.
    pub fn palette(&self) -> impl Iterator<Item = &Arc<NodeType>> {
        self.types.iter().filter(|t| t.listable)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn builtin_types() -> Vec<NodeType> {
    vec![
        NodeType::new(INT, "Int", basic::constant)
            .with_content(0)
            .with_output(ValueKind::Int),
        NodeType::new(FLOAT, "Float", basic::constant)
            .with_content(0.0f32)
            .with_output(ValueKind::Real),
        NodeType::new(STRING, "String", basic::constant)
            .with_content("")
            .with_output(ValueKind::Text),
        NodeType::new(IMAGE, "Image", basic::constant)
            .with_content(Image::blank())
            .with_output(ValueKind::Image)
            .with_ui_hint(UiHint::Openable),
        NodeType::new(BRIGHTNESS, "Brightness", filter::brightness)
            .with_input(ValueKind::Image, "Image")
            .with_input(ValueKind::Real, "Factor")
            .with_output(ValueKind::Image)
            .with_ui_hint(UiHint::Viewable),
        NodeType::new(IMAGE_INPUT, "Image Input", basic::constant)
            .with_content(Image::blank())
            .with_output(ValueKind::Image)
            .with_ui_hint(UiHint::Openable)
            .hidden(),
        NodeType::new(IMAGE_OUTPUT, "Image Output", debug::image_output)
            .with_input(ValueKind::Image, "Image")
            .with_ui_hint(UiHint::Saveable)
            .hidden(),
        NodeType::new(SEPIA, "Sepia", filter::sepia_filter)
            .with_input(ValueKind::Image, "Image")
            .with_input(ValueKind::Int, "Intensity")
            .with_output(ValueKind::Image)
            .with_ui_hint(UiHint::Viewable),
        NodeType::new(INVERT, "Invert", filter::invert_filter)
            .with_input(ValueKind::Image, "Image")
            .with_output(ValueKind::Image)
            .with_ui_hint(UiHint::Viewable),
        NodeType::new(ADD, "Add", add::add)
            .with_input(ValueKind::Int, "A")
            .with_input(ValueKind::Int, "B")
            .with_output(ValueKind::Int),
        NodeType::new(DOUBLE, "Double", add::double)
            .with_input(ValueKind::Int, "Value")
            .with_output(ValueKind::Int),
    ]
}
