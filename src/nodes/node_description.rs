use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    flow::flow_type::{Value, ValueKind},
    nodes::registry::NodeTypeId,
};

/// A pure compute function: `(content, available inputs) -> output`.
///
/// Inputs whose producer has no output are omitted, so the slice may be
/// shorter than the number of declared input slots.
pub type ComputeFn = fn(&[Value], &[Value]) -> Result<Value, ComputeError>;

#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("Required input '{0}' is not connected or has no value.")]
    MissingInput(&'static str),

    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("Compute function panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Tag consumed only by the view. Carries no engine semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UiHint {
    #[default]
    None,
    Openable,
    Saveable,
    Viewable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSlot {
    pub kind: ValueKind,
    pub label: &'static str,
}

#[derive(Debug, Clone)]
/// Describes a kind of node.
/// Please note that this separates the schema of a node (its fields, inputs
/// and output) from the mutable state of a placed instance
/// (see also [crate::nodes::node::NodeInstance]).
pub struct NodeType {
    pub id: NodeTypeId,
    pub name: &'static str,
    /// Default-valued editable fields. Each default fixes the kind of its slot.
    pub content: Vec<Value>,
    pub inputs: Vec<InputSlot>,
    /// `None` for terminal sinks that have no output connector.
    pub output: Option<ValueKind>,
    pub compute: ComputeFn,
    pub listable: bool,
    pub ui_hint: UiHint,
}

impl NodeType {
    pub fn new(id: NodeTypeId, name: &'static str, compute: ComputeFn) -> Self {
        Self {
            id,
            name,
            content: Vec::new(),
            inputs: Vec::new(),
            output: None,
            compute,
            listable: true,
            ui_hint: UiHint::None,
        }
    }

    pub fn with_content(mut self, default: impl Into<Value>) -> Self {
        self.content.push(default.into());
        self
    }

    pub fn with_input(mut self, kind: ValueKind, label: &'static str) -> Self {
        self.inputs.push(InputSlot { kind, label });
        self
    }

    pub fn with_output(mut self, kind: ValueKind) -> Self {
        self.output = Some(kind);
        self
    }

    pub fn with_ui_hint(mut self, hint: UiHint) -> Self {
        self.ui_hint = hint;
        self
    }

    /// Excludes the type from the palette. It can still be placed programmatically.
    pub fn hidden(mut self) -> Self {
        self.listable = false;
        self
    }

    pub fn slot_kind(&self, slot: usize) -> Option<Option<ValueKind>> {
        self.content.get(slot).map(Value::kind)
    }

    /// Runs the compute function, turning a panic into a [`ComputeError`].
    pub fn evaluate(&self, content: &[Value], inputs: &[Value]) -> Result<Value, ComputeError> {
        let compute = self.compute;
        panic::catch_unwind(AssertUnwindSafe(|| compute(content, inputs))).unwrap_or_else(|cause| {
            let message = cause
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| cause.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown cause".into());
            Err(ComputeError::Panicked(message))
        })
    }
}
