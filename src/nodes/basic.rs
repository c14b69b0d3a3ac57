use crate::{
    flow::flow_type::Value,
    nodes::node_description::ComputeError,
};

/// Emits the node's single content slot unchanged.
pub fn constant(content: &[Value], _inputs: &[Value]) -> Result<Value, ComputeError> {
    match content.first() {
        Some(Value::None) | None => Err(ComputeError::InvalidContent(
            "constant node has no value".into(),
        )),
        Some(value) => Ok(value.clone()),
    }
}
