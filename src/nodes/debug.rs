use crate::{
    flow::flow_type::Value,
    nodes::node_description::ComputeError,
};

/// Terminal sink: keeps the incoming image as its value so the view can show
/// and save it. Sinks have no output connector, so this never propagates.
pub fn image_output(_content: &[Value], inputs: &[Value]) -> Result<Value, ComputeError> {
    inputs
        .iter()
        .find(|v| v.as_image().is_some())
        .cloned()
        .ok_or(ComputeError::MissingInput("Image"))
}
