use crate::{
    flow::flow_type::Value,
    nodes::node_description::ComputeError,
};

fn ints(inputs: &[Value]) -> impl Iterator<Item = i32> + '_ {
    inputs.iter().filter_map(Value::as_int)
}

/// Sums whatever integer inputs are currently available.
pub fn add(_content: &[Value], inputs: &[Value]) -> Result<Value, ComputeError> {
    let mut values = ints(inputs).peekable();
    if values.peek().is_none() {
        return Err(ComputeError::MissingInput("A"));
    }
    Ok(Value::Int(values.fold(0i32, i32::wrapping_add)))
}

pub fn double(_content: &[Value], inputs: &[Value]) -> Result<Value, ComputeError> {
    let value = ints(inputs).next().ok_or(ComputeError::MissingInput("Value"))?;
    Ok(Value::Int(value.wrapping_mul(2)))
}
