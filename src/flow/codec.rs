//! Text format of a flow.
//!
//! One record per node, in flow order, with no separator between records:
//!
//! ```text
//! <typeId>:<X>x<Y>(<slot0>|<slot1>|...|;<sinkIndex>,<sinkInput>)
//! ```
//!
//! Image slots are written as [`IMAGE_MARKER`] followed by the base64 encoded
//! PNG. The sink reference is empty when the output is not connected.

use std::fmt::Write;

use base64::{engine::general_purpose::STANDARD, Engine};
use thiserror::Error;
use tracing::info;

use crate::{
    flow::{
        flow::{Flow, FlowBuilder, GraphError},
        flow_type::{Image, Value, ValueKind},
    },
    nodes::node::Position,
};

pub const IMAGE_MARKER: char = '絵';

const RESERVED: [char; 3] = ['|', ';', ')'];

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Malformed record {record}: {message}.")]
    Malformed { record: usize, message: String },

    #[error("Content slot {slot} of record {record} contains a reserved character.")]
    ReservedCharacter { record: usize, slot: usize },

    #[error(transparent)]
    Base64(#[from] base64::DecodeError),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

fn malformed(record: usize, message: impl Into<String>) -> CodecError {
    CodecError::Malformed {
        record,
        message: message.into(),
    }
}

pub fn encode(flow: &Flow) -> Result<String, CodecError> {
    let ids = flow.node_ids();
    let mut out = String::new();
    for (record, node) in flow.nodes().iter().enumerate() {
        let position = node.position();
        let _ = write!(out, "{}:{}x{}(", node.type_id(), position.x, position.y);
        for (slot, value) in node.content().iter().enumerate() {
            match value {
                Value::Image(image) => {
                    out.push(IMAGE_MARKER);
                    out.push_str(&STANDARD.encode(image.to_png()?));
                }
                Value::Text(text)
                    if text.contains(RESERVED) || text.starts_with(IMAGE_MARKER) =>
                {
                    return Err(CodecError::ReservedCharacter { record, slot });
                }
                other => {
                    let _ = write!(out, "{}", other);
                }
            }
            out.push('|');
        }
        out.push(';');
        let sink = node
            .output_connector()
            .and_then(|c| c.connection())
            .and_then(|c| Some((ids.iter().position(|id| *id == c.sink)?, c.sink_input)));
        if let Some((index, input)) = sink {
            let _ = write!(out, "{},{}", index, input);
        }
        out.push(')');
    }
    Ok(out)
}

struct Record<'a> {
    type_id: usize,
    position: Position,
    slots: Vec<&'a str>,
    sink: Option<(usize, usize)>,
}

fn parse_record(record: usize, text: &str) -> Result<Record<'_>, CodecError> {
    let (header, body) = text
        .split_once('(')
        .ok_or_else(|| malformed(record, "missing '('"))?;
    let (type_id, position) = header
        .split_once(':')
        .ok_or_else(|| malformed(record, "missing ':'"))?;
    let (x, y) = position
        .split_once('x')
        .ok_or_else(|| malformed(record, "missing 'x' in position"))?;
    let number = |field: &str, what: &str| {
        field
            .trim()
            .parse::<i64>()
            .map_err(|_| malformed(record, format!("invalid {} '{}'", what, field)))
    };
    let coordinate = |field: &str, what: &str| {
        i32::try_from(number(field, what)?)
            .map_err(|_| malformed(record, format!("{} out of range", what)))
    };
    let type_id = usize::try_from(number(type_id, "type id")?)
        .map_err(|_| malformed(record, "negative type id"))?;
    let position = Position::new(coordinate(x, "x")?, coordinate(y, "y")?);

    let (slots, sink) = body
        .split_once(';')
        .ok_or_else(|| malformed(record, "missing ';'"))?;
    let slots = if slots.is_empty() {
        Vec::new()
    } else {
        let slots = slots
            .strip_suffix('|')
            .ok_or_else(|| malformed(record, "slot list not terminated by '|'"))?;
        slots.split('|').collect()
    };

    let sink = if sink.is_empty() {
        None
    } else {
        let (index, input) = sink
            .split_once(',')
            .ok_or_else(|| malformed(record, "missing ',' in sink reference"))?;
        let index = index
            .parse()
            .map_err(|_| malformed(record, format!("invalid sink index '{}'", index)))?;
        let input = input
            .parse()
            .map_err(|_| malformed(record, format!("invalid sink input '{}'", input)))?;
        Some((index, input))
    };

    Ok(Record {
        type_id,
        position,
        slots,
        sink,
    })
}

fn decode_slot(record: usize, kind: Option<ValueKind>, raw: &str) -> Result<Value, CodecError> {
    if kind == Some(ValueKind::Image) {
        let data = raw
            .strip_prefix(IMAGE_MARKER)
            .ok_or_else(|| malformed(record, "image slot without marker"))?;
        let png = STANDARD.decode(data)?;
        return Ok(Value::Image(Image::from_png(&png)?));
    }
    Value::parse(kind, raw)
        .ok_or_else(|| malformed(record, format!("cannot parse '{}' as {:?}", raw, kind)))
}

/// Rebuilds a flow from its text form and schedules its computation.
///
/// Node 0 and every node without a connected input are recomputed with forced
/// propagation, so that each component of the graph gets computed. Each of
/// those cascades ends in its own redraw notification.
pub fn decode(text: &str, builder: FlowBuilder) -> Result<Flow, CodecError> {
    let flow = builder.build();
    let text = text.trim();

    let mut ids = Vec::new();
    let mut sinks = Vec::new();
    for (record, chunk) in text.split(')').enumerate() {
        if chunk.is_empty() {
            continue;
        }
        let parsed = parse_record(record, chunk)?;
        let id = flow.insert_node(parsed.type_id, parsed.position)?;
        let node_type = flow
            .registry()
            .get(parsed.type_id)
            .map_err(|_| GraphError::UnknownTypeId(parsed.type_id))?;
        if parsed.slots.len() != node_type.content.len() {
            return Err(malformed(
                record,
                format!(
                    "expected {} content slots, found {}",
                    node_type.content.len(),
                    parsed.slots.len()
                ),
            ));
        }
        for (slot, raw) in parsed.slots.into_iter().enumerate() {
            let value = decode_slot(record, node_type.slot_kind(slot).flatten(), raw)?;
            flow.restore_content(id, slot, value)?;
        }
        ids.push(id);
        sinks.push((record, parsed.sink));
    }

    for (source, (record, sink)) in ids.iter().zip(sinks) {
        let Some((index, input)) = sink else {
            continue;
        };
        let sink = ids
            .get(index)
            .ok_or_else(|| malformed(record, format!("sink index {} out of range", index)))?;
        flow.link(*source, *sink, input)?;
    }

    for (index, id) in ids.iter().enumerate() {
        let has_input = flow
            .node(*id)
            .is_some_and(|n| n.input_connectors().iter().any(|c| c.is_connected()));
        if index == 0 || !has_input {
            flow.invalidate(*id, true)?;
        }
    }
    info!(nodes = ids.len(), "flow decoded");
    Ok(flow)
}
