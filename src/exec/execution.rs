use std::sync::Arc;

use tracing::{debug, trace, trace_span, warn};

use crate::{
    exec::execution_controller::Ticket,
    flow::{flow::FlowInner, flow_type::Value},
    nodes::node::NodeId,
    sched::executor::lock,
};

/// Schedules a recomputation of `id`, superseding any earlier one for that node.
///
/// Returns immediately. On completion the task cascades to the node fed by
/// `id`'s output if the output changed (or `force_traverse` is set), otherwise
/// it notifies the observer. Returns `false` if the node does not exist.
pub(crate) fn invalidate(inner: &Arc<FlowInner>, id: NodeId, force_traverse: bool) -> bool {
    let Some(node) = inner.node(id) else {
        return false;
    };
    let ticket = lock(&node).controller_mut().begin();
    trace!(node = id, ticket, force_traverse, "invalidate");

    let flow = Arc::downgrade(inner);
    inner.pool.execute(move || {
        // A dropped flow cancels everything still queued.
        if let Some(inner) = flow.upgrade() {
            recompute(&inner, id, ticket, force_traverse);
        }
    });
    true
}

fn recompute(inner: &Arc<FlowInner>, id: NodeId, ticket: Ticket, force_traverse: bool) {
    let _span = trace_span!("recompute", node = id, ticket).entered();

    let Some(node) = inner.node(id) else {
        debug!("node removed before recompute");
        return;
    };

    let (node_type, content, sources) = {
        let n = lock(&node);
        if !n.is_current(ticket) {
            debug!("superseded before start");
            return;
        }
        (n.node_type().clone(), n.content().to_vec(), n.input_sources())
    };

    // Producers without an output are left out, not passed as empty values.
    let inputs: Vec<Value> = sources
        .into_iter()
        .filter_map(|source| inner.node(source))
        .filter_map(|source| lock(&source).output().cloned())
        .collect();

    let result = node_type.evaluate(&content, &inputs);
    if let Err(err) = &result {
        warn!(node = id, node_type = node_type.name, error = %err, "compute failed");
    }

    let (changed, sink) = {
        let mut n = lock(&node);
        match n.commit(ticket, result) {
            Some(changed) => (changed, n.output_sink()),
            None => {
                debug!("discarding stale result");
                return;
            }
        }
    };

    // Cascades even when superseded: a committed output must reach the sink.
    match sink {
        Some(sink) if changed || force_traverse => {
            trace!(sink, changed, "cascade");
            invalidate(inner, sink, false);
        }
        _ => {
            trace!(changed, "cascade ended");
            inner.notify(id);
        }
    }
}
