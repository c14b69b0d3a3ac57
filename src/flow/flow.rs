use std::sync::{
    atomic::{AtomicU64, Ordering},
    mpsc::Sender,
    Arc, Mutex, PoisonError, RwLock,
};

use thiserror::Error;
use tracing::debug;

use crate::{
    config::EngineConfig,
    exec::execution,
    flow::flow_type::{Value, ValueKind},
    nodes::{
        connection::{Connection, Connector, Point, PortRef},
        node::{ChangeObserver, NodeId, NodeInstance, Position},
        node_description::NodeType,
        registry::{NodeTypeId, NodeTypeRegistry},
    },
    sched::executor::{lock, SyncThreadPool},
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Unknown node type id {0}.")]
    UnknownTypeId(NodeTypeId),

    #[error("No node with id {0} in this flow.")]
    UnknownNode(NodeId),

    #[error("Cannot connect an output of type {output} to an input of type {input}.")]
    TypeMismatch { output: ValueKind, input: ValueKind },

    #[error("A connection needs exactly one output and one input connector.")]
    DirectionMismatch,

    #[error("Node {0} has no output connector.")]
    NoOutputConnector(NodeId),

    #[error("Input {index} out of bounds for node {node} with {len} inputs.")]
    InputOutOfBounds { node: NodeId, index: usize, len: usize },

    #[error("Content slot {slot} out of bounds for node {node} with {len} slots.")]
    SlotOutOfBounds { node: NodeId, slot: usize, len: usize },

    #[error("Cannot parse '{raw}' as {expected:?} for content slot {slot}.")]
    ParseFailure {
        slot: usize,
        expected: Option<ValueKind>,
        raw: String,
    },

    #[error("Content slot {slot} holds {expected:?} values, got {found:?}.")]
    KindMismatch {
        slot: usize,
        expected: Option<ValueKind>,
        found: Option<ValueKind>,
    },
}

type NodeHandle = Arc<Mutex<NodeInstance>>;

/// State shared between a [`Flow`] and its recomputation jobs.
pub(crate) struct FlowInner {
    registry: Arc<NodeTypeRegistry>,
    // Insertion order is the node index of the text format.
    nodes: RwLock<Vec<(NodeId, NodeHandle)>>,
    id_counter: AtomicU64,
    pub(crate) pool: SyncThreadPool,
    notifier: Option<Sender<NodeId>>,
}

impl FlowInner {
    pub(crate) fn node(&self, id: NodeId) -> Option<NodeHandle> {
        self.nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(node_id, _)| *node_id == id)
            .map(|(_, node)| node.clone())
    }

    pub(crate) fn notify(&self, id: NodeId) {
        if let Some(notifier) = &self.notifier {
            let _res = notifier.send(id);
        }
    }
}

pub struct FlowBuilder {
    registry: Arc<NodeTypeRegistry>,
    config: EngineConfig,
    notifier: Option<Sender<NodeId>>,
}

impl FlowBuilder {
    pub fn new(registry: Arc<NodeTypeRegistry>) -> Self {
        Self {
            registry,
            config: EngineConfig::default(),
            notifier: None,
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers.max(1);
        self
    }

    /// Redraw notifications go to `observer`.
    pub fn observer(mut self, observer: &ChangeObserver) -> Self {
        self.notifier = Some(observer.notifier.clone());
        self
    }

    pub fn build(self) -> Flow {
        Flow {
            inner: Arc::new(FlowInner {
                registry: self.registry,
                nodes: RwLock::new(Vec::new()),
                id_counter: AtomicU64::new(0),
                pool: SyncThreadPool::new(&self.config),
                notifier: self.notifier,
            }),
        }
    }
}

/// The ordered collection of node instances and the connections between them.
///
/// All edits are expected from a single control thread; recomputation runs on
/// the flow's worker pool. Cloning yields another handle to the same flow.
#[derive(Clone)]
pub struct Flow {
    inner: Arc<FlowInner>,
}

impl Flow {
    pub fn new(registry: Arc<NodeTypeRegistry>) -> Self {
        FlowBuilder::new(registry).build()
    }

    pub fn builder(registry: Arc<NodeTypeRegistry>) -> FlowBuilder {
        FlowBuilder::new(registry)
    }

    pub fn registry(&self) -> &Arc<NodeTypeRegistry> {
        &self.inner.registry
    }

    pub fn palette(&self) -> Vec<Arc<NodeType>> {
        self.inner.registry.palette().cloned().collect()
    }

    /// Places a new node and schedules its first computation.
    pub fn add_node(&self, type_id: NodeTypeId, position: Position) -> Result<NodeId, GraphError> {
        let id = self.insert_node(type_id, position)?;
        execution::invalidate(&self.inner, id, false);
        Ok(id)
    }

    /// Places a new node without computing it.
    pub(crate) fn insert_node(
        &self,
        type_id: NodeTypeId,
        position: Position,
    ) -> Result<NodeId, GraphError> {
        let node_type = self
            .inner
            .registry
            .get(type_id)
            .map_err(|_| GraphError::UnknownTypeId(type_id))?;
        let id = self.inner.id_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let node = NodeInstance::new(id, node_type, position);
        self.inner
            .nodes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(Mutex::new(node))));
        Ok(id)
    }

    /// Detaches every connection of the node, cancels its pending
    /// recomputation and drops it. The former downstream node is recomputed.
    pub fn remove_node(&self, id: NodeId) -> Result<(), GraphError> {
        let node = self.handle(id)?;
        let num_inputs = {
            let mut n = lock(&node);
            n.controller_mut().cancel();
            n.input_connectors().len()
        };
        for index in 0..num_inputs {
            self.unlink(PortRef::Input(id, index));
        }
        let downstream = self.unlink(PortRef::Output(id)).map(|c| c.sink);

        self.inner
            .nodes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(node_id, _)| *node_id != id);
        debug!(node = id, "node removed");

        if let Some(sink) = downstream.filter(|sink| *sink != id) {
            execution::invalidate(&self.inner, sink, false);
        }
        Ok(())
    }

    /// Parses `raw` as the slot's kind and commits it. Unparseable text leaves
    /// the node untouched. Returns whether the value changed; only a change
    /// triggers recomputation.
    pub fn set_content(&self, id: NodeId, slot: usize, raw: &str) -> Result<bool, GraphError> {
        let node = self.handle(id)?;
        let changed = {
            let mut n = lock(&node);
            let kind = Self::slot_kind(&n, slot)?;
            let value = Value::parse(kind, raw).ok_or_else(|| GraphError::ParseFailure {
                slot,
                expected: kind,
                raw: raw.to_owned(),
            })?;
            n.set_slot(slot, value)
        };
        if changed {
            execution::invalidate(&self.inner, id, false);
        }
        Ok(changed)
    }

    /// Like [`Flow::set_content`] for values without a textual form, such as
    /// an image opened by the view.
    pub fn set_content_value(&self, id: NodeId, slot: usize, value: Value) -> Result<bool, GraphError> {
        let changed = self.restore_content(id, slot, value)?;
        if changed {
            execution::invalidate(&self.inner, id, false);
        }
        Ok(changed)
    }

    /// Writes a content slot of the matching kind without recomputing.
    pub(crate) fn restore_content(&self, id: NodeId, slot: usize, value: Value) -> Result<bool, GraphError> {
        let node = self.handle(id)?;
        let mut n = lock(&node);
        let expected = Self::slot_kind(&n, slot)?;
        if value.kind() != expected {
            return Err(GraphError::KindMismatch {
                slot,
                expected,
                found: value.kind(),
            });
        }
        Ok(n.set_slot(slot, value))
    }

    fn slot_kind(node: &NodeInstance, slot: usize) -> Result<Option<ValueKind>, GraphError> {
        node.node_type()
            .slot_kind(slot)
            .ok_or(GraphError::SlotOutOfBounds {
                node: node.id(),
                slot,
                len: node.content().len(),
            })
    }

    pub fn set_position(&self, id: NodeId, position: Position) -> Result<(), GraphError> {
        let node = self.handle(id)?;
        lock(&node).set_position(position);
        Ok(())
    }

    pub fn set_connector_position(&self, port: PortRef, position: Point) -> Result<(), GraphError> {
        let node = self.handle(port.node())?;
        let mut n = lock(&node);
        if n.connector(port).is_none() {
            return Err(Self::missing_connector(&n, port));
        }
        if let Some(connector) = n.connector_mut(port) {
            connector.position = position;
        }
        Ok(())
    }

    /// Connects `source`'s output to input `sink_input` of `sink`.
    ///
    /// Whatever either connector held before is detached first. The sink is
    /// then recomputed and its result propagated unconditionally.
    pub fn try_connect(
        &self,
        source: NodeId,
        sink: NodeId,
        sink_input: usize,
    ) -> Result<Connection, GraphError> {
        let (connection, orphaned) = self.link(source, sink, sink_input)?;
        if let Some(orphaned) = orphaned.filter(|orphaned| *orphaned != sink) {
            execution::invalidate(&self.inner, orphaned, false);
        }
        execution::invalidate(&self.inner, sink, true);
        Ok(connection)
    }

    /// Connects two ports given in either order.
    pub fn connect_ports(&self, a: PortRef, b: PortRef) -> Result<Connection, GraphError> {
        match (a, b) {
            (PortRef::Output(source), PortRef::Input(sink, index))
            | (PortRef::Input(sink, index), PortRef::Output(source)) => {
                self.try_connect(source, sink, index)
            }
            _ => Err(GraphError::DirectionMismatch),
        }
    }

    /// Forms a connection without scheduling anything. Also returns the node
    /// that lost its input because `source`'s output was re-wired.
    pub(crate) fn link(
        &self,
        source: NodeId,
        sink: NodeId,
        sink_input: usize,
    ) -> Result<(Connection, Option<NodeId>), GraphError> {
        let source_node = self.handle(source)?;
        let sink_node = self.handle(sink)?;

        let output = lock(&source_node)
            .output_connector()
            .map(Connector::expected)
            .ok_or(GraphError::NoOutputConnector(source))?;
        let input = {
            let n = lock(&sink_node);
            let inputs = n.input_connectors();
            inputs
                .get(sink_input)
                .map(Connector::expected)
                .ok_or(GraphError::InputOutOfBounds {
                    node: sink,
                    index: sink_input,
                    len: inputs.len(),
                })?
        };
        if output != input {
            return Err(GraphError::TypeMismatch { output, input });
        }

        self.unlink(PortRef::Input(sink, sink_input));
        let orphaned = self.unlink(PortRef::Output(source)).map(|c| c.sink);

        let connection = Connection {
            source,
            sink,
            sink_input,
        };
        if let Some(c) = lock(&source_node).connector_mut(connection.source_port()) {
            c.attach(connection);
        }
        if let Some(c) = lock(&sink_node).connector_mut(connection.sink_port()) {
            c.attach(connection);
        }
        debug!(source, sink, sink_input, "connected");
        Ok((connection, orphaned))
    }

    /// Removes the connection held by `port`, if any, from both of its ends
    /// and recomputes the node that lost the input.
    pub fn detach(&self, port: PortRef) -> Result<Option<Connection>, GraphError> {
        {
            let node = self.handle(port.node())?;
            let n = lock(&node);
            if n.connector(port).is_none() {
                return Err(Self::missing_connector(&n, port));
            }
        }
        let detached = self.unlink(port);
        if let Some(connection) = detached {
            execution::invalidate(&self.inner, connection.sink, false);
        }
        Ok(detached)
    }

    /// Clears the connection held by `port` on both endpoints.
    fn unlink(&self, port: PortRef) -> Option<Connection> {
        let node = self.inner.node(port.node())?;
        let connection = lock(&node).connector(port)?.connection()?;
        for end in [connection.source_port(), connection.sink_port()] {
            if let Some(n) = self.inner.node(end.node()) {
                if let Some(c) = lock(&n).connector_mut(end) {
                    c.release(&connection);
                }
            }
        }
        debug!(?connection, "detached");
        Some(connection)
    }

    fn missing_connector(node: &NodeInstance, port: PortRef) -> GraphError {
        match port {
            PortRef::Output(id) => GraphError::NoOutputConnector(id),
            PortRef::Input(id, index) => GraphError::InputOutOfBounds {
                node: id,
                index,
                len: node.input_connectors().len(),
            },
        }
    }

    /// Recomputes `id` in the background. See the crate docs for the cascade rules.
    pub fn invalidate(&self, id: NodeId, force_traverse: bool) -> Result<(), GraphError> {
        if execution::invalidate(&self.inner, id, force_traverse) {
            Ok(())
        } else {
            Err(GraphError::UnknownNode(id))
        }
    }

    /// Blocks until every scheduled recomputation, including cascades, has finished.
    pub fn wait_idle(&self) {
        self.inner.pool.join();
    }

    fn handle(&self, id: NodeId) -> Result<NodeHandle, GraphError> {
        self.inner.node(id).ok_or(GraphError::UnknownNode(id))
    }

    /// A snapshot of the node's current state.
    pub fn node(&self, id: NodeId) -> Option<NodeInstance> {
        self.inner.node(id).map(|node| lock(&node).clone())
    }

    pub fn node_by_index(&self, index: usize) -> Option<NodeInstance> {
        let node = self
            .inner
            .nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .map(|(_, node)| node.clone())?;
        let snapshot = lock(&node).clone();
        Some(snapshot)
    }

    /// Snapshots of all nodes in insertion order.
    pub fn nodes(&self) -> Vec<NodeInstance> {
        self.handles()
            .into_iter()
            .map(|node| lock(&node).clone())
            .collect()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.inner
            .nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.inner
            .nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .position(|(node_id, _)| *node_id == id)
    }

    pub fn num_nodes(&self) -> usize {
        self.inner
            .nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_nodes() == 0
    }

    /// Every live connection, ordered by source node.
    pub fn connections(&self) -> Vec<Connection> {
        self.handles()
            .into_iter()
            .filter_map(|node| lock(&node).output_connector().and_then(Connector::connection))
            .collect()
    }

    fn handles(&self) -> Vec<NodeHandle> {
        self.inner
            .nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, node)| node.clone())
            .collect()
    }
}
