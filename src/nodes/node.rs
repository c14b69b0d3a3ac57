use std::{
    sync::{
        mpsc::{channel, Receiver, RecvTimeoutError, Sender},
        Arc,
    },
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    exec::{
        execution_controller::{ComputeController, Ticket},
        execution_state::ComputeState,
    },
    flow::flow_type::Value,
    nodes::{
        connection::{Connector, PortRef},
        node_description::{ComputeError, NodeType},
        registry::NodeTypeId,
    },
};

pub type NodeId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Receives the ids of nodes whose cascade has ended, i.e. points at which the
/// view should redraw.
pub struct ChangeObserver {
    pub notifier: Sender<NodeId>,
    observer: Receiver<NodeId>,
}

impl ChangeObserver {
    pub fn new() -> Self {
        let (notifier, observer) = channel();
        Self { notifier, observer }
    }

    /// Blocks until the next change arrives.
    pub fn wait_for_changes(&self) -> Option<NodeId> {
        self.observer.recv().ok()
    }

    pub fn wait_for_changes_timeout(&self, timeout: Duration) -> Option<NodeId> {
        match self.observer.recv_timeout(timeout) {
            Ok(id) => Some(id),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Everything received so far, without blocking.
    pub fn drain(&self) -> Vec<NodeId> {
        self.observer.try_iter().collect()
    }
}

impl Default for ChangeObserver {
    fn default() -> Self {
        Self::new()
    }
}

/// One placed node: its schema, editable content, connectors and the result
/// of its last computation.
#[derive(Debug, Clone)]
pub struct NodeInstance {
    id: NodeId,
    node_type: Arc<NodeType>,
    position: Position,
    content: Vec<Value>,
    inputs: Vec<Connector>,
    output_connector: Option<Connector>,
    output: Option<Value>,
    is_error: bool,
    controller: ComputeController,
}

impl NodeInstance {
    pub fn new(id: NodeId, node_type: Arc<NodeType>, position: Position) -> Self {
        Self {
            id,
            position,
            content: node_type.content.clone(),
            inputs: node_type
                .inputs
                .iter()
                .map(|slot| Connector::input(slot.kind))
                .collect(),
            output_connector: node_type.output.map(Connector::output),
            output: None,
            is_error: false,
            controller: ComputeController::new(),
            node_type,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node_type(&self) -> &Arc<NodeType> {
        &self.node_type
    }

    pub fn type_id(&self) -> NodeTypeId {
        self.node_type.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn content(&self) -> &[Value] {
        &self.content
    }

    pub fn input_connectors(&self) -> &[Connector] {
        &self.inputs
    }

    pub fn output_connector(&self) -> Option<&Connector> {
        self.output_connector.as_ref()
    }

    /// The last successfully computed value. Always `None` while in error.
    pub fn output(&self) -> Option<&Value> {
        self.output.as_ref()
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    pub fn state(&self) -> ComputeState {
        self.controller.state()
    }

    /// Number of recomputations requested for this node so far.
    pub fn generation(&self) -> Ticket {
        self.controller.generation()
    }

    pub fn connector(&self, port: PortRef) -> Option<&Connector> {
        match port {
            PortRef::Output(id) if id == self.id => self.output_connector.as_ref(),
            PortRef::Input(id, index) if id == self.id => self.inputs.get(index),
            _ => None,
        }
    }

    pub(crate) fn connector_mut(&mut self, port: PortRef) -> Option<&mut Connector> {
        match port {
            PortRef::Output(id) if id == self.id => self.output_connector.as_mut(),
            PortRef::Input(id, index) if id == self.id => self.inputs.get_mut(index),
            _ => None,
        }
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Replaces a content slot. Returns whether the value changed.
    pub(crate) fn set_slot(&mut self, slot: usize, value: Value) -> bool {
        match self.content.get_mut(slot) {
            Some(current) if *current != value => {
                *current = value;
                true
            }
            _ => false,
        }
    }

    /// Producers feeding this node, in input order. Unconnected inputs are skipped.
    pub(crate) fn input_sources(&self) -> Vec<NodeId> {
        self.inputs
            .iter()
            .filter_map(|c| c.connection().map(|conn| conn.source))
            .collect()
    }

    pub(crate) fn output_sink(&self) -> Option<NodeId> {
        self.output_connector
            .as_ref()
            .and_then(Connector::connection)
            .map(|conn| conn.sink)
    }

    pub(crate) fn controller_mut(&mut self) -> &mut ComputeController {
        &mut self.controller
    }

    pub(crate) fn is_current(&self, ticket: Ticket) -> bool {
        self.controller.is_current(ticket)
    }

    /// Stores the result of the computation identified by `ticket`.
    ///
    /// Returns `None` without touching any state if the ticket is stale,
    /// otherwise whether the output or the error flag changed.
    pub(crate) fn commit(
        &mut self,
        ticket: Ticket,
        result: Result<Value, ComputeError>,
    ) -> Option<bool> {
        if !self.controller.finish(ticket) {
            return None;
        }
        let (next, is_error) = match result {
            Ok(value) => (Some(value), false),
            Err(_) => (None, true),
        };
        let changed = next != self.output || is_error != self.is_error;
        self.output = next;
        self.is_error = is_error;
        Some(changed)
    }
}
