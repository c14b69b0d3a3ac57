use serde::{Deserialize, Serialize};

use crate::{flow::flow_type::ValueKind, nodes::node::NodeId};

/// A point in display space. Maintained by the view for hit-testing only.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Addresses one connector of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortRef {
    Output(NodeId),
    Input(NodeId, usize),
}

impl PortRef {
    pub fn node(&self) -> NodeId {
        match *self {
            PortRef::Output(node) | PortRef::Input(node, _) => node,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, PortRef::Input(..))
    }
}

/// A realized edge from a node's output connector to one input connector of
/// another node.
///
/// Both endpoints hold a copy of the same `Connection`. It refers to nodes by
/// id only; the owning flow resolves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub source: NodeId,
    pub sink: NodeId,
    pub sink_input: usize,
}

impl Connection {
    pub fn source_port(&self) -> PortRef {
        PortRef::Output(self.source)
    }

    pub fn sink_port(&self) -> PortRef {
        PortRef::Input(self.sink, self.sink_input)
    }

    /// Whether `port` is one of the two endpoints of this connection.
    pub fn touches(&self, port: PortRef) -> bool {
        port == self.source_port() || port == self.sink_port()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    is_input: bool,
    expected: ValueKind,
    connection: Option<Connection>,
    pub position: Point,
}

impl Connector {
    pub fn input(expected: ValueKind) -> Self {
        Self {
            is_input: true,
            expected,
            connection: None,
            position: Point::default(),
        }
    }

    pub fn output(expected: ValueKind) -> Self {
        Self {
            is_input: false,
            ..Self::input(expected)
        }
    }

    pub fn is_input(&self) -> bool {
        self.is_input
    }

    pub fn expected(&self) -> ValueKind {
        self.expected
    }

    pub fn connection(&self) -> Option<Connection> {
        self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub(crate) fn attach(&mut self, connection: Connection) {
        self.connection = Some(connection);
    }

    /// Clears the connection if it is `connection`. Returns whether it was.
    pub(crate) fn release(&mut self, connection: &Connection) -> bool {
        if self.connection.as_ref() == Some(connection) {
            self.connection = None;
            true
        } else {
            false
        }
    }
}
