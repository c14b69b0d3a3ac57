use crate::{
    flow::flow::{Flow, GraphError},
    nodes::connection::{Connection, Point, PortRef},
};

/// Squared radius around the cursor within which a connector accepts a drop.
pub const HIT_RADIUS_SQUARED: f32 = 5000.0;

/// A connection being dragged out of a connector by the view.
///
/// Starting a drag detaches whatever the origin connector held. Dropping onto
/// a compatible connector of another node connects the two; dropping anywhere
/// else leaves both unconnected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingConnection {
    origin: PortRef,
    cursor: Point,
}

impl PendingConnection {
    pub fn start(flow: &Flow, origin: PortRef) -> Result<Self, GraphError> {
        flow.detach(origin)?;
        let cursor = flow
            .node(origin.node())
            .and_then(|n| n.connector(origin).map(|c| c.position))
            .unwrap_or_default();
        Ok(Self { origin, cursor })
    }

    pub fn origin(&self) -> PortRef {
        self.origin
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }

    pub fn drag_to(&mut self, cursor: Point) {
        self.cursor = cursor;
    }

    /// The connector a drop at the current cursor would connect to.
    ///
    /// Only connectors of the opposite direction and the same kind on other
    /// nodes qualify. Ties go to the nearest, then to the earlier node, then to
    /// the lower input index.
    pub fn candidate(&self, flow: &Flow) -> Option<PortRef> {
        let origin_node = flow.node(self.origin.node())?;
        let kind = origin_node.connector(self.origin)?.expected();

        let mut best: Option<(f32, PortRef)> = None;
        for node in flow.nodes() {
            if node.id() == origin_node.id() {
                continue;
            }
            let ports: Vec<PortRef> = if self.origin.is_input() {
                node.output_connector()
                    .map(|_| PortRef::Output(node.id()))
                    .into_iter()
                    .collect()
            } else {
                (0..node.input_connectors().len())
                    .map(|index| PortRef::Input(node.id(), index))
                    .collect()
            };
            for port in ports {
                let Some(connector) = node.connector(port) else {
                    continue;
                };
                if connector.expected() != kind {
                    continue;
                }
                let distance = connector.position.distance_squared(self.cursor);
                if distance >= HIT_RADIUS_SQUARED {
                    continue;
                }
                // Strictly nearer only: earlier nodes and inputs win ties.
                if best.map_or(true, |(d, _)| distance < d) {
                    best = Some((distance, port));
                }
            }
        }
        best.map(|(_, port)| port)
    }

    /// Drops the connection at the current cursor.
    pub fn finish(self, flow: &Flow) -> Result<Option<Connection>, GraphError> {
        match self.candidate(flow) {
            Some(target) => flow.connect_ports(self.origin, target).map(Some),
            None => Ok(None),
        }
    }
}
