#[cfg(test)]
mod drag {
    use nodeflow::{
        drag::{PendingConnection, HIT_RADIUS_SQUARED},
        registry::{ADD, DOUBLE, INT, STRING},
        Flow, GraphError, NodeTypeRegistry, Point, PortRef, Position,
    };

    fn flow() -> Flow {
        Flow::builder(NodeTypeRegistry::builtin()).workers(1).build()
    }

    #[test]
    fn should_pick_nearest_then_earliest_node() -> Result<(), GraphError> {
        let flow = flow();
        let int = flow.add_node(INT, Position::default())?;
        let first = flow.add_node(DOUBLE, Position::default())?;
        let second = flow.add_node(DOUBLE, Position::default())?;
        flow.set_connector_position(PortRef::Input(first, 0), Point::new(100.0, 100.0))?;
        flow.set_connector_position(PortRef::Input(second, 0), Point::new(110.0, 100.0))?;

        let mut pending = PendingConnection::start(&flow, PortRef::Output(int))?;
        pending.drag_to(Point::new(108.0, 100.0));
        assert_eq!(pending.candidate(&flow), Some(PortRef::Input(second, 0)));

        pending.drag_to(Point::new(105.0, 100.0));
        assert_eq!(pending.candidate(&flow), Some(PortRef::Input(first, 0)));

        let connection = pending.finish(&flow)?.unwrap();
        assert_eq!((connection.source, connection.sink), (int, first));
        flow.wait_idle();
        Ok(())
    }

    #[test]
    fn should_prefer_lower_input_index_on_tie() -> Result<(), GraphError> {
        let flow = flow();
        let int = flow.add_node(INT, Position::default())?;
        let add = flow.add_node(ADD, Position::default())?;
        flow.set_connector_position(PortRef::Input(add, 0), Point::new(0.0, 10.0))?;
        flow.set_connector_position(PortRef::Input(add, 1), Point::new(0.0, -10.0))?;

        let pending = PendingConnection::start(&flow, PortRef::Output(int))?;
        assert_eq!(pending.candidate(&flow), Some(PortRef::Input(add, 0)));
        flow.wait_idle();
        Ok(())
    }

    #[test]
    fn should_drop_outside_hit_radius() -> Result<(), GraphError> {
        let flow = flow();
        let int = flow.add_node(INT, Position::default())?;
        let double = flow.add_node(DOUBLE, Position::default())?;
        let edge = HIT_RADIUS_SQUARED.sqrt() + 0.5;
        flow.set_connector_position(PortRef::Input(double, 0), Point::new(edge, 0.0))?;

        let mut pending = PendingConnection::start(&flow, PortRef::Output(int))?;
        assert_eq!(pending.candidate(&flow), None);
        pending.drag_to(Point::new(1.0, 0.0));
        assert_eq!(pending.candidate(&flow), Some(PortRef::Input(double, 0)));
        pending.drag_to(Point::new(500.0, 500.0));
        assert_eq!(pending.finish(&flow)?, None);
        assert!(flow.connections().is_empty());
        flow.wait_idle();
        Ok(())
    }

    #[test]
    fn should_only_offer_compatible_connectors_of_other_nodes() -> Result<(), GraphError> {
        let flow = flow();
        let text = flow.add_node(STRING, Position::default())?;
        let double = flow.add_node(DOUBLE, Position::default())?;

        let pending = PendingConnection::start(&flow, PortRef::Output(text))?;
        assert_eq!(pending.candidate(&flow), None);

        // A node's own input never qualifies, even at the same spot.
        let own = PendingConnection::start(&flow, PortRef::Output(double))?;
        assert_eq!(own.candidate(&flow), None);
        flow.wait_idle();
        Ok(())
    }

    #[test]
    fn should_detach_when_dragging_from_connected_input() -> Result<(), GraphError> {
        let flow = flow();
        let int = flow.add_node(INT, Position::default())?;
        let double = flow.add_node(DOUBLE, Position::default())?;
        flow.set_connector_position(PortRef::Output(int), Point::new(50.0, 0.0))?;
        flow.set_connector_position(PortRef::Input(double, 0), Point::new(200.0, 0.0))?;
        flow.try_connect(int, double, 0)?;

        let mut pending = PendingConnection::start(&flow, PortRef::Input(double, 0))?;
        assert!(flow.connections().is_empty());
        assert_eq!(pending.cursor(), Point::new(200.0, 0.0));

        pending.drag_to(Point::new(55.0, 0.0));
        assert_eq!(pending.candidate(&flow), Some(PortRef::Output(int)));
        let connection = pending.finish(&flow)?;
        assert_eq!(connection.map(|c| c.sink), Some(double));
        flow.wait_idle();
        Ok(())
    }
}
