#[cfg(test)]
mod propagation {
    use std::{sync::Arc, thread, time::Duration};

    use anyhow::Result;
    use nodeflow::{
        registry::{DOUBLE, INT},
        ChangeObserver, ComputeError, Flow, NodeId, NodeType, NodeTypeRegistry, Position, Value,
        ValueKind,
    };

    const SLOW: i32 = 1;

    /// Echoes its content, taking a while for the value `SLOW` and panicking
    /// on negative values.
    fn echo(content: &[Value], _inputs: &[Value]) -> Result<Value, ComputeError> {
        let value = content[0].as_int().unwrap_or_default();
        if value == SLOW {
            thread::sleep(Duration::from_millis(300));
        }
        if value < 0 {
            panic!("negative input {}", value);
        }
        Ok(Value::Int(value))
    }

    fn test_registry() -> Arc<NodeTypeRegistry> {
        let echo = NodeType::new(0, "Echo", echo)
            .with_content(0)
            .with_output(ValueKind::Int);
        Arc::new(NodeTypeRegistry::new(vec![echo]).unwrap())
    }

    fn output(flow: &Flow, id: NodeId) -> Option<Value> {
        flow.node(id).and_then(|n| n.output().cloned())
    }

    fn generation(flow: &Flow, id: NodeId) -> u64 {
        flow.node(id).map(|n| n.generation()).unwrap_or_default()
    }

    /// int -> double -> double
    fn chain(flow: &Flow) -> Result<[NodeId; 3]> {
        let int = flow.add_node(INT, Position::default())?;
        let first = flow.add_node(DOUBLE, Position::default())?;
        let second = flow.add_node(DOUBLE, Position::default())?;
        flow.set_content(int, 0, "3")?;
        flow.try_connect(int, first, 0)?;
        flow.try_connect(first, second, 0)?;
        flow.wait_idle();
        Ok([int, first, second])
    }

    #[test]
    fn should_propagate_through_chain() -> Result<()> {
        let flow = Flow::builder(NodeTypeRegistry::builtin()).workers(3).build();
        let [int, first, second] = chain(&flow)?;
        assert_eq!(output(&flow, second), Some(Value::Int(12)));

        flow.set_content(int, 0, "-2")?;
        flow.wait_idle();
        let consumer = flow.node(first).unwrap();
        let expected = (consumer.node_type().compute)(consumer.content(), &[Value::Int(-2)])?;
        assert_eq!(consumer.output(), Some(&expected));
        assert_eq!(output(&flow, second), Some(Value::Int(-8)));
        Ok(())
    }

    #[test]
    fn should_stop_cascade_when_output_unchanged() -> Result<()> {
        let flow = Flow::builder(NodeTypeRegistry::builtin()).workers(2).build();
        let [int, first, second] = chain(&flow)?;
        let before = [first, second].map(|id| generation(&flow, id));

        assert!(!flow.set_content(int, 0, "3")?);
        flow.invalidate(int, false)?;
        flow.wait_idle();
        assert_eq!([first, second].map(|id| generation(&flow, id)), before);

        // Forcing only reaches the direct consumer, whose output is unchanged.
        flow.invalidate(int, true)?;
        flow.wait_idle();
        assert_eq!(generation(&flow, first), before[0] + 1);
        assert_eq!(generation(&flow, second), before[1]);
        Ok(())
    }

    fn settled_state(flow: &Flow, ids: &[NodeId]) -> Vec<(Option<Value>, bool)> {
        ids.iter()
            .map(|id| {
                let node = flow.node(*id).unwrap();
                (node.output().cloned(), node.is_error())
            })
            .collect()
    }

    #[test]
    fn should_settle_repeated_invalidate_like_a_single_one() -> Result<()> {
        let once = Flow::builder(NodeTypeRegistry::builtin()).workers(3).build();
        let [_, first, second] = chain(&once)?;
        once.invalidate(first, false)?;
        once.wait_idle();

        let twice = Flow::builder(NodeTypeRegistry::builtin()).workers(3).build();
        let [_, first_again, second_again] = chain(&twice)?;
        twice.invalidate(first_again, false)?;
        twice.invalidate(first_again, false)?;
        twice.wait_idle();

        assert_eq!(
            settled_state(&once, &[first, second]),
            settled_state(&twice, &[first_again, second_again])
        );
        assert_eq!(
            settled_state(&twice, &[first_again, second_again]),
            [(Some(Value::Int(6)), false), (Some(Value::Int(12)), false)]
        );
        Ok(())
    }

    #[test]
    fn should_notify_observer_where_cascade_ends() -> Result<()> {
        let observer = ChangeObserver::new();
        let flow = Flow::builder(NodeTypeRegistry::builtin())
            .workers(2)
            .observer(&observer)
            .build();
        let [int, _, second] = chain(&flow)?;
        observer.drain();

        flow.set_content(int, 0, "4")?;
        assert_eq!(
            observer.wait_for_changes_timeout(Duration::from_secs(5)),
            Some(second)
        );
        flow.wait_idle();
        Ok(())
    }

    #[test]
    fn should_discard_superseded_result() -> Result<()> {
        let flow = Flow::builder(test_registry()).workers(4).build();
        let node = flow.add_node(0, Position::default())?;
        flow.wait_idle();

        flow.set_content(node, 0, &SLOW.to_string())?;
        thread::sleep(Duration::from_millis(50));
        flow.set_content(node, 0, "2")?;
        flow.wait_idle();

        assert_eq!(output(&flow, node), Some(Value::Int(2)));
        assert_eq!(generation(&flow, node), 3);
        Ok(())
    }

    #[test]
    fn should_cancel_pending_work_of_removed_node() -> Result<()> {
        let flow = Flow::builder(test_registry()).workers(2).build();
        let node = flow.add_node(0, Position::default())?;
        flow.wait_idle();

        flow.set_content(node, 0, &SLOW.to_string())?;
        flow.remove_node(node)?;
        flow.wait_idle();
        assert!(flow.is_empty());
        assert!(flow.node(node).is_none());
        Ok(())
    }

    #[test]
    fn should_flag_panicking_compute_and_recover() -> Result<()> {
        let flow = Flow::builder(test_registry()).workers(1).build();
        let node = flow.add_node(0, Position::default())?;
        flow.set_content(node, 0, "5")?;
        flow.wait_idle();
        assert_eq!(output(&flow, node), Some(Value::Int(5)));

        flow.set_content(node, 0, "-1")?;
        flow.wait_idle();
        let failed = flow.node(node).unwrap();
        assert!(failed.is_error());
        assert_eq!(failed.output(), None);

        flow.set_content(node, 0, "6")?;
        flow.wait_idle();
        let recovered = flow.node(node).unwrap();
        assert!(!recovered.is_error());
        assert_eq!(recovered.output(), Some(&Value::Int(6)));
        Ok(())
    }

    #[test]
    fn should_settle_many_concurrent_edits() -> Result<()> {
        let flow = Flow::builder(NodeTypeRegistry::builtin()).workers(4).build();
        let [int, _, second] = chain(&flow)?;
        for value in 0..50 {
            flow.set_content(int, 0, &value.to_string())?;
        }
        flow.wait_idle();
        assert_eq!(output(&flow, second), Some(Value::Int(49 * 4)));
        Ok(())
    }
}
