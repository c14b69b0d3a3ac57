//! A typed node dataflow engine.
//!
//! A [`Flow`] holds node instances created from a [`NodeTypeRegistry`]. Nodes
//! are wired output-to-input by [`Connection`]s. Every edit schedules a
//! background recomputation of the affected node on the flow's worker pool; a
//! newer recomputation of the same node supersedes older ones, whose results
//! are discarded. A node whose output changed passes the recomputation on to
//! the node its output feeds. When a chain of recomputations ends, the id of
//! the last node is sent to the flow's [`ChangeObserver`].

pub mod config;

mod nodes {
    pub mod add;
    pub mod basic;
    pub mod connection;
    pub mod debug;
    pub mod filter;
    pub mod node;
    pub mod node_description;
    pub mod registry;
}

mod flow {
    pub mod codec;
    pub mod drag;
    #[allow(clippy::module_inception)]
    pub mod flow;
    pub mod flow_type;
}

mod exec {
    pub mod execution;
    pub mod execution_controller;
    pub mod execution_state;
}

mod sched {
    pub mod executor;
}

pub use self::nodes::add;
pub use self::nodes::basic;
pub use self::nodes::connection;
pub use self::nodes::debug;
pub use self::nodes::filter;
pub use self::nodes::node;
pub use self::nodes::node_description;
pub use self::nodes::registry;

pub use self::flow::codec;
pub use self::flow::drag;
pub use self::flow::flow_type;

pub use self::exec::execution_controller;
pub use self::exec::execution_state;
pub use self::sched::executor;

pub use self::config::{ConfigError, EngineConfig};
pub use self::flow::flow::{Flow, FlowBuilder, GraphError};
pub use self::flow::flow_type::{Image, Value, ValueKind};
pub use self::nodes::connection::{Connection, Connector, Point, PortRef};
pub use self::nodes::node::{ChangeObserver, NodeId, NodeInstance, Position};
pub use self::nodes::node_description::{ComputeError, NodeType, UiHint};
pub use self::nodes::registry::{NodeTypeId, NodeTypeRegistry, RegistryError};
