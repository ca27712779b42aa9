//! Execution context supplied by the load-test runner.
//!
//! The runner creates this identity context once per run; it stays stable
//! for the run's duration and the sink only ever reads it.
use strum::Display;

/// The role of the current node in the test topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum NodeType {
    /// A standalone node running the whole test.
    SingleNode,
    /// The coordinator of a distributed test cluster.
    Coordinator,
    /// An agent node driven by a coordinator.
    Agent,
}

/// The phase the runner is currently executing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    /// No operation in progress.
    None,
    /// Scenario init hooks are running.
    Init,
    /// Warm-up iterations are running.
    WarmUp,
    /// The main load phase is running.
    Bombing,
    /// The run is stopping.
    Stop,
    /// The run has completed.
    Complete,
}

/// Identity of the node executing the test.
#[derive(Clone, Debug)]
pub struct NodeInfo {
    /// Role of this node.
    pub node_type: NodeType,
    /// Phase currently in progress.
    pub current_operation: Operation,
    /// CPU core count of this node.
    pub cores_count: u32,
}

/// Identity of the test being executed.
#[derive(Clone, Debug)]
pub struct TestInfo {
    /// Reporting session id, recorded as a field on every point.
    pub session_id: String,
    /// Test suite name.
    pub test_suite: String,
    /// Test name.
    pub test_name: String,
    /// Cluster id for distributed runs.
    pub cluster_id: String,
}

/// The full execution context handed to the sink at init.
#[derive(Clone, Debug)]
pub struct SinkContext {
    /// Node identity.
    pub node_info: NodeInfo,
    /// Test identity.
    pub test_info: TestInfo,
}
