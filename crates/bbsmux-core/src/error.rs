// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors surfaced by the pure node/state-machine layer.
///
/// None of these are fatal to the supervisor process; callers decide how
/// to react (log and continue, refuse an operator command, etc).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("node index {0} out of range")]
    NodeIndexOutOfRange(usize),

    #[error("invalid transition: node {node} cannot go from {from:?} to {to:?}")]
    InvalidTransition { node: usize, from: crate::node::NodeStatus, to: crate::node::NodeStatus },

    #[error("malformed terminal caps record: {0}")]
    MalformedCaps(String),
}
