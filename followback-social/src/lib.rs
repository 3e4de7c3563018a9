//! Social graph clients and the followers/following reconciliation pipeline.
//!
//! The pipeline is linear: fetch both relationship sets ([`graph::FollowGraph`]),
//! [`reconcile::reconcile`] them, then either report the differences or hand
//! one of them to the [`actuate::Actuator`]. Only GitHub is implemented.
pub mod actuate;
pub mod error;
pub mod github;
pub mod graph;
pub mod reconcile;

pub use actuate::{Action, ActuationReport, Actuator, Outcome};
pub use error::{ActuationError, GraphError};
pub use followback_http::StatusCode;
pub use graph::FollowGraph;
pub use reconcile::{DifferenceResult, RelationshipSets, reconcile};
