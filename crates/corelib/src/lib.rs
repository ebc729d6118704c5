//! Chord distributed hash table: identifier space, finger tables, the
//! iterative lookup engine, the stabilize/notify/fix_fingers/
//! check_predecessor maintenance protocol, document placement, and the
//! in-process ring facade used to assemble and operate a simulated ring.

pub mod actor;
pub mod cluster;
pub mod config;
pub mod document;
pub mod error;
pub mod finger;
pub mod ident;
pub mod lookup;
pub mod maintenance;
pub mod node;
pub mod rpc;
pub mod ring;
pub mod scheduler;
pub mod successor;

pub use actor::TickKind;
pub use cluster::NodeSnapshot;
pub use config::RingConfig;
pub use document::{Document, DocumentQueryResult};
pub use error::{Error, Result};
pub use ident::Key;
pub use node::{Endpoint, NodeHandle, NodeId};
pub use ring::{Ring, RingBuilder};
