//! `NodeRef` — a non-owning descriptor of a remote peer.
//!
//! Neighbour tables and join messages carry this instead of a full `Node`:
//! identifiers, network address, and the peer's last-known CPE, but never
//! its data store or neighbourhood (§9 design note — cyclic `Node` graphs
//! become value-type references).

use std::fmt;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::cpe::Cpe;
use crate::identifiers::{NameID, NumericID, PartitionID};

/// A lightweight, serializable handle to a remote peer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRef {
    pub name_id: NameID,
    pub numeric_id: NumericID,
    pub partition_id: PartitionID,
    pub address: SocketAddr,
    pub cpe: Cpe,
}

impl NodeRef {
    #[must_use]
    pub fn new(
        name_id: NameID,
        numeric_id: NumericID,
        partition_id: PartitionID,
        address: SocketAddr,
        cpe: Cpe,
    ) -> Self {
        Self {
            name_id,
            numeric_id,
            partition_id,
            address,
            cpe,
        }
    }

    /// Whether this descriptor refers to a peer that has not yet completed
    /// its skip-tree join (an empty CPE and `k == 0`); by-CPE routing must
    /// solicit a routing-table complement rather than forward to it (§4.6).
    #[must_use]
    pub fn is_st_incomplete(&self) -> bool {
        self.cpe.k() == 0
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name_id, self.address)
    }
}

impl Eq for NodeRef {}
