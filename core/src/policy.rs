use std::fmt::{Display, Formatter};

/// Commercial relationship with a neighbor, governing export policy and
/// data forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NeighborRelation {
    Customer,
    Peer,
    Provider,
}

impl NeighborRelation {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "cust" => Ok(NeighborRelation::Customer),
            "peer" => Ok(NeighborRelation::Peer),
            "prov" => Ok(NeighborRelation::Provider),
            _ => Err(format!("Invalid neighbor relation: {}", s)),
        }
    }
}

impl Display for NeighborRelation {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            NeighborRelation::Customer => write!(f, "cust"),
            NeighborRelation::Peer => write!(f, "peer"),
            NeighborRelation::Provider => write!(f, "prov"),
        }
    }
}

/// Whether traffic (or a route) learned from a neighbor with relation
/// `src` may be handed to a neighbor with relation `dst`.
///
/// Only hops that earn revenue are allowed: one side must be a customer.
/// Peer-to-peer, peer-to-provider, and provider-to-peer transit is
/// forbidden.
pub fn transit_allowed(src: NeighborRelation, dst: NeighborRelation) -> bool {
    src == NeighborRelation::Customer || dst == NeighborRelation::Customer
}
