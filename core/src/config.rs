// Copyright 2025 routesim Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::policy::NeighborRelation;
use std::fmt::{Display, Formatter};
use std::net::Ipv4Addr;

/// Errors raised while turning command-line arguments into a `Config`.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    InvalidAsn(String),
    InvalidNeighborSpec(String),
    InvalidEndpoint(String),
    InvalidRelation(String),
    DuplicateNeighbor(String),
    NoNeighbors,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ConfigError::InvalidAsn(s) => write!(f, "Invalid ASN: {}", s),
            ConfigError::InvalidNeighborSpec(s) => {
                write!(f, "Invalid neighbor spec (want <endpoint>-<relation>): {}", s)
            }
            ConfigError::InvalidEndpoint(s) => write!(f, "Invalid neighbor endpoint: {}", s),
            ConfigError::InvalidRelation(s) => write!(f, "Invalid neighbor relation: {}", s),
            ConfigError::DuplicateNeighbor(s) => write!(f, "Duplicate neighbor: {}", s),
            ConfigError::NoNeighbors => write!(f, "At least one neighbor is required"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// One configured neighbor: the channel endpoint it is reached on and
/// its commercial relation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborConfig {
    pub endpoint: Ipv4Addr,
    pub relation: NeighborRelation,
}

impl NeighborConfig {
    /// Parse a `<endpoint>-<relation>` spec, e.g. `192.168.0.2-cust`.
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let (endpoint, relation) = spec
            .rsplit_once('-')
            .ok_or_else(|| ConfigError::InvalidNeighborSpec(spec.to_string()))?;

        let endpoint = endpoint
            .parse()
            .map_err(|_| ConfigError::InvalidEndpoint(endpoint.to_string()))?;
        let relation = NeighborRelation::from_str(relation)
            .map_err(|_| ConfigError::InvalidRelation(relation.to_string()))?;

        Ok(NeighborConfig { endpoint, relation })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub asn: u32,
    pub neighbors: Vec<NeighborConfig>,
}

impl Config {
    /// Validate and assemble the router configuration.
    pub fn new(asn: u32, neighbor_specs: &[String]) -> Result<Self, ConfigError> {
        if asn == 0 {
            return Err(ConfigError::InvalidAsn(asn.to_string()));
        }
        if neighbor_specs.is_empty() {
            return Err(ConfigError::NoNeighbors);
        }

        let mut neighbors: Vec<NeighborConfig> = Vec::with_capacity(neighbor_specs.len());
        for spec in neighbor_specs {
            let neighbor = NeighborConfig::parse(spec)?;
            if neighbors.iter().any(|n| n.endpoint == neighbor.endpoint) {
                return Err(ConfigError::DuplicateNeighbor(neighbor.endpoint.to_string()));
            }
            neighbors.push(neighbor);
        }

        Ok(Config { asn, neighbors })
    }
}
