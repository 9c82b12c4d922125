//! Office-to-routing-key resolution against the mapping service

// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::client;
use crate::config::Config;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// `{ officeCode, nodeCode }` row of the office-node mapping API
#[derive(Clone, Debug, Deserialize)]
pub struct OfficeNodeMapping {
    #[serde(rename = "officeCode")]
    pub office_code: String,
    #[serde(rename = "nodeCode")]
    pub node_code: String,
}

#[derive(Debug, Deserialize)]
struct OfficeNodeDocument {
    #[serde(rename = "officeNodeMappingList")]
    list: Vec<OfficeNodeMapping>,
}

/// `{ nodeCode, serviceCode, glbId }` row of the node-group mapping API
#[derive(Clone, Debug, Deserialize)]
pub struct NodeGroupMapping {
    #[serde(rename = "nodeCode")]
    pub node_code: String,
    #[serde(rename = "serviceCode")]
    pub service_code: String,
    #[serde(rename = "glbId")]
    pub group_id: String,
}

#[derive(Debug, Deserialize)]
struct NodeGroupDocument {
    #[serde(rename = "nodeGLBIdMappingList")]
    list: Vec<NodeGroupMapping>,
}

/// One `(serviceCode, glbId)` pair an office expands into
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServiceGroup {
    pub service_code: String,
    pub group_id: String,
}

/// Office code to the routing-key expansions it fans out to
pub type OfficeGroups = HashMap<String, Vec<ServiceGroup>>;

/// Fetch both mapping tables and join them
pub fn fetch_office_groups(cfg: &Config) -> Result<OfficeGroups, client::Error> {
    let offices: OfficeNodeDocument = client::fetch_json(&cfg.office_node_api_url)?;
    log::info!(
        "success to get office-code-node-code-mapping, row[{}]",
        offices.list.len()
    );
    let nodes: NodeGroupDocument = client::fetch_json(&cfg.node_group_api_url)?;
    log::info!(
        "success to get node-code-glb-id-mapping, row[{}]",
        nodes.list.len()
    );
    Ok(join(offices.list, nodes.list))
}

/// Relational join of the two mapping tables.
///
/// An office expands into every `(serviceCode, glbId)` pair its node
/// carries. A node with no group mapping contributes nothing and is
/// warned about once.
#[must_use]
pub fn join(offices: Vec<OfficeNodeMapping>, node_groups: Vec<NodeGroupMapping>) -> OfficeGroups {
    let mut by_node: HashMap<String, Vec<ServiceGroup>> = HashMap::new();
    for m in node_groups {
        by_node.entry(m.node_code).or_default().push(ServiceGroup {
            service_code: m.service_code,
            group_id: m.group_id,
        });
    }

    let mut mapping = OfficeGroups::new();
    let mut missing_nodes = HashSet::new();
    for office in offices {
        match by_node.get(&office.node_code) {
            Some(groups) => mapping
                .entry(office.office_code)
                .or_default()
                .extend(groups.iter().cloned()),
            None => {
                missing_nodes.insert(office.node_code);
            }
        }
    }

    for node in &missing_nodes {
        log::warn!("failed to find glbId, nodeCode[{node}]");
    }
    mapping
}
