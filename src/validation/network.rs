//! Whole network configuration checks.
//!
//! Runs the field validators over every [`Network`] entry and the
//! [`NetworkingParameters`], and looks for networks sharing address space.

use super::address::{
    ip_in_range, validate_cidr, validate_gateway, validate_ip, validate_vlan, vlan_id,
};
use super::error::{field_error, FieldErrors, IpRangeError, RangeWarnings, ValidationError};
use super::ranges::{find_overlapping_ranges, validate_ip_ranges};
use crate::config;
use crate::models::{parse_ipv4, Cidr, Network, NetworkingParameters, Notation};
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;

/// Name of the network floating ranges are checked against.
pub const PUBLIC_NETWORK: &str = "public";

/// What the other networks already claim.
#[derive(Debug, Clone, Default)]
pub struct NetworkContext {
    pub forbidden_vlans: Vec<u32>,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkErrors {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: FieldErrors,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ip_ranges: Vec<IpRangeError>,
}

impl NetworkErrors {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.ip_ranges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len() + self.ip_ranges.len()
    }
}

/// Validate one network entry.
///
/// Networks without a notation are not addressed by the console, so only
/// their VLAN is checked. Ranges and gateway are checked against the CIDR only
/// once the CIDR itself is valid.
pub fn validate_network(network: &Network, context: &NetworkContext) -> NetworkErrors {
    let mut errors = NetworkErrors::default();
    let meta = &network.meta;

    if let Some(notation) = meta.notation {
        let cidr = network.cidr.as_deref().unwrap_or_default();
        let cidr_errors = validate_cidr(cidr, "cidr");
        let cidr_ok = cidr_errors.is_empty();
        errors.fields.extend(cidr_errors);

        if notation == Notation::IpRanges && cidr_ok {
            errors.ip_ranges = validate_ip_ranges(
                &network.ip_ranges,
                Some(cidr),
                &[],
                &RangeWarnings::default(),
            );
            for (first, second) in find_overlapping_ranges(&network.ip_ranges) {
                if errors.ip_ranges.iter().any(|e| e.index == second) {
                    continue;
                }
                let other = &network.ip_ranges[first];
                errors.ip_ranges.push(IpRangeError::both(
                    second,
                    ValidationError::IpRangesIntersection {
                        start: other.start().to_string(),
                        end: other.end().to_string(),
                    },
                ));
            }
            errors.ip_ranges.sort_by_key(|e| e.index);
        }

        if meta.use_gateway {
            let gateway = network.gateway.as_deref().unwrap_or_default();
            let within = if cidr_ok { Some(cidr) } else { None };
            match validate_gateway(gateway, within, "gateway") {
                Some(gateway_errors) => errors.fields.extend(gateway_errors),
                None => {
                    let in_range = parse_ipv4(gateway).is_some_and(|ip| {
                        notation == Notation::IpRanges
                            && network.ip_ranges.iter().any(|r| ip_in_range(ip, r))
                    });
                    if in_range {
                        errors
                            .fields
                            .insert("gateway".to_string(), ValidationError::GatewayInIpRange);
                    }
                }
            }
        }
    }

    if meta.configurable {
        errors.fields.extend(validate_vlan(
            &network.vlan_start,
            &context.forbidden_vlans,
            "vlan_start",
            meta.vlan_tagging,
        ));
    }
    errors
}

/// Two networks whose CIDR blocks share addresses.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NetworkIntersection {
    pub first: String,
    pub first_cidr: Cidr,
    pub second: String,
    pub second_cidr: Cidr,
}

/// Every pair of addressed networks with overlapping blocks, in list order.
///
/// Networks with a missing or unparseable CIDR are left out.
pub fn check_networks_intersection(networks: &[Network]) -> Vec<NetworkIntersection> {
    let blocks: Vec<(&Network, Cidr)> = networks
        .iter()
        .filter(|n| n.meta.notation.is_some())
        .filter_map(|n| {
            let cidr = n.cidr.as_deref()?.parse::<Cidr>().ok()?;
            Some((n, cidr))
        })
        .collect();
    blocks
        .iter()
        .tuple_combinations()
        .filter(|((_, a), (_, b))| a.overlaps(b))
        .map(|((first, first_cidr), (second, second_cidr))| NetworkIntersection {
            first: first.name.clone(),
            first_cidr: *first_cidr,
            second: second.name.clone(),
            second_cidr: *second_cidr,
        })
        .collect()
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkingParametersErrors {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: FieldErrors,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub floating_ranges: Vec<IpRangeError>,
}

impl NetworkingParametersErrors {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.floating_ranges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len() + self.floating_ranges.len()
    }
}

/// Validate the cluster wide parameters.
///
/// Floating ranges must sit in the public CIDR and stay clear of the public
/// network's own ranges. Name servers are keyed `dns_nameservers.<index>`.
pub fn validate_networking_parameters(
    parameters: &NetworkingParameters,
    public: Option<&Network>,
) -> NetworkingParametersErrors {
    let mut errors = NetworkingParametersErrors::default();

    if !parameters.floating_ranges.is_empty() {
        let public_cidr = public
            .and_then(|n| n.cidr.as_deref())
            .filter(|c| validate_cidr(c, "cidr").is_empty());
        let public_ranges = public.map(|n| n.ip_ranges.as_slice()).unwrap_or_default();
        let warnings = RangeWarnings {
            ip_ranges_intersection: Some(
                "Floating IP range intersects with the public IP range".to_string(),
            ),
            ip_range_is_not_in_cidr: Some(
                "Floating IP range is not in the public network CIDR".to_string(),
            ),
            ..Default::default()
        };
        errors.floating_ranges = validate_ip_ranges(
            &parameters.floating_ranges,
            public_cidr,
            public_ranges,
            &warnings,
        );
    }

    for (index, nameserver) in parameters.dns_nameservers.iter().enumerate() {
        if !validate_ip(nameserver) {
            errors
                .fields
                .insert(format!("dns_nameservers.{index}"), ValidationError::InvalidIp);
        }
    }

    let mut internal_cidr_ok = false;
    if let Some(cidr) = parameters.internal_cidr.as_deref() {
        let cidr_errors = validate_cidr(cidr, "internal_cidr");
        internal_cidr_ok = cidr_errors.is_empty();
        errors.fields.extend(cidr_errors);
    }
    if let Some(gateway) = parameters.internal_gateway.as_deref() {
        let within = parameters
            .internal_cidr
            .as_deref()
            .filter(|_| internal_cidr_ok);
        if let Some(gateway_errors) = validate_gateway(gateway, within, "internal_gateway") {
            errors.fields.extend(gateway_errors);
        }
    }

    if let Some([start, end]) = parameters.vlan_range {
        errors.fields.extend(validate_vlan(
            &serde_json::Value::from(start),
            &[],
            "vlan_range.start",
            true,
        ));
        errors.fields.extend(validate_vlan(
            &serde_json::Value::from(end),
            &[],
            "vlan_range.end",
            true,
        ));
        if start > end {
            errors.fields.extend(field_error("vlan_range", ValidationError::InvalidVlanRange));
        }
    }
    errors
}

/// Everything wrong with a network configuration.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkReport {
    /// Errors by [`network_key`]. Valid networks are absent.
    pub networks: BTreeMap<String, NetworkErrors>,
    pub networking_parameters: NetworkingParametersErrors,
    pub intersections: Vec<NetworkIntersection>,
}

impl NetworkReport {
    pub fn is_valid(&self) -> bool {
        self.error_count() == 0
    }

    pub fn error_count(&self) -> usize {
        self.networks.values().map(NetworkErrors::len).sum::<usize>()
            + self.networking_parameters.len()
            + self.intersections.len()
    }
}

/// Report key of a network: `name#id`, or `name@position` when it has no id.
///
/// Names are not unique in a snapshot, so the name alone would let one
/// network's errors replace another's.
pub fn network_key(network: &Network, index: usize) -> String {
    match network.id {
        Some(id) => format!("{}#{id}", network.name),
        None => format!("{}@{index}", network.name),
    }
}

/// VLAN ids a network may not take: those of the other tagged networks plus
/// the tenant VLAN range.
fn forbidden_vlans(
    networks: &[Network],
    current: usize,
    parameters: &NetworkingParameters,
) -> Vec<u32> {
    let mut forbidden: Vec<u32> = networks
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != current)
        .filter_map(|(_, n)| vlan_id(&n.vlan_start))
        .collect();
    if let Some([start, end]) = parameters.vlan_range {
        let start = start.max(config::MIN_VLAN);
        let end = end.min(config::MAX_VLAN);
        forbidden.extend(start..=end);
    }
    forbidden
}

/// Validate all networks, the networking parameters and their overlaps.
pub fn validate_networks(networks: &[Network], parameters: &NetworkingParameters) -> NetworkReport {
    let mut report = NetworkReport::default();
    for (index, network) in networks.iter().enumerate() {
        let context = NetworkContext {
            forbidden_vlans: forbidden_vlans(networks, index, parameters),
        };
        let errors = validate_network(network, &context);
        if !errors.is_empty() {
            log::debug!("network '{}' has {} error(s)", network.name, errors.len());
            report.networks.insert(network_key(network, index), errors);
        }
    }
    let public = networks.iter().find(|n| n.name == PUBLIC_NETWORK);
    report.networking_parameters = validate_networking_parameters(parameters, public);
    report.intersections = check_networks_intersection(networks);
    log::info!(
        "Validated {} network(s): {} error(s), {} intersection(s)",
        networks.len(),
        report.error_count(),
        report.intersections.len()
    );
    report
}
