//! Network range validation.
//!
//! Pure checks run on every edit of the network configuration. Nothing here
//! returns `Err`: problems come back as [`FieldErrors`] keyed by field name or
//! as [`IpRangeError`] records keyed by range index, and an empty result means
//! the input is valid.
//!
//! - [`address`] - addresses, CIDR policy, gateways, VLAN ids and defaults
//! - [`ranges`] - range lists and range intersection
//! - [`network`] - whole networks, networking parameters, overlapping blocks

pub mod address;
mod error;
pub mod network;
pub mod ranges;

pub use address::{
    get_default_gateway_for_cidr, get_default_ip_range_for_cidr, ip_in_range, validate_cidr,
    validate_gateway, validate_ip, validate_ip_corresponds_to_cidr, validate_vlan,
};
pub use error::{FieldErrors, IpRangeError, RangeWarnings, ValidationError};
pub use network::{
    check_networks_intersection, network_key, validate_network, validate_networking_parameters,
    validate_networks, NetworkContext, NetworkErrors, NetworkIntersection, NetworkReport,
    NetworkingParametersErrors, PUBLIC_NETWORK,
};
pub use ranges::{check_ip_ranges_intersection, find_overlapping_ranges, validate_ip_ranges};
