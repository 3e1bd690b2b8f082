//! Validation failures reported back to form fields.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// A single field error. `Display` is the message shown next to the field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid IP address")]
    InvalidIp,
    #[error("Invalid CIDR")]
    InvalidCidr,
    #[error("Network is too large")]
    LargeNetwork,
    #[error("Network is too small")]
    SmallNetwork,
    #[error("IP address does not match the network CIDR")]
    IpNotInCidr,
    #[error("Start IP address must be less than or equal to the end IP address")]
    InvalidIpRange,
    #[error("IP range intersects with range {start} - {end}")]
    IpRangesIntersection { start: String, end: String },
    #[error("At least one IP range must be specified")]
    EmptyIpRange,
    #[error("Invalid gateway")]
    InvalidGateway,
    #[error("Gateway is not in the network CIDR")]
    GatewayNotInCidr,
    #[error("Gateway address is inside an IP range")]
    GatewayInIpRange,
    #[error("Invalid VLAN ID")]
    InvalidVlan,
    #[error("This VLAN ID is already in use")]
    ForbiddenVlan,
    #[error("VLAN range start must not be greater than its end")]
    InvalidVlanRange,
    #[error("Address space intersects with network '{other}'")]
    NetworksIntersection { other: String },
    /// Caller supplied wording that replaces the default message.
    #[error("{0}")]
    Custom(String),
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Errors keyed by field name. Empty means valid.
pub type FieldErrors = BTreeMap<String, ValidationError>;

pub(crate) fn field_error(field: &str, error: ValidationError) -> FieldErrors {
    FieldErrors::from([(field.to_string(), error)])
}

/// Errors of one entry of a range list, by position in the list.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct IpRangeError {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<ValidationError>,
}

impl IpRangeError {
    pub(crate) fn new(index: usize) -> IpRangeError {
        IpRangeError {
            index,
            start: None,
            end: None,
        }
    }

    pub(crate) fn both(index: usize, error: ValidationError) -> IpRangeError {
        IpRangeError {
            index,
            start: Some(error.clone()),
            end: Some(error),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Messages that replace the default range errors, e.g. to word a floating
/// range check in terms of the public network.
#[derive(serde::Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeWarnings {
    #[serde(default, rename = "EMPTY_IP_RANGE")]
    pub empty_ip_range: Option<String>,
    #[serde(default, rename = "IP_RANGES_INTERSECTION")]
    pub ip_ranges_intersection: Option<String>,
    #[serde(default, rename = "IP_RANGE_IS_NOT_IN_CIDR")]
    pub ip_range_is_not_in_cidr: Option<String>,
}

impl RangeWarnings {
    pub(crate) fn or_default(warning: &Option<String>, default: ValidationError) -> ValidationError {
        match warning {
            Some(message) => ValidationError::Custom(message.clone()),
            None => default,
        }
    }
}
