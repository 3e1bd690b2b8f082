//! Single value checks: addresses, CIDR blocks, gateways and VLAN ids.
//!
//! All comparisons use the `u32` form of an address.

use super::error::{field_error, FieldErrors, ValidationError};
use crate::config;
use crate::models::{is_ipv4, long_to_ip, parse_ipv4, Cidr, IpRange};
use std::net::Ipv4Addr;

/// `true` iff `ip` is a strict dotted quad with octets 0-255.
pub fn validate_ip(ip: &str) -> bool {
    is_ipv4(ip)
}

/// Check a CIDR against the product prefix policy.
///
/// The block must parse as a [`Cidr`]. Prefixes 0 and 1 are then too large,
/// anything above 30 is too small.
pub fn validate_cidr(cidr: &str, field: &str) -> FieldErrors {
    match Cidr::new(cidr) {
        Err(_) => field_error(field, ValidationError::InvalidCidr),
        Ok(block) if block.prefix < config::MIN_CIDR_PREFIX => {
            field_error(field, ValidationError::LargeNetwork)
        }
        Ok(block) if block.prefix > config::MAX_CIDR_PREFIX => {
            field_error(field, ValidationError::SmallNetwork)
        }
        Ok(_) => FieldErrors::new(),
    }
}

/// Parse `cidr` only if it passes [`validate_cidr`].
fn usable_cidr(cidr: &str) -> Option<Cidr> {
    Cidr::new(cidr)
        .ok()
        .filter(|block| (config::MIN_CIDR_PREFIX..=config::MAX_CIDR_PREFIX).contains(&block.prefix))
}

/// `None` when `gateway` is a valid address inside `cidr` (if given).
pub fn validate_gateway(gateway: &str, cidr: Option<&str>, field: &str) -> Option<FieldErrors> {
    if !validate_ip(gateway) {
        return Some(field_error(field, ValidationError::InvalidGateway));
    }
    if !validate_ip_corresponds_to_cidr(cidr, gateway) {
        return Some(field_error(field, ValidationError::GatewayNotInCidr));
    }
    None
}

/// Network address + 1, or `""` for a block that fails [`validate_cidr`].
pub fn get_default_gateway_for_cidr(cidr: &str) -> String {
    usable_cidr(cidr)
        .and_then(|block| block.first_usable())
        .map(|ip| ip.to_string())
        .unwrap_or_default()
}

/// The usable host span of `cidr` as a single range.
///
/// With `exclude_gateway` the first host is left out for the gateway. An
/// invalid block gives one blank range.
pub fn get_default_ip_range_for_cidr(cidr: &str, exclude_gateway: bool) -> Vec<IpRange> {
    let span = usable_cidr(cidr).and_then(|block| {
        let first = u32::from(block.first_usable()?);
        let last = u32::from(block.last_usable()?);
        let first = if exclude_gateway { first + 1 } else { first };
        Some(IpRange::new(long_to_ip(first), long_to_ip(last)))
    });
    vec![span.unwrap_or_default()]
}

/// `true` when `ip` lies in [network, broadcast] of `cidr`.
///
/// Vacuously `true` without a cidr. An invalid address or an unparseable
/// block gives `false`.
pub fn validate_ip_corresponds_to_cidr(cidr: Option<&str>, ip: &str) -> bool {
    let Some(cidr) = cidr.filter(|c| !c.is_empty()) else {
        return true;
    };
    match (Cidr::new(cidr), parse_ipv4(ip)) {
        (Ok(block), Some(ip)) => block.contains(ip),
        _ => false,
    }
}

/// `true` when `ip` lies inside the inclusive range. Invalid input gives `false`.
pub fn ip_in_range(ip: Ipv4Addr, range: &IpRange) -> bool {
    match (parse_ipv4(range.start()), parse_ipv4(range.end())) {
        (Some(start), Some(end)) => {
            u32::from(start) <= u32::from(ip) && u32::from(ip) <= u32::from(end)
        }
        _ => false,
    }
}

/// Check a VLAN id.
///
/// `null` is accepted unless `disallow_null`. Anything else must be a natural
/// number in [1, 4094] and not in `forbidden_vlans`.
pub fn validate_vlan(
    vlan: &serde_json::Value,
    forbidden_vlans: &[u32],
    field: &str,
    disallow_null: bool,
) -> FieldErrors {
    if vlan.is_null() {
        return if disallow_null {
            field_error(field, ValidationError::InvalidVlan)
        } else {
            FieldErrors::new()
        };
    }
    let Some(id) = vlan_id(vlan) else {
        return field_error(field, ValidationError::InvalidVlan);
    };
    if forbidden_vlans.contains(&id) {
        return field_error(field, ValidationError::ForbiddenVlan);
    }
    FieldErrors::new()
}

/// A VLAN id in [1, 4094]. Integral floats such as `104.0` count.
pub(crate) fn vlan_id(vlan: &serde_json::Value) -> Option<u32> {
    let id = match vlan.as_u64() {
        Some(id) => id,
        None => {
            let float = vlan.as_f64()?;
            if float.fract() != 0.0 || float < 0.0 || float > f64::from(config::MAX_VLAN) {
                return None;
            }
            float as u64
        }
    };
    let id = u32::try_from(id).ok()?;
    (config::MIN_VLAN..=config::MAX_VLAN).contains(&id).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_ip() {
        assert!(validate_ip("192.168.0.1"));
        assert!(validate_ip("255.255.255.255"));
        assert!(!validate_ip("256.1.1.1"));
        assert!(!validate_ip(""));
        assert!(!validate_ip("1.2.3"));
        assert!(!validate_ip(" 1.2.3.4"));
        assert!(!validate_ip("+1.2.3.4"));
    }

    #[test]
    fn test_validate_cidr_policy() {
        assert!(validate_cidr("10.0.0.0/24", "cidr").is_empty());
        assert!(validate_cidr("10.0.0.0/2", "cidr").is_empty());
        assert!(validate_cidr("10.0.0.0/30", "cidr").is_empty());
        assert_eq!(
            validate_cidr("10.0.0.0/1", "cidr")["cidr"],
            ValidationError::LargeNetwork
        );
        assert_eq!(
            validate_cidr("0.0.0.0/0", "cidr")["cidr"],
            ValidationError::LargeNetwork
        );
        assert_eq!(
            validate_cidr("10.0.0.0/31", "cidr")["cidr"],
            ValidationError::SmallNetwork
        );
        assert_eq!(
            validate_cidr("10.0.0.0/32", "public_cidr")["public_cidr"],
            ValidationError::SmallNetwork
        );
        assert!(validate_cidr("10.0.0.0/08", "cidr").is_empty());
        for bad in [
            "10.0.0.0/33",
            "10.0.0.0",
            "10.0.0/24",
            "300.0.0.0/24",
            "",
            "10.0.0.0/",
            "172.16.0.0/024",
            "10.0.0.0/0024",
        ] {
            assert_eq!(
                validate_cidr(bad, "cidr")["cidr"],
                ValidationError::InvalidCidr,
                "{bad} should be invalid"
            );
        }
    }

    #[test]
    fn test_validate_gateway() {
        assert_eq!(validate_gateway("10.0.0.1", Some("10.0.0.0/24"), "gateway"), None);
        assert_eq!(validate_gateway("10.0.0.1", None, "gateway"), None);
        assert_eq!(
            validate_gateway("10.0.1.1", Some("10.0.0.0/24"), "gateway"),
            Some(field_error("gateway", ValidationError::GatewayNotInCidr))
        );
        assert_eq!(
            validate_gateway("10.0.0", Some("10.0.0.0/24"), "gateway"),
            Some(field_error("gateway", ValidationError::InvalidGateway))
        );
    }

    #[test]
    fn test_default_gateway() {
        assert_eq!(get_default_gateway_for_cidr("172.16.0.0/24"), "172.16.0.1");
        assert_eq!(get_default_gateway_for_cidr("172.16.0.77/24"), "172.16.0.1");
        assert_eq!(get_default_gateway_for_cidr("172.16.0.0/31"), "");
        assert_eq!(get_default_gateway_for_cidr("garbage"), "");
    }

    #[test]
    fn test_default_ip_range() {
        assert_eq!(
            get_default_ip_range_for_cidr("192.168.0.0/24", false),
            vec![IpRange::new("192.168.0.1", "192.168.0.254")]
        );
        assert_eq!(
            get_default_ip_range_for_cidr("192.168.0.0/24", true),
            vec![IpRange::new("192.168.0.2", "192.168.0.254")]
        );
        assert_eq!(
            get_default_ip_range_for_cidr("192.168.0.0/30", true),
            vec![IpRange::new("192.168.0.2", "192.168.0.2")]
        );
        assert_eq!(
            get_default_ip_range_for_cidr("192.168.0.0/33", false),
            vec![IpRange::new("", "")]
        );
    }

    #[test]
    fn test_ip_corresponds_to_cidr() {
        assert!(validate_ip_corresponds_to_cidr(None, "1.1.1.1"));
        assert!(validate_ip_corresponds_to_cidr(Some(""), "1.1.1.1"));
        assert!(validate_ip_corresponds_to_cidr(Some("10.0.0.0/24"), "10.0.0.0"));
        assert!(validate_ip_corresponds_to_cidr(Some("10.0.0.0/24"), "10.0.0.255"));
        assert!(!validate_ip_corresponds_to_cidr(Some("10.0.0.0/24"), "10.0.1.0"));
        assert!(!validate_ip_corresponds_to_cidr(Some("10.0.0.0/24"), "nope"));
        assert!(!validate_ip_corresponds_to_cidr(Some("10.0.0/24"), "10.0.0.1"));
    }

    #[test]
    fn test_ip_in_range_numeric_order() {
        let range = IpRange::new("10.0.0.9", "10.0.0.10");
        assert!(ip_in_range("10.0.0.10".parse().unwrap(), &range));
        assert!(!ip_in_range("10.0.0.100".parse().unwrap(), &range));
    }

    #[test]
    fn test_validate_vlan() {
        assert_eq!(
            validate_vlan(&json!(0), &[], "vlan_start", true)["vlan_start"],
            ValidationError::InvalidVlan
        );
        assert!(validate_vlan(&json!(104), &[], "vlan_start", true).is_empty());
        assert!(validate_vlan(&json!(4094), &[], "vlan_start", true).is_empty());
        assert!(!validate_vlan(&json!(4095), &[], "vlan_start", true).is_empty());
        assert!(!validate_vlan(&json!(10.5), &[], "vlan_start", true).is_empty());
        assert!(validate_vlan(&json!(104.0), &[], "vlan_start", true).is_empty());
        assert_eq!(
            validate_vlan(&json!(101.0), &[101], "vlan_start", true)["vlan_start"],
            ValidationError::ForbiddenVlan
        );
        assert!(!validate_vlan(&json!(4095.0), &[], "vlan_start", true).is_empty());
        assert!(!validate_vlan(&json!(-3), &[], "vlan_start", true).is_empty());
        assert!(!validate_vlan(&json!("12"), &[], "vlan_start", true).is_empty());
        assert!(validate_vlan(&json!(null), &[], "vlan_start", false).is_empty());
        assert_eq!(
            validate_vlan(&json!(null), &[], "vlan_start", true)["vlan_start"],
            ValidationError::InvalidVlan
        );
        assert_eq!(
            validate_vlan(&json!(101), &[100, 101], "vlan_start", true)["vlan_start"],
            ValidationError::ForbiddenVlan
        );
    }
}
