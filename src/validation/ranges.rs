//! IP range list validation.

use super::address::{validate_ip, validate_ip_corresponds_to_cidr};
use super::error::{IpRangeError, RangeWarnings, ValidationError};
use crate::models::{ip_to_long, IpRange};

/// First range of `existing` that shares an address with `range`.
///
/// Intervals are inclusive. Ranges with an unparseable end are skipped, as is
/// an unparseable `range`.
pub fn check_ip_ranges_intersection<'a>(
    range: &IpRange,
    existing: &'a [IpRange],
) -> Option<&'a IpRange> {
    let (start, end) = (ip_to_long(range.start())?, ip_to_long(range.end())?);
    existing.iter().find(|other| {
        match (ip_to_long(other.start()), ip_to_long(other.end())) {
            (Some(other_start), Some(other_end)) => other_end >= start && other_start <= end,
            _ => false,
        }
    })
}

/// Endpoint check: a valid address inside `cidr` if one is given.
fn endpoint_error(ip: &str, cidr: Option<&str>, warnings: &RangeWarnings) -> Option<ValidationError> {
    if !validate_ip(ip) {
        Some(ValidationError::InvalidIp)
    } else if !validate_ip_corresponds_to_cidr(cidr, ip) {
        Some(RangeWarnings::or_default(
            &warnings.ip_range_is_not_in_cidr,
            ValidationError::IpNotInCidr,
        ))
    } else {
        None
    }
}

/// Validate a list of ranges. An empty result means every range is valid.
///
/// At least one range must be non-blank; blank ranges next to a filled one
/// are ignored. For each filled range the endpoints are checked first, then
/// their order, then overlap with `existing`.
pub fn validate_ip_ranges(
    ranges: &[IpRange],
    cidr: Option<&str>,
    existing: &[IpRange],
    warnings: &RangeWarnings,
) -> Vec<IpRangeError> {
    if ranges.iter().all(IpRange::is_empty) {
        let error =
            RangeWarnings::or_default(&warnings.empty_ip_range, ValidationError::EmptyIpRange);
        return vec![IpRangeError::both(0, error)];
    }

    let mut errors = Vec::new();
    for (index, range) in ranges.iter().enumerate() {
        if range.is_empty() {
            continue;
        }
        let mut error = IpRangeError::new(index);
        error.start = endpoint_error(range.start(), cidr, warnings);
        error.end = endpoint_error(range.end(), cidr, warnings);

        if error.is_empty() {
            if ip_to_long(range.start()) > ip_to_long(range.end()) {
                error = IpRangeError::both(index, ValidationError::InvalidIpRange);
            } else if let Some(other) = check_ip_ranges_intersection(range, existing) {
                let default = ValidationError::IpRangesIntersection {
                    start: other.start().to_string(),
                    end: other.end().to_string(),
                };
                error = IpRangeError::both(
                    index,
                    RangeWarnings::or_default(&warnings.ip_ranges_intersection, default),
                );
            }
        }

        if !error.is_empty() {
            log::debug!("ip range #{index} [{range}] rejected: {error:?}");
            errors.push(error);
        }
    }
    errors
}

/// Pairs of ranges within one list that overlap, as (earlier, later) indexes.
pub fn find_overlapping_ranges(ranges: &[IpRange]) -> Vec<(usize, usize)> {
    let mut overlaps = Vec::new();
    for (i, range) in ranges.iter().enumerate() {
        for (j, other) in ranges.iter().enumerate().skip(i + 1) {
            if check_ip_ranges_intersection(other, std::slice::from_ref(range)).is_some() {
                overlaps.push((i, j));
            }
        }
    }
    overlaps
}
