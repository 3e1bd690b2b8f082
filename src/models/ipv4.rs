//! IPv4 address and CIDR block arithmetic.
//!
//! Provides the [`Cidr`] value type plus the mask helpers the validators are
//! built on. Every comparison is done on the `u32` form of an address so that
//! `.9` sorts before `.10`.

use lazy_static::lazy_static;
use regex::Regex;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::net::Ipv4Addr;

/// Maximum length for an IPv4 subnet mask (32 bits).
pub const MAX_LENGTH: u8 = 32;

lazy_static! {
    /// Strict dotted quad, each octet 0-255. Leading zeros are tolerated.
    static ref IP_RE: Regex = Regex::new(
        r"^(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$"
    )
    .expect("Invalid IP regex");
    static ref CIDR_RE: Regex = Regex::new(r"^([0-9.]+)/([0-9]{1,2})$").expect("Invalid CIDR regex");
}

/// `true` if `ip` is a dotted-quad IPv4 address.
pub fn is_ipv4(ip: &str) -> bool {
    IP_RE.is_match(ip)
}

/// Parse a dotted-quad address. Returns `None` for anything [`is_ipv4`] rejects.
pub fn parse_ipv4(ip: &str) -> Option<Ipv4Addr> {
    if !is_ipv4(ip) {
        return None;
    }
    let mut octets = [0u8; 4];
    for (slot, part) in octets.iter_mut().zip(ip.split('.')) {
        *slot = part.parse().ok()?;
    }
    Some(Ipv4Addr::from(octets))
}

/// Unsigned 32 bit form of an address, the basis of all range comparisons.
pub fn ip_to_long(ip: &str) -> Option<u32> {
    parse_ipv4(ip).map(u32::from)
}

pub fn long_to_ip(bits: u32) -> String {
    Ipv4Addr::from(bits).to_string()
}

/// Convert a CIDR prefix length to a subnet mask as u32.
///
/// # Examples
/// ```
/// use fuel_settings_check::models::get_cidr_mask;
/// assert_eq!(get_cidr_mask(24).unwrap(), 0xFFFFFF00);
/// ```
pub fn get_cidr_mask(len: u8) -> Result<u32, Box<dyn Error>> {
    if len > MAX_LENGTH {
        Err("Network length is too long".into())
    } else {
        let right_len = MAX_LENGTH - len;
        let mask = (u64::from(u32::MAX) >> right_len) << right_len;
        Ok(mask as u32)
    }
}

/// Get the network address for a given IP and prefix length.
pub fn cut_addr(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr, Box<dyn Error>> {
    let mask = get_cidr_mask(len)?;
    Ok(Ipv4Addr::from(u32::from(addr) & mask))
}

/// Calculate the broadcast address for a given IP and prefix length.
pub fn broadcast_addr(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr, Box<dyn Error>> {
    let mask = get_cidr_mask(len)?;
    Ok(Ipv4Addr::from((u32::from(addr) & mask) | !mask))
}

/// An IPv4 block in `address/prefix` notation.
///
/// The address part need not be the network address; `10.0.0.7/24` is kept
/// as written and [`Cidr::network`] gives `10.0.0.0`.
#[derive(Eq, Ord, PartialEq, PartialOrd, Debug, Copy, Clone, Hash)]
pub struct Cidr {
    /// The IPv4 address as written.
    pub addr: Ipv4Addr,
    /// Prefix length (0-32).
    pub prefix: u8,
}

impl Cidr {
    /// Parse a CIDR string (e.g. "10.0.0.0/24").
    pub fn new(addr_cidr: &str) -> Result<Cidr, Box<dyn Error>> {
        let caps = CIDR_RE
            .captures(addr_cidr)
            .ok_or_else(|| format!("Invalid address/prefix {addr_cidr}"))?;
        let addr =
            parse_ipv4(&caps[1]).ok_or_else(|| format!("Invalid address {}", &caps[1]))?;
        let prefix: u8 = caps[2].parse()?;
        if prefix > MAX_LENGTH {
            return Err("Network length is too long".into());
        }
        Ok(Cidr { addr, prefix })
    }

    pub fn mask(&self) -> u32 {
        // prefix is bounded by `new`, a failure here means a hand built value
        get_cidr_mask(self.prefix).unwrap_or(u32::MAX)
    }

    /// Lowest address of the block.
    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.addr) & self.mask())
    }

    /// Highest address of the block.
    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.network()) | !self.mask())
    }

    /// Number of addresses in the block, network and broadcast included.
    pub fn size(&self) -> u64 {
        1u64 << (MAX_LENGTH - self.prefix.min(MAX_LENGTH))
    }

    /// First host address (network + 1), `None` for /31 and /32.
    pub fn first_usable(&self) -> Option<Ipv4Addr> {
        if self.size() < 4 {
            return None;
        }
        Some(Ipv4Addr::from(u32::from(self.network()) + 1))
    }

    /// Last host address (broadcast - 1), `None` for /31 and /32.
    pub fn last_usable(&self) -> Option<Ipv4Addr> {
        if self.size() < 4 {
            return None;
        }
        Some(Ipv4Addr::from(u32::from(self.broadcast()) - 1))
    }

    /// `true` if `ip` lies in [network, broadcast].
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let bits = u32::from(ip);
        bits >= u32::from(self.network()) && bits <= u32::from(self.broadcast())
    }

    /// `true` if the two blocks share at least one address.
    pub fn overlaps(&self, other: &Cidr) -> bool {
        u32::from(other.broadcast()) >= u32::from(self.network())
            && u32::from(other.network()) <= u32::from(self.broadcast())
    }
}

impl std::str::FromStr for Cidr {
    type Err = Box<dyn Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cidr::new(s)
    }
}

impl Serialize for Cidr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Cidr {
    fn deserialize<D>(deserializer: D) -> Result<Cidr, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Cidr::new(&s).map_err(|e| de::Error::custom(format!("invalid CIDR {s}: {e}")))
    }
}

impl std::fmt::Display for Cidr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}
