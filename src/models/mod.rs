//! Domain models for the settings and network checks.
//!
//! This module contains the data structures shared by the evaluator and the
//! validators:
//! - [`Cidr`] - IPv4 block with subnet arithmetic
//! - [`Network`], [`IpRange`] and [`NetworkingParameters`] - network tab state
//! - [`SettingsSchema`], [`Setting`] and [`Restriction`] - settings tab metadata

mod ipv4;
mod network;
mod setting;

// Re-export public types
pub use ipv4::{
    broadcast_addr, cut_addr, get_cidr_mask, ip_to_long, is_ipv4, long_to_ip, parse_ipv4, Cidr,
    MAX_LENGTH,
};
pub use network::{IpRange, Network, NetworkMeta, NetworkingParameters, Notation};
pub use setting::{
    join_messages, make_path, Restriction, RestrictionAction, Section, SectionMetadata, Setting,
    SettingsSchema,
};
