//! Network configuration data model.
//!
//! Mirrors the network tab state of a cluster: one [`Network`] per logical
//! network plus the cluster wide [`NetworkingParameters`].

use serde::{Deserialize, Serialize};

/// An inclusive `[start, end]` pair of addresses as typed into a form.
///
/// Either side may be empty or invalid; the validators decide.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct IpRange(pub String, pub String);

impl IpRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> IpRange {
        IpRange(start.into(), end.into())
    }

    pub fn start(&self) -> &str {
        &self.0
    }

    pub fn end(&self) -> &str {
        &self.1
    }

    /// `true` when both ends are blank.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty() && self.1.is_empty()
    }
}

impl std::fmt::Display for IpRange {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} - {}", self.0, self.1)
    }
}

/// How addresses of a network are handed out.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Notation {
    Cidr,
    IpRanges,
}

/// Per-network metadata shipped with the release.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NetworkMeta {
    /// Whether the network carries a gateway the user can edit.
    #[serde(default)]
    pub use_gateway: bool,
    /// `None` means the network is not assigned addresses by the console.
    #[serde(default)]
    pub notation: Option<Notation>,
    /// Whether cidr/vlan are editable at all.
    #[serde(default = "default_true")]
    pub configurable: bool,
    /// Whether the network is VLAN tagged.
    #[serde(default)]
    pub vlan_tagging: bool,
}

fn default_true() -> bool {
    true
}

impl Default for NetworkMeta {
    fn default() -> Self {
        NetworkMeta {
            use_gateway: false,
            notation: None,
            configurable: true,
            vlan_tagging: false,
        }
    }
}

/// One entry of the network configuration.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Network {
    #[serde(default)]
    pub id: Option<u32>,
    pub name: String,
    #[serde(default)]
    pub cidr: Option<String>,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub ip_ranges: Vec<IpRange>,
    /// Left untyped, the form may hold anything while the user types.
    #[serde(default)]
    pub vlan_start: serde_json::Value,
    #[serde(default)]
    pub meta: NetworkMeta,
}

impl Default for Network {
    fn default() -> Self {
        Network {
            id: None,
            name: "".to_string(),
            cidr: None,
            gateway: None,
            ip_ranges: vec![],
            vlan_start: serde_json::Value::Null,
            meta: NetworkMeta::default(),
        }
    }
}

/// Cluster wide networking parameters (neutron / nova-network settings).
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NetworkingParameters {
    #[serde(default)]
    pub floating_ranges: Vec<IpRange>,
    #[serde(default)]
    pub dns_nameservers: Vec<String>,
    #[serde(default)]
    pub internal_cidr: Option<String>,
    #[serde(default)]
    pub internal_gateway: Option<String>,
    #[serde(default)]
    pub segmentation_type: Option<String>,
    /// Start/end of the VLAN id range reserved for tenant networks.
    #[serde(default)]
    pub vlan_range: Option<[u32; 2]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip_range_json_shape() {
        let range: IpRange = serde_json::from_str(r#"["10.0.0.2", "10.0.0.254"]"#).unwrap();
        assert_eq!(range, IpRange::new("10.0.0.2", "10.0.0.254"));
        assert_eq!(range.to_string(), "10.0.0.2 - 10.0.0.254");
        assert!(IpRange::new("", "").is_empty());
        assert!(!IpRange::new("", "10.0.0.1").is_empty());
    }

    #[test]
    fn test_network_defaults() {
        let net: Network = serde_json::from_str(r#"{"name": "public"}"#).unwrap();
        assert_eq!(net.name, "public");
        assert!(net.meta.configurable);
        assert!(!net.meta.use_gateway);
        assert_eq!(net.meta.notation, None);
        assert!(net.vlan_start.is_null());
        assert!(net.ip_ranges.is_empty());
    }

    #[test]
    fn test_network_full() {
        let json = r#"{
            "id": 3,
            "name": "management",
            "cidr": "192.168.0.0/24",
            "gateway": null,
            "ip_ranges": [["192.168.0.1", "192.168.0.254"]],
            "vlan_start": 101,
            "meta": {"use_gateway": false, "notation": "cidr", "vlan_tagging": true}
        }"#;
        let net: Network = serde_json::from_str(json).unwrap();
        assert_eq!(net.meta.notation, Some(Notation::Cidr));
        assert_eq!(net.vlan_start, serde_json::json!(101));
        assert!(net.meta.vlan_tagging);
    }
}
