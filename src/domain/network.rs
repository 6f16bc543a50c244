// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants
//!
//! Address arithmetic for carving a network block into per-tier, per-zone
//! subnets, plus the tier and port vocabulary shared by every stack.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IPv4 address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32)")]
    InvalidPrefixLength(u8),

    #[error("Address {address} has host bits set for prefix /{prefix_length}")]
    NotNetworkAligned { address: Ipv4Addr, prefix_length: u8 },

    #[error("Block {block} has no /{prefix_length} subnet at index {index}")]
    BlockExhausted {
        block: Ipv4Cidr,
        prefix_length: u8,
        index: u32,
    },
}

/// IPv4 network block in CIDR notation
///
/// Invariants:
/// - Prefix length is 0-32
/// - The address is the network address (no host bits set)
///
/// # Examples
///
/// ```rust
/// use proxy_infrastructure::domain::Ipv4Cidr;
///
/// let vpc: Ipv4Cidr = "10.0.0.0/16".parse().unwrap();
/// let third = vpc.subnet(24, 2).unwrap();
/// assert_eq!(third.to_string(), "10.0.2.0/24");
/// assert!(vpc.contains(&third));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix_length: u8,
}

impl Ipv4Cidr {
    /// Create a network block from its address and prefix length
    ///
    /// # Invariants
    /// - Prefix length <= 32
    /// - Host bits of `network` are zero
    pub fn new(network: Ipv4Addr, prefix_length: u8) -> Result<Self, NetworkError> {
        if prefix_length > 32 {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }

        if u32::from(network) & !Self::mask(prefix_length) != 0 {
            return Err(NetworkError::NotNetworkAligned {
                address: network,
                prefix_length,
            });
        }

        Ok(Self {
            network,
            prefix_length,
        })
    }

    fn mask(prefix_length: u8) -> u32 {
        match prefix_length {
            0 => 0,
            p => u32::MAX << (32 - u32::from(p)),
        }
    }

    /// Network address
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// Prefix length
    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    /// Number of addresses in the block
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix_length))
    }

    /// Check whether an address falls inside this block
    pub fn contains_address(&self, address: Ipv4Addr) -> bool {
        u32::from(address) & Self::mask(self.prefix_length) == u32::from(self.network)
    }

    /// Check whether another block is fully contained in this one
    pub fn contains(&self, other: &Ipv4Cidr) -> bool {
        other.prefix_length >= self.prefix_length && self.contains_address(other.network)
    }

    /// The `index`-th sub-block of the given prefix length
    ///
    /// Sub-blocks are numbered from the start of this block, so
    /// `10.0.0.0/16` split into `/24` yields `10.0.0.0/24`, `10.0.1.0/24`, ...
    pub fn subnet(&self, prefix_length: u8, index: u32) -> Result<Ipv4Cidr, NetworkError> {
        if prefix_length > 32 || prefix_length < self.prefix_length {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }

        let available = 1u64 << u32::from(prefix_length - self.prefix_length);
        if u64::from(index) >= available {
            return Err(NetworkError::BlockExhausted {
                block: *self,
                prefix_length,
                index,
            });
        }

        let offset = u64::from(index) << (32 - u32::from(prefix_length));
        let base = u64::from(u32::from(self.network)) + offset;
        // offset < size of self, so base stays within u32
        let address = Ipv4Addr::from(base as u32);

        Ipv4Cidr::new(address, prefix_length)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_length)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_str, prefix_str) = s
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(s.to_string()))?;

        let network = addr_str
            .parse::<Ipv4Addr>()
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;

        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(s.to_string()))?;

        Self::new(network, prefix_length)
    }
}

impl TryFrom<String> for Ipv4Cidr {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ipv4Cidr> for String {
    fn from(cidr: Ipv4Cidr) -> Self {
        cidr.to_string()
    }
}

/// Subnet tier: a network segment with its own routing and exposure policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetTier {
    /// Internet-routable; hosts the load balancer and NAT gateways
    Public,
    /// Outbound internet through NAT; hosts compute
    PrivateEgress,
    /// No internet route; hosts database and cache
    Isolated,
}

impl SubnetTier {
    /// Allocation order when carving the network block
    pub const ALL: [SubnetTier; 3] = [
        SubnetTier::Public,
        SubnetTier::PrivateEgress,
        SubnetTier::Isolated,
    ];

    /// Prefix used for subnet logical ids
    pub fn label(&self) -> &'static str {
        match self {
            Self::Public => "Public",
            Self::PrivateEgress => "Private",
            Self::Isolated => "Isolated",
        }
    }

    /// Whether instances in this tier get a public address on launch
    pub fn is_internet_routable(&self) -> bool {
        matches!(self, Self::Public)
    }
}

impl fmt::Display for SubnetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::PrivateEgress => write!(f, "private-egress"),
            Self::Isolated => write!(f, "isolated"),
        }
    }
}

/// Transport protocol of a port range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

/// Port range on a transport protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    pub protocol: Protocol,
    pub from_port: u16,
    pub to_port: u16,
}

impl Port {
    /// Single TCP port
    pub fn tcp(port: u16) -> Self {
        Self {
            protocol: Protocol::Tcp,
            from_port: port,
            to_port: port,
        }
    }

    /// Check whether the range covers a given port
    pub fn covers(&self, port: u16) -> bool {
        (self.from_port..=self.to_port).contains(&port)
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let proto = match self.protocol {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        };
        if self.from_port == self.to_port {
            write!(f, "{}/{}", proto, self.from_port)
        } else {
            write!(f, "{}/{}-{}", proto, self.from_port, self.to_port)
        }
    }
}

/// Availability zone names for a region, in allocation order
pub fn availability_zones(region: &str, count: u8) -> Vec<String> {
    (b'a'..=b'z')
        .take(usize::from(count))
        .map(|letter| format!("{}{}", region, letter as char))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cidr_parsing() {
        let cidr: Ipv4Cidr = "10.0.0.0/16".parse().unwrap();
        assert_eq!(cidr.network(), Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(cidr.prefix_length(), 16);
        assert_eq!(cidr.size(), 65_536);
        assert_eq!(cidr.to_string(), "10.0.0.0/16");
    }

    #[test]
    fn test_cidr_rejects_host_bits() {
        let result = "10.0.1.5/24".parse::<Ipv4Cidr>();
        assert!(matches!(
            result,
            Err(NetworkError::NotNetworkAligned { .. })
        ));
    }

    #[test]
    fn test_cidr_invalid_input() {
        assert!("10.0.0.0".parse::<Ipv4Cidr>().is_err());
        assert!("10.0.0.0/33".parse::<Ipv4Cidr>().is_err());
        assert!("10.0.0/16".parse::<Ipv4Cidr>().is_err());
        assert!("10.0.0.0/abc".parse::<Ipv4Cidr>().is_err());
    }

    #[test]
    fn test_subnet_carving() {
        let vpc: Ipv4Cidr = "10.0.0.0/16".parse().unwrap();

        assert_eq!(vpc.subnet(24, 0).unwrap().to_string(), "10.0.0.0/24");
        assert_eq!(vpc.subnet(24, 5).unwrap().to_string(), "10.0.5.0/24");
        assert_eq!(vpc.subnet(24, 255).unwrap().to_string(), "10.0.255.0/24");
        assert!(matches!(
            vpc.subnet(24, 256),
            Err(NetworkError::BlockExhausted { .. })
        ));
        assert!(vpc.subnet(8, 0).is_err());
    }

    #[test]
    fn test_containment() {
        let vpc: Ipv4Cidr = "10.0.0.0/16".parse().unwrap();
        let inside: Ipv4Cidr = "10.0.3.0/24".parse().unwrap();
        let outside: Ipv4Cidr = "10.1.0.0/24".parse().unwrap();

        assert!(vpc.contains(&inside));
        assert!(!vpc.contains(&outside));
        assert!(!inside.contains(&vpc));
        assert!(inside.contains(&inside));
        assert!(inside.contains_address(Ipv4Addr::new(10, 0, 3, 200)));
    }

    #[test]
    fn test_cidr_serde_as_string() {
        let cidr: Ipv4Cidr = "192.168.0.0/20".parse().unwrap();
        let json = serde_json::to_string(&cidr).unwrap();
        assert_eq!(json, "\"192.168.0.0/20\"");

        let back: Ipv4Cidr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cidr);

        assert!(serde_json::from_str::<Ipv4Cidr>("\"192.168.0.1/20\"").is_err());
    }

    #[test]
    fn test_port_display() {
        assert_eq!(Port::tcp(5432).to_string(), "tcp/5432");
        assert!(Port::tcp(443).covers(443));
        assert!(!Port::tcp(443).covers(80));
    }

    #[test]
    fn test_availability_zones() {
        assert_eq!(
            availability_zones("us-east-1", 3),
            vec!["us-east-1a", "us-east-1b", "us-east-1c"]
        );
        assert!(availability_zones("eu-west-1", 0).is_empty());
    }
}
