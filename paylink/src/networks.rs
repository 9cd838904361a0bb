//! Well-known networks, their USDC deployments and CCTP domains.
//!
//! This table is the fixed enumeration the dispatcher uses to decide which
//! family a payment-link chain belongs to, which USDC token a payment URI
//! names, and whether two chains can be bridged with Circle's Cross-Chain
//! Transfer Protocol (CCTP).

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::chain::{ChainFamily, ChainId};

/// Decimals of the USDC token on every supported network.
pub const USDC_DECIMALS: u32 = 6;

/// A known network definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Network name used by payment links (e.g., "base-sepolia", "solana")
    pub name: &'static str,
    /// Name shown to payers (e.g., "Base Sepolia")
    pub display_name: &'static str,
    /// Family the network belongs to
    pub family: ChainFamily,
    /// CAIP-2 reference (e.g., "84532" for Base Sepolia, "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp" for Solana mainnet)
    pub reference: &'static str,
    /// USDC mint (Solana) or contract address (EVM)
    pub usdc: &'static str,
    /// Circle CCTP domain, `None` if the network cannot bridge
    pub cctp_domain: Option<u32>,
    /// Whether this is a test network; CCTP never bridges between mainnet and testnet
    pub testnet: bool,
}

impl NetworkInfo {
    /// Create a `ChainId` from this network info
    #[must_use]
    pub fn chain_id(&self) -> ChainId {
        ChainId::new(self.family.namespace(), self.reference)
    }

    /// Returns `true` if CCTP can move USDC from `self` to `other`.
    #[must_use]
    pub fn can_bridge_to(&self, other: &Self) -> bool {
        self.cctp_domain.is_some()
            && other.cctp_domain.is_some()
            && self.cctp_domain != other.cctp_domain
            && self.testnet == other.testnet
    }
}

/// Every network the checkout flow knows about.
pub static KNOWN_NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        name: "solana",
        display_name: "Solana",
        family: ChainFamily::Solana,
        reference: "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp",
        usdc: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
        cctp_domain: Some(5),
        testnet: false,
    },
    NetworkInfo {
        name: "solana-devnet",
        display_name: "Solana Devnet",
        family: ChainFamily::Solana,
        reference: "EtWTRABZaYq6iMfeYKouRu166VU2xqa1",
        usdc: "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU",
        cctp_domain: Some(5),
        testnet: true,
    },
    NetworkInfo {
        name: "ethereum",
        display_name: "Ethereum",
        family: ChainFamily::Evm,
        reference: "1",
        usdc: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
        cctp_domain: Some(0),
        testnet: false,
    },
    NetworkInfo {
        name: "avalanche",
        display_name: "Avalanche",
        family: ChainFamily::Evm,
        reference: "43114",
        usdc: "0xB97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E",
        cctp_domain: Some(1),
        testnet: false,
    },
    NetworkInfo {
        name: "optimism",
        display_name: "Optimism",
        family: ChainFamily::Evm,
        reference: "10",
        usdc: "0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85",
        cctp_domain: Some(2),
        testnet: false,
    },
    NetworkInfo {
        name: "arbitrum",
        display_name: "Arbitrum",
        family: ChainFamily::Evm,
        reference: "42161",
        usdc: "0xaf88d065e77c8cC2239327C5EDb3A432268e5831",
        cctp_domain: Some(3),
        testnet: false,
    },
    NetworkInfo {
        name: "base",
        display_name: "Base",
        family: ChainFamily::Evm,
        reference: "8453",
        usdc: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913",
        cctp_domain: Some(6),
        testnet: false,
    },
    NetworkInfo {
        name: "polygon",
        display_name: "Polygon",
        family: ChainFamily::Evm,
        reference: "137",
        usdc: "0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359",
        cctp_domain: Some(7),
        testnet: false,
    },
    NetworkInfo {
        name: "ethereum-sepolia",
        display_name: "Ethereum Sepolia",
        family: ChainFamily::Evm,
        reference: "11155111",
        usdc: "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238",
        cctp_domain: Some(0),
        testnet: true,
    },
    NetworkInfo {
        name: "avalanche-fuji",
        display_name: "Avalanche Fuji",
        family: ChainFamily::Evm,
        reference: "43113",
        usdc: "0x5425890298aed601595a70AB815c96711a31Bc65",
        cctp_domain: Some(1),
        testnet: true,
    },
    NetworkInfo {
        name: "arbitrum-sepolia",
        display_name: "Arbitrum Sepolia",
        family: ChainFamily::Evm,
        reference: "421614",
        usdc: "0x75faf114eafb1BDbe2F0316DF893fd58CE46AA4d",
        cctp_domain: Some(3),
        testnet: true,
    },
    NetworkInfo {
        name: "base-sepolia",
        display_name: "Base Sepolia",
        family: ChainFamily::Evm,
        reference: "84532",
        usdc: "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
        cctp_domain: Some(6),
        testnet: true,
    },
    NetworkInfo {
        name: "polygon-amoy",
        display_name: "Polygon Amoy",
        family: ChainFamily::Evm,
        reference: "80002",
        usdc: "0x41E94Eb71Ef8C9fAE0235d1e472b21E21B5a4dbF",
        cctp_domain: Some(7),
        testnet: true,
    },
];

/// Name and chain-id index over a set of [`NetworkInfo`] entries.
///
/// [`NetworkRegistry::known`] indexes [`KNOWN_NETWORKS`]; the free lookup
/// functions in this module go through it.
#[derive(Debug, Clone, Default)]
pub struct NetworkRegistry {
    by_name: HashMap<&'static str, &'static NetworkInfo>,
    by_chain_id: HashMap<ChainId, &'static NetworkInfo>,
}

static KNOWN: LazyLock<NetworkRegistry> =
    LazyLock::new(|| NetworkRegistry::from_networks(KNOWN_NETWORKS));

impl NetworkRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry of [`KNOWN_NETWORKS`].
    #[must_use]
    pub fn known() -> &'static Self {
        &KNOWN
    }

    /// Creates a registry pre-populated from a network slice.
    #[must_use]
    pub fn from_networks(networks: &'static [NetworkInfo]) -> Self {
        let mut registry = Self {
            by_name: HashMap::with_capacity(networks.len()),
            by_chain_id: HashMap::with_capacity(networks.len()),
        };
        registry.register(networks);
        registry
    }

    /// Registers additional networks. Later entries replace earlier ones with
    /// the same name or chain id.
    pub fn register(&mut self, networks: &'static [NetworkInfo]) {
        for info in networks {
            self.by_name.insert(info.name, info);
            self.by_chain_id.insert(info.chain_id(), info);
        }
    }

    /// Builder-style method: registers additional networks and returns `self`.
    #[must_use]
    pub fn with_networks(mut self, networks: &'static [NetworkInfo]) -> Self {
        self.register(networks);
        self
    }

    /// Looks up a network by its payment-link name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&'static NetworkInfo> {
        self.by_name.get(name).copied()
    }

    /// Looks up a network by its CAIP-2 chain ID.
    #[must_use]
    pub fn by_chain_id(&self, chain_id: &ChainId) -> Option<&'static NetworkInfo> {
        self.by_chain_id.get(chain_id).copied()
    }

    /// Returns the number of registered networks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns `true` if no networks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Looks up a known network by its payment-link name.
#[must_use]
pub fn network_by_name(name: &str) -> Option<&'static NetworkInfo> {
    NetworkRegistry::known().by_name(name)
}

/// Looks up a known network by its CAIP-2 chain ID.
#[must_use]
pub fn network_by_chain_id(chain_id: &ChainId) -> Option<&'static NetworkInfo> {
    NetworkRegistry::known().by_chain_id(chain_id)
}

/// Iterates over the known networks of one family, in table order.
pub fn networks_in(family: ChainFamily) -> impl Iterator<Item = &'static NetworkInfo> {
    KNOWN_NETWORKS.iter().filter(move |n| n.family == family)
}
