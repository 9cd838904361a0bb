//! Chain identifiers used throughout the payment-link flow.
//!
//! Three layers of identification are in play:
//!
//! - [`ChainFamily`] - A group of networks sharing a wallet and address
//!   convention (`solana`, or the EVM networks under `eip155`)
//! - [`ChainId`] - A CAIP-2 compliant chain identifier (e.g., `eip155:8453` for Base)
//! - [`Chain`] - The network name a payment link uses (e.g., `"base"`), which is
//!   what merchants configure and what the dispatcher compares

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;

use crate::networks::{self, NetworkInfo};

/// A group of blockchain networks sharing a wallet and address convention.
///
/// Serialized lowercase (`"solana"`, `"evm"`). `"ethereum"` and `"eip155"` are
/// accepted as aliases for [`ChainFamily::Evm`] since merchant records use them
/// interchangeably.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    /// Solana mainnet and devnet.
    Solana,
    /// Ethereum and EVM-compatible networks (Arbitrum, Base, Polygon, Avalanche, ...).
    #[serde(alias = "ethereum", alias = "eip155")]
    Evm,
}

impl ChainFamily {
    /// Every family, in the order they are presented to the payer.
    pub const ALL: [Self; 2] = [Self::Solana, Self::Evm];

    /// Returns the CAIP-2 namespace of this family.
    #[must_use]
    pub const fn namespace(self) -> &'static str {
        match self {
            Self::Solana => "solana",
            Self::Evm => "eip155",
        }
    }

    /// Resolves a CAIP-2 namespace to its family.
    #[must_use]
    pub fn from_namespace(namespace: &str) -> Option<Self> {
        match namespace {
            "solana" => Some(Self::Solana),
            "eip155" => Some(Self::Evm),
            _ => None,
        }
    }

    /// Returns the payment URI scheme used by wallets of this family.
    #[must_use]
    pub const fn uri_scheme(self) -> &'static str {
        match self {
            Self::Solana => "solana",
            Self::Evm => "ethereum",
        }
    }

    /// Human-readable family name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Solana => "Solana",
            Self::Evm => "EVM",
        }
    }
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A CAIP-2 compliant blockchain identifier.
///
/// The format is `namespace:reference` where:
///
/// - `namespace` identifies the blockchain family (e.g., `eip155`, `solana`)
/// - `reference` identifies the specific chain within that family
///
/// # Serialization
///
/// Serializes to/from a colon-separated string: `"eip155:8453"`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainId {
    namespace: String,
    reference: String,
}

impl ChainId {
    /// Creates a new chain ID from namespace and reference components.
    pub fn new<N: Into<String>, R: Into<String>>(namespace: N, reference: R) -> Self {
        Self {
            namespace: namespace.into(),
            reference: reference.into(),
        }
    }

    /// Returns the namespace component of the chain ID.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the reference component of the chain ID.
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Returns the family this chain ID belongs to, if the namespace is known.
    #[must_use]
    pub fn family(&self) -> Option<ChainFamily> {
        ChainFamily::from_namespace(&self.namespace)
    }

    /// Returns the well-known network name for this chain ID, if any.
    #[must_use]
    pub fn as_network_name(&self) -> Option<&'static str> {
        networks::network_by_chain_id(self).map(|info| info.name)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.reference)
    }
}

/// Error returned when parsing an invalid chain identifier.
///
/// A valid chain ID must be in the format `namespace:reference` where both
/// components are non-empty strings. A valid [`Chain`] must be non-empty.
#[derive(Debug, thiserror::Error)]
#[error("Invalid chain id format {0}")]
pub struct ChainIdFormatError(String);

impl FromStr for ChainId {
    type Err = ChainIdFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((namespace, reference)) if !namespace.is_empty() && !reference.is_empty() => {
                Ok(Self::new(namespace, reference))
            }
            _ => Err(ChainIdFormatError(s.into())),
        }
    }
}

impl Serialize for ChainId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(de::Error::custom)
    }
}

/// A chain as named by a payment link (e.g., `"solana"`, `"ethereum"`, `"base"`).
///
/// Names are normalized to lowercase. A CAIP-2 identifier of a well-known
/// network (`"eip155:8453"`) is accepted on input and normalized to its name
/// (`"base"`). Names that are not in the [`networks`] table are kept verbatim;
/// such chains belong to no [`ChainFamily`] and cannot be paid on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Chain(String);

impl Chain {
    /// Ethereum mainnet.
    pub const ETHEREUM: &'static str = "ethereum";
    /// Solana mainnet.
    pub const SOLANA: &'static str = "solana";

    /// Creates a chain from a network name, normalizing it to lowercase.
    pub fn new<S: AsRef<str>>(name: S) -> Self {
        Self(name.as_ref().trim().to_ascii_lowercase())
    }

    /// Returns the normalized network name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Returns the static network metadata, if this is a well-known chain.
    #[must_use]
    pub fn info(&self) -> Option<&'static NetworkInfo> {
        networks::network_by_name(&self.0)
    }

    /// Returns the family this chain belongs to.
    ///
    /// Membership is decided against the fixed table of known networks only.
    #[must_use]
    pub fn family(&self) -> Option<ChainFamily> {
        self.info().map(|info| info.family)
    }

    /// Returns `true` if the chain is a known member of `family`.
    #[must_use]
    pub fn is_in(&self, family: ChainFamily) -> bool {
        self.family() == Some(family)
    }

    /// Returns the CAIP-2 identifier of a well-known chain.
    #[must_use]
    pub fn chain_id(&self) -> Option<ChainId> {
        self.info().map(NetworkInfo::chain_id)
    }

    /// Returns the Circle CCTP domain, if the chain supports bridged settlement.
    #[must_use]
    pub fn cctp_domain(&self) -> Option<u32> {
        self.info().and_then(|info| info.cctp_domain)
    }

    /// Human-readable chain name ("Ethereum", "Base Sepolia"); unknown chains
    /// display their raw name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.info().map_or(self.0.as_str(), |info| info.display_name)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&NetworkInfo> for Chain {
    fn from(info: &NetworkInfo) -> Self {
        Self(info.name.to_owned())
    }
}

impl FromStr for Chain {
    type Err = ChainIdFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ChainIdFormatError(s.into()));
        }
        if trimmed.contains(':')
            && let Ok(chain_id) = trimmed.parse::<ChainId>()
            && let Some(name) = chain_id.as_network_name()
        {
            return Ok(Self(name.to_owned()));
        }
        Ok(Self::new(trimmed))
    }
}

impl PartialEq<str> for Chain {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Chain {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Serialize for Chain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Chain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_serialize_eip155() {
        let chain_id = ChainId::new("eip155", "1");
        let serialized = serde_json::to_string(&chain_id).unwrap();
        assert_eq!(serialized, "\"eip155:1\"");
    }

    #[test]
    fn test_chain_id_deserialize_solana() {
        let chain_id: ChainId =
            serde_json::from_str("\"solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp\"").unwrap();
        assert_eq!(chain_id.namespace(), "solana");
        assert_eq!(chain_id.reference(), "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp");
        assert_eq!(chain_id.family(), Some(ChainFamily::Solana));
    }

    #[test]
    fn test_chain_id_rejects_missing_parts() {
        assert!("invalid".parse::<ChainId>().is_err());
        assert!(":1".parse::<ChainId>().is_err());
        assert!("eip155:".parse::<ChainId>().is_err());
    }

    #[test]
    fn test_chain_id_as_network_name() {
        assert_eq!(ChainId::new("eip155", "8453").as_network_name(), Some("base"));
        assert_eq!(
            ChainId::new("solana", "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp").as_network_name(),
            Some("solana")
        );
        assert!(ChainId::new("eip155", "999999").as_network_name().is_none());
    }

    #[test]
    fn test_chain_normalizes_case_and_caip2() {
        let chain: Chain = " Ethereum ".parse().unwrap();
        assert_eq!(chain, "ethereum");

        let base: Chain = "eip155:8453".parse().unwrap();
        assert_eq!(base, "base");

        let unknown: Chain = "eip155:999999".parse().unwrap();
        assert_eq!(unknown, "eip155:999999");
        assert!(unknown.family().is_none());
    }

    #[test]
    fn test_chain_rejects_empty() {
        assert!("  ".parse::<Chain>().is_err());
        assert!(serde_json::from_str::<Chain>("\"\"").is_err());
    }

    #[test]
    fn test_chain_family_membership() {
        assert!(Chain::new("solana").is_in(ChainFamily::Solana));
        assert!(Chain::new("solana-devnet").is_in(ChainFamily::Solana));
        for name in ["ethereum", "arbitrum", "base", "polygon", "avalanche"] {
            assert!(Chain::new(name).is_in(ChainFamily::Evm), "{name}");
        }
        assert!(Chain::new("tron").family().is_none());
    }

    #[test]
    fn test_chain_family_aliases() {
        let evm: ChainFamily = serde_json::from_str("\"ethereum\"").unwrap();
        assert_eq!(evm, ChainFamily::Evm);
        let evm: ChainFamily = serde_json::from_str("\"eip155\"").unwrap();
        assert_eq!(evm, ChainFamily::Evm);
        assert_eq!(serde_json::to_string(&ChainFamily::Evm).unwrap(), "\"evm\"");
    }

    #[test]
    fn test_chain_display_name() {
        assert_eq!(Chain::new("base-sepolia").display_name(), "Base Sepolia");
        assert_eq!(Chain::new("tron").display_name(), "tron");
    }
}
