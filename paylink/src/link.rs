//! The payment-link record.
//!
//! A [`PaymentLink`] is what a merchant shares: an amount in USDC, the chains
//! the merchant is willing to receive on, the chain the merchant ultimately
//! settles on, and a receiving address per chain family. Links are fetched
//! once per checkout view and never mutated afterwards.
//!
//! # Wire Format
//!
//! ```json
//! {
//!   "id": "pay_123",
//!   "amount": 25,
//!   "description": "Coffee beans",
//!   "acceptedChains": ["solana", "ethereum"],
//!   "preferredReceiveChain": "solana",
//!   "merchantWallets": { "solana": "7xKX...", "evm": "0x71C7..." }
//! }
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::chain::{Chain, ChainFamily};
use crate::timestamp::UnixTimestamp;

/// Opaque identifier of a payment link. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PaymentId(String);

/// Error returned for an empty payment identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("payment id must not be empty")]
pub struct EmptyPaymentId;

impl PaymentId {
    /// Creates a payment ID, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyPaymentId`] if nothing is left after trimming.
    pub fn new<S: AsRef<str>>(id: S) -> Result<Self, EmptyPaymentId> {
        let id = id.as_ref().trim();
        if id.is_empty() {
            Err(EmptyPaymentId)
        } else {
            Ok(Self(id.to_owned()))
        }
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PaymentId {
    type Err = EmptyPaymentId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for PaymentId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

/// A merchant-created payment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLink {
    /// Unique link identifier; also the correlation reference of payment URIs.
    pub id: PaymentId,

    /// Requested amount in USDC.
    pub amount: Decimal,

    /// Optional text shown above the amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Merchant display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,

    /// Chains the merchant receives on, directly or via bridging.
    pub accepted_chains: Vec<Chain>,

    /// Chain the merchant ultimately holds funds on.
    pub preferred_receive_chain: Chain,

    /// Receiving address per chain family.
    #[serde(default)]
    pub merchant_wallets: BTreeMap<ChainFamily, String>,

    /// Time after which the link can no longer be paid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<UnixTimestamp>,
}

/// A payment-link record that breaks one of the link invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkValidationError {
    /// The amount is zero or negative.
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
    /// No accepted chains.
    #[error("acceptedChains must not be empty")]
    NoAcceptedChains,
    /// The same chain is listed twice.
    #[error("acceptedChains lists {0} more than once")]
    DuplicateChain(Chain),
    /// The preferred chain is neither accepted nor reachable by bridging.
    #[error("preferredReceiveChain {0} is not accepted and cannot be bridged to")]
    UnreachablePreferredChain(Chain),
}

impl PaymentLink {
    /// Checks the link invariants.
    ///
    /// # Errors
    ///
    /// Returns the first [`LinkValidationError`] found.
    pub fn validate(&self) -> Result<(), LinkValidationError> {
        if self.amount <= Decimal::ZERO {
            return Err(LinkValidationError::NonPositiveAmount(self.amount));
        }
        if self.accepted_chains.is_empty() {
            return Err(LinkValidationError::NoAcceptedChains);
        }
        let mut seen = HashSet::with_capacity(self.accepted_chains.len());
        for chain in &self.accepted_chains {
            if !seen.insert(chain) {
                return Err(LinkValidationError::DuplicateChain(chain.clone()));
            }
        }
        if !self.accepts(&self.preferred_receive_chain) && !self.preferred_is_bridgeable() {
            return Err(LinkValidationError::UnreachablePreferredChain(
                self.preferred_receive_chain.clone(),
            ));
        }
        Ok(())
    }

    fn preferred_is_bridgeable(&self) -> bool {
        let Some(preferred) = self.preferred_receive_chain.info() else {
            return false;
        };
        self.accepted_chains
            .iter()
            .filter_map(Chain::info)
            .any(|accepted| accepted.can_bridge_to(preferred))
    }

    /// Returns `true` if the merchant accepts payments on `chain`.
    #[must_use]
    pub fn accepts(&self, chain: &Chain) -> bool {
        self.accepted_chains.contains(chain)
    }

    /// Accepted chains that are known members of `family`, in link order.
    pub fn accepted_in(&self, family: ChainFamily) -> impl Iterator<Item = &Chain> {
        self.accepted_chains.iter().filter(move |c| c.is_in(family))
    }

    /// Returns the merchant's receiving address for `family`.
    #[must_use]
    pub fn merchant_wallet(&self, family: ChainFamily) -> Option<&str> {
        self.merchant_wallets.get(&family).map(String::as_str)
    }

    /// Returns `true` if the link has an expiry that `now` has reached.
    #[must_use]
    pub fn is_expired(&self, now: UnixTimestamp) -> bool {
        self.expires_at.is_some_and(|expiry| expiry.has_passed(now))
    }

    /// The amount as shown to the payer, e.g. `"$25 USDC"`.
    #[must_use]
    pub fn display_amount(&self) -> String {
        format_usdc(self.amount)
    }
}

/// Formats a USDC amount for display.
///
/// Whole amounts have no decimals (`"$25 USDC"`); fractional amounts show at
/// least cents (`"$12.50 USDC"`) and keep any further significant digits.
#[must_use]
pub fn format_usdc(amount: Decimal) -> String {
    let mut shown = amount.normalize();
    if shown.scale() == 1 {
        shown.rescale(2);
    }
    format!("${shown} USDC")
}
