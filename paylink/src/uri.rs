//! Chain-specific payment URIs.
//!
//! A payment view renders the payment as a QR code or deep link that a wallet
//! can open directly. Each family has its own convention:
//!
//! - **Solana Pay** transfer requests:
//!   `solana:<recipient>?amount=<amount>&spl-token=<mint>&reference=<id>[&label=..][&message=..]`
//! - **EIP-681** ERC-20 transfers:
//!   `ethereum:<token>@<chain id>/transfer?address=<recipient>&uint256=<base units>&reference=<id>`
//!
//! Query strings use `application/x-www-form-urlencoded` encoding, which is
//! byte-for-byte what a browser's `URLSearchParams` produces. The `reference`
//! parameter carries the payment-link id so that settlements can be matched
//! back to the link.

use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use url::Url;
use url::form_urlencoded;

use crate::chain::{Chain, ChainFamily, ChainId};
use crate::link::PaymentLink;
use crate::networks::{self, NetworkInfo, USDC_DECIMALS};

/// Fields a payment URI carries, independent of the chain convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Receiving address.
    pub recipient: String,
    /// Amount in whole token units (e.g., `25.5` USDC).
    pub amount: Decimal,
    /// Token mint (Solana) or contract address (EVM).
    pub token: String,
    /// Correlation reference, the payment-link id.
    pub reference: String,
    /// Merchant label, Solana Pay only.
    pub label: Option<String>,
    /// Payment memo, Solana Pay only.
    pub message: Option<String>,
}

/// Errors building or parsing a payment URI.
#[derive(Debug, thiserror::Error)]
pub enum PaymentUriError {
    /// The string is not a URI at all.
    #[error("Invalid URI: {0}")]
    Url(#[from] url::ParseError),
    /// The URI scheme is neither `solana` nor `ethereum`.
    #[error("Unsupported payment URI scheme {0}")]
    UnsupportedScheme(String),
    /// The chain is not a well-known network.
    #[error("Unknown chain {0}")]
    UnknownChain(String),
    /// An address or mint is malformed for its family.
    #[error("Invalid {family} address {address}")]
    InvalidAddress {
        /// Family whose address format was expected.
        family: ChainFamily,
        /// The offending address.
        address: String,
    },
    /// The amount is negative.
    #[error("Amount must not be negative, got {0}")]
    NegativeAmount(Decimal),
    /// The amount has more decimals than the token.
    #[error("Amount {0} has more decimals than USDC supports")]
    TooPrecise(Decimal),
    /// An amount field could not be parsed.
    #[error("Invalid amount {0}")]
    InvalidAmount(String),
    /// A required part of the URI is absent.
    #[error("Missing {0}")]
    Missing(&'static str),
    /// The EIP-681 function is not `transfer`.
    #[error("Unsupported EIP-681 function {0}")]
    UnsupportedFunction(String),
    /// The link has no receiving address for the payer's family.
    #[error("Merchant has no {0} receiving address")]
    MissingMerchantWallet(ChainFamily),
}

/// A validated payment URI for one chain.
///
/// Addresses are normalized on construction (EIP-55 checksums for EVM), so
/// parsing the rendered URI yields exactly [`PaymentUri::request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentUri {
    network: &'static NetworkInfo,
    request: PaymentRequest,
}

impl PaymentUri {
    /// Validates `request` for `chain`.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentUriError`] if the chain is unknown, an address is
    /// malformed, or the amount cannot be represented.
    pub fn new(chain: &Chain, mut request: PaymentRequest) -> Result<Self, PaymentUriError> {
        let network = chain
            .info()
            .ok_or_else(|| PaymentUriError::UnknownChain(chain.to_string()))?;
        if request.amount.is_sign_negative() && !request.amount.is_zero() {
            return Err(PaymentUriError::NegativeAmount(request.amount));
        }
        if request.reference.is_empty() {
            return Err(PaymentUriError::Missing("reference"));
        }
        match network.family {
            ChainFamily::Solana => {
                check_solana_address(&request.recipient)?;
                check_solana_address(&request.token)?;
            }
            ChainFamily::Evm => {
                request.recipient = checksum_evm_address(&request.recipient)?;
                request.token = checksum_evm_address(&request.token)?;
            }
        }
        to_base_units(request.amount)?;
        request.amount = request.amount.normalize();
        Ok(Self { network, request })
    }

    /// Parses a Solana Pay or EIP-681 URI.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentUriError`] for unsupported schemes, unknown chains,
    /// missing parameters and malformed addresses or amounts.
    pub fn parse(uri: &str) -> Result<Self, PaymentUriError> {
        uri.parse()
    }

    /// Returns the chain the payment is made on.
    #[must_use]
    pub fn chain(&self) -> Chain {
        Chain::from(self.network)
    }

    /// Returns the family convention the URI follows.
    #[must_use]
    pub const fn family(&self) -> ChainFamily {
        self.network.family
    }

    /// Returns the carried payment fields.
    #[must_use]
    pub const fn request(&self) -> &PaymentRequest {
        &self.request
    }

    fn render_solana(&self) -> String {
        let r = &self.request;
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("amount", &r.amount.to_string());
        query.append_pair("spl-token", &r.token);
        query.append_pair("reference", &r.reference);
        if let Some(label) = &r.label {
            query.append_pair("label", label);
        }
        if let Some(message) = &r.message {
            query.append_pair("message", message);
        }
        format!("solana:{}?{}", r.recipient, query.finish())
    }

    fn render_evm(&self) -> String {
        let r = &self.request;
        // Validated in `new`.
        let units = to_base_units(r.amount).unwrap_or_default();
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("address", &r.recipient)
            .append_pair("uint256", &units.to_string())
            .append_pair("reference", &r.reference)
            .finish();
        format!(
            "ethereum:{}@{}/transfer?{}",
            r.token, self.network.reference, query
        )
    }
}

impl fmt::Display for PaymentUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.network.family {
            ChainFamily::Solana => f.write_str(&self.render_solana()),
            ChainFamily::Evm => f.write_str(&self.render_evm()),
        }
    }
}

impl FromStr for PaymentUri {
    type Err = PaymentUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s)?;
        match url.scheme() {
            "solana" => parse_solana(&url),
            "ethereum" => parse_evm(&url),
            other => Err(PaymentUriError::UnsupportedScheme(other.to_owned())),
        }
    }
}

fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

fn parse_solana(url: &Url) -> Result<PaymentUri, PaymentUriError> {
    let recipient = url.path();
    if recipient.is_empty() {
        return Err(PaymentUriError::Missing("recipient"));
    }
    let amount = query_value(url, "amount").ok_or(PaymentUriError::Missing("amount"))?;
    let amount =
        Decimal::from_str(&amount).map_err(|_| PaymentUriError::InvalidAmount(amount.clone()))?;
    let token = query_value(url, "spl-token").ok_or(PaymentUriError::Missing("spl-token"))?;
    let reference = query_value(url, "reference").ok_or(PaymentUriError::Missing("reference"))?;

    // The mint tells mainnet USDC from devnet USDC.
    let chain = networks::networks_in(ChainFamily::Solana)
        .find(|n| n.usdc == token)
        .map_or_else(|| Chain::new(Chain::SOLANA), Chain::from);

    PaymentUri::new(
        &chain,
        PaymentRequest {
            recipient: recipient.to_owned(),
            amount,
            token,
            reference,
            label: query_value(url, "label"),
            message: query_value(url, "message"),
        },
    )
}

fn parse_evm(url: &Url) -> Result<PaymentUri, PaymentUriError> {
    let (target, function) = url
        .path()
        .split_once('/')
        .ok_or(PaymentUriError::Missing("function"))?;
    if function != "transfer" {
        return Err(PaymentUriError::UnsupportedFunction(function.to_owned()));
    }
    let (token, chain_reference) = target.split_once('@').unwrap_or((target, "1"));
    let chain_id = ChainId::new(ChainFamily::Evm.namespace(), chain_reference);
    let network = networks::network_by_chain_id(&chain_id)
        .ok_or_else(|| PaymentUriError::UnknownChain(chain_id.to_string()))?;

    let recipient = query_value(url, "address").ok_or(PaymentUriError::Missing("address"))?;
    let units = query_value(url, "uint256").ok_or(PaymentUriError::Missing("uint256"))?;
    let amount = from_base_units(&units)?;
    let reference = query_value(url, "reference").ok_or(PaymentUriError::Missing("reference"))?;

    PaymentUri::new(
        &Chain::from(network),
        PaymentRequest {
            recipient,
            amount,
            token: token.to_owned(),
            reference,
            label: None,
            message: None,
        },
    )
}

fn check_solana_address(address: &str) -> Result<(), PaymentUriError> {
    match bs58::decode(address).into_vec() {
        Ok(bytes) if bytes.len() == 32 => Ok(()),
        _ => Err(PaymentUriError::InvalidAddress {
            family: ChainFamily::Solana,
            address: address.to_owned(),
        }),
    }
}

fn checksum_evm_address(address: &str) -> Result<String, PaymentUriError> {
    Address::from_str(address)
        .map(|a| a.to_checksum(None))
        .map_err(|_| PaymentUriError::InvalidAddress {
            family: ChainFamily::Evm,
            address: address.to_owned(),
        })
}

fn to_base_units(amount: Decimal) -> Result<U256, PaymentUriError> {
    let normalized = amount.normalize();
    if normalized.scale() > USDC_DECIMALS {
        return Err(PaymentUriError::TooPrecise(amount));
    }
    let mantissa = u128::try_from(normalized.mantissa())
        .map_err(|_| PaymentUriError::NegativeAmount(amount))?;
    let factor = 10u128.pow(USDC_DECIMALS - normalized.scale());
    mantissa
        .checked_mul(factor)
        .map(U256::from)
        .ok_or_else(|| PaymentUriError::InvalidAmount(amount.to_string()))
}

fn from_base_units(units: &str) -> Result<Decimal, PaymentUriError> {
    let invalid = || PaymentUriError::InvalidAmount(units.to_owned());
    let value = U256::from_str_radix(units, 10).map_err(|_| invalid())?;
    let value = u128::try_from(value).map_err(|_| invalid())?;
    let value = i128::try_from(value).map_err(|_| invalid())?;
    Decimal::try_from_i128_with_scale(value, USDC_DECIMALS)
        .map(|d| d.normalize())
        .map_err(|_| invalid())
}

/// Builds the payment URI for paying `link` on `payer_chain`.
///
/// The recipient is the merchant's address for the chain's family, the token
/// is the chain's USDC deployment and the reference is the link id.
///
/// # Errors
///
/// Returns [`PaymentUriError`] if the chain is unknown, the merchant has no
/// address for its family, or the resulting request is invalid.
pub fn payment_uri_for(
    link: &PaymentLink,
    payer_chain: &Chain,
) -> Result<PaymentUri, PaymentUriError> {
    let network = payer_chain
        .info()
        .ok_or_else(|| PaymentUriError::UnknownChain(payer_chain.to_string()))?;
    let recipient = link
        .merchant_wallet(network.family)
        .ok_or(PaymentUriError::MissingMerchantWallet(network.family))?;
    PaymentUri::new(
        payer_chain,
        PaymentRequest {
            recipient: recipient.to_owned(),
            amount: link.amount,
            token: network.usdc.to_owned(),
            reference: link.id.to_string(),
            label: link.merchant_name.clone(),
            message: link.description.clone(),
        },
    )
}
