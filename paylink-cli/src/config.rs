//! Command-line and environment configuration.
//!
//! Every option can also be set through the environment (or a `.env` file in
//! the working directory, loaded before parsing):
//!
//! - `PAYLINK_API_URL` - Base URL of the payment-link service
//! - `PAYLINK_TIMEOUT_SECS` - Request timeout in seconds
//! - `PAYLINK_WALLETS` - Injected wallet providers, `;`-separated
//! - `PAYLINK_EVM_CHAIN` - EVM chain picked in the chain selector

use clap::Parser;
use paylink::Chain;
use paylink::wallet::InjectedProvider;
use paylink_http::{PaymentLinkClient, PaymentLinkClientError};
use std::time::Duration;

/// Default service URL for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Opens a payment link and shows how it would be paid.
#[derive(Debug, Clone, Parser)]
#[command(name = "paylink", version, about)]
pub struct Args {
    /// Payment-link id, as found in `/pay/{id}`.
    pub payment_id: String,

    /// Base URL of the payment-link service.
    #[arg(long, env = "PAYLINK_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Request timeout in seconds.
    #[arg(long, env = "PAYLINK_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Injected wallet provider as `global[:flag,flag...]`, e.g.
    /// `solana:isPhantom` or `ethereum:isMetaMask`. Repeatable; order is
    /// discovery order.
    #[arg(long = "wallet", env = "PAYLINK_WALLETS", value_delimiter = ';')]
    pub wallets: Vec<InjectedProvider>,

    /// EVM chain to pay on when an EVM wallet is detected.
    #[arg(long, env = "PAYLINK_EVM_CHAIN")]
    pub evm_chain: Option<Chain>,

    /// Print the checkout as JSON.
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// Builds the HTTP client for the configured service.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentLinkClientError`] if the base URL is invalid.
    pub fn client(&self) -> Result<PaymentLinkClient, PaymentLinkClientError> {
        let client = PaymentLinkClient::try_from(self.api_url.as_str())?;
        Ok(client.with_timeout(Duration::from_secs(self.timeout_secs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["paylink", "pay_123"]).unwrap();
        assert_eq!(args.payment_id, "pay_123");
        assert!(!args.json);
        assert!(args.evm_chain.is_none());
        let client = args.client().unwrap();
        assert_eq!(client.timeout(), &Some(Duration::from_secs(args.timeout_secs)));
    }

    #[test]
    fn test_parses_wallets_and_chain() {
        let args = Args::try_parse_from([
            "paylink",
            "pay_123",
            "--api-url",
            "https://pay.example/",
            "--wallet",
            "ethereum:isMetaMask,isBraveWallet",
            "--wallet",
            "solana:isPhantom",
            "--evm-chain",
            "Base",
            "--json",
        ])
        .unwrap();
        assert_eq!(args.wallets.len(), 2);
        assert_eq!(args.wallets[0].global, "ethereum");
        assert!(args.wallets[0].flags.contains("isBraveWallet"));
        assert_eq!(args.wallets[1].global, "solana");
        assert_eq!(args.evm_chain, Some(Chain::new("base")));
        assert!(args.json);
        assert_eq!(args.client().unwrap().base_url().as_str(), "https://pay.example/");
    }

    #[test]
    fn test_wallet_list_splits_on_semicolon() {
        let args = Args::try_parse_from([
            "paylink",
            "pay_123",
            "--wallet",
            "solana:isPhantom;ethereum:isMetaMask",
        ])
        .unwrap();
        assert_eq!(args.wallets.len(), 2);
    }

    #[test]
    fn test_rejects_bad_api_url() {
        let args =
            Args::try_parse_from(["paylink", "pay_123", "--api-url", "not a url"]).unwrap();
        assert!(args.client().is_err());
    }
}
