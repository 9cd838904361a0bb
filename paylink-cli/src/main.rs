//! Command-line checkout for multi-chain USDC payment links.
//!
//! Resolves a payment link, classifies the wallets described on the command
//! line and prints how the payer would be asked to pay: directly, bridged via
//! CCTP, or after picking a wallet.
//!
//! # Usage
//!
//! ```bash
//! # Open a link with a Phantom wallet injected
//! paylink pay_123 --wallet solana:isPhantom
//!
//! # MetaMask on Base, as JSON
//! paylink pay_123 --wallet ethereum:isMetaMask --evm-chain base --json
//!
//! # Configure logging level
//! RUST_LOG=debug paylink pay_123
//! ```
//!
//! # Environment Variables
//!
//! - `PAYLINK_API_URL` - Base URL of the payment-link service (default: `http://localhost:3000`)
//! - `PAYLINK_TIMEOUT_SECS` - Request timeout in seconds (default: `10`)
//! - `PAYLINK_WALLETS` - Injected wallet providers, `;`-separated
//! - `PAYLINK_EVM_CHAIN` - EVM chain to pay on
//! - `RUST_LOG` - Log level filter (default: `info`)
//!
//! Exit status is `0` when the link is payable, `2` when it was not found,
//! `130` when interrupted and `1` on any other failure.

mod config;
mod render;
mod util;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use paylink::wallet::StaticProbe;
use paylink_http::{CheckoutSession, PaymentLinkClient, Resolver, ViewState};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::config::Args;
use crate::render::CheckoutView;
use crate::util::SigDown;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout stays machine-readable with --json.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("Checkout failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let client = args.client()?;
    tracing::info!(
        api_url = %client.base_url(),
        timeout_secs = args.timeout_secs,
        wallets = args.wallets.len(),
        "Loaded configuration"
    );

    let sig_down = SigDown::try_new()?;
    let result = checkout(&args, client, &sig_down.cancellation_token()).await;
    sig_down.shutdown().await;
    result
}

/// Loads the link, prints the checkout and returns the exit status.
async fn checkout(
    args: &Args,
    client: PaymentLinkClient,
    unmount: &CancellationToken,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let resolver = Arc::new(Resolver::new(client));
    let mut session = CheckoutSession::new(resolver, Some(args.payment_id.as_str()))
        .with_unmount_token(unmount);

    let probe = StaticProbe::new(args.wallets.clone());
    let wallet = session.refresh_wallet(&probe);
    tracing::info!(wallet = %wallet, "Detected wallet");
    if let Some(chain) = args.evm_chain.clone() {
        session.select_evm_chain(chain);
    }

    let code = match session.load().await {
        ViewState::Idle => return Err("payment id must not be empty".into()),
        ViewState::Loading => {
            tracing::info!("Checkout abandoned before the payment link loaded");
            return Ok(ExitCode::from(130));
        }
        ViewState::NotFound(_) => ExitCode::from(2),
        ViewState::Ready(_) => ExitCode::SUCCESS,
    };

    let view = CheckoutView::from_session(&session)?;
    print_view(&view, args.json)?;
    Ok(code)
}

#[allow(clippy::print_stdout)]
fn print_view(view: &CheckoutView<'_>, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
    } else {
        print!("{}", view.to_text());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(payment_id: &str) -> Args {
        // Nothing listens on the discard port, so a fetch would fail fast.
        Args::try_parse_from(["paylink", payment_id, "--api-url", "http://127.0.0.1:9"]).unwrap()
    }

    #[tokio::test]
    async fn test_interrupted_checkout_returns_instead_of_exiting() {
        let args = args("pay_123");
        let unmount = CancellationToken::new();
        unmount.cancel();
        let code = checkout(&args, args.client().unwrap(), &unmount)
            .await
            .unwrap();
        assert_eq!(code, ExitCode::from(130));
    }

    #[tokio::test]
    async fn test_blank_id_is_an_error() {
        let args = args("  ");
        let unmount = CancellationToken::new();
        let result = checkout(&args, args.client().unwrap(), &unmount).await;
        assert!(result.is_err());
        assert!(!unmount.is_cancelled());
    }

    #[tokio::test]
    async fn test_run_shuts_down_after_an_error() {
        assert!(run(args("")).await.is_err());
    }
}
