//! Terminal and JSON rendering of a checkout.

use paylink::uri::PaymentUriError;
use paylink::wallet::InstallOption;
use paylink::{Chain, ChainFamily, DetectedWallet, PaymentLink, PresentationMode, SelectReason};
use paylink_http::{CheckoutSession, LinkNotFound, Notifier, PaymentLinkSource, ViewState};
use serde::Serialize;
use std::fmt::Write as _;

/// Error shown in place of the checkout.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ErrorView {
    /// Short title.
    pub title: &'static str,
    /// Longer message.
    pub message: &'static str,
}

/// Snapshot of everything a checkout view shows.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutView<'a> {
    /// `idle`, `loading`, `notFound` or `ready`.
    pub state: &'static str,
    /// The resolved link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<&'a PaymentLink>,
    /// Formatted amount, e.g. `$25 USDC`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    /// The detected wallet.
    pub wallet: &'a DetectedWallet,
    /// How the link is presented.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<PresentationMode>,
    /// Choices for the EVM chain selector.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub evm_chain_options: Vec<Chain>,
    /// Bridging disclosure for bridged payments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge_disclosure: Option<String>,
    /// Wallets to suggest when none can pay.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub install_options: Vec<&'static InstallOption>,
    /// Payment URI for QR codes and deep links.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_uri: Option<String>,
    /// Terminal error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorView>,
}

impl<'a> CheckoutView<'a> {
    /// Captures the current state of `session`.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentUriError`] if the link is ready but no valid payment
    /// URI can be built for the selected chain.
    pub fn from_session<S: PaymentLinkSource, N: Notifier>(
        session: &'a CheckoutSession<S, N>,
    ) -> Result<Self, PaymentUriError> {
        let state = match session.state() {
            ViewState::Idle => "idle",
            ViewState::Loading => "loading",
            ViewState::NotFound(_) => "notFound",
            ViewState::Ready(_) => "ready",
        };
        let link = session.state().link();
        let mode = session.mode();
        let payment_uri = session
            .payment_uri()
            .transpose()?
            .map(|uri| uri.to_string());
        let error = matches!(session.state(), ViewState::NotFound(_)).then_some(ErrorView {
            title: LinkNotFound::TITLE,
            message: LinkNotFound::MESSAGE,
        });
        Ok(Self {
            state,
            link,
            amount: link.map(PaymentLink::display_amount),
            wallet: session.wallet(),
            bridge_disclosure: mode.as_ref().and_then(PresentationMode::bridge_disclosure),
            install_options: mode
                .as_ref()
                .map(PresentationMode::install_options)
                .unwrap_or_default(),
            mode,
            evm_chain_options: session.evm_chain_options(),
            payment_uri,
            error,
        })
    }

    /// Renders the view as human-readable text.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if let Some(error) = self.error {
            let _ = writeln!(out, "{}", error.title);
            let _ = writeln!(out, "{}", error.message);
            return out;
        }
        let Some(link) = self.link else {
            let _ = writeln!(out, "Checkout {}", self.state);
            return out;
        };

        let _ = writeln!(
            out,
            "{}",
            link.merchant_name.as_deref().unwrap_or("Payment request")
        );
        if let Some(description) = &link.description {
            let _ = writeln!(out, "{description}");
        }
        if let Some(amount) = &self.amount {
            let _ = writeln!(out, "Amount: {amount}");
        }
        let _ = writeln!(out, "Wallet: {}", self.wallet);

        match &self.mode {
            Some(PresentationMode::DirectPay { chain }) => {
                let _ = writeln!(out, "Pay on {}", chain.display_name());
            }
            Some(PresentationMode::BridgedPay { source, .. }) => {
                let _ = writeln!(out, "Pay on {}", source.display_name());
            }
            Some(PresentationMode::SelectWallet {
                solana_chains,
                evm_chains,
                reason,
            }) => {
                match reason {
                    SelectReason::NoWallet => {
                        let _ = writeln!(out, "Connect a wallet to pay.");
                    }
                    SelectReason::UnrecognizedWallet => {
                        let _ = writeln!(
                            out,
                            "Your wallet is not supported. Choose another wallet to pay."
                        );
                    }
                    SelectReason::NoCompatibleChain { family } => {
                        let _ = writeln!(
                            out,
                            "Your {} wallet cannot pay this link. Choose another wallet to pay.",
                            family.display_name()
                        );
                    }
                }
                write_chain_list(&mut out, "Solana", solana_chains);
                write_chain_list(&mut out, "EVM", evm_chains);
            }
            None => {}
        }
        if self.evm_chain_options.len() > 1 && self.wallet.kind.family() == Some(ChainFamily::Evm) {
            write_chain_list(&mut out, "Available EVM chains", &self.evm_chain_options);
        }
        if let Some(disclosure) = &self.bridge_disclosure {
            let _ = writeln!(out, "{disclosure}");
        }
        for option in &self.install_options {
            let _ = writeln!(out, "Install {}: {}", option.name, option.url);
        }
        if let Some(uri) = &self.payment_uri {
            let _ = writeln!(out, "Payment URI: {uri}");
        }
        out
    }
}

fn write_chain_list(out: &mut String, label: &str, chains: &[Chain]) {
    if chains.is_empty() {
        return;
    }
    let names: Vec<&str> = chains.iter().map(Chain::display_name).collect();
    let _ = writeln!(out, "{label}: {}", names.join(", "));
}
