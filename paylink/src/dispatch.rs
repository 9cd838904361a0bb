//! Presentation mode selection.
//!
//! The dispatcher is a pure function of the loaded [`PaymentLink`], the
//! [`DetectedWallet`] and, for EVM payers, the chain picked in the in-page
//! chain selector. It is re-evaluated on every render and never fails: every
//! input maps onto exactly one [`PresentationMode`].
//!
//! ```text
//! wallet none/unknown ───────────────────────────────▶ SelectWallet
//! wallet solana/evm ─▶ payer chain ─┬─ == preferred ─▶ DirectPay
//!                                   ├─ CCTP route ───▶ BridgedPay
//!                                   └─ otherwise ────▶ SelectWallet (no compatible chain)
//! ```

use serde::Serialize;

use crate::chain::{Chain, ChainFamily};
use crate::link::PaymentLink;
use crate::wallet::{self, DetectedWallet, InstallOption, WalletKind};

/// Chain an EVM payer is assumed to be on when no chain is selected.
pub const DEFAULT_EVM_CHAIN: &str = Chain::ETHEREUM;

/// CCTP domains a bridged payment moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeRoute {
    /// Circle domain of the chain the payer pays on.
    pub source_domain: u32,
    /// Circle domain of the chain the merchant settles on.
    pub destination_domain: u32,
}

/// Why the payer is asked to pick a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SelectReason {
    /// No wallet provider was found.
    NoWallet,
    /// Wallet providers were found but none is recognized.
    UnrecognizedWallet,
    /// The payer's wallet family has no accepted chain with a path to the
    /// merchant's preferred chain.
    NoCompatibleChain {
        /// Family of the detected wallet.
        family: ChainFamily,
    },
}

/// The three ways a checkout view can present a payment link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum PresentationMode {
    /// The payer pays on the chain the merchant settles on.
    DirectPay {
        /// Chain of the payment.
        chain: Chain,
    },
    /// The payer pays on another accepted chain; funds are bridged to the
    /// merchant's preferred chain automatically.
    #[serde(rename_all = "camelCase")]
    BridgedPay {
        /// Chain the payer pays on.
        source: Chain,
        /// Chain the merchant receives on.
        destination: Chain,
        /// CCTP route between the two.
        route: BridgeRoute,
    },
    /// The payer must install or choose a wallet first.
    #[serde(rename_all = "camelCase")]
    SelectWallet {
        /// Accepted Solana-family chains.
        solana_chains: Vec<Chain>,
        /// Accepted EVM-family chains.
        evm_chains: Vec<Chain>,
        /// Why no payment can be offered yet.
        reason: SelectReason,
    },
}

impl PresentationMode {
    /// Returns the chain the payer pays on, if a payment is offered.
    #[must_use]
    pub const fn payer_chain(&self) -> Option<&Chain> {
        match self {
            Self::DirectPay { chain } => Some(chain),
            Self::BridgedPay { source, .. } => Some(source),
            Self::SelectWallet { .. } => None,
        }
    }

    /// Disclosure shown with a bridged payment, naming both chains.
    #[must_use]
    pub fn bridge_disclosure(&self) -> Option<String> {
        match self {
            Self::BridgedPay {
                source,
                destination,
                ..
            } => Some(format!(
                "You pay in USDC on {}. The merchant receives USDC on {}; \
                 your payment is bridged automatically via CCTP.",
                source.display_name(),
                destination.display_name()
            )),
            _ => None,
        }
    }

    /// Wallets worth suggesting for a wallet-selection prompt: one group per
    /// family with at least one accepted chain.
    #[must_use]
    pub fn install_options(&self) -> Vec<&'static InstallOption> {
        let Self::SelectWallet {
            solana_chains,
            evm_chains,
            ..
        } = self
        else {
            return Vec::new();
        };
        let mut options = Vec::new();
        if !solana_chains.is_empty() {
            options.extend(wallet::install_options(ChainFamily::Solana));
        }
        if !evm_chains.is_empty() {
            options.extend(wallet::install_options(ChainFamily::Evm));
        }
        options
    }
}

/// Selects the presentation mode with no EVM chain picked in the selector.
#[must_use]
pub fn select_mode(link: &PaymentLink, wallet: &DetectedWallet) -> PresentationMode {
    select_mode_with(link, wallet, None)
}

/// Selects the presentation mode for `link` and `wallet`.
///
/// `selected_evm_chain` is the in-page chain selector's choice; it only
/// matters for EVM wallets and is ignored unless it is an accepted EVM chain.
/// A wallet family the merchant has no receiving address for cannot pay.
#[must_use]
pub fn select_mode_with(
    link: &PaymentLink,
    wallet: &DetectedWallet,
    selected_evm_chain: Option<&Chain>,
) -> PresentationMode {
    let family = match wallet.kind {
        WalletKind::None => return select_wallet(link, SelectReason::NoWallet),
        WalletKind::Unknown => return select_wallet(link, SelectReason::UnrecognizedWallet),
        WalletKind::Solana => ChainFamily::Solana,
        WalletKind::Evm => ChainFamily::Evm,
    };

    let Some(payer) = payer_chain(link, family, selected_evm_chain) else {
        return select_wallet(link, SelectReason::NoCompatibleChain { family });
    };

    let destination = &link.preferred_receive_chain;
    if payer == destination {
        return PresentationMode::DirectPay {
            chain: payer.clone(),
        };
    }

    match bridge_route(payer, destination) {
        Some(route) => PresentationMode::BridgedPay {
            source: payer.clone(),
            destination: destination.clone(),
            route,
        },
        None => select_wallet(link, SelectReason::NoCompatibleChain { family }),
    }
}

/// Choices offered by the in-page EVM chain selector.
#[must_use]
pub fn evm_chain_options(link: &PaymentLink) -> Vec<Chain> {
    link.accepted_in(ChainFamily::Evm).cloned().collect()
}

fn payer_chain<'a>(
    link: &'a PaymentLink,
    family: ChainFamily,
    selected_evm_chain: Option<&Chain>,
) -> Option<&'a Chain> {
    link.merchant_wallet(family)?;
    let candidates: Vec<&Chain> = link.accepted_in(family).collect();
    let find = |wanted: &Chain| candidates.iter().copied().find(|c| *c == wanted);

    let chosen = match family {
        ChainFamily::Solana => find(&link.preferred_receive_chain),
        ChainFamily::Evm => selected_evm_chain
            .and_then(find)
            .or_else(|| find(&Chain::new(DEFAULT_EVM_CHAIN))),
    };
    chosen.or_else(|| candidates.first().copied())
}

fn bridge_route(source: &Chain, destination: &Chain) -> Option<BridgeRoute> {
    let (from, to) = (source.info()?, destination.info()?);
    if !from.can_bridge_to(to) {
        return None;
    }
    Some(BridgeRoute {
        source_domain: from.cctp_domain?,
        destination_domain: to.cctp_domain?,
    })
}

fn select_wallet(link: &PaymentLink, reason: SelectReason) -> PresentationMode {
    PresentationMode::SelectWallet {
        solana_chains: link.accepted_in(ChainFamily::Solana).cloned().collect(),
        evm_chains: link.accepted_in(ChainFamily::Evm).cloned().collect(),
        reason,
    }
}
