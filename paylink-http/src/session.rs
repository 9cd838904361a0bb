//! Per-view checkout state.
//!
//! A [`CheckoutSession`] lives as long as the checkout view that shows one
//! payment link. It resolves the link at most once, keeps the detected wallet
//! and the payer's EVM chain choice, and derives the presentation mode and
//! payment URI from them.
//!
//! The view may go away while the fetch is in flight. [`CheckoutSession::load`]
//! races the fetch against the session's unmount token; once the token is
//! cancelled a late result is dropped without touching state or notifying.

use paylink::uri::{PaymentUri, PaymentUriError, payment_uri_for};
use paylink::{
    Chain, DetectedWallet, PaymentId, PaymentLink, PresentationMode, WalletProbe, detect,
    dispatch, select_mode_with,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::notify::Notifier;
use crate::resolver::{LinkNotFound, PaymentLinkSource, Resolver};

/// What the checkout view shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// No payment id was supplied; nothing is fetched.
    Idle,
    /// The link is being fetched.
    Loading,
    /// Terminal: the link could not be resolved.
    NotFound(LinkNotFound),
    /// The link is resolved and payable.
    Ready(PaymentLink),
}

impl ViewState {
    /// Returns the resolved link, if any.
    pub const fn link(&self) -> Option<&PaymentLink> {
        match self {
            Self::Ready(link) => Some(link),
            _ => None,
        }
    }

    /// Returns `true` once the state can no longer change.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Idle | Self::NotFound(_) | Self::Ready(_))
    }
}

/// Checkout state for a single view.
#[derive(Debug)]
pub struct CheckoutSession<S, N> {
    resolver: Arc<Resolver<S, N>>,
    payment_id: Option<PaymentId>,
    state: ViewState,
    wallet: DetectedWallet,
    evm_chain: Option<Chain>,
    unmount: CancellationToken,
    fetch_started: bool,
}

impl<S: PaymentLinkSource, N: Notifier> CheckoutSession<S, N> {
    /// Creates a session for the given raw payment id.
    ///
    /// A missing or blank id leaves the session [`ViewState::Idle`].
    pub fn new(resolver: Arc<Resolver<S, N>>, payment_id: Option<&str>) -> Self {
        let payment_id = payment_id.and_then(|raw| PaymentId::new(raw).ok());
        let state = if payment_id.is_some() {
            ViewState::Loading
        } else {
            ViewState::Idle
        };
        Self {
            resolver,
            payment_id,
            state,
            wallet: DetectedWallet::none(),
            evm_chain: None,
            unmount: CancellationToken::new(),
            fetch_started: false,
        }
    }

    /// Sets the initially detected wallet.
    #[must_use]
    pub fn with_wallet(mut self, wallet: DetectedWallet) -> Self {
        self.wallet = wallet;
        self
    }

    /// Ties the session to an outer token, e.g. a shutdown signal. The
    /// session is unmounted when `token` is cancelled.
    #[must_use]
    pub fn with_unmount_token(mut self, token: &CancellationToken) -> Self {
        self.unmount = token.child_token();
        self
    }

    /// Returns the payment id, if one was supplied.
    pub const fn payment_id(&self) -> Option<&PaymentId> {
        self.payment_id.as_ref()
    }

    /// Returns the current view state.
    pub const fn state(&self) -> &ViewState {
        &self.state
    }

    /// Returns the detected wallet.
    pub const fn wallet(&self) -> &DetectedWallet {
        &self.wallet
    }

    /// Returns the EVM chain the payer picked, if any.
    pub const fn selected_evm_chain(&self) -> Option<&Chain> {
        self.evm_chain.as_ref()
    }

    /// Returns `true` until the view is unmounted.
    pub fn is_mounted(&self) -> bool {
        !self.unmount.is_cancelled()
    }

    /// Returns a handle that unmounts the session when cancelled.
    pub fn unmount_handle(&self) -> CancellationToken {
        self.unmount.clone()
    }

    /// Unmounts the view. Any in-flight fetch result is discarded.
    pub fn unmount(&self) {
        self.unmount.cancel();
    }

    /// Resolves the link once and moves to a terminal state.
    ///
    /// Later calls return the current state without fetching again. If the
    /// session is unmounted before the fetch completes the state stays
    /// [`ViewState::Loading`] and no notification is shown.
    pub async fn load(&mut self) -> &ViewState {
        if self.fetch_started || !matches!(self.state, ViewState::Loading) {
            return &self.state;
        }
        let Some(id) = self.payment_id.clone() else {
            return &self.state;
        };
        self.fetch_started = true;

        let token = self.unmount.clone();
        let resolver = Arc::clone(&self.resolver);
        let outcome = tokio::select! {
            biased;
            () = token.cancelled() => None,
            result = resolver.lookup(&id) => Some(result),
        };

        match outcome {
            // A result that lands after unmount is ignored, even if the
            // lookup won the race.
            Some(_) | None if token.is_cancelled() => {
                #[cfg(feature = "telemetry")]
                tracing::debug!(payment_id = %id, "checkout unmounted, discarding payment link result");
            }
            Some(Ok(link)) => self.state = ViewState::Ready(link),
            Some(Err(not_found)) => {
                resolver.report(&not_found);
                self.state = ViewState::NotFound(not_found);
            }
            None => {}
        }
        &self.state
    }

    /// Re-runs wallet detection against `probe`.
    pub fn refresh_wallet<P: WalletProbe + ?Sized>(&mut self, probe: &P) -> &DetectedWallet {
        self.wallet = detect(probe);
        &self.wallet
    }

    /// Records the payer's EVM chain choice.
    ///
    /// The choice is only honoured while the link accepts that chain.
    pub fn select_evm_chain(&mut self, chain: Chain) {
        self.evm_chain = Some(chain);
    }

    /// EVM chains the payer may choose from, once the link is ready.
    pub fn evm_chain_options(&self) -> Vec<Chain> {
        self.state
            .link()
            .map(dispatch::evm_chain_options)
            .unwrap_or_default()
    }

    /// The presentation mode, once the link is ready.
    pub fn mode(&self) -> Option<PresentationMode> {
        let link = self.state.link()?;
        Some(select_mode_with(link, &self.wallet, self.evm_chain.as_ref()))
    }

    /// The payment URI for the current mode, once the link is ready and a
    /// payer chain is known.
    pub fn payment_uri(&self) -> Option<Result<PaymentUri, PaymentUriError>> {
        let link = self.state.link()?;
        let mode = self.mode()?;
        let chain = mode.payer_chain()?;
        Some(payment_uri_for(link, chain))
    }
}
