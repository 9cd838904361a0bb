//! Payment-link resolution.
//!
//! [`Resolver`] fetches a link from a [`PaymentLinkSource`], checks its
//! invariants and expiry, and collapses every failure into a single
//! [`LinkNotFound`] outcome. The payer never sees why a link failed; the
//! [`NotFoundReason`] is kept for logs and tests.

use paylink::timestamp::UnixTimestamp;
use paylink::{PaymentId, PaymentLink};
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::notify::{Notifier, TracingNotifier};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Where payment links come from.
pub trait PaymentLinkSource: Send + Sync {
    /// Error returned by [`Self::fetch_link`].
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetches the link with the given id.
    fn fetch_link<'a>(
        &'a self,
        id: &'a PaymentId,
    ) -> BoxFuture<'a, Result<PaymentLink, Self::Error>>;

    /// Maps a fetch error onto a not-found reason.
    fn classify(_error: &Self::Error) -> NotFoundReason {
        NotFoundReason::Unavailable
    }
}

impl<T: PaymentLinkSource + ?Sized> PaymentLinkSource for std::sync::Arc<T> {
    type Error = T::Error;

    fn fetch_link<'a>(
        &'a self,
        id: &'a PaymentId,
    ) -> BoxFuture<'a, Result<PaymentLink, Self::Error>> {
        (**self).fetch_link(id)
    }

    fn classify(error: &Self::Error) -> NotFoundReason {
        T::classify(error)
    }
}

/// Why a link could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotFoundReason {
    /// The service has no link with this id.
    Missing,
    /// The link exists but its expiry has passed.
    Expired,
    /// The record is malformed or violates a link invariant.
    Invalid,
    /// The service could not be reached or failed.
    Unavailable,
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Missing => "missing",
            Self::Expired => "expired",
            Self::Invalid => "invalid",
            Self::Unavailable => "unavailable",
        };
        f.write_str(s)
    }
}

/// Terminal failure of a link resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{title}: {message}", title = Self::TITLE, message = Self::MESSAGE)]
pub struct LinkNotFound {
    /// The id that was looked up.
    pub payment_id: PaymentId,
    /// Diagnostic reason, never shown to the payer.
    pub reason: NotFoundReason,
}

impl LinkNotFound {
    /// Title shown to the payer.
    pub const TITLE: &'static str = "Payment Not Found";
    /// Message shown to the payer.
    pub const MESSAGE: &'static str = "This payment link is invalid or has expired";

    /// Creates a new not-found outcome.
    #[must_use]
    pub const fn new(payment_id: PaymentId, reason: NotFoundReason) -> Self {
        Self { payment_id, reason }
    }
}

/// Resolves payment ids into validated, unexpired links.
pub struct Resolver<S, N = TracingNotifier> {
    source: S,
    notifier: N,
    clock: fn() -> UnixTimestamp,
}

impl<S: fmt::Debug, N: fmt::Debug> fmt::Debug for Resolver<S, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("source", &self.source)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

impl<S: PaymentLinkSource> Resolver<S, TracingNotifier> {
    /// Creates a resolver that reports failures through `tracing`.
    pub const fn new(source: S) -> Self {
        Self::with_notifier(source, TracingNotifier)
    }
}

impl<S: PaymentLinkSource, N: Notifier> Resolver<S, N> {
    /// Creates a resolver with a custom notifier.
    pub const fn with_notifier(source: S, notifier: N) -> Self {
        Self {
            source,
            notifier,
            clock: UnixTimestamp::now,
        }
    }

    /// Replaces the clock used for expiry checks.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> UnixTimestamp) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the underlying source.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Returns the notifier.
    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Fetches and checks a link without notifying anyone.
    ///
    /// Issues exactly one fetch.
    ///
    /// # Errors
    ///
    /// Returns [`LinkNotFound`] if the fetch fails, the record is invalid or
    /// belongs to another id, or the link has expired.
    pub async fn lookup(&self, id: &PaymentId) -> Result<PaymentLink, LinkNotFound> {
        let link = match self.source.fetch_link(id).await {
            Ok(link) => link,
            Err(error) => {
                let reason = S::classify(&error);
                #[cfg(feature = "telemetry")]
                tracing::debug!(payment_id = %id, %reason, error = %error, "payment link fetch failed");
                #[cfg(not(feature = "telemetry"))]
                let _ = error;
                return Err(LinkNotFound::new(id.clone(), reason));
            }
        };
        if &link.id != id {
            #[cfg(feature = "telemetry")]
            tracing::debug!(payment_id = %id, returned = %link.id, "service returned a different link");
            return Err(LinkNotFound::new(id.clone(), NotFoundReason::Invalid));
        }
        if let Err(error) = link.validate() {
            #[cfg(feature = "telemetry")]
            tracing::debug!(payment_id = %id, %error, "payment link failed validation");
            #[cfg(not(feature = "telemetry"))]
            let _ = error;
            return Err(LinkNotFound::new(id.clone(), NotFoundReason::Invalid));
        }
        if link.is_expired((self.clock)()) {
            return Err(LinkNotFound::new(id.clone(), NotFoundReason::Expired));
        }
        Ok(link)
    }

    /// Resolves a link, notifying the payer once on failure.
    ///
    /// # Errors
    ///
    /// Returns [`LinkNotFound`] under the same conditions as [`Self::lookup`].
    #[cfg_attr(
        feature = "telemetry",
        tracing::instrument(name = "paylink.resolve", skip_all, fields(payment_id = %id))
    )]
    pub async fn resolve(&self, id: &PaymentId) -> Result<PaymentLink, LinkNotFound> {
        let result = self.lookup(id).await;
        if let Err(not_found) = &result {
            self.report(not_found);
        }
        result
    }

    /// Shows the not-found notification for a failed lookup.
    pub fn report(&self, not_found: &LinkNotFound) {
        #[cfg(feature = "telemetry")]
        tracing::info!(
            payment_id = %not_found.payment_id,
            reason = %not_found.reason,
            "payment link not found"
        );
        #[cfg(not(feature = "telemetry"))]
        let _ = not_found;
        self.notifier.error(LinkNotFound::TITLE, LinkNotFound::MESSAGE);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::notify::SilentNotifier;
    use paylink::{Chain, ChainFamily};
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records every notification.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingNotifier {
        pub(crate) shown: Mutex<Vec<(String, String)>>,
    }

    impl RecordingNotifier {
        pub(crate) fn count(&self) -> usize {
            self.shown.lock().unwrap().len()
        }
    }

    impl Notifier for RecordingNotifier {
        fn error(&self, title: &str, message: &str) {
            self.shown
                .lock()
                .unwrap()
                .push((title.to_owned(), message.to_owned()));
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("offline")]
    pub(crate) struct Offline;

    /// Serves a fixed answer and counts fetches.
    #[derive(Debug)]
    pub(crate) struct FixedSource {
        pub(crate) link: Option<PaymentLink>,
        pub(crate) fetches: AtomicUsize,
    }

    impl FixedSource {
        pub(crate) fn new(link: Option<PaymentLink>) -> Self {
            Self {
                link,
                fetches: AtomicUsize::new(0),
            }
        }
    }

    impl PaymentLinkSource for FixedSource {
        type Error = Offline;

        fn fetch_link<'a>(
            &'a self,
            _id: &'a PaymentId,
        ) -> BoxFuture<'a, Result<PaymentLink, Self::Error>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let result = self.link.clone().ok_or(Offline);
            Box::pin(async move { result })
        }
    }

    pub(crate) fn sample_link(id: &str) -> PaymentLink {
        PaymentLink {
            id: PaymentId::new(id).unwrap(),
            amount: Decimal::from(25),
            description: Some("Coffee".into()),
            merchant_name: None,
            accepted_chains: vec![Chain::new("solana"), Chain::new("ethereum")],
            preferred_receive_chain: Chain::new("solana"),
            merchant_wallets: BTreeMap::from([(
                ChainFamily::Solana,
                "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU".to_owned(),
            )]),
            expires_at: None,
        }
    }

    fn id(s: &str) -> PaymentId {
        PaymentId::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_resolves_valid_link() {
        let notifier = RecordingNotifier::default();
        let source = FixedSource::new(Some(sample_link("pay_123")));
        let resolver = Resolver::with_notifier(source, &notifier);

        let link = resolver.resolve(&id("pay_123")).await.unwrap();
        assert_eq!(link.id.as_str(), "pay_123");
        assert_eq!(resolver.source().fetches.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_resolve_twice_gives_same_link() {
        let notifier = RecordingNotifier::default();
        let source = FixedSource::new(Some(sample_link("pay_123")));
        let resolver = Resolver::with_notifier(source, &notifier);

        let first = resolver.resolve(&id("pay_123")).await.unwrap();
        let second = resolver.resolve(&id("pay_123")).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(resolver.source().fetches.load(Ordering::SeqCst), 2);
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_resolve_twice_gives_same_failure() {
        let notifier = RecordingNotifier::default();
        let resolver = Resolver::with_notifier(FixedSource::new(None), &notifier);

        let first = resolver.resolve(&id("pay_123")).await.unwrap_err();
        let second = resolver.resolve(&id("pay_123")).await.unwrap_err();
        assert_eq!(first, second);
        assert_eq!(notifier.count(), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_notifies_once() {
        let notifier = RecordingNotifier::default();
        let resolver = Resolver::with_notifier(FixedSource::new(None), &notifier);

        let err = resolver.resolve(&id("nonexistent")).await.unwrap_err();
        assert_eq!(err.reason, NotFoundReason::Unavailable);
        assert_eq!(err.payment_id.as_str(), "nonexistent");
        assert_eq!(resolver.source().fetches.load(Ordering::SeqCst), 1);

        let shown = notifier.shown.lock().unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].0, "Payment Not Found");
        assert_eq!(shown[0].1, "This payment link is invalid or has expired");
    }

    #[tokio::test]
    async fn test_expired_link_is_not_found() {
        let notifier = RecordingNotifier::default();
        let mut link = sample_link("pay_123");
        link.expires_at = Some(UnixTimestamp::from_secs(1_000));
        let resolver = Resolver::with_notifier(FixedSource::new(Some(link)), &notifier)
            .with_clock(|| UnixTimestamp::from_secs(2_000));

        let err = resolver.resolve(&id("pay_123")).await.unwrap_err();
        assert_eq!(err.reason, NotFoundReason::Expired);
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn test_unexpired_link_resolves() {
        let mut link = sample_link("pay_123");
        link.expires_at = Some(UnixTimestamp::from_secs(3_000));
        let resolver = Resolver::with_notifier(FixedSource::new(Some(link)), SilentNotifier)
            .with_clock(|| UnixTimestamp::from_secs(2_000));
        assert!(resolver.resolve(&id("pay_123")).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_link_is_not_found() {
        let notifier = RecordingNotifier::default();
        let mut link = sample_link("pay_123");
        link.accepted_chains.clear();
        let resolver = Resolver::with_notifier(FixedSource::new(Some(link)), &notifier);

        let err = resolver.resolve(&id("pay_123")).await.unwrap_err();
        assert_eq!(err.reason, NotFoundReason::Invalid);
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn test_mismatched_id_is_invalid() {
        let resolver =
            Resolver::with_notifier(FixedSource::new(Some(sample_link("other"))), SilentNotifier);
        let err = resolver.resolve(&id("pay_123")).await.unwrap_err();
        assert_eq!(err.reason, NotFoundReason::Invalid);
    }

    #[tokio::test]
    async fn test_lookup_does_not_notify() {
        let notifier = RecordingNotifier::default();
        let resolver = Resolver::with_notifier(FixedSource::new(None), &notifier);
        assert!(resolver.lookup(&id("pay_123")).await.is_err());
        assert_eq!(notifier.count(), 0);
    }

    #[test]
    fn test_not_found_message() {
        let err = LinkNotFound::new(id("pay_123"), NotFoundReason::Missing);
        assert_eq!(
            err.to_string(),
            "Payment Not Found: This payment link is invalid or has expired"
        );
    }
}
