//! Payment-link resolution over HTTP.
//!
//! Provides the fetch side of the checkout flow: an HTTP client for the
//! payment-link service, the resolver that turns every failure into a single
//! terminal "not found" state, and the per-view checkout session tying the
//! resolver, the wallet detector and the dispatcher together.
//!
//! # Modules
//!
//! - [`client`] - HTTP client for `GET /api/payment-links/{id}`
//! - [`notify`] - User-visible error notifications
//! - [`resolver`] - Link resolution with validation and expiry checks
//! - [`session`] - Per-view checkout state machine with unmount cancellation
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod client;
pub mod notify;
pub mod resolver;
pub mod session;

pub use client::{PaymentLinkClient, PaymentLinkClientError};
pub use notify::{Notifier, SilentNotifier, TracingNotifier};
pub use resolver::{LinkNotFound, NotFoundReason, PaymentLinkSource, Resolver};
pub use session::{CheckoutSession, ViewState};
