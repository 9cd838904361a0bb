#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for multi-chain USDC payment links.
//!
//! A merchant shares a payment link that names an amount, the chains it is
//! willing to receive on, and the chain it ultimately settles on. A payer opens
//! the link with whatever wallet their environment provides. This crate holds the
//! I/O-free parts of that checkout flow:
//!
//! 1. the [`wallet`] detector classifies the injected wallet providers,
//! 2. the [`dispatch`]er maps the link and the detected wallet onto one of
//!    three presentation modes (direct, bridged, or wallet selection),
//! 3. the [`uri`] module renders the chain-specific payment URI shown as a
//!    QR code or deep link.
//!
//! Fetching the link itself lives in `paylink-http`.
//!
//! # Modules
//!
//! - [`chain`] - Chain families, CAIP-2 chain IDs and payment-link chain names
//! - [`dispatch`] - Presentation mode selection
//! - [`link`] - The payment-link record and its invariants
//! - [`networks`] - Registry of well-known networks, USDC deployments and CCTP domains
//! - [`timestamp`] - Unix timestamps used for link expiry
//! - [`uri`] - Solana Pay and EIP-681 payment URIs
//! - [`wallet`] - Injected wallet detection
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod chain;
pub mod dispatch;
pub mod link;
pub mod networks;
pub mod timestamp;
pub mod uri;
pub mod wallet;

pub use chain::{Chain, ChainFamily, ChainId};
pub use dispatch::{PresentationMode, SelectReason, select_mode, select_mode_with};
pub use link::{PaymentId, PaymentLink};
pub use wallet::{DetectedWallet, WalletKind, WalletProbe, detect};
