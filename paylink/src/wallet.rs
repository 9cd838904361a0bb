//! Injected wallet detection.
//!
//! Browser wallets announce themselves by injecting a provider object under a
//! well-known global (`window.solana`, `window.ethereum`, ...) with boolean
//! marker flags such as `isPhantom` or `isMetaMask`. The detector never reads
//! globals itself: the environment is handed in through the [`WalletProbe`]
//! port, which keeps detection synchronous, side-effect free and
//! deterministic under test.
//!
//! # Precedence
//!
//! When providers of both families are present the Solana provider wins.
//! Phantom, for instance, injects both `window.solana` and an EVM provider
//! flagged `isPhantom`; classifying it as a Solana wallet keeps the result
//! reproducible across page loads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::chain::ChainFamily;

/// Globals under which Solana wallets inject their provider.
const SOLANA_GLOBALS: &[&str] = &["solana", "phantom", "solflare", "backpack", "glow"];

/// Globals under which EVM wallets inject their provider.
const EVM_GLOBALS: &[&str] = &["ethereum", "coinbasewalletextension", "rabby", "trustwallet"];

/// Marker flags mapped to the wallet name they identify.
const MARKER_NAMES: &[(&str, &str)] = &[
    ("isPhantom", "Phantom"),
    ("isSolflare", "Solflare"),
    ("isBackpack", "Backpack"),
    ("isGlow", "Glow"),
    ("isCoinbaseWallet", "Coinbase Wallet"),
    ("isRabby", "Rabby"),
    ("isBraveWallet", "Brave Wallet"),
    ("isTrust", "Trust Wallet"),
    ("isMetaMask", "MetaMask"),
];

/// Dedicated globals that identify their wallet on their own.
const GLOBAL_NAMES: &[(&str, &str)] = &[
    ("phantom", "Phantom"),
    ("solflare", "Solflare"),
    ("backpack", "Backpack"),
    ("glow", "Glow"),
    ("coinbasewalletextension", "Coinbase Wallet"),
    ("rabby", "Rabby"),
    ("trustwallet", "Trust Wallet"),
];

/// A provider object found in the execution environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectedProvider {
    /// Global the provider is injected under, lowercase (e.g., `"solana"`).
    pub global: String,
    /// Boolean marker flags set to `true` on the provider (e.g., `"isPhantom"`).
    pub flags: BTreeSet<String>,
    /// Name the provider reports about itself, if any.
    pub name: Option<String>,
}

impl InjectedProvider {
    /// Creates a provider found under `global` with no flags.
    pub fn new<S: AsRef<str>>(global: S) -> Self {
        Self {
            global: global.as_ref().trim().to_ascii_lowercase(),
            flags: BTreeSet::new(),
            name: None,
        }
    }

    /// Adds a marker flag.
    #[must_use]
    pub fn with_flag<S: Into<String>>(mut self, flag: S) -> Self {
        self.flags.insert(flag.into());
        self
    }

    /// Sets the self-reported provider name.
    #[must_use]
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the family implied by the injection global.
    #[must_use]
    pub fn family(&self) -> Option<ChainFamily> {
        let global = self.global.as_str();
        if SOLANA_GLOBALS.contains(&global) {
            Some(ChainFamily::Solana)
        } else if EVM_GLOBALS.contains(&global) {
            Some(ChainFamily::Evm)
        } else {
            None
        }
    }

    /// Resolves the human-readable wallet name.
    ///
    /// Marker flags win over the self-reported name, which wins over a
    /// dedicated global.
    #[must_use]
    pub fn wallet_name(&self) -> Option<String> {
        MARKER_NAMES
            .iter()
            .find(|(flag, _)| self.flags.contains(*flag))
            .map(|(_, name)| (*name).to_owned())
            .or_else(|| self.name.clone().filter(|n| !n.trim().is_empty()))
            .or_else(|| {
                GLOBAL_NAMES
                    .iter()
                    .find(|(global, _)| *global == self.global)
                    .map(|(_, name)| (*name).to_owned())
            })
    }
}

/// Error returned when parsing an [`InjectedProvider`] description.
#[derive(Debug, thiserror::Error)]
#[error("Invalid injected provider {0}, expected global[:flag,flag...]")]
pub struct InjectedProviderFormatError(String);

/// Parses `global[:flag,flag...]`, e.g. `solana:isPhantom` or
/// `ethereum:isMetaMask,isBraveWallet`.
impl FromStr for InjectedProvider {
    type Err = InjectedProviderFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (global, flags) = s.split_once(':').unwrap_or((s, ""));
        if global.trim().is_empty() {
            return Err(InjectedProviderFormatError(s.into()));
        }
        let mut provider = Self::new(global);
        for flag in flags.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            provider.flags.insert(flag.to_owned());
        }
        Ok(provider)
    }
}

/// Port through which the detector inspects the execution environment.
pub trait WalletProbe {
    /// Returns every wallet provider currently injected, in discovery order.
    fn injected_providers(&self) -> Vec<InjectedProvider>;
}

impl<T: WalletProbe + ?Sized> WalletProbe for &T {
    fn injected_providers(&self) -> Vec<InjectedProvider> {
        (**self).injected_providers()
    }
}

/// A probe over a fixed set of providers.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe(Vec<InjectedProvider>);

impl StaticProbe {
    /// Creates a probe reporting exactly `providers`.
    #[must_use]
    pub const fn new(providers: Vec<InjectedProvider>) -> Self {
        Self(providers)
    }
}

impl FromIterator<InjectedProvider> for StaticProbe {
    fn from_iter<I: IntoIterator<Item = InjectedProvider>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl WalletProbe for StaticProbe {
    fn injected_providers(&self) -> Vec<InjectedProvider> {
        self.0.clone()
    }
}

/// A probe for environments without any wallet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProviders;

impl WalletProbe for NoProviders {
    fn injected_providers(&self) -> Vec<InjectedProvider> {
        Vec::new()
    }
}

/// Classification of the environment's wallet capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    /// No wallet provider is present.
    None,
    /// A Solana wallet is present.
    Solana,
    /// An EVM wallet is present.
    Evm,
    /// Providers are present but none is recognized.
    Unknown,
}

impl WalletKind {
    /// Returns the chain family a payer with this wallet pays from.
    #[must_use]
    pub const fn family(self) -> Option<ChainFamily> {
        match self {
            Self::Solana => Some(ChainFamily::Solana),
            Self::Evm => Some(ChainFamily::Evm),
            Self::None | Self::Unknown => None,
        }
    }
}

/// Result of one detection pass. Re-detection replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedWallet {
    /// Wallet classification.
    #[serde(rename = "type")]
    pub kind: WalletKind,
    /// Human-readable wallet name, when known (e.g., "Phantom").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl DetectedWallet {
    /// No wallet found.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            kind: WalletKind::None,
            name: None,
        }
    }

    /// A wallet of `kind`, optionally named.
    #[must_use]
    pub const fn new(kind: WalletKind, name: Option<String>) -> Self {
        Self { kind, name }
    }

    /// Returns `true` if the payer can pay from this wallet.
    #[must_use]
    pub const fn is_usable(&self) -> bool {
        self.kind.family().is_some()
    }
}

impl fmt::Display for DetectedWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.name) {
            (WalletKind::None, _) => f.write_str("no wallet"),
            (kind, Some(name)) => write!(f, "{name} ({kind:?})"),
            (kind, None) => write!(f, "{kind:?} wallet"),
        }
    }
}

/// Classifies the wallet capability reported by `probe`.
///
/// Solana providers take precedence over EVM providers; within a family the
/// first provider in discovery order wins. Finding no provider is not an
/// error and yields [`WalletKind::None`].
#[must_use]
pub fn detect<P: WalletProbe + ?Sized>(probe: &P) -> DetectedWallet {
    let providers = probe.injected_providers();
    let detected = classify(&providers);

    #[cfg(feature = "telemetry")]
    tracing::debug!(
        providers = providers.len(),
        kind = ?detected.kind,
        name = detected.name.as_deref(),
        "paylink.wallet.detected"
    );

    detected
}

fn classify(providers: &[InjectedProvider]) -> DetectedWallet {
    if providers.is_empty() {
        return DetectedWallet::none();
    }
    for (family, kind) in [
        (ChainFamily::Solana, WalletKind::Solana),
        (ChainFamily::Evm, WalletKind::Evm),
    ] {
        if let Some(provider) = providers.iter().find(|p| p.family() == Some(family)) {
            return DetectedWallet::new(kind, provider.wallet_name());
        }
    }
    DetectedWallet::new(WalletKind::Unknown, None)
}

/// Detector bound to a probe; [`WalletDetector::detect`] re-inspects the
/// environment on every call and is only meant to be invoked on explicit
/// user action.
#[derive(Debug, Clone)]
pub struct WalletDetector<P> {
    probe: P,
}

impl<P: WalletProbe> WalletDetector<P> {
    /// Creates a detector over `probe`.
    pub const fn new(probe: P) -> Self {
        Self { probe }
    }

    /// Runs one detection pass.
    #[must_use]
    pub fn detect(&self) -> DetectedWallet {
        detect(&self.probe)
    }

    /// Returns the underlying probe.
    pub const fn probe(&self) -> &P {
        &self.probe
    }
}

/// A wallet the payer can install for a given family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InstallOption {
    /// Wallet name.
    pub name: &'static str,
    /// Download page.
    pub url: &'static str,
    /// Family the wallet pays from.
    pub family: ChainFamily,
}

static INSTALL_OPTIONS: &[InstallOption] = &[
    InstallOption {
        name: "Phantom",
        url: "https://phantom.app/",
        family: ChainFamily::Solana,
    },
    InstallOption {
        name: "Solflare",
        url: "https://solflare.com/",
        family: ChainFamily::Solana,
    },
    InstallOption {
        name: "MetaMask",
        url: "https://metamask.io/download/",
        family: ChainFamily::Evm,
    },
    InstallOption {
        name: "Coinbase Wallet",
        url: "https://www.coinbase.com/wallet",
        family: ChainFamily::Evm,
    },
];

/// Wallets suggested to a payer without one, for `family`.
pub fn install_options(family: ChainFamily) -> impl Iterator<Item = &'static InstallOption> {
    INSTALL_OPTIONS.iter().filter(move |o| o.family == family)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phantom() -> InjectedProvider {
        InjectedProvider::new("solana").with_flag("isPhantom")
    }

    fn metamask() -> InjectedProvider {
        InjectedProvider::new("ethereum").with_flag("isMetaMask")
    }

    #[test]
    fn test_no_providers_is_none() {
        assert_eq!(detect(&NoProviders), DetectedWallet::none());
        assert!(!detect(&NoProviders).is_usable());
    }

    #[test]
    fn test_detects_phantom() {
        let wallet = detect(&StaticProbe::new(vec![phantom()]));
        assert_eq!(wallet.kind, WalletKind::Solana);
        assert_eq!(wallet.name.as_deref(), Some("Phantom"));
    }

    #[test]
    fn test_detects_metamask() {
        let wallet = detect(&StaticProbe::new(vec![metamask()]));
        assert_eq!(wallet.kind, WalletKind::Evm);
        assert_eq!(wallet.name.as_deref(), Some("MetaMask"));
    }

    #[test]
    fn test_solana_wins_regardless_of_order() {
        let probe = StaticProbe::new(vec![metamask(), phantom()]);
        let wallet = detect(&probe);
        assert_eq!(wallet.kind, WalletKind::Solana);
        assert_eq!(wallet.name.as_deref(), Some("Phantom"));
        // Repeated detection is stable.
        assert_eq!(detect(&probe), wallet);
    }

    #[test]
    fn test_unrecognized_global_is_unknown() {
        let probe = StaticProbe::new(vec![InjectedProvider::new("tronLink")]);
        assert_eq!(detect(&probe).kind, WalletKind::Unknown);
    }

    #[test]
    fn test_brave_flags_metamask_compat() {
        // Brave sets isMetaMask for compatibility alongside isBraveWallet.
        let brave = InjectedProvider::new("ethereum")
            .with_flag("isMetaMask")
            .with_flag("isBraveWallet");
        assert_eq!(brave.wallet_name().as_deref(), Some("Brave Wallet"));
    }

    #[test]
    fn test_name_fallbacks() {
        let named = InjectedProvider::new("ethereum").with_name("Frame");
        assert_eq!(named.wallet_name().as_deref(), Some("Frame"));
        let dedicated = InjectedProvider::new("solflare");
        assert_eq!(dedicated.wallet_name().as_deref(), Some("Solflare"));
        assert!(InjectedProvider::new("ethereum").wallet_name().is_none());
    }

    #[test]
    fn test_parse_provider_description() {
        let provider: InjectedProvider = "ethereum:isMetaMask, isBraveWallet".parse().unwrap();
        assert_eq!(provider.global, "ethereum");
        assert!(provider.flags.contains("isMetaMask"));
        assert!(provider.flags.contains("isBraveWallet"));

        let bare: InjectedProvider = "Phantom".parse().unwrap();
        assert_eq!(bare.global, "phantom");
        assert!(bare.flags.is_empty());

        assert!(":isPhantom".parse::<InjectedProvider>().is_err());
    }

    #[test]
    fn test_detector_redetects_on_demand() {
        let detector = WalletDetector::new(StaticProbe::from_iter([metamask()]));
        assert_eq!(detector.detect().kind, WalletKind::Evm);
        assert_eq!(detector.probe().injected_providers().len(), 1);
    }

    #[test]
    fn test_install_options_per_family() {
        let solana: Vec<_> = install_options(ChainFamily::Solana).map(|o| o.name).collect();
        assert_eq!(solana, vec!["Phantom", "Solflare"]);
        let evm: Vec<_> = install_options(ChainFamily::Evm).map(|o| o.name).collect();
        assert_eq!(evm, vec!["MetaMask", "Coinbase Wallet"]);
    }

    #[test]
    fn test_detected_wallet_wire_format() {
        let wallet: DetectedWallet =
            serde_json::from_str(r#"{"type":"solana","name":"Phantom"}"#).unwrap();
        assert_eq!(wallet.kind, WalletKind::Solana);
        let none = serde_json::to_string(&DetectedWallet::none()).unwrap();
        assert_eq!(none, r#"{"type":"none"}"#);
    }
}
