//! Process-level helpers for the checkout binary.

mod sig_down;

pub use sig_down::SigDown;
