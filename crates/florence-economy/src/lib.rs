//! # florence-economy
//!
//! Pure decision logic for the Florence token economy: periodic grants and
//! per-content charges, daily streak transitions, and payment-proof
//! verification. Everything here is a function of `(now, state, config)` —
//! no clocks, no I/O — so each rule is unit-testable in isolation.

mod payment;
mod streak;
mod tokens;

pub use payment::{PaymentVerifier, Verification};
pub use streak::{StreakOutcome, StreakPolicy};
pub use tokens::{ChargeRefusal, TokenPolicy};
