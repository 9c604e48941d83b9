//! Deterministic random number generation
//!
//! Uses xorshift64* for fast, reproducible randomness.
//! CRITICAL: target shuffles and jittered schedule offsets MUST draw from the
//! simulator's single `SimRng`. Any other source breaks seed replay.

mod xorshift;

pub use xorshift::SimRng;
