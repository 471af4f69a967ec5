//! Weight source capability.
//!
//! Anything that can produce a weight in grams on request is a
//! [`WeightSource`]. The controller polls sources only through this trait,
//! so scripted sources can stand in for serial balances in tests.
//!
//! The method returns `impl Future + Send` (Rust 1.90 + Edition 2024 RPITIT)
//! rather than being declared `async fn`, so the `Send` bound is part of the
//! contract. Implementors still write `async fn read`.

use crate::error::Result;

/// A named producer of weight readings.
pub trait WeightSource: Send + Sync {
    /// Name the source is addressed by.
    fn name(&self) -> &str;

    /// Take one reading, in grams.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`](crate::error::ReadError) when no valid reading
    /// could be obtained. A failed reading is never reported as zero.
    fn read(&self) -> impl Future<Output = Result<f64>> + Send;
}
