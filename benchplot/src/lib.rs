pub mod aggregate;
pub mod cleaner;
pub mod cli;
pub mod config;
pub mod data;
pub mod defaults;
pub mod loader;
pub mod metrics;
pub mod pipeline;
pub mod reporting;
pub mod stats;

// Fixtures shared by unit tests, integration tests and benchmarks
#[doc(hidden)]
#[cfg(any(test, doctest, feature = "test-helpers"))]
pub mod test_helpers;
