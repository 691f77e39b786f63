pub mod discoverer;
pub mod extractor;
pub mod feed;
pub mod ledger;
pub mod monitor;
pub mod outlets;
pub mod publisher;
pub mod render;
pub mod resolver;
pub mod traits;
pub mod verifier;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
