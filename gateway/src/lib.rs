//! Rainfall Gateway — server-side core of the rainfall prediction demo.
//!
//! Modular structure:
//! - [`features`] — Form sanitization and one-hot feature vector construction
//! - [`gateway`] — Bounded-timeout forwarding to the prediction service
//! - [`error`] — Gateway error taxonomy and the uniform error envelope
//! - [`prediction`] — Rain verdict and confidence from a prediction response
//! - [`logging`] — Structured JSON logging

pub mod config;
pub mod error;
pub mod features;
pub mod gateway;
pub mod logging;
pub mod prediction;

pub use config::GatewayConfig;
pub use error::{ErrorEnvelope, GatewayError};
pub use features::{FeatureTransformer, FeatureVector, RawFormInput};
pub use gateway::{BackendGateway, HealthReport};
pub use logging::StructuredLogger;
pub use prediction::{PredictionInterpreter, PredictionSummary};
