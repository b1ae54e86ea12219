//! Upstream model access: providers, error classification and retry policy

pub mod backoff;
pub mod client;
pub mod error;
pub mod extract;
pub mod openai;
pub mod provider;
pub mod registry;

pub use backoff::{BackoffPolicy, BackoffTier};
pub use client::UpstreamClient;
pub use error::{
    classify, classify_anyhow, classify_dyn, classify_message, ApiError, ErrorKind, UpstreamError,
};
pub use extract::{extract_json_object, parse_analysis};
pub use openai::OpenAiProvider;
pub use provider::Provider;
pub use registry::{ProviderFactory, ProviderRegistry, RegistryError};
pub use tokio_util::sync::CancellationToken;
