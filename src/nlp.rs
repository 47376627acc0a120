//! Entity extraction
//!
//! Wraps the remote entity-extraction service behind [`EntityExtractor`] and
//! turns its loosely typed output into typed entities and fast-path drafts.

mod entity;
mod error;
mod resolver;
mod wit;

pub use entity::EntityMap;
#[cfg(test)]
pub use entity::EntityPayload;
pub use error::NlpError;
pub use resolver::{resolve, Resolution};
pub use wit::{WitClient, DEFAULT_BASE_URL};

use async_trait::async_trait;
use std::sync::Arc;

/// Source of named entities for a message
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<EntityMap, NlpError>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: EntityExtractor + ?Sized> EntityExtractor for Arc<T> {
    async fn extract(&self, text: &str) -> Result<EntityMap, NlpError> {
        (**self).extract(text).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Extractor that never finds anything; every message takes the keyword path
pub struct NoopExtractor;

#[async_trait]
impl EntityExtractor for NoopExtractor {
    async fn extract(&self, _text: &str) -> Result<EntityMap, NlpError> {
        Ok(EntityMap::new())
    }

    fn name(&self) -> &str {
        "noop"
    }
}

/// Logging wrapper for extractors
pub struct LoggingExtractor {
    inner: Arc<dyn EntityExtractor>,
    name: String,
}

impl LoggingExtractor {
    pub fn new(inner: Arc<dyn EntityExtractor>) -> Self {
        let name = inner.name().to_string();
        Self { inner, name }
    }
}

#[async_trait]
impl EntityExtractor for LoggingExtractor {
    async fn extract(&self, text: &str) -> Result<EntityMap, NlpError> {
        let start = std::time::Instant::now();
        let result = self.inner.extract(text).await;
        let duration = start.elapsed();

        match &result {
            Ok(entities) => {
                tracing::info!(
                    extractor = %self.name,
                    duration_ms = %duration.as_millis(),
                    entities = entities.len(),
                    "Entity extraction completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    extractor = %self.name,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    transient = e.kind.is_transient(),
                    "Entity extraction failed"
                );
            }
        }

        result
    }

    fn name(&self) -> &str {
        &self.name
    }
}
