//! The engine seam: one async trait between query compilation and whatever
//! client actually talks to the search engine.
//!
//! The core never opens connections. Callers hand any [`SearchExecutor`]
//! to the fluent terminals; adapters translate a [`SearchRequest`] into
//! their client's command form and the response into a [`RawReply`].

use crate::{query::SearchRequest, results::RawReply};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// ExecuteError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum ExecuteError {
    #[error("search engine rejected the request: {message}")]
    Engine { message: String },

    #[error("search reply is malformed: {detail}")]
    MalformedReply { detail: String },

    #[error(
        "search engine reported a query syntax error: {message}. A quoted exact \
         phrase containing a stop word fails this way too; change the phrase or \
         adjust the index's stop-word list"
    )]
    Syntax { message: String },

    #[error("search transport failed: {message}")]
    Transport { message: String },
}

impl ExecuteError {
    /// Classify an engine-reported failure. Syntax failures get the
    /// stop-word guidance attached; everything else passes through.
    #[must_use]
    pub fn from_engine(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.to_ascii_lowercase().contains("syntax error") {
            Self::Syntax { message }
        } else {
            Self::Engine { message }
        }
    }

    #[must_use]
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedReply {
            detail: detail.into(),
        }
    }
}

///
/// SearchExecutor
///
/// Object-safe, so `Box<dyn SearchExecutor>` and shared `Arc` clients work.
/// Implementations must not retry on their own; pagination drives repeat
/// calls from above.
///

#[async_trait]
pub trait SearchExecutor: Send + Sync {
    /// Run one search round trip.
    async fn search(&self, request: &SearchRequest) -> Result<RawReply, ExecuteError>;
}

#[async_trait]
impl<T: SearchExecutor + ?Sized> SearchExecutor for &T {
    async fn search(&self, request: &SearchRequest) -> Result<RawReply, ExecuteError> {
        (**self).search(request).await
    }
}

#[async_trait]
impl<T: SearchExecutor + ?Sized> SearchExecutor for Box<T> {
    async fn search(&self, request: &SearchRequest) -> Result<RawReply, ExecuteError> {
        (**self).search(request).await
    }
}

#[async_trait]
impl<T: SearchExecutor + ?Sized> SearchExecutor for Arc<T> {
    async fn search(&self, request: &SearchRequest) -> Result<RawReply, ExecuteError> {
        (**self).search(request).await
    }
}

///
/// TESTS
///
