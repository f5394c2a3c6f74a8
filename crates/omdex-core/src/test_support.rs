//! Shared fixtures for unit tests.

use crate::{
    executor::{ExecuteError, SearchExecutor},
    query::SearchRequest,
    results::RawReply,
    schema::{FieldKind, FieldSpec, Schema, StorageMode},
};
use async_trait::async_trait;
use std::{collections::VecDeque, sync::Mutex};

/// A schema touching every field kind, with one aliased storage location.
pub fn people_schema(mode: StorageMode) -> Schema {
    Schema::build("person", mode)
        .field(FieldSpec::new("active", FieldKind::Bool))
        .field(FieldSpec::new("age", FieldKind::Number).sortable())
        .field(FieldSpec::new("joined", FieldKind::Date))
        .field(FieldSpec::new("nickname", FieldKind::String))
        .field(FieldSpec::new("bio", FieldKind::Text))
        .field(FieldSpec::new("tags", FieldKind::StringArray))
        .field(FieldSpec::new("home", FieldKind::Point))
        .field(FieldSpec::new("years", FieldKind::Number).with_location("profile.years"))
        .build()
        .expect("fixture schema is valid")
}

///
/// FakeExecutor
///
/// Records every request and answers from a queue of canned replies. An
/// exhausted queue answers with an empty reply, which reads as "no more
/// matches" to pagination.
///

#[derive(Debug, Default)]
pub struct FakeExecutor {
    replies: Mutex<VecDeque<RawReply>>,
    requests: Mutex<Vec<SearchRequest>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: impl IntoIterator<Item = RawReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far, in order.
    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchExecutor for FakeExecutor {
    async fn search(&self, request: &SearchRequest) -> Result<RawReply, ExecuteError> {
        self.requests.lock().unwrap().push(request.clone());

        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(RawReply::empty))
    }
}
