//! The fluent search surface.
//!
//! A [`SearchQuery`] borrows its schema and accumulates a filter tree, a
//! sort, and a projection. Building never fails; field names and kind
//! capabilities are checked when the query compiles, and every failure
//! names the field, its kind, and the refused operation.

use crate::{
    DEFAULT_PAGE_SIZE,
    error::Error,
    executor::SearchExecutor,
    query::{
        compile::{self, Projection, QueryError, SearchRequest, SortDirection},
        filter::{Bound, Compare, Condition, DistanceUnit, Filter},
    },
    results::{self, Entity, SearchPage},
    schema::Schema,
    value::{GeoPoint, Value},
};
use tracing::debug;

///
/// SearchQuery
///
/// Combinator methods splice new predicates under AND or OR relative to
/// whatever is already accumulated; `where_` is the AND splice under a
/// friendlier name for the first predicate.
///

#[derive(Clone, Debug)]
pub struct SearchQuery<'s> {
    schema: &'s Schema,
    root: Option<Filter>,
    sort: Option<(String, SortDirection)>,
    projection: Projection,
}

impl<'s> SearchQuery<'s> {
    #[must_use]
    pub const fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            root: None,
            sort: None,
            projection: Projection::All,
        }
    }

    /// Start a predicate on a field.
    #[must_use]
    pub fn where_(self, field: impl Into<String>) -> FieldCondition<'s> {
        FieldCondition::new(self, field, Combine::And)
    }

    /// Start a predicate joined with AND.
    #[must_use]
    pub fn and(self, field: impl Into<String>) -> FieldCondition<'s> {
        FieldCondition::new(self, field, Combine::And)
    }

    /// Start a predicate joined with OR.
    #[must_use]
    pub fn or(self, field: impl Into<String>) -> FieldCondition<'s> {
        FieldCondition::new(self, field, Combine::Or)
    }

    /// Build a sub-tree and splice it in whole, under AND.
    #[must_use]
    pub fn and_group(self, build: impl FnOnce(Self) -> Self) -> Self {
        let sub = build(Self::new(self.schema));
        self.splice(Combine::And, sub.root)
    }

    /// Build a sub-tree and splice it in whole, under OR.
    #[must_use]
    pub fn or_group(self, build: impl FnOnce(Self) -> Self) -> Self {
        let sub = build(Self::new(self.schema));
        self.splice(Combine::Or, sub.root)
    }

    /// Splice a pre-built filter tree in under AND.
    #[must_use]
    pub fn filter(self, filter: Filter) -> Self {
        self.splice(Combine::And, Some(filter))
    }

    #[must_use]
    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some((field.into(), direction));
        self
    }

    #[must_use]
    pub fn sort_ascending(self, field: impl Into<String>) -> Self {
        self.sort_by(field, SortDirection::Ascending)
    }

    #[must_use]
    pub fn sort_descending(self, field: impl Into<String>) -> Self {
        self.sort_by(field, SortDirection::Descending)
    }

    /// Ask the engine for these fields only, instead of full records.
    #[must_use]
    pub fn return_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Projection::Fields(fields.into_iter().map(Into::into).collect());
        self
    }

    /// The accumulated tree, for inspection.
    #[must_use]
    pub const fn expr(&self) -> Option<&Filter> {
        self.root.as_ref()
    }

    #[must_use]
    pub const fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Compile the tree to query text. An empty tree matches everything.
    pub fn query_string(&self) -> Result<String, QueryError> {
        compile::render_root(self.root.as_ref(), self.schema)
    }

    /// Compile one engine round trip: query text plus window, sort, and
    /// projection, all resolved to engine-facing names.
    pub fn request(&self, offset: u32, count: u32) -> Result<SearchRequest, QueryError> {
        let query = self.query_string()?;
        let sort = self
            .sort
            .as_ref()
            .map(|(field, direction)| compile::resolve_sort(self.schema, field, *direction))
            .transpose()?;
        let projection = compile::resolve_projection(self.schema, &self.projection)?;

        Ok(SearchRequest {
            index: self.schema.index_name().to_string(),
            query,
            offset,
            count,
            sort,
            projection,
        })
    }

    /// Fetch one window of materialized entities.
    pub async fn page<E>(&self, executor: &E, offset: u32, count: u32) -> Result<SearchPage, Error>
    where
        E: SearchExecutor + ?Sized,
    {
        let request = self.request(offset, count)?;
        debug!(
            index = %request.index,
            query = %request.query,
            offset,
            count,
            "executing search window"
        );
        let reply = executor.search(&request).await?;

        results::materialize(reply, self.schema)
    }

    /// Fetch everything, walking windows of `page_size` at strictly
    /// increasing offsets until a short page signals the end.
    pub async fn all<E>(&self, executor: &E, page_size: u32) -> Result<Vec<Entity>, Error>
    where
        E: SearchExecutor + ?Sized,
    {
        // A zero window would never terminate; fall back to the default.
        let size = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };

        let mut entities = Vec::new();
        let mut offset = 0u32;
        loop {
            let page = self.page(executor, offset, size).await?;
            let fetched = page.len();
            entities.extend(page.entities);

            if fetched < size as usize {
                break;
            }
            offset += size;
        }

        debug!(count = entities.len(), "collected all matches");
        Ok(entities)
    }

    /// The first match, under the query's sort if one is set.
    pub async fn first<E>(&self, executor: &E) -> Result<Option<Entity>, Error>
    where
        E: SearchExecutor + ?Sized,
    {
        let page = self.page(executor, 0, 1).await?;
        Ok(page.entities.into_iter().next())
    }

    /// Match count via a zero-row window; no rows cross the wire.
    pub async fn count<E>(&self, executor: &E) -> Result<u64, Error>
    where
        E: SearchExecutor + ?Sized,
    {
        let request = self.request(0, 0)?;
        let reply = executor.search(&request).await?;

        Ok(reply.total)
    }

    pub async fn exists<E>(&self, executor: &E) -> Result<bool, Error>
    where
        E: SearchExecutor + ?Sized,
    {
        Ok(self.count(executor).await? > 0)
    }

    /// The entity with the smallest value in `field`.
    pub async fn min_by<E>(
        &self,
        executor: &E,
        field: impl Into<String>,
    ) -> Result<Option<Entity>, Error>
    where
        E: SearchExecutor + ?Sized,
    {
        self.clone()
            .sort_by(field, SortDirection::Ascending)
            .first(executor)
            .await
    }

    /// The entity with the largest value in `field`.
    pub async fn max_by<E>(
        &self,
        executor: &E,
        field: impl Into<String>,
    ) -> Result<Option<Entity>, Error>
    where
        E: SearchExecutor + ?Sized,
    {
        self.clone()
            .sort_by(field, SortDirection::Descending)
            .first(executor)
            .await
    }

    /// One window of bare ids, overriding the projection to keys-only.
    pub async fn page_of_ids<E>(
        &self,
        executor: &E,
        offset: u32,
        count: u32,
    ) -> Result<(u64, Vec<String>), Error>
    where
        E: SearchExecutor + ?Sized,
    {
        let mut request = self.request(offset, count)?;
        request.projection = Projection::KeysOnly;
        let reply = executor.search(&request).await?;

        results::materialize_ids(&reply, self.schema)
    }

    fn splice(mut self, combine: Combine, incoming: Option<Filter>) -> Self {
        if let Some(filter) = incoming {
            self.root = Some(match (self.root.take(), combine) {
                (None, _) => filter,
                (Some(root), Combine::And) => root.and(filter),
                (Some(root), Combine::Or) => root.or(filter),
            });
        }
        self
    }
}

///
/// FieldCondition
///
/// A predicate under construction: it knows its field, how it will join the
/// query, and whether it is negated. Every comparison method finishes the
/// predicate and hands the query back.
///

#[derive(Clone, Debug)]
pub struct FieldCondition<'s> {
    query: SearchQuery<'s>,
    field: String,
    combine: Combine,
    negated: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Combine {
    And,
    Or,
}

impl<'s> FieldCondition<'s> {
    fn new(query: SearchQuery<'s>, field: impl Into<String>, combine: Combine) -> Self {
        Self {
            query,
            field: field.into(),
            combine,
            negated: false,
        }
    }

    /// Negate the upcoming comparison. Toggling twice restores it.
    #[must_use]
    pub const fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    /// Exact equality.
    #[must_use]
    pub fn eq(self, value: impl Into<Value>) -> SearchQuery<'s> {
        self.push(Compare::Eq(value.into()))
    }

    /// Exact inequality; sugar for `.not().eq(value)`.
    #[must_use]
    pub fn ne(self, value: impl Into<Value>) -> SearchQuery<'s> {
        self.not().eq(value)
    }

    /// Strictly greater than.
    #[must_use]
    pub fn gt(self, value: impl Into<Value>) -> SearchQuery<'s> {
        self.range(Bound::Exclusive(value.into()), Bound::Unbounded)
    }

    /// Greater than or equal.
    #[must_use]
    pub fn gte(self, value: impl Into<Value>) -> SearchQuery<'s> {
        self.range(Bound::Inclusive(value.into()), Bound::Unbounded)
    }

    /// Strictly less than.
    #[must_use]
    pub fn lt(self, value: impl Into<Value>) -> SearchQuery<'s> {
        self.range(Bound::Unbounded, Bound::Exclusive(value.into()))
    }

    /// Less than or equal.
    #[must_use]
    pub fn lte(self, value: impl Into<Value>) -> SearchQuery<'s> {
        self.range(Bound::Unbounded, Bound::Inclusive(value.into()))
    }

    /// Inclusive range over both ends.
    #[must_use]
    pub fn between(self, lower: impl Into<Value>, upper: impl Into<Value>) -> SearchQuery<'s> {
        self.range(Bound::Inclusive(lower.into()), Bound::Inclusive(upper.into()))
    }

    /// Full-text word match.
    #[must_use]
    pub fn matches(self, value: impl Into<String>) -> SearchQuery<'s> {
        self.push(Compare::Matches(value.into()))
    }

    /// Full-text exact-phrase match.
    #[must_use]
    pub fn matches_exactly(self, value: impl Into<String>) -> SearchQuery<'s> {
        self.push(Compare::MatchesExactly(value.into()))
    }

    /// Array membership of one element.
    #[must_use]
    pub fn contains(self, value: impl Into<String>) -> SearchQuery<'s> {
        self.push(Compare::Contains(value.into()))
    }

    /// Array membership of any listed element.
    #[must_use]
    pub fn contains_one_of<I, S>(self, values: I) -> SearchQuery<'s>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Compare::ContainsOneOf(
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// Geo radius around a center point.
    #[must_use]
    pub fn in_radius(self, center: GeoPoint, radius: f64, unit: DistanceUnit) -> SearchQuery<'s> {
        self.push(Compare::InRadius {
            center,
            radius,
            unit,
        })
    }

    fn range(self, lower: Bound, upper: Bound) -> SearchQuery<'s> {
        self.push(Compare::Between { lower, upper })
    }

    fn push(self, compare: Compare) -> SearchQuery<'s> {
        let condition = Condition {
            field: self.field,
            compare,
            negated: self.negated,
        };
        self.query.splice(self.combine, Some(Filter::Leaf(condition)))
    }
}
