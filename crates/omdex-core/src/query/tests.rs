use super::*;

use crate::{
    DEFAULT_PAGE_SIZE,
    error::Error,
    executor::{ExecuteError, SearchExecutor},
    results::{RawPayload, RawReply, RawRow},
    schema::{FieldKind, SchemaError, StorageMode},
    test_support::{FakeExecutor, people_schema},
    value::{GeoPoint, Timestamp},
};
use async_trait::async_trait;
use proptest::prelude::*;

fn flat_rows(ids: &[&str]) -> Vec<RawRow> {
    ids.iter()
        .map(|id| RawRow::new(format!("person:{id}"), RawPayload::Fields(Vec::new())))
        .collect()
}

fn reply(total: u64, ids: &[&str]) -> RawReply {
    RawReply {
        total,
        rows: flat_rows(ids),
    }
}

#[test]
fn renders_wildcard_for_empty_query() {
    let schema = people_schema(StorageMode::Flat);

    assert_eq!(schema.search().query_string().unwrap(), "*");
    assert!(schema.search().expr().is_none());
}

#[test]
fn renders_eq_fragments_flat() {
    let schema = people_schema(StorageMode::Flat);
    let query = |q: SearchQuery<'_>| q.query_string().unwrap();

    assert_eq!(
        query(schema.search().where_("active").eq(true)),
        "(@active:{1})"
    );
    assert_eq!(
        query(schema.search().where_("active").eq(false)),
        "(@active:{0})"
    );
    assert_eq!(query(schema.search().where_("age").eq(30)), "(@age:[30 30])");
    assert_eq!(
        query(schema.search().where_("joined").eq(Timestamp::from_seconds(120))),
        "(@joined:[120 120])"
    );
    assert_eq!(
        query(schema.search().where_("nickname").eq("ada lovelace")),
        "(@nickname:{ada\\ lovelace})"
    );
}

#[test]
fn renders_eq_fragments_document() {
    let schema = people_schema(StorageMode::Document);

    assert_eq!(
        schema.search().where_("active").eq(true).query_string().unwrap(),
        "(@active:{true})"
    );
    assert_eq!(
        schema.search().where_("active").eq(false).query_string().unwrap(),
        "(@active:{false})"
    );
}

#[test]
fn renders_range_fragments() {
    let schema = people_schema(StorageMode::Flat);
    let query = |q: SearchQuery<'_>| q.query_string().unwrap();

    assert_eq!(
        query(schema.search().where_("age").gt(21)),
        "(@age:[(21 +inf])"
    );
    assert_eq!(
        query(schema.search().where_("age").gte(21)),
        "(@age:[21 +inf])"
    );
    assert_eq!(
        query(schema.search().where_("age").lt(21)),
        "(@age:[-inf (21])"
    );
    assert_eq!(
        query(schema.search().where_("age").lte(21)),
        "(@age:[-inf 21])"
    );
    assert_eq!(
        query(schema.search().where_("age").between(18, 65)),
        "(@age:[18 65])"
    );
    assert_eq!(
        query(schema.search().where_("age").between(0.5, 2.5)),
        "(@age:[0.5 2.5])"
    );

    // Dates take timestamps or bare epoch-second numbers.
    assert_eq!(
        query(
            schema
                .search()
                .where_("joined")
                .between(Timestamp::from_seconds(-60), Timestamp::from_seconds(60))
        ),
        "(@joined:[-60 60])"
    );
    assert_eq!(
        query(schema.search().where_("joined").gte(100)),
        "(@joined:[100 +inf])"
    );
}

#[test]
fn renders_fulltext_fragments() {
    let schema = people_schema(StorageMode::Flat);

    assert_eq!(
        schema
            .search()
            .where_("bio")
            .matches("rust engines")
            .query_string()
            .unwrap(),
        "(@bio:'rust engines')"
    );
    assert_eq!(
        schema
            .search()
            .where_("bio")
            .matches_exactly("query compiler")
            .query_string()
            .unwrap(),
        "(@bio:\"query compiler\")"
    );
}

#[test]
fn renders_array_fragments() {
    let schema = people_schema(StorageMode::Flat);

    assert_eq!(
        schema.search().where_("tags").contains("rust").query_string().unwrap(),
        "(@tags:{rust})"
    );
    assert_eq!(
        schema
            .search()
            .where_("tags")
            .contains_one_of(["rust", "c++"])
            .query_string()
            .unwrap(),
        "(@tags:{rust|c\\+\\+})"
    );
    assert_eq!(
        schema
            .search()
            .where_("tags")
            .contains_one_of(["solo"])
            .query_string()
            .unwrap(),
        "(@tags:{solo})"
    );
}

#[test]
fn renders_radius_fragment() {
    let schema = people_schema(StorageMode::Flat);

    assert_eq!(
        schema
            .search()
            .where_("home")
            .in_radius(GeoPoint::new(12.5, -3.25), 10.0, DistanceUnit::Kilometers)
            .query_string()
            .unwrap(),
        "(@home:[12.5 -3.25 10 km])"
    );
}

#[test]
fn renders_negation() {
    let schema = people_schema(StorageMode::Flat);

    assert_eq!(
        schema.search().where_("active").not().eq(true).query_string().unwrap(),
        "(-@active:{1})"
    );
    // Toggling twice restores the positive sense.
    assert_eq!(
        schema
            .search()
            .where_("active")
            .not()
            .not()
            .eq(true)
            .query_string()
            .unwrap(),
        "(@active:{1})"
    );
    assert_eq!(
        schema.search().where_("age").ne(30).query_string().unwrap(),
        "(-@age:[30 30])"
    );
}

#[test]
fn renders_boolean_trees() {
    let schema = people_schema(StorageMode::Flat);

    assert_eq!(
        schema
            .search()
            .where_("age")
            .gte(18)
            .and("active")
            .eq(true)
            .query_string()
            .unwrap(),
        "( (@age:[18 +inf]) (@active:{1}) )"
    );

    // Combining is left-associative: a new predicate wraps everything built
    // so far.
    assert_eq!(
        schema
            .search()
            .where_("age")
            .gte(18)
            .and("active")
            .eq(true)
            .or("nickname")
            .eq("ada")
            .query_string()
            .unwrap(),
        "( ( (@age:[18 +inf]) (@active:{1}) ) | (@nickname:{ada}) )"
    );
}

#[test]
fn group_combinators_wrap_subtrees() {
    let schema = people_schema(StorageMode::Flat);

    let query = schema
        .search()
        .where_("active")
        .eq(true)
        .and_group(|q| q.where_("age").lt(18).or("age").gt(65))
        .query_string()
        .unwrap();

    assert_eq!(
        query,
        "( (@active:{1}) ( (@age:[-inf (18]) | (@age:[(65 +inf]) ) )"
    );

    // An empty group changes nothing.
    assert_eq!(
        schema
            .search()
            .where_("active")
            .eq(true)
            .and_group(|q| q)
            .query_string()
            .unwrap(),
        "(@active:{1})"
    );
}

#[test]
fn fluent_matches_manual_tree() {
    let schema = people_schema(StorageMode::Flat);

    let fluent = schema.search().where_("age").gte(18).and("active").eq(true);
    let manual = schema.search().filter(gte("age", 18) & eq("active", true));

    assert_eq!(fluent.expr(), manual.expr());
    assert_eq!(
        fluent.query_string().unwrap(),
        manual.query_string().unwrap()
    );
}

#[test]
fn aliased_location_resolves_per_mode() {
    let flat = people_schema(StorageMode::Flat);
    let doc = people_schema(StorageMode::Document);

    // Flat queries address the stored field; document queries address the
    // indexing alias, never the json path.
    assert_eq!(
        flat.search().where_("years").gte(3).query_string().unwrap(),
        "(@profile.years:[3 +inf])"
    );
    assert_eq!(
        doc.search().where_("years").gte(3).query_string().unwrap(),
        "(@years:[3 +inf])"
    );
}

#[test]
fn rejects_unknown_field() {
    let schema = people_schema(StorageMode::Flat);

    assert_eq!(
        schema.search().where_("nope").eq(1).query_string().unwrap_err(),
        QueryError::Schema(SchemaError::FieldNotFound {
            schema: "person".to_string(),
            field: "nope".to_string(),
        })
    );
}

#[test]
fn type_capabilities_refuse_wrong_operations() {
    let schema = people_schema(StorageMode::Flat);
    let operation = |q: SearchQuery<'_>| match q.query_string().unwrap_err() {
        QueryError::UnsupportedOperation { operation, .. } => operation,
        other => panic!("expected UnsupportedOperation, got {other:?}"),
    };

    // Text answers to matches, not eq; and only text answers to matches.
    assert_eq!(operation(schema.search().where_("bio").eq("x")), "eq");
    assert_eq!(
        operation(schema.search().where_("nickname").matches("x")),
        "matches"
    );
    assert_eq!(
        operation(schema.search().where_("nickname").matches_exactly("x")),
        "matches_exactly"
    );
    assert_eq!(operation(schema.search().where_("nickname").gt(5)), "range");
    assert_eq!(
        operation(schema.search().where_("nickname").contains("x")),
        "contains"
    );
    assert_eq!(
        operation(schema.search().where_("age").in_radius(
            GeoPoint::new(0.0, 0.0),
            1.0,
            DistanceUnit::Meters
        )),
        "in_radius"
    );
}

#[test]
fn rejects_mismatched_operands() {
    let schema = people_schema(StorageMode::Flat);

    assert_eq!(
        schema.search().where_("age").eq("thirty").query_string().unwrap_err(),
        QueryError::UnsupportedOperation {
            field: "age".to_string(),
            kind: FieldKind::Number,
            operation: "eq with a string operand".to_string(),
        }
    );
    assert_eq!(
        schema.search().where_("age").gt(true).query_string().unwrap_err(),
        QueryError::UnsupportedOperation {
            field: "age".to_string(),
            kind: FieldKind::Number,
            operation: "range with a boolean operand".to_string(),
        }
    );
}

#[test]
fn rejects_degenerate_arguments() {
    let schema = people_schema(StorageMode::Flat);

    assert_eq!(
        schema
            .search()
            .where_("tags")
            .contains_one_of(Vec::<String>::new())
            .query_string()
            .unwrap_err(),
        QueryError::UnsupportedOperation {
            field: "tags".to_string(),
            kind: FieldKind::StringArray,
            operation: "contains_one_of with no values".to_string(),
        }
    );
    assert_eq!(
        schema
            .search()
            .where_("home")
            .in_radius(GeoPoint::new(0.0, 0.0), -1.0, DistanceUnit::Miles)
            .query_string()
            .unwrap_err(),
        QueryError::UnsupportedOperation {
            field: "home".to_string(),
            kind: FieldKind::Point,
            operation: "in_radius with an invalid radius".to_string(),
        }
    );
}

#[test]
fn request_assembles_window_sort_projection() {
    let schema = people_schema(StorageMode::Flat);

    let request = schema
        .search()
        .where_("active")
        .eq(true)
        .sort_descending("age")
        .return_fields(["age", "years"])
        .request(20, 10)
        .unwrap();

    assert_eq!(request.index, "person:index");
    assert_eq!(request.query, "(@active:{1})");
    assert_eq!(request.offset, 20);
    assert_eq!(request.count, 10);
    assert_eq!(
        request.sort,
        Some(SortBy {
            attribute: "age".to_string(),
            direction: SortDirection::Descending,
        })
    );
    assert_eq!(
        request.projection,
        Projection::Fields(vec!["age".to_string(), "profile.years".to_string()])
    );
}

#[test]
fn request_resolves_aliases_in_document_mode() {
    let schema = people_schema(StorageMode::Document);

    let request = schema
        .search()
        .where_("years")
        .gte(3)
        .sort_ascending("years")
        .return_fields(["years"])
        .request(0, 5)
        .unwrap();

    assert_eq!(request.query, "(@years:[3 +inf])");
    assert_eq!(
        request.sort,
        Some(SortBy {
            attribute: "years".to_string(),
            direction: SortDirection::Ascending,
        })
    );
    assert_eq!(
        request.projection,
        Projection::Fields(vec!["years".to_string()])
    );
}

#[test]
fn sort_refused_on_structural_kinds() {
    let schema = people_schema(StorageMode::Flat);

    for field in ["tags", "home"] {
        assert!(matches!(
            schema
                .search()
                .sort_ascending(field)
                .request(0, 10)
                .unwrap_err(),
            QueryError::UnsupportedOperation { operation, .. } if operation == "sort_by"
        ));
    }
}

#[test]
fn projection_refuses_unknown_fields() {
    let schema = people_schema(StorageMode::Flat);

    assert!(matches!(
        schema
            .search()
            .return_fields(["nope"])
            .request(0, 10)
            .unwrap_err(),
        QueryError::Schema(SchemaError::FieldNotFound { .. })
    ));
}

#[tokio::test]
async fn page_materializes_reply() {
    let schema = people_schema(StorageMode::Flat);
    let exec = FakeExecutor::with_replies([RawReply {
        total: 2,
        rows: vec![RawRow::new(
            "person:1",
            RawPayload::Fields(vec![("age".to_string(), "30".to_string())]),
        )],
    }]);

    let page = schema
        .search()
        .where_("age")
        .gte(18)
        .page(&exec, 0, 10)
        .await
        .unwrap();

    assert_eq!(page.total, 2);
    assert_eq!(page.ids(), vec!["1"]);

    let requests = exec.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].query, "(@age:[18 +inf])");
    assert_eq!(requests[0].offset, 0);
    assert_eq!(requests[0].count, 10);
}

#[tokio::test]
async fn all_walks_increasing_offsets() {
    let schema = people_schema(StorageMode::Flat);
    let exec = FakeExecutor::with_replies([
        reply(5, &["1", "2"]),
        reply(5, &["3", "4"]),
        reply(5, &["5"]),
    ]);

    let all = schema.search().all(&exec, 2).await.unwrap();

    assert_eq!(all.len(), 5);
    assert_eq!(all[4].id, "5");

    let requests = exec.requests();
    let offsets: Vec<u32> = requests.iter().map(|r| r.offset).collect();
    assert_eq!(offsets, vec![0, 2, 4]);
    assert!(requests.iter().all(|r| r.count == 2));
}

#[tokio::test]
async fn all_stops_on_short_first_page() {
    let schema = people_schema(StorageMode::Flat);
    let exec = FakeExecutor::with_replies([reply(1, &["1"])]);

    let all = schema.search().all(&exec, 10).await.unwrap();

    assert_eq!(all.len(), 1);
    assert_eq!(exec.requests().len(), 1);
}

#[tokio::test]
async fn all_defaults_zero_page_size() {
    let schema = people_schema(StorageMode::Flat);
    let exec = FakeExecutor::new();

    let all = schema.search().all(&exec, 0).await.unwrap();

    assert!(all.is_empty());
    assert_eq!(exec.requests()[0].count, DEFAULT_PAGE_SIZE);
}

#[tokio::test]
async fn first_requests_single_row() {
    let schema = people_schema(StorageMode::Flat);
    let exec = FakeExecutor::with_replies([reply(3, &["9"])]);

    let first = schema.search().first(&exec).await.unwrap();

    assert_eq!(first.map(|e| e.id), Some("9".to_string()));
    assert_eq!(exec.requests()[0].offset, 0);
    assert_eq!(exec.requests()[0].count, 1);
}

#[tokio::test]
async fn count_uses_zero_row_window() {
    let schema = people_schema(StorageMode::Flat);
    let exec = FakeExecutor::with_replies([reply(42, &[])]);

    let count = schema.search().count(&exec).await.unwrap();

    assert_eq!(count, 42);
    assert_eq!(exec.requests()[0].offset, 0);
    assert_eq!(exec.requests()[0].count, 0);
}

#[tokio::test]
async fn exists_reads_total() {
    let schema = people_schema(StorageMode::Flat);

    let populated = FakeExecutor::with_replies([reply(1, &[])]);
    assert!(schema.search().exists(&populated).await.unwrap());

    let empty = FakeExecutor::new();
    assert!(!schema.search().exists(&empty).await.unwrap());
}

#[tokio::test]
async fn min_max_sort_and_take_one() {
    let schema = people_schema(StorageMode::Flat);

    let exec = FakeExecutor::with_replies([reply(9, &["young"])]);
    let min = schema.search().min_by(&exec, "age").await.unwrap();
    assert_eq!(min.map(|e| e.id), Some("young".to_string()));
    assert_eq!(
        exec.requests()[0].sort,
        Some(SortBy {
            attribute: "age".to_string(),
            direction: SortDirection::Ascending,
        })
    );
    assert_eq!(exec.requests()[0].count, 1);

    let exec = FakeExecutor::with_replies([reply(9, &["old"])]);
    let max = schema.search().max_by(&exec, "age").await.unwrap();
    assert_eq!(max.map(|e| e.id), Some("old".to_string()));
    assert_eq!(
        exec.requests()[0].sort,
        Some(SortBy {
            attribute: "age".to_string(),
            direction: SortDirection::Descending,
        })
    );
}

#[tokio::test]
async fn page_of_ids_overrides_projection() {
    let schema = people_schema(StorageMode::Flat);
    let exec = FakeExecutor::with_replies([RawReply {
        total: 3,
        rows: vec![
            RawRow::new("person:a", RawPayload::KeyOnly),
            RawRow::new("person:b", RawPayload::KeyOnly),
        ],
    }]);

    let (total, ids) = schema
        .search()
        .return_fields(["age"])
        .page_of_ids(&exec, 0, 2)
        .await
        .unwrap();

    assert_eq!(total, 3);
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(exec.requests()[0].projection, Projection::KeysOnly);
}

#[tokio::test]
async fn engine_failure_surfaces() {
    struct FailingExecutor;

    #[async_trait]
    impl SearchExecutor for FailingExecutor {
        async fn search(&self, _request: &SearchRequest) -> Result<RawReply, ExecuteError> {
            Err(ExecuteError::from_engine("Syntax error at offset 4"))
        }
    }

    let schema = people_schema(StorageMode::Flat);
    let err = schema.search().first(&FailingExecutor).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Execute(ExecuteError::Syntax { .. })
    ));
}

#[tokio::test]
async fn executors_are_object_safe() {
    let schema = people_schema(StorageMode::Flat);
    let exec = FakeExecutor::with_replies([reply(1, &[])]);
    let dyn_exec: &dyn SearchExecutor = &exec;

    assert_eq!(schema.search().count(dyn_exec).await.unwrap(), 1);
}

proptest! {
    #[test]
    fn prop_escaping_drops_nothing(input in "[^\\\\]{0,40}") {
        for escaped in [escape::escape_tag(&input), escape::escape_text(&input)] {
            let restored: String = escaped.chars().filter(|c| *c != '\\').collect();
            prop_assert_eq!(&restored, &input);
        }
    }

    #[test]
    fn prop_tag_operands_render_inside_braces(input in "[^\\\\]{1,20}") {
        let schema = people_schema(StorageMode::Flat);
        let query = schema
            .search()
            .where_("tags")
            .contains(input.clone())
            .query_string()
            .unwrap();

        prop_assert_eq!(query, format!("(@tags:{{{}}})", escape::escape_tag(&input)));
    }
}
