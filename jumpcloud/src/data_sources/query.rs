//! Query inputs and paging shared by the list data sources

use std::future::Future;

use tfplug::context::Context;
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::NumberRangeValidator;

use crate::api::common::{
    Filter, FilterOperator, FilterSyntax, ListOptions, PagedResponse, SortField,
};
use crate::api::ApiError;
use crate::resources::helpers::{
    api_error, get_complete_objects, get_string_list, get_u64, object_string,
};

pub const PAGE_SIZE: u32 = 100;

/// Add the `filter`, `sort`, `limit` and `skip` inputs
pub fn query_attributes(builder: SchemaBuilder) -> SchemaBuilder {
    builder
        .attribute(
            AttributeBuilder::new(
                "filter",
                AttributeType::list_of_objects(&[
                    ("field", AttributeType::String),
                    ("operator", AttributeType::String),
                    ("value", AttributeType::String),
                ]),
            )
            .description("Filters combined with AND; operator defaults to eq")
            .optional()
            .build(),
        )
        .attribute(
            AttributeBuilder::new("sort", AttributeType::List(Box::new(AttributeType::String)))
                .description("Sort fields, prefix with - for descending order")
                .optional()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("limit", AttributeType::Number)
                .description("Maximum number of results to return")
                .optional()
                .validator(NumberRangeValidator::at_least(1.0))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("skip", AttributeType::Number)
                .description("Number of results to skip")
                .optional()
                .validator(NumberRangeValidator::at_least(0.0))
                .build(),
        )
}

/// Build list options from the query inputs of a data source config
pub fn list_options(config: &DynamicValue, syntax: FilterSyntax) -> Result<ListOptions, Diagnostic> {
    let mut options = ListOptions::new(syntax);

    for entry in get_complete_objects(config, "filter", &["field", "value"])? {
        let field = object_string(&entry, "field");
        let value = object_string(&entry, "value");
        let (Some(field), Some(value)) = (field, value) else {
            return Err(Diagnostic::error(
                "Invalid filter",
                "Each filter needs a field and a value",
            )
            .with_attribute(AttributePath::new("filter")));
        };

        let operator = match object_string(&entry, "operator") {
            None => FilterOperator::Eq,
            Some(op) => FilterOperator::parse(&op).ok_or_else(|| {
                Diagnostic::error(
                    "Invalid filter operator",
                    format!(
                        "Operator '{}' must be one of: {}",
                        op,
                        FilterOperator::ALL.join(", ")
                    ),
                )
                .with_attribute(AttributePath::new("filter"))
            })?,
        };

        options = options.with_filter(Filter::new(field, operator, value));
    }

    for sort in get_string_list(config, "sort")?.unwrap_or_default() {
        let field = SortField::parse(&sort).ok_or_else(|| {
            Diagnostic::error("Invalid sort field", format!("'{}' is not a sort field", sort))
                .with_attribute(AttributePath::new("sort"))
        })?;
        options = options.with_sort(field);
    }

    if let Some(limit) = get_u64(config, "limit") {
        options = options.with_limit(limit.min(u32::MAX as u64) as u32);
    }
    if let Some(skip) = get_u64(config, "skip") {
        options = options.with_skip(skip.min(u32::MAX as u64) as u32);
    }

    Ok(options)
}

/// Fetch pages of `PAGE_SIZE` until `limit` results are collected, the
/// reported total is reached or a short page comes back. Returns the results
/// and the total reported by the API, if any.
pub async fn collect_pages<T, F, Fut>(
    ctx: &Context,
    options: &ListOptions,
    summary: &str,
    mut fetch: F,
) -> Result<(Vec<T>, Option<u64>), Diagnostic>
where
    F: FnMut(ListOptions) -> Fut,
    Fut: Future<Output = Result<PagedResponse<T>, ApiError>>,
{
    let wanted = options.limit.map(|limit| limit as usize);
    let mut skip = options.skip.unwrap_or(0);
    let mut results = Vec::new();
    let mut total = None;

    loop {
        if ctx.is_cancelled() {
            return Err(Diagnostic::error(summary, "The read was cancelled"));
        }

        let page_size = match wanted {
            Some(wanted) => PAGE_SIZE.min(wanted.saturating_sub(results.len()) as u32),
            None => PAGE_SIZE,
        };
        if page_size == 0 {
            break;
        }

        let page = fetch(options.clone().with_limit(page_size).with_skip(skip))
            .await
            .map_err(|e| api_error(summary, &e))?;
        if let Some(count) = page.total_count() {
            total = Some(count);
        }

        let page = page.into_results();
        let received = page.len();
        results.extend(page);
        skip = skip.saturating_add(received as u32);

        tracing::debug!(
            "Fetched page of {} results ({} so far, total {:?})",
            received,
            results.len(),
            total
        );

        if received < page_size as usize || total.is_some_and(|t| u64::from(skip) >= t) {
            break;
        }
    }

    Ok((results, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tfplug::types::Dynamic;

    fn config(json: serde_json::Value) -> DynamicValue {
        DynamicValue::new(Dynamic::from(json))
    }

    #[test]
    fn builds_options_from_inputs() {
        let options = list_options(
            &config(serde_json::json!({
                "filter": [
                    {"field": "department", "operator": null, "value": "Ops"},
                    {"field": "created", "operator": "$gt", "value": "2024-01-01"}
                ],
                "sort": ["-created", "username"],
                "limit": 25,
                "skip": 50
            })),
            FilterSyntax::V1,
        )
        .unwrap();

        assert_eq!(options.filters.len(), 2);
        assert_eq!(options.filters[0].operator, FilterOperator::Eq);
        assert_eq!(options.filters[1].operator, FilterOperator::Gt);
        assert_eq!(options.sort, vec![SortField::desc("created"), SortField::asc("username")]);
        assert_eq!(options.limit, Some(25));
        assert_eq!(options.skip, Some(50));
    }

    #[test]
    fn absent_inputs_give_empty_options() {
        let options = list_options(&config(serde_json::json!({})), FilterSyntax::V2).unwrap();
        assert_eq!(options, ListOptions::new(FilterSyntax::V2));
    }

    #[test]
    fn rejects_unknown_operator() {
        let err = list_options(
            &config(serde_json::json!({
                "filter": [{"field": "name", "operator": "like", "value": "x"}]
            })),
            FilterSyntax::V2,
        )
        .unwrap_err();
        assert_eq!(err.summary, "Invalid filter operator");
    }

    #[test]
    fn filter_without_value_is_rejected() {
        let err = list_options(
            &config(serde_json::json!({
                "filter": [{"field": "name", "operator": "eq", "value": null}]
            })),
            FilterSyntax::V2,
        )
        .unwrap_err();
        assert_eq!(err.summary, "Incomplete list entry");
        assert_eq!(
            err.attribute,
            Some(AttributePath::new("filter").index(0).attribute("value"))
        );
    }

    #[tokio::test]
    async fn pages_until_total_reached() {
        let calls = AtomicU32::new(0);
        let (results, total) = collect_pages(
            &Context::new(),
            &ListOptions::default(),
            "Failed to list",
            |options| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    let skip = options.skip.unwrap_or(0);
                    let count = if skip == 0 { PAGE_SIZE } else { 30 };
                    Ok(PagedResponse::Envelope {
                        results: (0..count).map(|i| skip + i).collect::<Vec<u32>>(),
                        total_count: Some(130),
                    })
                }
            },
        )
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(results.len(), 130);
        assert_eq!(results[129], 129);
        assert_eq!(total, Some(130));
    }

    #[tokio::test]
    async fn limit_caps_page_size() {
        let (results, _) = collect_pages(
            &Context::new(),
            &ListOptions::default().with_limit(5),
            "Failed to list",
            |options| async move {
                assert_eq!(options.limit, Some(5));
                Ok(PagedResponse::List(vec![1, 2, 3, 4, 5]))
            },
        )
        .await
        .unwrap();

        assert_eq!(results, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn short_page_ends_paging_without_total() {
        let calls = AtomicU32::new(0);
        let result = tokio_test::block_on(collect_pages(
            &Context::new(),
            &ListOptions::default(),
            "Failed to list",
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(PagedResponse::List(vec!["a", "b"])) }
            },
        ));

        let (results, total) = tokio_test::assert_ok!(result);
        assert_eq!(results, vec!["a", "b"]);
        assert_eq!(total, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_context_stops_paging() {
        let ctx = Context::new();
        ctx.cancel();

        let err = collect_pages(&ctx, &ListOptions::default(), "Failed to list", |_| async {
            Ok(PagedResponse::<u32>::List(vec![]))
        })
        .await
        .unwrap_err();

        assert!(err.detail.contains("cancelled"));
    }
}
