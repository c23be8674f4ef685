//! The two pagination conventions.
//!
//! Freshly generated sequences use a 1-indexed `currentPage` / `pageSize`
//! envelope. Persisted payloads use 0-indexed pages with parameter names taken
//! from the endpoint descriptor and are sliced in place.

use serde_json::{json, Value};

use super::endpoint::{EndpointDescriptor, QueryParams};

const CURRENT_PAGE_PARAM: &str = "currentPage";
const PAGE_SIZE_PARAM: &str = "pageSize";

/// Wrap a generated sequence in `{currentPage, count, pageSize, list}` when
/// the query carries both `currentPage` and `pageSize`
pub fn paginate_generated(data: Value, query: &QueryParams) -> Value {
    let (current_page, page_size) = match (
        query.get(CURRENT_PAGE_PARAM).and_then(|v| v.trim().parse::<u64>().ok()),
        query.get(PAGE_SIZE_PARAM).and_then(|v| v.trim().parse::<u64>().ok()),
    ) {
        (Some(page), Some(size)) => (page, size),
        _ => return data,
    };

    let items = match data {
        Value::Array(items) => items,
        other => return other,
    };

    let count = items.len();
    let list: Vec<Value> = if current_page == 0 || page_size == 0 {
        Vec::new()
    } else {
        let start = (current_page - 1).saturating_mul(page_size);
        let start = usize::try_from(start).unwrap_or(usize::MAX);
        let size = usize::try_from(page_size).unwrap_or(usize::MAX);
        items.into_iter().skip(start).take(size).collect()
    };

    json!({
        "currentPage": current_page,
        "count": count,
        "pageSize": page_size,
        "list": list,
    })
}

/// 0-indexed pagination of a persisted payload.
///
/// - sequence: sliced to `[page*size, page*size+size)`
/// - mapping whose `rowData` field is a sequence and a total field is known:
///   the nested list is sliced and the total field set to its full length
/// - anything else is returned verbatim
pub fn paginate_stored(data: &Value, query: &QueryParams, endpoint: &EndpointDescriptor) -> Value {
    let page = query.get(&endpoint.page).map(|v| lenient_number(v)).unwrap_or(0);
    let size = query
        .get(&endpoint.size)
        .map(|v| lenient_number(v))
        .filter(|s| *s > 0);

    match data {
        Value::Array(items) => Value::Array(slice_page(items, page, size)),
        Value::Object(map) => {
            let (Some(row_key), Some(total_key)) = (endpoint.row_data.as_ref(), endpoint.total_field())
            else {
                return data.clone();
            };
            match map.get(row_key) {
                Some(Value::Array(rows)) => {
                    let mut paged = map.clone();
                    paged.insert(row_key.clone(), Value::Array(slice_page(rows, page, size)));
                    paged.insert(total_key, json!(rows.len()));
                    Value::Object(paged)
                }
                _ => data.clone(),
            }
        }
        _ => data.clone(),
    }
}

/// Non-numeric or negative input counts as 0
fn lenient_number(raw: &str) -> usize {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n > 0.0)
        .map(|n| n as usize)
        .unwrap_or(0)
}

fn slice_page(items: &[Value], page: usize, size: Option<usize>) -> Vec<Value> {
    let size = size.unwrap_or(items.len());
    let start = page.saturating_mul(size);
    items.iter().skip(start).take(size).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_generated_pagination_second_page() {
        let data = Value::Array((0..12).map(|i| json!(i)).collect());
        let page = paginate_generated(data, &query(&[("currentPage", "2"), ("pageSize", "5")]));
        assert_eq!(page["currentPage"], json!(2));
        assert_eq!(page["pageSize"], json!(5));
        assert_eq!(page["count"], json!(12));
        assert_eq!(page["list"], json!([5, 6, 7, 8, 9]));
    }

    #[test]
    fn test_generated_pagination_out_of_range_is_empty() {
        let data = Value::Array((0..12).map(|i| json!(i)).collect());
        let page = paginate_generated(data.clone(), &query(&[("currentPage", "9"), ("pageSize", "5")]));
        assert_eq!(page["list"], json!([]));
        assert_eq!(page["count"], json!(12));

        let page = paginate_generated(data, &query(&[("currentPage", "0"), ("pageSize", "5")]));
        assert_eq!(page["list"], json!([]));
    }

    #[test]
    fn test_generated_pagination_needs_both_params() {
        let data = json!([1, 2, 3]);
        assert_eq!(
            paginate_generated(data.clone(), &query(&[("currentPage", "1")])),
            data
        );
        assert_eq!(
            paginate_generated(data.clone(), &query(&[("currentPage", "x"), ("pageSize", "1")])),
            data
        );
        let object = json!({ "a": 1 });
        assert_eq!(
            paginate_generated(object.clone(), &query(&[("currentPage", "1"), ("pageSize", "1")])),
            object
        );
    }

    #[test]
    fn test_lenient_number() {
        assert_eq!(lenient_number("3"), 3);
        assert_eq!(lenient_number(" 2.0 "), 2);
        assert_eq!(lenient_number("-4"), 0);
        assert_eq!(lenient_number("abc"), 0);
    }
}
