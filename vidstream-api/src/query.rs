use crate::error::{ApiError, ApiResult};
use serde::Serialize;
use serde_json::Value;

/// A single query parameter value.
///
/// `Missing` values are dropped from the query string entirely, lists are
/// sent as one comma-joined value.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Missing,
    Single(String),
    List(Vec<String>),
}

impl QueryValue {
    fn render(&self) -> Option<String> {
        match self {
            QueryValue::Missing => None,
            QueryValue::Single(value) => Some(value.clone()),
            QueryValue::List(values) => Some(values.join(",")),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Single(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Single(value)
    }
}

impl From<&String> for QueryValue {
    fn from(value: &String) -> Self {
        QueryValue::Single(value.clone())
    }
}

macro_rules! display_query_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for QueryValue {
                fn from(value: $ty) -> Self {
                    QueryValue::Single(value.to_string())
                }
            }
        )*
    };
}

display_query_value!(bool, i32, i64, u32, u64, usize, f64);

impl<T: ToString> From<Vec<T>> for QueryValue {
    fn from(values: Vec<T>) -> Self {
        QueryValue::List(values.iter().map(ToString::to_string).collect())
    }
}

impl<T: ToString> From<&[T]> for QueryValue {
    fn from(values: &[T]) -> Self {
        QueryValue::List(values.iter().map(ToString::to_string).collect())
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(QueryValue::Missing)
    }
}

/// Flat query parameter mapping for GET requests
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any previous value for the same key.
    /// Missing values remove nothing and add nothing.
    pub fn insert(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        let key = key.into();
        if let Some(rendered) = value.into().render() {
            match self.pairs.iter_mut().find(|(k, _)| *k == key) {
                Some(pair) => pair.1 = rendered,
                None => self.pairs.push((key, rendered)),
            }
        }
        self
    }

    /// Build parameters from any serializable struct or map.
    ///
    /// Top-level `null` fields are omitted, arrays become comma-joined strings
    /// and nested objects are sent as their JSON text.
    pub fn from_serialize<S: Serialize + ?Sized>(params: &S) -> ApiResult<Self> {
        let fields = match serde_json::to_value(params)? {
            Value::Object(map) => map,
            Value::Null => return Ok(Self::new()),
            other => {
                return Err(ApiError::validation(
                    "params",
                    format!("expected a flat object, got {}", other),
                ));
            }
        };

        let mut query = Self::new();
        for (key, value) in fields {
            let value = match value {
                Value::Null => QueryValue::Missing,
                Value::String(s) => QueryValue::Single(s),
                Value::Array(items) => {
                    QueryValue::List(items.into_iter().map(scalar_to_string).collect())
                }
                Value::Object(_) => QueryValue::Single(value.to_string()),
                scalar => QueryValue::Single(scalar_to_string(scalar)),
            };
            query = query.insert(key, value);
        }
        Ok(query)
    }

    /// Merge another set of parameters on top of this one
    pub fn extend(mut self, other: QueryParams) -> Self {
        for (key, value) in other.pairs {
            self = self.insert(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// URL-encoded query string without the leading `?`
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }

    /// Append the query string to an endpoint, if there is anything to append
    pub fn apply_to(&self, endpoint: &str) -> String {
        if self.is_empty() {
            endpoint.to_string()
        } else {
            format!("{}?{}", endpoint, self.to_query_string())
        }
    }
}

fn scalar_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Listing {
        tags: Vec<String>,
        page: Option<u32>,
        category_id: Option<String>,
        vip_only: bool,
    }

    #[test]
    fn lists_are_comma_joined_and_missing_values_dropped() {
        let query = QueryParams::new()
            .insert("tags", vec!["a", "b"])
            .insert("page", None::<u32>);

        assert_eq!(query.to_query_string(), "tags=a%2Cb");
        assert!(query.get("page").is_none());
    }

    #[test]
    fn insert_replaces_existing_key() {
        let query = QueryParams::new().insert("page", 1).insert("page", 2);
        assert_eq!(query.len(), 1);
        assert_eq!(query.get("page"), Some("2"));
    }

    #[test]
    fn serializable_struct_is_flattened() {
        let query = QueryParams::from_serialize(&Listing {
            tags: vec!["a".into(), "b".into()],
            page: None,
            category_id: Some("c 1".into()),
            vip_only: true,
        })
        .unwrap();

        assert_eq!(query.get("tags"), Some("a,b"));
        assert_eq!(query.get("categoryId"), Some("c 1"));
        assert_eq!(query.get("vipOnly"), Some("true"));
        assert!(query.get("page").is_none());
        assert!(query.to_query_string().contains("categoryId=c+1"));
    }

    #[test]
    fn non_object_params_are_rejected() {
        let err = QueryParams::from_serialize(&vec![1, 2]).unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
    }

    #[test]
    fn apply_to_leaves_bare_endpoint_alone() {
        assert_eq!(QueryParams::new().apply_to("/videos"), "/videos");
        assert_eq!(
            QueryParams::new().insert("limit", 5).apply_to("/videos"),
            "/videos?limit=5"
        );
    }
}
