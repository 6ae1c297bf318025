use reqwest::Url;
use rocket::http::RawStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Invalid upstream path: {0}")]
    InvalidPath(String),
}

/// A query parameter value as the upstream API expects it: a plain value or an ordered
/// list that is serialized as one `key=value` pair per element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    Multi(Vec<String>),
}

impl ParamValue {
    pub fn values(&self) -> &[String] {
        match self {
            ParamValue::Single(value) => std::slice::from_ref(value),
            ParamValue::Multi(values) => values,
        }
    }

    pub fn first(&self) -> Option<&str> {
        self.values().first().map(String::as_str)
    }
}

/// Parameters in first-seen key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, ParamValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw (still percent-encoded) query string.
    pub fn parse(raw: Option<&str>) -> Result<Self, QueryError> {
        let mut params = Self::new();
        let raw = match raw {
            Some(raw) => raw,
            None => return Ok(params),
        };

        for segment in raw.split('&').filter(|s| !s.is_empty()) {
            let (name, value) = segment.split_once('=').unwrap_or((segment, ""));
            let name = decode(name, name)?;
            let value = decode(value, &name)?;

            if name.is_empty() {
                return Err(QueryError::InvalidParameter {
                    name,
                    reason: "parameter name is empty".to_string(),
                });
            }

            if name.ends_with("[]") {
                params.append_multi(name, value);
            } else {
                params.append(name, value);
            }
        }

        Ok(params)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Append a value; a repeated key is promoted to `Multi`.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => push_value(existing, value),
            None => self.entries.push((name, ParamValue::Single(value))),
        }
    }

    /// Append a value that always serializes as a list, even with one element.
    pub fn append_multi(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => push_value(existing, value),
            None => self.entries.push((name, ParamValue::Multi(vec![value]))),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        let index = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Flattened `(name, value)` pairs in serialization order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(key, value)| {
            value
                .values()
                .iter()
                .map(move |v| (key.as_str(), v.as_str()))
        })
    }
}

fn push_value(existing: &mut ParamValue, value: String) {
    match existing {
        ParamValue::Single(first) => {
            let first = std::mem::take(first);
            *existing = ParamValue::Multi(vec![first, value]);
        }
        ParamValue::Multi(values) => values.push(value),
    }
}

fn decode(raw: &str, name: &str) -> Result<String, QueryError> {
    let decoded = RawStr::new(raw)
        .url_decode()
        .map_err(|e| QueryError::InvalidParameter {
            name: name.to_string(),
            reason: format!("not valid UTF-8 after decoding: {}", e),
        })?;

    if decoded.chars().any(char::is_control) {
        return Err(QueryError::InvalidParameter {
            name: name.to_string(),
            reason: "contains control characters".to_string(),
        });
    }

    Ok(decoded.into_owned())
}

/// Build the absolute upstream URL for `path` (slash separated, relative to `base`),
/// optionally followed by an identifier segment.
///
/// When an identifier is given, an `id` parameter is not repeated in the query. An empty
/// parameter set yields a URL without `?`.
pub fn resolve_url(
    base: &Url,
    path: &str,
    id: Option<&str>,
    params: &QueryParams,
) -> Result<Url, QueryError> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);

    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| QueryError::InvalidPath(format!("{} cannot be a base URL", base)))?;
        segments.pop_if_empty();
        segments.extend(path.split('/').filter(|s| !s.is_empty()));

        if let Some(id) = id {
            if id.is_empty() {
                return Err(QueryError::InvalidPath("identifier is empty".to_string()));
            }
            segments.push(id);
        }
    }

    let mut pairs = params
        .pairs()
        .filter(|(name, _)| id.is_none() || *name != "id")
        .peekable();

    if pairs.peek().is_some() {
        url.query_pairs_mut().extend_pairs(pairs);
    }

    Ok(url)
}
