//! Keyword sanitization for incoming generation requests.

use crate::{Error, Result};
use serde::Deserialize;
use serde_json::Value;

pub const MAX_KEYWORDS: usize = 10;

const MISSING_KEYWORDS: &str = "keywords must be provided (array or comma-separated string)";

/// Body accepted by `POST /api/generate`.
///
/// `keywords` is kept as raw JSON so that non-string entries can be skipped
/// instead of failing the whole request.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub keywords: Option<Value>,
    #[serde(default)]
    pub keyword: Option<Value>,
}

/// Trimmed, non-empty, distinct keywords in submission order, at most
/// [`MAX_KEYWORDS`] long and never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet(Vec<String>);

impl KeywordSet {
    pub fn new<I, S>(raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keywords: Vec<String> = Vec::new();
        for item in raw {
            let trimmed = item.as_ref().trim();
            if trimmed.is_empty() || keywords.iter().any(|k| k == trimmed) {
                continue;
            }
            keywords.push(trimmed.to_string());
            if keywords.len() == MAX_KEYWORDS {
                break;
            }
        }

        if keywords.is_empty() {
            return Err(Error::InvalidInput(MISSING_KEYWORDS.to_string()));
        }
        Ok(Self(keywords))
    }

    /// Accepts `{keywords: [..]}` first, then `{keyword: "a,b,c"}`.
    pub fn from_request(request: &GenerateRequest) -> Result<Self> {
        if let Some(Value::Array(items)) = &request.keywords {
            return Self::new(items.iter().filter_map(Value::as_str));
        }
        if let Some(Value::String(joined)) = &request.keyword {
            return Self::new(joined.split(','));
        }
        Err(Error::InvalidInput(MISSING_KEYWORDS.to_string()))
    }

    pub fn first(&self) -> &str {
        &self.0[0]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn join(&self, separator: &str) -> String {
        self.0.join(separator)
    }
}
