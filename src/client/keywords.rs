use super::ClientError;
use crate::keywords::MAX_KEYWORDS;

/// Keywords entered so far, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordBoard {
    keywords: Vec<String>,
}

impl KeywordBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a keyword. Blank input is ignored and returns `Ok(false)`.
    pub fn add(&mut self, input: &str) -> Result<bool, ClientError> {
        let keyword = input.trim();
        if keyword.is_empty() {
            return Ok(false);
        }
        if self.keywords.len() >= MAX_KEYWORDS {
            return Err(ClientError::TooManyKeywords);
        }
        if self.keywords.iter().any(|k| k == keyword) {
            return Err(ClientError::DuplicateKeyword);
        }
        self.keywords.push(keyword.to_string());
        Ok(true)
    }

    pub fn remove(&mut self, keyword: &str) -> bool {
        let before = self.keywords.len();
        self.keywords.retain(|k| k != keyword);
        self.keywords.len() != before
    }

    pub fn clear(&mut self) {
        self.keywords.clear();
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Keywords to submit; an empty board cannot be submitted.
    pub fn submission(&self) -> Result<Vec<String>, ClientError> {
        if self.keywords.is_empty() {
            return Err(ClientError::EmptyBoard);
        }
        Ok(self.keywords.clone())
    }
}
