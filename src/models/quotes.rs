use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Quote {
    pub text: String,
    pub category: String,
}

/// lower-cased `(text, category)` pair. two quotes with the same key are the same quote.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QuoteKey(String, String);

impl Quote {
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Quote {
            text: text.into(),
            category: category.into(),
        }
    }

    pub fn key(&self) -> QuoteKey {
        QuoteKey(self.text.to_lowercase(), self.category.to_lowercase())
    }

    /// true when both fields are non-empty after trimming and carry no surrounding whitespace.
    pub fn is_sanitized(&self) -> bool {
        !self.text.is_empty()
            && !self.category.is_empty()
            && self.text.trim() == self.text
            && self.category.trim() == self.category
    }
}
