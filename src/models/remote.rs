use serde::Serialize;

use super::quotes::Quote;

/// body sent for a single pushed quote.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushQuoteRequest<'a> {
    pub text: &'a str,
    pub category: &'a str,
}

impl<'a> From<&'a Quote> for PushQuoteRequest<'a> {
    fn from(quote: &'a Quote) -> Self {
        PushQuoteRequest {
            text: &quote.text,
            category: &quote.category,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PushReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl PushReport {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }
}
