use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::{
    constants::{QUOTE_SYNC_ENDPOINT, QUOTE_SYNC_INTERVAL_SECS},
    models::{
        quotes::Quote,
        remote::{PushQuoteRequest, PushReport},
    },
    store::{
        error::{QuoteError, RemoteError},
        MergeReport, Outcome, QuoteStore,
    },
    Data,
};

/// Where remote quotes come from and go to.
#[async_trait]
pub trait RemoteQuotes: Send + Sync {
    /// Candidate records in `{text, category}` shape, not yet sanitized.
    async fn fetch(&self) -> Result<Vec<Value>, RemoteError>;

    async fn push(&self, quote: &Quote) -> Result<(), RemoteError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    pub endpoint: String,
    /// `None` turns the periodic push off.
    pub interval: Option<Duration>,
}

impl SyncConfig {
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("QUOTE_SYNC_ENDPOINT").ok(),
            std::env::var("QUOTE_SYNC_INTERVAL_SECS").ok(),
        )
    }

    fn from_vars(endpoint: Option<String>, interval: Option<String>) -> Self {
        let endpoint = endpoint
            .filter(|endpoint| !endpoint.trim().is_empty())
            .unwrap_or_else(|| QUOTE_SYNC_ENDPOINT.to_string());

        let secs = match interval.as_deref().map(str::trim) {
            None | Some("") => QUOTE_SYNC_INTERVAL_SECS,
            Some(raw) => raw.parse::<u64>().unwrap_or_else(|e| {
                tracing::warn!(err = ?e, value = %raw, "invalid QUOTE_SYNC_INTERVAL_SECS, using the default");
                QUOTE_SYNC_INTERVAL_SECS
            }),
        };

        SyncConfig {
            endpoint,
            interval: (secs > 0).then(|| Duration::from_secs(secs)),
        }
    }
}

#[derive(Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRemote {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        HttpRemote {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl RemoteQuotes for HttpRemote {
    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch(&self) -> Result<Vec<Value>, RemoteError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .inspect_err(
                |e| tracing::error!(err = ?e, "an error occurred when fetching quotes from server"),
            )?;

        if !resp.status().is_success() {
            tracing::error!(status = %resp.status(), "server refused to list quotes");
            return Err(RemoteError::Status(resp.status().as_u16()));
        }

        let posts: Vec<Value> = resp.json().await.inspect_err(
            |e| tracing::error!(err = ?e, "an error occurred when decoding quotes from server"),
        )?;

        Ok(posts_to_candidates(&posts))
    }

    async fn push(&self, quote: &Quote) -> Result<(), RemoteError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&PushQuoteRequest::from(quote))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(RemoteError::Status(resp.status().as_u16()));
        }

        Ok(())
    }
}

/// Maps placeholder posts into quote records: the title is the text and the author
/// becomes a `User <id>` category. Anything missing stays null and gets sanitized away.
pub fn posts_to_candidates(posts: &[Value]) -> Vec<Value> {
    posts
        .iter()
        .map(|post| {
            let category = match post.get("userId") {
                None | Some(Value::Null) => Value::Null,
                Some(Value::String(id)) => Value::String(format!("User {id}")),
                Some(id) => Value::String(format!("User {id}")),
            };

            json!({
                "text": post.get("title").cloned().unwrap_or(Value::Null),
                "category": category,
            })
        })
        .collect()
}

/// Fetches remote quotes and merges them like a file import. The store is only locked
/// once the response is in.
pub async fn fetch_into(
    store: &Mutex<QuoteStore>,
    remote: &dyn RemoteQuotes,
) -> Result<Outcome<MergeReport>, QuoteError> {
    let candidates = remote.fetch().await?;

    let mut store = store.lock().await;
    Ok(store.ingest(&candidates).await)
}

/// Pushes every quote on its own. A failed push is logged and counted, never retried,
/// and doesn't stop the rest.
pub async fn push_all(remote: &dyn RemoteQuotes, quotes: &[Quote]) -> PushReport {
    let mut report = PushReport::default();

    for quote in quotes {
        match remote.push(quote).await {
            Ok(()) => report.succeeded += 1,
            Err(e) => {
                tracing::warn!(err = ?e, text = %quote.text, "an error occurred when pushing quote to server");
                report.failed += 1;
            }
        }
    }

    report
}

/// Snapshots the collection and pushes it without holding the lock.
pub async fn push_snapshot(store: &Mutex<QuoteStore>, remote: &dyn RemoteQuotes) -> PushReport {
    let snapshot = store.lock().await.quotes().to_vec();

    push_all(remote, &snapshot).await
}

#[tracing::instrument(skip_all)]
pub(crate) async fn sync_quotes(data: &Data) -> PushReport {
    tracing::info!("started syncing quotes to server!");

    let report = push_snapshot(&data.store, data.remote.as_ref()).await;

    tracing::info!(
        succeeded = report.succeeded,
        failed = report.failed,
        "finished syncing quotes to server!"
    );

    report
}

pub fn remote_from_config(client: reqwest::Client, config: &SyncConfig) -> Arc<dyn RemoteQuotes> {
    Arc::new(HttpRemote::new(client, config.endpoint.clone()))
}
