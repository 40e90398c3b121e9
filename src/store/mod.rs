//! The quote collection and everything that reads or changes it.
//!
//! [`QuoteStore`] owns the in-memory collection and writes through to a durable
//! [`KeyValueStore`] after every change. The last quote shown goes to a separate
//! session store. The pure pieces (sanitize, merge, select, framing) have no I/O and
//! live in their own modules.

use std::sync::Arc;

use serde_json::Value;

use crate::{
    constants::{DEFAULT_QUOTES, LAST_VIEWED_KEY, QUOTES_KEY},
    models::quotes::Quote,
};

pub mod error;
pub mod framing;
pub mod merge;
pub mod persistence;
pub mod sanitize;
pub mod select;

use error::{PersistError, QuoteError};
use framing::ExportFile;
use persistence::KeyValueStore;
use select::CategoryFilter;

pub fn default_quotes() -> Vec<Quote> {
    DEFAULT_QUOTES
        .iter()
        .map(|(text, category)| Quote::new(*text, *category))
        .collect()
}

/// The result of an operation that succeeded in memory. `warning` carries a failed
/// write-through; the in-memory state is still authoritative when it's set.
#[derive(Debug)]
pub struct Outcome<T> {
    pub value: T,
    pub warning: Option<PersistError>,
}

impl<T> Outcome<T> {
    fn new(value: T, persisted: Result<(), PersistError>) -> Self {
        Outcome {
            value,
            warning: persisted.err(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergeReport {
    pub added: usize,
    pub total: usize,
}

pub struct QuoteStore {
    quotes: Vec<Quote>,
    local: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
}

impl QuoteStore {
    pub async fn load(local: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        let quotes = persistence::load_quotes(local.as_ref()).await;

        QuoteStore {
            quotes,
            local,
            session,
        }
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn categories(&self) -> Vec<String> {
        select::categories(&self.quotes)
    }

    pub async fn last_viewed(&self) -> Option<Quote> {
        persistence::load_last_viewed(self.session.as_ref()).await
    }

    /// Picks a quote from the filtered pool and records it as last viewed.
    #[tracing::instrument(skip(self))]
    pub async fn show_random(&self, filter: &CategoryFilter) -> Outcome<Option<Quote>> {
        let pool = select::filter_by_category(&self.quotes, filter);

        let Some(quote) = select::select_random(&pool).map(|quote| (*quote).clone()) else {
            return Outcome {
                value: None,
                warning: None,
            };
        };

        let persisted = persistence::save_last_viewed(self.session.as_ref(), &quote)
            .await
            .inspect_err(|e| tracing::warn!(err = ?e, "couldn't save last viewed quote"));

        Outcome::new(Some(quote), persisted)
    }

    /// The quote to greet with: this session's last viewed one if there is one.
    pub async fn opening_quote(&self) -> Option<Quote> {
        match self.last_viewed().await {
            Some(quote) => Some(quote),
            None => self.show_random(&CategoryFilter::All).await.value,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn add(
        &mut self,
        text: &str,
        category: &str,
    ) -> Result<Outcome<MergeReport>, QuoteError> {
        let (text, category) = (text.trim(), category.trim());

        if text.is_empty() || category.is_empty() {
            return Err(QuoteError::Validation);
        }

        Ok(self.absorb(vec![Quote::new(text, category)]).await)
    }

    /// Imports an exported file. A file that isn't a JSON array is rejected as a whole.
    #[tracing::instrument(skip_all, fields(len = bytes.len()))]
    pub async fn import_json(
        &mut self,
        bytes: &[u8],
    ) -> Result<Outcome<MergeReport>, QuoteError> {
        let items = framing::deserialize(bytes)
            .inspect_err(|e| tracing::warn!(err = ?e, "rejected quotes file"))?;

        Ok(self.ingest(&items).await)
    }

    /// Sanitizes untyped records and merges whatever survives.
    pub async fn ingest(&mut self, raw: &[Value]) -> Outcome<MergeReport> {
        let incoming = sanitize::sanitize(raw);

        self.absorb(incoming).await
    }

    async fn absorb(&mut self, incoming: Vec<Quote>) -> Outcome<MergeReport> {
        let (quotes, added) = merge::merge(std::mem::take(&mut self.quotes), incoming);
        self.quotes = quotes;

        let report = MergeReport {
            added,
            total: self.quotes.len(),
        };

        if added == 0 {
            return Outcome::new(report, Ok(()));
        }

        tracing::info!(added, total = report.total, "merged new quotes");

        let persisted = self.persist().await;
        Outcome::new(report, persisted)
    }

    pub fn export_json(&self) -> Result<ExportFile, QuoteError> {
        let bytes = framing::serialize(&self.quotes)?;

        Ok(ExportFile {
            filename: framing::export_filename(framing::now()),
            bytes,
        })
    }

    /// Clears both stores and goes back to the default quotes.
    #[tracing::instrument(skip(self))]
    pub async fn reset(&mut self) -> Outcome<()> {
        let cleared_local = self.local.remove(QUOTES_KEY).await;
        let cleared_session = self.session.remove(LAST_VIEWED_KEY).await;

        self.quotes = default_quotes();
        let persisted = self.persist().await;

        Outcome::new((), cleared_local.and(cleared_session).and(persisted))
    }

    async fn persist(&self) -> Result<(), PersistError> {
        persistence::save_quotes(self.local.as_ref(), &self.quotes)
            .await
            .inspect_err(|e| {
                tracing::warn!(err = ?e, "couldn't persist quotes, keeping them in memory")
            })
    }
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqliteConnectOptions;

    use super::*;
    use crate::store::persistence::{MemoryStore, SqliteStore};

    async fn fresh() -> (QuoteStore, Arc<MemoryStore>, Arc<MemoryStore>) {
        let local = Arc::new(MemoryStore::new());
        let session = Arc::new(MemoryStore::new());
        let store = QuoteStore::load(local.clone(), session.clone()).await;

        (store, local, session)
    }

    async fn stored_quotes(kv: &MemoryStore) -> Vec<Quote> {
        let raw = kv.get(QUOTES_KEY).await.unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn first_load_uses_and_persists_defaults() {
        let (store, local, _) = fresh().await;

        assert_eq!(store.quotes(), default_quotes().as_slice());
        assert_eq!(stored_quotes(&local).await, default_quotes());
    }

    #[tokio::test]
    async fn loaded_store_is_never_empty() {
        let (store, _, _) = fresh().await;

        assert!(!store.is_empty());
        assert_eq!(store.len(), default_quotes().len());
    }

    #[tokio::test]
    async fn adding_the_same_quote_twice_is_a_duplicate() {
        let (mut store, local, _) = fresh().await;

        let first = store.add("Stay hungry.", "Motivation").await.unwrap();
        assert_eq!(first.value, MergeReport { added: 1, total: 4 });
        assert!(first.warning.is_none());

        let second = store.add("stay hungry.", " motivation ").await.unwrap();
        assert_eq!(second.value, MergeReport { added: 0, total: 4 });
        assert_eq!(store.len(), 4);

        assert_eq!(stored_quotes(&local).await.len(), 4);
    }

    #[tokio::test]
    async fn add_trims_input() {
        let (mut store, _, _) = fresh().await;

        store.add("  Stay hungry.  ", "\tMotivation").await.unwrap();

        assert_eq!(
            store.quotes().last(),
            Some(&Quote::new("Stay hungry.", "Motivation"))
        );
    }

    #[tokio::test]
    async fn blank_input_is_rejected_without_changes() {
        let (mut store, local, _) = fresh().await;

        for (text, category) in [("", "Life"), ("Life goes on.", "   "), (" ", "")] {
            assert!(matches!(
                store.add(text, category).await,
                Err(QuoteError::Validation)
            ));
        }

        assert_eq!(store.quotes(), default_quotes().as_slice());
        assert_eq!(stored_quotes(&local).await, default_quotes());
    }

    #[tokio::test]
    async fn import_adds_only_new_records() {
        let (mut store, local, _) = fresh().await;
        let before = store.len();

        let file = br#"[
            {"text": "The best way to get started is to quit talking and begin doing.", "category": "motivation"},
            {"text": "Stay hungry.", "category": "Motivation"}
        ]"#;

        let outcome = store.import_json(file).await.unwrap();

        assert_eq!(outcome.value.added, 1);
        assert_eq!(store.len(), before + 1);
        assert_eq!(stored_quotes(&local).await.len(), before + 1);
    }

    #[tokio::test]
    async fn reimporting_an_export_adds_nothing() {
        let (mut store, _, _) = fresh().await;
        store.add("Stay hungry.", "Motivation").await.unwrap();

        let export = store.export_json().unwrap();
        assert!(export.filename.starts_with("quotes_"));
        assert!(export.filename.ends_with(".json"));

        let outcome = store.import_json(&export.bytes).await.unwrap();

        assert_eq!(outcome.value.added, 0);
        assert_eq!(outcome.value.total, 4);
    }

    #[tokio::test]
    async fn malformed_import_changes_nothing() {
        let (mut store, _, _) = fresh().await;

        let not_array = store
            .import_json(br#"{"text": "a", "category": "b"}"#)
            .await;
        let not_json = store.import_json(b"[{").await;

        assert!(matches!(not_array, Err(QuoteError::Format(_))));
        assert!(matches!(not_json, Err(QuoteError::Format(_))));
        assert_eq!(store.quotes(), default_quotes().as_slice());
    }

    #[tokio::test]
    async fn show_random_respects_filter_and_records_last_viewed() {
        let (mut store, _, _) = fresh().await;
        store.add("Stay hungry.", "Hunger").await.unwrap();

        let outcome = store
            .show_random(&CategoryFilter::Only("Hunger".into()))
            .await;

        let picked = outcome.value.unwrap();
        assert_eq!(picked, Quote::new("Stay hungry.", "Hunger"));
        assert_eq!(store.last_viewed().await, Some(picked));
    }

    #[tokio::test]
    async fn show_random_on_empty_pool_records_nothing() {
        let (store, _, session) = fresh().await;

        let outcome = store
            .show_random(&CategoryFilter::Only("Nope".into()))
            .await;

        assert!(outcome.value.is_none());
        assert!(session.get(LAST_VIEWED_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn show_random_survives_session_quota() {
        let local = Arc::new(MemoryStore::new());
        let session = Arc::new(MemoryStore::with_quota(4));
        let store = QuoteStore::load(local, session).await;

        let outcome = store.show_random(&CategoryFilter::All).await;

        assert!(store.quotes().contains(outcome.value.as_ref().unwrap()));
        assert!(matches!(
            outcome.warning,
            Some(PersistError::QuotaExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn failed_persist_keeps_quote_in_memory() {
        let defaults_len = serde_json::to_string(&default_quotes()).unwrap().len();
        let local = Arc::new(MemoryStore::with_quota(QUOTES_KEY.len() + defaults_len));
        let session = Arc::new(MemoryStore::new());
        let mut store = QuoteStore::load(local.clone(), session).await;

        let outcome = store.add("Stay hungry.", "Motivation").await.unwrap();

        assert_eq!(outcome.value.added, 1);
        assert!(matches!(
            outcome.warning,
            Some(PersistError::QuotaExceeded { .. })
        ));
        assert_eq!(store.len(), 4);
        assert_eq!(stored_quotes(&local).await, default_quotes());
    }

    #[tokio::test]
    async fn opening_quote_prefers_last_viewed() {
        let (mut store, _, session) = fresh().await;
        store.add("Stay hungry.", "Motivation").await.unwrap();

        let remembered = Quote::new("Stay hungry.", "Motivation");
        persistence::save_last_viewed(session.as_ref(), &remembered)
            .await
            .unwrap();

        for _ in 0..10 {
            assert_eq!(store.opening_quote().await, Some(remembered.clone()));
        }
    }

    #[tokio::test]
    async fn opening_quote_without_history_picks_one() {
        let (store, _, _) = fresh().await;

        let quote = store.opening_quote().await.unwrap();

        assert!(store.quotes().contains(&quote));
        assert_eq!(store.last_viewed().await, Some(quote));
    }

    #[tokio::test]
    async fn reset_restores_defaults_and_forgets_last_viewed() {
        let (mut store, local, _) = fresh().await;
        store.add("Stay hungry.", "Motivation").await.unwrap();
        store.show_random(&CategoryFilter::All).await;

        let outcome = store.reset().await;

        assert!(outcome.warning.is_none());
        assert_eq!(store.quotes(), default_quotes().as_slice());
        assert_eq!(stored_quotes(&local).await, default_quotes());
        assert!(store.last_viewed().await.is_none());
    }

    #[tokio::test]
    async fn quotes_survive_a_restart_but_last_viewed_does_not() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quotes.db");

        {
            let db = persistence::open(SqliteConnectOptions::new().filename(&path), 1)
                .await
                .unwrap();
            let mut store = QuoteStore::load(
                Arc::new(SqliteStore::new(db.clone())),
                Arc::new(MemoryStore::new()),
            )
            .await;

            store.add("Stay hungry.", "Motivation").await.unwrap();
            store.show_random(&CategoryFilter::All).await;
            assert!(store.last_viewed().await.is_some());

            db.close().await;
        }

        let db = persistence::open(SqliteConnectOptions::new().filename(&path), 1)
            .await
            .unwrap();
        let store = QuoteStore::load(
            Arc::new(SqliteStore::new(db)),
            Arc::new(MemoryStore::new()),
        )
        .await;

        assert_eq!(store.len(), 4);
        assert_eq!(
            store.quotes().last(),
            Some(&Quote::new("Stay hungry.", "Motivation"))
        );
        assert!(store.last_viewed().await.is_none());
    }

    #[tokio::test]
    async fn categories_follow_insertion_order() {
        let (mut store, _, _) = fresh().await;
        store.add("Stay hungry.", "Hunger").await.unwrap();
        store.add("Stay foolish.", "Motivation").await.unwrap();

        assert_eq!(
            store.categories(),
            vec!["Motivation", "Life", "Inspiration", "Hunger"]
        );
    }
}
