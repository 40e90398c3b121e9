use std::sync::Arc;

use futures::StreamExt;
use poise::serenity_prelude::{self as serenity, *};
use sqlx::{Pool, Sqlite};
use tokio::sync::Mutex;
use tracing::Instrument;

use crate::{
    commands, event_handler,
    store::{
        persistence::{self, MemoryStore, SqliteStore},
        QuoteStore,
    },
    sync::{self, SyncConfig},
    telemetry, Data,
};

async fn init_database() -> anyhow::Result<Pool<Sqlite>> {
    let db_url = std::env::var("DATABASE_URL").expect("missing DATABASE_URL");

    tracing::info!("initializing database connection...");
    persistence::connect(&db_url).await
}

async fn init_store(db: Pool<Sqlite>) -> QuoteStore {
    tracing::info!("loading quotes...");

    // the session store lives in memory, so last viewed starts empty on every run.
    let store = QuoteStore::load(
        Arc::new(SqliteStore::new(db)),
        Arc::new(MemoryStore::new()),
    )
    .await;

    tracing::info!(count = store.len(), "loaded quotes!");
    store
}

async fn init_discord_client(token: &str, data: Data) -> anyhow::Result<Client> {
    let intents =
        serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::help::help(),
                commands::status::status(),
                commands::quote::quote(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("s>".into()),
                ..Default::default()
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands)
                    .await
                    .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when registering commands"))?;

                Ok(data)
            }.in_current_span())
        })
        .build();

    let client = ClientBuilder::new(token, intents)
        .framework(framework)
        .activity(serenity::ActivityData {
            name: "s>quote for a quote".into(),
            kind: serenity::ActivityType::Listening,
            state: None,
            url: None,
        })
        .await?;

    Ok(client)
}

fn spawn_background_tasks(data: &Data, config: &SyncConfig) {
    let Some(period) = config.interval else {
        tracing::warn!("QUOTE_SYNC_INTERVAL_SECS is 0. quotes will not be synced periodically.");
        return;
    };

    let sync_data = data.clone();

    tracing::info!(
        endpoint = %config.endpoint,
        period_secs = period.as_secs(),
        "initialized quote sync!"
    );

    tokio::spawn(
        async move {
            // the first push happens one full period after startup.
            let interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            let task = futures::stream::unfold(interval, |mut interval| async {
                interval.tick().await;

                let _ = sync::sync_quotes(&sync_data).await;
                Some(((), interval))
            });

            task.for_each(|_| async {}).await;
        }
        .in_current_span(),
    );
}

pub async fn init() -> anyhow::Result<Client> {
    telemetry::init_telemetry().expect("Failed to initialize telemetry");

    tracing::info!("initializing... please wait warmly.");

    let token = std::env::var("DISCORD_TOKEN").expect("missing DISCORD_TOKEN");

    let db = init_database().await?;
    let store = init_store(db).await;
    let sync_config = SyncConfig::from_env();
    let reqwest_client = reqwest::Client::new();

    let data = Data {
        store: Arc::new(Mutex::new(store)),
        remote: sync::remote_from_config(reqwest_client, &sync_config),
    };

    let client = init_discord_client(&token, data.clone()).await?;
    spawn_background_tasks(&data, &sync_config);

    tracing::info!("finished initializing!");
    Ok(client)
}
