use std::sync::Arc;

use poise::serenity_prelude as serenity;
use tokio::sync::Mutex;

use crate::{store::QuoteStore, sync::RemoteQuotes};

#[derive(Clone)]
struct Data {
    store: Arc<Mutex<QuoteStore>>,
    remote: Arc<dyn RemoteQuotes>,
}

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

mod commands;
mod constants;
mod init;
mod models;
mod store;
mod sync;
mod telemetry;

#[tracing::instrument(skip_all)]
async fn event_handler(
    _ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::Ready { data_about_bot } = event {
        tracing::info!(user = %data_about_bot.user.name, "logged in to discord!");

        let store = data.store.lock().await;

        match store.opening_quote().await {
            Some(quote) => {
                tracing::info!(text = %quote.text, category = %quote.category, "today's quote")
            }
            None => tracing::info!("no quotes available yet."),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let _ = &*constants::STARTUP_TIME;

    let mut client = init::init().await?;

    client
        .start()
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "discord client stopped"))?;

    Ok(())
}
