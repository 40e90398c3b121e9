use poise::serenity_prelude::*;

use crate::{
    constants::QUOTES_PER_PAGE,
    models::quotes::Quote,
    store::{error::PersistError, error::QuoteError, select::CategoryFilter},
    sync as remote_sync,
    Context, Error,
};

const MAX_IMPORT_BYTES: u64 = 1024 * 1024;
const MAX_LISTED_TEXT_CHARS: usize = 200;

fn quote_embed(quote: &Quote) -> CreateEmbed {
    CreateEmbed::default()
        .description(format!("“{}”", quote.text))
        .footer(CreateEmbedFooter::new(format!("category: {}", quote.category)))
}

fn warning_note(warning: &Option<PersistError>) -> &'static str {
    match warning {
        Some(_) => "\n-# couldn't write to storage. changes are kept in memory for now.",
        None => "",
    }
}

fn plural(count: usize, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 {
        one
    } else {
        many
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

fn list_pages(quotes: &[Quote]) -> Vec<String> {
    quotes
        .chunks(QUOTES_PER_PAGE)
        .enumerate()
        .map(|(page, chunk)| {
            chunk
                .iter()
                .enumerate()
                .map(|(idx, quote)| {
                    format!(
                        "{}. “{}” ({})\n",
                        idx + 1 + page * QUOTES_PER_PAGE,
                        truncate(&quote.text, MAX_LISTED_TEXT_CHARS),
                        quote.category
                    )
                })
                .collect()
        })
        .collect()
}

async fn reply(ctx: Context<'_>, content: impl Into<String>) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .reply(true)
            .allowed_mentions(CreateAllowedMentions::new().replied_user(false))
            .content(content),
    )
    .await
    .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

    Ok(())
}

/// show a random quote, optionally from a single category.
///
/// `s>quote` picks from everything, `s>quote Motivation` only from that category.
#[tracing::instrument(skip(ctx))]
#[poise::command(
    prefix_command,
    aliases("quotes"),
    subcommands(
        "add_quote",
        "list_quotes",
        "categories",
        "last",
        "export",
        "import",
        "reset",
        "fetch_quotes",
        "sync_quotes"
    )
)]
pub async fn quote(ctx: Context<'_>, #[rest] category: Option<String>) -> Result<(), Error> {
    let filter = CategoryFilter::from(category);

    let outcome = {
        let store = ctx.data().store.lock().await;
        store.show_random(&filter).await
    };

    match outcome.value {
        Some(quote) => {
            ctx.send(
                poise::CreateReply::default()
                    .reply(true)
                    .allowed_mentions(CreateAllowedMentions::new().replied_user(false))
                    .embed(quote_embed(&quote)),
            )
            .await
            .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;
        }
        None => match filter {
            CategoryFilter::All => {
                reply(ctx, "no quotes available. add one with `s>quote add`!").await?
            }
            CategoryFilter::Only(category) => {
                reply(ctx, format!("no quotes available in \"{category}\".")).await?
            }
        },
    }

    Ok(())
}

/// add a quote: `s>quote add <category> <text>`.
#[poise::command(prefix_command, rename = "add")]
#[tracing::instrument(skip(ctx))]
pub async fn add_quote(
    ctx: Context<'_>,
    category: String,
    #[rest] text: String,
) -> Result<(), Error> {
    let result = {
        let mut store = ctx.data().store.lock().await;
        store.add(&text, &category).await
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(QuoteError::Validation) => {
            return reply(ctx, "please enter both a category and a quote.").await;
        }
        Err(e) => {
            tracing::error!(err = ?e, "an error occurred when adding quote");
            return reply(ctx, format!("couldn't add quote: {e}")).await;
        }
    };

    if outcome.value.added == 0 {
        return reply(
            ctx,
            format!("that quote already exists in \"{}\".", category.trim()),
        )
        .await;
    }

    let quote = Quote::new(text.trim(), category.trim());
    let pushed = ctx.data().remote.push(&quote).await.inspect_err(
        |e| tracing::warn!(err = ?e, "an error occurred when sending new quote to server"),
    );

    reply(
        ctx,
        format!(
            "added quote to \"{}\" ({} quotes total). {}{}",
            quote.category,
            outcome.value.total,
            if pushed.is_ok() {
                "sent it to the server too!"
            } else {
                "saved locally, but failed to send it to the server."
            },
            warning_note(&outcome.warning),
        ),
    )
    .await
}

/// list every quote, ten per page.
#[poise::command(prefix_command, rename = "list")]
#[tracing::instrument(skip_all)]
pub async fn list_quotes(ctx: Context<'_>) -> Result<(), Error> {
    let pages = list_pages(ctx.data().store.lock().await.quotes());

    if pages.is_empty() {
        return reply(ctx, "no quotes found!").await;
    }

    let mut current_page: usize = 0;

    let ctx_id = ctx.id();
    let author_id = ctx.author().id;
    let first_id = format!("{}first", ctx_id);
    let last_id = format!("{}last", ctx_id);
    let prev_id = format!("{}prev", ctx_id);
    let next_id = format!("{}next", ctx_id);

    let page_embed = |page: usize| {
        CreateEmbed::default()
            .title("list of quotes")
            .description(pages[page].clone())
            .footer(CreateEmbedFooter::new(format!(
                "page {}/{}",
                page + 1,
                pages.len(),
            )))
    };

    let page_buttons = |page: usize| {
        vec![CreateActionRow::Buttons(vec![
            CreateButton::new(&first_id).emoji('⏮').disabled(page == 0),
            CreateButton::new(&prev_id).emoji('◀').disabled(page == 0),
            CreateButton::new(&next_id)
                .emoji('▶')
                .disabled(page == pages.len() - 1),
            CreateButton::new(&last_id)
                .emoji('⏭')
                .disabled(page == pages.len() - 1),
        ])]
    };

    let msg = ctx
        .send(
            poise::CreateReply::default()
                .reply(true)
                .allowed_mentions(CreateAllowedMentions::new().replied_user(false))
                .content("here's your quotes list!")
                .embed(page_embed(current_page))
                .components(page_buttons(current_page)),
        )
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

    while let Some(press) = collector::ComponentInteractionCollector::new(ctx)
        .filter(move |press| press.data.custom_id.starts_with(&ctx_id.to_string()))
        .timeout(std::time::Duration::from_secs(60))
        .await
    {
        if press.user.id != author_id {
            press
                .create_response(
                    ctx,
                    CreateInteractionResponse::Message(
                        CreateInteractionResponseMessage::new()
                            .content("you cannot interact with another user's invoked command!")
                            .ephemeral(true),
                    ),
                )
                .await
                .inspect_err(
                    |e| tracing::error!(err = ?e, "an error occurred when creating response"),
                )?;

            continue;
        }

        if press.data.custom_id == prev_id {
            current_page = current_page.saturating_sub(1);
        } else if press.data.custom_id == next_id {
            current_page = (current_page + 1).min(pages.len() - 1);
        } else if press.data.custom_id == first_id {
            current_page = 0;
        } else if press.data.custom_id == last_id {
            current_page = pages.len() - 1;
        } else {
            continue;
        }

        press
            .create_response(
                ctx,
                CreateInteractionResponse::UpdateMessage(
                    CreateInteractionResponseMessage::new()
                        .embed(page_embed(current_page))
                        .components(page_buttons(current_page)),
                ),
            )
            .await
            .inspect_err(
                |e| tracing::error!(err = ?e, "an error occurred when creating response"),
            )?;
    }

    msg.into_message()
        .await?
        .edit(ctx, EditMessage::default().components(vec![]))
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when editing message"))?;

    Ok(())
}

/// list the categories quotes can be filtered by.
#[poise::command(prefix_command)]
#[tracing::instrument(skip_all)]
pub async fn categories(ctx: Context<'_>) -> Result<(), Error> {
    let listing = {
        let store = ctx.data().store.lock().await;

        if store.is_empty() {
            None
        } else {
            let listing = store
                .categories()
                .into_iter()
                .map(|category| {
                    let count = store
                        .quotes()
                        .iter()
                        .filter(|quote| quote.category == category)
                        .count();

                    format!("- {} ({})", category, count)
                })
                .collect::<Vec<_>>();

            Some(listing)
        }
    };

    let Some(listing) = listing else {
        return reply(ctx, "no categories yet!").await;
    };

    ctx.send(
        poise::CreateReply::default()
            .reply(true)
            .allowed_mentions(CreateAllowedMentions::new().replied_user(false))
            .embed(
                CreateEmbed::default()
                    .title("categories")
                    .description(listing.join("\n")),
            ),
    )
    .await
    .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

    Ok(())
}

/// show the last quote viewed since the bot started.
#[poise::command(prefix_command)]
#[tracing::instrument(skip_all)]
pub async fn last(ctx: Context<'_>) -> Result<(), Error> {
    let last_viewed = ctx.data().store.lock().await.last_viewed().await;

    match last_viewed {
        Some(quote) => {
            ctx.send(
                poise::CreateReply::default()
                    .reply(true)
                    .allowed_mentions(CreateAllowedMentions::new().replied_user(false))
                    .content("last viewed (this session):")
                    .embed(quote_embed(&quote)),
            )
            .await
            .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;
        }
        None => reply(ctx, "no quote has been viewed this session yet.").await?,
    }

    Ok(())
}

/// export every quote as a JSON file.
#[poise::command(prefix_command)]
#[tracing::instrument(skip_all)]
pub async fn export(ctx: Context<'_>) -> Result<(), Error> {
    let (export, count) = {
        let store = ctx.data().store.lock().await;
        (store.export_json(), store.len())
    };

    let export = match export {
        Ok(export) => export,
        Err(e) => {
            tracing::error!(err = ?e, "an error occurred when exporting quotes");
            return reply(ctx, format!("export failed: {e}")).await;
        }
    };

    ctx.send(
        poise::CreateReply::default()
            .reply(true)
            .allowed_mentions(CreateAllowedMentions::new().replied_user(false))
            .content(format!(
                "exported {} {} to JSON.",
                count,
                plural(count, "quote", "quotes")
            ))
            .attachment(CreateAttachment::bytes(export.bytes, export.filename)),
    )
    .await
    .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

    Ok(())
}

/// import quotes from an attached JSON file. quotes that already exist are skipped.
#[poise::command(prefix_command)]
#[tracing::instrument(skip_all)]
pub async fn import(
    ctx: Context<'_>,
    #[description = "a JSON file exported with `s>quote export`"] file: Attachment,
) -> Result<(), Error> {
    if u64::from(file.size) > MAX_IMPORT_BYTES {
        return reply(ctx, "import failed: that file is too large.").await;
    }

    let bytes = file.download().await.inspect_err(
        |e| tracing::error!(err = ?e, filename = %file.filename, "an error occurred when downloading attachment"),
    )?;

    let result = {
        let mut store = ctx.data().store.lock().await;
        store.import_json(&bytes).await
    };

    match result {
        Ok(outcome) => {
            let added = outcome.value.added;

            reply(
                ctx,
                format!(
                    "quotes imported successfully! added {} new {}.{}",
                    added,
                    plural(added, "item", "items"),
                    warning_note(&outcome.warning),
                ),
            )
            .await
        }
        Err(e) => reply(ctx, format!("import failed: {e}")).await,
    }
}

/// clear stored quotes and restore the defaults.
#[poise::command(prefix_command, guild_only, required_permissions = "MANAGE_GUILD")]
#[tracing::instrument(skip_all)]
pub async fn reset(ctx: Context<'_>) -> Result<(), Error> {
    let outcome = ctx.data().store.lock().await.reset().await;

    reply(
        ctx,
        format!(
            "local & session storage cleared. restored default quotes.{}",
            warning_note(&outcome.warning)
        ),
    )
    .await
}

/// pull new quotes from the server.
#[poise::command(prefix_command, rename = "fetch")]
#[tracing::instrument(skip_all)]
pub async fn fetch_quotes(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();

    match remote_sync::fetch_into(&data.store, data.remote.as_ref()).await {
        Ok(outcome) => {
            reply(
                ctx,
                format!(
                    "fetched {} new {} from server.{}",
                    outcome.value.added,
                    plural(outcome.value.added, "quote", "quotes"),
                    warning_note(&outcome.warning),
                ),
            )
            .await
        }
        Err(e) => {
            tracing::error!(err = ?e, "an error occurred when fetching quotes");
            reply(ctx, "failed to fetch quotes from server.").await
        }
    }
}

/// push every quote to the server.
#[poise::command(prefix_command, rename = "sync")]
#[tracing::instrument(skip_all)]
pub async fn sync_quotes(ctx: Context<'_>) -> Result<(), Error> {
    let report = remote_sync::sync_quotes(ctx.data()).await;

    let content = if report.failed == 0 {
        format!(
            "all {} {} synced to server!",
            report.succeeded,
            plural(report.succeeded, "quote", "quotes")
        )
    } else {
        format!(
            "synced {}/{} quotes to server. {} failed.",
            report.succeeded,
            report.attempted(),
            report.failed
        )
    };

    reply(ctx, content).await
}
