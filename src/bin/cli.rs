//! Command line administration tool for shortlink.
//!
//! Works directly against the configured store, without going through the
//! HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Shorten a URL
//! shortlink-cli short-url generate https://example.com --custom-slug docs --tag team
//!
//! # Issue and revoke API keys
//! shortlink-cli api-key generate --expiration-date 2027-01-01T00:00:00Z
//! shortlink-cli api-key disable <key>
//!
//! # Locate visits left pending by the background worker
//! shortlink-cli visit process
//!
//! # Values for a fresh .env
//! shortlink-cli config generate-charset
//! shortlink-cli config generate-secret
//! ```
//!
//! # Environment Variables
//!
//! Same as the server (see `shortlink::config`). The `config` commands need none.

use shortlink::api::dto::short_urls::split_comma_list;
use shortlink::application::services::{
    ApiKeyService, CreateShortUrl, ShortUrlService, TagService, VisitService,
};
use shortlink::config::{Config, load_from_env};
use shortlink::domain::entities::{ShortUrl, ShortUrlMeta};
use shortlink::domain::list_query::{OrderBy, ShortUrlsListQuery};
use shortlink::domain::repositories::VisitsFilter;
use shortlink::infrastructure::persistence::Repositories;
use shortlink::server;
use shortlink::utils::code_generator::{generate_secret, shuffled_default_chars};

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;

/// CLI tool for managing shortlink.
#[derive(Parser)]
#[command(name = "shortlink-cli")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage short URLs
    ShortUrl {
        #[command(subcommand)]
        action: ShortUrlAction,
    },

    /// Manage API keys
    ApiKey {
        #[command(subcommand)]
        action: ApiKeyAction,
    },

    /// Manage tags
    Tag {
        #[command(subcommand)]
        action: TagAction,
    },

    /// Visit maintenance
    Visit {
        #[command(subcommand)]
        action: VisitAction,
    },

    /// Generate configuration values
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ShortUrlAction {
    /// Create a short URL
    Generate {
        long_url: String,

        #[arg(long)]
        custom_slug: Option<String>,

        /// RFC 3339 timestamp
        #[arg(long)]
        valid_since: Option<DateTime<Utc>>,

        /// RFC 3339 timestamp
        #[arg(long)]
        valid_until: Option<DateTime<Utc>>,

        #[arg(long)]
        max_visits: Option<i32>,

        /// Repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Show where a short code currently redirects
    Resolve { short_code: String },

    /// List short URLs
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 10)]
        items_per_page: u32,

        #[arg(long)]
        search_term: Option<String>,

        /// Comma-separated, all must match
        #[arg(long)]
        tags: Option<String>,

        /// e.g. `visits-DESC`
        #[arg(long)]
        order_by: Option<String>,
    },

    /// List visits of a short URL
    Visits {
        short_code: String,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 20)]
        items_per_page: u32,
    },

    /// Delete a short URL and its visits
    Delete {
        short_code: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ApiKeyAction {
    /// Generate a new key
    Generate {
        /// RFC 3339 timestamp
        #[arg(long)]
        expiration_date: Option<DateTime<Utc>>,
    },

    /// Disable a key permanently
    Disable {
        key: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List keys
    List {
        #[arg(long)]
        enabled_only: bool,
    },
}

#[derive(Subcommand)]
enum TagAction {
    /// List tags with usage counts
    List,

    /// Create tags
    Create {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Rename a tag
    Rename { old_name: String, new_name: String },

    /// Delete tags
    Delete {
        #[arg(required = true)]
        names: Vec<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Delete tags no short URL uses
    Prune,
}

#[derive(Subcommand)]
enum VisitAction {
    /// Locate every visit still pending geolocation
    Process {
        #[arg(long, default_value_t = 100)]
        batch_size: i64,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print a shuffled SHORTCODE_CHARS value
    GenerateCharset,

    /// Print a random TOKEN_SIGNING_SECRET value
    GenerateSecret,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Config { action } => return handle_config_action(action),
        other => other,
    };

    let config = load_from_env()?;
    let repositories = server::connect_repositories(&config).await?;

    match command {
        Commands::ShortUrl { action } => {
            handle_short_url_action(action, &config, &repositories).await?
        }
        Commands::ApiKey { action } => {
            handle_api_key_action(action, &config, &repositories).await?
        }
        Commands::Tag { action } => handle_tag_action(action, &repositories).await?,
        Commands::Visit { action } => handle_visit_action(action, &config, &repositories).await?,
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn short_url_service(config: &Config, repositories: &Repositories) -> Result<ShortUrlService> {
    Ok(ShortUrlService::new(
        repositories.short_urls.clone(),
        server::build_url_validator(config)?,
        config.alphabet()?,
        config.short_domain_schema.clone(),
        config.short_domain_host.clone(),
    ))
}

fn confirm(prompt: &str, skip: bool) -> Result<bool> {
    if skip {
        return Ok(true);
    }

    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
    }

    Ok(confirmed)
}

fn print_short_url(service: &ShortUrlService, short_url: &ShortUrl) {
    println!(
        "  Short URL:  {}",
        service.short_url(&short_url.short_code).bright_yellow().bold()
    );
    println!("  Long URL:   {}", short_url.original_url.cyan());
    println!("  Visits:     {}", short_url.visits_count);
    if !short_url.tags.is_empty() {
        println!("  Tags:       {}", short_url.tags.join(", "));
    }
    if let Some(since) = short_url.valid_since {
        println!("  Valid since: {}", since.to_rfc3339());
    }
    if let Some(until) = short_url.valid_until {
        println!("  Valid until: {}", until.to_rfc3339());
    }
    if let Some(max) = short_url.max_visits {
        println!("  Max visits: {}", max);
    }
}

/// Dispatches short URL commands.
async fn handle_short_url_action(
    action: ShortUrlAction,
    config: &Config,
    repositories: &Repositories,
) -> Result<()> {
    let service = short_url_service(config, repositories)?;

    match action {
        ShortUrlAction::Generate {
            long_url,
            custom_slug,
            valid_since,
            valid_until,
            max_visits,
            tags,
        } => {
            let created = service
                .create(CreateShortUrl {
                    long_url,
                    custom_slug,
                    meta: ShortUrlMeta {
                        valid_since,
                        valid_until,
                        max_visits,
                    },
                    tags,
                })
                .await?;

            println!("{}", "✅ Short URL created".green().bold());
            println!();
            print_short_url(&service, &created);
        }
        ShortUrlAction::Resolve { short_code } => {
            let short_url = service.resolve(&short_code, Utc::now()).await?;
            println!("{}", short_url.original_url);
        }
        ShortUrlAction::List {
            page,
            items_per_page,
            search_term,
            tags,
            order_by,
        } => {
            list_short_urls(&service, page, items_per_page, search_term, tags, order_by).await?
        }
        ShortUrlAction::Visits {
            short_code,
            page,
            items_per_page,
        } => {
            let visits = VisitService::new(
                repositories.short_urls.clone(),
                repositories.visits.clone(),
            );
            list_visits(&visits, &short_code, page, items_per_page).await?
        }
        ShortUrlAction::Delete { short_code, yes } => {
            let short_url = service.get(&short_code).await?;
            print_short_url(&service, &short_url);
            println!();

            if confirm("Delete this short URL and all its visits?", yes)? {
                service.delete(&short_code).await?;
                println!("{}", "✅ Short URL deleted".green().bold());
            }
        }
    }

    Ok(())
}

/// Lists short URLs as a table.
///
/// # Output Format
///
/// ```text
/// 📋 Short URLs (page 1/3, 25 total)
///
///   Code       Visits  Created           Long URL
///   abc123         12  2026-01-15 10:30  https://example.com/page
/// ```
async fn list_short_urls(
    service: &ShortUrlService,
    page: u32,
    items_per_page: u32,
    search_term: Option<String>,
    tags: Option<String>,
    order_by: Option<String>,
) -> Result<()> {
    let page = page.max(1);
    let items_per_page = items_per_page.clamp(1, 1000);
    let offset = i64::from(page - 1) * i64::from(items_per_page);

    let order_by: OrderBy = order_by
        .as_deref()
        .map(|raw| raw.parse().unwrap_or_default())
        .unwrap_or_default();
    let mut query = ShortUrlsListQuery::new()
        .with_tags(split_comma_list(tags.as_deref()))
        .order_by(order_by)
        .paginate(i64::from(items_per_page), offset);
    if let Some(term) = search_term {
        query = query.search(term);
    }

    let (short_urls, total) = tokio::try_join!(service.list(query.clone()), service.count(&query))?;
    let pages = (total.max(0) as u64).div_ceil(u64::from(items_per_page));

    println!(
        "{} (page {}/{}, {} total)",
        "📋 Short URLs".bright_blue().bold(),
        page,
        pages,
        total
    );
    println!();

    if short_urls.is_empty() {
        println!("{}", "  No short URLs found".yellow());
        return Ok(());
    }

    println!(
        "  {:<12} {:>7}  {:<17} {}",
        "Code".bright_white().bold(),
        "Visits".bright_white().bold(),
        "Created".bright_white().bold(),
        "Long URL".bright_white().bold()
    );
    println!("  {}", "─".repeat(75).bright_black());

    for short_url in &short_urls {
        println!(
            "  {:<12} {:>7}  {:<17} {}",
            short_url.short_code.cyan(),
            short_url.visits_count,
            short_url
                .date_created
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            short_url.original_url
        );
    }
    println!();

    Ok(())
}

async fn list_visits(
    service: &VisitService,
    short_code: &str,
    page: u32,
    items_per_page: u32,
) -> Result<()> {
    let page = page.max(1);
    let items_per_page = items_per_page.clamp(1, 1000);
    let offset = i64::from(page - 1) * i64::from(items_per_page);

    let result = service
        .visits_for(
            short_code,
            VisitsFilter::new(offset, i64::from(items_per_page)),
        )
        .await?;

    println!(
        "{} {} ({} total)",
        "👣 Visits of".bright_blue().bold(),
        short_code.cyan(),
        result.total
    );
    println!();

    for visit in &result.visits {
        let place = visit
            .location
            .as_ref()
            .map(|l| {
                [l.city_name.as_deref(), l.country_name.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "  {}  {:<39} {:<30} {}",
            visit.date.format("%Y-%m-%d %H:%M:%S").to_string().bright_black(),
            visit.remote_addr.as_deref().unwrap_or("-"),
            place,
            visit.referer.as_deref().unwrap_or("-").bright_black()
        );
    }
    println!();

    Ok(())
}

/// Dispatches API key commands.
async fn handle_api_key_action(
    action: ApiKeyAction,
    config: &Config,
    repositories: &Repositories,
) -> Result<()> {
    let service = ApiKeyService::new(
        repositories.api_keys.clone(),
        config.token_signing_secret.clone(),
    );

    match action {
        ApiKeyAction::Generate { expiration_date } => {
            let (raw, key) = service.create(expiration_date).await?;

            println!("{}", "🔑 API key generated".green().bold());
            println!();
            println!("  Key:     {}", raw.bright_yellow().bold());
            println!("  Prefix:  {}", key.key_prefix.cyan());
            if let Some(expiration) = key.expiration_date {
                println!("  Expires: {}", expiration.to_rfc3339());
            }
            println!();
            println!(
                "{}",
                "⚠️  IMPORTANT: Save this key now! You won't be able to see it again."
                    .red()
                    .bold()
            );
            println!();
            println!("{}", "Add this to your requests:".bright_white());
            println!("  {}: {}", "X-Api-Key".bright_cyan(), raw.bright_yellow());
            println!();
        }
        ApiKeyAction::Disable { key, yes } => {
            if confirm("Disable this API key? This cannot be undone", yes)? {
                service.disable(&key).await?;
                println!("{}", "✅ API key disabled".green().bold());
            }
        }
        ApiKeyAction::List { enabled_only } => {
            let now = Utc::now();
            let keys = service.list(enabled_only).await?;

            println!("{}", "📋 API Keys".bright_blue().bold());
            println!();

            if keys.is_empty() {
                println!("{}", "  No API keys found".yellow());
                println!();
                println!("  Create one with: {}", "shortlink-cli api-key generate".bright_cyan());
                return Ok(());
            }

            println!(
                "  {:<5} {:<10} {:<17} {:<26} {}",
                "ID".bright_white().bold(),
                "Prefix".bright_white().bold(),
                "Created".bright_white().bold(),
                "Expires".bright_white().bold(),
                "Status".bright_white().bold()
            );
            println!("  {}", "─".repeat(75).bright_black());

            for key in &keys {
                let status = if !key.enabled {
                    "DISABLED".red()
                } else if key.is_expired(now) {
                    "EXPIRED".yellow()
                } else {
                    "ACTIVE".green()
                };

                println!(
                    "  {:<5} {:<10} {:<17} {:<26} {}",
                    key.id.to_string().bright_black(),
                    key.key_prefix.cyan(),
                    key.date_created.format("%Y-%m-%d %H:%M").to_string(),
                    key.expiration_date
                        .map(|d| d.to_rfc3339())
                        .unwrap_or_else(|| "never".to_string()),
                    status
                );
            }

            println!();
            println!("  Total: {}", keys.len().to_string().bright_white().bold());
            println!();
        }
    }

    Ok(())
}

/// Dispatches tag commands.
async fn handle_tag_action(action: TagAction, repositories: &Repositories) -> Result<()> {
    let service = TagService::new(repositories.tags.clone());

    match action {
        TagAction::List => {
            let tags = service.list().await?;

            println!("{}", "🏷️  Tags".bright_blue().bold());
            println!();
            if tags.is_empty() {
                println!("{}", "  No tags found".yellow());
            }
            for tag in &tags {
                println!("  {:<30} {:>7}", tag.name.cyan(), tag.short_urls_count);
            }
            println!();
        }
        TagAction::Create { names } => {
            let created = service.create(names).await?;
            println!("{} {}", "✅ Tags created:".green().bold(), created);
        }
        TagAction::Rename { old_name, new_name } => {
            service.rename(&old_name, &new_name).await?;
            println!(
                "{} {} → {}",
                "✅ Tag renamed:".green().bold(),
                old_name,
                new_name.cyan()
            );
        }
        TagAction::Delete { names, yes } => {
            let prompt = format!("Delete tags {}?", names.join(", "));
            if confirm(&prompt, yes)? {
                let deleted = service.delete(names).await?;
                println!("{} {}", "✅ Tags deleted:".green().bold(), deleted);
            }
        }
        TagAction::Prune => {
            let deleted = service.prune_orphans().await?;
            println!("{} {}", "✅ Orphan tags deleted:".green().bold(), deleted);
        }
    }

    Ok(())
}

/// Runs geolocation for every pending visit.
async fn handle_visit_action(
    action: VisitAction,
    config: &Config,
    repositories: &Repositories,
) -> Result<()> {
    match action {
        VisitAction::Process { batch_size } => {
            let cache = server::connect_cache(config).await;
            let locator = server::build_locator(config, repositories, cache)?;

            println!("{}", "🌍 Locating pending visits...".bright_blue());
            let summary = locator.process_pending(batch_size.max(1)).await?;

            println!();
            println!("  Located: {}", summary.located.to_string().bright_green().bold());
            println!("  Skipped: {}", summary.skipped.to_string().bright_black());
            println!("  Pending: {}", summary.pending.to_string().yellow());
            println!();
        }
    }

    Ok(())
}

fn handle_config_action(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::GenerateCharset => println!("{}", shuffled_default_chars()),
        ConfigAction::GenerateSecret => println!("{}", generate_secret()?),
    }

    Ok(())
}
