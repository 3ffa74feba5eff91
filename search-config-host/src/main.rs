//! Search Config Demo Entry Point
//!
//! Registers the search configuration registry for two sample entity types,
//! resolves it from a scope and prints the effective configuration as JSON.

use dotenv::dotenv;
use search_config::{FieldOptions, MatchMode, Member, MemberKind, Searchable};
use search_config_host::{
    search_options, HostError, SearchServiceCollectionExt, ServiceCollection, ServiceLifetime,
};
use std::env;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

struct Customer;

impl Searchable for Customer {
    fn members() -> &'static [Member] {
        const MEMBERS: &[Member] = &[
            Member::text("Name"),
            Member::text("Email"),
            Member::new("Age", MemberKind::Integer),
            Member::new("Avatar", MemberKind::Binary),
        ];
        MEMBERS
    }
}

struct Article;

impl Searchable for Article {
    fn members() -> &'static [Member] {
        const MEMBERS: &[Member] = &[
            Member::text("Title"),
            Member::text("Description"),
            Member::text("Body"),
            Member::new("PublishedAt", MemberKind::DateTime),
        ];
        MEMBERS
    }
}

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("search_config=info,search_config_host=info"));

    let json = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

fn run() -> Result<(), HostError> {
    let lifetime = ServiceLifetime::from_env();

    let mut services = ServiceCollection::new();
    services.configure_search(lifetime, |options| {
        options
            .entity::<Customer>()
            .declare("Name")?
            .declare_with("Email", MatchMode::Contains)?
            .declare_options("Age", FieldOptions::new().match_mode(MatchMode::Exact))?;

        // Articles keep the default Title/Description fallback.
        options.entity::<Article>();
        Ok(())
    });

    let provider = services.build();
    let scope = provider.create_scope();
    let options = search_options(&scope)?;

    info!(
        lifetime = %lifetime,
        entities = ?options.entity_names(),
        "Search configuration resolved"
    );

    println!("{}", serde_json::to_string_pretty(&options.snapshot())?);
    Ok(())
}

fn main() -> Result<(), HostError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing();

    info!(
        service_name = "search-config-demo",
        service_version = env!("CARGO_PKG_VERSION"),
        "Starting search configuration demo"
    );

    run().inspect_err(|e| error!(error = %e, "Search configuration demo failed"))
}
