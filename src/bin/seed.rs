//! Populates the rule database from the built-in catalogue or `SEED_FILE`
//!
//! Takes no arguments. Safe to run repeatedly: existing categories and rules
//! are left untouched. Exits non-zero when the database cannot be opened or
//! the seed file cannot be read.

use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rulehub::config::Config;
use rulehub::data;
use rulehub::seed::{self, SeedData};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rulehub=info")),
        )
        .with_writer(std::io::stdout)
        .init();

    let config = Config::from_env()?;

    let data = match &config.seed_file {
        Some(path) => SeedData::from_path(path)?,
        None => data::builtin(),
    };
    info!(
        categories = data.categories.len(),
        rules = data.rules.len(),
        mode = ?config.seed_mode,
        source = config.seed_file.as_deref().unwrap_or("builtin"),
        "seeding"
    );

    let report = seed::with_catalog(&config.database_url, |catalog| {
        seed::run(catalog, &data, config.seed_mode, &mut rand::rng())
    })
    .with_context(|| format!("seeding {} failed", config.database_url))?;

    info!(
        categories_created = report.categories_created,
        categories_existing = report.categories_existing,
        categories_rejected = report.categories_rejected,
        rules_created = report.rules_created,
        rules_skipped = report.rules_skipped,
        rules_rejected = report.rules_rejected,
        categorizations_skipped = report.categorizations_skipped,
        "seed complete"
    );

    Ok(())
}
