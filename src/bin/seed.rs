use std::env;

use storefront_api::{config::DatabaseConfig, database, seed};
use tracing::Level;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let config = match DatabaseConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match database::create_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    let options = seed::SeedOptions {
        admin_email: env::var("SEED_ADMIN_EMAIL")
            .map(|email| email.trim().to_lowercase())
            .unwrap_or_else(|_| "admin@example.com".to_string()),
        admin_password: env::var("SEED_ADMIN_PASSWORD").ok().filter(|p| !p.is_empty()),
        user_password: env::var("SEED_USER_PASSWORD").unwrap_or_else(|_| "password123".to_string()),
    };

    match seed::run(&pool, &options).await {
        Ok(report) => tracing::info!(
            "Seeded {} categories, {} users, {} products, {} ratings",
            report.categories,
            report.users,
            report.products,
            report.ratings
        ),
        Err(e) => {
            tracing::error!("Seeding failed: {}", e);
            std::process::exit(1);
        }
    }
}
