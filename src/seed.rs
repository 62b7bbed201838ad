//! Development data: the top-level category catalogue, an admin account,
//! a few verified shoppers, three products per category and their ratings.
//!
//! Every insert is keyed on a unique column, so running it again refreshes
//! the same rows instead of duplicating them.

use rust_decimal::{Decimal, dec};
use sqlx::PgPool;

use crate::{error::Result, models::Category, utils::password::hash_password_blocking};

pub const CATEGORIES: [(&str, &str); 17] = [
    ("Banheiros", "banheiros"),
    ("Climatização e Ventilação", "climatizacao-e-ventilacao"),
    ("Cozinhas e Áreas de Serviço", "cozinhas-e-areas-de-servico"),
    ("EPIs", "epis"),
    ("Ferragens", "ferragens"),
    ("Ferramentas", "ferramentas"),
    ("Iluminação", "iluminacao"),
    ("Impermeabilizantes", "impermeabilizantes"),
    ("Marcenaria e Madeiras", "marcenaria-e-madeiras"),
    ("Materiais de Construção", "materiais-de-construcao"),
    ("Materiais Elétricos", "materiais-eletricos"),
    ("Materiais Hidráulicos", "materiais-hidraulicos"),
    ("Organização e Limpeza do Ambiente", "organizacao-e-limpeza-do-ambiente"),
    ("Pisos e Revestimentos", "pisos-e-revestimentos"),
    ("Portas e Janelas", "portas-e-janelas"),
    ("Sistemas de Segurança e Comunicação", "sistemas-de-seguranca-e-comunicacao"),
    ("Tintas e Acessórios", "tintas-e-acessorios"),
];

const SAMPLE_USERS: [(&str, &str, &str); 4] = [
    ("Ana", "Silva", "seeduser1@example.com"),
    ("Bruno", "Souza", "seeduser2@example.com"),
    ("Carla", "Oliveira", "seeduser3@example.com"),
    ("Diego", "Santos", "seeduser4@example.com"),
];

/// Price tier of a seeded product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Low,
    Medium,
    High,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Low, Tier::Medium, Tier::High];

    fn suffix(self) -> &'static str {
        match self {
            Tier::Low => "L",
            Tier::Medium => "M",
            Tier::High => "H",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Tier::Low => "Básico",
            Tier::Medium => "Intermediário",
            Tier::High => "Premium",
        }
    }

    pub fn price(self) -> Decimal {
        match self {
            Tier::Low => dec!(19.90),
            Tier::Medium => dec!(79.90),
            Tier::High => dec!(249.90),
        }
    }

    pub fn ratings(self) -> [i16; 3] {
        match self {
            Tier::Low => [3, 2, 3],
            Tier::Medium => [4, 3, 4],
            Tier::High => [5, 4, 5],
        }
    }
}

#[derive(Debug)]
pub struct SeedOptions {
    pub admin_email: String,
    /// No admin account is written without a password.
    pub admin_password: Option<String>,
    pub user_password: String,
}

#[derive(Debug, Default)]
pub struct SeedReport {
    pub categories: usize,
    pub users: usize,
    pub products: usize,
    pub ratings: usize,
}

/// `CAT-<SLUG>-SEED-<TIER>`, with anything outside `A-Z0-9` collapsed to `-`.
pub fn seed_sku(slug: &str, tier: Tier) -> String {
    let mut upper = String::with_capacity(slug.len());
    for c in slug.chars() {
        if c.is_ascii_alphanumeric() {
            upper.push(c.to_ascii_uppercase());
        } else if !upper.ends_with('-') {
            upper.push('-');
        }
    }

    format!("CAT-{}-SEED-{}", upper.trim_matches('-'), tier.suffix())
}

pub async fn run(pool: &PgPool, options: &SeedOptions) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    let categories = seed_categories(pool).await?;
    report.categories = categories.len();

    if let Some(password) = options.admin_password.clone() {
        seed_admin(pool, &options.admin_email, password).await?;
        report.users += 1;
    } else {
        tracing::warn!("SEED_ADMIN_PASSWORD not set, skipping admin account");
    }

    let user_ids = seed_users(pool, options.user_password.clone()).await?;
    report.users += user_ids.len();

    let mut next_user = 0;
    for category in &categories {
        for tier in Tier::ALL {
            let product_id = seed_product(pool, category, tier).await?;
            report.products += 1;

            if user_ids.is_empty() {
                continue;
            }

            for score in tier.ratings() {
                let user_id = user_ids[next_user % user_ids.len()];
                next_user += 1;
                seed_rating(pool, product_id, user_id, score).await?;
                report.ratings += 1;
            }
        }
    }

    Ok(report)
}

async fn seed_categories(pool: &PgPool) -> Result<Vec<Category>> {
    let mut categories = Vec::with_capacity(CATEGORIES.len());

    for (name, slug) in CATEGORIES {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, slug)
             VALUES ($1, $2)
             ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name, updated_at = NOW()
             RETURNING *",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(pool)
        .await?;

        categories.push(category);
    }

    Ok(categories)
}

async fn seed_admin(pool: &PgPool, email: &str, password: String) -> Result<()> {
    let password_hash = hash_password_blocking(password).await?;

    sqlx::query(
        "INSERT INTO users (first_name, last_name, email, password_hash, role, email_verified_at)
         VALUES ('Admin', 'User', $1, $2, 'admin', NOW())
         ON CONFLICT (email) DO UPDATE
         SET password_hash = EXCLUDED.password_hash,
             role = 'admin',
             email_verified_at = COALESCE(users.email_verified_at, NOW()),
             updated_at = NOW()",
    )
    .bind(email)
    .bind(password_hash)
    .execute(pool)
    .await?;

    Ok(())
}

async fn seed_users(pool: &PgPool, password: String) -> Result<Vec<i32>> {
    let password_hash = hash_password_blocking(password).await?;
    let mut ids = Vec::with_capacity(SAMPLE_USERS.len());

    for (first_name, last_name, email) in SAMPLE_USERS {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO users (first_name, last_name, email, password_hash, role, email_verified_at)
             VALUES ($1, $2, $3, $4, 'user', NOW())
             ON CONFLICT (email) DO UPDATE
             SET first_name = EXCLUDED.first_name,
                 last_name = EXCLUDED.last_name,
                 updated_at = NOW()
             RETURNING id",
        )
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(&password_hash)
        .fetch_one(pool)
        .await?;

        ids.push(id);
    }

    Ok(ids)
}

async fn seed_product(pool: &PgPool, category: &Category, tier: Tier) -> Result<i32> {
    let id: i32 = sqlx::query_scalar(
        "INSERT INTO products (name, sku, price, category_id)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (sku) DO UPDATE
         SET name = EXCLUDED.name,
             price = EXCLUDED.price,
             category_id = EXCLUDED.category_id,
             updated_at = NOW()
         RETURNING id",
    )
    .bind(format!("{} {}", category.name, tier.label()))
    .bind(seed_sku(&category.slug, tier))
    .bind(tier.price())
    .bind(category.id)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn seed_rating(pool: &PgPool, product_id: i32, user_id: i32, score: i16) -> Result<()> {
    sqlx::query(
        "INSERT INTO product_ratings (product_id, user_id, rating)
         VALUES ($1, $2, $3)
         ON CONFLICT (product_id, user_id) DO UPDATE
         SET rating = EXCLUDED.rating, updated_at = NOW()",
    )
    .bind(product_id)
    .bind(user_id)
    .bind(score)
    .execute(pool)
    .await?;

    Ok(())
}
