//! HTTP routes, all mounted under `/api`.
//!
//! ```text
//! GET    /health                         - Liveness
//! GET    /health/ready                   - Database ping
//!
//! POST   /auth/register                  - Create account, issue verification token
//! POST   /auth/login                     - Exchange credentials for a JWT
//! GET    /auth/me                        - Current profile (auth)
//! POST   /auth/forgot-password           - Issue password reset token
//! POST   /auth/reset-password            - Redeem password reset token
//! POST   /auth/verify-email              - Redeem email verification token
//! POST   /auth/resend-verification       - Issue a fresh verification token
//!
//! GET    /brands, /brands/{id}
//! POST   /brands                         - (admin)
//! PUT    /brands/{id}, DELETE /brands/{id} (admin)
//!
//! GET    /categories, /categories/tree, /categories/{id}
//! POST   /categories                     - (admin)
//! PUT    /categories/{id}, DELETE /categories/{id} (admin)
//!
//! GET    /products, /products/featured/list, /products/{id}, /products/{id}/image
//! POST   /products                       - JSON or multipart (admin)
//! PUT    /products/{id}, DELETE /products/{id} (admin)
//! GET    /products/{id}/ratings
//! POST   /products/{id}/ratings          - Create or update own rating (auth)
//! ```

mod brands;
mod categories;
mod email_verification;
mod health;
mod login;
mod password_reset;
mod products;
mod ratings;
mod register;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};

use crate::{
    AppState,
    middleware::{admin_middleware, auth_middleware},
};

fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::health_check))
        .route("/ready", get(health::readiness_check))
}

fn auth_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(login::current_user))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/register", post(register::register_user))
        .route("/login", post(login::login_user))
        .route("/forgot-password", post(password_reset::forgot_password))
        .route("/reset-password", post(password_reset::reset_password))
        .route("/verify-email", post(email_verification::verify_email))
        .route(
            "/resend-verification",
            post(email_verification::resend_verification),
        )
        .merge(protected)
}

fn brand_routes(state: &AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/", post(brands::create_brand))
        .route(
            "/{id}",
            put(brands::update_brand).delete(brands::delete_brand),
        )
        .route_layer(from_fn_with_state(state.clone(), admin_middleware));

    Router::new()
        .route("/", get(brands::list_brands))
        .route("/{id}", get(brands::get_brand))
        .merge(admin)
}

fn category_routes(state: &AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/", post(categories::create_category))
        .route(
            "/{id}",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route_layer(from_fn_with_state(state.clone(), admin_middleware));

    Router::new()
        .route("/", get(categories::list_categories))
        .route("/tree", get(categories::get_category_tree))
        .route("/{id}", get(categories::get_category))
        .merge(admin)
}

fn product_routes(state: &AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/", post(products::create_product))
        .route(
            "/{id}",
            put(products::update_product).delete(products::delete_product),
        )
        .route_layer(from_fn_with_state(state.clone(), admin_middleware));

    let authenticated = Router::new()
        .route("/{id}/ratings", post(ratings::upsert_rating))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/", get(products::list_products))
        .route("/featured/list", get(products::featured_products))
        .route("/{id}", get(products::get_product))
        .route("/{id}/image", get(products::get_product_image))
        .route("/{id}/ratings", get(ratings::list_ratings))
        .merge(admin)
        .merge(authenticated)
}

pub fn create_router(state: &AppState) -> Router<AppState> {
    let api = Router::new()
        .nest("/health", health_routes())
        .nest("/auth", auth_routes(state))
        .nest("/brands", brand_routes(state))
        .nest("/categories", category_routes(state))
        .nest("/products", product_routes(state));

    Router::new().nest("/api", api)
}
