pub mod brand_queries;
pub mod category_queries;
pub mod products_queries;
pub mod rating_queries;
pub mod token_queries;
pub mod user_queries;
