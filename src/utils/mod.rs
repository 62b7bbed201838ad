pub mod extractors;
pub mod jwt;
pub mod nullable;
pub mod password;
pub mod tokens;
