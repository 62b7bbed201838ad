mod brand;
mod category;
mod page;
mod product;
mod rating;
mod token;
mod user;

pub use brand::*;
pub use category::*;
pub use page::*;
pub use product::*;
pub use rating::*;
pub use token::*;
pub use user::*;
