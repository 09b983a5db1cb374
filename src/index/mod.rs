pub mod card;
pub mod splice;

pub use card::ArticleCard;
pub use splice::{splice, Splice};
