pub use super::dividends::Entity as Dividends;
pub use super::sentiment::Entity as Sentiment;
