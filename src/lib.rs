pub mod cache;
pub mod errors;
pub mod fetcher;
pub mod market_api;

pub use cache::{CacheEntry, Clock, MarketCache, MarketSource, SystemClock};
pub use errors::MarketError;
pub use fetcher::fetch_basket;
pub use market_api::sources::ExchangeSource;
pub use market_api::*;
