mod fixture;
mod yahoo;

pub use fixture::StaticSource;
pub use yahoo::{YahooAdapter, YahooAuthManager};
