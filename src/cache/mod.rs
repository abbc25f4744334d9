pub mod token;
pub mod token_cache;

pub use token::{AccessToken, TokenState};
pub use token_cache::TokenCache;
