//! Rate limiting of outbound requests.

mod fetcher;
mod limiter;

pub use fetcher::RateLimitedFetcher;
pub use limiter::WindowLimiter;
