pub mod fetcher;

pub use fetcher::{FetchContext, FetchOutcome, HttpFetcher};
