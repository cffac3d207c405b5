//! Business logic services.

pub mod story_fetcher;

pub use story_fetcher::StoryFetcher;
