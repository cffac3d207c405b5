//! Shared data models for the StoryVerse delivery backend.
//!
//! This crate provides Serde-serializable types for:
//! - Story documents (pages, media options, lifecycle status)
//! - Universe and character documents
//! - Media catalogue items with signed URLs
//! - Export package outcomes

pub mod character;
pub mod media;
pub mod story;
pub mod universe;

// Re-export common types
pub use character::{Ability, AgeRange, Character, CharacterType, Relationship, RelationshipType};
pub use media::{AssetFailure, MediaItem, MediaType, PackageOutcome};
pub use story::{
    AgeGroup, CharacterRole, MediaOptions, ModelError, ReadingLevel, Story, StoryCharacter,
    StoryContent, StoryLength, StoryPage, StoryStatus, StoryType,
};
pub use universe::{AgeRating, Universe, UniverseSetting, UniverseTheme};
