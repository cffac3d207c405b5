//! Story document model.
//!
//! Mirrors the JSON shape served by the upstream story service. The delivery
//! pipeline treats stories as read-only inputs, so almost every field is
//! optional with a default: exports must work with partial documents that
//! carry only a title and page content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised when mutating story lifecycle fields.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: StoryStatus, to: StoryStatus },

    #[error("Generation progress out of range: {0} (must be 0-100)")]
    ProgressOutOfRange(u8),
}

/// Target age group for a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "3-5")]
    Preschool,
    #[serde(rename = "6-8")]
    EarlyReader,
    #[serde(rename = "9-12")]
    MiddleGrade,
}

/// Reading difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReadingLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

/// How the story combines universes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryType {
    SingleUniverse,
    Crossover,
    FusionWorld,
    UniverseHopping,
}

/// Story length category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryLength {
    BedtimeShort,
    ChapterAdventure,
    MiniEpic,
    SeriesCreator,
}

/// Role a character plays within a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterRole {
    Hero,
    Sidekick,
    Mentor,
    Rival,
    Custom,
}

/// Story lifecycle status.
///
/// Valid transitions: draft -> generating -> completed | failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoryStatus {
    #[default]
    Draft,
    Generating,
    Completed,
    Failed,
}

impl StoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryStatus::Draft => "draft",
            StoryStatus::Generating => "generating",
            StoryStatus::Completed => "completed",
            StoryStatus::Failed => "failed",
        }
    }

    /// Whether the status can move to `next`.
    pub fn can_transition_to(&self, next: StoryStatus) -> bool {
        matches!(
            (self, next),
            (StoryStatus::Draft, StoryStatus::Generating)
                | (StoryStatus::Generating, StoryStatus::Completed)
                | (StoryStatus::Generating, StoryStatus::Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StoryStatus::Completed | StoryStatus::Failed)
    }
}

impl fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A character reference embedded in a story.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StoryCharacter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universe_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<CharacterRole>,
}

/// A single story page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryPage {
    pub page_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Story content: either an ordered page sequence or flat text.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StoryContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<StoryPage>>,
}

impl StoryContent {
    /// Pages, if the story has any.
    pub fn pages(&self) -> &[StoryPage] {
        self.pages.as_deref().unwrap_or(&[])
    }

    pub fn has_pages(&self) -> bool {
        self.pages.as_ref().is_some_and(|p| !p.is_empty())
    }
}

/// Audio/narration options attached to a story.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MediaOptions {
    #[serde(default)]
    pub has_audio: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub has_background_music: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_url: Option<String>,
    #[serde(default)]
    pub has_interactive_elements: bool,
}

/// A story document as served by the upstream story service.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    #[serde(default, rename = "_id", alias = "id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_group: Option<AgeGroup>,
    #[serde(default)]
    pub reading_level: ReadingLevel,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub universes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub characters: Vec<StoryCharacter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_type: Option<StoryType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moral_lesson: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_length: Option<StoryLength>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultural_elements: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<StoryContent>,
    #[serde(default)]
    pub media_options: MediaOptions,
    #[serde(default)]
    pub status: StoryStatus,
    #[serde(default)]
    pub generation_progress: u8,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Story {
    /// Title with the renderer fallback applied.
    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or("Custom Story")
    }

    /// Pages, empty when the story only carries flat text.
    pub fn pages(&self) -> &[StoryPage] {
        self.content.as_ref().map(|c| c.pages()).unwrap_or(&[])
    }

    /// Flat text fallback, when no page array exists.
    pub fn flat_text(&self) -> Option<&str> {
        self.content.as_ref().and_then(|c| c.text.as_deref())
    }

    /// Move to a new lifecycle status, enforcing the transition rules.
    pub fn transition_to(&mut self, next: StoryStatus) -> Result<(), ModelError> {
        if !self.status.can_transition_to(next) {
            return Err(ModelError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Update generation progress, enforcing the 0-100 invariant.
    pub fn set_generation_progress(&mut self, pct: u8) -> Result<(), ModelError> {
        if pct > 100 {
            return Err(ModelError::ProgressOutOfRange(pct));
        }
        self.generation_progress = pct;
        Ok(())
    }
}
