// src/models/tag.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Broad category of an oshi tag. Stored as lowercase TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TagCategory {
    Anime,
    Manga,
    Idol,
    Vtuber,
    Other,
}

/// Represents the 'oshi_tags' table in the database.
/// A tag names the character, idol or series a quiz is about.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct OshiTag {
    pub id: i64,
    pub name: String,
    pub category: TagCategory,
    pub description: Option<String>,
}

/// Compact tag reference embedded in quiz payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TagSummary {
    pub id: i64,
    pub name: String,
    pub category: TagCategory,
}

/// DTO for creating a new tag.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTagRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub category: TagCategory,
    #[validate(length(max = 1000))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
