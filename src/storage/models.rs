use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The media collections a user profile carries. Each kind owns an
/// independent group of indexed slots with its own capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Gallery photos. Uploads only.
    Image,
    /// Profile videos, uploaded or externally hosted. Both forms share one
    /// capacity pool.
    Video,
    /// Portfolio pieces, uploaded or linked.
    Portfolio,
    /// The introduction video: a single slot holding either an upload or a
    /// link, never both.
    Intro,
}

impl MediaKind {
    pub const ALL: [MediaKind; 4] = [
        MediaKind::Image,
        MediaKind::Video,
        MediaKind::Portfolio,
        MediaKind::Intro,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Video => "videos",
            MediaKind::Portfolio => "portfolio",
            MediaKind::Intro => "intro",
        }
    }

    /// Whether this kind admits externally hosted URLs alongside uploads.
    pub fn accepts_links(&self) -> bool {
        !matches!(self, MediaKind::Image)
    }

    /// MIME-family check for uploaded content. Deeper validation (duration,
    /// dimensions) belongs to the upload pipeline upstream of this service.
    pub fn accepts_mime(&self, mime_type: &str) -> bool {
        let family = mime_type.split('/').next().unwrap_or("");
        match self {
            MediaKind::Image => family == "image",
            MediaKind::Video | MediaKind::Intro => family == "video",
            MediaKind::Portfolio => family == "image" || family == "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = UnknownMediaKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "images" => Ok(MediaKind::Image),
            "videos" => Ok(MediaKind::Video),
            "portfolio" => Ok(MediaKind::Portfolio),
            "intro" => Ok(MediaKind::Intro),
            _ => Err(UnknownMediaKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown media kind: {0}")]
pub struct UnknownMediaKind(pub String);

/// Opaque locator for a slot's content: a key into the asset store for
/// uploaded files, or an external URL for linked media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "ref", rename_all = "lowercase")]
pub enum PayloadRef {
    Upload(String),
    Link(String),
}

impl PayloadRef {
    /// The asset-store key, when the payload is an upload.
    pub fn asset_key(&self) -> Option<&str> {
        match self {
            PayloadRef::Upload(key) => Some(key),
            PayloadRef::Link(_) => None,
        }
    }

    pub fn is_link(&self) -> bool {
        matches!(self, PayloadRef::Link(_))
    }
}

/// One per (user, kind). Created lazily on first write and immutable as a
/// container; its id keys the slot rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaGroupRecord {
    pub id: String,
    pub user_id: String,
    pub kind: MediaKind,
    pub created_at: DateTime<Utc>,
}

impl MediaGroupRecord {
    /// Key of the group row: stable per (user, kind).
    pub fn storage_key(user_id: &str, kind: MediaKind) -> String {
        format!("{user_id}/{kind}")
    }
}

/// A slot row stored in redb. For a given group no two live rows share an
/// index; `index` is always below the kind's capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotRecord {
    pub group_id: String,
    pub index: u32,
    pub payload: PayloadRef,

    // Set for uploads, absent for links.
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub byte_size: Option<u64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
