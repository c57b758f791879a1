//! Group and member models.
//!
//! A group is identified by a short shareable code and collects one member
//! entry per participant. Readiness gates recommendation generation.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Alphabet for group codes: uppercase base-36.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a group code.
pub const GROUP_CODE_LEN: usize = 6;

/// A planning group shared between members.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Shareable join code, uppercase, immutable after creation.
    pub code: String,
    pub name: String,
    pub created_at: String,
    /// Change counter bumped by every successful mutation.
    pub version: i64,
    /// Members in join order.
    pub members: Vec<Member>,
}

impl Group {
    /// Whether recommendations can be generated: at least two members and
    /// every member has submitted preferences.
    pub fn is_ready(&self) -> bool {
        self.members.len() >= 2 && self.members.iter().all(|m| m.preferences.is_some())
    }

    /// Look up a member by uid.
    pub fn member(&self, uid: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.uid == uid)
    }
}

/// A participant in a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub uid: String,
    /// Display name snapshotted at join time, not live-synced.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// Absent until the member submits; present (even with empty fields)
    /// afterwards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<MemberPreferences>,
}

/// A member's submitted preferences. Replaced wholesale on every
/// submission, never merged field-by-field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPreferences {
    pub interests: String,
    pub availability: String,
    pub special_requests: String,
    pub location: String,
    pub updated_at: String,
}

/// Request body for creating a new group.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub name: String,
}

/// Request body for submitting preferences. Every field is optional on the
/// wire; an empty string still counts as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceFields {
    #[serde(default)]
    pub interests: String,
    #[serde(default)]
    pub availability: String,
    #[serde(default)]
    pub special_requests: String,
    #[serde(default)]
    pub location: String,
}

/// Generate a new group code from a cryptographically strong source.
pub fn generate_group_code() -> String {
    let mut rng = rand::rng();
    (0..GROUP_CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// Normalize a caller-supplied code before lookup: trim and uppercase.
pub fn normalize_group_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}
