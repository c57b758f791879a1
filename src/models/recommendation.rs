//! Recommendation models returned by the gateway.

use serde::{Deserialize, Serialize};

/// A generated set of activity suggestions for a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub message: String,
    pub date: String,
    pub activities: Vec<Activity>,
}

/// One suggested activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Filled in by place enrichment when a lookup succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_optional_fields_default() {
        let activity: Activity =
            serde_json::from_str(r#"{"title": "Fencing", "content": "En garde"}"#).unwrap();
        assert!(activity.location.is_none());
        assert!(activity.place_id.is_none());
    }

    #[test]
    fn recommendation_requires_core_fields() {
        // A response missing the fixed shape is a parse error, not a default.
        let result: Result<Recommendation, _> =
            serde_json::from_str(r#"{"activities": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn place_id_serializes_camel_case() {
        let activity = Activity {
            title: "Museum".into(),
            content: "Go look at art".into(),
            location: Some("City Gallery".into()),
            requests: None,
            url: None,
            place_id: Some("abc".into()),
        };
        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["placeId"], "abc");
        assert!(json.get("requests").is_none());
    }
}
