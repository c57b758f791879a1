//! Recommendation gateway.
//!
//! Translates a ready group's aggregated preferences into a
//! chat-completion request, parses the structured result, and enriches
//! activities with place IDs. One successful result is cached per group
//! version; a malformed upstream response is never cached.

use std::collections::HashMap;

use serde::Deserialize;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::errors::AppError;
use crate::models::{Group, MemberPreferences, Recommendation};

/// System instruction fixing the required JSON output shape.
const SYSTEM_PROMPT: &str = "You are a helpful assistant that suggests common activities and places for groups of people based on their preferences. Format your response as a JSON object with the following structure: { message: string, date: string, activities: [{ title: string, content: string, location: string, requests: string, url: string }] }";

/// Gateway to the chat-completion and place-lookup APIs.
pub struct RecommendationGateway {
    http: reqwest::Client,
    chat_api_url: String,
    chat_api_key: Option<String>,
    chat_model: String,
    places_api_url: String,
    places_api_key: Option<String>,
    cache: RwLock<HashMap<String, (i64, Recommendation)>>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct PlaceLookupResponse {
    #[serde(default)]
    candidates: Vec<PlaceCandidate>,
}

#[derive(Debug, Deserialize)]
struct PlaceCandidate {
    place_id: String,
}

impl RecommendationGateway {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            chat_api_url: config.chat_api_url.clone(),
            chat_api_key: config.chat_api_key.clone(),
            chat_model: config.chat_model.clone(),
            places_api_url: config.places_api_url.clone(),
            places_api_key: config.places_api_key.clone(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Get recommendations for a group, serving the cached result while
    /// the group is unchanged and regenerating after any mutation.
    pub async fn recommendations_for(&self, group: &Group) -> Result<Recommendation, AppError> {
        if let Some((version, cached)) = self.cache.read().await.get(&group.code) {
            if *version == group.version {
                return Ok(cached.clone());
            }
        }

        let preferences: Vec<&MemberPreferences> = group
            .members
            .iter()
            .filter_map(|m| m.preferences.as_ref())
            .collect();

        let recommendation = self.request_recommendations(&preferences).await?;

        self.cache
            .write()
            .await
            .insert(group.code.clone(), (group.version, recommendation.clone()));

        Ok(recommendation)
    }

    /// Request recommendations for a set of member preferences.
    ///
    /// Does not check membership count; the caller gates on readiness.
    pub async fn request_recommendations(
        &self,
        preferences: &[&MemberPreferences],
    ) -> Result<Recommendation, AppError> {
        let body = serde_json::json!({
            "model": self.chat_model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": build_prompt(preferences) },
            ],
        });

        let mut request = self.http.post(&self.chat_api_url).json(&body);
        if let Some(key) = &self.chat_api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?.error_for_status()?;
        let payload: ChatCompletionResponse = response.json().await?;

        let content = payload
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or_else(|| AppError::Upstream("Chat response contained no choices".to_string()))?;

        let mut recommendation = parse_recommendation(content)?;

        // Place enrichment is a display enhancement: failures are logged
        // and the activity returned without a place ID.
        for activity in &mut recommendation.activities {
            let Some(location) = activity.location.as_deref().filter(|l| !l.is_empty()) else {
                continue;
            };
            match self.find_place_id(location).await {
                Ok(place_id) => activity.place_id = place_id,
                Err(e) => {
                    tracing::warn!("Place lookup failed for {:?}: {}", location, e);
                }
            }
        }

        Ok(recommendation)
    }

    /// Look up a place ID for a free-text location.
    async fn find_place_id(&self, location: &str) -> Result<Option<String>, AppError> {
        let mut request = self.http.get(&self.places_api_url).query(&[
            ("input", location),
            ("inputtype", "textquery"),
            ("fields", "place_id"),
        ]);
        if let Some(key) = &self.places_api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        let payload: PlaceLookupResponse = request.send().await?.error_for_status()?.json().await?;

        Ok(payload
            .candidates
            .into_iter()
            .next()
            .map(|candidate| candidate.place_id))
    }
}

/// Build the user message: one labeled block per member.
fn build_prompt(preferences: &[&MemberPreferences]) -> String {
    let mut prompt = String::from(
        "Based on the following group preferences, suggest activities and places that appeal to all members of the group:\n\n",
    );

    for (index, pref) in preferences.iter().enumerate() {
        prompt.push_str(&format!("Member {}:\n", index + 1));
        prompt.push_str(&format!("- Interests: {}\n", pref.interests));
        prompt.push_str(&format!("- Availability: {}\n", pref.availability));
        prompt.push_str(&format!("- Special Requests: {}\n", pref.special_requests));
        prompt.push_str(&format!("- Location: {}\n\n", pref.location));
    }

    prompt.push_str(
        "Please suggest common activities that would appeal to the whole group, taking into account their interests, availability, and any special requests. Include specific locations and URLs where applicable.",
    );

    prompt
}

/// Parse the chat message content as a recommendation.
fn parse_recommendation(content: &str) -> Result<Recommendation, AppError> {
    serde_json::from_str(content)
        .map_err(|e| AppError::Upstream(format!("Could not parse recommendation JSON: {}", e)))
}
