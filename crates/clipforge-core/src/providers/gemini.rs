//! Google Gemini Provider
//!
//! Implements clip selection and metadata generation against the Gemini
//! `generateContent` API. Model output is normalized through one strict
//! schema; shapes that do not validate are rejected so the pipeline can take
//! its documented fallback instead of guessing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ClipSelector, MetadataGenerator};
use crate::timecode::parse_seconds;
use crate::{ClipBoundary, ClipError, ClipMetadata, ClipResult};

/// Default Gemini API base URL
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// =============================================================================
// Client
// =============================================================================

/// Gemini API client
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Creates a client. A missing key is a configuration error: the caller
    /// should not have selected this provider.
    pub fn new(api_key: &str, model: &str) -> ClipResult<Self> {
        if api_key.is_empty() {
            return Err(ClipError::Configuration(
                "Gemini API key is required".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| ClipError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        })
    }

    /// Runs one generateContent request and returns the model text.
    async fn generate(&self, prompt: &str, json_mode: bool) -> ClipResult<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: json_mode.then(|| "application/json".to_string()),
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClipError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClipError::Http(format!(
                "Gemini returned {}",
                response.status()
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ClipError::Http(e.to_string()))?;

        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| ClipError::Http("Gemini response had no candidates".to_string()))?;

        Ok(text)
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

// =============================================================================
// Schema Normalization
// =============================================================================

/// The one shape clip selections are accepted in.
#[derive(Deserialize)]
struct RawClip {
    clip_number: u32,
    start_time: String,
    end_time: String,
    title: String,
    #[serde(default)]
    hook: String,
    #[serde(default)]
    #[allow(dead_code)]
    reason: String,
}

/// The one shape metadata is accepted in.
#[derive(Deserialize)]
struct RawMetadata {
    title: String,
    description: String,
    #[serde(default)]
    tags: Vec<String>,
}

/// Strips a surrounding markdown code fence, the only normalization applied
/// before strict parsing.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Validates raw clips into boundaries, rejecting anything malformed.
fn normalize_clips(raw: Vec<RawClip>) -> ClipResult<Vec<ClipBoundary>> {
    let mut clips = Vec::with_capacity(raw.len());

    for clip in raw {
        if clip.clip_number == 0 {
            return Err(ClipError::SelectionRejected(
                "clip_number must be positive".to_string(),
            ));
        }
        if clip.title.trim().is_empty() {
            return Err(ClipError::SelectionRejected(format!(
                "clip {} has an empty title",
                clip.clip_number
            )));
        }

        let start_sec = parse_seconds(&clip.start_time);
        let end_sec = parse_seconds(&clip.end_time);
        if end_sec <= start_sec {
            return Err(ClipError::SelectionRejected(format!(
                "clip {} has a non-positive duration ({} to {})",
                clip.clip_number, clip.start_time, clip.end_time
            )));
        }

        clips.push(ClipBoundary {
            index: clip.clip_number,
            start_sec,
            end_sec,
            title: clip.title,
            hook: clip.hook,
        });
    }

    Ok(clips)
}

// =============================================================================
// Collaborator Implementations
// =============================================================================

#[async_trait]
impl ClipSelector for GeminiClient {
    async fn select(
        &self,
        transcript: &str,
        video_title: &str,
        source_duration_sec: f64,
    ) -> ClipResult<Vec<ClipBoundary>> {
        let prompt = format!(
            "Video title: {title}\nVideo length: {len:.0} seconds\nTranscript:\n{transcript}\n\n\
             Pick the most engaging clip moments. Respond with a JSON array of objects with \
             keys clip_number, start_time (MM:SS), end_time (MM:SS), title, hook.",
            title = video_title,
            len = source_duration_sec,
            transcript = transcript,
        );

        let text = self.generate(&prompt, true).await?;
        let raw: Vec<RawClip> = serde_json::from_str(strip_code_fence(&text))
            .map_err(|e| ClipError::SelectionRejected(format!("unparseable selection: {}", e)))?;

        normalize_clips(raw)
    }
}

#[async_trait]
impl MetadataGenerator for GeminiClient {
    async fn voiceover_script(
        &self,
        clip_hook: &str,
        clip_title: &str,
        video_title: &str,
    ) -> ClipResult<String> {
        let prompt = format!(
            "Write one short, punchy voiceover line (max 25 words) for a vertical clip.\n\
             Clip: {clip_title}\nHook: {clip_hook}\nFrom video: {video_title}",
        );

        let script = self.generate(&prompt, false).await?;
        Ok(script.trim().to_string())
    }

    async fn describe(
        &self,
        clip_title: &str,
        clip_hook: &str,
        video_title: &str,
    ) -> ClipResult<ClipMetadata> {
        let prompt = format!(
            "Clip: {clip_title}\nHook: {clip_hook}\nFrom video: {video_title}\n\n\
             Respond with a JSON object with keys title, description, tags (array of strings) \
             for uploading this clip as a short.",
        );

        let text = self.generate(&prompt, true).await?;
        let raw: RawMetadata = serde_json::from_str(strip_code_fence(&text))?;

        Ok(ClipMetadata {
            title: raw.title,
            description: raw.description,
            tags: raw.tags,
        })
    }
}
