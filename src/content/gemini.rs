//! Gemini / Imagen REST client.
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;
use std::time::Duration;

use super::{ContentProvider, ProviderError};
use crate::config::Config;
use crate::model::{Category, FactDescriptor, Language};
use crate::util::strip_control_chars;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Base64 covers and PCM speech are a few MB; anything far beyond is wrong.
const MAX_RESPONSE_SIZE: usize = 20 * 1024 * 1024;
const MAX_RETRIES: u32 = 2;

static GEMINI_API_KEY: OnceLock<Option<SecretString>> = OnceLock::new();

fn env_api_key() -> Option<&'static SecretString> {
    GEMINI_API_KEY
        .get_or_init(|| {
            std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::from)
        })
        .as_ref()
}

// ============================================================================
// Settings
// ============================================================================

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub text_model: String,
    pub image_model: String,
    pub speech_model: String,
    pub voice: String,
    pub batch_size: u32,
    pub timeout: Duration,
}

impl GeminiSettings {
    /// Settings from the config file; `GEMINI_API_KEY` wins over the
    /// configured key.
    pub fn from_config(config: &Config) -> Self {
        let api_key = env_api_key().cloned().or_else(|| {
            config
                .gemini_api_key
                .as_deref()
                .filter(|k| !k.trim().is_empty())
                .map(|k| SecretString::from(k.to_string()))
        });
        Self {
            base_url: config
                .api_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            speech_model: config.speech_model.clone(),
            voice: config.voice.clone(),
            batch_size: config.batch_size.max(1),
            timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
        }
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

impl GenerateContentResponse {
    fn first_part(self) -> Option<Part> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()
    }
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
}

/// One fact as written by the text model.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFact {
    #[serde(default)]
    id: Value,
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    details: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    video_url: String,
    #[serde(default)]
    image_prompt: String,
}

// ============================================================================
// Client
// ============================================================================

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    settings: GeminiSettings,
}

impl GeminiClient {
    /// Build a client. The base URL must be HTTPS; plain HTTP is accepted
    /// only for localhost, which the tests use.
    pub fn new(settings: GeminiSettings) -> Result<Self, ProviderError> {
        let base = settings.base_url.trim_end_matches('/').to_string();
        if !base.starts_with("https://") {
            let is_localhost =
                base.starts_with("http://127.0.0.1") || base.starts_with("http://localhost");
            if !is_localhost {
                tracing::error!(base_url = %base, "Rejecting non-HTTPS base URL (HTTPS required except for localhost)");
                return Err(ProviderError::InsecureBaseUrl);
            }
            tracing::warn!(base_url = %base, "Using non-HTTPS Gemini base URL (localhost only)");
        }
        if base != DEFAULT_BASE_URL {
            tracing::info!(base_url = %base, "Using custom Gemini API base URL");
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("nightdeck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ProviderError::Network)?;

        let mut settings = settings;
        settings.base_url = base;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &GeminiSettings {
        &self.settings
    }

    fn api_key(&self) -> Result<&SecretString, ProviderError> {
        self.settings.api_key.as_ref().ok_or_else(|| {
            ProviderError::Unavailable("GEMINI_API_KEY is not set".to_string())
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.settings.base_url, model, method)
    }

    /// POST with retry on transient failures.
    /// Exponential backoff: 1s, 2s (max 2 retries).
    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &Value,
    ) -> Result<T, ProviderError> {
        let mut retry_count = 0;
        loop {
            match self.post_once(url, body).await {
                Ok(text) => {
                    return serde_json::from_str(&text)
                        .map_err(|e| ProviderError::InvalidResponse(e.to_string()));
                }
                Err(e) if e.is_retryable() && retry_count < MAX_RETRIES => {
                    let delay = 1u64 << retry_count;
                    tracing::debug!(
                        error = %e,
                        retry = retry_count + 1,
                        delay_secs = delay,
                        "Retrying Gemini request after transient error"
                    );
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn post_once(&self, url: &str, body: &Value) -> Result<String, ProviderError> {
        let key = self.api_key()?;
        let request = self
            .http
            .post(url)
            .header("x-goog-api-key", key.expose_secret())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string());

        let timeout = self.settings.timeout;
        let response = tokio::time::timeout(timeout, request.send())
            .await
            .map_err(|_| ProviderError::Timeout(timeout.as_secs()))?
            .map_err(ProviderError::Network)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            tracing::warn!(status, "Gemini request failed");
            return Err(ProviderError::HttpStatus(status));
        }

        tokio::time::timeout(timeout, read_limited_text(response, MAX_RESPONSE_SIZE))
            .await
            .map_err(|_| ProviderError::Timeout(timeout.as_secs()))?
    }
}

impl ContentProvider for GeminiClient {
    async fn fetch_facts(&self, lang: Language) -> Result<Vec<FactDescriptor>, ProviderError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": facts_prompt(lang, self.settings.batch_size) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": facts_schema(lang),
            },
        });
        let url = self.endpoint(&self.settings.text_model, "generateContent");
        let response: GenerateContentResponse = self.post_json(&url, &body).await?;
        let text = response
            .first_part()
            .and_then(|p| p.text)
            .ok_or(ProviderError::MissingData("fact text"))?;

        let facts = parse_facts(&text, lang)?;
        tracing::info!(count = facts.len(), lang = %lang, "Fetched fact descriptors");
        Ok(facts
            .into_iter()
            .take(self.settings.batch_size as usize)
            .collect())
    }

    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>, ProviderError> {
        let body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": { "sampleCount": 1, "aspectRatio": "3:4" },
        });
        let url = self.endpoint(&self.settings.image_model, "predict");
        let response: PredictResponse = self.post_json(&url, &body).await?;
        let encoded = response
            .predictions
            .into_iter()
            .next()
            .and_then(|p| p.bytes_base64_encoded)
            .ok_or(ProviderError::MissingData("image data"))?;
        decode_base64(&encoded)
    }

    async fn generate_speech(&self, text: &str) -> Result<Vec<u8>, ProviderError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.settings.voice }
                    }
                }
            },
        });
        let url = self.endpoint(&self.settings.speech_model, "generateContent");
        let response: GenerateContentResponse = self.post_json(&url, &body).await?;
        let encoded = response
            .first_part()
            .and_then(|p| p.inline_data)
            .map(|d| d.data)
            .ok_or(ProviderError::MissingData("audio data"))?;
        decode_base64(&encoded)
    }
}

// ============================================================================
// Prompt and Parsing
// ============================================================================

fn facts_prompt(lang: Language, count: u32) -> String {
    let language = lang.prompt_name();
    let categories = lang
        .categories()
        .iter()
        .map(|c| format!("'{}'", c.label()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Generate a list of {count} unique, real-world paranormal or witchcraft facts in {language}. \
         For each fact, provide: a unique id (string), a catchy title, a short summary (max 30 words), \
         a detailed explanation (150-200 words), a category from [{categories}], and a URL to a relevant, \
         atmospheric YouTube video (e.g. https://www.youtube.com/watch?v=VIDEO_ID) such as a short \
         documentary clip or found footage. Also provide 'imagePrompt': a detailed prompt (max 25 words) \
         for an image model describing a spooky, atmospheric, photorealistic scene that matches the fact. \
         Ensure the content is unique each time. The entire response must be in {language}."
    )
}

fn facts_schema(lang: Language) -> Value {
    let labels: Vec<&str> = lang.categories().iter().map(|c| c.label()).collect();
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "id": { "type": "STRING" },
                "title": { "type": "STRING" },
                "summary": { "type": "STRING" },
                "details": { "type": "STRING" },
                "category": { "type": "STRING", "enum": labels },
                "videoUrl": { "type": "STRING" },
                "imagePrompt": { "type": "STRING" },
            },
            "required": ["id", "title", "summary", "details", "category", "videoUrl", "imagePrompt"],
        }
    })
}

/// Parse the model's JSON array into descriptors.
///
/// Ids are namespaced with a short hash of the title because the model
/// tends to number facts "1".."5" in every batch.
fn parse_facts(text: &str, lang: Language) -> Result<Vec<FactDescriptor>, ProviderError> {
    let raw: Vec<RawFact> = serde_json::from_str(text.trim())
        .map_err(|e| ProviderError::InvalidResponse(format!("fact list: {e}")))?;
    if raw.is_empty() {
        return Err(ProviderError::MissingData("facts"));
    }

    Ok(raw
        .into_iter()
        .filter(|r| !r.title.trim().is_empty())
        .map(|r| {
            let category = Category::from_label(&r.category).unwrap_or_else(|| {
                let fallback = Category::fallback_for(lang);
                tracing::warn!(label = %r.category, fallback = %fallback, "Unknown category from provider");
                fallback
            });
            let title = clean(&r.title);
            FactDescriptor {
                id: stable_id(&r.id, &title),
                summary: clean(&r.summary),
                details: clean(&r.details),
                category,
                video_url: r.video_url.trim().to_string(),
                image_prompt: clean(&r.image_prompt),
                title,
            }
        })
        .collect())
}

fn clean(text: &str) -> String {
    strip_control_chars(text.trim()).into_owned()
}

fn stable_id(raw: &Value, title: &str) -> String {
    let prefix = match raw {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => "fact".to_string(),
    };
    let digest = Sha256::digest(title.as_bytes());
    let short: String = digest.iter().take(4).map(|b| format!("{b:02x}")).collect();
    format!("{prefix}-{short}")
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>, ProviderError> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| ProviderError::InvalidResponse(format!("base64 payload: {e}")))
}

async fn read_limited_text(response: reqwest::Response, limit: usize) -> Result<String, ProviderError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ProviderError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ProviderError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ProviderError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|_| ProviderError::InvalidResponse("invalid UTF-8".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: &str) -> GeminiSettings {
        GeminiSettings {
            base_url: base_url.to_string(),
            api_key: Some(SecretString::from("test-key".to_string())),
            text_model: "text-model".to_string(),
            image_model: "image-model".to_string(),
            speech_model: "speech-model".to_string(),
            voice: "Kore".to_string(),
            batch_size: 5,
            timeout: Duration::from_secs(5),
        }
    }

    fn text_response(text: &str) -> Value {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
    }

    fn facts_json() -> String {
        json!([
            {
                "id": "1",
                "title": "The Bell Witch",
                "summary": "A haunting in Tennessee.",
                "details": "In 1817 the Bell family reported...",
                "category": "Witchcraft",
                "videoUrl": "https://www.youtube.com/watch?v=abc",
                "imagePrompt": "Moonlit log cabin in fog"
            },
            {
                "id": 2,
                "title": "Mothman",
                "summary": "Point Pleasant sightings.",
                "details": "Between 1966 and 1967...",
                "category": "Werewolf",
                "videoUrl": "",
                "imagePrompt": "Red eyes over a bridge"
            }
        ])
        .to_string()
    }

    #[tokio::test]
    async fn test_fetch_facts_parses_descriptors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/text-model:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response(&facts_json())))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(settings(&server.uri())).unwrap();
        let facts = client.fetch_facts(Language::En).await.unwrap();

        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].title, "The Bell Witch");
        assert_eq!(facts[0].category, Category::Witchcraft);
        assert!(facts[0].id.starts_with("1-"));
        assert_eq!(facts[0].id.len(), "1-".len() + 8);
        assert!(facts[1].id.starts_with("2-"));
        // Unknown label falls back to the language's catch-all.
        assert_eq!(facts[1].category, Category::SupernaturalPhenomenon);
        assert_eq!(facts[1].image_prompt, "Red eyes over a bridge");
    }

    #[tokio::test]
    async fn test_fetch_facts_respects_batch_size() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response(&facts_json())))
            .mount(&server)
            .await;

        let mut s = settings(&server.uri());
        s.batch_size = 1;
        let client = GeminiClient::new(s).unwrap();
        assert_eq!(client.fetch_facts(Language::En).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_facts_invalid_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("not json")))
            .mount(&server)
            .await;

        let client = GeminiClient::new(settings(&server.uri())).unwrap();
        assert!(matches!(
            client.fetch_facts(Language::Fr).await,
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_facts_without_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(settings(&server.uri())).unwrap();
        assert!(matches!(
            client.fetch_facts(Language::En).await,
            Err(ProviderError::MissingData(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_image_decodes_prediction() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/image-model:predict"))
            .and(body_partial_json(json!({ "parameters": { "aspectRatio": "3:4" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [{ "bytesBase64Encoded": STANDARD.encode(b"png-bytes") }]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(settings(&server.uri())).unwrap();
        assert_eq!(client.generate_image("a foggy moor").await.unwrap(), b"png-bytes");
    }

    #[tokio::test]
    async fn test_generate_image_empty_predictions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "predictions": [] })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(settings(&server.uri())).unwrap();
        assert!(matches!(
            client.generate_image("x").await,
            Err(ProviderError::MissingData("image data"))
        ));
    }

    #[tokio::test]
    async fn test_generate_speech_uses_voice_and_decodes_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/speech-model:generateContent"))
            .and(body_partial_json(json!({
                "generationConfig": {
                    "responseModalities": ["AUDIO"],
                    "speechConfig": { "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": "Kore" } } }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{
                    "inlineData": { "mimeType": "audio/L16;rate=24000", "data": STANDARD.encode([0u8, 0, 1, 0]) }
                }] } }]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(settings(&server.uri())).unwrap();
        assert_eq!(client.generate_speech("Hello.").await.unwrap(), vec![0, 0, 1, 0]);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut s = settings(&server.uri());
        s.api_key = None;
        let client = GeminiClient::new(s).unwrap();
        let err = client.generate_speech("x").await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(settings(&server.uri())).unwrap();
        assert!(matches!(
            client.generate_image("x").await,
            Err(ProviderError::HttpStatus(400))
        ));
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [{ "bytesBase64Encoded": STANDARD.encode(b"ok") }]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(settings(&server.uri())).unwrap();
        assert_eq!(client.generate_image("x").await.unwrap(), b"ok");
    }

    #[test]
    fn test_http_base_url_rejected() {
        assert!(matches!(
            GeminiClient::new(settings("http://evil.example.com")),
            Err(ProviderError::InsecureBaseUrl)
        ));
    }

    #[test]
    fn test_https_base_url_accepted() {
        let client = GeminiClient::new(settings("https://proxy.example.com/")).unwrap();
        assert_eq!(client.settings().base_url, "https://proxy.example.com");
        assert_eq!(
            client.endpoint("m", "predict"),
            "https://proxy.example.com/v1beta/models/m:predict"
        );
    }

    #[test]
    fn test_prompt_names_language_and_categories() {
        let prompt = facts_prompt(Language::Fr, 5);
        assert!(prompt.contains("5 unique"));
        assert!(prompt.contains("FRENCH"));
        assert!(prompt.contains("'Fantôme'"));
        assert!(!prompt.contains("'Ghost'"));
    }

    #[test]
    fn test_stable_id_differs_by_title() {
        let id = Value::String("1".into());
        assert_ne!(stable_id(&id, "A"), stable_id(&id, "B"));
        assert_eq!(stable_id(&id, "A"), stable_id(&id, "A"));
        assert!(stable_id(&Value::Null, "A").starts_with("fact-"));
    }

    #[test]
    fn test_parse_strips_control_sequences() {
        let text = json!([{ "id": "x", "title": "\u{1b}[31mRed\u{1b}[0m Lady", "category": "Fantôme" }]).to_string();
        let facts = parse_facts(&text, Language::Fr).unwrap();
        assert_eq!(facts[0].title, "Red Lady");
        assert_eq!(facts[0].category, Category::Fantome);
    }
}
