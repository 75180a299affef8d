//! Client for the hosted transcription endpoint.
//!
//! Speaks the OpenAI-compatible `/audio/transcriptions` multipart protocol
//! with a fixed model parameter. The client holds only an immutable token
//! and a connection pool, so one instance is shared across row tasks.

use asr_fetcher::AudioBuffer;
use asr_types::UserError;
use reqwest::multipart;
use tracing::{debug, error, info};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "whisper-1";

#[derive(Debug, Clone)]
pub struct TranscriptionClient {
    client: reqwest::Client,
    api_token: String,
    base_url: String,
    model: String,
}

impl TranscriptionClient {
    pub fn new(api_token: String, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_token,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    /// Submit one audio buffer and return the transcript text. Each call is
    /// attempted exactly once; every failure kind collapses into a single
    /// transcription error after the full detail is logged.
    pub async fn transcribe(&self, audio: &AudioBuffer) -> Result<String, UserError> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        let file_part =
            multipart::Part::bytes(audio.bytes.clone()).file_name(audio.file_name.clone());
        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "text")
            .part("file", file_part);

        debug!(model = %self.model, file_name = %audio.file_name, "sending audio to transcription API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "transcription request failed");
                UserError::Transcription(format!("request: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            error!(%status, %body, "transcription API returned an error");
            return Err(UserError::Transcription(format!("status {status}: {body}")));
        }

        let transcript = response.text().await.map_err(|e| {
            error!(error = %e, "failed to read transcription response body");
            UserError::Transcription(format!("body: {e}"))
        })?;

        info!(chars = transcript.len(), "transcription completed");

        Ok(transcript.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn buffer() -> AudioBuffer {
        AudioBuffer {
            bytes: b"not really audio".to_vec(),
            file_name: "clip.mp3".into(),
            content_type: Some("audio/mpeg".into()),
        }
    }

    #[tokio::test]
    async fn returns_trimmed_transcript_text() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/audio/transcriptions")
            .match_header("authorization", "Bearer tok-1")
            .match_header("content-type", Matcher::Regex("multipart/form-data".into()))
            .with_status(200)
            .with_body("hello world\n")
            .create_async()
            .await;

        let client = TranscriptionClient::new("tok-1".into(), Some(server.url()), None);
        let text = client.transcribe(&buffer()).await.unwrap();
        assert_eq!(text, "hello world");
    }

    #[tokio::test]
    async fn sends_model_field_in_form() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/audio/transcriptions")
            .match_body(Matcher::Regex("whisper-1".into()))
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let client = TranscriptionClient::new("tok".into(), Some(server.url()), None);
        client.transcribe(&buffer()).await.unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn api_error_maps_to_transcription_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/audio/transcriptions")
            .with_status(401)
            .with_body("invalid api key")
            .create_async()
            .await;

        let client = TranscriptionClient::new("bad".into(), Some(server.url()), None);
        let err = client.transcribe(&buffer()).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Error processing transcription API"));
        assert!(msg.contains("401"));
    }
}
