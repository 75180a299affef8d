//! Fetcher: downloads per-row audio URLs into in-memory buffers.

use asr_types::UserError;
use tracing::debug;
use url::Url;

/// Name given to a buffer whose URL and response headers reveal nothing
/// about the format. The extension still lets the ASR endpoint pick a codec.
const FALLBACK_FILE_NAME: &str = "downloaded_audio.mp3";

/// A downloaded audio file held in memory, tagged with a filename so the
/// transcription API can infer a content type.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: Option<String>,
}

/// Download `url` with a single GET. No retry, no timeout override. Any
/// transport failure or non-2xx status maps to a download error carrying
/// the URL, so callers can surface it per row.
pub async fn fetch_audio(client: &reqwest::Client, url: &str) -> Result<AudioBuffer, UserError> {
    let parsed =
        Url::parse(url).map_err(|e| UserError::Download(format!("{url}: invalid URL: {e}")))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(UserError::Download(format!(
            "{url}: unsupported scheme: {}",
            parsed.scheme()
        )));
    }

    let resp = client
        .get(parsed.as_str())
        .send()
        .await
        .map_err(|e| UserError::Download(format!("{url}: {e}")))?;

    if !resp.status().is_success() {
        return Err(UserError::Download(format!(
            "{url}: HTTP status {}",
            resp.status()
        )));
    }

    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let file_name = buffer_file_name(&parsed, content_type.as_deref());

    let bytes = resp
        .bytes()
        .await
        .map_err(|e| UserError::Download(format!("{url}: {e}")))?;

    debug!(url, file_name, len = bytes.len(), "audio downloaded");

    Ok(AudioBuffer {
        bytes: bytes.to_vec(),
        file_name,
        content_type,
    })
}

/// Filename from the last URL path segment, with an extension appended from
/// the Content-Type when the segment has none.
fn buffer_file_name(url: &Url, content_type: Option<&str>) -> String {
    let segment = url
        .path_segments()
        .and_then(|s| s.last())
        .filter(|s| !s.is_empty());

    let Some(segment) = segment else {
        return FALLBACK_FILE_NAME.to_string();
    };

    let mut name = segment.to_string();
    if !name.contains('.') {
        match content_type.and_then(extension_for_content_type) {
            Some(ext) => {
                name.push('.');
                name.push_str(ext);
            }
            None => return FALLBACK_FILE_NAME.to_string(),
        }
    }
    name
}

fn extension_for_content_type(ct: &str) -> Option<&'static str> {
    if ct.contains("audio/mpeg") {
        Some("mp3")
    } else if ct.contains("audio/mp4") || ct.contains("audio/aac") {
        Some("m4a")
    } else if ct.contains("audio/wav") {
        Some("wav")
    } else if ct.contains("audio/flac") {
        Some("flac")
    } else if ct.contains("ogg") {
        Some("ogg")
    } else {
        None
    }
}
