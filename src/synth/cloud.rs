//! Cloud speech: the Google Translate text-to-speech voice.
//!
//! This speaks the same `batchexecute` RPC the Translate web page (and the
//! `gTTS` client) uses. The service accepts at most 100 characters per
//! request, so text is split into tokens at sentence punctuation, then at
//! whitespace, and each token is fetched in order. Every response carries a
//! base64 MP3 fragment; MP3 frames are self-delimiting, so the decoded
//! fragments are simply concatenated.
//!
//! There is no API key and no prosody control besides the `slow` flag. The
//! accent for some languages depends on the top-level domain of the host.

use crate::config::ConversionConfig;
use crate::error::Pdf2AudioError;
use crate::output::AudioFormat;
use crate::progress::ProgressCallback;
use crate::synth::SpeechSynthesizer;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Name reported in logs and stats.
pub const BACKEND_NAME: &str = "google-tts";

/// Longest token the service accepts, in characters.
pub const MAX_TOKEN_CHARS: usize = 100;

const RPC_ID: &str = "jQ1olc";
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0 Safari/537.36";

static RE_AUDIO: Lazy<Regex> = Lazy::new(|| Regex::new(r#"jQ1olc","\[\\"(.*)\\"]"#).unwrap());

/// Google Translate text-to-speech client.
pub struct GoogleTts {
    client: reqwest::Client,
    endpoint: String,
    language: String,
    slow: bool,
    progress: Option<ProgressCallback>,
}

impl GoogleTts {
    /// Client for `language` on `translate.google.{tld}`.
    pub fn new(
        language: impl Into<String>,
        tld: &str,
        timeout_secs: u64,
    ) -> Result<Self, Pdf2AudioError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Pdf2AudioError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint_for_tld(tld),
            language: language.into(),
            slow: false,
            progress: None,
        })
    }

    /// Build from the cloud fields of a [`ConversionConfig`].
    pub fn from_config(config: &ConversionConfig) -> Result<Self, Pdf2AudioError> {
        let mut tts = Self::new(&config.language, &config.tld, config.api_timeout_secs)?
            .slow(config.slow);
        if let Some(ref endpoint) = config.cloud_endpoint {
            tts = tts.endpoint(endpoint.clone());
        }
        tts.progress = config.progress_callback.clone();
        Ok(tts)
    }

    pub fn slow(mut self, slow: bool) -> Self {
        self.slow = slow;
        self
    }

    /// Send requests somewhere other than the public host (proxies, tests).
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    /// Form value of `f.req` for one token.
    fn rpc_payload(&self, token: &str) -> String {
        let speed = if self.slow { json!(true) } else { Value::Null };
        let parameter = json!([token, self.language, speed, "null"]);
        json!([[[RPC_ID, parameter.to_string(), Value::Null, "generic"]]]).to_string()
    }

    async fn fetch_token(&self, token: &str) -> Result<Vec<u8>, Pdf2AudioError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::REFERER, "http://translate.google.com/")
            .form(&[("f.req", self.rpc_payload(token))])
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    Pdf2AudioError::BackendUnavailable {
                        backend: BACKEND_NAME.to_string(),
                        detail: e.to_string(),
                    }
                } else {
                    Pdf2AudioError::SynthesisFailed {
                        backend: BACKEND_NAME.to_string(),
                        detail: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Pdf2AudioError::SynthesisFailed {
                backend: BACKEND_NAME.to_string(),
                detail: format!("HTTP {status} (language '{}')", self.language),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Pdf2AudioError::SynthesisFailed {
                backend: BACKEND_NAME.to_string(),
                detail: format!("reading response: {e}"),
            })?;

        decode_audio(&body).map_err(|detail| Pdf2AudioError::SynthesisFailed {
            backend: BACKEND_NAME.to_string(),
            detail,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn format(&self) -> AudioFormat {
        AudioFormat::Mp3
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, Pdf2AudioError> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Err(Pdf2AudioError::SynthesisFailed {
                backend: BACKEND_NAME.to_string(),
                detail: "text contains nothing speakable".to_string(),
            });
        }
        info!(
            "Synthesising {} chars as {} requests ({})",
            text.chars().count(),
            tokens.len(),
            self.language
        );

        let mut audio = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            let fragment = self.fetch_token(token).await?;
            debug!("Token {}/{} → {} bytes", i + 1, tokens.len(), fragment.len());
            audio.extend_from_slice(&fragment);
            if let Some(ref cb) = self.progress {
                cb.on_chunk_synthesized(i + 1, tokens.len());
            }
        }
        Ok(audio)
    }
}

/// `batchexecute` URL on `translate.google.{tld}`.
pub fn endpoint_for_tld(tld: &str) -> String {
    format!("https://translate.google.{tld}/_/TranslateWebserverUi/data/batchexecute")
}

/// Pull the base64 audio out of every RPC line of a response and decode it.
pub fn decode_audio(body: &str) -> Result<Vec<u8>, String> {
    let mut audio = Vec::new();
    let mut found = false;
    for line in body.lines() {
        if let Some(caps) = RE_AUDIO.captures(line) {
            found = true;
            let bytes = STANDARD
                .decode(&caps[1])
                .map_err(|e| format!("audio payload is not base64: {e}"))?;
            audio.extend_from_slice(&bytes);
        }
    }
    if !found {
        return Err("no audio stream in response".to_string());
    }
    Ok(audio)
}

/// Split text into request-sized tokens.
///
/// Pieces end after sentence punctuation; pieces longer than
/// [`MAX_TOKEN_CHARS`] are split at whitespace (and, for a single overlong
/// word, at a character boundary); adjacent short pieces are packed together
/// so a paragraph costs as few requests as possible. Tokens without a single
/// letter or digit are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    for sentence in split_sentences(text) {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }
        if sentence.chars().count() <= MAX_TOKEN_CHARS {
            pieces.push(sentence.to_string());
        } else {
            pieces.extend(split_long(sentence));
        }
    }

    let mut tokens: Vec<String> = Vec::new();
    for piece in pieces {
        match tokens.last_mut() {
            Some(last)
                if last.chars().count() + 1 + piece.chars().count() <= MAX_TOKEN_CHARS =>
            {
                last.push(' ');
                last.push_str(&piece);
            }
            _ => tokens.push(piece),
        }
    }

    tokens.retain(|t| t.chars().any(char::is_alphanumeric));
    tokens
}

fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | ';' | ':' | ',' | '…')
}

fn is_fullwidth_end(c: char) -> bool {
    matches!(c, '。' | '！' | '？' | '；' | '：' | '，' | '、')
}

/// Cut after punctuation that is followed by whitespace (so "3.14" and
/// "e.g" stay whole) or after any full-width punctuation mark.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let cut = if is_fullwidth_end(c) {
            true
        } else if is_sentence_end(c) {
            chars.peek().is_none_or(|&(_, next)| next.is_whitespace())
        } else {
            false
        };
        if cut {
            let end = i + c.len_utf8();
            pieces.push(&text[start..end]);
            start = end;
        }
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

/// Greedy word packing for a piece longer than the request limit.
fn split_long(piece: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in piece.split_whitespace() {
        let word_len = word.chars().count();
        if word_len > MAX_TOKEN_CHARS {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            out.extend(chars.chunks(MAX_TOKEN_CHARS).map(|c| c.iter().collect::<String>()));
            continue;
        }
        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > MAX_TOKEN_CHARS {
            out.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_len = needed;
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}
