//! Result types produced by a conversion.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Encoding of the audio a backend produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// MPEG-1 Layer III, what the cloud service returns.
    Mp3,
    /// RIFF/WAVE PCM, what local engines write.
    Wav,
}

impl AudioFormat {
    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
        }
    }

    /// MIME type for HTTP responses and `<audio>` elements.
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Wav => "audio/wav",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// The finished product of one conversion.
#[derive(Debug, Clone, Serialize)]
pub struct AudioOutput {
    /// Encoded audio. Never empty.
    #[serde(skip)]
    pub audio: Vec<u8>,
    /// Suggested download name, derived from the input name.
    pub file_name: String,
    pub format: AudioFormat,
    pub metadata: DocumentMetadata,
    pub stats: ConversionStats,
}

impl AudioOutput {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Document-level metadata read from the PDF info dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// Counters and timings for one conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages in the document.
    pub total_pages: usize,
    /// Pages whose text was read (the page selection).
    pub extracted_pages: usize,
    /// Characters of flattened text sent to the backend.
    pub text_chars: usize,
    /// Size of the produced audio.
    pub audio_bytes: usize,
    /// Synthesizer name.
    pub backend: String,
    pub extract_duration_ms: u64,
    pub synthesis_duration_ms: u64,
    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_extensions_and_mime() {
        assert_eq!(AudioFormat::Mp3.extension(), "mp3");
        assert_eq!(AudioFormat::Wav.extension(), "wav");
        assert_eq!(AudioFormat::Mp3.mime_type(), "audio/mpeg");
        assert_eq!(AudioFormat::Wav.to_string(), "wav");
    }

    #[test]
    fn audio_bytes_are_not_serialised() {
        let out = AudioOutput {
            audio: vec![1, 2, 3],
            file_name: "book.mp3".into(),
            format: AudioFormat::Mp3,
            metadata: DocumentMetadata::default(),
            stats: ConversionStats::default(),
        };
        let json = serde_json::to_value(&out).unwrap();
        assert!(json.get("audio").is_none());
        assert_eq!(json["file_name"], "book.mp3");
        assert_eq!(json["format"], "mp3");
    }
}
