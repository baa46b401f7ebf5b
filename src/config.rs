//! Configuration types for PDF-to-audio conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The cloud and the local backend read
//! different fields: `language`, `slow` and `tld` only matter for the cloud
//! service, `rate`, `volume`, `voice` and `engine_command` only for the local
//! engine. Both sets live side by side so a front-end can switch backends
//! without rebuilding the rest of the configuration.

use crate::error::Pdf2AudioError;
use crate::progress::ProgressCallback;
use crate::synth::SpeechSynthesizer;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Default speaking rate of the local engine, in words per minute.
pub const DEFAULT_RATE_WPM: u32 = 200;

/// Slowest and fastest rate accepted by espeak-ng compatible engines.
pub const RATE_RANGE_WPM: (u32, u32) = (80, 450);

/// Configuration for a PDF-to-audio conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2audio::{ConversionConfig, SynthesisBackend};
///
/// let config = ConversionConfig::builder()
///     .backend(SynthesisBackend::Local)
///     .rate(170)
///     .volume(0.8)
///     .build()
///     .unwrap();
/// assert_eq!(config.rate, 170);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Which speech backend to use. Default: [`SynthesisBackend::Cloud`].
    pub backend: SynthesisBackend,

    /// Pre-constructed synthesizer. Takes precedence over `backend`.
    pub synthesizer: Option<Arc<dyn SpeechSynthesizer>>,

    /// Language code for the cloud service, e.g. "en", "fr", "pt-BR". Default: "en".
    pub language: String,

    /// Ask the cloud service for slower speech. Default: false.
    pub slow: bool,

    /// Top-level domain of the cloud host ("com", "co.uk", "com.au" …). Default: "com".
    ///
    /// Changes the accent the service picks for some languages.
    pub tld: String,

    /// Full endpoint URL overriding the one derived from `tld`.
    pub cloud_endpoint: Option<String>,

    /// Local engine speaking rate in words per minute. Range 80–450. Default: 200.
    pub rate: u32,

    /// Local engine volume, 0.0 (silent) to 1.0 (full). Default: 1.0.
    pub volume: f32,

    /// Local engine voice name (engine specific, e.g. "en-us"). Default: engine default.
    pub voice: Option<String>,

    /// Shell-style command line for the local engine, e.g. "espeak-ng" or
    /// "/opt/tts/bin/espeak-ng --path /opt/tts/data".
    /// If None, `PDF2AUDIO_ENGINE_COMMAND` or plain `espeak-ng` is used.
    pub engine_command: Option<String>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Page selection. Default: All pages.
    pub pages: PageSelection,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Per-request timeout for the cloud backend in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Receives stage events while a conversion runs.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            backend: SynthesisBackend::default(),
            synthesizer: None,
            language: "en".to_string(),
            slow: false,
            tld: "com".to_string(),
            cloud_endpoint: None,
            rate: DEFAULT_RATE_WPM,
            volume: 1.0,
            voice: None,
            engine_command: None,
            password: None,
            pages: PageSelection::default(),
            download_timeout_secs: 120,
            api_timeout_secs: 60,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("backend", &self.backend)
            .field(
                "synthesizer",
                &self.synthesizer.as_ref().map(|s| s.name().to_string()),
            )
            .field("language", &self.language)
            .field("slow", &self.slow)
            .field("tld", &self.tld)
            .field("cloud_endpoint", &self.cloud_endpoint)
            .field("rate", &self.rate)
            .field("volume", &self.volume)
            .field("voice", &self.voice)
            .field("engine_command", &self.engine_command)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pages", &self.pages)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Start a builder from an existing configuration.
    ///
    /// The web app uses this to apply per-request overrides on top of the
    /// server-wide defaults.
    pub fn to_builder(&self) -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: self.clone(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn backend(mut self, backend: SynthesisBackend) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.config.synthesizer = Some(synthesizer);
        self
    }

    pub fn language(mut self, lang: impl Into<String>) -> Self {
        self.config.language = lang.into().trim().to_string();
        self
    }

    pub fn slow(mut self, v: bool) -> Self {
        self.config.slow = v;
        self
    }

    pub fn tld(mut self, tld: impl Into<String>) -> Self {
        self.config.tld = tld.into().trim().trim_start_matches('.').to_string();
        self
    }

    pub fn cloud_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.cloud_endpoint = Some(url.into());
        self
    }

    pub fn rate(mut self, wpm: u32) -> Self {
        self.config.rate = wpm.clamp(RATE_RANGE_WPM.0, RATE_RANGE_WPM.1);
        self
    }

    pub fn volume(mut self, v: f32) -> Self {
        self.config.volume = if v.is_nan() { 1.0 } else { v.clamp(0.0, 1.0) };
        self
    }

    pub fn voice(mut self, voice: impl Into<String>) -> Self {
        self.config.voice = Some(voice.into());
        self
    }

    pub fn engine_command(mut self, command: impl Into<String>) -> Self {
        self.config.engine_command = Some(command.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2AudioError> {
        let c = &self.config;
        if !is_valid_language(&c.language) {
            return Err(Pdf2AudioError::InvalidConfig(format!(
                "'{}' is not a language code (expected e.g. en, fr, pt-BR)",
                c.language
            )));
        }
        if c.tld.is_empty() || c.tld.contains('/') || c.tld.contains(char::is_whitespace) {
            return Err(Pdf2AudioError::InvalidConfig(format!(
                "'{}' is not a top-level domain",
                c.tld
            )));
        }
        if c.rate < RATE_RANGE_WPM.0 || c.rate > RATE_RANGE_WPM.1 {
            return Err(Pdf2AudioError::InvalidConfig(format!(
                "Rate must be {}–{} words per minute, got {}",
                RATE_RANGE_WPM.0, RATE_RANGE_WPM.1, c.rate
            )));
        }
        if !(0.0..=1.0).contains(&c.volume) {
            return Err(Pdf2AudioError::InvalidConfig(format!(
                "Volume must be 0.0–1.0, got {}",
                c.volume
            )));
        }
        if let Some(cmd) = &c.engine_command {
            if shlex::split(cmd).is_none_or(|parts| parts.is_empty()) {
                return Err(Pdf2AudioError::InvalidConfig(format!(
                    "Engine command '{cmd}' is empty or badly quoted"
                )));
            }
        }
        Ok(self.config)
    }
}

static RE_LANGUAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{2,3}(?:[-_][A-Za-z0-9]{2,8})*$").unwrap());

/// `true` if `code` looks like a BCP-47-ish language tag ("en", "zh-CN", "pt_BR").
pub fn is_valid_language(code: &str) -> bool {
    RE_LANGUAGE.is_match(code)
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Where speech is synthesised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisBackend {
    /// Hosted text-to-speech (Google Translate voice). MP3 output, needs network. (default)
    #[default]
    Cloud,
    /// Local engine process (espeak-ng compatible). WAV output, works offline.
    Local,
}

impl SynthesisBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SynthesisBackend::Cloud => "cloud",
            SynthesisBackend::Local => "local",
        }
    }
}

impl fmt::Display for SynthesisBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SynthesisBackend {
    type Err = Pdf2AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cloud" | "gtts" | "google" => Ok(SynthesisBackend::Cloud),
            "local" | "espeak" | "offline" => Ok(SynthesisBackend::Local),
            other => Err(Pdf2AudioError::InvalidConfig(format!(
                "Unknown backend '{other}' (expected cloud or local)"
            ))),
        }
    }
}

/// Specifies which pages of the PDF to read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Read all pages (default).
    #[default]
    All,
    /// Read a single page (1-indexed).
    Single(usize),
    /// Read a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Read specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// The first page number the selection asks for (1-indexed), used in
    /// out-of-range errors.
    pub fn first_requested(&self) -> usize {
        match self {
            PageSelection::All => 1,
            PageSelection::Single(p) => *p,
            PageSelection::Range(start, _) => *start,
            PageSelection::Set(pages) => pages.iter().copied().min().unwrap_or(0),
        }
    }
}

impl FromStr for PageSelection {
    type Err = Pdf2AudioError;

    /// Parse `all`, `5`, `3-15` or `1,3,5,7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let bad =
            |what: &str| Pdf2AudioError::InvalidConfig(format!("{what} in page selection '{s}'"));

        if s == "all" || s.is_empty() {
            return Ok(PageSelection::All);
        }

        if let Some((start, end)) = s.split_once('-') {
            let start: usize = start.trim().parse().map_err(|_| bad("Invalid start page"))?;
            let end: usize = end.trim().parse().map_err(|_| bad("Invalid end page"))?;
            if start < 1 {
                return Err(bad("Pages are 1-indexed"));
            }
            if start > end {
                return Err(bad("Start page after end page"));
            }
            return Ok(PageSelection::Range(start, end));
        }

        if s.contains(',') {
            let pages = s
                .split(',')
                .map(|p| p.trim().parse::<usize>().map_err(|_| bad("Invalid page number")))
                .collect::<Result<Vec<_>, _>>()?;
            if pages.contains(&0) {
                return Err(bad("Pages are 1-indexed"));
            }
            return Ok(PageSelection::Set(pages));
        }

        let page: usize = s.parse().map_err(|_| bad("Invalid page number"))?;
        if page < 1 {
            return Err(bad("Pages are 1-indexed"));
        }
        Ok(PageSelection::Single(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documentation() {
        let c = ConversionConfig::default();
        assert_eq!(c.backend, SynthesisBackend::Cloud);
        assert_eq!(c.language, "en");
        assert_eq!(c.tld, "com");
        assert_eq!(c.rate, 200);
        assert_eq!(c.volume, 1.0);
        assert!(!c.slow);
        assert_eq!(c.pages, PageSelection::All);
    }

    #[test]
    fn builder_clamps_rate_and_volume() {
        let c = ConversionConfig::builder()
            .rate(10)
            .volume(3.5)
            .build()
            .unwrap();
        assert_eq!(c.rate, 80);
        assert_eq!(c.volume, 1.0);

        let c = ConversionConfig::builder().volume(-1.0).build().unwrap();
        assert_eq!(c.volume, 0.0);
    }

    #[test]
    fn builder_rejects_bad_language() {
        let err = ConversionConfig::builder()
            .language("english please")
            .build()
            .unwrap_err();
        assert!(matches!(err, Pdf2AudioError::InvalidConfig(_)));

        assert!(ConversionConfig::builder().language("pt-BR").build().is_ok());
        assert!(ConversionConfig::builder().language("zh_CN").build().is_ok());
    }

    #[test]
    fn builder_rejects_empty_engine_command() {
        let err = ConversionConfig::builder()
            .engine_command("   ")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Engine command"));

        let err = ConversionConfig::builder()
            .engine_command("espeak-ng \"unterminated")
            .build()
            .unwrap_err();
        assert!(matches!(err, Pdf2AudioError::InvalidConfig(_)));
    }

    #[test]
    fn tld_is_normalised() {
        let c = ConversionConfig::builder().tld(".co.uk").build().unwrap();
        assert_eq!(c.tld, "co.uk");
    }

    #[test]
    fn debug_redacts_password() {
        let c = ConversionConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn backend_parses_aliases() {
        assert_eq!("cloud".parse::<SynthesisBackend>().unwrap(), SynthesisBackend::Cloud);
        assert_eq!("GTTS".parse::<SynthesisBackend>().unwrap(), SynthesisBackend::Cloud);
        assert_eq!(" local ".parse::<SynthesisBackend>().unwrap(), SynthesisBackend::Local);
        assert!("pyttsx".parse::<SynthesisBackend>().is_err());
    }

    #[test]
    fn page_selection_to_indices() {
        assert_eq!(PageSelection::All.to_indices(5), vec![0, 1, 2, 3, 4]);
        assert_eq!(PageSelection::Single(3).to_indices(5), vec![2]);
        assert_eq!(PageSelection::Single(6).to_indices(5), Vec::<usize>::new());
        assert_eq!(PageSelection::Range(2, 4).to_indices(5), vec![1, 2, 3]);
        assert_eq!(PageSelection::Range(4, 99).to_indices(5), vec![3, 4]);
        assert_eq!(PageSelection::Set(vec![3, 1, 3]).to_indices(5), vec![0, 2]);
    }

    #[test]
    fn page_selection_parses() {
        assert_eq!("all".parse::<PageSelection>().unwrap(), PageSelection::All);
        assert_eq!("5".parse::<PageSelection>().unwrap(), PageSelection::Single(5));
        assert_eq!("3-15".parse::<PageSelection>().unwrap(), PageSelection::Range(3, 15));
        assert_eq!(
            "1, 3,5".parse::<PageSelection>().unwrap(),
            PageSelection::Set(vec![1, 3, 5])
        );
        assert!("0".parse::<PageSelection>().is_err());
        assert!("9-2".parse::<PageSelection>().is_err());
        assert!("1,x".parse::<PageSelection>().is_err());
    }
}
