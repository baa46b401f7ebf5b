//! Speech synthesis backends.
//!
//! Every backend implements [`SpeechSynthesizer`]: text in, encoded audio
//! bytes out. Two ship with the crate:
//!
//! * [`cloud::GoogleTts`] — the hosted Google Translate voice. Needs network,
//!   returns MP3, has no prosody knobs besides a "slow" flag.
//! * [`local::LocalSynthesizer`] — an espeak-ng compatible engine process.
//!   Works offline, returns WAV, supports rate, volume and voice.
//!
//! Callers with other needs (a paid TTS API, a test double) can implement the
//! trait themselves and hand it over through
//! [`crate::config::ConversionConfigBuilder::synthesizer`].

pub mod cloud;
pub mod local;

use crate::config::{ConversionConfig, SynthesisBackend};
use crate::error::Pdf2AudioError;
use crate::output::AudioFormat;
use async_trait::async_trait;
use std::sync::Arc;

pub use cloud::GoogleTts;
pub use local::{LocalEngine, LocalSynthesizer, VoiceSettings};

/// A text-to-speech backend.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Short identifier used in logs, stats and error messages.
    fn name(&self) -> &str;

    /// Encoding of the bytes returned by [`SpeechSynthesizer::synthesize`].
    fn format(&self) -> AudioFormat;

    /// Speak `text` and return the encoded audio.
    ///
    /// `text` is already flattened and never empty.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, Pdf2AudioError>;
}

/// Pick the synthesizer a conversion should use.
///
/// A pre-built synthesizer in the config wins; otherwise one is constructed
/// for `config.backend`.
pub fn resolve_synthesizer(
    config: &ConversionConfig,
) -> Result<Arc<dyn SpeechSynthesizer>, Pdf2AudioError> {
    if let Some(ref synthesizer) = config.synthesizer {
        return Ok(Arc::clone(synthesizer));
    }

    match config.backend {
        SynthesisBackend::Cloud => Ok(Arc::new(GoogleTts::from_config(config)?)),
        SynthesisBackend::Local => Ok(Arc::new(LocalSynthesizer::from_config(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silence;

    #[async_trait]
    impl SpeechSynthesizer for Silence {
        fn name(&self) -> &str {
            "silence"
        }

        fn format(&self) -> AudioFormat {
            AudioFormat::Wav
        }

        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, Pdf2AudioError> {
            Ok(vec![0; 4])
        }
    }

    #[test]
    fn prebuilt_synthesizer_wins() {
        let config = ConversionConfig::builder()
            .backend(SynthesisBackend::Cloud)
            .synthesizer(Arc::new(Silence))
            .build()
            .unwrap();
        let s = resolve_synthesizer(&config).unwrap();
        assert_eq!(s.name(), "silence");
    }

    #[test]
    fn cloud_backend_produces_mp3() {
        let s = resolve_synthesizer(&ConversionConfig::default()).unwrap();
        assert_eq!(s.name(), cloud::BACKEND_NAME);
        assert_eq!(s.format(), AudioFormat::Mp3);
    }

    #[test]
    fn local_backend_produces_wav() {
        let config = ConversionConfig::builder()
            .backend(SynthesisBackend::Local)
            .engine_command("espeak-ng")
            .build()
            .unwrap();
        let s = resolve_synthesizer(&config).unwrap();
        assert_eq!(s.name(), local::BACKEND_NAME);
        assert_eq!(s.format(), AudioFormat::Wav);
    }
}
