//! Offline speech: an espeak-ng compatible engine process.
//!
//! The engine reads text on stdin and writes a WAV file named by `-w`.
//! Speaking rate (`-s`, words per minute), amplitude (`-a`, 0-100, mapped from
//! the 0.0-1.0 volume) and voice (`-v`) are passed on the command line.
//!
//! ## One engine per process
//!
//! A speech engine is a shared, stateful resource: two overlapping runs would
//! compete for the same audio device on some platforms and for the same voice
//! data on all of them. Each distinct engine command therefore gets exactly
//! one [`LocalEngine`] per process, handed out by [`LocalEngine::shared`] behind
//! an async mutex. A synthesis run holds the lock from spawn to read-back, so
//! concurrent conversions queue instead of interleaving.

use crate::config::ConversionConfig;
use crate::error::Pdf2AudioError;
use crate::output::AudioFormat;
use crate::progress::ProgressCallback;
use crate::synth::SpeechSynthesizer;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, PoisonError};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Name reported in logs and stats.
pub const BACKEND_NAME: &str = "local-engine";

/// Engine used when neither the config nor the environment names one.
pub const DEFAULT_ENGINE: &str = "espeak-ng";

/// Environment variable holding an engine command line, e.g.
/// `"/opt/espeak/bin/espeak-ng --path=/opt/espeak/share"`.
pub const ENGINE_COMMAND_ENV: &str = "PDF2AUDIO_ENGINE_COMMAND";

static ENGINES: Lazy<std::sync::Mutex<HashMap<String, Arc<Mutex<LocalEngine>>>>> =
    Lazy::new(Default::default);

/// A speech engine executable plus the arguments that precede per-run flags.
#[derive(Debug)]
pub struct LocalEngine {
    program: String,
    base_args: Vec<String>,
    runs: u64,
}

impl LocalEngine {
    pub fn new(program: impl Into<String>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
            runs: 0,
        }
    }

    /// Parse a shell-quoted command line.
    pub fn from_command_line(command_line: &str) -> Result<Self, Pdf2AudioError> {
        let mut parts = shlex::split(command_line)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                Pdf2AudioError::InvalidConfig(format!(
                    "Engine command '{command_line}' could not be parsed"
                ))
            })?
            .into_iter();
        // `filter` above guarantees at least one element.
        let program = parts.next().unwrap_or_default();
        Ok(Self::new(program, parts.collect()))
    }

    /// The process-wide engine for a command line.
    ///
    /// Resolution: `explicit`, then [`ENGINE_COMMAND_ENV`], then
    /// [`DEFAULT_ENGINE`]. Nothing is spawned here; a missing executable
    /// surfaces on the first synthesis as [`Pdf2AudioError::EngineNotFound`].
    pub fn shared(explicit: Option<&str>) -> Result<Arc<Mutex<LocalEngine>>, Pdf2AudioError> {
        let command_line = match explicit {
            Some(cmd) => cmd.to_string(),
            None => std::env::var(ENGINE_COMMAND_ENV)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ENGINE.to_string()),
        };

        let mut engines = ENGINES.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(engine) = engines.get(&command_line) {
            return Ok(Arc::clone(engine));
        }

        let engine = Arc::new(Mutex::new(Self::from_command_line(&command_line)?));
        debug!("Registered speech engine: {}", command_line);
        engines.insert(command_line, Arc::clone(&engine));
        Ok(engine)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Completed synthesis runs.
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// Speak `text` into a WAV buffer. Requires `&mut self`, so callers going
    /// through the shared handle are serialised by its mutex.
    async fn run(
        &mut self,
        text: &str,
        settings: &VoiceSettings,
    ) -> Result<Vec<u8>, Pdf2AudioError> {
        let dir = tempfile::tempdir()
            .map_err(|e| Pdf2AudioError::Internal(format!("Failed to create temp dir: {e}")))?;
        let wav_path = dir.path().join("speech.wav");

        let mut child = Command::new(&self.program)
            .args(&self.base_args)
            .args(settings.engine_args(&wav_path))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Pdf2AudioError::EngineNotFound {
                program: self.program.clone(),
                detail: e.to_string(),
            })?;

        // An engine that dies early closes its stdin; its exit status is the
        // more useful report, so the write result is checked afterwards.
        let write_result = match child.stdin.take() {
            Some(mut stdin) => {
                let r = stdin.write_all(text.as_bytes()).await;
                drop(stdin);
                r
            }
            None => Ok(()),
        };

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| Pdf2AudioError::Internal(format!("Waiting for engine: {e}")))?;

        if !output.status.success() {
            return Err(Pdf2AudioError::EngineFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        write_result
            .map_err(|e| Pdf2AudioError::Internal(format!("Writing text to engine: {e}")))?;

        self.runs += 1;

        let audio = match tokio::fs::read(&wav_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(Pdf2AudioError::Internal(format!(
                    "Reading {}: {e}",
                    wav_path.display()
                )))
            }
        };
        if audio.is_empty() {
            return Err(Pdf2AudioError::EmptyAudio {
                backend: BACKEND_NAME.to_string(),
            });
        }
        Ok(audio)
    }
}

/// Per-run voice parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSettings {
    /// Words per minute.
    pub rate: u32,
    /// 0.0 (silent) to 1.0 (full).
    pub volume: f32,
    /// Engine voice name, e.g. `en-us` or `fr`.
    pub voice: Option<String>,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            rate: crate::config::DEFAULT_RATE_WPM,
            volume: 1.0,
            voice: None,
        }
    }
}

impl VoiceSettings {
    /// Engine amplitude, 0-100.
    pub fn amplitude(&self) -> u32 {
        (self.volume.clamp(0.0, 1.0) * 100.0).round() as u32
    }

    fn engine_args(&self, wav_path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-s".into(),
            self.rate.to_string().into(),
            "-a".into(),
            self.amplitude().to_string().into(),
        ];
        if let Some(ref voice) = self.voice {
            args.push("-v".into());
            args.push(voice.into());
        }
        args.push("-w".into());
        args.push(wav_path.as_os_str().to_os_string());
        args.push("--stdin".into());
        args
    }
}

/// [`SpeechSynthesizer`] over a shared [`LocalEngine`].
pub struct LocalSynthesizer {
    engine: Arc<Mutex<LocalEngine>>,
    settings: VoiceSettings,
    progress: Option<ProgressCallback>,
}

impl LocalSynthesizer {
    pub fn with_engine(engine: Arc<Mutex<LocalEngine>>, settings: VoiceSettings) -> Self {
        Self {
            engine,
            settings,
            progress: None,
        }
    }

    /// Build from the local fields of a [`ConversionConfig`].
    ///
    /// Without an explicit voice, the conversion language doubles as the
    /// engine voice name (espeak-ng voices are named by language code).
    pub fn from_config(config: &ConversionConfig) -> Result<Self, Pdf2AudioError> {
        let engine = LocalEngine::shared(config.engine_command.as_deref())?;
        let settings = VoiceSettings {
            rate: config.rate,
            volume: config.volume,
            voice: config
                .voice
                .clone()
                .or_else(|| Some(config.language.to_ascii_lowercase())),
        };
        Ok(Self {
            engine,
            settings,
            progress: config.progress_callback.clone(),
        })
    }

    pub fn settings(&self) -> &VoiceSettings {
        &self.settings
    }
}

#[async_trait]
impl SpeechSynthesizer for LocalSynthesizer {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn format(&self) -> AudioFormat {
        AudioFormat::Wav
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, Pdf2AudioError> {
        let mut engine = self.engine.lock().await;
        info!(
            "Speaking {} chars with {} ({} wpm, amplitude {})",
            text.chars().count(),
            engine.program(),
            self.settings.rate,
            self.settings.amplitude()
        );
        let audio = engine.run(text, &self.settings).await?;
        drop(engine);

        if let Some(ref cb) = self.progress {
            cb.on_chunk_synthesized(1, 1);
        }
        Ok(audio)
    }
}
