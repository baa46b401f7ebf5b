//! CLI binary for pdf2audio.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, writes the audio file and prints a summary. With
//! `--serve` it starts the web app instead.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2audio::server::{self, ServerConfig};
use pdf2audio::{
    convert, convert_to_file, extract, inspect, ConversionConfig, ConversionProgressCallback,
    PageSelection, Pdf2AudioError, ProgressCallback, SynthesisBackend,
};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner while the PDF opens, a page bar during
/// extraction, then a request bar while speech is synthesised.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(Self::spinner_style());
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS)
    }

    fn bar_style(unit: &str) -> ProgressStyle {
        ProgressStyle::with_template(&format!(
            "{{spinner:.cyan}} {{prefix:.bold}}  [{{bar:42.green/238}}] {{pos:>3}}/{{len}} {unit}  ⏱ {{elapsed_precise}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.bar.set_style(Self::bar_style("pages"));
        self.bar.set_length(total_pages as u64);
        self.bar.set_position(0);
        self.bar.set_prefix("Reading");
    }

    fn on_page_extracted(&self, _page_num: usize, _total_pages: usize, _chars: usize) {
        self.bar.inc(1);
    }

    fn on_synthesis_start(&self, backend: &str, chars: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Speaking {chars} characters via {backend}…"))
        ));
        self.bar.set_style(Self::spinner_style());
        self.bar.set_prefix("Speaking");
        self.bar.set_message("waiting for audio…");
    }

    fn on_chunk_synthesized(&self, chunk: usize, total_chunks: usize) {
        if self.bar.length() != Some(total_chunks as u64) {
            self.bar.set_style(Self::bar_style("requests"));
            self.bar.set_length(total_chunks as u64);
        }
        self.bar.set_position(chunk as u64);
    }

    fn on_conversion_complete(&self, audio_bytes: usize) {
        self.bar.finish_and_clear();
        eprintln!("{} {} of audio generated", green("✔"), bold(&human_bytes(audio_bytes)));
    }
}

fn human_bytes(n: usize) -> String {
    match n {
        n if n >= 1024 * 1024 => format!("{:.1} MiB", n as f64 / (1024.0 * 1024.0)),
        n if n >= 1024 => format!("{:.1} KiB", n as f64 / 1024.0),
        n => format!("{n} bytes"),
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Cloud voice (MP3), written next to you as book.mp3
  pdf2audio book.pdf

  # Choose the output file
  pdf2audio book.pdf -o ~/Audiobooks/book.mp3

  # French, slow
  pdf2audio --lang fr --slow roman.pdf

  # Offline with espeak-ng (WAV), faster and quieter
  pdf2audio --backend local --rate 240 --volume 0.7 notes.pdf

  # Chapter 2 only
  pdf2audio --pages 12-30 book.pdf -o chapter2.mp3

  # From a URL
  pdf2audio https://example.com/paper.pdf

  # Show the text that would be spoken
  pdf2audio --text-only paper.pdf

  # Web app on port 8080
  pdf2audio --serve --listen 0.0.0.0:8080

EXIT STATUS:
  0  audio written
  1  any error
  2  the PDF has no extractable text (e.g. a scanned document)

ENVIRONMENT VARIABLES:
  PDF2AUDIO_*               Every flag has an env fallback (see --help)
  PDF2AUDIO_ENGINE_COMMAND  Local engine command line, e.g. "espeak-ng --path=/opt/espeak"
  PDFIUM_LIB_PATH           Path to libpdfium (file or directory)
  RUST_LOG                  Log filter, overrides -v / -q

SETUP:
  Text extraction needs the pdfium shared library: install it system-wide,
  put it in the working directory, or set PDFIUM_LIB_PATH.
  The local backend needs espeak-ng (or a compatible engine) on PATH.
"#;

/// Convert PDF files and URLs to spoken audio.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2audio",
    version,
    about = "Convert PDF files and URLs to spoken audio (MP3 or WAV)",
    long_about = "Read the text layer of a PDF (local file or URL) and turn it into speech, \
either with the Google Translate voice (MP3, needs network) or with a local espeak-ng \
compatible engine (WAV, offline). Can also run as a small web app.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    #[arg(required_unless_present = "serve")]
    input: Option<String>,

    /// Audio output path ("-" for stdout). Default: input name with .mp3/.wav.
    #[arg(short, long, env = "PDF2AUDIO_OUTPUT")]
    output: Option<PathBuf>,

    /// Speech backend: cloud (Google, MP3) or local (espeak-ng, WAV).
    #[arg(long, env = "PDF2AUDIO_BACKEND", default_value = "cloud")]
    backend: String,

    /// Language code, e.g. en, fr, de, pt-BR. Also the local voice if --voice is unset.
    #[arg(long, env = "PDF2AUDIO_LANG", default_value = "en")]
    lang: String,

    /// Slower cloud speech.
    #[arg(long, env = "PDF2AUDIO_SLOW")]
    slow: bool,

    /// Google top-level domain (accent for some languages), e.g. com, co.uk, com.au.
    #[arg(long, env = "PDF2AUDIO_TLD", default_value = "com")]
    tld: String,

    /// Local engine speaking rate in words per minute (80–450).
    #[arg(long, env = "PDF2AUDIO_RATE", default_value_t = pdf2audio::config::DEFAULT_RATE_WPM,
          value_parser = clap::value_parser!(u32).range(80..=450))]
    rate: u32,

    /// Local engine volume (0.0–1.0).
    #[arg(long, env = "PDF2AUDIO_VOLUME", default_value_t = 1.0)]
    volume: f32,

    /// Local engine voice name (e.g. en-us, fr+f3).
    #[arg(long, env = "PDF2AUDIO_VOICE")]
    voice: Option<String>,

    /// Local engine command line (default: espeak-ng).
    #[arg(long, env = "PDF2AUDIO_ENGINE_COMMAND")]
    engine_command: Option<String>,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF2AUDIO_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2AUDIO_PASSWORD")]
    password: Option<String>,

    /// Print the text that would be spoken, no synthesis.
    #[arg(long)]
    text_only: bool,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Print a JSON summary (file name, metadata, stats) on stdout.
    #[arg(long, env = "PDF2AUDIO_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2AUDIO_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2AUDIO_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2AUDIO_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2AUDIO_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-request cloud speech timeout in seconds.
    #[arg(long, env = "PDF2AUDIO_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Run the web app instead of converting a file.
    #[arg(long, env = "PDF2AUDIO_SERVE")]
    serve: bool,

    /// Web app listen address.
    #[arg(long, env = "PDF2AUDIO_LISTEN", default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Web app upload limit in MiB.
    #[arg(long, env = "PDF2AUDIO_MAX_UPLOAD_MB", default_value_t = 50)]
    max_upload_mb: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress =
        !cli.serve && !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli, show_progress).await {
        Ok(()) => Ok(()),
        Err(err) if is_no_text(&err) => {
            eprintln!(
                "{} Could not find any text in the selected PDF file (is it a scan?)",
                yellow("⚠")
            );
            std::process::exit(2);
        }
        Err(err) => Err(err),
    }
}

fn is_no_text(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|e| e.downcast_ref::<Pdf2AudioError>())
        .any(Pdf2AudioError::is_no_text)
}

async fn run(cli: &Cli, show_progress: bool) -> Result<()> {
    // ── Web app mode ─────────────────────────────────────────────────────
    if cli.serve {
        let defaults = build_config(cli, None)?;
        let config = ServerConfig {
            listen: cli.listen,
            max_upload_bytes: cli.max_upload_mb.saturating_mul(1024 * 1024),
            defaults,
        };
        if !cli.quiet {
            eprintln!("{} Serving on {}", cyan("◆"), bold(&format!("http://{}/", cli.listen)));
        }
        return server::serve(config).await.context("Web app failed");
    }

    let input = cli.input.as_deref().context("An input PDF path or URL is required")?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = build_config(cli, None)?;
        let meta = inspect(input, &config).await.context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(cli, progress_cb)?;

    // ── Text-only mode ───────────────────────────────────────────────────
    if cli.text_only {
        let text = extract(input, &config).await.context("Text extraction failed")?;
        match cli.output {
            Some(ref path) if path.as_os_str() != "-" => {
                tokio::fs::write(path, format!("{text}\n"))
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
            _ => println!("{text}"),
        }
        return Ok(());
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let to_stdout = cli.output.as_ref().is_some_and(|p| p.as_os_str() == "-");
    if to_stdout {
        let output = convert(input, &config).await.context("Conversion failed")?;
        io::stdout()
            .lock()
            .write_all(&output.audio)
            .context("Failed to write audio to stdout")?;
        return Ok(());
    }

    let (path, stats) = convert_to_file(input, cli.output.as_deref(), &config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        let summary = serde_json::json!({
            "output": path,
            "stats": stats,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {}/{} pages  {} chars  {}  {}ms  →  {}",
            green("✔"),
            stats.extracted_pages,
            stats.total_pages,
            stats.text_chars,
            dim(&stats.backend),
            stats.total_duration_ms,
            bold(&path.display().to_string()),
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let backend: SynthesisBackend = cli.backend.parse().context("Invalid --backend")?;
    let pages: PageSelection = cli.pages.parse().context("Invalid --pages")?;

    let mut builder = ConversionConfig::builder()
        .backend(backend)
        .language(cli.lang.clone())
        .slow(cli.slow)
        .tld(cli.tld.clone())
        .rate(cli.rate)
        .volume(cli.volume)
        .pages(pages)
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref voice) = cli.voice {
        builder = builder.voice(voice.clone());
    }
    if let Some(ref cmd) = cli.engine_command {
        builder = builder.engine_command(cmd.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
