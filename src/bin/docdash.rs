//! CLI binary for docdash.
//!
//! A thin shim over the library crate: maps flags to a `ServiceRegistry`,
//! a `ClientConfig` and per-tool options, drives one `Session`, and prints
//! the result.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use docdash::options::{
    BackgroundOptions, CompressionOptions, DocumentSummaryOptions, ImageLayoutOptions,
    MergeOptions, PdfRenderOptions, SpeechOptions, TextSummaryOptions,
};
use docdash::output::SentenceAnalysis;
use docdash::{
    input::load_files, BackgroundCatalogue, ClientConfig, DispatchOutput,
    DispatchProgressCallback, Dispatcher, HealthMonitor, InputMode, LanguageCatalogue,
    OptionSchema, ProgressCallback, ServiceRegistry, ServiceStatus, Session, StatusMap,
    StructuredPayload, ToolId, ToolOptions,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

fn paint_status(status: ServiceStatus) -> String {
    match status {
        ServiceStatus::Online => green("● online"),
        ServiceStatus::Offline => red("● offline"),
        ServiceStatus::Checking => yellow("● checking"),
    }
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Renders the synthetic dispatch progress as a percentage bar.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        Arc::new(Self { bar })
    }
}

impl DispatchProgressCallback for CliProgressCallback {
    fn on_dispatch_start(&self, tool: ToolId) {
        self.bar.set_prefix(tool.to_string());
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_progress(&self, _tool: ToolId, percent: u8) {
        self.bar.set_position(u64::from(percent));
    }

    fn on_dispatch_complete(&self, _tool: ToolId, _success: bool) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Which services are up?
  docdash status

  # Merge PDFs in the given order, one bookmark per source file
  docdash run pdf-merge cover.pdf body.pdf appendix.pdf --bookmarks -o merged.pdf

  # Summarise a document
  docdash run document-summary report.pdf --level brief

  # Check text for plagiarism, JSON output
  docdash run plagiarism --text-file essay.txt --json

  # Compress a photo to roughly 200 KB as WEBP
  docdash run image-compress photo.jpg --preset web --format WEBP --target-size 200

  # Speak some text
  docdash run text-to-voice --text "Hello there" --speed slow -o hello.mp3

  # What can --bg-option and --language be set to?
  docdash backgrounds
  docdash languages

  # Services on another machine
  docdash --host http://10.0.0.7 status

TOOLS:
  pdf-to-word  word-to-pdf  pdf-merge  document-summary  pdf-to-image
  image-to-pdf  text-summary  bg-remove  image-compress  voice-to-text
  text-to-voice  plagiarism

ENVIRONMENT VARIABLES:
  DOCDASH_HOST             Host every service runs on (default http://localhost)
  DOCDASH_PROBE_TIMEOUT    Health probe timeout in ms, 1–999 (default 800)
  DOCDASH_HEALTH_INTERVAL  Seconds between health sweeps in `watch` (default 30)
  RUST_LOG                 Override the log filter
"#;

/// Drive the document-services dashboard from the terminal.
#[derive(Parser, Debug)]
#[command(
    name = "docdash",
    version,
    about = "Drive the document, image and audio conversion services from the terminal",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Scheme and host of the services; each keeps its own port.
    #[arg(long, global = true, env = "DOCDASH_HOST", default_value = "http://localhost")]
    host: String,

    /// Health probe timeout in milliseconds (1–999).
    #[arg(long, global = true, env = "DOCDASH_PROBE_TIMEOUT", default_value_t = 800,
          value_parser = clap::value_parser!(u64).range(1..=999))]
    probe_timeout: u64,

    /// Output structured JSON instead of text.
    #[arg(long, global = true, env = "DOCDASH_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCDASH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOCDASH_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every tool with its port, input and accepted files.
    Tools,

    /// Probe every service once and print the status map.
    Status,

    /// Keep probing and print each sweep until interrupted.
    Watch {
        /// Seconds between sweeps.
        #[arg(long, env = "DOCDASH_HEALTH_INTERVAL", default_value_t = 30)]
        interval: u64,
    },

    /// List the named backgrounds bg-remove accepts for --bg-option.
    Backgrounds,

    /// List the languages, voices and styles text-to-voice accepts.
    Languages,

    /// Submit input to one tool.
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Tool id, e.g. pdf-merge.
    tool: String,

    /// Input files. Order matters for pdf-merge.
    files: Vec<PathBuf>,

    /// Text input for text-summary, text-to-voice and plagiarism.
    #[arg(long, conflicts_with = "text_file")]
    text: Option<String>,

    /// Read the text input from a file.
    #[arg(long)]
    text_file: Option<PathBuf>,

    /// Where to save a file result. Defaults to the name the service sends.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Disable the progress bar.
    #[arg(long, env = "DOCDASH_NO_PROGRESS")]
    no_progress: bool,

    #[command(flatten)]
    opts: OptionArgs,
}

/// Tool options. Each flag only applies to the tools that understand it.
#[derive(Args, Debug, Default)]
struct OptionArgs {
    /// Add one bookmark per source file to the merged PDF.
    #[arg(long, help_heading = "PDF merge")]
    bookmarks: bool,

    /// Summary level: brief, detailed, comprehensive.
    #[arg(long, help_heading = "Summary")]
    level: Option<String>,

    /// Document summary mode.
    #[arg(long, help_heading = "Summary")]
    mode: Option<String>,

    /// Render DPI for pdf-to-image (72–600).
    #[arg(long, help_heading = "PDF to image")]
    dpi: Option<u32>,

    /// Output format: PNG/JPG/TIFF (pdf-to-image) or JPEG/PNG/WEBP (image-compress).
    #[arg(long, help_heading = "PDF to image")]
    format: Option<String>,

    /// JPEG quality for pdf-to-image (1–100).
    #[arg(long, help_heading = "PDF to image")]
    quality: Option<u8>,

    /// Image placement: fit, stretch, original.
    #[arg(long, help_heading = "Image to PDF")]
    layout: Option<String>,

    /// Page size: A4, Letter, Legal, original.
    #[arg(long, help_heading = "Image to PDF")]
    page_size: Option<String>,

    /// Segmentation model, e.g. u2net.
    #[arg(long, help_heading = "Background removal")]
    model: Option<String>,

    /// Disable alpha matting.
    #[arg(long, help_heading = "Background removal")]
    no_alpha_matting: bool,

    /// Background kind: solid, gradient, pattern.
    #[arg(long, help_heading = "Background removal")]
    bg_type: Option<String>,

    /// Named colour, gradient or pattern.
    #[arg(long, help_heading = "Background removal")]
    bg_option: Option<String>,

    /// Hex colour for solid backgrounds.
    #[arg(long, help_heading = "Background removal")]
    bg_color: Option<String>,

    /// Compression preset: web, balanced, high, archive.
    #[arg(long, help_heading = "Image compression")]
    preset: Option<String>,

    #[arg(long, help_heading = "Image compression")]
    width: Option<u32>,

    #[arg(long, help_heading = "Image compression")]
    height: Option<u32>,

    /// Target size in KB.
    #[arg(long, help_heading = "Image compression")]
    target_size: Option<u32>,

    /// Keep EXIF metadata.
    #[arg(long, help_heading = "Image compression")]
    preserve_exif: bool,

    /// Language code, e.g. en.
    #[arg(long, help_heading = "Text to voice")]
    language: Option<String>,

    /// slow, normal, fast.
    #[arg(long, help_heading = "Text to voice")]
    speed: Option<String>,

    /// auto, edge-tts, gtts.
    #[arg(long, help_heading = "Text to voice")]
    engine: Option<String>,

    /// female, male.
    #[arg(long, help_heading = "Text to voice")]
    voice_gender: Option<String>,

    #[arg(long, help_heading = "Text to voice")]
    style: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar gives all the feedback during `run`; keep library
    // INFO logs out of its way.
    let show_progress = matches!(&cli.command, Command::Run(r) if !r.no_progress)
        && !cli.quiet
        && !cli.json;
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

    let registry = Arc::new(
        ServiceRegistry::builder()
            .host(cli.host.clone())
            .build()
            .context("Invalid --host")?,
    );

    match &cli.command {
        Command::Tools => print_tools(&cli, &registry),
        Command::Status => {
            let config = base_config(&cli).build().context("Invalid configuration")?;
            let map = HealthMonitor::new(registry.clone(), config)?.sweep().await;
            print_status(&cli, &registry, &map)
        }
        Command::Watch { interval } => {
            let config = base_config(&cli)
                .health_interval_secs(*interval)
                .build()
                .context("Invalid configuration")?;
            watch_status(&cli, registry, config).await
        }
        Command::Backgrounds => {
            let config = base_config(&cli).build().context("Invalid configuration")?;
            let dispatcher = Dispatcher::new(config)?;
            let catalogue = dispatcher.background_options(&registry).await?;
            print_backgrounds(&cli, &catalogue)
        }
        Command::Languages => {
            let config = base_config(&cli).build().context("Invalid configuration")?;
            let dispatcher = Dispatcher::new(config)?;
            let catalogue = dispatcher.supported_languages(&registry).await?;
            print_languages(&cli, &catalogue)
        }
        Command::Run(args) => run_tool(&cli, registry, args, show_progress).await,
    }
}

fn base_config(cli: &Cli) -> docdash::ClientConfigBuilder {
    ClientConfig::builder().probe_timeout_ms(cli.probe_timeout)
}

// ── tools / status / watch ───────────────────────────────────────────────

fn print_tools(cli: &Cli, registry: &ServiceRegistry) -> Result<()> {
    if cli.json {
        let tools: Vec<_> = registry.iter().collect();
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }
    for tool in registry.iter() {
        let input = match tool.input {
            InputMode::SingleFile => "file".to_string(),
            InputMode::MultiFile { min_files } => format!("{min_files}+ files"),
            InputMode::Text {
                min_chars,
                max_chars: Some(max),
            } => format!("text {min_chars}–{max} chars"),
            InputMode::Text { min_chars, .. } => format!("text ≥{min_chars} chars"),
        };
        let accept = if tool.accept.is_empty() {
            String::new()
        } else {
            tool.accept_list()
        };
        println!(
            "{:<18} {:<20} {:<18} {}",
            bold(tool.id.as_str()),
            dim(&tool.base_url),
            input,
            dim(&accept)
        );
    }
    Ok(())
}

fn print_status(cli: &Cli, registry: &ServiceRegistry, map: &StatusMap) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(map)?);
        return Ok(());
    }
    for (tool, status) in map.iter() {
        println!(
            "{:<18} {:<22} {}",
            tool.as_str(),
            paint_status(status),
            dim(&registry.get(tool).health_url())
        );
    }
    if !cli.quiet {
        eprintln!(
            "{}/{} services online",
            bold(&map.online_count().to_string()),
            registry.len()
        );
    }
    Ok(())
}

async fn watch_status(cli: &Cli, registry: Arc<ServiceRegistry>, config: ClientConfig) -> Result<()> {
    let monitor = HealthMonitor::new(registry.clone(), config)?;
    let (mut rx, handle) = monitor.spawn();

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let map = rx.borrow_and_update().clone();
                print_status(cli, &registry, &map)?;
                if !cli.json {
                    println!();
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    handle.abort();
    Ok(())
}

// ── backgrounds / languages ──────────────────────────────────────────────

fn print_backgrounds(cli: &Cli, catalogue: &BackgroundCatalogue) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(catalogue)?);
        return Ok(());
    }
    println!("{}  {}", bold("solid"), dim("--bg-type solid --bg-option <name>"));
    for (name, hex) in &catalogue.solid_colors {
        println!("  {name:<14} {hex}");
    }
    println!("{}  {}", bold("gradient"), dim("--bg-type gradient --bg-option <name>"));
    for (name, stops) in &catalogue.gradients {
        println!("  {name:<14} {}", stops.join(" → "));
    }
    println!("{}  {}", bold("pattern"), dim("--bg-type pattern --bg-option <name>"));
    for name in catalogue.patterns.keys() {
        println!("  {name}");
    }
    Ok(())
}

fn print_languages(cli: &Cli, catalogue: &LanguageCatalogue) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(catalogue)?);
        return Ok(());
    }
    for lang in &catalogue.languages {
        let genders: Vec<&str> = lang.voices.iter().map(|v| v.gender.as_str()).collect();
        println!(
            "{:<4} {:<24} {} {}  {}",
            bold(&lang.code),
            lang.name,
            lang.voices.len(),
            dim("voices"),
            dim(&format!("[{}] styles: {}", genders.join(", "), lang.styles.join(", ")))
        );
    }
    if !catalogue.speed_options.is_empty() {
        println!("{} {}", bold("Speeds:"), catalogue.speed_options.join(", "));
    }
    Ok(())
}

// ── run ──────────────────────────────────────────────────────────────────

async fn run_tool(
    cli: &Cli,
    registry: Arc<ServiceRegistry>,
    args: &RunArgs,
    show_progress: bool,
) -> Result<()> {
    let tool: ToolId = args.tool.parse()?;
    let descriptor = registry.get(tool);

    let mut builder = base_config(cli);
    if show_progress {
        let cb = CliProgressCallback::new();
        builder = builder.progress_callback(cb as ProgressCallback);
    }
    let config = builder.build().context("Invalid configuration")?;

    // One sweep so the session knows which services are up.
    let map = HealthMonitor::new(registry.clone(), config.clone())?
        .sweep()
        .await;
    let (_tx, rx) = watch::channel(map);

    let mut session = Session::new(registry.clone(), rx, Dispatcher::new(config)?);
    session.select_tool(tool)?;

    // ── Stage input ──────────────────────────────────────────────────────
    if descriptor.input.is_text() {
        if !args.files.is_empty() {
            bail!("{tool} takes text; use --text or --text-file instead of file arguments");
        }
        let text = match (&args.text, &args.text_file) {
            (Some(t), _) => t.clone(),
            (None, Some(path)) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read text from {:?}", path))?,
            (None, None) => bail!("{tool} needs --text or --text-file"),
        };
        session.set_text(text);
    } else {
        if args.text.is_some() || args.text_file.is_some() {
            bail!("{tool} takes files, not text");
        }
        let mut files = load_files(&args.files).await?;
        match descriptor.input {
            InputMode::SingleFile if files.len() == 1 => session.stage_file(files.remove(0)),
            _ => session.stage_files(files),
        }
    }

    session.set_options(build_options(descriptor.options, &args.opts)?)?;

    // ── Submit ───────────────────────────────────────────────────────────
    session.submit().await?;
    let output = session
        .take_result()
        .context("Dispatch finished without a result")?;

    match output {
        DispatchOutput::Artifact(artifact) => {
            let path = args
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(&artifact.filename));
            artifact.save_to(&path).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&artifact)?);
            } else if !cli.quiet {
                eprintln!(
                    "{}  {}  →  {}",
                    green("✔"),
                    artifact.output_size,
                    bold(&path.display().to_string())
                );
                if let (Some(orig), Some(ratio)) = (&artifact.original_size, &artifact.compression_ratio) {
                    eprintln!("   {} → {}  ({})", dim(orig), artifact.output_size, ratio);
                }
                for (name, value) in &artifact.extra {
                    eprintln!("   {} {}", dim(&format!("{name}:")), value);
                }
            }
        }
        DispatchOutput::Payload(payload) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_payload(&payload)?;
            }
        }
    }
    Ok(())
}

fn print_payload(payload: &StructuredPayload) -> Result<()> {
    match payload {
        StructuredPayload::Summary { report, .. } => {
            if let Some(exec) = &report.executive_summary {
                println!("{}\n{}\n", bold("Executive summary"), exec);
            }
            println!("{}\n{}", bold("Summary"), report.summary);
            if !report.key_points.is_empty() {
                println!("\n{}", bold("Key points"));
                for p in &report.key_points {
                    println!("  • {p}");
                }
            }
            if !report.key_concepts.is_empty() {
                println!("\n{} {}", bold("Concepts:"), report.key_concepts.join(", "));
            }
        }
        StructuredPayload::Transcription { report, .. } => {
            println!("{}", report.text);
            if let Some(conf) = report.statistics.confidence {
                eprintln!("{}", dim(&format!("confidence {:.0}%", conf * 100.0)));
            }
        }
        StructuredPayload::Plagiarism { report, .. } => {
            let pct = format!("{:.1}%", report.percentage);
            let pct = if report.percentage >= 50.0 {
                red(&pct)
            } else if report.percentage >= 20.0 {
                yellow(&pct)
            } else {
                green(&pct)
            };
            println!(
                "{} similarity  ({}/{} sentences flagged)",
                bold(&pct),
                report.flagged_count,
                report.total_sentences
            );
            for line in report.sentence_analysis.iter().filter_map(flagged_line) {
                println!("{line}");
            }
            for r in &report.recommendations {
                println!("  → {r}");
            }
        }
        StructuredPayload::Other { value, .. } => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
    }
    Ok(())
}

/// One listing line for a flagged sentence; `None` for original ones.
fn flagged_line(s: &SentenceAnalysis) -> Option<String> {
    if s.severity == "original" {
        return None;
    }
    Some(format!(
        "  [{:>6}] {:>3.0}%  {}",
        s.severity,
        s.similarity * 100.0,
        s.text
    ))
}

/// Map option flags onto the schema of the selected tool.
fn build_options(schema: OptionSchema, o: &OptionArgs) -> Result<ToolOptions> {
    Ok(match schema {
        OptionSchema::None => ToolOptions::None,
        OptionSchema::Merge => ToolOptions::Merge(MergeOptions {
            bookmarks: o.bookmarks,
        }),
        OptionSchema::DocumentSummary => {
            let mut opts = DocumentSummaryOptions::default();
            if let Some(l) = &o.level {
                opts.level = l.parse()?;
            }
            if let Some(m) = &o.mode {
                opts.mode = m.clone();
            }
            ToolOptions::DocumentSummary(opts)
        }
        OptionSchema::TextSummary => {
            let mut opts = TextSummaryOptions::default();
            if let Some(l) = &o.level {
                opts.level = l.parse()?;
            }
            ToolOptions::TextSummary(opts)
        }
        OptionSchema::PdfRender => {
            let mut opts = PdfRenderOptions::default();
            if let Some(dpi) = o.dpi {
                opts = opts.dpi(dpi);
            }
            if let Some(q) = o.quality {
                opts = opts.quality(q);
            }
            if let Some(f) = &o.format {
                opts.format = f.parse()?;
            }
            ToolOptions::PdfRender(opts)
        }
        OptionSchema::ImageLayout => {
            let mut opts = ImageLayoutOptions::default();
            if let Some(l) = &o.layout {
                opts.layout = l.parse()?;
            }
            if let Some(p) = &o.page_size {
                opts.page_size = p.parse()?;
            }
            ToolOptions::ImageLayout(opts)
        }
        OptionSchema::Background => {
            let mut opts = BackgroundOptions::default();
            if let Some(m) = &o.model {
                opts.model = m.clone();
            }
            opts.alpha_matting = !o.no_alpha_matting;
            if let Some(t) = &o.bg_type {
                opts.bg_type = t.parse()?;
            }
            if let Some(b) = &o.bg_option {
                opts.bg_option = b.clone();
            }
            if let Some(c) = &o.bg_color {
                opts.bg_color = c.clone();
            }
            ToolOptions::Background(opts)
        }
        OptionSchema::Compression => {
            let mut opts = CompressionOptions::default();
            if let Some(p) = &o.preset {
                opts.preset = p.parse()?;
            }
            if let Some(f) = &o.format {
                opts.format = f.parse()?;
            }
            opts.width = o.width;
            opts.height = o.height;
            opts.target_size_kb = o.target_size;
            opts.preserve_exif = o.preserve_exif;
            ToolOptions::Compression(opts)
        }
        OptionSchema::Speech => {
            let mut opts = SpeechOptions::default();
            if let Some(l) = &o.language {
                opts.language = l.clone();
            }
            if let Some(s) = &o.speed {
                opts.speed = s.parse()?;
            }
            if let Some(e) = &o.engine {
                opts.engine = e.clone();
            }
            if let Some(g) = &o.voice_gender {
                opts.voice_gender = g.parse()?;
            }
            if let Some(s) = &o.style {
                opts.style = s.clone();
            }
            ToolOptions::Speech(opts)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_run_with_options() {
        let cli = Cli::try_parse_from([
            "docdash",
            "run",
            "image-compress",
            "photo.jpg",
            "--preset",
            "web",
            "--format",
            "webp",
            "--target-size",
            "200",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        let opts = build_options(OptionSchema::Compression, &args.opts).unwrap();
        let ToolOptions::Compression(c) = opts else {
            panic!("expected compression options");
        };
        assert_eq!(c.target_size_kb, Some(200));
        assert_eq!(c.format.as_str(), "WEBP");
    }

    #[test]
    fn bad_enum_value_is_reported() {
        let o = OptionArgs {
            speed: Some("warp".into()),
            ..Default::default()
        };
        let err = build_options(OptionSchema::Speech, &o).unwrap_err();
        assert!(err.to_string().contains("slow, normal, fast"), "got: {err}");
    }

    #[test]
    fn probe_timeout_range_enforced() {
        assert!(Cli::try_parse_from(["docdash", "--probe-timeout", "1500", "status"]).is_err());
        assert!(Cli::try_parse_from(["docdash", "--probe-timeout", "500", "status"]).is_ok());
    }

    #[test]
    fn original_sentences_are_not_listed() {
        let sentence = |severity: &str, similarity: f64| SentenceAnalysis {
            text: "Some sentence.".into(),
            similarity,
            severity: severity.into(),
            ..Default::default()
        };
        assert_eq!(flagged_line(&sentence("original", 0.2)), None);
        assert_eq!(
            flagged_line(&sentence("high", 0.87)).as_deref(),
            Some("  [  high]  87%  Some sentence.")
        );
        assert_eq!(
            flagged_line(&sentence("low", 0.4)).as_deref(),
            Some("  [   low]  40%  Some sentence.")
        );
    }

    #[test]
    fn bookmarks_flag_reaches_merge_options() {
        let cli = Cli::try_parse_from(["docdash", "run", "pdf-merge", "a.pdf", "b.pdf", "--bookmarks"])
            .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(
            build_options(OptionSchema::Merge, &args.opts).unwrap(),
            ToolOptions::Merge(MergeOptions { bookmarks: true })
        );
        assert!(Cli::try_parse_from(["docdash", "languages"]).is_ok());
        assert!(Cli::try_parse_from(["docdash", "backgrounds", "--json"]).is_ok());
    }

    #[test]
    fn flags_for_other_tools_are_ignored() {
        let o = OptionArgs {
            dpi: Some(150),
            ..Default::default()
        };
        assert_eq!(build_options(OptionSchema::None, &o).unwrap(), ToolOptions::None);
    }
}
