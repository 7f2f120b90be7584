//! CLI binary for edgequake-timetable.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_timetable::{
    convert_to_file, ConversionConfig, ConversionProgressCallback, LayoutConfig, PageSelection,
    ProgressCallback, TimetableOutput,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one spinner whose message follows the stage,
/// plus a log line for each finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading schedule…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_input_ready(&self, kind: &str, parts: usize) {
        let what = match kind {
            "text" => "PDF text layer".to_string(),
            _ if parts == 1 => "1 image".to_string(),
            _ => format!("{parts} images"),
        };
        self.bar
            .println(format!("  {} Input ready  {}", green("✓"), dim(&what)));
    }

    fn on_recognition_start(&self, model: &str) {
        self.bar.set_prefix("Extracting");
        self.bar.set_message(format!("asking {model}…"));
    }

    fn on_fallback(&self, from: &str, to: &str, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {} failed: {}  {}",
            yellow("⚠"),
            from,
            dim(&msg),
            cyan(&format!("→ {to}"))
        ));
    }

    fn on_rows_ready(&self, rows: usize, adjusted_cells: usize) {
        self.bar.println(format!(
            "  {} {} rows  {}",
            green("✓"),
            rows,
            dim(&format!("{adjusted_cells} time cells adjusted"))
        ));
        self.bar.set_prefix("Rendering");
        self.bar.set_message("laying out PDF…");
    }

    fn on_render_complete(&self, pages: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} Rendered {} page{}",
            green("✔"),
            bold(&pages.to_string()),
            if pages == 1 { "" } else { "s" }
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Re-time a routine PDF (writes routine_ramadan.pdf)
  timetable routine.pdf

  # A phone photo, explicit output path
  timetable IMG_2041.jpg -o schedule.pdf

  # Only page 2 of a multi-page routine, portrait layout
  timetable --pages 2 --portrait routine.pdf

  # Pin the model, no fallback
  timetable --model gpt-4.1 --no-fallback routine.pdf

  # Also print the adjusted table as JSON on stdout
  timetable --json routine.pdf > table.json

TIME ADJUSTMENTS:
  Classes                                   Labs
  08:00 AM - 09:20 AM → 08:00 AM - 09:05 AM  08:00 AM - 10:50 AM → 08:00 AM - 10:20 AM
  09:30 AM - 10:50 AM → 09:15 AM - 10:20 AM  11:00 AM - 01:50 PM → 10:30 AM - 12:50 PM
  11:00 AM - 12:20 PM → 10:30 AM - 11:35 AM  02:00 PM - 04:50 PM → 01:00 PM - 03:20 PM
  12:30 PM - 01:50 PM → 11:45 AM - 12:50 PM  05:00 PM - 07:50 PM → 03:30 PM - 05:50 PM
  02:00 PM - 03:20 PM → 01:00 PM - 02:05 PM
  03:30 PM - 04:50 PM → 02:15 PM - 03:20 PM
  05:00 PM - 06:20 PM → 03:30 PM - 04:35 PM

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override primary model ID
  PDFIUM_LIB_PATH         Directory or file of the libpdfium shared library

SETUP:
  1. Set API key:     export OPENAI_API_KEY=sk-...
  2. Convert:         timetable routine.pdf
"#;

/// Re-time a class schedule for Ramadan hours and render it as a PDF.
#[derive(Parser, Debug)]
#[command(
    name = "timetable",
    version,
    about = "Re-time a class schedule (PDF or image) for Ramadan hours",
    long_about = "Read a class schedule from a PDF or an image with a vision LLM, rewrite every \
class and lab time range to its Ramadan slot, and render the adjusted table as a paginated PDF. \
Supports OpenAI, Anthropic, Google Gemini, Azure OpenAI, and any OpenAI-compatible endpoint.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF/image path or HTTP/HTTPS URL.
    input: String,

    /// Output PDF path. Default: `<input stem>_ramadan.pdf`.
    #[arg(short, long, env = "TIMETABLE_OUTPUT")]
    output: Option<PathBuf>,

    /// Primary vision model ID.
    #[arg(long, env = "EDGEQUAKE_MODEL", default_value = "gpt-4o")]
    model: String,

    /// Model tried once when the primary fails to respond.
    #[arg(long, env = "TIMETABLE_FALLBACK_MODEL", default_value = "gpt-4.1-mini")]
    fallback_model: String,

    /// Do not try a fallback model.
    #[arg(long, env = "TIMETABLE_NO_FALLBACK")]
    no_fallback: bool,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Title printed above the table.
    #[arg(long, env = "TIMETABLE_TITLE", default_value = "Ramadan Class Schedule")]
    title: String,

    /// Rasterisation DPI for scanned PDFs (72–400).
    #[arg(long, env = "TIMETABLE_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Page selection for PDFs: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "TIMETABLE_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "TIMETABLE_PASSWORD")]
    password: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "TIMETABLE_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Max LLM output tokens.
    #[arg(long, env = "TIMETABLE_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "TIMETABLE_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Per-call LLM timeout in seconds.
    #[arg(long, env = "TIMETABLE_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "TIMETABLE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Render on A4 portrait instead of landscape.
    #[arg(long, env = "TIMETABLE_PORTRAIT")]
    portrait: bool,

    /// Print the adjusted table and stats as JSON on stdout.
    #[arg(long, env = "TIMETABLE_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "TIMETABLE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "TIMETABLE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "TIMETABLE_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback that matters; keep library INFO logs
    // out of its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb).await?;
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert_to_file(&cli.input, &output_path, &config)
        .await
        .with_context(|| format!("Conversion of {} failed", cli.input))?;

    if cli.json {
        println!("{}", render_json(&output)?);
    }

    if !cli.quiet {
        print_summary(&output, &output_path);
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let pages = parse_pages(&cli.pages)?;
    let layout = if cli.portrait {
        LayoutConfig::portrait()
    } else {
        LayoutConfig::default()
    };

    let mut builder = ConversionConfig::builder()
        .model(&cli.model)
        .fallback_model(&cli.fallback_model)
        .title(&cli.title)
        .dpi(cli.dpi)
        .pages(pages)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout)
        .layout(layout);

    if cli.no_fallback {
        builder = builder.no_fallback();
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// `dir/routine.pdf` → `routine_ramadan.pdf`; URLs use their last path segment.
fn default_output_path(input: &str) -> PathBuf {
    let trimmed = input.split(['?', '#']).next().unwrap_or(input);
    let stem = Path::new(trimmed)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("schedule");
    PathBuf::from(format!("{stem}_ramadan.pdf"))
}

fn render_json(output: &TimetableOutput) -> Result<String> {
    let value = serde_json::json!({
        "table": output.table,
        "stats": output.stats,
    });
    serde_json::to_string_pretty(&value).context("Failed to serialise output")
}

fn print_summary(output: &TimetableOutput, path: &Path) {
    let stats = &output.stats;
    let column = stats
        .time_column
        .as_deref()
        .map(|c| format!("column \"{c}\""))
        .unwrap_or_else(|| "no time column".to_string());
    eprintln!(
        "{}  {} rows  {} adjusted  {}ms  →  {}",
        if output.table.is_placeholder() {
            yellow("⚠")
        } else {
            green("✔")
        },
        stats.rows,
        stats.adjusted_cells,
        stats.total_duration_ms,
        bold(&path.display().to_string()),
    );
    eprintln!(
        "   {}{}{}",
        dim(&format!("model {}", stats.model)),
        if stats.used_fallback {
            yellow(" (fallback)")
        } else {
            String::new()
        },
        dim(&format!("  ·  {column}{}", if stats.swept { ", swept all cells" } else { "" })),
    );
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!(
                "Invalid page range '{}-{}': start must be <= end",
                start,
                end
            );
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .context(format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_parse() {
        assert!(matches!(parse_pages("all").unwrap(), PageSelection::All));
        assert!(matches!(parse_pages(" 3 ").unwrap(), PageSelection::Single(3)));
        assert!(matches!(parse_pages("2-4").unwrap(), PageSelection::Range(2, 4)));
        assert!(matches!(parse_pages("1,3").unwrap(), PageSelection::Set(ref v) if v == &[1, 3]));
        assert!(parse_pages("0").is_err());
        assert!(parse_pages("5-2").is_err());
        assert!(parse_pages("x").is_err());
    }

    #[test]
    fn output_path_from_input() {
        assert_eq!(default_output_path("dir/routine.pdf"), PathBuf::from("routine_ramadan.pdf"));
        assert_eq!(
            default_output_path("https://x.org/files/spring.png?dl=1"),
            PathBuf::from("spring_ramadan.pdf")
        );
        assert_eq!(default_output_path(""), PathBuf::from("schedule_ramadan.pdf"));
    }
}
