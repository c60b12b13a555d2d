//! CLI binary for act-analyzer.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalysisConfig`, then either analyses one PDF or starts the upload
//! surface.

use act_analyzer::web::{self, ServerConfig};
use act_analyzer::{
    analyze_file, write_report, AnalysisConfig, AnalysisProgressCallback, CompiledReport,
    ProgressCallback, Task, DEFAULT_MODEL, DEFAULT_PROVIDER,
};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One line per finished task above a bar that counts them. Tasks finish in
/// any order when run concurrently.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<Task, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(Task::ALL.len() as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:30.green/238}] {pos}/{len} tasks  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Analysing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn elapsed(&self, task: Task) -> String {
        let secs = self
            .start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&task))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        dim(&format!("{secs:.1}s"))
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_task_start(&self, task: Task) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(task, Instant::now());
        }
        self.bar.set_message(task.label());
    }

    fn on_task_complete(&self, task: Task) {
        self.bar
            .println(format!("  {} {:<14} {}", green("✓"), task.label(), self.elapsed(task)));
        self.bar.inc(1);
    }

    fn on_task_error(&self, task: Task, error: &str) {
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(['…']).collect()
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:<14} {}  {}",
            red("✗"),
            task.label(),
            red(&msg),
            self.elapsed(task)
        ));
        self.bar.inc(1);
    }

    fn on_analysis_complete(&self, total: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total.saturating_sub(success_count);
        if failed == 0 {
            eprintln!("{} all {} tasks succeeded", green("✔"), bold(&total.to_string()));
        } else {
            eprintln!(
                "{} {}/{} tasks succeeded  ({} replaced by placeholders)",
                red("⚠"),
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Print the report to stdout
  act-analyzer analyze universal_credit_act_2025.pdf

  # Write the report to a file
  act-analyzer analyze act.pdf -o report.json

  # Use another provider, one task at a time
  act-analyzer analyze act.pdf --provider openai --model gpt-4.1-mini --sequential

  # Start the upload page on port 8080
  act-analyzer serve --addr 0.0.0.0:8080

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_PROVIDER      Override provider
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium — skips auto-download
  RUST_LOG                Tracing filter (overrides -v / -q)

A `.env` file in the working directory is loaded on start-up.
"#;

/// Analyse legislative Acts (PDF) into a structured JSON report.
#[derive(Parser, Debug)]
#[command(
    name = "act-analyzer",
    version,
    about = "Analyse legislative Acts (PDF) into a structured JSON report",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "ACT_ANALYZER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "ACT_ANALYZER_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse one PDF and print or write the report.
    Analyze(AnalyzeArgs),
    /// Serve the HTML upload page.
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// LLM provider: gemini, openai, anthropic, ollama, ...
    #[arg(long, env = "EDGEQUAKE_PROVIDER", default_value = DEFAULT_PROVIDER)]
    provider: String,

    /// LLM model ID.
    #[arg(long, env = "EDGEQUAKE_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "ACT_ANALYZER_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max LLM output tokens per task.
    #[arg(long, env = "ACT_ANALYZER_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// Per-task LLM call timeout in seconds.
    #[arg(long, env = "ACT_ANALYZER_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Run the three tasks one after another instead of concurrently.
    #[arg(long, env = "ACT_ANALYZER_SEQUENTIAL")]
    sequential: bool,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Local PDF file path.
    input: PathBuf,

    /// Write the report to this file instead of stdout.
    #[arg(short, long, env = "ACT_ANALYZER_OUTPUT")]
    output: Option<PathBuf>,

    /// Print the full run (report + token stats) as JSON.
    #[arg(long, env = "ACT_ANALYZER_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "ACT_ANALYZER_NO_PROGRESS")]
    no_progress: bool,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "ACT_ANALYZER_ADDR", default_value = "127.0.0.1:5000")]
    addr: SocketAddr,

    /// Directory for spooled uploads and the written report.
    #[arg(long, env = "ACT_ANALYZER_UPLOAD_DIR", default_value = web::DEFAULT_UPLOAD_DIR)]
    upload_dir: PathBuf,

    #[command(flatten)]
    model: ModelArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs during a terminal analysis run.
    let show_progress = match &cli.command {
        Command::Analyze(a) => !cli.quiet && !a.no_progress && !a.json,
        Command::Serve(_) => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info,tower_http=debug"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    ensure_pdf_engine(cli.quiet)?;

    match cli.command {
        Command::Analyze(args) => run_analyze(args, cli.quiet, show_progress).await,
        Command::Serve(args) => {
            let config = build_config(&args.model, None)?;
            let server = ServerConfig {
                bind_addr: args.addr,
                upload_dir: args.upload_dir,
            };
            if !cli.quiet {
                eprintln!("{} serving on {}", green("◆"), bold(&format!("http://{}", server.bind_addr)));
            }
            web::serve(server, config).await.context("Server failed")
        }
    }
}

/// Make sure the pdfium shared library is present before any extraction.
fn ensure_pdf_engine(quiet: bool) -> Result<()> {
    #[cfg(feature = "bundled")]
    {
        let _ = quiet;
        tokio::task::block_in_place(pdfium_auto::ensure_pdfium_bundled)
            .context("Failed to extract bundled PDFium engine")?;
    }

    #[cfg(not(feature = "bundled"))]
    if !pdfium_auto::is_pdfium_cached() {
        if quiet {
            tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
                .context("Failed to download PDFium engine")?;
            return Ok(());
        }

        let dl_bar = ProgressBar::new(0);
        dl_bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        dl_bar.set_prefix("PDF engine");
        dl_bar.enable_steady_tick(Duration::from_millis(80));

        let bar = dl_bar.clone();
        tokio::task::block_in_place(|| {
            pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
                if let Some(t) = total {
                    if bar.length().unwrap_or(0) != t {
                        bar.set_length(t);
                    }
                }
                bar.set_position(downloaded);
            }))
        })
        .context("Failed to download PDFium engine")?;
        dl_bar.finish_with_message("ready ✓");
    }

    Ok(())
}

async fn run_analyze(args: AnalyzeArgs, quiet: bool, show_progress: bool) -> Result<()> {
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn AnalysisProgressCallback>)
    } else {
        None
    };
    let config = build_config(&args.model, progress)?;

    let run = analyze_file(&args.input, &config)
        .await
        .with_context(|| format!("Analysis of {} failed", args.input.display()))?;

    if let CompiledReport::Aborted { error } = &run.report {
        bail!("AI Agent Error: {error}. Check your API key.");
    }

    if args.json {
        let json = serde_json::to_string_pretty(&run).context("Failed to serialise run")?;
        println!("{json}");
    } else if let Some(ref path) = args.output {
        write_report(&run.report, path)
            .await
            .context("Failed to write report")?;
        if !quiet {
            eprintln!("{} report written to {}", green("✔"), bold(&path.display().to_string()));
        }
    } else {
        let json = run.report.report().map(|r| r.to_pretty_json()).transpose()?;
        println!("{}", json.unwrap_or_default());
    }

    if !quiet && !args.json {
        eprintln!(
            "   {} tokens in  /  {} tokens out  —  {}ms total",
            dim(&run.stats.total_input_tokens.to_string()),
            dim(&run.stats.total_output_tokens.to_string()),
            run.stats.total_duration_ms,
        );
    }
    Ok(())
}

/// Map CLI args to `AnalysisConfig`.
fn build_config(args: &ModelArgs, progress: Option<ProgressCallback>) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfig::builder()
        .provider_name(&args.provider)
        .model(&args.model)
        .temperature(args.temperature)
        .max_tokens(args.max_tokens)
        .api_timeout_secs(args.api_timeout)
        .sequential_tasks(args.sequential);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
