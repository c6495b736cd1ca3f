//! oxmodal entrypoint: replays a modal key script over a text file.
use anyhow::{Context, Result};
use clap::Parser;
use core_actions::{ActionRegistry, Engine, EngineSettings, KeyOutcome, MemoryHost};
use core_config::{Config, LoadedBindings, load_bindings, load_from};
use core_text::{Buffer, Position};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE: &str = "oxmodal.log";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "oxmodal", version, about = "Replay vim-style key scripts over a text file")]
struct Args {
    /// File to edit (UTF-8 text).
    pub path: PathBuf,
    /// Keys to replay in key notation, e.g. `ciwfoo<Esc>` or `<C-w>v`.
    #[arg(long = "keys", short = 'k')]
    pub keys: String,
    /// Initial cursor as LINE:COL (0-based). Repeat for one cursor each.
    #[arg(long = "cursor", value_parser = parse_cursor)]
    pub cursors: Vec<Position>,
    /// Language id of the document (drives comment-aware `J`).
    #[arg(long = "language")]
    pub language: Option<String>,
    /// Optional configuration file path (overrides discovery of `oxmodal.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Write the result back to the file instead of printing it.
    #[arg(long = "write")]
    pub write: bool,
}

fn parse_cursor(src: &str) -> Result<Position, String> {
    let (line, col) = src
        .split_once(':')
        .ok_or_else(|| format!("expected LINE:COL, got `{src}`"))?;
    let line = line
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("bad line in `{src}`: {e}"))?;
    let col = col
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("bad column in `{src}`: {e}"))?;
    Ok(Position::new(line, col))
}

/// Tallies of per-key outcomes for the run summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ReplaySummary {
    executed: usize,
    pending: usize,
    reset: usize,
    aborted: usize,
}

impl ReplaySummary {
    fn from_outcomes(outcomes: &[KeyOutcome]) -> Self {
        let mut s = Self::default();
        for outcome in outcomes {
            match outcome {
                KeyOutcome::Executed { .. } => s.executed += 1,
                KeyOutcome::Pending => s.pending += 1,
                KeyOutcome::Reset => s.reset += 1,
                KeyOutcome::Aborted => s.aborted += 1,
            }
        }
        s
    }
}

struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join(LOG_FILE);
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .with_ansi(false)
            .try_init()
        {
            Ok(_) => {
                self.log_guard = Some(guard);
            }
            Err(_err) => {
                // Global subscriber already installed; dropping the guard shuts the writer down.
            }
        }

        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }

    /// Config plus its validated bindings, loaded once for the whole run.
    fn load_config(args: &Args) -> Result<(Config, LoadedBindings)> {
        let config = load_from(args.config.clone()).context("loading configuration")?;
        let loaded = load_bindings(&config.file);
        for diagnostic in &loaded.diagnostics {
            eprintln!("oxmodal: ignoring binding: {diagnostic}");
        }
        Ok((config, loaded))
    }

    fn load_host(args: &Args) -> Result<MemoryHost> {
        let content = std::fs::read_to_string(&args.path)
            .with_context(|| format!("reading {}", args.path.display()))?;
        let text = content.replace("\r\n", "\n");
        let name = args
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("file");
        tracing::debug!(
            target: "io",
            file = %args.path.display(),
            size_bytes = content.len(),
            "file_read_ok"
        );
        let mut host = MemoryHost::new(Buffer::from_str(name, &text))
            .with_cursors(args.cursors.iter().copied());
        if let Some(language) = &args.language {
            host = host.with_language(language.clone());
        }
        Ok(host)
    }
}

fn run(args: &Args) -> Result<()> {
    let (config, bindings) = AppStartup::load_config(args)?;
    let registry =
        ActionRegistry::with_bindings(&bindings.bindings).context("building action registry")?;
    let mut engine = Engine::new(Arc::new(registry), EngineSettings::from_config(&config));
    let mut host = AppStartup::load_host(args)?;

    let outcomes = engine
        .feed(&mut host, &args.keys)
        .with_context(|| format!("parsing key script `{}`", args.keys))?;
    let summary = ReplaySummary::from_outcomes(&outcomes);
    info!(
        target: "runtime",
        keys = outcomes.len(),
        executed = summary.executed,
        pending = summary.pending,
        reset = summary.reset,
        aborted = summary.aborted,
        mode = engine.mode().name(),
        "replay_complete"
    );
    if !engine.pending_keys().is_empty() {
        warn!(
            target: "runtime",
            pending = engine.pending_keys().len(),
            "replay_ended_mid_sequence"
        );
    }
    for (command, cmd_args) in &host.executed {
        match cmd_args {
            Some(value) => eprintln!("command: {command} {value}"),
            None => eprintln!("command: {command}"),
        }
    }

    let text = host.text();
    if args.write {
        std::fs::write(&args.path, &text)
            .with_context(|| format!("writing {}", args.path.display()))?;
        info!(target: "runtime", path = %args.path.display(), "file_written");
    } else if text.ends_with('\n') {
        print!("{text}");
    } else {
        println!("{text}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let mut startup = AppStartup::new();
    startup.configure_logging()?;
    AppStartup::install_panic_hook();
    info!(target: "runtime", "startup");

    let args = Args::parse();
    let result = run(&args);
    if let Err(e) = &result {
        tracing::error!(target: "runtime", error = %e, "run_failed");
    }
    result
}
