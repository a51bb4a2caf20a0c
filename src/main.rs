//! CLI entry point for `mailcat`.

use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use mailcat::config::{self, Config};
use mailcat::model::{DecodedContent, RawEmailInput, StoredEmail};
use mailcat::render;
use mailcat::Resolver;

#[derive(Parser)]
#[command(name = "mailcat", version, about = "Decode raw e-mail payloads into text and HTML bodies")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode one payload and print its metadata and bodies
    Decode {
        /// Input file; reads stdin when omitted or `-`
        file: Option<PathBuf>,
        /// How to interpret the input
        #[arg(short, long, value_enum, default_value_t = InputKind::Auto)]
        input: InputKind,
        /// Archived raw message used to fill fields the input leaves empty
        #[arg(long, value_name = "FILE")]
        archive: Option<PathBuf>,
        /// Print the decoded content as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decode one payload and print HTML suitable for display
    Render {
        /// Input file; reads stdin when omitted or `-`
        file: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = InputKind::Auto)]
        input: InputKind,
        #[arg(long, value_name = "FILE")]
        archive: Option<PathBuf>,
    },
    /// Decode many files in parallel into an output directory
    Batch {
        inputs: Vec<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        #[arg(short, long, value_enum, default_value_t = InputKind::Auto)]
        input: InputKind,
        /// Worker threads (defaults to the number of CPUs)
        #[arg(short, long)]
        jobs: Option<usize>,
    },
    /// Show configuration paths and effective settings
    Config {
        /// Write the current settings to the config file
        #[arg(long)]
        init: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

/// Shape of the input payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputKind {
    /// JSON records are read as stored e-mails, everything else as a full message
    Auto,
    /// Raw message, headers and body (Base64 of one is accepted)
    Full,
    /// Body without headers
    Body,
    /// JSON stored e-mail record
    Stored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
    Html,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "txt",
            Self::Html => "html",
        }
    }
}

/// A payload ready for the resolver.
enum Loaded {
    Raw(RawEmailInput),
    Stored(StoredEmail),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Decode {
            file,
            input,
            archive,
            json,
        } => cmd_decode(file.as_deref(), input, archive.as_deref(), json, &config),
        Commands::Render {
            file,
            input,
            archive,
        } => cmd_render(file.as_deref(), input, archive.as_deref(), &config),
        Commands::Batch {
            inputs,
            output,
            format,
            input,
            jobs,
        } => cmd_batch(&inputs, &output, format, input, jobs, &config),
        Commands::Config { init } => cmd_config(init, &config),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "mailcat.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Read a file, or stdin for `None` / `-`. Invalid UTF-8 is replaced.
fn read_text(path: Option<&Path>) -> anyhow::Result<String> {
    let bytes = match path {
        Some(p) if p != Path::new("-") => {
            if !p.exists() {
                anyhow::bail!("File not found: {}", p.display());
            }
            std::fs::read(p)?
        }
        _ => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

fn load(text: String, kind: InputKind) -> anyhow::Result<Loaded> {
    let loaded = match kind {
        InputKind::Full => Loaded::Raw(RawEmailInput::FullMessage(text)),
        InputKind::Body => Loaded::Raw(RawEmailInput::BodyOnly(text)),
        InputKind::Stored => Loaded::Stored(StoredEmail::from_json(&text)?),
        InputKind::Auto => {
            if text.trim_start().starts_with('{') {
                match StoredEmail::from_json(&text) {
                    Ok(stored) => Loaded::Stored(stored),
                    Err(e) => {
                        tracing::debug!(error = %e, "Not a stored record, decoding as a message");
                        Loaded::Raw(RawEmailInput::FullMessage(text))
                    }
                }
            } else {
                Loaded::Raw(RawEmailInput::FullMessage(text))
            }
        }
    };
    Ok(loaded)
}

fn decode(resolver: &Resolver, loaded: Loaded, archive: Option<&str>) -> DecodedContent {
    match loaded {
        Loaded::Raw(input) => resolver.resolve_with_archive(&input, archive),
        Loaded::Stored(mut stored) => {
            if let Some(raw) = archive.filter(|_| stored.raw_email.is_empty()) {
                stored.raw_email = raw.to_string();
            }
            resolver.resolve_stored(&stored)
        }
    }
}

fn decode_from(
    file: Option<&Path>,
    kind: InputKind,
    archive: Option<&Path>,
    config: &Config,
) -> anyhow::Result<DecodedContent> {
    let loaded = load(read_text(file)?, kind)?;
    let archive = archive.map(|p| read_text(Some(p))).transpose()?;
    let resolver = Resolver::new(config.decoder.clone());
    Ok(decode(&resolver, loaded, archive.as_deref()))
}

/// Decode one payload and print a summary or JSON.
fn cmd_decode(
    file: Option<&Path>,
    kind: InputKind,
    archive: Option<&Path>,
    json: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let content = decode_from(file, kind, archive, config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&content)?);
    } else {
        print!("{}", render::text::summary(&content));
    }
    Ok(())
}

/// Decode one payload and print its display HTML.
fn cmd_render(
    file: Option<&Path>,
    kind: InputKind,
    archive: Option<&Path>,
    config: &Config,
) -> anyhow::Result<()> {
    let content = decode_from(file, kind, archive, config)?;
    println!("{}", content.display_html_with(&config.render));
    Ok(())
}

/// Decode one input file and write the result into `output`.
fn process_file(
    resolver: &Resolver,
    path: &Path,
    output: &Path,
    format: OutputFormat,
    kind: InputKind,
    config: &Config,
) -> anyhow::Result<u64> {
    let size = std::fs::metadata(path)?.len();
    let content = decode(resolver, load(read_text(Some(path))?, kind)?, None);

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("message");
    match format {
        OutputFormat::Text => {
            render::text::export_text(&content, stem, output)?;
        }
        OutputFormat::Json => {
            let target = output.join(format!("{stem}.{}", format.extension()));
            std::fs::write(target, serde_json::to_string_pretty(&content)?)?;
        }
        OutputFormat::Html => {
            let target = output.join(format!("{stem}.{}", format.extension()));
            std::fs::write(target, content.display_html_with(&config.render).as_bytes())?;
        }
    }
    Ok(size)
}

/// Decode many files with a pool of scoped worker threads.
fn cmd_batch(
    inputs: &[PathBuf],
    output: &Path,
    format: OutputFormat,
    kind: InputKind,
    jobs: Option<usize>,
    config: &Config,
) -> anyhow::Result<()> {
    if inputs.is_empty() {
        anyhow::bail!("No input files given");
    }
    for input in inputs {
        if !input.exists() {
            anyhow::bail!("File not found: {}", input.display());
        }
    }
    std::fs::create_dir_all(output)?;

    let jobs = jobs
        .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
        .clamp(1, inputs.len());
    let chunk_size = inputs.len().div_ceil(jobs);

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Decoding [{bar:40.cyan/blue}] {pos}/{len}")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let resolver = Resolver::new(config.decoder.clone());
    let start = Instant::now();

    let outcomes: Vec<(&PathBuf, anyhow::Result<u64>)> = std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .chunks(chunk_size)
            .map(|chunk| {
                let resolver = &resolver;
                let pb = &pb;
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|path| {
                            let outcome = process_file(resolver, path, output, format, kind, config);
                            pb.inc(1);
                            (path, outcome)
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .zip(inputs.chunks(chunk_size))
            .flat_map(|(handle, chunk)| match handle.join() {
                Ok(results) => results,
                Err(_) => chunk
                    .iter()
                    .map(|path| (path, Err(anyhow::anyhow!("worker thread panicked"))))
                    .collect(),
            })
            .collect()
    });

    pb.finish_and_clear();

    let mut decoded = 0usize;
    let mut total_bytes = 0u64;
    for (path, outcome) in &outcomes {
        match outcome {
            Ok(size) => {
                decoded += 1;
                total_bytes += size;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to decode");
                eprintln!("  {}: {e}", path.display());
            }
        }
    }

    use humansize::{format_size, BINARY};
    let elapsed = start.elapsed();
    println!();
    println!("  Batch complete:");
    println!("  {:<25} {}", "Files decoded", decoded);
    println!("  {:<25} {}", "Failures", outcomes.len() - decoded);
    println!("  {:<25} {}", "Input size", format_size(total_bytes, BINARY));
    println!("  {:<25} {}", "Worker threads", jobs);
    println!("  {:<25} {:.2?}", "Elapsed", elapsed);
    println!("  {:<25} {}", "Output directory", output.display());
    println!();

    if decoded == 0 {
        anyhow::bail!("No file could be decoded");
    }
    Ok(())
}

/// Print config locations and the effective settings.
fn cmd_config(init: bool, config: &Config) -> anyhow::Result<()> {
    if init {
        config::save_config(config)?;
    }
    match config::config_file_path() {
        Some(path) => println!("# config file: {}", path.display()),
        None => println!("# config file: (no config directory)"),
    }
    println!("# log file:    {}", config::log_file_path(config).display());
    println!();
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mailcat", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
