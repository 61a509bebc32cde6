use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::exit;
use tokrank::{Encoder, PatternPreset, Rank, Vocab};
use tracing::*;
use tracing_subscriber::{filter::LevelFilter, EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    globals: Globals,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Globals {
    /// Vocabulary file, one `<base64 token> <rank>` pair per line
    #[arg(short, long, value_name = "FILE", env = "TOKRANK_VOCAB", global = true)]
    vocab: Option<PathBuf>,

    /// Published pattern used to split text into pieces before encoding
    #[arg(long, default_value = "cl100k_base", global = true)]
    preset: PatternPreset,

    /// Custom regex used to split text into pieces.  Overrides `--preset`
    #[arg(long, value_name = "REGEX", global = true)]
    pattern: Option<String>,

    /// Turn debugging information on
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    debug: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode text into tokens, printed as space separated ranks
    Encode {
        /// Text to encode.  Read from stdin if not given
        text: Option<String>,
    },

    /// Decode ranks back into the bytes they stand for, written to stdout as-is
    Decode {
        #[arg(required = true)]
        ranks: Vec<Rank>,
    },

    /// Show how text is broken into tokens, one token per line
    Split {
        /// Text to split.  Read from stdin if not given
        text: Option<String>,
    },

    /// Describe the encoder
    Info,
}

impl Globals {
    fn encoder(&self) -> anyhow::Result<Encoder> {
        let path = self
            .vocab
            .as_deref()
            .context("No vocabulary given; use --vocab or set TOKRANK_VOCAB")?;

        let vocab = Vocab::from_path(path)
            .with_context(|| format!("Loading vocabulary {}", path.display()))?;
        let name = encoder_name(path);

        let encoder = match &self.pattern {
            Some(pattern) => Encoder::with_pattern(name, vocab, pattern)?,
            None => Encoder::with_preset(name, vocab, self.preset)?,
        };
        debug!(%encoder, "Loaded encoder");

        Ok(encoder)
    }
}

/// Encoders are named after their vocabulary file, without the extension
fn encoder_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn text_or_stdin(text: Option<String>) -> anyhow::Result<String> {
    match text {
        Some(text) => Ok(text),
        None => std::io::read_to_string(std::io::stdin()).context("Reading text from stdin"),
    }
}

impl Commands {
    fn execute(self, globals: &Globals) -> anyhow::Result<()> {
        use Commands::*;

        let encoder = globals.encoder()?;
        let mut stdout = std::io::stdout().lock();

        match self {
            Encode { text } => {
                let text = text_or_stdin(text)?;
                let tokens = encoder.encode(&text)?;
                debug!(bytes = text.len(), tokens = tokens.len(), "Encoded text");

                let tokens = tokens
                    .iter()
                    .map(Rank::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(stdout, "{tokens}")?;
            }
            Decode { ranks } => {
                let bytes = encoder.decode(&ranks)?;
                stdout.write_all(&bytes)?;
            }
            Split { text } => {
                let text = text_or_stdin(text)?;
                for piece in encoder.split(&text)? {
                    match encoder.vocab().try_get_rank(piece) {
                        Some(rank) => writeln!(stdout, "{rank}\t{}", piece.escape_ascii())?,
                        None => writeln!(stdout, "-\t{}", piece.escape_ascii())?,
                    }
                }
            }
            Info => {
                writeln!(stdout, "{encoder}")?;
            }
        }

        stdout.flush()?;
        Ok(())
    }
}

fn main() {
    let cli = Cli::parse();
    // You can see how many times a particular flag or argument occurred
    // Note, only flags can have multiple occurrences
    let default_log_directive = match cli.globals.debug {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    // Log as JSON to stderr, stdout carries the command output
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_log_directive.into())
                .from_env_lossy(),
        )
        .json()
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    if let Err(e) = cli.command.execute(&cli.globals) {
        error!("{:#}", e);
        exit(1);
    } else {
        debug!("command executed successfully");
    }
}
