use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use rml::playback::note_name;
use rml::{compile_with_options, lex, preprocess, validate, Config, NoteTrack};

#[derive(Parser)]
#[command(name = "rml")]
#[command(about = "Compile RML music notation into timed note events", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a piece and print its note tracks
    Compile {
        /// Input file, or '-' for stdin
        input: String,

        /// Seconds per unmodified note (overrides the config file)
        #[arg(short, long)]
        note_length: Option<f64>,

        /// YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: TrackFormat,

        /// Skip range checks on the compiled tracks
        #[arg(long)]
        no_validate: bool,
    },
    /// Print the lexed fragments of a piece
    Tokens {
        /// Input file, or '-' for stdin
        input: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "debug")]
        format: TokenFormat,
    },
    /// Compile and validate a piece, printing only the outcome
    Check {
        /// Input file, or '-' for stdin
        input: String,

        /// YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TrackFormat {
    Text,
    Json,
    Yaml,
}

#[derive(Clone, Copy, ValueEnum)]
enum TokenFormat {
    Debug,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compile {
            input,
            note_length,
            config,
            format,
            no_validate,
        } => {
            let mut config = load_config(config.as_ref())?;
            if let Some(note_length) = note_length {
                config.options.note_length = note_length;
            }
            if no_validate {
                config.validate = false;
            }

            let source = read_input(&input)?;
            let tracks = compile_source(&source, &config)?;
            info!(tracks = tracks.len(), "compiled {}", input);

            match format {
                TrackFormat::Text => print!("{}", format_tracks(&tracks)),
                TrackFormat::Json => println!("{}", serde_json::to_string_pretty(&tracks)?),
                TrackFormat::Yaml => print!("{}", serde_yaml::to_string(&tracks)?),
            }
        }
        Commands::Tokens { input, format } => {
            let source = read_input(&input)?;
            let fragments = lex(&preprocess(&source))?;

            match format {
                TokenFormat::Debug => {
                    for (index, fragment) in fragments.iter().enumerate() {
                        println!("fragment {} ({:?})", index, fragment.rhythm);
                        for (voice, sequence) in fragment.sequences.iter().enumerate() {
                            println!(
                                "  voice {} ({} tokens): {:?}",
                                voice,
                                sequence.len(),
                                sequence.tokens
                            );
                        }
                    }
                }
                TokenFormat::Json => println!("{}", serde_json::to_string_pretty(&fragments)?),
            }
        }
        Commands::Check { input, config } => {
            let mut config = load_config(config.as_ref())?;
            config.validate = true;

            let source = read_input(&input)?;
            let tracks = compile_source(&source, &config)?;
            let events: usize = tracks.iter().map(NoteTrack::len).sum();
            println!("ok: {} tracks, {} events", tracks.len(), events);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Error reading config '{}'", path.display()))?;
    let config = Config::from_yaml(&content)
        .with_context(|| format!("Error loading config '{}'", path.display()))?;
    debug!(?config, "loaded config");
    Ok(config)
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Error reading stdin")?;
        Ok(buffer)
    } else {
        fs::read_to_string(input).with_context(|| format!("Error reading file '{}'", input))
    }
}

fn compile_source(source: &str, config: &Config) -> Result<Vec<NoteTrack>> {
    let tracks = compile_with_options(source, &config.options).context("Compilation error")?;
    if config.validate {
        validate(&tracks).context("Validation failed")?;
    }
    Ok(tracks)
}

fn format_tracks(tracks: &[NoteTrack]) -> String {
    let mut out = String::new();
    for (index, track) in tracks.iter().enumerate() {
        out.push_str(&format!(
            "track {} ({} events, ends at {:.3}s)\n",
            index,
            track.len(),
            track.end_time()
        ));
        for event in track.events() {
            let name = note_name(event.pitch_code).unwrap_or_else(|| "?".to_string());
            out.push_str(&format!(
                "  {:>8.3}  play {:>6.3}  hold {:>6.3}  {:>4} {:<4} vol {:.2}\n",
                event.start_time,
                event.play_duration,
                event.scheduled_duration,
                event.pitch_code,
                name,
                event.volume
            ));
        }
    }
    out
}
