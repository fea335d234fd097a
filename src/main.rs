use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use termcolor::ColorChoice;
use tracing::Level;

use midi_flipper::general::check;
use midi_flipper::io::{flip_file, output};
use midi_flipper::Config;

/// Mirror every note of a MIDI file upside down
#[derive(Parser)]
#[command(name = "midi-flipper")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// MIDI file to flip
    input: PathBuf,

    /// Destination file (default: "<input> (flipped).mid" next to the input)
    output: Option<PathBuf>,

    /// Move each channel back by whole octaves so it stays in its register
    #[arg(short, long, alias = "preserveOctaves")]
    preserve_octaves: bool,

    /// JSON configuration file (default: ./midi-flipper.json if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log debug details to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// Older scripts spell the flag `-preserveOctaves`. clap reads a single dash
/// as a cluster of short flags, so that spelling is rewritten first.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    let mut positional_only = false;
    args.into_iter()
        .map(|arg| {
            let arg: OsString = arg.into();
            if arg == "--" {
                positional_only = true;
            }
            if !positional_only && arg == "-preserveOctaves" {
                OsString::from("--preserve-octaves")
            } else {
                arg
            }
        })
        .collect()
}

/// Errors follow the configured colour mode once a config has loaded.
fn error_choice(config: Option<&Config>) -> ColorChoice {
    config.map_or(ColorChoice::Auto, |config| config.color.choice())
}

fn main() -> ExitCode {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            check::print_error(error_choice(None), &err.to_string());
            return ExitCode::FAILURE;
        }
    };
    let color = error_choice(Some(&config));
    match run(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            check::print_error(color, &format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, mut config: Config) -> Result<()> {
    if cli.preserve_octaves {
        config.preserve_octaves = true;
    }
    let level = if cli.verbose { Level::DEBUG } else { config.level()? };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let color = config.color.choice();
    check::print_info(color, &format!("Input file: {}", cli.input.display()));
    let output_path = match cli.output {
        Some(path) => {
            check::print_info(color, &format!("Output file: {}", path.display()));
            path
        }
        None => {
            let path = output::derive_output_path(&cli.input, config.preserve_octaves);
            check::print_info(
                color,
                &format!("Output file not specified; will output at: {}", path.display()),
            );
            path
        }
    };

    let report = flip_file(&cli.input, &output_path, config.preserve_octaves)?;
    for track in &report.tracks {
        check::print_track_report(color, track);
    }
    check::print_finished(color, &output_path.display().to_string());
    Ok(())
}
