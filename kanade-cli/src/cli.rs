//! CLI argument definitions for `kanade-cli`.

use clap::{Arg, ArgAction, Command};

/// Build the CLI argument parser and command definitions.
pub fn build_cli() -> Command {
    // Build the CLI definition in one place to keep main.rs slim.
    Command::new("Kanade Play")
        .version("0.2")
        .about("Play audio files across the Kanade track mixer")
        .arg_required_else_help(true)
        .arg(
            Arg::new("track")
                .long("track")
                .short('t')
                .value_name("INDEX")
                .action(ArgAction::Append)
                .help("Track slot (0-4) for the matching file; repeat once per file"),
        )
        .arg(
            Arg::new("loop")
                .long("loop")
                .short('l')
                .action(ArgAction::SetTrue)
                .help("Loop every file instead of playing it once"),
        )
        .arg(
            Arg::new("repeat")
                .long("repeat")
                .value_name("COUNT")
                .help("Play the loop region COUNT extra times, then stop (implies --loop)"),
        )
        .arg(
            Arg::new("loop-start")
                .long("loop-start")
                .value_name("FRAME")
                .default_value("0")
                .help("First frame of the loop region"),
        )
        .arg(
            Arg::new("loop-length")
                .long("loop-length")
                .value_name("FRAMES")
                .default_value("0")
                .help("Length of the loop region in frames, 0 for the rest of the stream"),
        )
        .arg(
            Arg::new("volume")
                .long("volume")
                .short('g')
                .value_name("VOL")
                .default_value("1.0")
                .help("Per-track volume (0.0-1.0)"),
        )
        .arg(
            Arg::new("master")
                .long("master")
                .value_name("VOL")
                .default_value("1.0")
                .help("Master volume applied on top of every track (0.0-1.0)"),
        )
        .arg(
            Arg::new("fade-to")
                .long("fade-to")
                .value_name("VOL")
                .help("Fade every started track toward this volume"),
        )
        .arg(
            Arg::new("fade-ms")
                .long("fade-ms")
                .value_name("MS")
                .default_value("1000")
                .help("Duration of the --fade-to ramp"),
        )
        .arg(
            Arg::new("settings")
                .long("settings")
                .value_name("PATH")
                .help("Path to a JSON file with output settings"),
        )
        .arg(
            Arg::new("per-voice")
                .long("per-voice")
                .action(ArgAction::SetTrue)
                .help("Give each track its own device voice instead of the software mix"),
        )
        .arg(
            Arg::new("max-secs")
                .long("max-secs")
                .value_name("SECONDS")
                .help("Stop after this many seconds even if tracks are still playing"),
        )
        .arg(
            Arg::new("silent")
                .long("silent")
                .action(ArgAction::SetTrue)
                .help("Run without opening an audio device"),
        )
        .arg(
            Arg::new("FILES")
                .help("Audio files to play, assigned to track slots in order")
                .required(false)
                .num_args(1..),
        )
        .subcommand(
            Command::new("probe")
                .about("Print a stream's loop tags as JSON")
                .arg(
                    Arg::new("INPUT")
                        .help("The input file path")
                        .required(true)
                        .index(1),
                ),
        )
}
