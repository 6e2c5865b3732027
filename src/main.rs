//! `staccato` command line: play, dump and inspect Staccato notation.

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{error, info, warn, LevelFilter};

use staccato::midi::{MidiInputReceiver, MidirSink};
use staccato::parser::ParserConfig;
use staccato::realtime::RealtimePlayer;
use staccato::sequence::materialize;
use staccato::{Result, StaccatoConfig, StaccatoParser};

#[derive(Parser, Debug)]
#[command(name = "staccato")]
#[command(about = "Parse and play Staccato music notation", long_about = None)]
struct Cli {
    /// Fail on fragments no parser recognizes instead of skipping them
    #[arg(long, global = true)]
    strict: bool,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play notation on a MIDI output device
    Play {
        notation: String,
        /// Output device (substring of the port name)
        #[arg(short, long)]
        device: Option<String>,
        /// Starting tempo in beats per minute
        #[arg(short, long)]
        tempo: Option<u32>,
        /// Input device whose notes are echoed to the output
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Print the sequenced events, one per line
    Dump { notation: String },
    /// Print the preprocessed tokens and their kinds
    Tokens { notation: String },
    /// List MIDI devices
    Devices,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = StaccatoConfig::load().unwrap_or_default();
    if let Err(e) = config.validate() {
        warn!("ignoring config file: {e}");
        config = StaccatoConfig::default();
    }
    config.parser.strict |= cli.strict;

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("staccato: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &StaccatoConfig) -> Result<()> {
    let parser_config = ParserConfig::from_settings(config.parser.clone());
    match command {
        Command::Play {
            notation,
            device,
            tempo,
            input,
        } => {
            let device = device.or_else(|| config.player.device_name.clone());
            let input = input.or_else(|| config.player.input_device.clone());
            let tempo = tempo.unwrap_or(config.player.tempo);
            play(&notation, device.as_deref(), input.as_deref(), tempo, config, parser_config)
        }
        Command::Dump { notation } => {
            let mut parser = StaccatoParser::with_config(parser_config);
            let sequence = materialize(&mut parser, &notation, config.player.resolution)?;
            print!("{sequence}");
            Ok(())
        }
        Command::Tokens { notation } => {
            let mut parser = StaccatoParser::with_config(parser_config);
            for token in parser.tokens(&notation)? {
                println!("{:<16} {:?}", token.text(), token.kind());
            }
            Ok(())
        }
        Command::Devices => {
            println!("Outputs:");
            for name in MidirSink::list_devices() {
                println!("  {name}");
            }
            println!("Inputs:");
            for name in MidiInputReceiver::list_devices() {
                println!("  {name}");
            }
            Ok(())
        }
    }
}

fn play(
    notation: &str,
    device: Option<&str>,
    input: Option<&str>,
    tempo: u32,
    config: &StaccatoConfig,
    parser_config: ParserConfig,
) -> Result<()> {
    let sink = MidirSink::connect(device)?;
    info!("playing on {}", sink.port_name());
    let mut input = input
        .map(|name| MidiInputReceiver::start(Some(name), config.player.channel_filter))
        .transpose()?;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_clone = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || stop_clone.store(true, Ordering::Relaxed)) {
        warn!("could not install Ctrl-C handler: {e}");
    }

    let mut player = RealtimePlayer::with_config(sink, parser_config);
    player.play(&format!("T{tempo} {notation}"))?;

    // With an input attached, keep echoing until interrupted.
    while !stop.load(Ordering::Relaxed) && (input.is_some() || !player.is_finished()) {
        if let Some(receiver) = input.as_mut() {
            receiver.drain_into(player.parser().bus());
        }
        thread::sleep(Duration::from_millis(5));
    }
    player.close();
    Ok(())
}
