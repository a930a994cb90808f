use std::io;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use combridge_core::{Bridge, BridgeExit, BridgeOptions, Device, LineSettings, NonBlockingStdin};
use log::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Status for every fatal condition, the historical `exit(-1)`.
const FAILURE_STATUS: u8 = 255;

const PORT_FORMAT: &str = "<PORT> has the format '/dev/ttyX', e.g. /dev/ttyS0 or /dev/ttyUSB0";

/// Relays bytes between a serial device and standard input/output.
///
/// After the device is configured a single handshake byte is written to
/// stdout; everything after it is raw device data. Options go before
/// `<PORT>`: the line parameters take any token, including ones starting
/// with `-`, so the translator can reject them itself.
#[derive(Parser, Debug)]
#[command(name = "combridge", disable_help_flag = true, disable_version_flag = true)]
struct Args {
    /// Serial device path
    port: String,
    /// Baud rate, 50 through 115200
    #[arg(allow_hyphen_values = true)]
    rate: String,
    /// Parity: E, O or N
    #[arg(allow_hyphen_values = true)]
    parity: String,
    /// Data bits: 5, 6, 7 or 8
    #[arg(allow_hyphen_values = true)]
    databits: String,
    /// Stop bits: 1 or 2
    #[arg(allow_hyphen_values = true)]
    stopbits: String,

    /// Longest wait for device data per loop iteration
    #[arg(long, default_value_t = 1)]
    poll_timeout_ms: u64,

    /// Most bytes forwarded per direction per loop iteration
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    chunk_size: u16,

    /// Keep relaying device data after stdin reaches end of file
    #[arg(long)]
    keep_open_on_eof: bool,

    /// Log more to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            eprint!("{}", e.render());
            eprintln!("{PORT_FORMAT}");
            return ExitCode::from(FAILURE_STATUS);
        }
    };

    init_logging(args.verbose);

    match run(&args) {
        Ok(exit) => {
            info!("exiting after {exit:?}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("combridge: {e:#}");
            ExitCode::from(FAILURE_STATUS)
        }
    }
}

fn run(args: &Args) -> Result<BridgeExit> {
    let settings = LineSettings::parse(&args.rate, &args.parity, &args.databits, &args.stopbits)?;
    let device = Device::open(&args.port, settings)?;

    let options = BridgeOptions {
        poll_timeout: Duration::from_millis(args.poll_timeout_ms),
        chunk_size: usize::from(args.chunk_size),
        stop_on_console_eof: !args.keep_open_on_eof,
    };
    let input = NonBlockingStdin::new().context("making stdin non-blocking")?;
    let mut bridge = Bridge::new(device, input, io::stdout().lock(), options);
    bridge.handshake().context("sending handshake")?;

    // Nothing in-process asks the loop to stop; termination comes from outside.
    let stop = crossbeam_channel::never();
    Ok(bridge.run(&stop)?)
}

/// Logs go to stderr only; stdout carries the device stream.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "combridge=warn,combridge_core=warn",
        1 => "combridge=info,combridge_core=info",
        2 => "combridge=debug,combridge_core=debug",
        _ => "combridge=trace,combridge_core=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}
