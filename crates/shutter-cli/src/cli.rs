//! CLI argument definitions for the shutter host tool.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

use shutter_config::LogFormat;
use shutter_protocol::ImageFormat;

/// Command-line interface for driving a device control session.
#[derive(Parser, Debug)]
#[command(name = "shutter", version, about = "Control session for a remote imaging device")]
pub struct Cli {
    /// Device endpoint (`tcp://host:port` or `unix:///path`).
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,
    /// Per-operation socket timeout in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub timeout_secs: Option<u64>,
    /// Tracing filter expression (for example `shutter=debug`).
    #[arg(long, value_name = "FILTER")]
    pub log_filter: Option<String>,
    /// Log output format.
    #[arg(long, value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,
    /// Operation to run against the device.
    #[command(subcommand)]
    pub command: Command,
}

/// Operations exposed by the CLI.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Queries the camera properties object and prints it as JSON.
    Properties,
    /// Captures one or more shots and writes the raw buffers to disk.
    Capture(CaptureArgs),
    /// Runs the device 3A loop and prints the converged values.
    Converge(ConvergeArgs),
}

/// Arguments for the capture operation.
#[derive(Args, Debug)]
pub struct CaptureArgs {
    /// Number of shots in the burst.
    #[arg(long, default_value_t = 1)]
    pub count: usize,
    /// Manual exposure time in nanoseconds.
    #[arg(long, value_name = "NANOSECONDS")]
    pub exposure_ns: Option<i64>,
    /// Manual sensitivity (ISO).
    #[arg(long, value_name = "ISO")]
    pub sensitivity: Option<i32>,
    /// Output surface width in pixels.
    #[arg(long, value_name = "PIXELS")]
    pub width: Option<u32>,
    /// Output surface height in pixels.
    #[arg(long, value_name = "PIXELS")]
    pub height: Option<u32>,
    /// Output surface format (`yuv` or `jpeg`).
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<ImageFormat>,
    /// Directory receiving the captured buffers.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: Utf8PathBuf,
}

/// Arguments for the convergence operation.
#[derive(Args, Debug)]
pub struct ConvergeArgs {
    /// Leave auto-exposure out of the run.
    #[arg(long)]
    pub skip_ae: bool,
    /// Leave auto-white-balance out of the run.
    #[arg(long)]
    pub skip_awb: bool,
    /// Leave auto-focus out of the run.
    #[arg(long)]
    pub skip_af: bool,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn capture_defaults_to_a_single_shot() {
        let cli = Cli::try_parse_from(["shutter", "capture"]).expect("parse capture");
        let Command::Capture(args) = cli.command else {
            panic!("expected capture subcommand");
        };
        assert_eq!(args.count, 1);
        assert!(args.format.is_none());
    }

    #[test]
    fn converge_parses_skip_flags() {
        let cli = Cli::try_parse_from(["shutter", "converge", "--skip-awb"])
            .expect("parse converge");
        let Command::Converge(args) = cli.command else {
            panic!("expected converge subcommand");
        };
        assert!(!args.skip_ae);
        assert!(args.skip_awb);
    }
}
