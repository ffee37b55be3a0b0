//! Runtime for the `shutter` CLI.
//!
//! Resolves configuration (defaults, then `SHUTTER_*` environment
//! variables, then flags), initialises telemetry, opens a device session,
//! and executes the requested operation. All user-facing output goes to the
//! writer handed in by the binary so the runtime stays testable.

mod cli;
mod errors;
mod telemetry;

use std::fs;
use std::io::Write;
use std::time::Duration;

use camino::Utf8PathBuf;

use shutter_config::Config;
use shutter_protocol::{CaptureRequest, OutputSurface};
use shutter_session::{CaptureResult, ConvergenceRequest, ConvergenceResult, Session};

pub use cli::{CaptureArgs, Cli, Command, ConvergeArgs};
pub use errors::AppError;
pub use telemetry::TelemetryError;

/// Executes one CLI invocation end to end.
///
/// # Errors
///
/// Returns [`AppError`] for configuration, transport, protocol, and output
/// failures; the binary renders it on stderr and exits non-zero.
pub fn run<W>(cli: Cli, stdout: &mut W) -> Result<(), AppError>
where
    W: Write,
{
    let config = resolve_config(&cli)?;
    telemetry::initialise(&config)?;
    let mut session = Session::from_config(&config)?;
    match cli.command {
        Command::Properties => run_properties(&mut session, stdout),
        Command::Capture(args) => run_capture(&mut session, &args, stdout),
        Command::Converge(args) => run_converge(&mut session, &args, stdout),
    }
}

fn resolve_config(cli: &Cli) -> Result<Config, AppError> {
    let mut config = Config::from_env()?;
    if let Some(value) = &cli.endpoint {
        config.endpoint = value.parse().map_err(|source| AppError::InvalidEndpoint {
            value: value.clone(),
            source,
        })?;
    }
    if let Some(secs) = cli.timeout_secs {
        config.io_timeout = Duration::from_secs(secs);
    }
    if let Some(filter) = &cli.log_filter {
        config.log_filter = filter.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    Ok(config)
}

fn run_properties<W>(session: &mut Session, stdout: &mut W) -> Result<(), AppError>
where
    W: Write,
{
    let properties = session.camera_properties()?;
    let rendered =
        serde_json::to_string_pretty(&properties).map_err(AppError::SerialiseOutput)?;
    writeln!(stdout, "{rendered}").map_err(AppError::RenderOutput)
}

fn run_capture<W>(session: &mut Session, args: &CaptureArgs, stdout: &mut W) -> Result<(), AppError>
where
    W: Write,
{
    let surface = build_surface(args)?;
    let mut request = CaptureRequest::new();
    if let Some(exposure_ns) = args.exposure_ns {
        request = request.with_exposure_ns(exposure_ns);
    }
    if let Some(sensitivity) = args.sensitivity {
        request = request.with_sensitivity(sensitivity);
    }
    let requests = vec![request; args.count];
    let results = session.capture_burst(&requests, surface.as_ref())?;

    fs::create_dir_all(&args.out_dir).map_err(|source| AppError::CreateOutputDir {
        path: args.out_dir.clone(),
        source,
    })?;
    for (index, result) in results.iter().enumerate() {
        let image_path = write_shot(&args.out_dir, index, result)?;
        writeln!(
            stdout,
            "wrote {image_path} ({}x{}, {} bytes, {})",
            result.width,
            result.height,
            result.data.len(),
            result.format
        )
        .map_err(AppError::RenderOutput)?;
    }
    Ok(())
}

fn build_surface(args: &CaptureArgs) -> Result<Option<OutputSurface>, AppError> {
    match (args.width, args.height, args.format) {
        (Some(width), Some(height), Some(format)) => Ok(Some(OutputSurface {
            width,
            height,
            format,
        })),
        (None, None, None) => Ok(None),
        _ => Err(AppError::PartialSurface),
    }
}

fn write_shot(
    out_dir: &Utf8PathBuf,
    index: usize,
    result: &CaptureResult,
) -> Result<Utf8PathBuf, AppError> {
    let image_path = out_dir.join(format!("shot_{index:03}.{}", result.format.file_extension()));
    fs::write(&image_path, &result.data).map_err(|source| AppError::WriteFile {
        path: image_path.clone(),
        source,
    })?;

    let metadata_path = out_dir.join(format!("shot_{index:03}.json"));
    let metadata =
        serde_json::to_vec_pretty(&result.metadata).map_err(AppError::SerialiseOutput)?;
    fs::write(&metadata_path, metadata).map_err(|source| AppError::WriteFile {
        path: metadata_path,
        source,
    })?;
    Ok(image_path)
}

fn run_converge<W>(
    session: &mut Session,
    args: &ConvergeArgs,
    stdout: &mut W,
) -> Result<(), AppError>
where
    W: Write,
{
    let request = ConvergenceRequest {
        run_ae: !args.skip_ae,
        run_awb: !args.skip_awb,
        run_af: !args.skip_af,
        ..ConvergenceRequest::default()
    };
    let result = session.run_auto_convergence(&request)?;
    render_convergence(&result, stdout).map_err(AppError::RenderOutput)
}

fn render_convergence<W>(result: &ConvergenceResult, stdout: &mut W) -> std::io::Result<()>
where
    W: Write,
{
    if let Some(ae) = result.ae {
        writeln!(
            stdout,
            "AE: sensitivity {}, exposure {} ns",
            ae.sensitivity, ae.exposure_ns
        )?;
    }
    if let Some(awb) = &result.awb {
        writeln!(
            stdout,
            "AWB: gains [{}], transform [{}]",
            join_floats(&awb.gains),
            join_floats(&awb.transform)
        )?;
    }
    if let Some(af) = result.af {
        writeln!(stdout, "AF: focus distance {}", af.focus_distance)?;
    }
    Ok(())
}

fn join_floats(values: &[f64]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
