mod cli;
mod error_fmt;
mod replay;
mod session;

use std::path::Path;

use clap::Parser;
use eyre::{Result, WrapErr};
use pressmon_config::{BackendKind, Config, Logging};
use pressmon_core::runner::Control;
use pressmon_core::{SessionEvent, SessionReport};
use serde_json::json;

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::session::{DetectOpts, DetectOutcome};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error reporter: {e}");
    }

    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::ListPorts = cli.cmd {
        init_tracing(cli.json, &cli.log_level, &Logging::default());
        return list_ports(cli.json);
    }

    let mut cfg = load_config(&cli.config)?;
    init_tracing(cli.json, &cli.log_level, &cfg.logging);
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match cli.cmd {
        Commands::Detect {
            duration,
            threshold,
            zero,
        } => {
            let opts = DetectOpts {
                duration,
                threshold,
                zero,
            };
            session::apply_overrides(&mut cfg, &opts);
            cfg.validate().wrap_err("invalid configuration")?;
            detect(&cfg, &opts, cli.json)
        }
        Commands::Calibrate { save } => {
            let baseline = session::run_calibrate(&cfg, save.as_deref())?;
            if cli.json {
                let saved = save.as_ref().map(|p| p.display().to_string());
                println!("{}", json!({ "baseline": baseline, "saved": saved }));
            } else {
                println!("Calibration complete.");
                for (i, b) in baseline.iter().enumerate() {
                    println!("  Channel {}: {b:.3}", i + 1);
                }
                if let Some(p) = &save {
                    println!("Baseline saved to {}", p.display());
                }
            }
            Ok(())
        }
        Commands::SelfCheck => {
            let check = session::self_check(&cfg)?;
            if cli.json {
                println!(
                    "{}",
                    json!({
                        "ok": true,
                        "backend": check.backend,
                        "requested": check.requested,
                        "readings": check.readings,
                    })
                );
            } else {
                println!(
                    "self-check ok: {} backend, {}/{} readings",
                    check.backend, check.readings, check.requested
                );
            }
            Ok(())
        }
        Commands::ListPorts => list_ports(cli.json),
    }
}

fn load_config(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = pressmon_config::load_toml(&text).wrap_err("invalid configuration")?;
    cfg.validate().wrap_err("invalid configuration")?;
    Ok(cfg)
}

fn init_tracing(json: bool, level: &str, logging: &Logging) {
    use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if json {
        layers.push(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    } else {
        layers.push(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    }

    if let Some(file) = &logging.file {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "pressmon.log".into(), |n| n.to_string_lossy().into_owned());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let file_level = logging.level.as_deref().unwrap_or("info");
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new(file_level))
                .boxed(),
        );
    }

    let _ = tracing_subscriber::registry().with(layers).try_init();
}

fn backend_name(kind: BackendKind) -> &'static str {
    match kind {
        BackendKind::Serial => "serial",
        BackendKind::Camera => "camera",
    }
}

fn event_json(ev: &SessionEvent) -> serde_json::Value {
    match ev {
        SessionEvent::Calibrated { baseline } => json!({ "event": "calibrated", "baseline": baseline }),
        SessionEvent::Started { duration_seconds } => {
            json!({ "event": "started", "duration_seconds": duration_seconds })
        }
        SessionEvent::Settling { delay } => {
            json!({ "event": "settling", "delay_seconds": delay.as_secs() })
        }
        SessionEvent::RecordingBegan => json!({ "event": "recording" }),
        SessionEvent::Recorded { second, values } => {
            json!({ "event": "recorded", "second": second, "values": values })
        }
        SessionEvent::NoData { remaining, reason } => {
            json!({ "event": "no_data", "remaining": remaining, "reason": reason.to_string() })
        }
        SessionEvent::Finished(report) => json!({
            "event": "finished",
            "recorded_seconds": report.recorded_seconds,
            "passed": report.passed(),
        }),
        SessionEvent::Aborted => json!({ "event": "aborted" }),
    }
}

fn report_json(cfg: &Config, report: &SessionReport, outcome: &DetectOutcome) -> serde_json::Value {
    let channels: Vec<_> = report
        .channels
        .iter()
        .map(|c| {
            json!({
                "channel": c.channel,
                "initial": c.initial,
                "last": c.last,
                "delta": c.delta,
                "verdict": c.verdict.as_str(),
            })
        })
        .collect();
    json!({
        "timestamp": chrono::Utc::now().timestamp(),
        "backend": backend_name(cfg.backend.kind),
        "recorded_seconds": report.recorded_seconds,
        "threshold": report.threshold,
        "stopped_early": report.stopped_early,
        "passed": report.passed(),
        "channels": channels,
        "baseline": outcome.baseline,
        "record": outcome.record.as_ref().map(|p| p.display().to_string()),
    })
}

fn detect(cfg: &Config, opts: &DetectOpts, json_mode: bool) -> Result<()> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    ctrlc::set_handler(move || {
        let _ = tx.try_send(Control::Stop);
    })
    .wrap_err("install Ctrl-C handler")?;

    let outcome = session::run_detect(cfg, opts, &rx, |ev| {
        if json_mode {
            println!("{}", event_json(ev));
        } else if !matches!(ev, SessionEvent::Finished(_)) {
            println!("{ev}");
        }
    })?;

    let report = &outcome.report;
    if json_mode {
        println!("{}", report_json(cfg, report, &outcome));
        return Ok(());
    }
    println!(
        "Detection finished after {}s{} (threshold {:.2})",
        report.recorded_seconds,
        if report.stopped_early { ", stopped early" } else { "" },
        report.threshold
    );
    for c in &report.channels {
        println!(
            "  Channel {}: initial {:.2}  last {:.2}  delta {:+.2}  {}",
            c.channel,
            c.initial,
            c.last,
            c.delta,
            c.verdict.as_str().to_uppercase()
        );
    }
    println!("Result: {}", if report.passed() { "PASS" } else { "FAIL" });
    if let Some(p) = &outcome.record {
        println!("Record: {}", p.display());
    }
    Ok(())
}

#[cfg(feature = "hardware")]
fn list_ports(json_mode: bool) -> Result<()> {
    let ports = pressmon_hardware::serial::list_ports().wrap_err("enumerate serial ports")?;
    if json_mode {
        println!("{}", json!({ "ports": ports }));
    } else if ports.is_empty() {
        println!("No serial ports found.");
    } else {
        for p in &ports {
            println!("{p}");
        }
    }
    Ok(())
}

#[cfg(not(feature = "hardware"))]
fn list_ports(json_mode: bool) -> Result<()> {
    if json_mode {
        println!("{}", json!({ "ports": [], "hardware": false }));
    } else {
        println!("Serial support is not compiled in; rebuild with `--features hardware`.");
    }
    Ok(())
}
