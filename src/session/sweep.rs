//! Last-resort termination of renderer processes by command-line signature.
//!
//! Used only when termination through the process handle failed. The
//! signature is the unique profile directory of one renderer, so the sweep
//! never touches browsers owned by other workers on the same host.

use anyhow::{Context, Result};
use std::process::Command;
use tracing::{debug, info, warn};

/// Kill every process whose command line contains `signature`.
///
/// Returns the number of processes signalled. Finding nothing is not an error.
#[cfg(unix)]
pub fn sweep_by_signature(signature: &str) -> Result<usize> {
    if signature.trim().is_empty() {
        return Ok(0);
    }

    let output = Command::new("pgrep")
        .arg("-f")
        .arg(signature)
        .output()
        .context("Failed to run pgrep")?;

    // pgrep exits with 1 when nothing matches
    if !output.status.success() {
        debug!("No processes match signature {signature}");
        return Ok(0);
    }

    let own_pid = std::process::id();
    let pids: Vec<u32> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(|line| line.trim().parse().ok())
        .filter(|pid| *pid != own_pid)
        .collect();

    let mut killed = 0;
    for pid in pids {
        match Command::new("kill").arg("-KILL").arg(pid.to_string()).status() {
            Ok(status) if status.success() => {
                info!("Killed orphaned renderer process {pid}");
                killed += 1;
            }
            // Already gone between pgrep and kill
            Ok(_) => debug!("Process {pid} exited before it could be killed"),
            Err(e) => warn!("Failed to signal process {pid}: {e}"),
        }
    }

    Ok(killed)
}

#[cfg(not(unix))]
pub fn sweep_by_signature(signature: &str) -> Result<usize> {
    debug!("Signature sweep unsupported on this platform; skipping {signature}");
    Ok(0)
}
