//! Startup helpers: reclaiming the listen port.
//!
//! A stale proxy left behind by a previous run keeps the port bound and makes
//! the next start fail. Before binding, the service can ask a
//! [`PortReclaimer`] to get rid of whatever holds the port. This is strictly
//! best effort: nothing found, nothing killed, or a missing `lsof` binary are
//! all logged and ignored.

use std::process::Command;

/// What a reclaim attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReclaimOutcome {
    /// Reclaiming is turned off or not applicable (port 0).
    Skipped,
    /// Nobody else held the port.
    NothingFound,
    /// These pids were sent SIGKILL.
    Killed(Vec<u32>),
    /// The attempt could not be carried out; startup continues anyway.
    Failed(String),
}

/// Frees a TCP port held by another process before the proxy binds it.
pub trait PortReclaimer: Send + Sync {
    fn reclaim(&self, port: u16) -> ReclaimOutcome;
}

/// Reclaimer that never touches other processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReclaimer;

impl PortReclaimer for NoopReclaimer {
    fn reclaim(&self, _port: u16) -> ReclaimOutcome {
        ReclaimOutcome::Skipped
    }
}

/// Finds holders with `lsof -ti:<port>` and kills them with `kill -9`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LsofReclaimer;

impl PortReclaimer for LsofReclaimer {
    fn reclaim(&self, port: u16) -> ReclaimOutcome {
        if port == 0 {
            return ReclaimOutcome::Skipped;
        }

        let output = match Command::new("lsof")
            .arg(format!("-ti:{}", port))
            .output()
        {
            Ok(output) => output,
            Err(e) => return ReclaimOutcome::Failed(format!("lsof unavailable: {}", e)),
        };

        // lsof exits 1 when nothing matches.
        let pids = holder_pids(&String::from_utf8_lossy(&output.stdout), std::process::id());
        if pids.is_empty() {
            return ReclaimOutcome::NothingFound;
        }

        let mut killed = Vec::with_capacity(pids.len());
        for pid in pids {
            match Command::new("kill").args(["-9", &pid.to_string()]).output() {
                Ok(out) if out.status.success() => killed.push(pid),
                Ok(out) => {
                    let stderr = String::from_utf8_lossy(&out.stderr);
                    tracing::debug!(pid, stderr = %stderr.trim(), "kill failed");
                }
                Err(e) => tracing::debug!(pid, error = %e, "kill failed"),
            }
        }

        if killed.is_empty() {
            ReclaimOutcome::Failed("no holder could be killed".to_string())
        } else {
            ReclaimOutcome::Killed(killed)
        }
    }
}

/// Parse `lsof -t` output into pids, leaving out our own process.
fn holder_pids(lsof_stdout: &str, own_pid: u32) -> Vec<u32> {
    let mut pids: Vec<u32> = lsof_stdout
        .lines()
        .filter_map(|line| line.trim().parse().ok())
        .filter(|pid| *pid != own_pid)
        .collect();
    pids.sort_unstable();
    pids.dedup();
    pids
}

/// Run the reclaimer and log what happened. Never fails.
pub fn reclaim_port(reclaimer: &dyn PortReclaimer, port: u16) -> ReclaimOutcome {
    tracing::info!(port, "Checking for existing processes on port");

    let outcome = reclaimer.reclaim(port);
    match &outcome {
        ReclaimOutcome::Skipped => tracing::debug!(port, "Port reclaim skipped"),
        ReclaimOutcome::NothingFound => {
            tracing::info!(port, "No existing process found on port")
        }
        ReclaimOutcome::Killed(pids) => {
            tracing::warn!(port, pids = ?pids, "Killed existing process on port")
        }
        ReclaimOutcome::Failed(reason) => {
            tracing::info!(port, reason = %reason, "Could not reclaim port, continuing")
        }
    }
    outcome
}
