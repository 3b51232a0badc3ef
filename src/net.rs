use crate::config::ScanConfig;
use crate::constants::LAST_HOST_OCTET;
use async_trait::async_trait;
use std::io;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio::time::timeout;

/// Out-of-process liveness probes
pub mod probe {
    use super::*;

    /// A probe that has been started and can be awaited or killed
    #[async_trait]
    pub trait RunningProbe: Send {
        /// Wait for the probe to finish; `true` means the target answered
        async fn wait(&mut self) -> io::Result<bool>;

        /// Forcibly stop the probe
        async fn kill(&mut self) -> io::Result<()>;
    }

    /// Something that can start one liveness probe against an address
    pub trait ProbeLauncher: Send + Sync {
        fn launch(&self, address: &str) -> io::Result<Box<dyn RunningProbe>>;

        /// Return a human-readable name for this probe facility
        fn name(&self) -> &'static str;
    }

    /// Runs the configured ping program once per address
    #[derive(Debug, Clone)]
    pub struct PingLauncher {
        program: String,
        args: Vec<String>,
    }

    impl PingLauncher {
        pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
            Self {
                program: program.into(),
                args,
            }
        }

        pub fn from_config(config: &ScanConfig) -> Self {
            Self::new(config.probe_program.clone(), config.probe_args.clone())
        }
    }

    impl ProbeLauncher for PingLauncher {
        fn launch(&self, address: &str) -> io::Result<Box<dyn RunningProbe>> {
            let child = Command::new(&self.program)
                .args(&self.args)
                .arg(address)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn()?;
            Ok(Box::new(ChildProbe { child }))
        }

        fn name(&self) -> &'static str {
            "external ping subprocess"
        }
    }

    /// A spawned probe process
    pub struct ChildProbe {
        child: Child,
    }

    #[async_trait]
    impl RunningProbe for ChildProbe {
        async fn wait(&mut self) -> io::Result<bool> {
            Ok(self.child.wait().await?.success())
        }

        async fn kill(&mut self) -> io::Result<()> {
            // Sends SIGKILL and reaps the process
            self.child.kill().await
        }
    }

    /// Run the ping program against a single address and capture its output.
    ///
    /// Used for the per-device check, which sends several echo requests and
    /// relies on the program's own timeout.
    pub async fn ping_with_output(program: &str, count: &str, address: &str) -> io::Result<(bool, String)> {
        let output = Command::new(program)
            .args(["-c", count, address])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok((output.status.success(), text))
    }
}

/// Bounded-concurrency sweep of a /24
pub mod scan {
    use super::probe::{PingLauncher, ProbeLauncher};
    use super::*;

    /// Probes every host of a subnet and reports which ones answered
    #[derive(Clone)]
    pub struct LivenessScanner {
        launcher: Arc<dyn ProbeLauncher>,
        max_concurrent: usize,
        deadline: Duration,
    }

    impl LivenessScanner {
        /// Scanner using the configured ping program
        pub fn new(config: &ScanConfig) -> Self {
            Self::with_launcher(config, Arc::new(PingLauncher::from_config(config)))
        }

        pub fn with_launcher(config: &ScanConfig, launcher: Arc<dyn ProbeLauncher>) -> Self {
            Self {
                launcher,
                max_concurrent: config.max_concurrent_probes.max(1),
                deadline: config.probe_timeout(),
            }
        }

        /// Sweep hosts 1 through 254 of `subnet` (three dotted octets).
        ///
        /// One task is spawned per address; at most `max_concurrent` of them
        /// hold a probe at any time. Each probe races the deadline and is
        /// killed when it loses. Returns once every task has finished, with
        /// the responding addresses in no particular order. Never fails:
        /// probes that cannot start, fail or time out are simply absent.
        pub async fn scan_subnet(&self, subnet: &str) -> Vec<String> {
            let gate = Arc::new(Semaphore::new(self.max_concurrent));
            let active = Arc::new(Mutex::new(Vec::new()));
            let mut tasks = JoinSet::new();

            tracing::info!(
                subnet = %subnet,
                probe = self.launcher.name(),
                max_concurrent = self.max_concurrent,
                deadline_ms = self.deadline.as_millis() as u64,
                "Starting liveness sweep"
            );

            for octet in 1..=LAST_HOST_OCTET {
                let address = format!("{}.{}", subnet, octet);
                let gate = gate.clone();
                let active = active.clone();
                let launcher = self.launcher.clone();
                let deadline = self.deadline;

                tasks.spawn(async move {
                    // The gate is never closed, so acquisition only fails if
                    // that invariant is broken; skip the address in that case.
                    let Ok(_permit) = gate.acquire_owned().await else {
                        return;
                    };
                    if probe_once(launcher.as_ref(), &address, deadline).await {
                        active.lock().await.push(address);
                    }
                });
            }

            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    tracing::warn!(error = %e, "Probe task ended abnormally");
                }
            }

            let active = std::mem::take(&mut *active.lock().await);
            tracing::info!(subnet = %subnet, responding = active.len(), "Liveness sweep finished");
            active
        }
    }

    /// Run one probe under `deadline`. `true` only when it finished in time
    /// and reported success.
    pub async fn probe_once(launcher: &dyn ProbeLauncher, address: &str, deadline: Duration) -> bool {
        let mut running = match launcher.launch(address) {
            Ok(running) => running,
            Err(e) => {
                tracing::debug!(address = %address, error = %e, "Probe failed to start");
                return false;
            }
        };

        let outcome = timeout(deadline, running.wait()).await;
        match outcome {
            Ok(Ok(answered)) => {
                tracing::debug!(address = %address, answered, "Probe finished");
                answered
            }
            Ok(Err(e)) => {
                tracing::debug!(address = %address, error = %e, "Probe wait failed");
                false
            }
            Err(_) => {
                if let Err(e) = running.kill().await {
                    tracing::warn!(address = %address, error = %e, "Failed to kill timed-out probe");
                }
                tracing::debug!(address = %address, "Probe timed out");
                false
            }
        }
    }
}
