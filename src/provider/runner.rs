use crate::provider::invocation::build_invocation;
use crate::provider::{
    AgentRegistry, InvocationLog, ProviderDescriptor, ProviderError, ProviderResult,
};
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::io::{BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// Ceiling for a single agent round-trip.
pub const DEFAULT_AGENT_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// One provider bound to a launch recipe. Each `execute` is exactly one
/// process launch; nothing is retried.
#[derive(Debug, Clone)]
pub struct AgentInvoker {
    name: String,
    descriptor: ProviderDescriptor,
    timeout: Duration,
}

impl AgentInvoker {
    pub fn new(name: &str, descriptor: ProviderDescriptor) -> Self {
        Self {
            name: name.to_string(),
            descriptor,
            timeout: DEFAULT_AGENT_TIMEOUT,
        }
    }

    pub fn from_registry(registry: &AgentRegistry, name: &str) -> Result<Self, ProviderError> {
        let descriptor = registry
            .lookup(name)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider(name.to_string()))?;
        Ok(Self::new(name, descriptor))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn execute(&self, prompt: &str) -> Result<String, ProviderError> {
        self.invoke(prompt).map(|result| result.message)
    }

    /// Runs the agent once. Output is buffered in full (no cap), so a runaway
    /// agent can grow memory until the timeout fires.
    pub fn invoke(&self, prompt: &str) -> Result<ProviderResult, ProviderError> {
        let spec = build_invocation(&self.descriptor, prompt);
        let base_log = InvocationLog {
            provider: self.name.clone(),
            command_form: spec.command_form(),
            exit_code: None,
            timed_out: false,
        };

        let mut child = Command::new(&spec.command)
            .args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProviderError::SpawnFailed {
                provider: self.name.clone(),
                command: spec.command.clone(),
                source,
            })?;

        // The prompt travels as an argument; closing stdin gives agents that
        // probe it an immediate EOF.
        drop(child.stdin.take());

        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let start = Instant::now();
        let exit_status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if start.elapsed() >= self.timeout {
                        let _ = child.kill();
                        let status = child.wait().ok();
                        return Err(self.timed_out(base_log, status.and_then(|s| s.code())));
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ProviderError::Io {
                        path: spec.command.clone(),
                        source: err,
                    });
                }
            }
        };

        // The deadline also covers draining output: a background process left
        // behind by the agent keeps the pipes open after it exits.
        let deadline = start + self.timeout;
        let (Some(stdout), Some(stderr)) = (
            collect_output(stdout_reader, deadline),
            collect_output(stderr_reader, deadline),
        ) else {
            return Err(self.timed_out(base_log, exit_status.code()));
        };

        let mut log = base_log;
        log.exit_code = exit_status.code();
        if !exit_status.success() {
            return Err(ProviderError::NonZeroExit {
                provider: self.name.clone(),
                exit_code: exit_status.code().unwrap_or(-1),
                stderr,
                log: Box::new(log),
            });
        }

        Ok(ProviderResult {
            message: self.descriptor.response.extract(&stdout),
            log,
        })
    }

    /// Readers still running are detached and their partial output dropped.
    fn timed_out(&self, mut log: InvocationLog, exit_code: Option<i32>) -> ProviderError {
        log.timed_out = true;
        log.exit_code = exit_code;
        ProviderError::Timeout {
            provider: self.name.clone(),
            timeout_ms: self.timeout.as_millis() as u64,
            log: Box::new(log),
        }
    }
}

fn spawn_reader(pipe: impl Read + Send + 'static) -> Receiver<String> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = String::new();
        let _ = BufReader::new(pipe).read_to_string(&mut buf);
        let _ = sender.send(buf);
    });
    receiver
}

/// `None` when the pipe is still open at `deadline`.
fn collect_output(reader: Option<Receiver<String>>, deadline: Instant) -> Option<String> {
    let Some(reader) = reader else {
        return Some(String::new());
    };
    match reader.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(buf) => Some(buf),
        Err(RecvTimeoutError::Disconnected) => Some(String::new()),
        Err(RecvTimeoutError::Timeout) => None,
    }
}

/// Checks that the provider's command resolves on this host without running
/// it. Unknown providers and lookup failures report `false`.
pub fn probe_available(registry: &AgentRegistry, name: &str) -> bool {
    registry
        .lookup(name)
        .map(|descriptor| is_command_available(&descriptor.command))
        .unwrap_or(false)
}

/// Probes every registered provider in listing order.
pub fn detect_all_available(registry: &AgentRegistry) -> Vec<String> {
    registry
        .names()
        .into_iter()
        .filter(|name| probe_available(registry, name))
        .map(str::to_string)
        .collect()
}

pub fn is_command_available(command: &str) -> bool {
    if command.trim().is_empty() {
        return false;
    }
    let explicit = Path::new(command);
    if explicit.components().count() > 1 || explicit.is_absolute() {
        return is_executable_file(explicit);
    }

    let Some(path) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path).any(|dir| {
        if is_executable_file(&dir.join(command)) {
            return true;
        }
        #[cfg(windows)]
        {
            if is_executable_file(&dir.join(format!("{command}.exe"))) {
                return true;
            }
        }
        false
    })
}

fn is_executable_file(path: &Path) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_missing_commands_are_unavailable() {
        assert!(!is_command_available(""));
        assert!(!is_command_available("   "));
        assert!(!is_command_available("/definitely/not/here/agent-cli"));
    }

    #[test]
    fn unknown_provider_cannot_build_an_invoker() {
        let registry = AgentRegistry::in_memory();
        let err = AgentInvoker::from_registry(&registry, "nope").expect_err("unknown");
        assert!(matches!(err, ProviderError::UnknownProvider(name) if name == "nope"));
        assert!(!probe_available(&registry, "nope"));
    }

    #[test]
    fn invokers_default_to_the_thirty_second_ceiling() {
        let registry = AgentRegistry::in_memory();
        let invoker = AgentInvoker::from_registry(&registry, "claude").expect("claude");
        assert_eq!(invoker.timeout(), Duration::from_secs(30));
        assert_eq!(invoker.name(), "claude");
        assert_eq!(invoker.descriptor().command, "claude");
    }
}
