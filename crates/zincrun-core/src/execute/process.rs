//! External compiler process.
//!
//! [`JavaCommand`] assembles the JVM command line; [`CompilerProcess`] owns
//! the spawned child. Output is read by one thread per stream and
//! handed to the calling thread over a channel, so diagnostics reach the host
//! while the compiler still runs. The call returns once the child has been
//! reaped and, unless it was killed, both streams reached EOF.

use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crate::error::{DriverError, Result};

use super::context::AbortHandle;

/// How often the abort flag is checked while the compiler is quiet.
const ABORT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A JVM invocation: `<java> <jvm options> -cp <classpath> <main> <args>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaCommand {
    /// Java launcher
    pub java: PathBuf,

    /// Options placed before the classpath (heap, system properties)
    pub jvm_options: Vec<String>,

    /// Classpath entries, already canonical
    pub classpath: Vec<String>,

    /// Main class to start
    pub main_class: String,

    /// Program arguments
    pub args: Vec<String>,
}

impl JavaCommand {
    /// Arguments following the launcher, in order.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = self.jvm_options.clone();
        if !self.classpath.is_empty() {
            argv.push("-cp".to_string());
            argv.push(self.classpath.join(crate::compile::path_list_separator()));
        }
        argv.push(self.main_class.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Build a [`Command`] for this invocation.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.java);
        cmd.args(self.argv());
        cmd
    }
}

/// Which output stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// One line of compiler output, without its line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: StreamKind,
    pub text: String,
}

/// A running compiler process.
///
/// Dropping the handle before the process was waited for kills it.
pub struct CompilerProcess {
    child: Child,
    program: PathBuf,
    reaped: bool,
}

impl CompilerProcess {
    /// Spawn the compiler with piped stdout/stderr.
    pub fn spawn(command: &JavaCommand) -> Result<Self> {
        let mut cmd = command.to_command();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|source| DriverError::Launch {
            program: command.java.clone(),
            source,
        })?;

        tracing::debug!("Spawned compiler process {} ({})", child.id(), command.java.display());

        Ok(Self {
            child,
            program: command.java.clone(),
            reaped: false,
        })
    }

    /// Get the process ID of the compiler.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Stream output to `on_line` until the process exits.
    ///
    /// If `abort` is triggered the process is killed and
    /// [`DriverError::Cancelled`] is returned once it has been reaped, even
    /// if a process it spawned still holds the output pipes open.
    pub fn wait_with_output(
        mut self,
        abort: &AbortHandle,
        mut on_line: impl FnMut(OutputLine),
    ) -> Result<ExitStatus> {
        let (tx, rx) = mpsc::channel::<OutputLine>();
        if let Some(stdout) = self.child.stdout.take() {
            let tx = tx.clone();
            thread::spawn(move || forward_lines(stdout, StreamKind::Stdout, tx));
        }
        if let Some(stderr) = self.child.stderr.take() {
            let tx = tx.clone();
            thread::spawn(move || forward_lines(stderr, StreamKind::Stderr, tx));
        }
        drop(tx);

        let mut killed = false;
        let mut exited = None;

        // Readers disconnect once both pipes reach EOF.
        loop {
            if !killed && abort.is_aborted() {
                self.kill();
                killed = true;
            }
            if killed {
                // Readers still blocked on inherited pipes are left behind.
                if let Some(status) = self.child.try_wait()? {
                    exited = Some(status);
                    break;
                }
            }
            match rx.recv_timeout(ABORT_POLL_INTERVAL) {
                Ok(line) => on_line(line),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let status = match exited {
            Some(status) => status,
            None => loop {
                if let Some(status) = self.child.try_wait()? {
                    break status;
                }
                if !killed && abort.is_aborted() {
                    self.kill();
                    killed = true;
                }
                thread::sleep(ABORT_POLL_INTERVAL);
            },
        };
        self.reaped = true;

        if killed {
            tracing::info!(
                "Compiler process {} ({}) killed on request",
                self.pid(),
                self.program.display()
            );
            return Err(DriverError::Cancelled);
        }

        tracing::debug!("Compiler process exited with {}", status);
        Ok(status)
    }

    fn kill(&mut self) {
        if let Err(e) = self.child.kill() {
            // InvalidInput means the process already exited.
            if e.kind() != std::io::ErrorKind::InvalidInput {
                tracing::warn!("Failed to kill compiler process: {}", e);
            }
        }
    }
}

impl Drop for CompilerProcess {
    fn drop(&mut self) {
        if !self.reaped {
            self.kill();
            let _ = self.child.wait();
        }
    }
}

/// Read `stream` line by line and send each line until EOF.
fn forward_lines(stream: impl Read, kind: StreamKind, tx: Sender<OutputLine>) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\r', '\n'])
                    .to_string();
                if tx.send(OutputLine { stream: kind, text }).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!("Stopped reading compiler {:?}: {}", kind, e);
                break;
            }
        }
    }
}
