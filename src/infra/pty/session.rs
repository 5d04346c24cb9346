use std::io::{Read, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use portable_pty::{Child, CommandBuilder, PtySize, native_pty_system};
use regex::bytes::Regex;
use tracing::{debug, info};

use super::error::{Result, SessionError};
use super::{AuthSession, PushRequest, Transcript};
use crate::shared::config::SessionConfig;

const PTY_SIZE: PtySize = PtySize {
    rows: 24,
    cols: 200,
    pixel_width: 0,
    pixel_height: 0,
};

/// Answers the username and password prompts of a command running in a pty.
///
/// Each answer is sent only after its prompt pattern shows up in output
/// not yet consumed by an earlier step. If the command exits before a
/// prompt appears, the remaining answers are skipped.
#[derive(Debug, Clone)]
pub struct PtyAuthSession {
    username_prompt: Regex,
    password_prompt: Regex,
    prompt_timeout: Duration,
    /// `None` waits for the command to finish without limit.
    exit_timeout: Option<Duration>,
}

impl PtyAuthSession {
    pub fn new(
        username_prompt: &str,
        password_prompt: &str,
        prompt_timeout: Duration,
        exit_timeout: Option<Duration>,
    ) -> Result<Self> {
        Ok(Self {
            username_prompt: Regex::new(username_prompt)?,
            password_prompt: Regex::new(password_prompt)?,
            prompt_timeout,
            exit_timeout,
        })
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        Self::new(
            &config.username_prompt,
            &config.password_prompt,
            Duration::from_secs(config.prompt_timeout_secs),
            config.exit_timeout_secs.map(Duration::from_secs),
        )
    }

    /// Feed identity then secret, then wait for the output to close.
    fn drive(
        &self,
        output: &mut OutputStream,
        writer: &mut dyn Write,
        request: &PushRequest<'_>,
    ) -> Result<()> {
        let steps = [
            ("username prompt", &self.username_prompt, request.identity),
            ("password prompt", &self.password_prompt, request.secret),
        ];

        for (waiting_for, pattern, answer) in steps {
            match output.wait_for(Some(pattern), Some(self.prompt_timeout), waiting_for)? {
                Wait::Matched => {
                    debug!(waiting_for, "prompt matched");
                    writer.write_all(answer.as_bytes())?;
                    writer.write_all(b"\n")?;
                    writer.flush()?;
                }
                Wait::Closed => {
                    debug!(waiting_for, "command finished before prompting");
                    break;
                }
            }
        }

        output.wait_for(None, self.exit_timeout, "the command to finish")?;
        Ok(())
    }
}

impl AuthSession for PtyAuthSession {
    fn run(&self, request: &PushRequest<'_>) -> Result<Transcript> {
        info!(program = request.program, args = ?request.args, "starting interactive session");

        let pair = native_pty_system()
            .openpty(PTY_SIZE)
            .map_err(|e| spawn_error(request.program, e))?;

        let mut cmd = CommandBuilder::new(request.program);
        cmd.args(&request.args);
        cmd.cwd(request.cwd);
        for (key, value) in &request.env {
            cmd.env(key, value);
        }

        let mut child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| spawn_error(request.program, e))?;
        // Keep only the child's copy of the slave so EOF arrives when it exits.
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| spawn_error(request.program, e))?;
        let mut writer = pair
            .master
            .take_writer()
            .map_err(|e| spawn_error(request.program, e))?;
        let mut output = OutputStream::spawn(reader);

        if let Err(e) = self.drive(&mut output, writer.as_mut(), request) {
            terminate(child.as_mut());
            return Err(e);
        }
        drop(writer);

        let status = child.wait()?;
        debug!(exit_code = status.exit_code(), "interactive session finished");

        Ok(Transcript::redacted(
            &output.buf,
            request.secret,
            status.exit_code(),
            status.success(),
        ))
    }
}

fn spawn_error(program: &str, err: impl std::fmt::Display) -> SessionError {
    SessionError::Spawn {
        program: program.to_string(),
        message: err.to_string(),
    }
}

fn terminate(child: &mut (dyn Child + Send + Sync)) {
    let _ = child.kill();
    let _ = child.wait();
}

enum Wait {
    Matched,
    Closed,
}

/// Child output collected by a reader thread.
struct OutputStream {
    rx: Receiver<Vec<u8>>,
    buf: Vec<u8>,
    consumed: usize,
}

impl OutputStream {
    fn spawn(mut reader: Box<dyn Read + Send>) -> Self {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let mut chunk = [0u8; 4096];
            loop {
                match reader.read(&mut chunk) {
                    // Linux reports EIO on the master once the child side closes.
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if tx.send(chunk[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self {
            rx,
            buf: Vec::new(),
            consumed: 0,
        }
    }

    /// Read until `pattern` matches unconsumed output, or until the
    /// output closes when there is no pattern.
    fn wait_for(
        &mut self,
        pattern: Option<&Regex>,
        timeout: Option<Duration>,
        waiting_for: &'static str,
    ) -> Result<Wait> {
        let deadline = timeout.map(|after| (Instant::now() + after, after));

        loop {
            if let Some(pattern) = pattern
                && pattern.is_match(&self.buf[self.consumed..])
            {
                self.consumed = self.buf.len();
                return Ok(Wait::Matched);
            }

            let chunk = match deadline {
                Some((deadline, after)) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    match self.rx.recv_timeout(remaining) {
                        Ok(chunk) => chunk,
                        Err(RecvTimeoutError::Timeout) => {
                            return Err(SessionError::Timeout { waiting_for, after });
                        }
                        Err(RecvTimeoutError::Disconnected) => return Ok(Wait::Closed),
                    }
                }
                None => match self.rx.recv() {
                    Ok(chunk) => chunk,
                    Err(_) => return Ok(Wait::Closed),
                },
            };
            self.buf.extend_from_slice(&chunk);
        }
    }
}
