use std::{collections::VecDeque, process::Stdio, time::Duration};

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::Command,
    sync::mpsc,
};
use tracing::{debug, info, warn};

use crate::error::{Error, LibResult};

/// How many trailing output lines are kept for error reports
const OUTPUT_TAIL_LINES: usize = 30;

#[derive(Debug)]
pub(crate) struct ProcessOutput {
    pub code: Option<i32>,
    pub tail: String,
}

impl ProcessOutput {
    /// Turn anything outside of `accepted` into an [UnexpectedExitCode](Error::UnexpectedExitCode)
    pub fn check(self, program: &str, accepted: &[i32]) -> LibResult<i32> {
        match self.code {
            Some(code) if accepted.contains(&code) => Ok(code),
            code => Err(Error::UnexpectedExitCode {
                program: program.to_string(),
                code,
                output: self.tail,
            }),
        }
    }
}

/// Run `command` to completion, handing every stdout/stderr line to `on_line` as it arrives
pub(crate) async fn run_streaming(mut command: Command, mut on_line: impl FnMut(&str)) -> LibResult<ProcessOutput> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let (lines_tx, mut lines_rx) = mpsc::unbounded_channel::<String>();

    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(forward_lines(stdout, lines_tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(forward_lines(stderr, lines_tx.clone()));
    }
    drop(lines_tx);

    let mut tail = VecDeque::with_capacity(OUTPUT_TAIL_LINES);
    let mut handle_line = |line: String| {
        info!(target: "steamcmd", "{}", line);
        on_line(&line);

        if tail.len() == OUTPUT_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    };

    let status = loop {
        tokio::select! {
            status = child.wait() => break status?,
            Some(line) = lines_rx.recv() => handle_line(line),
        }
    };

    // Whatever is still buffered once the process is gone, grandchildren holding the pipes open are not waited on
    let drain = async {
        while let Some(line) = lines_rx.recv().await {
            handle_line(line);
        }
    };
    if tokio::time::timeout(Duration::from_secs(2), drain).await.is_err() {
        warn!("Output pipes were still open after the process exited");
    }

    debug!(code = ?status.code(), "Process exited");

    Ok(ProcessOutput {
        code: status.code(),
        tail: Vec::from(tail).join("\n"),
    })
}

/// Read `stream` until EOF, sending every non-empty line. Invalid UTF-8 is replaced, the pipe
/// must stay open until the child closes it.
async fn forward_lines(stream: impl AsyncRead + Unpin, lines_tx: mpsc::UnboundedSender<String>) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        buf.clear();

        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf).trim().to_string();
                if !line.is_empty() {
                    // Keep draining even once nobody listens
                    let _ = lines_tx.send(line);
                }
            }
            Err(error) => {
                warn!(%error, "Could not read process output, discarding the rest");
                if let Err(error) = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await {
                    warn!(%error, "Could not drain process output");
                }
                break;
            }
        }
    }
}
