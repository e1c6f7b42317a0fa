//! Interactive shutdown prompt read from standard input.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

pub const PROMPT: &str = "Type stop to shutdown the server: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    Stop,
    Empty,
    Invalid(String),
}

impl ControlCommand {
    /// Only the exact (trimmed, case-sensitive) text `stop` stops the server.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "stop" => Self::Stop,
            "" => Self::Empty,
            other => Self::Invalid(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlExit {
    Stop,
    InputClosed,
}

/// Prompts until `stop` is entered or the input ends. Lines that are not
/// valid UTF-8 are decoded lossily and reported like any other command.
pub async fn run_control_loop<R, W>(mut input: R, mut output: W) -> std::io::Result<ControlExit>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();

    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        buf.clear();
        if input.read_until(b'\n', &mut buf).await? == 0 {
            info!("Control input closed; server keeps running");
            return Ok(ControlExit::InputClosed);
        }

        match ControlCommand::parse(&String::from_utf8_lossy(&buf)) {
            ControlCommand::Stop => {
                output.write_all(b"Shutting down the server\n").await?;
                output.flush().await?;
                info!("Stop command received");
                return Ok(ControlExit::Stop);
            }
            ControlCommand::Empty => {}
            ControlCommand::Invalid(command) => {
                warn!(%command, "Invalid control command");
                output
                    .write_all(format!("Invalid command: {command}\n").as_bytes())
                    .await?;
            }
        }
    }
}
