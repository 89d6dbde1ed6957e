//! Line-based operator input.
//!
//! A reader task turns lines into [`OperatorCommand`]s and pushes them onto
//! an unbounded queue; the tick loop drains the queue once per tick. The
//! override gesture is latched in a shared flag instead, because startup
//! samples it before the tick loop runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use cal_core::ports::OperatorOverridePort;
use cal_core::OperatorInput;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    Confirm,
    Back,
    Reset,
    Host(String),
    Override,
    Quit,
}

impl OperatorCommand {
    /// Parse one input line. An empty line confirms.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "" | "confirm" | "ok" => Some(Self::Confirm),
            "back" => Some(Self::Back),
            "reset" => Some(Self::Reset),
            "host" => Some(Self::Host(rest.to_string())),
            "override" => Some(Self::Override),
            "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Everything the operator did since the previous tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorBatch {
    pub input: OperatorInput,
    /// Last hostname typed, if any.
    pub hostname: Option<String>,
    pub quit: bool,
}

/// Tick-loop side of the operator channel.
pub struct OperatorQueue {
    rx: mpsc::UnboundedReceiver<OperatorCommand>,
    override_held: Arc<AtomicBool>,
}

/// Reader side of the operator channel.
#[derive(Clone)]
pub struct OperatorFeed {
    tx: mpsc::UnboundedSender<OperatorCommand>,
    override_held: Arc<AtomicBool>,
}

/// Override gesture as seen by the startup resolver.
pub struct OperatorOverrideSwitch {
    held: Arc<AtomicBool>,
}

impl OperatorQueue {
    pub fn new() -> (Self, OperatorFeed) {
        let (tx, rx) = mpsc::unbounded_channel();
        let override_held = Arc::new(AtomicBool::new(false));
        (
            Self {
                rx,
                override_held: Arc::clone(&override_held),
            },
            OperatorFeed { tx, override_held },
        )
    }

    pub fn override_switch(&self) -> OperatorOverrideSwitch {
        OperatorOverrideSwitch {
            held: Arc::clone(&self.override_held),
        }
    }

    /// Collapse all queued commands into one batch. Never waits.
    pub fn drain(&mut self) -> OperatorBatch {
        let mut batch = OperatorBatch::default();
        while let Ok(command) = self.rx.try_recv() {
            match command {
                OperatorCommand::Confirm => batch.input.confirm = true,
                OperatorCommand::Back => batch.input.step_back = true,
                OperatorCommand::Reset => batch.input.reset_network = true,
                OperatorCommand::Host(hostname) => batch.hostname = Some(hostname),
                OperatorCommand::Quit => batch.quit = true,
                // Latched by the feed already.
                OperatorCommand::Override => {}
            }
        }
        batch
    }
}

impl OperatorFeed {
    pub fn send(&self, command: OperatorCommand) -> bool {
        if command == OperatorCommand::Override {
            self.override_held.store(true, Ordering::SeqCst);
        }
        self.tx.send(command).is_ok()
    }

    /// Forward parsed lines from `reader` until EOF or until the queue is
    /// dropped.
    pub async fn pump<R>(self, reader: R) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            match OperatorCommand::parse(&line) {
                Some(command) => {
                    debug!(?command, "operator command");
                    if !self.send(command) {
                        break;
                    }
                }
                None => warn!(line = %line.trim(), "unknown operator command"),
            }
        }
        Ok(())
    }
}

impl OperatorOverridePort for OperatorOverrideSwitch {
    fn is_override_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }
}
