use std::io::BufRead;
use tracing::{info, warn};

use crate::control::ControlHandle;

/// One line typed on the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Flip between running and paused
    Toggle,
    Arm,
    Pause,
    Exit,
}

impl Command {
    /// Parse a console line. An empty line toggles.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "" | "t" | "toggle" => Some(Self::Toggle),
            "a" | "arm" => Some(Self::Arm),
            "p" | "pause" => Some(Self::Pause),
            "q" | "quit" | "exit" => Some(Self::Exit),
            _ => None,
        }
    }

    pub fn apply(self, control: &ControlHandle) {
        match self {
            Self::Toggle => {
                let running = control.toggle();
                info!("{}", if running { "RUNNING" } else { "PAUSED" });
            }
            Self::Arm => control.arm(),
            Self::Pause => control.pause(),
            Self::Exit => control.request_exit(),
        }
    }
}

/// Apply commands from `reader` until exit is requested or input ends
pub fn read_commands<R: BufRead>(reader: R, control: &ControlHandle) -> std::io::Result<()> {
    for line in reader.lines() {
        if control.exit_requested() {
            break;
        }
        let line = line?;
        match Command::parse(&line) {
            Some(command) => command.apply(control),
            None => warn!(
                "Unknown command {:?} (Enter/t: toggle, a: arm, p: pause, q: quit)",
                line
            ),
        }
        if control.exit_requested() {
            break;
        }
    }
    Ok(())
}

/// Read console commands on a dedicated thread. Stdin blocks, so the thread
/// is left detached and dies with the process.
pub fn spawn_keyboard(control: ControlHandle) {
    info!("Press Enter to start/pause, q then Enter to quit");
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        if let Err(e) = read_commands(stdin.lock(), &control) {
            warn!("Keyboard input stopped: {}", e);
        }
    });
}

/// Request exit on Ctrl-C
pub async fn watch_ctrl_c(control: ControlHandle) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Ctrl-C received");
            control.request_exit();
        }
        Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
    }
}
