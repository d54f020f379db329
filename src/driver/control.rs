use std::io::BufRead;
use std::sync::mpsc::{self, Receiver};
use std::thread;

/// User input consumed by the frame driver between frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,
    Quit,
}

impl Command {
    /// `p` pauses, `q` quits, any other input resumes
    pub fn parse(input: &str) -> Self {
        match input.trim() {
            "q" | "Q" => Command::Quit,
            "p" | "P" => Command::Pause,
            _ => Command::Resume,
        }
    }
}

/// Read commands from stdin, one per line, on a background thread
pub fn spawn_stdin_commands() -> Receiver<Command> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let command = Command::parse(&line);
            if sender.send(command).is_err() || command == Command::Quit {
                break;
            }
        }
    });
    receiver
}
