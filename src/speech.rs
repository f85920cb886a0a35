use std::process::{Command, Stdio};
use tracing::{debug, warn};

pub const DEFAULT_SPEECH_RATE: u32 = 125;

/// Says a word out loud. Fire-and-forget: nothing about the result is reported back.
pub trait Speaker {
    fn speak(&self, word: &str);
}

/// Speaker used when audio is turned off
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSpeaker;

impl Speaker for SilentSpeaker {
    fn speak(&self, word: &str) {
        debug!(word, "speech muted");
    }
}

/// Speaks by running a text-to-speech program such as `espeak` or `say`
#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    program: String,
    rate: u32,
}

impl CommandSpeaker {
    pub fn new(program: &str, rate: u32) -> Self {
        Self {
            program: program.to_string(),
            rate,
        }
    }

    /// The platform's usual speech program
    pub fn system_default(rate: u32) -> Self {
        let program = if cfg!(target_os = "macos") {
            "say"
        } else {
            "espeak"
        };
        Self::new(program, rate)
    }

    /// Arguments for one utterance; `say` and `espeak` both take `-r`/`-s` rates
    pub fn args(&self, word: &str) -> Vec<String> {
        let rate_flag = if self.program.ends_with("say") { "-r" } else { "-s" };
        vec![rate_flag.to_string(), self.rate.to_string(), word.to_string()]
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&self, word: &str) {
        let spawned = Command::new(&self.program)
            .args(self.args(word))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(mut child) => {
                // Reap in the background so playback never holds up input
                std::thread::spawn(move || {
                    if let Err(err) = child.wait() {
                        debug!(error = %err, "speech process wait failed");
                    }
                });
            }
            Err(err) => warn!(program = %self.program, error = %err, "could not start speech"),
        }
    }
}
