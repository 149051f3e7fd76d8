//! Text command surface mirroring the three orchestration entry points.

use std::{fmt, str::FromStr};

use crate::{
    error::Error,
    orchestrator::{CommandReply, Orchestrator},
};

/// Optional leading word accepted before a command.
const PREFIX: &str = "integrationTest";

/// An externally triggerable operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Check every fixture resolves.
    Verify,
    /// Verify, then lay out and prepare every test.
    Setup,
    /// Run every test body.
    Run,
}

impl Command {
    /// Apply this command to `orchestrator`.
    ///
    /// `Setup` verifies first and stops there if verification fails.
    pub fn execute(self, orchestrator: &mut Orchestrator) -> CommandReply {
        match self {
            Self::Verify => orchestrator.verify(),
            Self::Setup => {
                let verified = orchestrator.verify();
                if !verified.success {
                    return verified;
                }
                let mut reply = orchestrator.setup_all();
                let mut lines = verified.lines;
                lines.append(&mut reply.lines);
                reply.lines = lines;
                reply
            }
            Self::Run => orchestrator.run_all(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Verify => "verify",
            Self::Setup => "setup",
            Self::Run => "run",
        })
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace().peekable();
        if words
            .peek()
            .is_some_and(|w| w.eq_ignore_ascii_case(PREFIX))
        {
            words.next();
        }
        let command = match (words.next(), words.next()) {
            (Some(word), None) => word.to_ascii_lowercase(),
            _ => return Err(Error::UnknownCommand(s.trim().to_string())),
        };
        match command.as_str() {
            "verify" => Ok(Self::Verify),
            "setup" => Ok(Self::Setup),
            "run" => Ok(Self::Run),
            _ => Err(Error::UnknownCommand(s.trim().to_string())),
        }
    }
}

/// Parse `text` and apply it. Unknown commands become a failed reply.
pub fn dispatch(orchestrator: &mut Orchestrator, text: &str) -> CommandReply {
    match text.parse::<Command>() {
        Ok(command) => command.execute(orchestrator),
        Err(err) => CommandReply::failed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_and_without_prefix() {
        assert_eq!("verify".parse::<Command>().unwrap(), Command::Verify);
        assert_eq!("  integrationTest setup ".parse::<Command>().unwrap(), Command::Setup);
        assert_eq!("RUN".parse::<Command>().unwrap(), Command::Run);
    }

    #[test]
    fn rejects_unknown_and_extra_words() {
        for text in ["", "integrationTest", "launch", "run now", "integrationTest run run"] {
            let err = text.parse::<Command>().unwrap_err();
            assert!(matches!(err, Error::UnknownCommand(_)), "{text}: {err}");
        }
    }
}
