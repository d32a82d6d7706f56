// file: src/security/credential.rs
// version: 1.0.0
// guid: 02e93b5d-ea83-4083-a733-a5f31f7a566c

//! Password collection for the new account

use crate::error::HardenError;
use crate::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::fmt;
use std::io::{self, BufRead, IsTerminal, Write};

/// Password held only in memory; wiped on drop, never printed
pub struct Credential {
    secret: String,
}

impl Credential {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    /// Borrow the plaintext for the single place that needs it
    pub fn expose(&self) -> &str {
        &self.secret
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        let mut bytes = std::mem::take(&mut self.secret).into_bytes();
        bytes.iter_mut().for_each(|b| *b = 0);
        std::hint::black_box(&bytes);
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Source of password input
pub trait PasswordPrompt: Send {
    /// Show `label` and read one line without echo
    fn read_password(&mut self, label: &str) -> Result<String>;
}

/// Prompt the operator twice and require matching, non-empty answers
pub fn collect_credential(prompt: &mut dyn PasswordPrompt, username: &str) -> Result<Credential> {
    let first = Credential::new(prompt.read_password(&format!("Password for {}: ", username))?);
    if first.expose().is_empty() {
        return Err(HardenError::credential("Password cannot be empty"));
    }

    let confirm = Credential::new(prompt.read_password("Confirm password: ")?);
    if first.expose() != confirm.expose() {
        return Err(HardenError::credential("Passwords do not match"));
    }

    Ok(first)
}

/// Reads from the controlling terminal with echo disabled
#[derive(Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }

    fn read_hidden() -> Result<String> {
        let mut buf = String::new();
        loop {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                match key.code {
                    KeyCode::Enter => return Ok(buf),
                    KeyCode::Backspace => {
                        buf.pop();
                    }
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Err(HardenError::Interrupted(
                            "password prompt cancelled".to_string(),
                        ))
                    }
                    KeyCode::Char(c) => buf.push(c),
                    _ => {}
                }
            }
        }
    }

    fn read_piped() -> Result<String> {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
    }
}

impl PasswordPrompt for TerminalPrompt {
    fn read_password(&mut self, label: &str) -> Result<String> {
        let mut stderr = io::stderr();
        write!(stderr, "{}", label)?;
        stderr.flush()?;

        if !io::stdin().is_terminal() {
            return Self::read_piped();
        }

        terminal::enable_raw_mode()?;
        let result = Self::read_hidden();
        let restored = terminal::disable_raw_mode();
        writeln!(stderr)?;
        restored?;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Scripted(VecDeque<String>);

    impl PasswordPrompt for Scripted {
        fn read_password(&mut self, _label: &str) -> Result<String> {
            self.0
                .pop_front()
                .ok_or_else(|| HardenError::credential("no more input"))
        }
    }

    fn scripted(answers: &[&str]) -> Scripted {
        Scripted(answers.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_matching_passwords() {
        let mut prompt = scripted(&["s3cret!", "s3cret!"]);
        let credential = collect_credential(&mut prompt, "openclaw").unwrap();
        assert_eq!(credential.expose(), "s3cret!");
    }

    #[test]
    fn test_empty_password_rejected_without_confirmation() {
        let mut prompt = scripted(&[""]);
        let err = collect_credential(&mut prompt, "openclaw").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_mismatch_rejected() {
        let mut prompt = scripted(&["one", "two"]);
        let err = collect_credential(&mut prompt, "openclaw").unwrap_err();
        assert!(err.to_string().contains("do not match"));
    }

    #[test]
    fn test_debug_is_redacted() {
        let credential = Credential::new("hunter2".to_string());
        let shown = format!("{:?}", credential);
        assert!(!shown.contains("hunter2"));
    }
}
