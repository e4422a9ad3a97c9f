//! Procfile parsing.

use crate::error::{HerogateError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static PROCESS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9_-]+):\s*(.+)$").expect("Invalid Procfile line regex")
});

/// Command line of one process type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub command: String,
    pub args: Vec<String>,
}

impl ProcessSpec {
    /// Full command as a token sequence.
    pub fn command_line(&self) -> Vec<String> {
        std::iter::once(self.command.clone()).chain(self.args.iter().cloned()).collect()
    }
}

/// Parser for Procfiles (`name: command args...`).
pub struct Procfile;

impl Procfile {
    /// Parse a Procfile into process specs keyed (and ordered) by process name.
    ///
    /// Blank lines and `#` comments are skipped. Duplicate process names are rejected.
    pub fn parse(content: &str) -> Result<BTreeMap<String, ProcessSpec>> {
        let mut processes = BTreeMap::new();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let caps = PROCESS_LINE.captures(line).ok_or_else(|| {
                HerogateError::malformed(
                    format!("Procfile line {}", number + 1),
                    format!("expected `name: command`, found {:?}", line),
                )
            })?;

            let mut tokens = caps[2].split_whitespace().map(str::to_string);
            let Some(command) = tokens.next() else {
                continue;
            };
            let spec = ProcessSpec { command, args: tokens.collect() };

            if processes.insert(caps[1].to_string(), spec).is_some() {
                return Err(HerogateError::malformed(
                    format!("Procfile line {}", number + 1),
                    format!("duplicate process {:?}", &caps[1]),
                ));
            }
        }

        Ok(processes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_procfile() {
        let processes = Procfile::parse(
            "# processes\nweb: bundle exec rails server -p 80\n\nworker:   bundle exec sidekiq\n",
        )
        .unwrap();

        assert_eq!(processes.len(), 2);
        assert_eq!(
            processes["web"].command_line(),
            vec!["bundle", "exec", "rails", "server", "-p", "80"]
        );
        assert_eq!(processes["worker"].command, "bundle");
        assert_eq!(processes["worker"].args, vec!["exec", "sidekiq"]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = Procfile::parse("web: ok\nnot a process line\n").unwrap_err();
        assert!(err.to_string().contains("Procfile line 2"));
    }

    #[test]
    fn test_parse_rejects_duplicates() {
        assert!(Procfile::parse("web: a\nweb: b\n").is_err());
    }

    #[test]
    fn test_parse_empty() {
        assert!(Procfile::parse("").unwrap().is_empty());
    }
}
