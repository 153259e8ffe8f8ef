//! Block runner
//!
//! A [`Block`] is one unit of the status line. It owns two attribute
//! sets: the configuration it was created from, and the current
//! attributes that the renderer reads and clicks write into. Running the
//! block's `command` resets the current set to the configuration and
//! merges the command output on top.

use std::process::{Command, Stdio};
use std::time::Duration;

use crate::attrs::AttributeMap;
use crate::error::{BarError, BarResult};
use crate::keys;

/// Exit code a command uses to request the urgent hint.
const EXIT_URGENT: i32 = 33;

const ERROR_COLOR: &str = "#FF0000";

/// When a block's command runs on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    /// Only at startup (and on clicks).
    Once,
    /// At startup, then every period.
    Every(Duration),
}

impl Interval {
    fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("once") | Some("0") => Interval::Once,
            Some(text) => match text.parse::<u64>() {
                Ok(secs) => Interval::Every(Duration::from_secs(secs)),
                Err(_) => {
                    tracing::warn!("unsupported interval {text:?}, running once");
                    Interval::Once
                }
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    config: AttributeMap,
    attrs: AttributeMap,
}

impl Block {
    /// Creates a block from one configuration section.
    pub fn new(config: AttributeMap) -> Self {
        Self {
            attrs: config.clone(),
            config,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs.get(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Option<String>>) {
        self.attrs.set(key, value);
    }

    /// Merges every entry of `map` into the current attributes.
    pub fn set_all_from(&mut self, map: &AttributeMap) {
        self.attrs.extend_from(map);
    }

    /// Current attributes, in storage order.
    pub fn attributes(&self) -> &AttributeMap {
        &self.attrs
    }

    /// The `name` half of the click identity, empty when unset.
    pub fn name(&self) -> &str {
        self.get("name").unwrap_or_default()
    }

    /// The `instance` half of the click identity, empty when unset.
    pub fn instance(&self) -> &str {
        self.get("instance").unwrap_or_default()
    }

    /// Non-empty `full_text`, the only mandatory protocol key.
    pub fn full_text(&self) -> Option<&str> {
        self.get("full_text").filter(|text| !text.is_empty())
    }

    pub fn interval(&self) -> Interval {
        Interval::parse(self.config.get("interval"))
    }

    /// Label used in traces.
    pub fn label(&self) -> String {
        match (self.name(), self.instance()) {
            ("", _) => "<anonymous>".to_string(),
            (name, "") => name.to_string(),
            (name, instance) => format!("{name}:{instance}"),
        }
    }

    /// Runs the block command, if any, and refreshes the attributes.
    ///
    /// A command that exits with a failure status is not an error: the
    /// block displays the failure instead. Only a failure to spawn the
    /// shell is returned, after the block has been marked the same way.
    pub fn update(&mut self) -> BarResult<()> {
        let Some(command) = self.attrs.get("command").map(str::to_owned) else {
            tracing::trace!("[{}] no command, nothing to update", self.label());
            return Ok(());
        };

        tracing::debug!("[{}] running {command:?}", self.label());

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&command)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit());
        for (key, value) in self.attrs.iter() {
            if let Some(value) = value {
                if is_env_name(key) {
                    cmd.env(key, value);
                }
            }
        }

        let output = match cmd.output() {
            Ok(output) => output,
            Err(source) => {
                self.show_error(&format!("failed to run: {source}"));
                return Err(BarError::Spawn {
                    block: self.label(),
                    source,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        self.apply_output(&stdout, output.status.code());
        Ok(())
    }

    /// Click callback: re-runs the command with the click keys exported.
    pub fn click(&mut self) -> BarResult<()> {
        tracing::debug!("[{}] clicked", self.label());
        self.update()
    }

    fn apply_output(&mut self, stdout: &str, status: Option<i32>) {
        match status {
            Some(0) | Some(EXIT_URGENT) => {}
            Some(code) => {
                self.show_error(&format!("bad exit code {code}"));
                return;
            }
            None => {
                self.show_error("terminated by signal");
                return;
            }
        }

        self.attrs = self.config.clone();

        if self.config.get("format") == Some("json") {
            let line = stdout.lines().next().unwrap_or_default();
            match AttributeMap::from_json_object(line) {
                Ok(map) => self.attrs.extend_from(&map),
                Err(err) => {
                    self.show_error(&format!("invalid JSON output: {err}"));
                    return;
                }
            }
        } else {
            for (index, line) in stdout.lines().enumerate() {
                match keys::key_for_line(index) {
                    Some(key) => self.attrs.set(key, Some(line.to_string())),
                    None => tracing::debug!("[{}] ignoring excess line {index}: {line}", self.label()),
                }
            }
        }

        if status == Some(EXIT_URGENT) {
            self.attrs.set("urgent", Some("true".to_string()));
        }
    }

    fn show_error(&mut self, reason: &str) {
        tracing::warn!("[{}] {reason}", self.label());
        self.attrs = self.config.clone();
        let text = format!("[{}] {reason}", self.label());
        self.attrs.set("full_text", Some(text));
        self.attrs.set("color", Some(ERROR_COLOR.to_string()));
        self.attrs.set("urgent", Some("true".to_string()));
    }
}

fn is_env_name(key: &str) -> bool {
    !key.is_empty() && !key.contains(['=', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(entries: &[(&str, &str)]) -> Block {
        Block::new(entries.iter().copied().collect())
    }

    #[test]
    fn test_identity_defaults_to_empty() {
        let anonymous = Block::default();
        assert_eq!(anonymous.name(), "");
        assert_eq!(anonymous.instance(), "");
        assert_eq!(anonymous.label(), "<anonymous>");

        let cpu = block(&[("name", "cpu"), ("instance", "1")]);
        assert_eq!(cpu.label(), "cpu:1");
    }

    #[test]
    fn test_full_text_must_be_non_empty() {
        assert_eq!(block(&[("full_text", "")]).full_text(), None);
        assert_eq!(block(&[("full_text", "up")]).full_text(), Some("up"));
    }

    #[test]
    fn test_interval_parsing() {
        assert_eq!(Block::default().interval(), Interval::Once);
        assert_eq!(block(&[("interval", "once")]).interval(), Interval::Once);
        assert_eq!(block(&[("interval", "0")]).interval(), Interval::Once);
        assert_eq!(
            block(&[("interval", "5")]).interval(),
            Interval::Every(Duration::from_secs(5))
        );
        assert_eq!(block(&[("interval", "repeat")]).interval(), Interval::Once);
    }

    #[test]
    fn test_plain_output_fills_keys_in_table_order() {
        let mut b = block(&[("name", "load"), ("command", "true")]);
        b.apply_output("0.42\n0.4\n#00FF00\n", Some(0));

        assert_eq!(b.get("full_text"), Some("0.42"));
        assert_eq!(b.get("short_text"), Some("0.4"));
        assert_eq!(b.get("color"), Some("#00FF00"));
        assert_eq!(b.get("name"), Some("load"));
    }

    #[test]
    fn test_output_resets_click_keys() {
        let mut b = block(&[("name", "vol")]);
        b.set("button", Some("1".to_string()));
        b.apply_output("50%\n", Some(0));

        assert_eq!(b.get("button"), None);
        assert_eq!(b.get("full_text"), Some("50%"));
    }

    #[test]
    fn test_urgent_exit_code() {
        let mut b = block(&[("name", "bat")]);
        b.apply_output("5%\n", Some(EXIT_URGENT));
        assert_eq!(b.get("urgent"), Some("true"));
        assert_eq!(b.get("full_text"), Some("5%"));
    }

    #[test]
    fn test_bad_exit_code_shows_error() {
        let mut b = block(&[("name", "disk")]);
        b.apply_output("ignored\n", Some(2));
        assert_eq!(b.get("full_text"), Some("[disk] bad exit code 2"));
        assert_eq!(b.get("color"), Some(ERROR_COLOR));
    }

    #[test]
    fn test_json_format() {
        let mut b = block(&[("name", "net"), ("format", "json")]);
        b.apply_output("{\"full_text\":\"up\",\"separator\":false}\n", Some(0));
        assert_eq!(b.get("full_text"), Some("up"));
        assert_eq!(b.get("separator"), Some("false"));

        b.apply_output("garbage\n", Some(0));
        assert!(b
            .get("full_text")
            .is_some_and(|t| t.starts_with("[net] invalid JSON output")));
    }

    #[test]
    fn test_update_runs_command_with_attributes_in_env() {
        let mut b = block(&[("name", "echo"), ("command", "echo \"$name-$button\"")]);
        b.set("button", Some("3".to_string()));

        b.click().expect("sh should be available");
        assert_eq!(b.get("full_text"), Some("echo-3"));
        assert_eq!(b.get("button"), None);
    }

    #[test]
    fn test_update_without_command_keeps_attributes() {
        let mut b = block(&[("full_text", "static")]);
        b.set("button", Some("1".to_string()));
        b.update().expect("no command");
        assert_eq!(b.get("button"), Some("1"));
        assert_eq!(b.get("full_text"), Some("static"));
    }

    #[test]
    fn test_env_names() {
        assert!(is_env_name("button"));
        assert!(!is_env_name(""));
        assert!(!is_env_name("a=b"));
    }
}
