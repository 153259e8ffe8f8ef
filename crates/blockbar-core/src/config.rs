//! Configuration loading
//!
//! The configuration is an INI-like file, one section per block:
//!
//! ```text
//! # properties before the first section apply to every block
//! separator_block_width=15
//!
//! [time]
//! command=date +%T
//! interval=5
//! ```
//!
//! The section title becomes the block's `name`.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::attrs::AttributeMap;
use crate::error::{BarError, BarResult};

const APP_DIR: &str = "blockbar";

/// Parsed configuration: one attribute set per block, in file order.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub sections: Vec<AttributeMap>,
    /// Directory of the last file read; block commands run from here.
    pub origin: Option<PathBuf>,
}

/// A place a configuration may live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    File(PathBuf),
    /// Every regular file inside, in alphabetical order.
    Dir(PathBuf),
}

/// Inputs of the configuration search order.
#[derive(Debug, Clone, Default)]
pub struct SearchPaths {
    pub home: Option<PathBuf>,
    pub config_home: Option<PathBuf>,
    pub config_dirs: Option<PathBuf>,
    pub sysconf: PathBuf,
}

impl SearchPaths {
    /// Resolves the search inputs for the current user.
    pub fn from_env() -> Self {
        let config_dirs = env::var_os("XDG_CONFIG_DIRS")
            .and_then(|dirs| env::split_paths(&dirs).find(|path| !path.as_os_str().is_empty()));

        Self {
            home: dirs::home_dir(),
            config_home: dirs::config_dir(),
            config_dirs,
            sysconf: PathBuf::from("/etc"),
        }
    }

    /// Candidates in priority order; user files come first.
    pub fn candidates(&self) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        if let Some(home) = &self.home {
            let config_home = self
                .config_home
                .clone()
                .unwrap_or_else(|| home.join(".config"));
            candidates.push(Candidate::File(config_home.join(APP_DIR).join("config")));
            candidates.push(Candidate::File(home.join(format!(".{APP_DIR}.conf"))));
            candidates.push(Candidate::Dir(home.join(format!(".{APP_DIR}.conf.d"))));
        }

        let config_dirs = self
            .config_dirs
            .clone()
            .unwrap_or_else(|| self.sysconf.join("xdg"));
        candidates.push(Candidate::File(config_dirs.join(APP_DIR).join("config")));
        candidates.push(Candidate::File(self.sysconf.join(format!("{APP_DIR}.conf"))));

        candidates
    }
}

/// Loads `path`, or the first existing default candidate.
pub fn load(path: Option<&Path>) -> BarResult<Config> {
    match path {
        Some(path) => {
            let mut parser = Parser::default();
            parser.read_file(path)?;
            Ok(parser.finish())
        }
        None => load_first(&SearchPaths::from_env().candidates()),
    }
}

/// Loads the first candidate that exists.
pub fn load_first(candidates: &[Candidate]) -> BarResult<Config> {
    for candidate in candidates {
        tracing::debug!("trying {candidate:?}");

        let mut parser = Parser::default();
        let result = match candidate {
            Candidate::File(path) => parser.read_file(path),
            Candidate::Dir(dir) => parser.read_dir(dir),
        };

        match result {
            Ok(()) => return Ok(parser.finish()),
            Err(BarError::Io(err)) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => return Err(err),
        }
    }

    Err(BarError::ConfigNotFound)
}

/// Parses configuration text that did not come from a file.
pub fn parse_str(text: &str) -> BarResult<Vec<AttributeMap>> {
    let mut parser = Parser::default();
    parser.feed(text, Path::new("<memory>"))?;
    Ok(parser.finish().sections)
}

#[derive(Debug, Default)]
struct Parser {
    global: AttributeMap,
    section: Option<AttributeMap>,
    sections: Vec<AttributeMap>,
    origin: Option<PathBuf>,
}

impl Parser {
    fn read_file(&mut self, path: &Path) -> BarResult<()> {
        let text = fs::read_to_string(path)?;
        tracing::debug!("reading configuration {}", path.display());
        self.origin = path.parent().map(Path::to_path_buf);
        self.feed(&text, path)
    }

    fn read_dir(&mut self, dir: &Path) -> BarResult<()> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();

        for file in files {
            self.read_file(&file)?;
        }
        Ok(())
    }

    fn feed(&mut self, text: &str, path: &Path) -> BarResult<()> {
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let invalid = |reason: &str| BarError::Config {
                path: path.to_path_buf(),
                line: index + 1,
                reason: reason.to_string(),
            };

            if let Some(rest) = line.strip_prefix('[') {
                let title = rest
                    .strip_suffix(']')
                    .ok_or_else(|| invalid("unterminated section title"))?;
                self.start_section(title.trim());
            } else if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                if key.is_empty() {
                    return Err(invalid("empty property name"));
                }
                self.set(key, value.trim());
            } else {
                return Err(invalid("expected [section] or key=value"));
            }
        }

        // a section never spans two files
        self.finish_section();
        Ok(())
    }

    fn start_section(&mut self, title: &str) {
        self.finish_section();
        let mut section = self.global.clone();
        section.set("name", Some(title.to_string()));
        self.section = Some(section);
    }

    fn finish_section(&mut self) {
        if let Some(section) = self.section.take() {
            self.sections.push(section);
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        let target = self.section.as_mut().unwrap_or(&mut self.global);
        target.set(key, Some(value.to_string()));
    }

    fn finish(mut self) -> Config {
        self.finish_section();
        Config {
            sections: self.sections,
            origin: self.origin,
        }
    }
}
