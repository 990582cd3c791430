//! # Repos File Parsing
//!
//! This module parses the cgit-style repos file that declares which
//! repositories are mirrored where. The format is flat and line oriented:
//!
//! ```text
//! # comment
//! section=team mirrors
//! repo.url=acme/widgets
//! repo.path=/srv/git/acme/widgets.git
//! repo.owner=acme
//! ```
//!
//! A `section=` line opens a section. Inside a section a `repo.url=` line
//! starts a new record and every following `repo.*` line attaches to that
//! record until the next `repo.url=` or `section=` line. `repo.url` and
//! `repo.path` are the only keys the tool interprets; every other `repo.<key>`
//! is kept in [`RepositoryRecord::extra`] for URL templates.
//!
//! Parsing is a pure function of the text. Only the requested section is
//! validated, so unrelated sections may carry keys this tool never reads.

use crate::error::{Error, Result};
use log::debug;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

const SECTION_KEY: &str = "section";
const REPO_PREFIX: &str = "repo.";
const URL_KEY: &str = "url";
const PATH_KEY: &str = "path";

/// One mirror declaration from the repos file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRecord {
    /// Remote identifier: a full URL, an scp-style remote, or `<namespace>/<name>`.
    pub url: String,
    /// Absolute path of the bare mirror.
    pub path: PathBuf,
    /// Every other `repo.<key>` value, keyed without the `repo.` prefix.
    pub extra: BTreeMap<String, String>,
    /// Line of the `repo.url=` entry that opened this record.
    pub line: usize,
}

impl RepositoryRecord {
    /// Look up a template key: `url`, `path` or any extra key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            URL_KEY => Some(self.url.clone()),
            PATH_KEY => Some(self.path.display().to_string()),
            _ => self.extra.get(key).cloned(),
        }
    }
}

/// A named group of repository declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub records: Vec<RepositoryRecord>,
}

/// Parse `text` and return the records declared under `section`, in file order.
pub fn parse(text: &str, section: &str) -> Result<Vec<RepositoryRecord>> {
    parse_section(text, section).map(|s| s.records)
}

/// Parse `text` and return the named section with its records.
pub fn parse_section(text: &str, section: &str) -> Result<Section> {
    let mut parser = Parser::new(section);
    for (idx, raw) in text.lines().enumerate() {
        parser.feed(idx + 1, raw)?;
    }
    parser.finish(text)
}

/// Names of all sections in declaration order, duplicates removed.
pub fn section_names(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.lines()
        .filter_map(|raw| section_header(raw.trim()))
        .filter(|name| seen.insert(name.to_string()))
        .map(str::to_string)
        .collect()
}

fn is_ignored(line: &str) -> bool {
    line.is_empty() || line.starts_with('#') || line.starts_with(';')
}

fn split_key_value(line: &str) -> Option<(&str, &str)> {
    line.split_once('=').map(|(k, v)| (k.trim(), v.trim()))
}

fn section_header(line: &str) -> Option<&str> {
    if is_ignored(line) {
        return None;
    }
    match split_key_value(line) {
        Some((SECTION_KEY, name)) => Some(name),
        _ => None,
    }
}

/// Where the parser currently is relative to the requested section.
#[derive(Debug, PartialEq, Eq)]
enum Scope {
    /// Before the first section header, or inside a different section.
    Elsewhere,
    /// Inside the requested section.
    Target,
}

/// Record grouping state inside the requested section.
#[derive(Debug)]
enum RecordState {
    OutsideRecord,
    InsideRecord(RecordBuilder),
}

#[derive(Debug)]
struct RecordBuilder {
    line: usize,
    url: String,
    path: Option<String>,
    extra: BTreeMap<String, String>,
}

impl RecordBuilder {
    fn new(line: usize, url: &str) -> Self {
        Self {
            line,
            url: url.to_string(),
            path: None,
            extra: BTreeMap::new(),
        }
    }

    fn set(&mut self, line: usize, key: &str, value: &str) -> Result<()> {
        // repo.url never reaches here, it opens a new record instead
        let duplicate = if key == PATH_KEY {
            self.path.replace(value.to_string()).is_some()
        } else {
            self.extra
                .insert(key.to_string(), value.to_string())
                .is_some()
        };
        if duplicate {
            return Err(Error::config(
                line,
                format!("repo.{} is set twice for record {}", key, self.url),
            ));
        }
        Ok(())
    }

    fn build(self) -> Result<RepositoryRecord> {
        if self.url.is_empty() {
            return Err(Error::config(self.line, "repo.url is empty"));
        }
        let path = match self.path {
            Some(p) if !p.is_empty() => PathBuf::from(p),
            _ => {
                return Err(Error::ConfigParse {
                    line: Some(self.line),
                    message: format!("record {} has no repo.path", self.url),
                    hint: Some(format!(
                        "add 'repo.path=/absolute/path/to/mirror.git' after the repo.url={} line",
                        self.url
                    )),
                })
            }
        };
        if !path.is_absolute() {
            return Err(Error::config(
                self.line,
                format!(
                    "repo.path for {} must be absolute, got {}",
                    self.url,
                    path.display()
                ),
            ));
        }
        Ok(RepositoryRecord {
            url: self.url,
            path,
            extra: self.extra,
            line: self.line,
        })
    }
}

struct Parser<'a> {
    wanted: &'a str,
    scope: Scope,
    state: RecordState,
    found: bool,
    records: Vec<RepositoryRecord>,
}

impl<'a> Parser<'a> {
    fn new(wanted: &'a str) -> Self {
        Self {
            wanted,
            scope: Scope::Elsewhere,
            state: RecordState::OutsideRecord,
            found: false,
            records: Vec::new(),
        }
    }

    fn feed(&mut self, line_no: usize, raw: &str) -> Result<()> {
        let line = raw.trim();
        if is_ignored(line) {
            return Ok(());
        }

        if let Some(name) = section_header(line) {
            self.close_record()?;
            if name == self.wanted {
                if self.found {
                    return Err(Error::config(
                        line_no,
                        format!("section={} is declared more than once", name),
                    ));
                }
                self.found = true;
                self.scope = Scope::Target;
            } else {
                self.scope = Scope::Elsewhere;
            }
            return Ok(());
        }

        if self.scope != Scope::Target {
            return Ok(());
        }

        let (key, value) = split_key_value(line).ok_or_else(|| Error::ConfigParse {
            line: Some(line_no),
            message: format!("line has no '=' separator: {}", line),
            hint: Some("entries take the form repo.<key>=<value>".to_string()),
        })?;

        let Some(repo_key) = key.strip_prefix(REPO_PREFIX) else {
            debug!("ignoring non-repo key '{}' on line {}", key, line_no);
            return Ok(());
        };
        if repo_key.is_empty() {
            return Err(Error::config(line_no, "repo. key has no name"));
        }

        if repo_key == URL_KEY {
            self.close_record()?;
            self.state = RecordState::InsideRecord(RecordBuilder::new(line_no, value));
            return Ok(());
        }

        match &mut self.state {
            RecordState::InsideRecord(builder) => builder.set(line_no, repo_key, value),
            RecordState::OutsideRecord => Err(Error::ConfigParse {
                line: Some(line_no),
                message: format!("{} appears before any repo.url", key),
                hint: Some("every record must start with a repo.url= line".to_string()),
            }),
        }
    }

    fn close_record(&mut self) -> Result<()> {
        if let RecordState::InsideRecord(builder) =
            std::mem::replace(&mut self.state, RecordState::OutsideRecord)
        {
            let record = builder.build()?;
            // mirrors must not overlap: one inside another breaks both
            let overlapping = self.records.iter().find(|r| {
                r.path.starts_with(&record.path) || record.path.starts_with(&r.path)
            });
            if let Some(other) = overlapping {
                let relation = if other.path == record.path {
                    "is already used by"
                } else {
                    "overlaps the mirror of"
                };
                return Err(Error::config(
                    record.line,
                    format!(
                        "repo.path {} {} {} (line {})",
                        record.path.display(),
                        relation,
                        other.url,
                        other.line
                    ),
                ));
            }
            self.records.push(record);
        }
        Ok(())
    }

    fn finish(mut self, text: &str) -> Result<Section> {
        self.close_record()?;
        if !self.found {
            return Err(Error::SectionNotFound {
                section: self.wanted.to_string(),
                available: section_names(text),
            });
        }
        Ok(Section {
            name: self.wanted.to_string(),
            records: self.records,
        })
    }
}
