//! # URL Resolution
//!
//! Turns the `repo.url` of a record into something `git clone` accepts.
//!
//! Full URLs (`https://...`, `ssh://...`, `file://...`) and scp-style remotes
//! (`git@host:path`) are used as written. Anything else must be a short form
//! `<namespace>/<name>`, which is expanded by a provider.
//!
//! Providers are looked up by name in a [`UrlResolver`]. The built-in ones are
//! template providers; a template may reference `{url}`, `{path}`,
//! `{namespace}`, `{name}` and any extra `repo.<key>` of the record:
//!
//! ```
//! use mirrorsync::resolve::{TemplateProvider, UrlResolver};
//!
//! let mut resolver = UrlResolver::new();
//! resolver.register("corp", TemplateProvider::new("ssh://git.corp/{owner}/{name}.git"));
//! assert!(resolver.provider_names().contains(&"corp"));
//! ```
//!
//! A record can pick a provider with `repo.provider=<name>`, or carry an inline
//! template there when the value contains `{`.

use crate::config::RepositoryRecord;
use crate::error::{Error, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Extra key a record uses to choose its provider.
pub const PROVIDER_KEY: &str = "provider";

/// Name under which `--template` is registered.
pub const CUSTOM_PROVIDER: &str = "custom";

const BUILTIN_PROVIDERS: &[(&str, &str)] = &[
    ("github", "git@github.com:{url}.git"),
    ("github-https", "https://github.com/{url}.git"),
    ("gitlab", "git@gitlab.com:{url}.git"),
    ("bitbucket", "git@bitbucket.org:{url}.git"),
];

static SCP_REMOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._-]+@[A-Za-z0-9.-]+:.+$").expect("scp remote pattern is valid")
});

static SHORT_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)$").expect("short form pattern is valid")
});

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z0-9_.-]+)\}").expect("placeholder pattern is valid")
});

/// A `<namespace>/<name>` identifier split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortForm<'a> {
    pub namespace: &'a str,
    pub name: &'a str,
}

impl<'a> ShortForm<'a> {
    pub fn parse(url: &'a str) -> Option<Self> {
        let caps = SHORT_FORM.captures(url)?;
        let namespace = caps.get(1)?.as_str();
        let name = caps.get(2)?.as_str();
        if [namespace, name].iter().any(|p| *p == "." || *p == "..") {
            return None;
        }
        Some(Self { namespace, name })
    }
}

/// Builds a clone URL for a short-form record.
pub trait UrlProvider: Send + Sync {
    fn build(&self, short: ShortForm<'_>, record: &RepositoryRecord) -> Result<String>;
}

/// A provider driven by a `{key}` template string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateProvider {
    template: String,
}

impl TemplateProvider {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl UrlProvider for TemplateProvider {
    fn build(&self, short: ShortForm<'_>, record: &RepositoryRecord) -> Result<String> {
        let mut out = String::with_capacity(self.template.len() + record.url.len());
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(&self.template) {
            let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = match key.as_str() {
                "namespace" => Some(short.namespace.to_string()),
                "name" => Some(short.name.to_string()),
                other => record.get(other),
            }
            .ok_or_else(|| Error::Resolve {
                url: record.url.clone(),
                message: format!(
                    "template {} needs repo.{} which the record does not set",
                    self.template,
                    key.as_str()
                ),
            })?;
            out.push_str(&self.template[last..whole.start()]);
            out.push_str(&value);
            last = whole.end();
        }
        out.push_str(&self.template[last..]);
        Ok(out)
    }
}

/// True for URLs git understands as they are: `scheme://...` or `user@host:path`.
pub fn is_fully_qualified(url: &str) -> bool {
    url.contains("://") || SCP_REMOTE.is_match(url)
}

/// Named registry of providers with a default entry.
pub struct UrlResolver {
    providers: BTreeMap<String, Box<dyn UrlProvider>>,
    default: String,
}

impl UrlResolver {
    /// A resolver with the built-in providers, defaulting to `github`.
    pub fn new() -> Self {
        let mut resolver = Self {
            providers: BTreeMap::new(),
            default: BUILTIN_PROVIDERS[0].0.to_string(),
        };
        for (name, template) in BUILTIN_PROVIDERS {
            resolver.register(*name, TemplateProvider::new(*template));
        }
        resolver
    }

    /// A resolver whose default provider is the given template, registered as `custom`.
    pub fn with_template(template: impl Into<String>) -> Self {
        let mut resolver = Self::new();
        resolver.register(CUSTOM_PROVIDER, TemplateProvider::new(template));
        resolver.default = CUSTOM_PROVIDER.to_string();
        resolver
    }

    /// Add or replace a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: impl UrlProvider + 'static) {
        self.providers.insert(name.into(), Box::new(provider));
    }

    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.providers.contains_key(name) {
            return Err(self.unknown(name));
        }
        self.default = name.to_string();
        Ok(())
    }

    pub fn default_provider(&self) -> &str {
        &self.default
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    /// Resolve the clone URL for `record`.
    pub fn resolve(&self, record: &RepositoryRecord) -> Result<String> {
        let url = record.url.as_str();
        if is_fully_qualified(url) {
            return Ok(url.to_string());
        }

        let short = ShortForm::parse(url).ok_or_else(|| Error::Resolve {
            url: url.to_string(),
            message: "expected a full URL, user@host:path, or <namespace>/<name>".to_string(),
        })?;

        match record.extra.get(PROVIDER_KEY) {
            Some(inline) if inline.contains('{') => {
                TemplateProvider::new(inline.as_str()).build(short, record)
            }
            Some(name) => self.lookup(name)?.build(short, record),
            None => self.lookup(&self.default)?.build(short, record),
        }
    }

    fn lookup(&self, name: &str) -> Result<&dyn UrlProvider> {
        self.providers
            .get(name)
            .map(|p| p.as_ref())
            .ok_or_else(|| self.unknown(name))
    }

    fn unknown(&self, name: &str) -> Error {
        Error::UnknownProvider {
            name: name.to_string(),
            known: self.providers.keys().cloned().collect(),
        }
    }
}

impl Default for UrlResolver {
    fn default() -> Self {
        Self::new()
    }
}
