//! # Error Suggestions
//!
//! Helpers that turn fatal library errors into command-line errors carrying
//! `hint:` lines: what went wrong and how to fix it.
//!
//! ```rust,ignore
//! use mirrorsync::suggestions;
//!
//! return Err(suggestions::config_not_found(path));
//! ```

use std::path::Path;

use crate::error::Error;

/// The repos file does not exist.
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Repos file not found: {path}\n\n\
         hint: Use -c/--config to point at your cgit repos file\n\
         hint: Set the MIRRORSYNC_CONFIG environment variable",
        path = path.display()
    )
}

/// The requested section is not declared; suggest a close match.
pub fn section_not_found(section: &str, available: &[String], config: &Path) -> anyhow::Error {
    let candidates: Vec<&str> = available.iter().map(String::as_str).collect();
    let did_you_mean = find_similar(section, &candidates)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();
    let listing = if available.is_empty() {
        "hint: The file declares no sections; add a 'section=<name>' line".to_string()
    } else {
        format!("Sections in this file: {}", available.join(", "))
    };

    anyhow::anyhow!(
        "section={section} not found in {config}{did_you_mean}\n\n{listing}",
        config = config.display()
    )
}

/// A provider name given on the command line is not registered.
pub fn unknown_provider(name: &str, known: &[String]) -> anyhow::Error {
    let candidates: Vec<&str> = known.iter().map(String::as_str).collect();
    let did_you_mean = find_similar(name, &candidates)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Unknown provider: {name}{did_you_mean}\n\n\
         Known providers are: {providers}\n\
         hint: Use -t/--template for a custom provider, e.g. 'ssh://git.example.com/{{url}}.git'",
        providers = known.join(", ")
    )
}

/// No usable git executable.
pub fn git_not_found(message: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "git executable not found: {message}\n\n\
         hint: Install git or put it on $PATH\n\
         hint: Use -g/--git or MIRRORSYNC_GIT to point at a git binary"
    )
}

/// Convert a fatal library error into a user-facing error with hints.
pub fn explain(error: Error, config: &Path) -> anyhow::Error {
    match error {
        Error::SectionNotFound { section, available } => {
            section_not_found(&section, &available, config)
        }
        Error::UnknownProvider { name, known } => unknown_provider(&name, &known),
        Error::GitNotFound { message } => git_not_found(&message),
        Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound => config_not_found(config),
        other => anyhow::Error::new(other),
    }
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
/// An exact match needs no suggestion.
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    if candidates.iter().any(|&c| c == input) {
        return None;
    }
    candidates
        .iter()
        .map(|&candidate| (candidate, edit_distance(input, candidate)))
        .filter(|&(_, distance)| distance > 0 && distance <= 2 && distance < input.len())
        .min_by_key(|&(_, distance)| distance)
        .map(|(candidate, _)| candidate)
}

/// Levenshtein distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut current = vec![i + 1; b_chars.len() + 1];
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        previous = current;
    }

    previous[b_chars.len()]
}
