//! # Sync Command Implementation
//!
//! Reads the repos file, parses every requested section up front, and then
//! clones or updates each declared mirror.
//!
//! - A configuration problem in any requested section aborts the run before
//!   any git command is started.
//! - Per-record problems (unresolvable url, failed clone or update, timeout)
//!   are reported on that record's line; the remaining records still run.
//! - The exit code is non-zero when at least one record failed.
//!
//! With `--dry-run` the plan (clone, update or skip) is printed instead and no
//! git command runs.

use anyhow::Result;
use clap::{Args, ValueEnum};
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mirrorsync::config::{self, Section};
use mirrorsync::defaults::{
    DEFAULT_CONFIG_PATH, DEFAULT_GIT_TIMEOUT_ARG, DEFAULT_JOBS, DEFAULT_PROVIDER,
};
use mirrorsync::exit_codes;
use mirrorsync::filesystem::expand_home;
use mirrorsync::git::Git;
use mirrorsync::output::{emoji, status_line, summary_line, OutputConfig};
use mirrorsync::resolve::UrlResolver;
use mirrorsync::suggestions;
use mirrorsync::sync::{MirrorSyncer, Planner, SyncPlan, SyncReport};

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Sections of the repos file to sync, processed in the order given
    #[arg(value_name = "SECTION", required = true)]
    pub sections: Vec<String>,

    /// Path to the cgit repos file
    #[arg(short, long, value_name = "FILE", env = "MIRRORSYNC_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Path to git (defaults to git on $PATH)
    #[arg(short, long, value_name = "PATH", env = "MIRRORSYNC_GIT")]
    pub git: Option<PathBuf>,

    /// Provider used to expand <namespace>/<name> urls
    #[arg(short, long, value_name = "NAME", default_value = DEFAULT_PROVIDER, conflicts_with = "template")]
    pub provider: String,

    /// Custom provider template, e.g. 'ssh://mygit.com/{owner}/{url}.git'.
    ///
    /// Any repo.<key> of a record can be used as {key}, as well as
    /// {namespace} and {name}.
    #[arg(short, long, value_name = "TEMPLATE")]
    pub template: Option<String>,

    /// Number of repositories synced at the same time
    #[arg(short, long, value_name = "N", default_value_t = DEFAULT_JOBS)]
    pub jobs: usize,

    /// Time limit for each git command (e.g. 90s, 15m)
    #[arg(long, value_name = "DURATION", default_value = DEFAULT_GIT_TIMEOUT_ARG, value_parser = humantime::parse_duration)]
    pub timeout: Duration,

    /// Show what would be done without running git
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,
}

/// Output format for the per-record report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum ReportFormat {
    /// One status line per record followed by a summary
    #[default]
    Text,
    /// A JSON array with one object per record
    Json,
}

#[derive(Serialize)]
struct ReportRow<'a> {
    section: &'a str,
    url: &'a str,
    path: String,
    resolved_url: Option<&'a str>,
    outcome: &'static str,
    reason: Option<&'a str>,
    elapsed_ms: u64,
}

#[derive(Serialize)]
struct PlanRow<'a> {
    section: &'a str,
    url: &'a str,
    path: String,
    resolved_url: Option<&'a str>,
    action: &'static str,
    reason: Option<&'a str>,
}

/// Execute the sync command and return the process exit code
pub fn execute(args: SyncArgs, color_flag: &str) -> Result<u8> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let config_path = expand_home(&args.config);

    let text = std::fs::read_to_string(&config_path)
        .map_err(|e| suggestions::explain(e.into(), &config_path))?;
    let sections = load_sections(&text, &args.sections, &config_path)?;
    let resolver = build_resolver(&args, &config_path)?;

    if args.dry_run {
        print_plan(&Planner::new(resolver), &sections, &out, args.format)?;
        return Ok(exit_codes::SUCCESS);
    }

    let git = Git::locate(args.git.as_deref(), args.timeout)
        .map_err(|e| suggestions::explain(e, &config_path))?;
    let syncer = MirrorSyncer::new(git, resolver).with_jobs(args.jobs);

    let mut results: Vec<(&str, Vec<SyncReport>)> = Vec::with_capacity(sections.len());
    for section in &sections {
        info!("Processing repos in section={}", section.name);
        if section.records.is_empty() {
            warn!("section={} declares no repositories", section.name);
        }
        let reports = syncer.sync(&section.records);
        if args.format == ReportFormat::Text {
            if sections.len() > 1 {
                println!("{} section={}", emoji(&out, "📂", "==>"), section.name);
            }
            for report in &reports {
                println!("{}", status_line(&out, report));
            }
        }
        results.push((section.name.as_str(), reports));
    }

    let all: Vec<SyncReport> = results
        .iter()
        .flat_map(|(_, reports)| reports.iter().cloned())
        .collect();
    match args.format {
        ReportFormat::Text => println!("{}", summary_line(&all)),
        ReportFormat::Json => print_json(&results)?,
    }

    let failures = all.iter().filter(|r| r.outcome.is_failure()).count();
    if failures > 0 {
        warn!("{} of {} repositories failed to sync", failures, all.len());
        Ok(exit_codes::FAILURE)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}

/// Parse every requested section before anything runs.
fn load_sections(text: &str, names: &[String], config_path: &Path) -> Result<Vec<Section>> {
    names
        .iter()
        .map(|name| {
            config::parse_section(text, name).map_err(|e| suggestions::explain(e, config_path))
        })
        .collect()
}

fn build_resolver(args: &SyncArgs, config_path: &Path) -> Result<UrlResolver> {
    if let Some(template) = &args.template {
        return Ok(UrlResolver::with_template(template.as_str()));
    }
    let mut resolver = UrlResolver::new();
    resolver
        .set_default(&args.provider)
        .map_err(|e| suggestions::explain(e, config_path))?;
    Ok(resolver)
}

fn print_plan(
    planner: &Planner,
    sections: &[Section],
    out: &OutputConfig,
    format: ReportFormat,
) -> Result<()> {
    let plans: Vec<Vec<SyncPlan>> = sections
        .iter()
        .map(|section| planner.plan_all(&section.records))
        .collect();
    let mut rows = Vec::new();
    for (section, plans) in sections.iter().zip(&plans) {
        for (record, plan) in section.records.iter().zip(plans) {
            let reason = match plan {
                SyncPlan::Skip { reason, .. } | SyncPlan::Unresolvable { reason } => {
                    Some(reason.as_str())
                }
                SyncPlan::Clone { .. } | SyncPlan::Update { .. } => None,
            };
            match format {
                ReportFormat::Text => {
                    let mut line = format!(
                        "{} {:<12} {} -> {}",
                        emoji(out, "🔎", "[PLAN]"),
                        plan.label(),
                        record.url,
                        record.path.display()
                    );
                    if let Some(url) = plan.url() {
                        line.push_str(&format!(" ({})", url));
                    }
                    if let Some(reason) = reason {
                        line.push_str(&format!(": {}", reason));
                    }
                    println!("{}", line);
                }
                ReportFormat::Json => rows.push(PlanRow {
                    section: &section.name,
                    url: &record.url,
                    path: record.path.display().to_string(),
                    resolved_url: plan.url(),
                    action: plan.label(),
                    reason,
                }),
            }
        }
    }
    if format == ReportFormat::Json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    }
    Ok(())
}

fn print_json(results: &[(&str, Vec<SyncReport>)]) -> Result<()> {
    let rows: Vec<ReportRow> = results
        .iter()
        .flat_map(|(section, reports)| {
            reports.iter().map(move |r| ReportRow {
                section,
                url: &r.url,
                path: r.path.display().to_string(),
                resolved_url: r.resolved_url.as_deref(),
                outcome: r.outcome.label(),
                reason: r.outcome.reason(),
                elapsed_ms: u64::try_from(r.elapsed.as_millis()).unwrap_or(u64::MAX),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(config: PathBuf, sections: &[&str]) -> SyncArgs {
        SyncArgs {
            sections: sections.iter().map(|s| s.to_string()).collect(),
            config,
            git: None,
            provider: DEFAULT_PROVIDER.to_string(),
            template: None,
            jobs: DEFAULT_JOBS,
            timeout: Duration::from_secs(5),
            dry_run: true,
            format: ReportFormat::Text,
        }
    }

    #[test]
    fn test_execute_missing_config() {
        let args = args(PathBuf::from("/nonexistent/cgitrepos"), &["team"]);
        let err = execute(args, "never").unwrap_err();
        assert!(err.to_string().contains("Repos file not found"));
    }

    #[test]
    fn test_execute_missing_section_is_fatal() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("cgitrepos");
        fs::write(&config, "section=team\nrepo.url=a/b\nrepo.path=/srv/b.git\n").unwrap();

        let err = execute(args(config, &["team", "other"]), "never").unwrap_err();
        assert!(err.to_string().contains("section=other not found"));
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("cgitrepos");
        let mirror = temp.path().join("mirrors/b.git");
        fs::write(
            &config,
            format!("section=team\nrepo.url=a/b\nrepo.path={}\n", mirror.display()),
        )
        .unwrap();

        let code = execute(args(config, &["team"]), "never").unwrap();
        assert_eq!(code, exit_codes::SUCCESS);
        assert!(!temp.path().join("mirrors").exists());
    }

    #[test]
    fn test_dry_run_json_spans_sections_without_git() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("cgitrepos");
        fs::write(
            &config,
            format!(
                "section=one\nrepo.url=a/b\nrepo.path={}\n\
                 section=two\nrepo.url=not-short\nrepo.path={}\n",
                temp.path().join("b.git").display(),
                temp.path().join("c.git").display()
            ),
        )
        .unwrap();

        let mut a = args(config, &["one", "two"]);
        a.git = Some(PathBuf::from("/nonexistent/git"));
        a.format = ReportFormat::Json;
        assert_eq!(execute(a, "never").unwrap(), exit_codes::SUCCESS);
        assert!(!temp.path().join("b.git").exists());
    }

    #[test]
    fn test_build_resolver_provider_and_template() {
        let config = Path::new("/etc/cgitrepos");
        let mut a = args(config.to_path_buf(), &["s"]);
        a.provider = "gitlab".to_string();
        assert_eq!(build_resolver(&a, config).unwrap().default_provider(), "gitlab");

        a.provider = "nope".to_string();
        let err = build_resolver(&a, config).err().unwrap();
        assert!(err.to_string().contains("Unknown provider: nope"));

        a.template = Some("https://git.example.com/{url}".to_string());
        assert_eq!(build_resolver(&a, config).unwrap().default_provider(), "custom");
    }
}
