//! Property-based tests for repos file parsing and URL resolution.
//!
//! These tests use proptest to generate random repos files and identifiers
//! and check that parsing and resolution invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::config::{parse, RepositoryRecord};
    use crate::error::Error;
    use crate::resolve::UrlResolver;
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn record(url: &str) -> RepositoryRecord {
        RepositoryRecord {
            url: url.to_string(),
            path: PathBuf::from("/srv/git/mirror.git"),
            extra: BTreeMap::new(),
            line: 1,
        }
    }

    fn repos_file(section: &str, names: &[String], noise: bool) -> String {
        let mut text = String::new();
        if noise {
            text.push_str("# generated\nsection=other\nrepo.url=x/y\nweird line\n\n");
        }
        text.push_str(&format!("section={}\n", section));
        for (i, name) in names.iter().enumerate() {
            text.push_str(&format!("repo.url=acme/{}\n", name));
            if noise {
                text.push_str("; inline comment\nrepo.owner=acme\n");
            }
            text.push_str(&format!("repo.path=/srv/git/{}/{}.git\n", i, name));
        }
        if noise {
            text.push_str("section=trailing\nrepo.path=relative\n");
        }
        text
    }

    // ============================================================================
    // parse property tests
    // ============================================================================

    proptest! {
        /// Property: records come back in declaration order, one per repo.url line
        #[test]
        fn parse_keeps_declaration_order(
            names in prop::collection::vec("[a-z][a-z0-9-]{0,12}", 0..12),
            noise in any::<bool>(),
        ) {
            let text = repos_file("team", &names, noise);
            let records = parse(&text, "team").unwrap();
            prop_assert_eq!(records.len(), names.len());
            for (i, (record, name)) in records.iter().zip(&names).enumerate() {
                prop_assert_eq!(&record.url, &format!("acme/{}", name));
                prop_assert_eq!(
                    &record.path,
                    &PathBuf::from(format!("/srv/git/{}/{}.git", i, name))
                );
            }
        }

        /// Property: parsing is a pure function of its input
        #[test]
        fn parse_is_deterministic(names in prop::collection::vec("[a-z]{1,8}", 0..6)) {
            let text = repos_file("team", &names, true);
            prop_assert_eq!(parse(&text, "team").unwrap(), parse(&text, "team").unwrap());
        }

        /// Property: asking for an undeclared section always fails with SectionNotFound
        #[test]
        fn parse_missing_section_fails(
            names in prop::collection::vec("[a-z]{1,8}", 0..6),
            wanted in "[A-Z][a-z ]{0,10}",
        ) {
            let text = repos_file("team", &names, false);
            match parse(&text, &wanted) {
                Err(Error::SectionNotFound { section, available }) => {
                    prop_assert_eq!(section, wanted);
                    prop_assert_eq!(available, vec!["team".to_string()]);
                }
                other => prop_assert!(false, "unexpected result {:?}", other),
            }
        }

        /// Property: a record without repo.path is rejected whatever else it carries
        #[test]
        fn parse_rejects_missing_path(name in "[a-z]{1,8}", owner in "[a-z]{0,8}") {
            let text = format!("section=s\nrepo.url=acme/{}\nrepo.owner={}\n", name, owner);
            let err = parse(&text, "s").unwrap_err();
            prop_assert!(err.is_config_error());
            prop_assert!(err.to_string().contains("line 2"));
        }
    }

    // ============================================================================
    // resolve property tests
    // ============================================================================

    proptest! {
        /// Property: full URLs are passed through unchanged
        #[test]
        fn resolve_keeps_full_urls(
            scheme in prop::sample::select(vec!["https", "ssh", "git", "file"]),
            host in "[a-z]{1,10}\\.[a-z]{2,3}",
            path in "[a-z0-9/_-]{1,20}",
        ) {
            let url = format!("{}://{}/{}", scheme, host, path);
            let resolved = UrlResolver::new().resolve(&record(&url)).unwrap();
            prop_assert_eq!(resolved, url);
        }

        /// Property: scp-style remotes are passed through unchanged
        #[test]
        fn resolve_keeps_scp_remotes(
            user in "[a-z]{1,8}",
            host in "[a-z]{1,10}\\.[a-z]{2,3}",
            path in "[a-z0-9/_-]{1,20}",
        ) {
            let url = format!("{}@{}:{}", user, host, path);
            let resolved = UrlResolver::new().resolve(&record(&url)).unwrap();
            prop_assert_eq!(resolved, url);
        }

        /// Property: every built-in provider embeds both halves of a short form
        #[test]
        fn resolve_short_form_contains_parts(
            namespace in "[A-Za-z0-9_-][A-Za-z0-9_.-]{0,15}",
            name in "[A-Za-z0-9_-][A-Za-z0-9_.-]{0,15}",
            provider in prop::sample::select(vec!["github", "github-https", "gitlab", "bitbucket"]),
        ) {
            let mut resolver = UrlResolver::new();
            resolver.set_default(provider).unwrap();
            let short = format!("{}/{}", namespace, name);
            let resolved = resolver.resolve(&record(&short)).unwrap();
            prop_assert!(resolved.contains(&short));
            prop_assert!(resolved.ends_with(".git"));
        }
    }
}
