use releaser::changelog::{parse, parse_structure, rewrite, ChangelogPatterns};
use releaser::domain::{latest_released, next_version, Version};
use releaser::ChangelogError;

fn patterns() -> ChangelogPatterns {
    ChangelogPatterns::new().unwrap()
}

const PROJECT_CHANGELOG: &str = "# Changelog

# TBD

### Breaking Changes

* The `--force` flag was removed

### Features

* Added `--dry-run`

# 1.3.0

### Features

* Parallel uploads

# 1.2.9

* Fixed a crash on empty input
";

#[test]
fn test_release_scenario_end_to_end() {
    let patterns = patterns();
    let document = parse(PROJECT_CHANGELOG, &patterns).unwrap();

    assert!(document.has_breaking_change());
    assert_eq!(document.latest_recorded_version(), Some(Version::new(1, 3, 0)));

    let latest = latest_released(["1.2.9", "1.3.0", "v1.3.0", "nightly"], Version::ZERO).unwrap();
    let next = next_version(latest, document.has_breaking_change(), false);
    assert_eq!(next, Version::new(1, 4, 0));

    let rewritten = rewrite(&document, &next).unwrap();
    assert!(rewritten.starts_with("# Changelog\n\n# TBD\n\n# 1.4.0\n"));
    assert!(rewritten.ends_with("* Fixed a crash on empty input\n"));

    // The rewritten changelog has an empty unreleased section until new
    // entries are added.
    assert!(matches!(
        parse(&rewritten, &patterns),
        Err(ChangelogError::EmptyUnreleasedSection { line: 3 })
    ));

    let reparsed = parse_structure(&rewritten, &patterns).unwrap();
    assert_eq!(reparsed.released().len(), 3);
    assert_eq!(reparsed.released()[0].version, Version::new(1, 4, 0));
    assert_eq!(
        reparsed.body_lines(&reparsed.released()[0].body),
        document.unreleased_body()
    );
}

#[test]
fn test_rewrite_only_changes_the_header_region() {
    let patterns = patterns();
    let original = "# TBD\r\n* Windows line endings kept\r\n\r\n# 0.1.0\r\n* First\r\n";
    let document = parse(original, &patterns).unwrap();

    let rewritten = rewrite(&document, &Version::new(0, 1, 1)).unwrap();

    assert_eq!(
        rewritten,
        "# TBD\r\n\r\n# 0.1.1\r\n* Windows line endings kept\r\n\r\n# 0.1.0\r\n* First\r\n"
    );
}

#[test]
fn test_every_failure_kind() {
    let patterns = patterns();

    assert!(matches!(
        parse("", &patterns),
        Err(ChangelogError::MissingUnreleasedHeader { line: None })
    ));
    assert!(matches!(
        parse("* stray entry\n# TBD\n* x\n# 0.1.0\n", &patterns),
        Err(ChangelogError::MissingUnreleasedHeader { line: Some(1) })
    ));
    assert!(matches!(
        parse("# TBD\n* x\n# TBD\n# 0.1.0\n", &patterns),
        Err(ChangelogError::DuplicateUnreleasedHeader {
            first: 1,
            duplicate: 3
        })
    ));
    assert!(matches!(
        parse("# TBD\n* x\n", &patterns),
        Err(ChangelogError::NoPriorReleases)
    ));
    assert!(matches!(
        parse("# TBD\n# nothing yet\n### Breaking\n\n# 0.1.0\n", &patterns),
        Err(ChangelogError::EmptyUnreleasedSection { line: 1 })
    ));
    assert!(matches!(
        parse("# TBD\n* x\n# 99999999999999999999.0.0\n", &patterns),
        Err(ChangelogError::InvalidVersionHeader { line: 3, .. })
    ));
}

#[test]
fn test_breaking_marker_in_released_section_is_ignored() {
    let patterns = patterns();
    let document = parse(
        "# TBD\n* Small fix\n# 1.0.0\n## Breaking\n* Old news\n",
        &patterns,
    )
    .unwrap();

    assert!(!document.has_breaking_change());
    assert_eq!(next_version(Version::new(1, 0, 0), false, false), Version::new(1, 0, 1));
}
