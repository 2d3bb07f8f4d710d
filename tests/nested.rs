// tests/nested.rs

//! Nested-archive selection against a real on-disk extraction cache.

mod common;

use common::{archive, engine, ver};
use muster::{ExtractionCache, IssueDetail, Resolver, Severity};

#[test]
fn test_shared_library_selects_version_in_intersection() {
    // Three hosts embed libA at 1.0, 1.6 and 2.5; the requested ranges
    // intersect to [1.5,2.0), so 1.6 is the only viable candidate.
    let candidates = vec![
        archive("x.jar", "1.0")
            .providing("x")
            .embedding("com.example", "libA", "[1.0,2.0)", archive("libA", "1.0").providing("libA")),
        archive("y.jar", "1.0")
            .providing("y")
            .embedding("com.example", "libA", "[1.5,3.0)", archive("libA", "1.6").providing("libA")),
        archive("z.jar", "1.0")
            .providing("z")
            .embedding("com.example", "libA", "[1.0,3.0)", archive("libA", "2.5").providing("libA")),
    ];

    let (_dir, resolver) = engine();
    let resolution = resolver.resolve(candidates);

    assert!(resolution.success(), "issues: {:?}", resolution.issues());
    let lib = resolution
        .components()
        .iter()
        .find(|component| component.id() == "libA")
        .expect("libA selected and merged");
    assert_eq!(lib.version(), &ver("1.6"));
}

#[test]
fn test_intersection_without_candidate_fails_with_requests() {
    let candidates = vec![
        archive("x.jar", "1.0")
            .providing("x")
            .embedding("com.example", "libA", "[1.0,2.0)", archive("libA", "1.0")),
        archive("y.jar", "1.0")
            .providing("y")
            .embedding("com.example", "libA", "[1.5,3.0)", archive("libA", "2.5")),
    ];

    let (_dir, resolver) = engine();
    let resolution = resolver.resolve(candidates);

    assert!(!resolution.success());
    let errors: Vec<_> = resolution.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message_key(), "no-matching-jar");
    match errors[0].detail() {
        IssueDetail::NoMatchingJar { requests, .. } => {
            assert_eq!(requests.len(), 2);
            assert_eq!(requests[0].source, "x.jar");
            assert_eq!(requests[0].received, ver("1.0"));
            assert_eq!(requests[1].source, "y.jar");
            assert_eq!(requests[1].received, ver("2.5"));
        }
        other => panic!("unexpected issue detail: {:?}", other),
    }
}

#[test]
fn test_disjoint_requests_fail_resolution() {
    let candidates = vec![
        archive("x.jar", "1.0")
            .providing("x")
            .embedding("com.example", "libA", "[1.0,1.5)", archive("libA", "1.0")),
        archive("y.jar", "1.0")
            .providing("y")
            .embedding("com.example", "libA", "[2.0,3.0)", archive("libA", "2.5")),
    ];

    let (_dir, resolver) = engine();
    let resolution = resolver.resolve(candidates);

    assert!(!resolution.success());
    let errors: Vec<_> = resolution.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message_key(), "version-resolution-failed");
}

#[test]
fn test_explicit_candidate_shadows_nested_selection() {
    let candidates = vec![
        archive("libA", "3.0").providing("libA"),
        archive("host.jar", "1.0")
            .providing("host")
            .embedding("com.example", "libA", "[1.0,)", archive("libA", "1.0").providing("libA")),
    ];

    let (_dir, resolver) = engine();
    let resolution = resolver.resolve(candidates);

    // The explicit 3.0 wins; the nested 1.0 is dropped with a warning.
    assert!(resolution.success(), "issues: {:?}", resolution.issues());
    let warnings: Vec<_> = resolution.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].severity(), Severity::Warning);
    assert_eq!(warnings[0].message_key(), "nested-archive-shadowed");

    let lib = resolution
        .components()
        .iter()
        .find(|component| component.id() == "libA")
        .expect("explicit libA present");
    assert_eq!(lib.version(), &ver("3.0"));
}

#[test]
fn test_deeply_nested_archives_are_discovered() {
    let leaf = archive("leaf", "1.0").providing("leaf");
    let branch = archive("branch", "1.0")
        .providing("branch")
        .embedding("com.example", "leaf", "[1.0,)", leaf);
    let trunk = archive("trunk.jar", "1.0")
        .providing("trunk")
        .embedding("com.example", "branch", "[1.0,)", branch);

    let (_dir, resolver) = engine();
    let resolution = resolver.resolve(vec![trunk]);

    assert!(resolution.success(), "issues: {:?}", resolution.issues());
    let mut ids = resolution.ordered_ids();
    ids.sort_unstable();
    assert_eq!(ids, ["branch", "leaf", "trunk"]);
}

#[test]
fn test_extraction_cache_is_shared_across_runs() {
    let build = || {
        vec![archive("host.jar", "1.0")
            .providing("host")
            .embedding("com.example", "libA", "[1.0,)", archive("libA", "1.0").providing("libA"))]
    };

    let dir = tempfile::tempdir().unwrap();
    let cache = ExtractionCache::new(dir.path().join("extracted")).unwrap();
    let hash = ExtractionCache::hash_bytes(b"libA:1.0");

    let first = Resolver::new(cache.clone()).resolve(build());
    assert!(first.success());
    assert!(cache.contains(&hash), "first run populates the cache");

    // The second run over the same cache sees the entry and still selects.
    let second = Resolver::new(cache).resolve(build());
    assert!(second.success());
    assert_eq!(first.ordered_ids(), second.ordered_ids());
}
