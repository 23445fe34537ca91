//! 오케스트레이터 end-to-end 테스트

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use contraband_core::config::{ContentCheckConfig, FilenameCheckConfig};
use contraband_core::{FileRef, IssueSource, WarningKind};
use contraband_matcher::MatcherCache;
use contraband_scanner::{ScanOrchestrator, ScannerConfigBuilder, ScannerError};

fn content_check(name: &str, keywords: &[&str], scope: &str) -> ContentCheckConfig {
    ContentCheckConfig {
        name: name.to_owned(),
        reason: format!("{name} violation"),
        keywords: keywords.iter().map(|k| (*k).to_owned()).collect(),
        include: Vec::new(),
        exclude: Vec::new(),
        scope: scope.to_owned(),
    }
}

fn orchestrator(checks: Vec<ContentCheckConfig>) -> ScanOrchestrator {
    let config = ScannerConfigBuilder::new()
        .content_checks(checks)
        .filename_checks(Vec::new())
        .worker_count(4)
        .build()
        .unwrap();
    ScanOrchestrator::new(config, Arc::new(MatcherCache::new())).unwrap()
}

fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    let options =
        zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap();
}

fn tar_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *data).unwrap();
    }
    builder.into_inner().unwrap()
}

fn file_ref(path: &Path, root: &Path) -> FileRef {
    FileRef::from_path(path, root).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn zip_with_password_note_yields_exactly_one_issue() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("release.zip");
    write_zip(&path, &[("notes.txt", b"my password123")]);

    let report = orchestrator(vec![content_check("credentials", &["password"], "file")])
        .scan(dir.path(), vec![file_ref(&path, dir.path())])
        .await
        .unwrap();

    assert_eq!(report.issues.len(), 1);
    let issue = &report.issues[0];
    assert_eq!(issue.check, "credentials");
    assert_eq!(issue.location, "notes.txt");
    assert_eq!(issue.source, IssueSource::File);
    assert_eq!(issue.matched, BTreeSet::from(["password".to_owned()]));
    assert!(report.warnings.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn mixed_plain_files_and_archives() {
    let dir = tempfile::tempdir().unwrap();
    let plain = dir.path().join("settings.env");
    std::fs::write(&plain, b"API_KEY=abc\nPASSWORD=xyz\n").unwrap();
    let clean = dir.path().join("README.md");
    std::fs::write(&clean, b"nothing to report").unwrap();
    let zip = dir.path().join("bundle.zip");
    write_zip(
        &zip,
        &[("a.txt", b"Password: hunter2"), ("b.txt", b"harmless"), ("c.txt", b"api_key")],
    );

    let files = vec![
        file_ref(&plain, dir.path()),
        file_ref(&clean, dir.path()),
        file_ref(&zip, dir.path()),
    ];
    let report = orchestrator(vec![content_check("credentials", &["password", "api_key"], "file")])
        .scan(dir.path(), files)
        .await
        .unwrap();

    assert_eq!(report.files_scanned, 3);
    assert_eq!(report.entries_scanned, 3);
    let locations: BTreeSet<_> = report.issues.iter().map(|i| i.location.as_str()).collect();
    assert_eq!(locations, BTreeSet::from(["settings.env", "a.txt", "c.txt"]));

    let env_issue = report
        .issues
        .iter()
        .find(|i| i.location == "settings.env")
        .unwrap();
    assert_eq!(
        env_issue.matched,
        BTreeSet::from(["api_key".to_owned(), "password".to_owned()])
    );
    assert!(env_issue.archive.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn repository_scope_aggregates_into_one_issue() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    std::fs::write(&a, b"uses internal.corp endpoint").unwrap();
    std::fs::write(&b, b"also internal.corp and staging.corp").unwrap();

    let report = orchestrator(vec![content_check(
        "internal-hosts",
        &["internal.corp", "staging.corp"],
        "repository",
    )])
    .scan(dir.path(), vec![file_ref(&a, dir.path()), file_ref(&b, dir.path())])
    .await
    .unwrap();

    assert_eq!(report.issues.len(), 1);
    let issue = &report.issues[0];
    assert_eq!(issue.source, IssueSource::Repository);
    assert_eq!(issue.location, dir.path().display().to_string());
    assert_eq!(
        issue.matched,
        BTreeSet::from(["internal.corp".to_owned(), "staging.corp".to_owned()])
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn truncated_tar_is_reported_as_warning() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.tar");
    let mut bytes = tar_bytes(&[("one.txt", b"password one"), ("two.txt", b"password two")]);
    bytes[1024] ^= 0xff;
    std::fs::write(&path, &bytes).unwrap();

    let report = orchestrator(vec![content_check("credentials", &["password"], "file")])
        .scan(dir.path(), vec![file_ref(&path, dir.path())])
        .await
        .unwrap();

    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].location, "one.txt");
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::ArchiveTruncated);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn corrupt_zip_entry_is_warning_and_scan_continues() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.zip");
    let marker = b"password CORRUPT-ME-PLEASE";
    write_zip(
        &path,
        &[("bad.txt", marker), ("good.txt", b"password fine")],
    );
    let mut bytes = std::fs::read(&path).unwrap();
    let pos = bytes.windows(marker.len()).position(|w| w == marker).unwrap();
    bytes[pos + marker.len() - 1] ^= 0x20;
    std::fs::write(&path, &bytes).unwrap();

    let report = orchestrator(vec![content_check("credentials", &["password"], "file")])
        .scan(dir.path(), vec![file_ref(&path, dir.path())])
        .await
        .unwrap();

    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].location, "good.txt");
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::EntryRead);
    assert!(report.warnings[0].location.ends_with("bad.txt"));
}

#[tokio::test]
async fn unopenable_archive_is_warning() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fake.zip");
    std::fs::write(&path, b"not really a zip").unwrap();

    let report = orchestrator(vec![content_check("credentials", &["password"], "file")])
        .scan(dir.path(), vec![file_ref(&path, dir.path())])
        .await
        .unwrap();
    assert!(report.issues.is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::ArchiveOpen);
}

#[tokio::test]
async fn include_rules_limit_content_checks() {
    let dir = tempfile::tempdir().unwrap();
    let zip = dir.path().join("docs.zip");
    write_zip(&zip, &[("guide.md", b"password"), ("main.rs", b"password")]);

    let mut check = content_check("docs-only", &["password"], "file");
    check.include = vec!["*.md".to_owned()];
    let report = orchestrator(vec![check])
        .scan(dir.path(), vec![file_ref(&zip, dir.path())])
        .await
        .unwrap();
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].location, "guide.md");
    // main.rs에 적용되는 콘텐츠 검사가 없으므로 읽지 않음
    assert_eq!(report.entries_scanned, 1);
}

#[tokio::test]
async fn filename_checks_see_unread_archive_entries() {
    let dir = tempfile::tempdir().unwrap();
    let mut binary = vec![0x30, 0x82, 0x01, 0x00];
    binary.extend([0u8; 256]);
    std::fs::write(dir.path().join("server.p12"), &binary).unwrap();
    let zip = dir.path().join("bundle.zip");
    write_zip(
        &zip,
        &[
            ("keys/client.p12", binary.as_slice()),
            ("keys/empty.p12", b""),
            ("README.txt", b"nothing here"),
        ],
    );

    let config = ScannerConfigBuilder::new()
        .content_checks(vec![content_check("credentials", &["password"], "file")])
        .filename_checks(vec![FilenameCheckConfig {
            name: "pkcs12".to_owned(),
            reason: "PKCS#12 bundles must not ship".to_owned(),
            patterns: vec!["*.p12".to_owned()],
        }])
        .build()
        .unwrap();
    let orchestrator = ScanOrchestrator::new(config, Arc::new(MatcherCache::new())).unwrap();
    let files = vec![
        file_ref(&dir.path().join("server.p12"), dir.path()),
        file_ref(&zip, dir.path()),
    ];
    let report = orchestrator.scan(dir.path(), files).await.unwrap();

    let flagged: BTreeSet<(Option<String>, String)> = report
        .issues
        .iter()
        .filter(|i| i.check == "pkcs12")
        .map(|i| (i.archive.clone(), i.location.clone()))
        .collect();
    assert_eq!(
        flagged,
        BTreeSet::from([
            (None, "server.p12".to_owned()),
            (Some("bundle.zip".to_owned()), "keys/client.p12".to_owned()),
            (Some("bundle.zip".to_owned()), "keys/empty.p12".to_owned()),
        ])
    );
    // 텍스트 엔트리만 콘텐츠 스캔 대상
    assert_eq!(report.entries_scanned, 1);
}

#[tokio::test]
async fn invalid_configuration_fails_before_scanning() {
    let err = ScannerConfigBuilder::new()
        .content_checks(vec![content_check("empty", &["  "], "file")])
        .build()
        .map_err(|e| e.to_string())
        .and_then(|config| {
            ScanOrchestrator::new(config, Arc::new(MatcherCache::new())).map_err(|e| e.to_string())
        })
        .err()
        .unwrap();
    assert!(err.contains("keywords"));

    let err = ScanOrchestrator::new(
        ScannerConfigBuilder::new()
            .filename_checks(vec![FilenameCheckConfig {
                name: "bad-glob".to_owned(),
                reason: String::new(),
                patterns: vec!["[unclosed".to_owned()],
            }])
            .build()
            .unwrap(),
        Arc::new(MatcherCache::new()),
    )
    .err()
    .unwrap();
    assert!(matches!(err, ScannerError::Config { .. }));
}

#[tokio::test]
async fn cache_is_shared_across_orchestrators() {
    let cache = Arc::new(MatcherCache::new());
    let config = ScannerConfigBuilder::new()
        .content_checks(vec![content_check("credentials", &["password"], "file")])
        .build()
        .unwrap();
    let first = ScanOrchestrator::new(config.clone(), Arc::clone(&cache)).unwrap();
    let _second = ScanOrchestrator::new(config, Arc::clone(&cache)).unwrap();
    assert_eq!(cache.len(), 1);
    assert!(cache.hits() >= 1);
    assert!(Arc::ptr_eq(first.cache(), &cache));
}
