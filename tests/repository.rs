mod helper;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use mnenv::clock::Clock;
use mnenv::version::model::{ChocolateyVersion, GemfileVersion, SnapVersion, VersionRecord};
use mnenv::version::repository::{FILE_NAME, Repository};

#[test]
fn saved_records_survive_reopening() {
    let temp_dir = TempDir::new().unwrap();
    let published = Utc.with_ymd_and_hms(2024, 11, 4, 8, 15, 0).unwrap();

    let mut repository = Repository::<GemfileVersion>::open(temp_dir.path(), helper::clock()).unwrap();
    repository
        .save(
            GemfileVersion::new("1.14.4")
                .with_archive(true)
                .with_published_at(published)
                .with_parsed_at(helper::clock().now()),
        )
        .unwrap();
    let saved = repository.find("1.14.4").cloned().unwrap();

    let reopened = Repository::<GemfileVersion>::open(temp_dir.path(), helper::clock()).unwrap();

    assert_eq!(reopened.count(), 1);
    assert_eq!(reopened.find("1.14.4"), Some(&saved));
    assert_eq!(reopened.find("1.14.4").unwrap().published_at(), Some(published));
}

#[test]
fn persisted_document_carries_derived_metadata() {
    let temp_dir = TempDir::new().unwrap();
    let mut repository =
        Repository::<ChocolateyVersion>::open(temp_dir.path(), helper::clock()).unwrap();
    repository
        .save_all([
            ChocolateyVersion::new("1.9.0", false),
            ChocolateyVersion::new("1.10.2", false),
        ])
        .unwrap();

    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(temp_dir.path().join(FILE_NAME)).unwrap())
            .unwrap();

    assert_eq!(document["metadata"]["generated_at"], "2025-03-01T09:30:00Z");
    assert_eq!(document["metadata"]["source"], "chocolatey");
    assert_eq!(document["metadata"]["count"], 2);
    assert_eq!(document["metadata"]["latest_version"], "1.10.2");
    assert_eq!(document["versions"][0]["version"], "1.9.0");
    assert_eq!(document["versions"][1]["version"], "1.10.2");
}

#[test]
fn listing_is_numeric_and_latest_is_highest() {
    let temp_dir = TempDir::new().unwrap();
    let mut repository = Repository::<GemfileVersion>::open(temp_dir.path(), helper::clock()).unwrap();
    repository
        .save_all(["1.2.3", "1.10.0", "1.2.10"].map(GemfileVersion::new))
        .unwrap();

    let versions: Vec<&str> = repository.all().into_iter().map(|r| r.version()).collect();

    assert_eq!(versions, ["1.2.3", "1.2.10", "1.10.0"]);
    assert_eq!(repository.latest().unwrap().version(), "1.10.0");
}

#[test]
fn snap_entries_sharing_a_version_coexist() {
    let temp_dir = TempDir::new().unwrap();
    let mut repository = Repository::<SnapVersion>::open(temp_dir.path(), helper::clock()).unwrap();
    repository
        .save_all([
            SnapVersion::new("1.14.4", Some(312), "amd64", "stable"),
            SnapVersion::new("1.14.4", Some(313), "arm64", "stable"),
            SnapVersion::new("1.14.4", Some(312), "amd64", "stable"),
        ])
        .unwrap();

    assert_eq!(repository.count(), 2);
    assert_eq!(repository.find_all_by_version("1.14.4").len(), 2);
    assert!(
        repository
            .find_exact("1.14.4", Some(313), "arm64", "stable")
            .is_some()
    );
    assert!(
        repository
            .find_exact("1.14.4", Some(313), "amd64", "stable")
            .is_none()
    );
}

#[test]
fn corrupt_store_reports_how_to_rebuild() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join(FILE_NAME), "{ not json").unwrap();

    let err = Repository::<GemfileVersion>::open(temp_dir.path(), helper::clock())
        .err()
        .unwrap();

    assert!(err.to_string().contains("revamp"));
}
