mod helper;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use mnenv::config::{LOCAL_SOURCE_FILE, LOCAL_VERSION_FILE, Layout};
use mnenv::platform::Platform;
use mnenv::resolution::{NotInstalledError, Origin, ResolutionError, Resolver};

struct Fixture {
    _temp_dir: TempDir,
    layout: Layout,
    project: std::path::PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let layout = Layout::new(temp_dir.path().join("root"));
        let project = temp_dir.path().join("work").join("project");
        std::fs::create_dir_all(project.join("docs").join("drafts")).unwrap();
        Self {
            _temp_dir: temp_dir,
            layout,
            project,
        }
    }

    fn resolver(&self, cwd: &Path, env: &[(&str, &str)]) -> Resolver {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Resolver::new(self.layout.clone(), Arc::new(env), cwd)
    }
}

#[test]
fn environment_beats_local_marker_beats_global_file() {
    let fixture = Fixture::new();
    helper::install_version(&fixture.layout, "1.12.0", "gemfile", &[]);
    helper::install_version(&fixture.layout, "1.13.0", "gemfile", &[]);
    helper::install_version(&fixture.layout, "1.14.4", "binary", &[]);

    fixture
        .resolver(&fixture.project, &[])
        .set_global("1.12.0", "gemfile")
        .unwrap();
    let global = fixture.resolver(&fixture.project, &[]).resolve_version().unwrap();
    assert_eq!(global.value, "1.12.0");
    assert!(matches!(global.origin, Origin::GlobalFile(_)));

    fixture
        .resolver(&fixture.project, &[])
        .set_local(&fixture.project, "1.13.0", "gemfile")
        .unwrap();
    let nested = fixture.project.join("docs").join("drafts");
    let local = fixture.resolver(&nested, &[]).resolve_version().unwrap();
    assert_eq!(local.value, "1.13.0");
    assert_eq!(
        local.origin,
        Origin::LocalFile(fixture.project.join(LOCAL_VERSION_FILE))
    );

    let env = fixture
        .resolver(&nested, &[("MNENV_VERSION", "1.14.4"), ("MNENV_SOURCE", "binary")]);
    assert_eq!(env.resolve_version().unwrap().value, "1.14.4");
    assert_eq!(env.resolve_source().value, "binary");
    assert_eq!(env.resolve_source().origin, Origin::Environment);
}

#[test]
fn directories_outside_the_pinned_tree_use_the_global_value() {
    let fixture = Fixture::new();
    helper::install_version(&fixture.layout, "1.0.0", "gemfile", &[]);
    helper::install_version(&fixture.layout, "2.0.0", "gemfile", &[]);
    let resolver = fixture.resolver(&fixture.project, &[]);
    resolver.set_global("1.0.0", "gemfile").unwrap();
    resolver.set_local(&fixture.project, "2.0.0", "gemfile").unwrap();

    let inside = fixture.project.join("docs");
    let outside = fixture.project.parent().unwrap().join("other");
    std::fs::create_dir_all(&outside).unwrap();

    assert_eq!(
        fixture.resolver(&inside, &[]).resolve_version().unwrap().value,
        "2.0.0"
    );
    assert_eq!(
        fixture.resolver(&outside, &[]).resolve_version().unwrap().value,
        "1.0.0"
    );
}

#[test]
fn empty_values_fall_through_to_the_next_source() {
    let fixture = Fixture::new();
    std::fs::write(fixture.project.join(LOCAL_VERSION_FILE), "\n").unwrap();
    std::fs::write(fixture.project.join(LOCAL_SOURCE_FILE), "binary\n").unwrap();

    let resolver = fixture.resolver(&fixture.project, &[("MNENV_VERSION", "")]);

    assert!(matches!(
        resolver.resolve_version(),
        Err(ResolutionError::VersionNotSet)
    ));
    assert_eq!(resolver.resolve_source().value, "binary");
}

#[test]
fn source_defaults_to_gemfile() {
    let fixture = Fixture::new();

    let source = fixture.resolver(&fixture.project, &[]).resolve_source();

    assert_eq!(source.value, "gemfile");
    assert_eq!(source.origin, Origin::Default);
}

#[test]
fn legacy_source_name_matches_binary_installs() {
    let fixture = Fixture::new();
    helper::install_version(&fixture.layout, "1.14.4", "tebako", &[]);
    let resolver = fixture.resolver(&fixture.project, &[]);

    assert!(resolver.verify_installed("1.14.4", "binary").is_ok());
    assert_eq!(
        resolver
            .executable_path("1.14.4", "tebako", "metanorma", Platform::Windows)
            .unwrap(),
        fixture.layout.version_dir("1.14.4").unwrap().join("metanorma.exe")
    );
}

#[test]
fn selection_of_mismatched_source_is_refused() {
    let fixture = Fixture::new();
    helper::install_version(&fixture.layout, "1.14.4", "gemfile", &["metanorma"]);
    let resolver = fixture.resolver(&fixture.project, &[]);

    let err = resolver.set_global("1.14.4", "binary").unwrap_err();

    assert!(err.to_string().contains("--source gemfile"));
    assert!(!fixture.layout.global_version_file().exists());
    assert!(matches!(
        resolver.verify_installed("1.14.4", "binary"),
        Err(NotInstalledError::SourceMismatch { .. })
    ));
}
