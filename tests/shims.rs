mod helper;

use std::collections::BTreeMap;
use std::path::Path;

use tempfile::TempDir;

use mnenv::config::Layout;
use mnenv::install::{UninstallOutcome, uninstall};
use mnenv::platform::Platform;
use mnenv::shim::ShimManager;

fn snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap())
        .map(|entry| {
            (
                entry.file_name().into_string().unwrap(),
                std::fs::read(entry.path()).unwrap(),
            )
        })
        .collect()
}

#[test]
fn regeneration_is_byte_identical() {
    let temp_dir = TempDir::new().unwrap();
    let layout = Layout::new(temp_dir.path());
    helper::install_version(&layout, "1.13.0", "gemfile", &["metanorma.cmd", "bundle.cmd"]);
    helper::install_version(&layout, "1.14.4", "binary", &[]);
    let shims = ShimManager::new(layout.clone(), Platform::Windows);

    shims.regenerate_all().unwrap();
    let first = snapshot(&shims.shims_dir());
    let report = shims.regenerate_all().unwrap();
    let second = snapshot(&shims.shims_dir());

    assert_eq!(first, second);
    assert!(report.removed.is_empty());
    assert_eq!(
        first.keys().map(String::as_str).collect::<Vec<_>>(),
        [
            "bundle.bat",
            "bundle.ps1",
            "metanorma.bat",
            "metanorma.ps1"
        ]
    );
}

#[test]
fn uninstalling_the_only_provider_removes_its_shims() {
    let temp_dir = TempDir::new().unwrap();
    let layout = Layout::new(temp_dir.path());
    helper::install_version(&layout, "1.13.0", "gemfile", &["metanorma.cmd"]);
    helper::install_version(&layout, "1.14.4", "gemfile", &["metanorma.cmd", "relaton.cmd"]);
    let shims = ShimManager::new(layout.clone(), Platform::Windows);
    shims.regenerate_all().unwrap();

    let outcome = uninstall(&layout, "1.14.4", &shims).unwrap();

    let UninstallOutcome::Removed(report) = outcome else {
        panic!("expected removal, got {outcome:?}");
    };
    assert_eq!(report.removed.len(), 2);
    let remaining = snapshot(&shims.shims_dir());
    assert!(remaining.contains_key("metanorma.bat"));
    assert!(!remaining.contains_key("relaton.bat"));
    assert!(!remaining.contains_key("relaton.ps1"));
}

#[cfg(unix)]
#[test]
fn posix_shims_are_executable_scripts() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let layout = Layout::new(temp_dir.path());
    helper::install_version(&layout, "1.14.4", "gemfile", &["metanorma"]);
    std::fs::write(layout.version_dir("1.14.4").unwrap().join("bin").join("notes.txt"), "").unwrap();
    let shims = ShimManager::new(layout.clone(), Platform::Linux);

    let report = shims.regenerate_all().unwrap();

    assert_eq!(report.written, [shims.shims_dir().join("metanorma")]);
    let shim = shims.shims_dir().join("metanorma");
    let mode = std::fs::metadata(&shim).unwrap().permissions().mode();
    assert_eq!(mode & 0o111, 0o111);
    assert!(std::fs::read_to_string(&shim).unwrap().starts_with("#!"));
}

#[cfg(unix)]
fn run_shim(shim: &Path, cwd: &Path, vars: &[(&str, &str)]) -> std::process::Output {
    std::process::Command::new("sh")
        .arg(shim)
        .env_clear()
        .env("PATH", "/usr/bin:/bin")
        .envs(vars.iter().copied())
        .current_dir(cwd)
        .output()
        .unwrap()
}

#[cfg(unix)]
#[test]
fn posix_shim_resolves_version_in_priority_order() {
    use mnenv::config::LOCAL_VERSION_FILE;

    let temp_dir = TempDir::new().unwrap();
    let layout = Layout::new(temp_dir.path().join("root"));
    for version in ["1.0.0", "2.0.0", "3.0.0"] {
        helper::install_version(&layout, version, "gemfile", &[]);
        let executable = layout.version_dir(version).unwrap().join("bin").join("metanorma");
        std::fs::write(&executable, format!("#!/bin/sh\necho {version}\n")).unwrap();
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&executable, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
    let shims = ShimManager::new(layout.clone(), Platform::Linux);
    shims.regenerate_all().unwrap();
    let shim = shims.shims_dir().join("metanorma");

    let project = temp_dir.path().join("project");
    let nested = project.join("a").join("b").join("c");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(project.join(LOCAL_VERSION_FILE), "2.0.0\n").unwrap();
    std::fs::write(layout.global_version_file(), "3.0.0\n").unwrap();

    let output = run_shim(&shim, &nested, &[("MNENV_VERSION", "1.0.0")]);
    assert_eq!(String::from_utf8_lossy(&output.stdout), "1.0.0\n");

    let output = run_shim(&shim, &nested, &[]);
    assert_eq!(String::from_utf8_lossy(&output.stdout), "2.0.0\n");

    std::fs::remove_file(project.join(LOCAL_VERSION_FILE)).unwrap();
    let output = run_shim(&shim, &nested, &[]);
    assert_eq!(String::from_utf8_lossy(&output.stdout), "3.0.0\n");

    std::fs::remove_file(layout.global_version_file()).unwrap();
    let output = run_shim(&shim, &nested, &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no metanorma version set"));
}
