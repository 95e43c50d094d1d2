//! Windows command prompt (batch files)

use std::path::{Path, PathBuf};

use crate::config::{SOURCE_ENV, VERSION_ENV};
use crate::shell::Shell;
use crate::shell::template::{self, escape_cmd};

pub struct CmdShell {
    root: PathBuf,
}

impl CmdShell {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl Shell for CmdShell {
    fn name(&self) -> &'static str {
        "cmd"
    }

    fn shim_extension(&self) -> &'static str {
        ".bat"
    }

    fn shim_body(&self, executable: &str) -> String {
        let body = template::render(
            template::CMD,
            &[
                ("ROOT", &escape_cmd(&self.root.to_string_lossy())),
                ("EXE", executable),
            ],
        );
        // Label lookup in batch files is unreliable with bare LF line endings
        body.replace("\r\n", "\n").replace('\n', "\r\n")
    }

    fn describe_activation(&self, version: &str, source: Option<&str>) -> String {
        let mut lines = vec![format!("set {VERSION_ENV}={version}")];
        if let Some(source) = source {
            lines.push(format!("set {SOURCE_ENV}={source}"));
        }
        lines.push("rem Run this in your CMD session".to_string());
        lines.join("\r\n")
    }

    fn config_file(&self) -> Option<PathBuf> {
        None
    }

    fn is_windows_family(&self) -> bool {
        true
    }
}
