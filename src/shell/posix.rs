//! POSIX shells (sh, dash, bash, zsh, fish)

use std::path::{Path, PathBuf};

use crate::config::{SOURCE_ENV, TOOL_NAME, VERSION_ENV};
use crate::shell::template::{self, quote_posix};
use crate::shell::{Shell, ShellKind};

pub struct PosixShell {
    root: PathBuf,
    home: Option<PathBuf>,
    kind: ShellKind,
}

impl PosixShell {
    pub fn new(root: &Path, home: Option<&Path>, kind: ShellKind) -> Self {
        Self {
            root: root.to_path_buf(),
            home: home.map(Path::to_path_buf),
            kind,
        }
    }
}

impl Shell for PosixShell {
    fn name(&self) -> &'static str {
        match self.kind {
            ShellKind::Bash => "bash",
            ShellKind::Zsh => "zsh",
            ShellKind::Fish => "fish",
            _ => "sh",
        }
    }

    fn shim_extension(&self) -> &'static str {
        ""
    }

    fn shim_body(&self, executable: &str) -> String {
        template::render(
            template::POSIX,
            &[
                ("ROOT", &quote_posix(&self.root.to_string_lossy())),
                ("EXE", executable),
            ],
        )
    }

    fn describe_activation(&self, version: &str, source: Option<&str>) -> String {
        let mut lines = Vec::new();
        let mut use_command = format!("{TOOL_NAME} use {version}");
        if let Some(source) = source {
            use_command.push_str(&format!(" --source {source}"));
        }

        if self.kind == ShellKind::Fish {
            lines.push(format!("set -gx {VERSION_ENV} {}", quote_posix(version)));
            if let Some(source) = source {
                lines.push(format!("set -gx {SOURCE_ENV} {}", quote_posix(source)));
            }
            lines.push(format!(
                "# Run this in your shell, or use: {use_command} | source"
            ));
        } else {
            lines.push(format!("export {VERSION_ENV}={}", quote_posix(version)));
            if let Some(source) = source {
                lines.push(format!("export {SOURCE_ENV}={}", quote_posix(source)));
            }
            lines.push(format!(
                "# Run this in your shell, or use: eval \"$({use_command})\""
            ));
        }
        lines.join("\n")
    }

    fn config_file(&self) -> Option<PathBuf> {
        let home = self.home.as_ref()?;
        Some(match self.kind {
            ShellKind::Bash => home.join(".bashrc"),
            ShellKind::Zsh => home.join(".zshrc"),
            ShellKind::Fish => home.join(".config").join("fish").join("config.fish"),
            _ => home.join(".profile"),
        })
    }

    fn is_windows_family(&self) -> bool {
        false
    }
}
