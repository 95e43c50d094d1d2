//! PowerShell (Windows PowerShell and pwsh)

use std::path::{Path, PathBuf};

use crate::config::{SOURCE_ENV, TOOL_NAME, VERSION_ENV};
use crate::shell::Shell;
use crate::shell::template::{self, quote_powershell};

pub struct PowerShellShell {
    root: PathBuf,
    home: Option<PathBuf>,
}

impl PowerShellShell {
    pub fn new(root: &Path, home: Option<&Path>) -> Self {
        Self {
            root: root.to_path_buf(),
            home: home.map(Path::to_path_buf),
        }
    }
}

impl Shell for PowerShellShell {
    fn name(&self) -> &'static str {
        "powershell"
    }

    fn shim_extension(&self) -> &'static str {
        ".ps1"
    }

    fn shim_body(&self, executable: &str) -> String {
        template::render(
            template::POWERSHELL,
            &[
                ("ROOT", &quote_powershell(&self.root.to_string_lossy())),
                ("EXE", executable),
            ],
        )
    }

    fn describe_activation(&self, version: &str, source: Option<&str>) -> String {
        let mut lines = vec![format!("$env:{VERSION_ENV} = {}", quote_powershell(version))];
        let mut use_command = format!("{TOOL_NAME} use {version}");
        if let Some(source) = source {
            lines.push(format!("$env:{SOURCE_ENV} = {}", quote_powershell(source)));
            use_command.push_str(&format!(" --source {source}"));
        }
        lines.push(format!(
            "# Run this in your PowerShell session, or use: {use_command} | Invoke-Expression"
        ));
        lines.join("\n")
    }

    fn config_file(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|home| {
            home.join("Documents")
                .join("PowerShell")
                .join("Microsoft.PowerShell_profile.ps1")
        })
    }

    fn is_windows_family(&self) -> bool {
        true
    }
}
