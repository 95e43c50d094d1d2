//! Shell adapters: shim rendering and activation hints per shell dialect

pub mod cmd;
pub mod posix;
pub mod powershell;
pub mod template;

pub use cmd::CmdShell;
pub use posix::PosixShell;
pub use powershell::PowerShellShell;

use std::path::{Path, PathBuf};

use crate::platform::Platform;
use crate::resolution::Environment;

/// Capabilities every shell dialect provides
pub trait Shell: Send + Sync {
    fn name(&self) -> &'static str;

    /// Extension of shim files, including the dot (empty for POSIX)
    fn shim_extension(&self) -> &'static str;

    /// Script that resolves the active version and runs `executable` from it
    fn shim_body(&self, executable: &str) -> String;

    /// Commands that pin `version` (and `source`) for the current session
    fn describe_activation(&self, version: &str, source: Option<&str>) -> String;

    /// Startup file users add activation lines to
    fn config_file(&self) -> Option<PathBuf>;

    fn is_windows_family(&self) -> bool;

    fn shim_file_name(&self, executable: &str) -> String {
        format!("{executable}{}", self.shim_extension())
    }
}

/// Known shells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    Bash,
    Zsh,
    Fish,
    Sh,
    PowerShell,
    Cmd,
}

impl ShellKind {
    /// Shell for a program name or path such as `/usr/bin/zsh` or `pwsh.exe`
    pub fn from_name(name: &str) -> Option<Self> {
        let base = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(name)
            .to_ascii_lowercase();
        let base = base.strip_suffix(".exe").unwrap_or(&base);
        match base {
            "bash" => Some(ShellKind::Bash),
            "zsh" => Some(ShellKind::Zsh),
            "fish" => Some(ShellKind::Fish),
            "sh" | "dash" => Some(ShellKind::Sh),
            "powershell" | "pwsh" => Some(ShellKind::PowerShell),
            "cmd" => Some(ShellKind::Cmd),
            _ => None,
        }
    }

    /// Shell the user is running, from `$SHELL` or `%COMSPEC%`
    pub fn detect(env: &dyn Environment, platform: Platform) -> Self {
        let shell = env
            .var("SHELL")
            .filter(|s| !s.is_empty())
            .or_else(|| env.var("COMSPEC"))
            .unwrap_or_default();

        if platform.is_windows() {
            let lower = shell.to_ascii_lowercase();
            if lower.contains("powershell") || lower.contains("pwsh") {
                ShellKind::PowerShell
            } else {
                ShellKind::Cmd
            }
        } else {
            ShellKind::from_name(&shell).unwrap_or(ShellKind::Sh)
        }
    }

    pub fn adapter(self, root: &Path, home: Option<&Path>) -> Box<dyn Shell> {
        match self {
            ShellKind::Bash | ShellKind::Zsh | ShellKind::Fish | ShellKind::Sh => {
                Box::new(PosixShell::new(root, home, self))
            }
            ShellKind::PowerShell => Box::new(PowerShellShell::new(root, home)),
            ShellKind::Cmd => Box::new(CmdShell::new(root)),
        }
    }
}

/// Adapters shims are written for on `platform`
pub fn platform_shells(platform: Platform, root: &Path) -> Vec<Box<dyn Shell>> {
    if platform.is_windows() {
        vec![
            Box::new(PowerShellShell::new(root, None)),
            Box::new(CmdShell::new(root)),
        ]
    } else {
        vec![Box::new(PosixShell::new(root, None, ShellKind::Sh))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> HashMap<String, String> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[rstest]
    #[case("/bin/bash", Some(ShellKind::Bash))]
    #[case("/usr/local/bin/zsh", Some(ShellKind::Zsh))]
    #[case("fish", Some(ShellKind::Fish))]
    #[case("/bin/dash", Some(ShellKind::Sh))]
    #[case("pwsh.exe", Some(ShellKind::PowerShell))]
    #[case("CMD.EXE", Some(ShellKind::Cmd))]
    #[case("/usr/bin/nu", None)]
    fn from_name_maps_program_names(#[case] name: &str, #[case] expected: Option<ShellKind>) {
        assert_eq!(ShellKind::from_name(name), expected);
    }

    #[rstest]
    #[case(&[("SHELL", "/bin/zsh")], Platform::Linux, ShellKind::Zsh)]
    #[case(&[("SHELL", "/usr/bin/elvish")], Platform::MacOs, ShellKind::Sh)]
    #[case(&[], Platform::Linux, ShellKind::Sh)]
    #[case(&[("COMSPEC", r"C:\Windows\system32\cmd.exe")], Platform::Windows, ShellKind::Cmd)]
    #[case(
        &[("COMSPEC", r"C:\Program Files\PowerShell\7\pwsh.exe")],
        Platform::Windows,
        ShellKind::PowerShell
    )]
    fn detect_uses_shell_or_comspec(
        #[case] vars: &[(&str, &str)],
        #[case] platform: Platform,
        #[case] expected: ShellKind,
    ) {
        assert_eq!(ShellKind::detect(&env(vars), platform), expected);
    }

    #[test]
    fn platform_shells_cover_both_windows_dialects() {
        let root = Path::new("/r");

        let windows: Vec<_> = platform_shells(Platform::Windows, root)
            .iter()
            .map(|s| s.shim_extension())
            .collect();
        let unix: Vec<_> = platform_shells(Platform::Linux, root)
            .iter()
            .map(|s| s.shim_extension())
            .collect();

        assert_eq!(windows, vec![".ps1", ".bat"]);
        assert_eq!(unix, vec![""]);
    }
}
