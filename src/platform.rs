//! Host platform detection

/// Operating system family the shims and installers target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Other
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Windows)
    }

    /// Suffix used by the packed release assets (`metanorma-<suffix>`)
    pub fn asset_suffix(&self) -> Option<&'static str> {
        match self {
            Platform::Linux => Some("linux"),
            Platform::MacOs => Some("macos"),
            Platform::Windows => Some("windows"),
            Platform::Other => None,
        }
    }

    /// File name of the self-contained product executable
    pub fn product_executable(&self, product: &str) -> String {
        if self.is_windows() {
            format!("{product}.exe")
        } else {
            product.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Platform::Linux, Some("linux"))]
    #[case(Platform::MacOs, Some("macos"))]
    #[case(Platform::Windows, Some("windows"))]
    #[case(Platform::Other, None)]
    fn asset_suffix_returns_expected(#[case] platform: Platform, #[case] expected: Option<&str>) {
        assert_eq!(platform.asset_suffix(), expected);
    }

    #[rstest]
    #[case(Platform::Linux, "metanorma")]
    #[case(Platform::MacOs, "metanorma")]
    #[case(Platform::Windows, "metanorma.exe")]
    fn product_executable_appends_exe_on_windows(
        #[case] platform: Platform,
        #[case] expected: &str,
    ) {
        assert_eq!(platform.product_executable("metanorma"), expected);
    }
}
