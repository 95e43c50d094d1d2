//! Token substitution for the shim script templates

pub const POSIX: &str = include_str!("templates/posix.sh");
pub const POWERSHELL: &str = include_str!("templates/powershell.ps1");
pub const CMD: &str = include_str!("templates/cmd.bat");

/// Replace every `{{NAME}}` token with its value
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{{{name}}}}}"), value)
    })
}

/// Single-quoted POSIX shell literal
pub fn quote_posix(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Single-quoted PowerShell literal
pub fn quote_powershell(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Value safe inside a double-quoted `set` in a batch file
pub fn escape_cmd(value: &str) -> String {
    value.replace('%', "%%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        DEFAULT_SOURCE, LEGACY_BINARY_SOURCE, LOCAL_SOURCE_FILE, LOCAL_VERSION_FILE, ROOT_ENV,
        SOURCE_ENV, VERSION_ENV,
    };
    use rstest::rstest;

    #[test]
    fn render_replaces_every_occurrence() {
        let result = render("{{EXE}} and {{EXE}} in {{ROOT}}", &[("EXE", "rake"), ("ROOT", "/r")]);
        assert_eq!(result, "rake and rake in /r");
    }

    #[rstest]
    #[case("/home/user/.mnenv", "'/home/user/.mnenv'")]
    #[case("/home/o'neil/.mnenv", r"'/home/o'\''neil/.mnenv'")]
    fn quote_posix_escapes_single_quotes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(quote_posix(input), expected);
    }

    #[test]
    fn quote_powershell_doubles_single_quotes() {
        assert_eq!(
            quote_powershell(r"C:\Users\o'neil\.mnenv"),
            r"'C:\Users\o''neil\.mnenv'"
        );
    }

    #[test]
    fn escape_cmd_doubles_percent_signs() {
        assert_eq!(escape_cmd(r"C:\100%\.mnenv"), r"C:\100%%\.mnenv");
    }

    #[rstest]
    #[case(POSIX)]
    #[case(POWERSHELL)]
    #[case(CMD)]
    fn templates_embed_the_configured_names(#[case] template: &str) {
        for name in [
            ROOT_ENV,
            VERSION_ENV,
            SOURCE_ENV,
            LOCAL_VERSION_FILE,
            LOCAL_SOURCE_FILE,
            DEFAULT_SOURCE,
            LEGACY_BINARY_SOURCE,
        ] {
            assert!(template.contains(name), "template is missing {name}");
        }
        assert!(template.contains("{{EXE}}"));
        assert!(template.contains("{{ROOT}}"));
    }
}
