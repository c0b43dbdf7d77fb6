//! Shell quoting helpers.
//!
//! Every command deckhand sends over the wire is assembled from configuration
//! values; these helpers keep interpolated values from being interpreted by
//! the remote shell.

/// Escape a value for use inside single quotes.
/// Replaces `'` with `'\''` (end quote, escaped quote, start quote).
pub fn escape_single_quote_content(value: &str) -> String {
    value.replace('\'', "'\\''")
}

/// Quote a single argument for shell execution.
/// - Empty strings become `''`
/// - Strings with shell metacharacters are wrapped in single quotes
/// - Embedded single quotes are escaped
/// - Plain strings pass through untouched
pub fn quote_arg(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }

    const SHELL_META: &[char] = &[
        ' ', '\t', '\n', '\'', '"', '\\', '$', '`', '!', '*', '?', '[', ']', '(', ')', '{', '}',
        '<', '>', '|', '&', ';', '#', '~',
    ];

    if !arg.contains(SHELL_META) {
        return arg.to_string();
    }

    format!("'{}'", escape_single_quote_content(arg))
}

/// Quote and join multiple arguments for shell execution.
pub fn quote_args(args: &[String]) -> String {
    args.iter()
        .map(|a| quote_arg(a))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quote a path for shell execution (always quotes).
pub fn quote_path(path: &str) -> String {
    format!("'{}'", escape_single_quote_content(path))
}

/// Escape an entire command string for `sh -c` execution.
/// Use this when passing a complete command (with operators) to sh -c,
/// e.g. when wrapping a composed command in `sudo ... sh -c '...'`.
pub fn escape_command_for_shell(command: &str) -> String {
    format!("'{}'", escape_single_quote_content(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_arg_plain() {
        assert_eq!(quote_arg("master"), "master");
        assert_eq!(quote_arg("/envs/site/bin/activate"), "/envs/site/bin/activate");
    }

    #[test]
    fn quote_arg_with_spaces() {
        assert_eq!(quote_arg("two words"), "'two words'");
    }

    #[test]
    fn quote_arg_with_single_quote() {
        assert_eq!(quote_arg("it's"), "'it'\\''s'");
    }

    #[test]
    fn quote_arg_empty() {
        assert_eq!(quote_arg(""), "''");
    }

    #[test]
    fn quote_path_always_quotes() {
        assert_eq!(quote_path("/var/www"), "'/var/www'");
        assert_eq!(quote_path("/srv/it's"), "'/srv/it'\\''s'");
    }

    #[test]
    fn quote_args_mixed() {
        let args = vec!["migrate".to_string(), "--fake initial".to_string()];
        assert_eq!(quote_args(&args), "migrate '--fake initial'");
    }

    #[test]
    fn escape_command_wraps_operators() {
        assert_eq!(
            escape_command_for_shell("cd /srv && ls"),
            "'cd /srv && ls'"
        );
    }
}
