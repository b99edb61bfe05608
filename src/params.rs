//! Parameter files.
//!
//! Build actions can exceed platform command-length limits, so arguments are
//! passed through files in Bazel's "shell" format: one argument per line.
//! An argument may be wrapped in single quotes; inside quotes every byte is
//! literal (newlines included) except the quote itself, written as `'\''`.
//! Outside quotes a backslash escapes the next byte.

use std::fs;
use std::path::Path;

use crate::error::{BuilderError, Result};

/// Prefix of the flag form used when invoking the analyzer.
pub const PARAM_FLAG_PREFIX: &str = "-param=";

/// Replace every `@file` or `-param=file` argument with the arguments stored
/// in that file. Expansion is not recursive.
pub fn expand_args<I>(args: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = String>,
{
    let mut expanded = Vec::new();
    for arg in args {
        let params_path = arg
            .strip_prefix('@')
            .or_else(|| arg.strip_prefix(PARAM_FLAG_PREFIX));
        match params_path {
            Some(path) if !path.is_empty() => expanded.extend(read_params_file(Path::new(path))?),
            _ => expanded.push(arg),
        }
    }
    Ok(expanded)
}

/// Read and parse a parameter file.
pub fn read_params_file(path: &Path) -> Result<Vec<String>> {
    let data = fs::read(path).map_err(|e| BuilderError::io(path, e))?;
    parse_params(&data).map_err(|msg| {
        BuilderError::Argument(format!("error reading params file {}: {}", path.display(), msg))
    })
}

/// Parse parameter file content.
pub fn parse_params(data: &[u8]) -> std::result::Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut arg: Vec<u8> = Vec::new();
    let mut quote = false;
    let mut escape = false;

    for &b in data {
        if escape {
            arg.push(b);
            escape = false;
        } else if b == b'\'' {
            quote = !quote;
        } else if !quote && b == b'\\' {
            escape = true;
        } else if !quote && b == b'\n' {
            args.push(String::from_utf8_lossy(&arg).into_owned());
            arg.clear();
        } else {
            arg.push(b);
        }
    }

    if quote {
        return Err("unterminated quote".to_string());
    }
    if escape {
        return Err("unterminated escape".to_string());
    }
    if !arg.is_empty() {
        args.push(String::from_utf8_lossy(&arg).into_owned());
    }
    Ok(args)
}

/// Format arguments in the shell parameter-file format.
pub fn format_params(args: &[String]) -> String {
    let mut buf = String::new();
    for arg in args {
        if !arg.contains(['\'', '\n', '\\']) {
            buf.push_str(arg);
            buf.push('\n');
            continue;
        }
        buf.push('\'');
        for c in arg.chars() {
            if c == '\'' {
                buf.push_str(r"'\''");
            } else {
                buf.push(c);
            }
        }
        buf.push_str("'\n");
    }
    buf
}

/// Write arguments to a parameter file.
pub fn write_params_file(path: &Path, args: &[String]) -> Result<()> {
    fs::write(path, format_params(args)).map_err(|e| BuilderError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_plain_lines() {
        let args = parse_params(b"-p\nexample.com/foo\n-x\nout.facts\n").unwrap();
        assert_eq!(args, vec!["-p", "example.com/foo", "-x", "out.facts"]);
    }

    #[test]
    fn test_parse_without_trailing_newline() {
        let args = parse_params(b"a\nb").unwrap();
        assert_eq!(args, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_quoted_argument_keeps_newline() {
        let args = parse_params(b"'two\nlines'\nnext\n").unwrap();
        assert_eq!(args, vec!["two\nlines", "next"]);
    }

    #[test]
    fn test_parse_escaped_quote() {
        let args = parse_params(br"'it'\''s'").unwrap();
        assert_eq!(args, vec!["it's"]);
    }

    #[test]
    fn test_parse_unterminated() {
        assert_eq!(parse_params(b"'open").unwrap_err(), "unterminated quote");
        assert_eq!(parse_params(b"trailing\\").unwrap_err(), "unterminated escape");
    }

    #[test]
    fn test_format_quotes_only_when_needed() {
        let args = vec![
            "-fact".to_string(),
            "a=b".to_string(),
            "don't".to_string(),
            r"C:\dir".to_string(),
        ];
        let formatted = format_params(&args);
        assert_eq!(formatted, "-fact\na=b\n'don'\\''t'\n'C:\\dir'\n");
        assert_eq!(parse_params(formatted.as_bytes()).unwrap(), args);
    }

    #[test]
    fn test_expand_args_reads_both_forms() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first.params");
        let second = temp.path().join("second.params");
        std::fs::write(&first, "-src\na.go\n").unwrap();
        std::fs::write(&second, "-out_facts\nf.facts\n").unwrap();

        let args = vec![
            "nogo".to_string(),
            format!("@{}", first.display()),
            format!("-param={}", second.display()),
            "-v".to_string(),
        ];
        let expanded = expand_args(args).unwrap();
        assert_eq!(
            expanded,
            vec!["nogo", "-src", "a.go", "-out_facts", "f.facts", "-v"]
        );
    }

    #[test]
    fn test_expand_args_missing_file() {
        let err = expand_args(vec!["@/nonexistent/params".to_string()]).unwrap_err();
        assert!(matches!(err, BuilderError::Io { .. }));
    }
}
