//! Compiled dependency references.

use std::path::PathBuf;
use std::str::FromStr;

/// A compiled unit available for analysis, declared with
/// `importpath[:alias...]=packagepath=file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    /// Import path the sources use
    pub import_path: String,
    /// Additional import paths resolving to the same archive
    pub aliases: Vec<String>,
    /// Package path (importmap) the archive was compiled as
    pub package_path: String,
    /// Location of the archive or fact file
    pub file: PathBuf,
}

impl Archive {
    /// All import paths this archive answers to, primary first.
    pub fn import_paths(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.import_path.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

impl FromStr for Archive {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('=').collect();
        if parts.len() != 3 {
            return Err(format!(
                "badly formed archive reference {:?}: want importpath=packagepath=file",
                s
            ));
        }
        let mut import_paths = parts[0].split(':').map(str::to_string);
        let import_path = import_paths.next().unwrap_or_default();
        if import_path.is_empty() || parts[2].is_empty() {
            return Err(format!(
                "badly formed archive reference {:?}: import path and file must be set",
                s
            ));
        }
        Ok(Archive {
            import_path,
            aliases: import_paths.filter(|a| !a.is_empty()).collect(),
            package_path: parts[1].to_string(),
            file: PathBuf::from(parts[2]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_archive() {
        let arc: Archive = "example.com/a=example.com/a=bazel-out/a.a".parse().unwrap();
        assert_eq!(arc.import_path, "example.com/a");
        assert!(arc.aliases.is_empty());
        assert_eq!(arc.package_path, "example.com/a");
        assert_eq!(arc.file, PathBuf::from("bazel-out/a.a"));
    }

    #[test]
    fn test_parse_archive_with_aliases() {
        let arc: Archive = "example.com/a:a:old/a=vendor/example.com/a=a.a".parse().unwrap();
        assert_eq!(arc.aliases, vec!["a", "old/a"]);
        assert_eq!(
            arc.import_paths().collect::<Vec<_>>(),
            vec!["example.com/a", "a", "old/a"]
        );
    }

    #[test]
    fn test_parse_archive_malformed() {
        assert!("example.com/a=a.a".parse::<Archive>().is_err());
        assert!("a=b=c=d".parse::<Archive>().is_err());
        assert!("=pkg=file".parse::<Archive>().is_err());
        assert!("imp=pkg=".parse::<Archive>().is_err());
    }
}
