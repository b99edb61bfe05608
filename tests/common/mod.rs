//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

pub const FACTS_CONTENT: &str = "serialized facts";

pub fn root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn testdata_path() -> PathBuf {
    root().join("testdata")
}

/// Write a fake analyzer into `dir`. `output` must be empty or end in a
/// newline; `ending` is the script's last command.
pub fn fake_analyzer(dir: &Path, output: &str, ending: &str) -> PathBuf {
    let script = format!(
        r#"#!/bin/sh
params="${{1#-param=}}"
touch "{dir}/invoked"
cp "$params" "{dir}/seen.param"
printf '%s' "$params" > "{dir}/param_path"
cfg=$(sed -n '/^-importcfg$/{{n;p;}}' "$params")
cp "$cfg" "{dir}/seen.importcfg"
out=$(sed -n '/^-x$/{{n;p;}}' "$params")
printf '{facts}' > "$out"
cat <<'FINDINGS'
{output}FINDINGS
{ending}
"#,
        dir = dir.display(),
        facts = FACTS_CONTENT,
        output = output,
        ending = ending,
    );
    let path = dir.join("nogo");
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}
