use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Variables are only ever read through a call taking the name as its first
/// string argument: `env::var("FOLIO_X")`, `env_or_string("FOLIO_X", ..)`.
const CALL_SITE: &str = "(\"FOLIO_";

fn sources(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                found.push(path);
            }
        }
    }
    Ok(found)
}

fn variables_read_in(source: &str) -> impl Iterator<Item = &str> {
    source.match_indices(CALL_SITE).filter_map(move |(at, _)| {
        let name = &source[at + 2..];
        let name = &name[..name.find('"')?];
        (name.len() > CALL_SITE.len() - 2
            && name
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_'))
            .then_some(name)
    })
}

fn main() -> io::Result<()> {
    let mut names = BTreeSet::new();
    for path in sources(Path::new("src"))? {
        let source = fs::read_to_string(&path)?;
        names.extend(variables_read_in(&source).map(str::to_string));
    }

    let out_dir = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::other("OUT_DIR is not set"))?;
    let entries: String = names.iter().map(|name| format!("    \"{name}\",\n")).collect();
    fs::write(
        out_dir.join("folio_env_allowlist.rs"),
        format!("pub const GENERATED_FOLIO_ENV_ALLOWLIST: &[&str] = &[\n{entries}];\n"),
    )?;

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src");
    Ok(())
}
