//! # Archivetar CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! Shared helpers for the integration tests: locating the compiled binary and
//! writing listing files in the walker's text format.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};

/// Command for the compiled `archivetar` binary.
///
/// ## Panics
/// Panics if the binary cannot be found via `Command::cargo_bin`.
pub fn archivetar_cmd() -> Command {
    Command::cargo_bin("archivetar").expect("Failed to find archivetar binary for testing")
}

/// One listing line for `path` with a size given in bytes.
pub fn listing_line(size_bytes: u64, path: &Path) -> String {
    format!(
        "-rw-r--r-- alice staff {}.000  B Oct 22 2019 09:35 {}\n",
        size_bytes,
        path.display()
    )
}

/// Creates `files` (name, size) under `dir` and writes a listing of them to
/// `dir/walk.txt`. Returns the listing path and the created file paths.
pub fn write_tree_and_listing(dir: &Path, files: &[(&str, u64)]) -> (PathBuf, Vec<PathBuf>) {
    let data = dir.join("data");
    let mut paths = Vec::new();
    let mut listing = String::new();
    for (name, size) in files {
        let path = data.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, vec![b'x'; *size as usize]).unwrap();
        listing.push_str(&listing_line(*size, &path));
        paths.push(path);
    }
    let listing_path = dir.join("walk.txt");
    fs::write(&listing_path, listing).unwrap();
    (listing_path, paths)
}

/// Installs stand-ins for `mpirun` and the mpiFileUtils tools under `root` and
/// returns `(install prefix, mpirun path)`.
///
/// - `mpirun -np N tool args...` just runs `tool args...`.
/// - `dwalk ... --output CACHE DIR` writes the sorted file paths under DIR to
///   CACHE; `dwalk --input CACHE --text --output LISTING` turns such a cache into
///   listing lines with byte sizes.
/// - `drm --input LIST` deletes every path in LIST; with `--dryrun` it only
///   prints `drm dryrun`.
#[cfg(unix)]
pub fn install_fake_mpi(root: &Path) -> (PathBuf, PathBuf) {
    use std::os::unix::fs::PermissionsExt;

    let install = root.join("mfu");
    fs::create_dir_all(install.join("bin")).unwrap();
    let scripts = [
        (root.join("mpirun"), "#!/bin/sh\nshift 2\nexec \"$@\"\n"),
        (
            install.join("bin/dwalk"),
            r#"#!/bin/sh
input=""; output=""; dir=""
while [ $# -gt 0 ]; do
  case "$1" in
    --input) input="$2"; shift ;;
    --output) output="$2"; shift ;;
    --sort|--progress) shift ;;
    --text) ;;
    *) dir="$1" ;;
  esac
  shift
done
if [ -z "$input" ]; then
  find "$dir" -type f | sort > "$output"
else
  : > "$output"
  while IFS= read -r f; do
    printf -- '-rw-r--r-- alice staff %s.000  B Oct 22 2019 09:35 %s\n' "$(wc -c < "$f" | tr -d ' ')" "$f" >> "$output"
  done < "$input"
fi
"#,
        ),
        (
            install.join("bin/drm"),
            r#"#!/bin/sh
while [ $# -gt 0 ]; do
  case "$1" in
    --input) list="$2"; shift ;;
    --dryrun) dry=1 ;;
  esac
  shift
done
if [ -n "$dry" ]; then echo "drm dryrun"; exit 0; fi
while IFS= read -r f; do rm -f "$f"; done < "$list"
"#,
        ),
    ];
    for (path, body) in &scripts {
        fs::write(path, body).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }
    (install, root.join("mpirun"))
}
