use std::env;
use std::path::PathBuf;

// Records the crate directory as the last place `find_repo_root` looks for
// `data/`, after REQCHECK_ROOT and the upward searches from the working
// directory and the executable.
fn main() {
    println!("cargo:rerun-if-env-changed=REQCHECK_ROOT_HINT");

    let hint = env::var("REQCHECK_ROOT_HINT")
        .ok()
        .or_else(|| env::var("CARGO_MANIFEST_DIR").ok());

    if let Some(raw_hint) = hint {
        let candidate = PathBuf::from(raw_hint);
        let canonical = candidate.canonicalize().unwrap_or(candidate);

        println!(
            "cargo:rustc-env=REQCHECK_ROOT_HINT={}",
            canonical.display()
        );
    }
}
