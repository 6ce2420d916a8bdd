use std::fs;
use std::path::PathBuf;

fn main() {
    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("manifest dir"));
    let Some(workspace_root) = manifest_dir.ancestors().nth(2) else {
        panic!("app crate must live two levels below the workspace root");
    };
    let version_path = workspace_root.join("VERSION");

    println!("cargo:rerun-if-changed={}", version_path.display());

    let raw_version = fs::read_to_string(&version_path).expect("read VERSION file");
    let version = raw_version.trim();
    let well_formed = !version.is_empty()
        && version
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '+'));
    assert!(
        well_formed,
        "VERSION must be a non-empty dotted version string, got {version:?}"
    );

    println!("cargo:rustc-env=BALATRO_ADVISOR_VERSION={version}");
}
