use std::process::Command;

fn current_git_hash() -> Option<String> {
    if let Some(commit) = option_env!("GIT_COMMIT") {
        return Some(commit.to_string());
    }
    let output = Command::new("git")
        .args(["log", "-1", "--pretty=format:%h"])
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .output()
        .ok()?;
    String::from_utf8(output.stdout)
        .ok()
        .filter(|commit| !commit.is_empty())
}

fn main() {
    if let Some(commit) = current_git_hash() {
        println!("cargo:rustc-env=GIT_COMMIT={}", commit);
    }
}
