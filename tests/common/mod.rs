#![allow(dead_code)]

use assert_cmd::Command;
use std::io::Write;
use std::path::PathBuf;

/// The `bf` binary with user configuration shut out.
pub fn cargo_bin() -> Command {
    let mut cmd = Command::cargo_bin("bf").unwrap();
    cmd.env("BF_CONFIG", "/nonexistent/bf.toml")
        .env_remove("BF_TAPE_CELLS")
        .env_remove("BF_MAX_PROGRAM_LEN")
        .env_remove("BF_MAX_LOOP_DEPTH")
        .env_remove("BF_EOF")
        .env_remove("BF_MAX_STEPS")
        .env_remove("RUST_LOG");
    cmd
}

pub fn source_file(content: &[u8]) -> tempfile::NamedTempFile {
    let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
    tf.write_all(content).unwrap();
    tf.flush().unwrap();
    tf
}

pub fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}
