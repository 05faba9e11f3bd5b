use predicates::prelude::*;

mod common;
use common::{cargo_bin, demo, source_file};

#[test]
fn addition_demo_prints_seven() {
    cargo_bin()
        .arg(demo("add.bf"))
        .assert()
        .success()
        .stdout(predicate::eq(&[7u8][..]))
        .stderr(predicate::str::is_empty());
}

#[test]
fn hello_world_demo() {
    cargo_bin()
        .arg(demo("hello.bf"))
        .assert()
        .success()
        .stdout("Hello World!\n");
}

#[test]
fn single_write_emits_one_zero_byte() {
    let tf = source_file(b".");
    cargo_bin()
        .arg(tf.path())
        .assert()
        .success()
        .stdout(predicate::eq(&[0u8][..]));
}

#[test]
fn non_utf8_comments_are_ignored() {
    let tf = source_file(b"\xff\xfe+++\x00 ok \xc3.");
    cargo_bin()
        .arg(tf.path())
        .assert()
        .success()
        .stdout(predicate::eq(&[3u8][..]));
}

#[test]
fn empty_file_succeeds_silently() {
    let tf = source_file(b"");
    cargo_bin()
        .arg(tf.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn program_larger_than_one_read_chunk() {
    // 5000 increments wrap to 136; the program spans two 4 KiB chunks.
    let mut src = "+".repeat(5000);
    src.push('.');
    let tf = source_file(src.as_bytes());
    cargo_bin()
        .arg(tf.path())
        .assert()
        .success()
        .stdout(predicate::eq(&[136u8][..]));
}

#[test]
fn large_comment_only_file_is_an_empty_program() {
    let src = vec![0u8; 1 << 20];
    let tf = source_file(&src);
    cargo_bin()
        .arg(tf.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty());
}

#[test]
fn commands_after_a_large_comment_block_still_run() {
    let mut src = b"comment ".repeat(16 * 1024);
    src.extend_from_slice(b"++>+++++[<+>-]<.");
    let tf = source_file(&src);
    cargo_bin()
        .arg(tf.path())
        .assert()
        .success()
        .stdout(predicate::eq(&[7u8][..]));
}
