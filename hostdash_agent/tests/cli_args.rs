//! CLI arg handling of the agent binary.
use assert_cmd::prelude::*;
use std::process::Command;

#[test]
fn help_prints_usage_and_exits() {
    let out = Command::cargo_bin("hostdash_agent")
        .expect("binary exists")
        .arg("--help")
        .output()
        .expect("run agent");
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("--port"));
}

#[test]
fn test_port_short_long() {
    // The process must accept both flag forms and start; we kill it quickly.
    let exe = env!("CARGO_BIN_EXE_hostdash_agent");

    let mut child = Command::new(exe)
        .args(["--port", "0"])
        .spawn()
        .expect("spawn agent");
    std::thread::sleep(std::time::Duration::from_millis(150));
    let _ = child.kill();
    let _ = child.wait();

    let mut child2 = Command::new(exe)
        .args(["-p", "0"])
        .spawn()
        .expect("spawn agent");
    std::thread::sleep(std::time::Duration::from_millis(150));
    let _ = child2.kill();
    let _ = child2.wait();
}
