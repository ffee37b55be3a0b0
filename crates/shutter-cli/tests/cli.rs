//! Black-box tests for the `shutter` binary.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;

use assert_cmd::Command;
use predicates::prelude::*;

fn shutter() -> Command {
    let mut command = Command::cargo_bin("shutter").expect("binary should build");
    command
        .env_remove("SHUTTER_ENDPOINT")
        .env_remove("SHUTTER_TIMEOUT_SECS")
        .env_remove("SHUTTER_LOG_FILTER")
        .env_remove("SHUTTER_LOG_FORMAT");
    command
}

#[test]
fn help_lists_operations() {
    shutter()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("properties"))
        .stdout(predicate::str::contains("capture"))
        .stdout(predicate::str::contains("converge"));
}

#[test]
fn rejects_unsupported_endpoint_scheme() {
    shutter()
        .args(["--endpoint", "http://127.0.0.1:6000", "properties"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported socket scheme"));
}

#[test]
fn properties_prints_device_json() {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind fixture listener");
    let port = listener.local_addr().expect("fixture address").port();
    let device = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept session");
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
        let mut line = String::new();
        reader.read_line(&mut line).expect("read command line");
        assert!(line.contains("getCameraProperties"));
        let mut stream = stream;
        stream
            .write_all(
                b"{\"tag\":\"cameraProperties\",\"objValue\":{\"cameraProperties\":{\"android.lens.facing\":1}}}\n",
            )
            .expect("write properties");
    });

    shutter()
        .args([
            "--endpoint",
            &format!("tcp://127.0.0.1:{port}"),
            "properties",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("android.lens.facing"));
    device.join().expect("join fixture");
}

#[test]
fn converge_prints_readings() {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind fixture listener");
    let port = listener.local_addr().expect("fixture address").port();
    let device = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept session");
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
        let mut line = String::new();
        reader.read_line(&mut line).expect("read command line");
        assert!(line.contains("do3A"));
        let mut stream = stream;
        stream
            .write_all(b"{\"tag\":\"aeResult\",\"strValue\":\"100 33333333\"}\n")
            .expect("write ae");
        stream
            .write_all(b"{\"tag\":\"3aDone\"}\n")
            .expect("write done");
    });

    shutter()
        .args([
            "--endpoint",
            &format!("tcp://127.0.0.1:{port}"),
            "converge",
            "--skip-awb",
            "--skip-af",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("AE: sensitivity 100"));
    device.join().expect("join fixture");
}
