#![cfg(unix)]

use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

const COMPLEX_CHECK: &str = r#"
echo Command Start
echo "param1=$SMUGGLER_param1"
echo "1.2.3" > "$SMUGGLER_OUTPUT_DIR/versions"
printf '\t 1.2.4  \n\n' >> "$SMUGGLER_OUTPUT_DIR/versions"
echo Command End
"#;

const COMPLEX_IN: &str = r#"
echo "param4=$SMUGGLER_param4"
echo "destinationDir=$SMUGGLER_DESTINATION_DIR"
echo "value1= something quite long  " > "$SMUGGLER_OUTPUT_DIR/metadata"
printf '\n\t value_2=2  \n' >> "$SMUGGLER_OUTPUT_DIR/metadata"
"#;

struct Harness {
    dir: TempDir,
}

impl Harness {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn log_path(&self) -> std::path::PathBuf {
        self.dir.path().join("logs").join("smuggler.log")
    }

    fn run(&self, args: &[&str], request: &Value) -> Output {
        let mut child = Command::new(env!("CARGO_BIN_EXE_smuggler"))
            .args(args)
            .env("SMUGGLER_LOG", self.log_path())
            .env("SMUGGLER_CONFIG", self.dir.path().join("absent.toml"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("binary should start");
        child
            .stdin
            .take()
            .unwrap()
            .write_all(request.to_string().as_bytes())
            .unwrap();
        child.wait_with_output().unwrap()
    }
}

fn sh_command(name: &str, script: &str) -> Value {
    json!({"name": name, "path": "sh", "args": ["-e", "-c", script]})
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn check_prints_versions_and_echoes_command_output() {
    let harness = Harness::new();
    let request = json!({
        "source": {"commands": [sh_command("check", COMPLEX_CHECK)], "param1": "test"},
        "version": null,
    });
    let output = harness.run(&["check"], &request);

    assert!(output.status.success());
    assert_eq!(stdout_json(&output), json!([{"ref": "1.2.3"}, {"ref": "1.2.4"}]));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Command Start"));
    assert!(stderr.contains("param1=test"));
    assert!(stderr.contains("Command End"));

    let log = std::fs::read_to_string(harness.log_path()).expect("log file written");
    assert!(!log.is_empty());
}

#[test]
fn in_prints_version_and_metadata() {
    let harness = Harness::new();
    let dest = harness.dir.path().join("destination");
    let request = json!({
        "source": {"commands": [sh_command("in", COMPLEX_IN)]},
        "version": {"ref": "1.2.3"},
        "params": {"param4": "val4"},
    });
    let output = harness.run(&["in", dest.to_str().unwrap()], &request);

    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output),
        json!({
            "version": {"ref": "1.2.3"},
            "metadata": [
                {"name": "value1", "value": "something quite long"},
                {"name": "value_2", "value": "2"},
            ],
        })
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("param4=val4"));
    assert!(stderr.contains(&format!("destinationDir={}", dest.display())));
}

#[test]
fn undefined_verbs_print_empty_responses() {
    let harness = Harness::new();
    let request = json!({"source": {"commands": []}, "version": {}});

    let check = harness.run(&["check"], &request);
    assert!(check.status.success());
    assert_eq!(stdout_json(&check), json!([]));

    let out = harness.run(&["out", "/tmp"], &request);
    assert!(out.status.success());
    assert_eq!(stdout_json(&out), json!({}));
}

#[test]
fn failing_command_propagates_exit_status() {
    let harness = Harness::new();
    for args in [&["check"][..], &["in", "/tmp"][..], &["out", "/tmp"][..]] {
        let verb = args[0];
        let request = json!({
            "source": {"commands": [sh_command(verb, "echo partial output; exit 2")]},
        });
        let output = harness.run(args, &request);

        assert_eq!(output.status.code(), Some(2), "{verb} exit status");
        assert!(output.stdout.is_empty());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("partial output"));
        assert!(stderr.contains("error running command"));
    }
}

#[test]
fn malformed_request_exits_with_wrapper_status() {
    let harness = Harness::new();
    let output = harness.run(&["check"], &json!({"source": "not an object"}));

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error reading request from stdin"));
}

#[test]
fn local_config_file_supplies_commands() {
    let harness = Harness::new();
    let config_path = harness.dir.path().join("smuggler.toml");
    std::fs::write(
        &config_path,
        r#"
[[commands]]
name = "check"
path = "sh"
args = ["-c", "echo \"from config file $SMUGGLER_config_param1\"; echo 4.5.6 > $SMUGGLER_OUTPUT_DIR/versions"]

[params]
config_param1 = "param_in_config"
"#,
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_smuggler"))
        .arg("check")
        .env("SMUGGLER_LOG", harness.log_path())
        .env("SMUGGLER_CONFIG", &config_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .and_then(|mut child| {
            child.stdin.take().unwrap().write_all(br#"{"source": {}}"#)?;
            child.wait_with_output()
        })
        .unwrap();

    assert!(output.status.success());
    assert_eq!(stdout_json(&output), json!([{"ref": "4.5.6"}]));
    assert!(String::from_utf8_lossy(&output.stderr).contains("from config file param_in_config"));
    assert!(Path::new(&harness.log_path()).exists());
}
