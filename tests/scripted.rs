#![cfg(feature = "cli")]

use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn run(args: &[&str], stdin: Option<&str>, envs: &[(&str, &str)]) -> (String, String, i32) {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_argline"));
    cmd.args(args)
        .env_remove("ARGLINE_ENV_FILE")
        .env("ARGLINE_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in envs {
        cmd.env(key, value);
    }
    let mut child = cmd.spawn().expect("spawn argline");
    {
        let mut input = child.stdin.take().expect("stdin");
        if let Some(text) = stdin {
            input.write_all(text.as_bytes()).expect("write");
        }
    }
    let output = child.wait_with_output().expect("wait");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(1);
    (stdout, stderr, code)
}

#[test]
fn bash_line_from_args() {
    let (out, err, code) = run(
        &["echo", "$ARGLINE_T1", "'$ARGLINE_T1'"],
        None,
        &[("ARGLINE_T1", "v")],
    );
    assert!(err.is_empty(), "stderr: {err}");
    assert_eq!(out, "echo v '$ARGLINE_T1'\n");
    assert_eq!(code, 0);
}

#[test]
fn bash_line_from_stdin() {
    let (out, _, code) = run(&[], Some("x ${ARGLINE_T2}\n"), &[("ARGLINE_T2", "y")]);
    assert_eq!(out, "x y\n");
    assert_eq!(code, 0);
}

#[test]
fn powershell_tokenize_one_arg_per_line() {
    let (out, err, code) = run(
        &["-d", "powershell", "--tokenize", "--", "-m \"$env:ARGLINE_T3 b\" c"],
        None,
        &[("ARGLINE_T3", "a")],
    );
    assert!(err.is_empty(), "stderr: {err}");
    assert_eq!(out, "-m\na b\nc\n");
    assert_eq!(code, 0);
}

#[test]
fn env_file_overrides_process_env() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vars.env");
    std::fs::write(&path, "# ci\nexport ARGLINE_T4=\"from file\"\n").unwrap();
    let flag = format!("--env-file={}", path.display());
    let (out, _, code) = run(
        &[flag.as_str(), "$ARGLINE_T4"],
        None,
        &[("ARGLINE_T4", "from process")],
    );
    assert_eq!(out, "from file\n");
    assert_eq!(code, 0);

    let (out, _, _) = run(
        &["${ARGLINE_T4}"],
        None,
        &[("ARGLINE_ENV_FILE", path.to_str().unwrap())],
    );
    assert_eq!(out, "from file\n");
}

#[test]
fn strict_rejects_blocked_lines() {
    let (out, err, code) = run(&["--strict", "echo", "${OOPS"], None, &[]);
    assert!(out.is_empty());
    assert!(err.contains("unclosed brace"), "stderr: {err}");
    assert!(err.contains('^'));
    assert_eq!(code, 2);

    // Without --strict the partial result is printed.
    let (out, _, code) = run(&["echo", "${OOPS"], None, &[]);
    assert_eq!(out, "echo ${OOPS\n");
    assert_eq!(code, 0);
}

#[test]
fn json_output_includes_diagnostics() -> anyhow::Result<()> {
    let (out, _, code) = run(&["--json", "a", "\\$B"], None, &[]);
    assert_eq!(code, 0);
    let value: serde_json::Value = serde_json::from_str(&out)?;
    assert_eq!(value["line"], "a $B");
    assert_eq!(value["diagnostics"]["escaped_variables"], 1);
    assert_eq!(value["diagnostics"]["unclosed_brace_position"], serde_json::Value::Null);

    let (out, _, _) = run(&["-d", "pwsh", "-t", "--json", "\"x"], None, &[]);
    let value: serde_json::Value = serde_json::from_str(&out)?;
    assert_eq!(value["args"][0], "x");
    assert_eq!(value["diagnostics"]["unmatched_quotes"], true);
    assert_eq!(value["diagnostics"]["expansion"]["found_prefixes"], 0);
    Ok(())
}

#[test]
fn usage_errors_exit_nonzero() {
    let (_, err, code) = run(&["--tokenize", "a"], None, &[]);
    assert!(err.contains("Usage error"), "stderr: {err}");
    assert_eq!(code, 1);

    let (out, _, code) = run(&["--help"], None, &[]);
    assert!(out.starts_with("usage: argline"));
    assert_eq!(code, 0);
}
