#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const NETWORK_YAML: &str = r#"
apiVersion: infraflow.io/v1
kind: VPC
metadata:
  name: main
spec:
  cidr: 10.0.0.0/16
---
apiVersion: infraflow.io/v1
kind: Stack
metadata:
  name: web
spec:
  vpcRef: main
  subnet:
    cidr: 10.0.1.0/24
  securityGroup:
    ingress:
      - protocol: tcp
        port: 443
        cidr: 0.0.0.0/0
"#;

/// 一時ディレクトリにマニフェストと状態を置くテスト環境
struct Workspace {
    root: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn state_dir(&self) -> PathBuf {
        self.root.path().join("state")
    }

    /// memory プロバイダーと一時状態ディレクトリを使うコマンド
    fn infra(&self) -> Command {
        let mut cmd = Command::cargo_bin("infra").unwrap();
        cmd.current_dir(self.root.path())
            .env("NO_COLOR", "1")
            .env_remove("INFRAFLOW_CONFIG_PATH")
            .env_remove("INFRAFLOW_STATE_DIR")
            .env_remove("INFRAFLOW_ENDPOINT")
            .env_remove("INFRAFLOW_REGION")
            .arg("--provider")
            .arg("memory")
            .arg("--state-dir")
            .arg(self.state_dir());
        cmd
    }
}

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("infra").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("get"));
}

/// バージョン表示が正しく動作することを確認
#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("infra").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("infraflow"));
}

/// ファイル未指定の apply はエラーになることを確認
#[test]
fn test_apply_requires_files() {
    let mut cmd = Command::cargo_bin("infra").unwrap();
    cmd.arg("apply").assert().failure();
}

/// 不正なコマンドでエラーになることを確認
#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("infra").unwrap();
    cmd.arg("invalid-command").assert().failure();
}

/// plan は状態が空なら全て作成予定になることを確認
#[test]
fn test_plan_on_empty_state() {
    let ws = Workspace::new();
    let manifest = ws.write("network.yaml", NETWORK_YAML);

    ws.infra()
        .arg("plan")
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("+ VPC/default/main"))
        .stdout(predicate::str::contains("+ Stack/default/web"))
        .stdout(predicate::str::contains("2 to create"));
}

/// apply → get → plan → delete の一連の流れ
#[test]
fn test_apply_get_delete_lifecycle() {
    let ws = Workspace::new();
    let manifest = ws.write("network.yaml", NETWORK_YAML);

    ws.infra()
        .arg("apply")
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("VPC/default/main"))
        .stdout(predicate::str::contains("Stack/default/web"));

    assert!(ws.state_dir().join("VPC/default/main.json").exists());
    assert!(ws.state_dir().join("Stack/default/web.json").exists());

    ws.infra()
        .arg("get")
        .assert()
        .success()
        .stdout(predicate::str::contains("Ready"))
        .stdout(predicate::str::contains("shared VPC vpc-"));

    ws.infra()
        .arg("plan")
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 to create"))
        .stdout(predicate::str::contains("2 unchanged"));

    // 2回目の apply はスキップされる
    ws.infra()
        .arg("apply")
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    ws.infra().arg("delete").arg(&manifest).assert().success();

    assert!(!ws.state_dir().join("VPC/default/main.json").exists());
    assert!(!ws.state_dir().join("Stack/default/web.json").exists());
}

/// JSON 出力がパースできることを確認
#[test]
fn test_apply_json_output() {
    let ws = Workspace::new();
    let manifest = ws.write("network.yaml", NETWORK_YAML);

    let output = ws
        .infra()
        .arg("--output")
        .arg("json")
        .arg("apply")
        .arg(&manifest)
        .output()
        .unwrap();
    assert!(output.status.success());

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["created"].as_array().unwrap().len(), 2);
    assert_eq!(result["created"][0]["kind"], "VPC");
    assert_eq!(result["created"][1]["kind"], "Stack");
    assert!(result["failed"].as_array().unwrap().is_empty());

    let output = ws
        .infra()
        .arg("get")
        .arg("VPC")
        .arg("--output")
        .arg("json")
        .output()
        .unwrap();
    let states: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(states.as_array().unwrap().len(), 1);
    assert!(
        states[0]["providerResources"]["vpcId"]
            .as_str()
            .unwrap()
            .starts_with("vpc-")
    );
}

/// --dry-run ではプロバイダーも状態も変更されないことを確認
#[test]
fn test_apply_dry_run() {
    let ws = Workspace::new();
    let manifest = ws.write("network.yaml", NETWORK_YAML);

    ws.infra()
        .arg("apply")
        .arg("--dry-run")
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("dry-run"))
        .stdout(predicate::str::contains("2 to create"));

    assert!(!ws.state_dir().exists());
}

/// 未対応の kind は失敗として報告され、終了コードが非ゼロになることを確認
#[test]
fn test_unsupported_kind_fails() {
    let ws = Workspace::new();
    let manifest = ws.write(
        "bucket.yaml",
        r#"
apiVersion: infraflow.io/v1
kind: Bucket
metadata:
  name: assets
---
apiVersion: infraflow.io/v1
kind: VPC
metadata:
  name: main
spec:
  cidr: 10.0.0.0/16
"#,
    );

    ws.infra()
        .arg("apply")
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported resource kind: Bucket"));

    // 他のリソースは作成される
    assert!(ws.state_dir().join("VPC/default/main.json").exists());
}

/// YAML 構文エラーはエラーになることを確認
#[test]
fn test_invalid_yaml_fails() {
    let ws = Workspace::new();
    let manifest = ws.write("broken.yaml", "kind: VPC\nmetadata: [unclosed\n");

    ws.infra().arg("plan").arg(&manifest).assert().failure();
}

/// ディレクトリ指定でマニフェストを読み込めることを確認
#[test]
fn test_plan_directory() {
    let ws = Workspace::new();
    fs::create_dir(ws.root.path().join("manifests")).unwrap();
    ws.write("manifests/network.yaml", NETWORK_YAML);

    ws.infra()
        .arg("plan")
        .arg(ws.root.path().join("manifests"))
        .assert()
        .success()
        .stdout(predicate::str::contains("2 to create"));
}

/// http プロバイダーはエンドポイント未設定だとエラーになることを確認
#[test]
fn test_http_provider_requires_endpoint() {
    let ws = Workspace::new();
    let manifest = ws.write("network.yaml", NETWORK_YAML);

    let mut cmd = Command::cargo_bin("infra").unwrap();
    cmd.current_dir(ws.root.path())
        .env_remove("INFRAFLOW_CONFIG_PATH")
        .env_remove("INFRAFLOW_ENDPOINT")
        .arg("--provider")
        .arg("http")
        .arg("--state-dir")
        .arg(ws.state_dir())
        .arg("apply")
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("エンドポイント"));
}

/// 設定ファイルの stateDir が使われることを確認
#[test]
fn test_config_file_state_dir() {
    let ws = Workspace::new();
    let manifest = ws.write("network.yaml", NETWORK_YAML);
    ws.write(
        "infraflow.yaml",
        "stateDir: from-config\nprovider:\n  kind: memory\n",
    );

    let mut cmd = Command::cargo_bin("infra").unwrap();
    cmd.current_dir(ws.root.path())
        .env_remove("INFRAFLOW_CONFIG_PATH")
        .env_remove("INFRAFLOW_STATE_DIR")
        .arg("apply")
        .arg(&manifest)
        .assert()
        .success();

    assert!(
        ws.root
            .path()
            .join("from-config/VPC/default/main.json")
            .exists()
    );
}
