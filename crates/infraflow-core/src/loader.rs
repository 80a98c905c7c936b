//! マニフェストローダー
//!
//! ファイルとディレクトリからマニフェストを読み込み、パースします。

use crate::error::{ManifestError, Result};
use crate::model::Resource;
use crate::parser::parse_manifests;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// ディレクトリ指定時に読み込む拡張子
const MANIFEST_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// 複数のパスからリソースを読み込む
///
/// パスは指定順に処理されます。ディレクトリの場合は配下の
/// `*.yaml` / `*.yml` / `*.json` をパス名順に読み込みます。
#[instrument(skip_all, fields(paths = paths.len()))]
pub fn load_manifests<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Resource>> {
    let mut resources = Vec::new();

    for path in paths {
        let path = path.as_ref();
        if path.is_dir() {
            for file in discover_manifest_files(path)? {
                resources.extend(load_manifest_file(&file)?);
            }
        } else {
            resources.extend(load_manifest_file(path)?);
        }
    }

    info!(resources = resources.len(), "Manifests loaded");
    Ok(resources)
}

/// 単一ファイルを読み込んでパース
pub fn load_manifest_file(path: &Path) -> Result<Vec<Resource>> {
    debug!(path = %path.display(), "Reading manifest");
    let bytes = std::fs::read(path).map_err(|e| ManifestError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_manifests(&bytes)
}

fn discover_manifest_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for ext in MANIFEST_EXTENSIONS {
        let pattern = dir.join("**").join(format!("*.{}", ext));
        for entry in glob::glob(&pattern.to_string_lossy())? {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => {
                    return Err(ManifestError::Io {
                        path: e.path().to_path_buf(),
                        message: e.error().to_string(),
                    });
                }
            }
        }
    }

    files.sort();
    debug!(dir = %dir.display(), count = files.len(), "Discovered manifest files");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const VPC: &str = "apiVersion: infraflow.io/v1\nkind: VPC\nmetadata:\n  name: main\n";
    const SUBNET: &str = "apiVersion: infraflow.io/v1\nkind: Subnet\nmetadata:\n  name: app\n";

    #[test]
    fn test_load_files_in_argument_order() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.yaml");
        let b = dir.path().join("b.yaml");
        fs::write(&a, VPC).unwrap();
        fs::write(&b, SUBNET).unwrap();

        let resources = load_manifests(&[&b, &a]).unwrap();
        let kinds: Vec<_> = resources.iter().map(|r| r.kind.as_str()).collect();
        assert_eq!(kinds, vec!["Subnet", "VPC"]);
    }

    #[test]
    fn test_load_directory() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("network")).unwrap();
        fs::write(dir.path().join("network/10-vpc.yml"), VPC).unwrap();
        fs::write(dir.path().join("20-subnet.yaml"), SUBNET).unwrap();
        fs::write(dir.path().join("README.md"), "# not a manifest").unwrap();

        let resources = load_manifests(&[dir.path()]).unwrap();
        assert_eq!(resources.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let result = load_manifests(&[dir.path().join("missing.yaml")]);
        assert!(matches!(result, Err(ManifestError::Io { .. })));
    }
}
