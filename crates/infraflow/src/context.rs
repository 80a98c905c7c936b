//! 設定の解決と Engine の組み立て

use crate::GlobalArgs;
use colored::Colorize;
use infraflow_cloud::{CloudProvider, Engine, MemoryProvider, StateStore};
use infraflow_cloud_http::{HttpProvider, HttpProviderConfig};
use infraflow_config::{ProviderKind, Settings};
use infraflow_core::Resource;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 設定ファイル → 環境変数 → CLI フラグの順に上書きした設定
pub fn resolve_settings(args: &GlobalArgs) -> anyhow::Result<Settings> {
    let mut settings = infraflow_config::load_settings()?;

    if let Some(dir) = &args.state_dir {
        settings.state_dir = dir.clone();
    }
    if let Some(region) = &args.region {
        settings.provider.region = region.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        settings.provider.endpoint = Some(endpoint.clone());
    }
    if let Some(provider) = &args.provider {
        settings.provider.kind = provider.parse::<ProviderKind>()?;
    }

    tracing::debug!(?settings, "設定を解決しました");
    Ok(settings)
}

fn build_provider(settings: &Settings) -> anyhow::Result<Arc<dyn CloudProvider>> {
    match settings.provider.kind {
        ProviderKind::Memory => Ok(Arc::new(MemoryProvider::new())),
        ProviderKind::Http => {
            let endpoint = settings.provider.endpoint.clone().ok_or_else(|| {
                anyhow::anyhow!(
                    "http プロバイダーのエンドポイントが未設定です（--endpoint, INFRAFLOW_ENDPOINT または設定ファイルで指定してください）"
                )
            })?;
            let config = HttpProviderConfig::new(endpoint, settings.provider.region.clone())
                .with_token_from_env(&settings.provider.token_env);
            Ok(Arc::new(HttpProvider::new(config)?))
        }
    }
}

/// プロバイダーを呼ぶ操作（apply / delete）用の Engine
pub fn build_engine(settings: &Settings) -> anyhow::Result<Engine> {
    let provider = build_provider(settings)?;
    Ok(Engine::new(StateStore::new(&settings.state_dir), provider))
}

/// 状態ストアだけを読む操作（plan / get / dry-run）用の Engine
///
/// プロバイダーは呼ばれないため、エンドポイント未設定でも動く。
pub fn build_offline_engine(settings: &Settings) -> Engine {
    Engine::new(
        StateStore::new(&settings.state_dir),
        Arc::new(MemoryProvider::new()),
    )
}

/// マニフェストを読み込む（空なら警告）
pub fn load_resources(files: &[PathBuf], quiet: bool) -> anyhow::Result<Vec<Resource>> {
    let resources = infraflow_core::load_manifests(files)?;
    if resources.is_empty() && !quiet {
        eprintln!("{}", "リソースが見つかりませんでした".yellow());
    }
    Ok(resources)
}

/// タイムアウトまたは Ctrl-C でキャンセルされるトークン
pub fn cancellation_token(timeout: Option<u64>) -> CancellationToken {
    let token = CancellationToken::new();

    if let Some(secs) = timeout {
        let deadline = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            tracing::warn!(secs, "タイムアウトしました。残りの処理を中断します");
            deadline.cancel();
        });
    }

    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("中断を受け付けました");
            interrupt.cancel();
        }
    });

    token
}
