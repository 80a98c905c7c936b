mod commands;
mod context;
mod output;

use clap::{Args, Parser, Subcommand};
use output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "infra")]
#[command(about = "宣言したとおりに、クラウドを組み上げる。", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

/// 全サブコマンド共通のオプション
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// 状態ファイルの保存先（設定ファイル・INFRAFLOW_STATE_DIR より優先）
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    /// リージョン
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// コントロールプレーンの URL
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// プロバイダー (http, memory)
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// プロバイダーを呼ばずに実行内容だけを表示
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// デバッグログを表示
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// バッチ全体のタイムアウト（秒）
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// 出力形式
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// マニフェストのリソースを作成
    Apply {
        /// マニフェストファイルまたはディレクトリ
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// 作成されるリソースを表示（変更なし）
    Plan {
        /// マニフェストファイルまたはディレクトリ
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// マニフェストのリソースを削除
    Delete {
        /// マニフェストファイルまたはディレクトリ
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// 記録済みのリソースを表示
    Get {
        /// kind で絞り込み (VPC, Stack, ...)
        kind: Option<String>,
    },
    /// バージョン情報を表示
    Version,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("infraflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let settings = context::resolve_settings(&cli.global)?;
    let args = &cli.global;

    let success = match &cli.command {
        Commands::Apply { files } => commands::apply::handle(&settings, args, files).await?,
        Commands::Plan { files } => commands::plan::handle(&settings, args, files).await?,
        Commands::Delete { files } => commands::delete::handle(&settings, args, files).await?,
        Commands::Get { kind } => commands::get::handle(&settings, args, kind.as_deref()).await?,
        Commands::Version => true,
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}
