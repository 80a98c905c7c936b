//! InfraFlow Core
//!
//! マニフェストの読み込み、リソースモデル、依存順序付けを提供します。
//! プロバイダー呼び出しや状態管理は `infraflow-cloud` が担当します。

pub mod error;
pub mod loader;
pub mod model;
pub mod order;
pub mod parser;

pub use error::{ManifestError, Result};
pub use loader::{load_manifest_file, load_manifests};
pub use model::{DEFAULT_NAMESPACE, Metadata, Resource, ResourceId};
pub use order::{OrderingTable, STACK_KIND};
pub use parser::parse_manifests;
