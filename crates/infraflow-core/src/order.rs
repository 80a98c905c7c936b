//! 依存順序付け
//!
//! kind ごとの固定優先度で安定ソートします。同じ kind のリソースは
//! 入力順を保ちます。削除は適用順のちょうど逆順で行います。

use crate::model::Resource;
use std::collections::HashMap;

/// 複数のプリミティブへ展開されるコンポジットリソースの kind
pub const STACK_KIND: &str = "Stack";

const DEFAULT_PRIORITIES: [(&str, u32); 7] = [
    ("VPC", 10),
    ("InternetGateway", 20),
    ("Subnet", 30),
    ("RouteTable", 40),
    ("SecurityGroup", 50),
    ("Instance", 60),
    (STACK_KIND, 100),
];

/// 未知の kind の優先度（プリミティブの後、Stack の前）
const UNKNOWN_KIND_PRIORITY: u32 = 90;

/// kind → 優先度の対応表
///
/// 値として構築して Engine に渡します。
#[derive(Debug, Clone)]
pub struct OrderingTable {
    priorities: HashMap<String, u32>,
    default_priority: u32,
}

impl Default for OrderingTable {
    fn default() -> Self {
        Self {
            priorities: DEFAULT_PRIORITIES
                .iter()
                .map(|(kind, p)| (kind.to_string(), *p))
                .collect(),
            default_priority: UNKNOWN_KIND_PRIORITY,
        }
    }
}

impl OrderingTable {
    /// 空の表（全ての kind が `default_priority`）
    pub fn empty(default_priority: u32) -> Self {
        Self {
            priorities: HashMap::new(),
            default_priority,
        }
    }

    pub fn with_priority(mut self, kind: impl Into<String>, priority: u32) -> Self {
        self.priorities.insert(kind.into(), priority);
        self
    }

    pub fn priority(&self, kind: &str) -> u32 {
        self.priorities
            .get(kind)
            .copied()
            .unwrap_or(self.default_priority)
    }

    /// 適用順に並べ替え
    pub fn order<'a>(&self, resources: &'a [Resource]) -> Vec<&'a Resource> {
        let mut ordered: Vec<&Resource> = resources.iter().collect();
        // sort_by_key は安定ソート
        ordered.sort_by_key(|r| self.priority(&r.kind));
        ordered
    }

    /// 削除順（適用順の逆）
    pub fn reverse_order<'a>(&self, resources: &'a [Resource]) -> Vec<&'a Resource> {
        let mut ordered = self.order(resources);
        ordered.reverse();
        ordered
    }
}
