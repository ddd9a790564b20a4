use serde::{Deserialize, Serialize};

/// 标准地址（参照集，查询的匹配目标）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReferenceAddress {
    pub id: u64,
    pub raw: String,
}

/// 待匹配的原始地址（二级来源）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SecondaryAddress {
    pub id: u64,
    pub raw: String,
}

/// 已确认的匹配对（一次批量写入的单位）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchedPair {
    pub secondary_id: u64,
    pub canonical_id: u64,
    pub score: f64,
}

/// 人工复核状态。Accepted / Rejected 为终态。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewStatus {
    Pending,
    Accepted,
    Rejected,
}

/// 复核队列记录
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: u64,
    pub secondary_id: u64,
    pub raw: String,
    pub status: ReviewStatus,
}
