// ==========================================
// 组织动员平台 - 名册导入 - 导入领域模型
// ==========================================
// 职责: 导入管道各阶段的数据结构
// 流程: 原始行 → 列映射 → 标准化记录 → 名册比对 → 预检汇总
// 生命周期: 全部由 (文件, 映射配置) 确定性重算,不持久化
// ==========================================

use crate::domain::person::{FieldValue, PersonField};
use crate::domain::types::{ProblemSeverity, RecordAction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// UploadedRow - 上传文件原始行
// ==========================================
// 用途: 文件解析产物,解析后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedRow {
    pub row_number: usize,  // 文件内行号（1 起,含表头行）
    pub cells: Vec<String>, // 按列序的原始单元格文本
}

// ==========================================
// MappingTarget - 列映射目标
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MappingTarget {
    /// 人员标准字段
    Field { field: PersonField },
    /// 单元格命中即为该人员打标签
    Tag { tag_id: i64 },
    /// 单元格命中即将该人员加入下级组织
    Org { org_id: i64 },
}

// ==========================================
// ValueTransform - 取值转换规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueTransform {
    /// 按指定格式解析日期（chrono 格式串,如 "%d/%m/%Y"）
    ParseDate { format: String },
}

// ==========================================
// ColumnMapping - 单列映射配置
// ==========================================
// 红线: 每个源列下标至多出现一次,重复即冲突
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub column: usize,                     // 源列下标（0 起）
    pub target: MappingTarget,             // 映射目标
    pub transform: Option<ValueTransform>, // 取值转换（缺省为恒等）
}

// ==========================================
// NormalizedRecord - 标准化记录
// ==========================================
// 用途: 应用全部列映射后的单行产物
// 生命周期: 映射配置变化即重算,无独立身份
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub row_number: usize,                         // 对应上传行号
    pub fields: BTreeMap<PersonField, FieldValue>, // 标准字段取值
    pub tags: Vec<i64>,                            // 由标签列派生
    pub orgs: Vec<i64>,                            // 由组织列派生
    pub missing_identity: bool,                    // 身份字段缺失（保留待预检提示）
}

impl NormalizedRecord {
    /// 读取指定字段
    pub fn field(&self, field: PersonField) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    /// 是否在全部映射列上为空（此类行在解析阶段即丢弃）
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.tags.is_empty() && self.orgs.is_empty()
    }
}

// ==========================================
// ResolvedRoster - 列映射阶段完整输出
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRoster {
    pub records: Vec<NormalizedRecord>,     // 标准化记录（空行已丢弃）
    pub problems: Vec<ValidationProblem>,   // 行级取值问题（如日期无法解析）
}

// ==========================================
// FieldChange - 单字段变更三元组
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: PersonField,
    pub old: Option<FieldValue>, // None 表示原值为空（初始化而非覆盖）
    pub new: FieldValue,
}

// ==========================================
// RecordDiff - 单条记录比对结果
// ==========================================
// 不变量: Create 无命中 ID 且无变更;
//         Update 必有命中 ID 且至少一条变更;
//         NoChange 有命中 ID 且变更为空
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDiff {
    pub row_number: usize,
    pub action: RecordAction,
    pub matched_id: Option<i64>,  // 命中的远端人员 ID
    pub changes: Vec<FieldChange>, // 仅 Update 非空
}

// ==========================================
// AmbiguousMatch - 匹配键命中多条远端记录
// ==========================================
// 处理: 按名册输入顺序取第一条比对,同时上报待人工确认
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousMatch {
    pub row_number: usize,
    pub key: String,             // 标准化后的匹配键
    pub candidate_ids: Vec<i64>, // 全部命中的人员 ID（按名册顺序）
}

// ==========================================
// DiffOutcome - 比对引擎完整输出
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffOutcome {
    pub diffs: Vec<RecordDiff>,             // 与标准化记录一一对应（同序）
    pub ambiguous: Vec<AmbiguousMatch>,     // 多重命中
    pub duplicate_keys: Vec<(usize, String)>, // (行号, 匹配键) 上传数据内重复
}

// ==========================================
// PreflightSummary - 预检汇总
// ==========================================
// 不变量: people_created.total + people_updated.total + people_no_change
//         恒等于比对结果条数
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatedSummary {
    pub total: usize, // 新建人数
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatedSummary {
    pub total: usize,                                     // 更新人数
    pub by_changed_field: BTreeMap<PersonField, usize>,   // 覆盖原值的字段分布
    pub by_initialized_field: BTreeMap<PersonField, usize>, // 原值为空的字段分布
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaggedSummary {
    pub total: usize,                 // 新增标签的人数
    pub by_tag: BTreeMap<i64, usize>, // 各标签命中人数
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddedToOrgSummary {
    pub total: usize,                 // 加入下级组织的人数
    pub by_org: BTreeMap<i64, usize>, // 各组织新增人数
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreflightSummary {
    pub people_created: CreatedSummary,
    pub people_updated: UpdatedSummary,
    pub people_no_change: usize,
    pub tagged: TaggedSummary,          // 仅统计 Create/Update 记录
    pub added_to_org: AddedToOrgSummary, // 仅统计 Create/Update 记录
}

// ==========================================
// ProblemKind - 校验问题类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    MappingConflict,       // 同一源列被配置了多个目标
    RequiredFieldUnmapped, // 身份字段未映射
    InvalidValue,          // 单元格取值无法转换
    MissingIdentity,       // 行缺失身份字段
    AmbiguousMatch,        // 匹配键命中多条远端记录
    DuplicateUploadKey,    // 上传数据内匹配键重复
    UnknownTag,            // 标签不存在于当前组织
    UnknownOrg,            // 下级组织不存在
    MajorChange,           // 单字段大面积覆盖预警
}

// ==========================================
// ValidationProblem - 预检校验问题
// ==========================================
// 传播: 可恢复问题一律收集进清单,随数据一并展示,不抛异常
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationProblem {
    pub kind: ProblemKind,
    pub severity: ProblemSeverity,
    pub rows: Vec<usize>,   // 涉及的上传行号（映射级问题可为空）
    pub message: String,    // 人类可读描述
    pub acknowledged: bool, // 用户是否已确认
}

impl ValidationProblem {
    /// 是否阻断导入提交（阻断级且未确认）
    pub fn blocks_commit(&self) -> bool {
        self.severity == ProblemSeverity::Blocking && !self.acknowledged
    }
}

// ==========================================
// PreflightOutcome - 预检阶段完整产物
// ==========================================
// 生命周期: 返回配置步骤或重新开始即整体丢弃
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreflightOutcome {
    pub batch_id: String,                 // 预检批次 ID（UUID）
    pub summary: PreflightSummary,        // 汇总统计
    pub problems: Vec<ValidationProblem>, // 问题清单（含确认状态）
    pub diffs: Vec<RecordDiff>,           // 比对明细
    pub records: Vec<NormalizedRecord>,   // 标准化记录（提交时取字段值）
}

// ==========================================
// ImportReport - 导入提交结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch_id: String,
    pub created: usize,      // 新建人数
    pub updated: usize,      // 更新人数
    pub tagged: usize,       // 打标签人数
    pub added_to_org: usize, // 加入组织人数
    pub elapsed_ms: i64,     // 提交耗时（毫秒）
    pub completed_at: DateTime<Utc>,
}
