// ==========================================
// 组织动员平台 - 名册导入 - 领域模型层
// ==========================================
// 职责: 定义领域实体与封闭类型
// 红线: 不含数据访问逻辑,不含管道逻辑
// ==========================================

pub mod import;
pub mod person;
pub mod types;

// 重导出核心类型
pub use import::{
    AddedToOrgSummary, AmbiguousMatch, ColumnMapping, CreatedSummary, DiffOutcome, FieldChange,
    ImportReport, MappingTarget, NormalizedRecord, PreflightOutcome, PreflightSummary,
    ProblemKind, RecordDiff, ResolvedRoster, TaggedSummary, UpdatedSummary, UploadedRow,
    ValidationProblem, ValueTransform,
};
pub use person::{ExistingRecord, FieldValue, PersonField, SubOrgRecord, TagRecord, UnknownField};
pub use types::{ImportStep, ProblemSeverity, RecordAction};
