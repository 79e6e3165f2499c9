// ==========================================
// 组织动员平台 - 名册导入 - 导入层
// ==========================================
// 职责: 上传文件 → 标准化 → 比对 → 预检 → 提交
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod column_mapper;
pub mod diff_engine;
pub mod error;
pub mod file_parser;
pub mod preflight_builder;
pub mod roster_import_trait;
pub mod workflow;

// 重导出核心类型
pub use column_mapper::ColumnMapper as ColumnMapperImpl;
pub use diff_engine::RosterDiffer as RosterDifferImpl;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use preflight_builder::PreflightBuilder as PreflightBuilderImpl;
pub use workflow::ImportWorkflow;

// 重导出 Trait 接口
pub use roster_import_trait::{ColumnMapper, FileParser, PreflightBuilder, RosterDiffer};
