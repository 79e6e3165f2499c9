// ==========================================
// 组织动员平台 - 名册导入引擎 - 核心库
// ==========================================
// 技术栈: Rust + 平台 HTTP API
// 系统定位: 导入预检引擎 (人工最终确认权)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 远端数据层 - 平台 API 访问
pub mod remote;

// 导入层 - 管道与流程控制
pub mod importer;

// 配置层 - 导入策略
pub mod config;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ImportStep, ProblemSeverity, RecordAction};

// 领域实体
pub use domain::{
    AmbiguousMatch, ColumnMapping, DiffOutcome, ExistingRecord, FieldChange, FieldValue,
    ImportReport, MappingTarget, NormalizedRecord, PersonField, PreflightOutcome,
    PreflightSummary, ProblemKind, RecordDiff, SubOrgRecord, TagRecord, UploadedRow,
    ValidationProblem, ValueTransform,
};

// 导入管道
pub use importer::{
    ColumnMapperImpl, CsvParser, ExcelParser, ImportError, ImportResult, ImportWorkflow,
    PreflightBuilderImpl, RosterDifferImpl, UniversalFileParser,
};

// 远端客户端
pub use remote::{ClientError, HttpRosterClient, RemoteDataClient};

// 配置
pub use config::ImportPolicy;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "名册导入引擎";

// ==========================================
// 预编译检查
// ==========================================
