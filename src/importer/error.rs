// ==========================================
// 组织动员平台 - 名册导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 传播: 可恢复的数据问题走 ValidationProblem 清单,
//       此处只保留配置/流程/远端层面的硬错误
// ==========================================

use crate::domain::types::ImportStep;
use crate::remote::error::ClientError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("上传内容为空,无可导入数据")]
    EmptyUpload,

    // ===== 映射配置错误 =====
    #[error("未知人员字段: {0}")]
    UnknownField(String),

    #[error("列映射冲突: 第 {column} 列被配置了多个目标")]
    MappingConflict { column: usize },

    #[error("身份字段未映射: 至少需映射 {hint} 之一")]
    RequiredFieldUnmapped { hint: String },

    // ===== 流程状态错误 =====
    #[error("步骤不允许该操作: 当前 {from},需处于 {to}")]
    InvalidStateTransition { from: ImportStep, to: ImportStep },

    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ===== 提交错误 =====
    #[error("存在 {0} 个未确认的阻断级问题,无法提交导入")]
    CommitBlocked(usize),

    #[error("导入提交失败（已写入 {completed} 条）: {reason}")]
    CommitFailure { completed: usize, reason: String },

    // ===== 远端接口错误 =====
    #[error(transparent)]
    Client(#[from] ClientError),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<UnknownField>（字段标识在映射配置期校验）
impl From<crate::domain::person::UnknownField> for ImportError {
    fn from(err: crate::domain::person::UnknownField) -> Self {
        ImportError::UnknownField(err.0)
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
