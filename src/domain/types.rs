// ==========================================
// 组织动员平台 - 名册导入 - 领域类型定义
// ==========================================
// 职责: 导入流程的封闭小枚举（步骤/严重级别/动作分类）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 导入步骤 (Import Step)
// ==========================================
// 四步向导: 解析 → 配置 → 预检 → 报告
// 步骤切换只由显式用户动作驱动,无定时/隐式切换
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStep {
    Parse,     // 上传并解析文件
    Configure, // 配置列映射
    Preflight, // 预检（差异预览 + 问题确认）
    Report,    // 导入完成报告
}

impl fmt::Display for ImportStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportStep::Parse => write!(f, "PARSE"),
            ImportStep::Configure => write!(f, "CONFIGURE"),
            ImportStep::Preflight => write!(f, "PREFLIGHT"),
            ImportStep::Report => write!(f, "REPORT"),
        }
    }
}

// ==========================================
// 问题严重级别 (Problem Severity)
// ==========================================
// 阻断级问题须逐条人工确认后方可提交导入
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemSeverity {
    Info,     // 提示（仅记录）
    Warning,  // 警告（允许导入）
    Blocking, // 阻断（确认后放行）
}

impl fmt::Display for ProblemSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemSeverity::Info => write!(f, "INFO"),
            ProblemSeverity::Warning => write!(f, "WARNING"),
            ProblemSeverity::Blocking => write!(f, "BLOCKING"),
        }
    }
}

// ==========================================
// 记录动作分类 (Record Action)
// ==========================================
// 比对结果: 未命中远端记录 → Create;
// 命中且至少一个字段不同 → Update; 其余 → NoChange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordAction {
    Create,   // 新建人员
    Update,   // 更新已有人员
    NoChange, // 无变化
}

impl fmt::Display for RecordAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordAction::Create => write!(f, "CREATE"),
            RecordAction::Update => write!(f, "UPDATE"),
            RecordAction::NoChange => write!(f, "NO_CHANGE"),
        }
    }
}
