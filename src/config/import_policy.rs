// ==========================================
// 组织动员平台 - 名册导入 - 导入策略配置
// ==========================================
// 职责: 身份字段规则 / 日期默认格式 / 问题严重级别 / 预警阈值
// 红线: 策略显式传入各阶段,不设全局可变配置
// ==========================================

use crate::domain::import::{ColumnMapping, MappingTarget, NormalizedRecord, ProblemKind};
use crate::domain::person::PersonField;
use crate::domain::types::ProblemSeverity;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// ==========================================
// ImportPolicy - 导入策略
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportPolicy {
    /// 身份判定规则: 任一分组内全部字段齐备即视为可识别
    /// 默认: 外部 ID / 邮箱 / 姓+名
    pub identity_rules: Vec<Vec<PersonField>>,

    /// 日期类字段默认解析格式（未配置显式转换时依次尝试）
    pub date_formats: Vec<String>,

    /// 单字段大面积覆盖预警阈值（占已匹配记录的比例）
    pub major_change_ratio: f64,

    /// 大面积覆盖预警的最小匹配基数（样本过小不预警）
    pub major_change_min_matched: usize,

    /// 各类校验问题的严重级别
    pub severities: BTreeMap<ProblemKind, ProblemSeverity>,
}

impl Default for ImportPolicy {
    fn default() -> Self {
        let mut severities = BTreeMap::new();
        severities.insert(ProblemKind::MappingConflict, ProblemSeverity::Blocking);
        severities.insert(ProblemKind::RequiredFieldUnmapped, ProblemSeverity::Blocking);
        severities.insert(ProblemKind::InvalidValue, ProblemSeverity::Warning);
        severities.insert(ProblemKind::MissingIdentity, ProblemSeverity::Blocking);
        severities.insert(ProblemKind::AmbiguousMatch, ProblemSeverity::Blocking);
        severities.insert(ProblemKind::DuplicateUploadKey, ProblemSeverity::Warning);
        severities.insert(ProblemKind::UnknownTag, ProblemSeverity::Blocking);
        severities.insert(ProblemKind::UnknownOrg, ProblemSeverity::Blocking);
        severities.insert(ProblemKind::MajorChange, ProblemSeverity::Warning);

        Self {
            identity_rules: vec![
                vec![PersonField::ExtId],
                vec![PersonField::Email],
                vec![PersonField::FirstName, PersonField::LastName],
            ],
            date_formats: vec![
                "%Y-%m-%d".to_string(),
                "%Y%m%d".to_string(),
                "%Y/%m/%d".to_string(),
                "%d.%m.%Y".to_string(),
            ],
            major_change_ratio: 0.3,
            major_change_min_matched: 5,
            severities,
        }
    }
}

impl ImportPolicy {
    /// 查询问题严重级别（未配置的类型按警告处理）
    pub fn severity_of(&self, kind: ProblemKind) -> ProblemSeverity {
        self.severities
            .get(&kind)
            .copied()
            .unwrap_or(ProblemSeverity::Warning)
    }

    /// 单条记录是否满足身份判定规则
    pub fn satisfies_identity(&self, record: &NormalizedRecord) -> bool {
        self.identity_rules.iter().any(|group| {
            group.iter().all(|field| {
                record
                    .field(*field)
                    .map(|value| !value.is_blank())
                    .unwrap_or(false)
            })
        })
    }

    /// 映射配置是否覆盖了至少一组身份字段
    pub fn identity_mapped(&self, mappings: &[ColumnMapping]) -> bool {
        let mapped: HashSet<PersonField> = mappings
            .iter()
            .filter_map(|m| match m.target {
                MappingTarget::Field { field } => Some(field),
                _ => None,
            })
            .collect();

        self.identity_rules
            .iter()
            .any(|group| group.iter().all(|field| mapped.contains(field)))
    }

    /// 身份规则的提示文案（如 "ext_id / email / first_name+last_name"）
    pub fn identity_hint(&self) -> String {
        self.identity_rules
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(|field| field.as_str())
                    .collect::<Vec<_>>()
                    .join("+")
            })
            .collect::<Vec<_>>()
            .join(" / ")
    }
}
