// ==========================================
// 组织动员平台 - 名册导入 - 列映射解析器实现
// ==========================================
// 职责: 阶段 1,原始行 × 映射配置 → 标准化记录
// 红线: 纯函数,相同 (rows, mappings) 必得相同输出
// ==========================================

use crate::config::ImportPolicy;
use crate::domain::import::{
    ColumnMapping, MappingTarget, NormalizedRecord, ProblemKind, ResolvedRoster, UploadedRow,
    ValidationProblem, ValueTransform,
};
use crate::domain::person::{FieldValue, PersonField};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::roster_import_trait::ColumnMapper as ColumnMapperTrait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};

pub struct ColumnMapper {
    policy: ImportPolicy,
}

impl ColumnMapper {
    pub fn new(policy: ImportPolicy) -> Self {
        Self { policy }
    }
}

impl ColumnMapperTrait for ColumnMapper {
    /// 校验映射配置（同一源列至多一个目标）
    fn validate_mappings(&self, mappings: &[ColumnMapping]) -> ImportResult<()> {
        let mut seen = HashSet::new();
        for mapping in mappings {
            if !seen.insert(mapping.column) {
                return Err(ImportError::MappingConflict {
                    column: mapping.column,
                });
            }
        }
        Ok(())
    }

    fn resolve(
        &self,
        rows: &[UploadedRow],
        mappings: &[ColumnMapping],
    ) -> ImportResult<ResolvedRoster> {
        self.validate_mappings(mappings)?;

        let mut resolved = ResolvedRoster::default();

        for row in rows {
            let mut fields = BTreeMap::new();
            let mut tags = Vec::new();
            let mut orgs = Vec::new();

            for mapping in mappings {
                let cell = match row.cells.get(mapping.column) {
                    Some(cell) => cell.trim(),
                    None => continue, // 行长不足,视同空单元格
                };
                if cell.is_empty() {
                    continue;
                }

                match &mapping.target {
                    MappingTarget::Field { field } => {
                        match self.convert_value(*field, cell, mapping.transform.as_ref()) {
                            Ok(value) => {
                                fields.insert(*field, value);
                            }
                            Err(message) => {
                                // 取值失败不阻断整批: 字段留空,记录行级问题
                                resolved.problems.push(ValidationProblem {
                                    kind: ProblemKind::InvalidValue,
                                    severity: self.policy.severity_of(ProblemKind::InvalidValue),
                                    rows: vec![row.row_number],
                                    message: format!(
                                        "行 {} 列 {}: {}",
                                        row.row_number, mapping.column, message
                                    ),
                                    acknowledged: false,
                                });
                            }
                        }
                    }
                    MappingTarget::Tag { tag_id } => {
                        if cell_is_truthy(cell) {
                            tags.push(*tag_id);
                        }
                    }
                    MappingTarget::Org { org_id } => {
                        if cell_is_truthy(cell) {
                            orgs.push(*org_id);
                        }
                    }
                }
            }

            let mut record = NormalizedRecord {
                row_number: row.row_number,
                fields,
                tags,
                orgs,
                missing_identity: false,
            };

            // 映射列全空的行直接丢弃
            if record.is_empty() {
                continue;
            }

            record.missing_identity = !self.policy.satisfies_identity(&record);
            resolved.records.push(record);
        }

        Ok(resolved)
    }
}

impl ColumnMapper {
    /// 单元格取值转换
    ///
    /// 显式转换规则优先;日期类字段无显式规则时依次尝试策略默认格式
    fn convert_value(
        &self,
        field: PersonField,
        raw: &str,
        transform: Option<&ValueTransform>,
    ) -> Result<FieldValue, String> {
        if let Some(ValueTransform::ParseDate { format }) = transform {
            return NaiveDate::parse_from_str(raw, format)
                .map(FieldValue::Date)
                .map_err(|_| format!("无法按格式 {} 解析日期: {}", format, raw));
        }

        if field.is_date() {
            for format in &self.policy.date_formats {
                if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
                    return Ok(FieldValue::Date(date));
                }
            }
            return Err(format!("日期格式无法识别: {}", raw));
        }

        Ok(FieldValue::Text(raw.to_string()))
    }
}

/// 标签/组织列的命中判定（非空且非否定标记）
fn cell_is_truthy(cell: &str) -> bool {
    !matches!(
        cell.trim().to_uppercase().as_str(),
        "" | "0" | "N" | "NO" | "FALSE" | "否"
    )
}
