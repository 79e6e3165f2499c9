// ==========================================
// 组织动员平台 - 名册导入 - 名册比对引擎实现
// ==========================================
// 职责: 阶段 2,标准化记录 × 远端名册 → 逐条分类与字段变更
// 红线: 只读投影,绝不修改远端数据;相同输入必得相同输出
// ==========================================

use crate::domain::import::{
    AmbiguousMatch, DiffOutcome, FieldChange, NormalizedRecord, RecordDiff,
};
use crate::domain::person::{ExistingRecord, PersonField};
use crate::domain::types::RecordAction;
use crate::importer::roster_import_trait::RosterDiffer as RosterDifferTrait;
use std::collections::HashMap;

pub struct RosterDiffer;

impl RosterDifferTrait for RosterDiffer {
    fn diff(
        &self,
        normalized: &[NormalizedRecord],
        existing: &[ExistingRecord],
        match_key: PersonField,
    ) -> DiffOutcome {
        // 匹配索引: 标准化键 → 远端记录下标（保持名册顺序）
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, record) in existing.iter().enumerate() {
            if let Some(value) = record.field(match_key) {
                let key = normalize_key(&value.as_text());
                if key.is_empty() {
                    continue;
                }
                index.entry(key).or_default().push(idx);
            }
        }

        let mut outcome = DiffOutcome::default();
        // 键 → 首次出现行号,用于检测上传数据内重复
        let mut seen_keys: HashMap<String, usize> = HashMap::new();

        for record in normalized {
            let key = record
                .field(match_key)
                .map(|value| normalize_key(&value.as_text()))
                .filter(|key| !key.is_empty());

            if let Some(key) = &key {
                if seen_keys.contains_key(key) {
                    outcome.duplicate_keys.push((record.row_number, key.clone()));
                } else {
                    seen_keys.insert(key.clone(), record.row_number);
                }
            }

            let candidates: &[usize] = key
                .as_ref()
                .and_then(|key| index.get(key))
                .map(|v| v.as_slice())
                .unwrap_or(&[]);

            // 无命中 → 新建
            if candidates.is_empty() {
                outcome.diffs.push(RecordDiff {
                    row_number: record.row_number,
                    action: RecordAction::Create,
                    matched_id: None,
                    changes: Vec::new(),
                });
                continue;
            }

            // 命中多条: 上报歧义,仍按名册顺序取第一条比对
            if candidates.len() > 1 {
                outcome.ambiguous.push(AmbiguousMatch {
                    row_number: record.row_number,
                    key: key.clone().unwrap_or_default(),
                    candidate_ids: candidates.iter().map(|&i| existing[i].id).collect(),
                });
            }

            let matched = &existing[candidates[0]];
            let changes = field_changes(record, matched);
            let action = if changes.is_empty() {
                RecordAction::NoChange
            } else {
                RecordAction::Update
            };

            outcome.diffs.push(RecordDiff {
                row_number: record.row_number,
                action,
                matched_id: Some(matched.id),
                changes,
            });
        }

        outcome
    }
}

/// 匹配键标准化（去首尾空白 + 小写）
fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// 字段级比对
///
/// 仅对标准化记录中出现的字段生成变更三元组;
/// 记录中缺失的字段绝不产生变更（不会误清远端已有数据）
fn field_changes(record: &NormalizedRecord, matched: &ExistingRecord) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    for (field, new_value) in &record.fields {
        match matched.field(*field) {
            Some(old) if old.loosely_equals(new_value) => {}
            Some(old) if old.is_blank() => changes.push(FieldChange {
                field: *field,
                old: None, // 原值为空按初始化处理
                new: new_value.clone(),
            }),
            Some(old) => changes.push(FieldChange {
                field: *field,
                old: Some(old.clone()),
                new: new_value.clone(),
            }),
            None => changes.push(FieldChange {
                field: *field,
                old: None,
                new: new_value.clone(),
            }),
        }
    }

    changes
}
