// ==========================================
// 组织动员平台 - 名册导入 - 预检汇总器实现
// ==========================================
// 职责: 阶段 3,比对结果 → 汇总统计 + 问题清单
// 复杂度: O(比对条数 + 派生数),单次折叠
// ==========================================

use crate::config::ImportPolicy;
use crate::domain::import::{
    DiffOutcome, NormalizedRecord, PreflightSummary, ProblemKind, ValidationProblem,
};
use crate::domain::types::RecordAction;
use crate::importer::roster_import_trait::PreflightBuilder as PreflightBuilderTrait;
use std::collections::{BTreeMap, HashSet};

pub struct PreflightBuilder {
    policy: ImportPolicy,
}

impl PreflightBuilder {
    pub fn new(policy: ImportPolicy) -> Self {
        Self { policy }
    }
}

impl PreflightBuilderTrait for PreflightBuilder {
    fn build(
        &self,
        outcome: &DiffOutcome,
        records: &[NormalizedRecord],
        valid_tags: &HashSet<i64>,
        valid_orgs: &HashSet<i64>,
    ) -> (PreflightSummary, Vec<ValidationProblem>) {
        let mut summary = PreflightSummary::default();

        // 计入标签/组织统计的行（仅 Create/Update）
        let mut counted_rows: HashSet<usize> = HashSet::new();

        for diff in &outcome.diffs {
            match diff.action {
                RecordAction::Create => {
                    summary.people_created.total += 1;
                    counted_rows.insert(diff.row_number);
                }
                RecordAction::Update => {
                    summary.people_updated.total += 1;
                    counted_rows.insert(diff.row_number);
                    for change in &diff.changes {
                        if change.old.is_some() {
                            *summary
                                .people_updated
                                .by_changed_field
                                .entry(change.field)
                                .or_insert(0) += 1;
                        } else {
                            *summary
                                .people_updated
                                .by_initialized_field
                                .entry(change.field)
                                .or_insert(0) += 1;
                        }
                    }
                }
                RecordAction::NoChange => {
                    summary.people_no_change += 1;
                }
            }
        }

        for record in records {
            if !counted_rows.contains(&record.row_number) {
                continue;
            }
            if !record.tags.is_empty() {
                summary.tagged.total += 1;
                for tag_id in &record.tags {
                    *summary.tagged.by_tag.entry(*tag_id).or_insert(0) += 1;
                }
            }
            if !record.orgs.is_empty() {
                summary.added_to_org.total += 1;
                for org_id in &record.orgs {
                    *summary.added_to_org.by_org.entry(*org_id).or_insert(0) += 1;
                }
            }
        }

        let problems = self.collect_problems(outcome, records, valid_tags, valid_orgs, &summary);

        (summary, problems)
    }
}

impl PreflightBuilder {
    fn problem(&self, kind: ProblemKind, rows: Vec<usize>, message: String) -> ValidationProblem {
        ValidationProblem {
            kind,
            severity: self.policy.severity_of(kind),
            rows,
            message,
            acknowledged: false,
        }
    }

    fn collect_problems(
        &self,
        outcome: &DiffOutcome,
        records: &[NormalizedRecord],
        valid_tags: &HashSet<i64>,
        valid_orgs: &HashSet<i64>,
        summary: &PreflightSummary,
    ) -> Vec<ValidationProblem> {
        let mut problems = Vec::new();

        // 身份字段缺失（聚合为一条,逐行列出行号）
        let incomplete: Vec<usize> = records
            .iter()
            .filter(|record| record.missing_identity)
            .map(|record| record.row_number)
            .collect();
        if !incomplete.is_empty() {
            let message = format!(
                "{} 行缺失身份字段（需 {} 之一）",
                incomplete.len(),
                self.policy.identity_hint()
            );
            problems.push(self.problem(ProblemKind::MissingIdentity, incomplete, message));
        }

        // 匹配键命中多条远端记录
        for ambiguous in &outcome.ambiguous {
            let message = format!(
                "匹配键 {} 命中 {} 条远端记录,已按名册顺序取第一条",
                ambiguous.key,
                ambiguous.candidate_ids.len()
            );
            problems.push(self.problem(
                ProblemKind::AmbiguousMatch,
                vec![ambiguous.row_number],
                message,
            ));
        }

        // 上传数据内匹配键重复（按键聚合）
        let mut duplicates_by_key: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (row_number, key) in &outcome.duplicate_keys {
            duplicates_by_key.entry(key).or_default().push(*row_number);
        }
        for (key, rows) in duplicates_by_key {
            let message = format!("匹配键 {} 在上传数据中出现多次", key);
            problems.push(self.problem(ProblemKind::DuplicateUploadKey, rows, message));
        }

        // 未知标签 / 未知下级组织（按 ID 聚合）
        let mut unknown_tags: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        let mut unknown_orgs: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for record in records {
            for tag_id in &record.tags {
                if !valid_tags.contains(tag_id) {
                    unknown_tags.entry(*tag_id).or_default().push(record.row_number);
                }
            }
            for org_id in &record.orgs {
                if !valid_orgs.contains(org_id) {
                    unknown_orgs.entry(*org_id).or_default().push(record.row_number);
                }
            }
        }
        for (tag_id, rows) in unknown_tags {
            let message = format!("标签 {} 不存在于当前组织", tag_id);
            problems.push(self.problem(ProblemKind::UnknownTag, rows, message));
        }
        for (org_id, rows) in unknown_orgs {
            let message = format!("下级组织 {} 不存在", org_id);
            problems.push(self.problem(ProblemKind::UnknownOrg, rows, message));
        }

        // 单字段大面积覆盖预警（匹配基数过小不评估）
        let matched_total = outcome
            .diffs
            .iter()
            .filter(|diff| diff.matched_id.is_some())
            .count();
        if matched_total >= self.policy.major_change_min_matched {
            for (field, count) in &summary.people_updated.by_changed_field {
                let ratio = *count as f64 / matched_total as f64;
                if ratio >= self.policy.major_change_ratio {
                    let message = format!(
                        "字段 {} 将在 {}/{} 条已匹配记录上被覆盖,请确认列映射无误",
                        field, count, matched_total
                    );
                    problems.push(self.problem(ProblemKind::MajorChange, Vec::new(), message));
                }
            }
        }

        problems
    }
}
