// ==========================================
// 组织动员平台 - 名册导入 - 导入流程控制器
// ==========================================
// 职责: 四步向导状态机,整合管道各阶段与远端客户端
// 步骤: 解析 → 配置 → 预检 → 报告
// 红线: 全部流程状态由本控制器独占持有,
//       只响应显式用户动作,无隐式/定时切换
// ==========================================

use crate::config::ImportPolicy;
use crate::domain::import::{
    ColumnMapping, ImportReport, NormalizedRecord, PreflightOutcome, RecordDiff,
};
use crate::domain::person::{FieldValue, PersonField};
use crate::domain::types::{ImportStep, RecordAction};
use crate::i18n;
use crate::importer::column_mapper::ColumnMapper as ColumnMapperImpl;
use crate::importer::diff_engine::RosterDiffer as RosterDifferImpl;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::preflight_builder::PreflightBuilder as PreflightBuilderImpl;
use crate::importer::roster_import_trait::{
    ColumnMapper, FileParser, PreflightBuilder, RosterDiffer,
};
use crate::remote::error::ClientError;
use crate::remote::roster_client::RemoteDataClient;
use chrono::Utc;
use futures::future;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ImportWorkflow - 导入流程控制器
// ==========================================
pub struct ImportWorkflow<C>
where
    C: RemoteDataClient,
{
    // 目标组织
    org_id: i64,

    // 远端数据访问
    client: C,

    // 导入策略
    policy: ImportPolicy,

    // 管道阶段组件
    file_parser: Box<dyn FileParser>,
    column_mapper: Box<dyn ColumnMapper>,
    differ: Box<dyn RosterDiffer>,
    preflight_builder: Box<dyn PreflightBuilder>,

    // 流程状态（由控制器独占持有）
    step: ImportStep,
    rows: Vec<crate::domain::import::UploadedRow>,
    mappings: Vec<ColumnMapping>,
    match_key: PersonField,
    preflight: Option<PreflightOutcome>,
    report: Option<ImportReport>,
}

/// 提交计数器（单次 commit 内累计）
#[derive(Default)]
struct CommitTally {
    created: usize,
    updated: usize,
    tagged: usize,
    added_to_org: usize,
    completed: usize,
}

impl<C> ImportWorkflow<C>
where
    C: RemoteDataClient,
{
    /// 创建控制器（默认管道组件）
    ///
    /// # 参数
    /// - org_id: 目标组织 ID
    /// - client: 远端数据客户端
    /// - policy: 导入策略
    pub fn new(org_id: i64, client: C, policy: ImportPolicy) -> Self {
        let file_parser = Box::new(UniversalFileParser);
        let column_mapper = Box::new(ColumnMapperImpl::new(policy.clone()));
        let differ = Box::new(RosterDifferImpl);
        let preflight_builder = Box::new(PreflightBuilderImpl::new(policy.clone()));

        Self::with_components(
            org_id,
            client,
            policy,
            file_parser,
            column_mapper,
            differ,
            preflight_builder,
        )
    }

    /// 创建控制器（注入管道组件）
    #[allow(clippy::too_many_arguments)]
    pub fn with_components(
        org_id: i64,
        client: C,
        policy: ImportPolicy,
        file_parser: Box<dyn FileParser>,
        column_mapper: Box<dyn ColumnMapper>,
        differ: Box<dyn RosterDiffer>,
        preflight_builder: Box<dyn PreflightBuilder>,
    ) -> Self {
        Self {
            org_id,
            client,
            policy,
            file_parser,
            column_mapper,
            differ,
            preflight_builder,
            step: ImportStep::Parse,
            rows: Vec::new(),
            mappings: Vec::new(),
            match_key: PersonField::Email,
            preflight: None,
            report: None,
        }
    }

    /// 当前步骤
    pub fn step(&self) -> ImportStep {
        self.step
    }

    /// 预检产物（仅 PREFLIGHT 步骤有值）
    pub fn preflight(&self) -> Option<&PreflightOutcome> {
        self.preflight.as_ref()
    }

    /// 导入报告（仅 REPORT 步骤有值）
    pub fn report(&self) -> Option<&ImportReport> {
        self.report.as_ref()
    }

    /// 解析上传文件（PARSE → CONFIGURE）
    ///
    /// # 参数
    /// - file_path: 上传文件路径（.xlsx/.xls/.csv）
    /// - first_row_is_headers: 首行是否为表头（表头行不参与导入）
    ///
    /// # 返回
    /// - Ok(usize): 数据行数
    /// - Err: 解析失败,步骤保持 PARSE
    #[instrument(skip(self, file_path))]
    pub fn parse_file<P: AsRef<Path>>(
        &mut self,
        file_path: P,
        first_row_is_headers: bool,
    ) -> ImportResult<usize> {
        self.ensure_step(ImportStep::Parse)?;

        let path = file_path.as_ref();
        let mut rows = self.file_parser.parse_rows(path)?;
        if first_row_is_headers && !rows.is_empty() {
            rows.remove(0);
        }
        if rows.is_empty() {
            return Err(ImportError::EmptyUpload);
        }

        info!(file = %path.display(), rows = rows.len(), "文件解析完成");
        self.rows = rows;
        self.step = ImportStep::Configure;
        Ok(self.rows.len())
    }

    /// 配置列映射与匹配键（CONFIGURE 步骤）
    ///
    /// 列冲突立即拒绝;身份字段覆盖情况在预检动作时校验
    pub fn set_mappings(
        &mut self,
        mappings: Vec<ColumnMapping>,
        match_key: PersonField,
    ) -> ImportResult<()> {
        self.ensure_step(ImportStep::Configure)?;
        self.column_mapper.validate_mappings(&mappings)?;

        debug!(mappings = mappings.len(), match_key = %match_key, "映射配置已更新");
        self.mappings = mappings;
        self.match_key = match_key;
        Ok(())
    }

    /// 预检（CONFIGURE → PREFLIGHT）
    ///
    /// 并发拉取远端名册与标签/组织目录,
    /// 依次执行列映射 → 名册比对 → 汇总与问题清单
    ///
    /// # 失败语义
    /// - 身份字段未映射: 拒绝,步骤保持 CONFIGURE
    /// - 远端拉取失败: 错误上抛,步骤保持 CONFIGURE,中间产物不保留
    #[instrument(skip(self))]
    pub async fn validate(&mut self) -> ImportResult<&PreflightOutcome> {
        self.ensure_step(ImportStep::Configure)?;
        if self.mappings.is_empty() || !self.policy.identity_mapped(&self.mappings) {
            return Err(ImportError::RequiredFieldUnmapped {
                hint: self.policy.identity_hint(),
            });
        }

        let batch_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        info!(
            batch_id = %batch_id,
            org_id = self.org_id,
            rows = self.rows.len(),
            "开始预检"
        );

        // 并发拉取远端基准数据
        let (existing, tags, sub_orgs) = future::try_join3(
            self.client.fetch_roster(self.org_id),
            self.client.fetch_tags(self.org_id),
            self.client.fetch_sub_orgs(self.org_id),
        )
        .await?;
        debug!(
            roster = existing.len(),
            tags = tags.len(),
            sub_orgs = sub_orgs.len(),
            "远端基准数据拉取完成"
        );

        // 阶段 1: 列映射标准化
        let resolved = self.column_mapper.resolve(&self.rows, &self.mappings)?;

        // 阶段 2: 名册比对
        let outcome = self
            .differ
            .diff(&resolved.records, &existing, self.match_key);

        // 阶段 3: 汇总与问题清单
        let valid_tags: HashSet<i64> = tags.iter().map(|tag| tag.id).collect();
        let valid_orgs: HashSet<i64> = sub_orgs.iter().map(|org| org.id).collect();
        let (summary, stage_problems) =
            self.preflight_builder
                .build(&outcome, &resolved.records, &valid_tags, &valid_orgs);

        let mut problems = resolved.problems;
        problems.extend(stage_problems);

        info!(
            batch_id = %batch_id,
            created = summary.people_created.total,
            updated = summary.people_updated.total,
            no_change = summary.people_no_change,
            problems = problems.len(),
            elapsed_ms = started.elapsed().as_millis() as i64,
            "预检完成"
        );

        let preflight = PreflightOutcome {
            batch_id,
            summary,
            problems,
            diffs: outcome.diffs,
            records: resolved.records,
        };
        self.step = ImportStep::Preflight;
        Ok(self.preflight.insert(preflight))
    }

    /// 确认单条校验问题（PREFLIGHT 步骤）
    pub fn acknowledge_problem(&mut self, index: usize) -> ImportResult<()> {
        let preflight = self.preflight_mut()?;
        match preflight.problems.get_mut(index) {
            Some(problem) => {
                problem.acknowledged = true;
                Ok(())
            }
            None => Err(ImportError::InvalidInput(format!(
                "问题下标越界: {}",
                index
            ))),
        }
    }

    /// 确认全部校验问题（PREFLIGHT 步骤）
    pub fn acknowledge_all(&mut self) -> ImportResult<()> {
        let preflight = self.preflight_mut()?;
        for problem in &mut preflight.problems {
            problem.acknowledged = true;
        }
        Ok(())
    }

    /// 提交是否被禁用（存在未确认的阻断级问题）
    pub fn commit_disabled(&self) -> bool {
        match &self.preflight {
            Some(preflight) => preflight
                .problems
                .iter()
                .any(|problem| problem.blocks_commit()),
            None => true,
        }
    }

    /// 返回配置步骤（PREFLIGHT → CONFIGURE）,丢弃预检产物
    pub fn back(&mut self) -> ImportResult<()> {
        self.ensure_step(ImportStep::Preflight)?;
        self.preflight = None;
        self.step = ImportStep::Configure;
        Ok(())
    }

    /// 提交导入（PREFLIGHT → REPORT）
    ///
    /// 逐条提交,无跨记录事务保证;首个失败即中止,
    /// 步骤保持 PREFLIGHT,由用户决定重试或退回。
    /// 重试会重新执行同一提交流程,不做自动重试。
    #[instrument(skip(self))]
    pub async fn commit(&mut self) -> ImportResult<&ImportReport> {
        self.ensure_step(ImportStep::Preflight)?;
        if self.commit_disabled() {
            let unacknowledged = self
                .preflight
                .as_ref()
                .map(|preflight| {
                    preflight
                        .problems
                        .iter()
                        .filter(|problem| problem.blocks_commit())
                        .count()
                })
                .unwrap_or(0);
            return Err(ImportError::CommitBlocked(unacknowledged));
        }

        let preflight = match self.preflight.clone() {
            Some(preflight) => preflight,
            None => {
                return Err(ImportError::InvalidStateTransition {
                    from: self.step,
                    to: ImportStep::Preflight,
                })
            }
        };

        let started = Instant::now();
        info!(batch_id = %preflight.batch_id, diffs = preflight.diffs.len(), "开始提交导入");

        // 行号 → 标准化记录
        let records: HashMap<usize, &NormalizedRecord> = preflight
            .records
            .iter()
            .map(|record| (record.row_number, record))
            .collect();

        let mut tally = CommitTally::default();
        for diff in &preflight.diffs {
            let record = match records.get(&diff.row_number) {
                Some(record) => *record,
                None => continue,
            };
            if let Err(e) = self.commit_record(diff, record, &mut tally).await {
                error!(
                    batch_id = %preflight.batch_id,
                    row = diff.row_number,
                    completed = tally.completed,
                    error = %e,
                    "导入提交失败,流程停留在预检步骤"
                );
                return Err(ImportError::CommitFailure {
                    completed: tally.completed,
                    reason: e.to_string(),
                });
            }
        }

        let report = ImportReport {
            batch_id: preflight.batch_id.clone(),
            created: tally.created,
            updated: tally.updated,
            tagged: tally.tagged,
            added_to_org: tally.added_to_org,
            elapsed_ms: started.elapsed().as_millis() as i64,
            completed_at: Utc::now(),
        };
        info!(
            batch_id = %report.batch_id,
            created = report.created,
            updated = report.updated,
            tagged = report.tagged,
            added_to_org = report.added_to_org,
            elapsed_ms = report.elapsed_ms,
            "导入提交完成"
        );

        self.preflight = None;
        self.step = ImportStep::Report;
        Ok(self.report.insert(report))
    }

    /// 重新开始（任意步骤 → PARSE）,清空全部中间产物
    pub fn restart(&mut self) {
        self.rows.clear();
        self.mappings.clear();
        self.preflight = None;
        self.report = None;
        self.step = ImportStep::Parse;
    }

    /// 关闭向导,等价于重新开始
    pub fn close(&mut self) {
        self.restart();
    }

    /// 当前步骤的状态提示文案（交由外层界面展示）
    pub fn status_message(&self) -> String {
        match self.step {
            ImportStep::Parse => i18n::t("workflow.status.parse"),
            ImportStep::Configure => i18n::t_with_args(
                "workflow.status.configure",
                &[("rows", &self.rows.len().to_string())],
            ),
            ImportStep::Preflight => {
                if self.commit_disabled() {
                    i18n::t("workflow.status.preflight_blocked")
                } else {
                    i18n::t("workflow.status.preflight_ready")
                }
            }
            ImportStep::Report => i18n::t("workflow.status.report"),
        }
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn ensure_step(&self, expected: ImportStep) -> ImportResult<()> {
        if self.step != expected {
            return Err(ImportError::InvalidStateTransition {
                from: self.step,
                to: expected,
            });
        }
        Ok(())
    }

    fn preflight_mut(&mut self) -> ImportResult<&mut PreflightOutcome> {
        let from = self.step;
        match self.preflight.as_mut() {
            Some(preflight) if from == ImportStep::Preflight => Ok(preflight),
            _ => Err(ImportError::InvalidStateTransition {
                from,
                to: ImportStep::Preflight,
            }),
        }
    }

    /// 提交单条记录
    async fn commit_record(
        &self,
        diff: &RecordDiff,
        record: &NormalizedRecord,
        tally: &mut CommitTally,
    ) -> Result<(), ClientError> {
        match diff.action {
            RecordAction::NoChange => Ok(()),
            RecordAction::Create => {
                let person = self.client.create_person(self.org_id, &record.fields).await?;
                tally.created += 1;
                self.commit_assignments(person.id, record, tally).await?;
                tally.completed += 1;
                Ok(())
            }
            RecordAction::Update => {
                let person_id = match diff.matched_id {
                    Some(person_id) => person_id,
                    None => {
                        // 不变量破坏: Update 必有命中 ID,按跳过处理并留痕
                        warn!(row = diff.row_number, "更新类比对结果缺失命中 ID,已跳过");
                        return Ok(());
                    }
                };

                // 只补丁发生变化的字段
                let patch: BTreeMap<PersonField, FieldValue> = diff
                    .changes
                    .iter()
                    .map(|change| (change.field, change.new.clone()))
                    .collect();
                self.client
                    .update_person(self.org_id, person_id, &patch)
                    .await?;
                tally.updated += 1;
                self.commit_assignments(person_id, record, tally).await?;
                tally.completed += 1;
                Ok(())
            }
        }
    }

    /// 提交标签与组织派生（仅 Create/Update 记录调用）
    async fn commit_assignments(
        &self,
        person_id: i64,
        record: &NormalizedRecord,
        tally: &mut CommitTally,
    ) -> Result<(), ClientError> {
        for tag_id in &record.tags {
            self.client
                .assign_tag(self.org_id, person_id, *tag_id)
                .await?;
        }
        if !record.tags.is_empty() {
            tally.tagged += 1;
        }

        for org_id in &record.orgs {
            self.client
                .add_to_org(self.org_id, *org_id, person_id)
                .await?;
        }
        if !record.orgs.is_empty() {
            tally.added_to_org += 1;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::MappingTarget;
    use crate::domain::person::{ExistingRecord, SubOrgRecord, TagRecord};
    use crate::remote::error::ClientResult;
    use async_trait::async_trait;
    use std::io::Write;

    /// 内存版远端客户端（状态机单测用,集成测试另有完整替身）
    struct StubClient {
        roster: Vec<ExistingRecord>,
        fail_on_create: bool,
    }

    #[async_trait]
    impl RemoteDataClient for StubClient {
        async fn fetch_roster(&self, _org_id: i64) -> ClientResult<Vec<ExistingRecord>> {
            Ok(self.roster.clone())
        }

        async fn fetch_tags(&self, _org_id: i64) -> ClientResult<Vec<TagRecord>> {
            Ok(vec![TagRecord {
                id: 11,
                title: "志愿者".to_string(),
            }])
        }

        async fn fetch_sub_orgs(&self, _org_id: i64) -> ClientResult<Vec<SubOrgRecord>> {
            Ok(vec![SubOrgRecord {
                id: 7,
                title: "南区分部".to_string(),
            }])
        }

        async fn create_person(
            &self,
            _org_id: i64,
            fields: &BTreeMap<PersonField, FieldValue>,
        ) -> ClientResult<ExistingRecord> {
            if self.fail_on_create {
                return Err(ClientError::ApiStatus {
                    status: 500,
                    body: "内部错误".to_string(),
                });
            }
            Ok(ExistingRecord {
                id: 1000,
                fields: fields.clone(),
            })
        }

        async fn update_person(
            &self,
            _org_id: i64,
            person_id: i64,
            fields: &BTreeMap<PersonField, FieldValue>,
        ) -> ClientResult<ExistingRecord> {
            Ok(ExistingRecord {
                id: person_id,
                fields: fields.clone(),
            })
        }

        async fn assign_tag(&self, _org_id: i64, _person_id: i64, _tag_id: i64) -> ClientResult<()> {
            Ok(())
        }

        async fn add_to_org(
            &self,
            _org_id: i64,
            _sub_org_id: i64,
            _person_id: i64,
        ) -> ClientResult<()> {
            Ok(())
        }
    }

    fn workflow(fail_on_create: bool) -> ImportWorkflow<StubClient> {
        let client = StubClient {
            roster: Vec::new(),
            fail_on_create,
        };
        ImportWorkflow::new(1, client, ImportPolicy::default())
    }

    fn write_csv(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    fn email_mapping() -> Vec<ColumnMapping> {
        vec![ColumnMapping {
            column: 0,
            target: MappingTarget::Field {
                field: PersonField::Email,
            },
            transform: None,
        }]
    }

    #[tokio::test]
    async fn test_validate_before_parse_keeps_state() {
        let mut wf = workflow(false);

        let result = wf.validate().await;

        assert!(matches!(
            result,
            Err(ImportError::InvalidStateTransition { .. })
        ));
        assert_eq!(wf.step(), ImportStep::Parse);
        assert!(wf.preflight().is_none());
    }

    #[tokio::test]
    async fn test_validate_requires_identity_mapping() {
        let file = write_csv(&["email", "a@x.com"]);
        let mut wf = workflow(false);
        wf.parse_file(file.path(), true).unwrap();

        // 未配置任何映射
        let result = wf.validate().await;

        assert!(matches!(
            result,
            Err(ImportError::RequiredFieldUnmapped { .. })
        ));
        assert_eq!(wf.step(), ImportStep::Configure);
    }

    #[tokio::test]
    async fn test_full_happy_path() {
        let file = write_csv(&["email", "a@x.com"]);
        let mut wf = workflow(false);

        let rows = wf.parse_file(file.path(), true).unwrap();
        assert_eq!(rows, 1);
        assert_eq!(wf.step(), ImportStep::Configure);

        wf.set_mappings(email_mapping(), PersonField::Email).unwrap();
        let preflight = wf.validate().await.unwrap();
        assert_eq!(preflight.summary.people_created.total, 1);
        assert_eq!(wf.step(), ImportStep::Preflight);
        assert!(!wf.commit_disabled());

        let report = wf.commit().await.unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(wf.step(), ImportStep::Report);
    }

    #[tokio::test]
    async fn test_commit_failure_stays_in_preflight() {
        let file = write_csv(&["email", "a@x.com"]);
        let mut wf = workflow(true);
        wf.parse_file(file.path(), true).unwrap();
        wf.set_mappings(email_mapping(), PersonField::Email).unwrap();
        wf.validate().await.unwrap();

        let result = wf.commit().await;

        assert!(matches!(
            result,
            Err(ImportError::CommitFailure { completed: 0, .. })
        ));
        assert_eq!(wf.step(), ImportStep::Preflight);
        // 重试入口仍然可用
        assert!(wf.preflight().is_some());
    }

    #[tokio::test]
    async fn test_restart_clears_everything() {
        let file = write_csv(&["email", "a@x.com"]);
        let mut wf = workflow(false);
        wf.parse_file(file.path(), true).unwrap();
        wf.set_mappings(email_mapping(), PersonField::Email).unwrap();
        wf.validate().await.unwrap();

        wf.restart();

        assert_eq!(wf.step(), ImportStep::Parse);
        assert!(wf.preflight().is_none());
        assert!(wf.report().is_none());
    }

    #[tokio::test]
    async fn test_back_discards_preflight() {
        let file = write_csv(&["email", "a@x.com"]);
        let mut wf = workflow(false);
        wf.parse_file(file.path(), true).unwrap();
        wf.set_mappings(email_mapping(), PersonField::Email).unwrap();
        wf.validate().await.unwrap();

        wf.back().unwrap();

        assert_eq!(wf.step(), ImportStep::Configure);
        assert!(wf.preflight().is_none());
    }
}
