// ==========================================
// 组织动员平台 - 名册导入 - 管道阶段 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 红线: 阶段 1-3 均为纯函数语义,相同输入必得相同输出,
//       以支持预览随配置变化反复重算而无需重新拉取
// ==========================================

use crate::domain::import::{
    ColumnMapping, DiffOutcome, NormalizedRecord, PreflightSummary, ResolvedRoster, UploadedRow,
    ValidationProblem,
};
use crate::domain::person::{ExistingRecord, PersonField};
use crate::importer::error::ImportResult;
use std::collections::HashSet;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: CsvParser, ExcelParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析文件为按列序排列的原始行
    ///
    /// # 参数
    /// - file_path: 文件路径
    ///
    /// # 返回
    /// - Ok(Vec<UploadedRow>): 非空行列表（行号 1 起,空白行跳过）
    /// - Err: 文件读取错误、格式错误
    fn parse_rows(&self, file_path: &Path) -> ImportResult<Vec<UploadedRow>>;
}

// ==========================================
// ColumnMapper Trait
// ==========================================
// 用途: 列映射解析接口（阶段 1）
// 实现者: ColumnMapperImpl
pub trait ColumnMapper: Send + Sync {
    /// 校验映射配置
    ///
    /// # 返回
    /// - Ok(()): 配置合法
    /// - Err(MappingConflict): 同一源列被配置了多个目标
    fn validate_mappings(&self, mappings: &[ColumnMapping]) -> ImportResult<()>;

    /// 将原始行按映射配置标准化
    ///
    /// # 参数
    /// - rows: 上传原始行
    /// - mappings: 列映射配置
    ///
    /// # 返回
    /// - Ok(ResolvedRoster): 标准化记录 + 行级取值问题
    ///   - 映射列全空的行直接丢弃
    ///   - 身份字段缺失的行保留并打标,供预检提示
    /// - Err: 映射配置错误
    fn resolve(
        &self,
        rows: &[UploadedRow],
        mappings: &[ColumnMapping],
    ) -> ImportResult<ResolvedRoster>;
}

// ==========================================
// RosterDiffer Trait
// ==========================================
// 用途: 名册比对接口（阶段 2）
// 实现者: RosterDifferImpl
pub trait RosterDiffer: Send + Sync {
    /// 将标准化记录与远端名册逐条比对
    ///
    /// # 参数
    /// - normalized: 标准化记录
    /// - existing: 远端名册（只读,绝不修改）
    /// - match_key: 匹配键字段
    ///
    /// # 返回
    /// - DiffOutcome: 比对明细 + 多重命中 + 批次内重复键
    ///
    /// # 匹配规则
    /// - 匹配键去首尾空白、不区分大小写、精确相等（无模糊匹配）
    /// - 命中多条时按名册输入顺序取第一条,并上报 AmbiguousMatch
    fn diff(
        &self,
        normalized: &[NormalizedRecord],
        existing: &[ExistingRecord],
        match_key: PersonField,
    ) -> DiffOutcome;
}

// ==========================================
// PreflightBuilder Trait
// ==========================================
// 用途: 预检汇总接口（阶段 3）
// 实现者: PreflightBuilderImpl
pub trait PreflightBuilder: Send + Sync {
    /// 折叠比对结果生成汇总与问题清单
    ///
    /// # 参数
    /// - outcome: 比对引擎输出
    /// - records: 标准化记录（取标签/组织派生与身份标记）
    /// - valid_tags: 当前组织合法标签 ID 集
    /// - valid_orgs: 当前组织合法下级组织 ID 集
    ///
    /// # 返回
    /// - (PreflightSummary, Vec<ValidationProblem>)
    ///
    /// # 不变量
    /// - created + updated + no_change 恒等于比对结果条数
    /// - 累计顺序无关（交换律累加）,直方图键序仅为展示稳定
    fn build(
        &self,
        outcome: &DiffOutcome,
        records: &[NormalizedRecord],
        valid_tags: &HashSet<i64>,
        valid_orgs: &HashSet<i64>,
    ) -> (PreflightSummary, Vec<ValidationProblem>);
}
