// ==========================================
// 组织动员平台 - 名册导入 - 远端数据访问 Trait
// ==========================================
// 职责: 定义名册读写接口（不包含实现）
// 红线: 接口只暴露领域类型,请求/响应细节留在实现层
// ==========================================

use crate::domain::person::{ExistingRecord, FieldValue, PersonField, SubOrgRecord, TagRecord};
use crate::remote::error::ClientResult;
use async_trait::async_trait;
use std::collections::BTreeMap;

// ==========================================
// RemoteDataClient Trait
// ==========================================
// 用途: 预检拉取基准数据 + 提交导入写入
// 实现者: HttpRosterClient（平台 HTTP API）、测试替身
#[async_trait]
pub trait RemoteDataClient: Send + Sync {
    /// 拉取组织名册（预检比对基准）
    ///
    /// # 参数
    /// - org_id: 组织 ID
    ///
    /// # 返回
    /// - Ok(Vec<ExistingRecord>): 名册记录列表（保持远端返回顺序）
    /// - Err: 传输/协议错误
    async fn fetch_roster(&self, org_id: i64) -> ClientResult<Vec<ExistingRecord>>;

    /// 拉取组织标签目录（校验映射中的标签 ID）
    async fn fetch_tags(&self, org_id: i64) -> ClientResult<Vec<TagRecord>>;

    /// 拉取下级组织目录（校验映射中的组织 ID）
    async fn fetch_sub_orgs(&self, org_id: i64) -> ClientResult<Vec<SubOrgRecord>>;

    /// 新建人员
    ///
    /// # 参数
    /// - org_id: 组织 ID
    /// - fields: 全量字段值
    ///
    /// # 返回
    /// - Ok(ExistingRecord): 远端生成的记录（含新人员 ID）
    async fn create_person(
        &self,
        org_id: i64,
        fields: &BTreeMap<PersonField, FieldValue>,
    ) -> ClientResult<ExistingRecord>;

    /// 按字段补丁更新人员（只发送发生变化的字段）
    async fn update_person(
        &self,
        org_id: i64,
        person_id: i64,
        fields: &BTreeMap<PersonField, FieldValue>,
    ) -> ClientResult<ExistingRecord>;

    /// 为人员打标签
    async fn assign_tag(&self, org_id: i64, person_id: i64, tag_id: i64) -> ClientResult<()>;

    /// 将人员加入下级组织
    async fn add_to_org(&self, org_id: i64, sub_org_id: i64, person_id: i64) -> ClientResult<()>;
}
