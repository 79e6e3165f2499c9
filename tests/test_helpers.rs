// ==========================================
// 集成测试辅助
// ==========================================
// 提供: 内存版远端客户端（带写入流水）、CSV 构造、记录构造
// ==========================================
#![allow(dead_code)]

use async_trait::async_trait;
use roster_import::domain::person::{
    ExistingRecord, FieldValue, PersonField, SubOrgRecord, TagRecord,
};
use roster_import::remote::{ClientError, ClientResult, RemoteDataClient};
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 内存版远端客户端
///
/// 读取返回固定数据,写入记录到共享流水,便于断言提交行为;
/// 克隆体共享同一份流水
#[derive(Clone)]
pub struct InMemoryClient {
    pub roster: Vec<ExistingRecord>,
    pub tags: Vec<TagRecord>,
    pub sub_orgs: Vec<SubOrgRecord>,
    /// 第 N 次 create_person 调用返回错误（模拟提交中途失败）
    pub fail_on_create_call: Option<usize>,
    pub created: Arc<Mutex<Vec<BTreeMap<PersonField, FieldValue>>>>,
    pub updated: Arc<Mutex<Vec<(i64, BTreeMap<PersonField, FieldValue>)>>>,
    pub tag_assignments: Arc<Mutex<Vec<(i64, i64)>>>,
    pub org_assignments: Arc<Mutex<Vec<(i64, i64)>>>,
    create_calls: Arc<Mutex<usize>>,
    next_id: Arc<Mutex<i64>>,
}

impl InMemoryClient {
    pub fn new(
        roster: Vec<ExistingRecord>,
        tags: Vec<TagRecord>,
        sub_orgs: Vec<SubOrgRecord>,
    ) -> Self {
        Self {
            roster,
            tags,
            sub_orgs,
            fail_on_create_call: None,
            created: Arc::new(Mutex::new(Vec::new())),
            updated: Arc::new(Mutex::new(Vec::new())),
            tag_assignments: Arc::new(Mutex::new(Vec::new())),
            org_assignments: Arc::new(Mutex::new(Vec::new())),
            create_calls: Arc::new(Mutex::new(0)),
            next_id: Arc::new(Mutex::new(1000)),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new())
    }
}

#[async_trait]
impl RemoteDataClient for InMemoryClient {
    async fn fetch_roster(&self, _org_id: i64) -> ClientResult<Vec<ExistingRecord>> {
        Ok(self.roster.clone())
    }

    async fn fetch_tags(&self, _org_id: i64) -> ClientResult<Vec<TagRecord>> {
        Ok(self.tags.clone())
    }

    async fn fetch_sub_orgs(&self, _org_id: i64) -> ClientResult<Vec<SubOrgRecord>> {
        Ok(self.sub_orgs.clone())
    }

    async fn create_person(
        &self,
        _org_id: i64,
        fields: &BTreeMap<PersonField, FieldValue>,
    ) -> ClientResult<ExistingRecord> {
        let call_number = {
            let mut calls = self.create_calls.lock().unwrap();
            *calls += 1;
            *calls
        };
        if self.fail_on_create_call == Some(call_number) {
            return Err(ClientError::ApiStatus {
                status: 500,
                body: "内部错误".to_string(),
            });
        }

        self.created.lock().unwrap().push(fields.clone());
        let id = {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            *next_id
        };
        Ok(ExistingRecord {
            id,
            fields: fields.clone(),
        })
    }

    async fn update_person(
        &self,
        _org_id: i64,
        person_id: i64,
        fields: &BTreeMap<PersonField, FieldValue>,
    ) -> ClientResult<ExistingRecord> {
        self.updated
            .lock()
            .unwrap()
            .push((person_id, fields.clone()));
        Ok(ExistingRecord {
            id: person_id,
            fields: fields.clone(),
        })
    }

    async fn assign_tag(&self, _org_id: i64, person_id: i64, tag_id: i64) -> ClientResult<()> {
        self.tag_assignments.lock().unwrap().push((person_id, tag_id));
        Ok(())
    }

    async fn add_to_org(&self, _org_id: i64, sub_org_id: i64, person_id: i64) -> ClientResult<()> {
        self.org_assignments
            .lock()
            .unwrap()
            .push((person_id, sub_org_id));
        Ok(())
    }
}

/// 生成测试 CSV 文件
pub fn write_csv(lines: &[&str]) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("创建临时文件失败");
    for line in lines {
        writeln!(file, "{}", line).expect("写入临时文件失败");
    }
    file
}

/// 便捷构造远端人员记录
pub fn existing(id: i64, pairs: &[(PersonField, &str)]) -> ExistingRecord {
    let mut fields = BTreeMap::new();
    for (field, value) in pairs {
        fields.insert(*field, FieldValue::Text(value.to_string()));
    }
    ExistingRecord { id, fields }
}

/// 便捷构造标签目录
pub fn tag(id: i64, title: &str) -> TagRecord {
    TagRecord {
        id,
        title: title.to_string(),
    }
}

/// 便捷构造下级组织目录
pub fn sub_org(id: i64, title: &str) -> SubOrgRecord {
    SubOrgRecord {
        id,
        title: title.to_string(),
    }
}
