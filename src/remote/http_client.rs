// ==========================================
// 组织动员平台 - 名册导入 - HTTP 客户端实现
// ==========================================
// 职责: 通过平台 HTTP API 实现 RemoteDataClient
// 协议: JSON,响应统一包裹在 data 信封中
// ==========================================

use crate::domain::person::{ExistingRecord, FieldValue, PersonField, SubOrgRecord, TagRecord};
use crate::remote::error::{ClientError, ClientResult};
use crate::remote::roster_client::RemoteDataClient;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

// ==========================================
// HttpRosterClient - 平台 API 客户端
// ==========================================
pub struct HttpRosterClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl HttpRosterClient {
    /// 创建客户端
    ///
    /// # 参数
    /// - base_url: 平台 API 根地址（末尾斜杠会被去除）
    /// - token: 访问令牌（Bearer）
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 发送请求并解开 data 信封
    async fn request_data(&self, request: reqwest::RequestBuilder) -> ClientResult<serde_json::Value> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), "远端接口响应");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::ApiStatus {
                status: status.as_u16(),
                body,
            });
        }

        let payload: serde_json::Value = response.json().await?;
        match payload.get("data") {
            Some(data) => Ok(data.clone()),
            None => Ok(payload),
        }
    }

    /// 发送无需响应体的写请求
    async fn request_empty(&self, request: reqwest::RequestBuilder) -> ClientResult<()> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::ApiStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl RemoteDataClient for HttpRosterClient {
    async fn fetch_roster(&self, org_id: i64) -> ClientResult<Vec<ExistingRecord>> {
        let data = self
            .request_data(self.client.get(self.url(&format!("/orgs/{}/people", org_id))))
            .await?;

        let items = match data.as_array() {
            Some(items) => items,
            None => {
                return Err(ClientError::MalformedResponse(
                    "名册响应应为数组".to_string(),
                ))
            }
        };

        items.iter().map(person_from_payload).collect()
    }

    async fn fetch_tags(&self, org_id: i64) -> ClientResult<Vec<TagRecord>> {
        let data = self
            .request_data(
                self.client
                    .get(self.url(&format!("/orgs/{}/people/tags", org_id))),
            )
            .await?;

        serde_json::from_value(data)
            .map_err(|e| ClientError::MalformedResponse(format!("标签目录解析失败: {}", e)))
    }

    async fn fetch_sub_orgs(&self, org_id: i64) -> ClientResult<Vec<SubOrgRecord>> {
        let data = self
            .request_data(
                self.client
                    .get(self.url(&format!("/orgs/{}/sub_organizations", org_id))),
            )
            .await?;

        serde_json::from_value(data)
            .map_err(|e| ClientError::MalformedResponse(format!("下级组织目录解析失败: {}", e)))
    }

    async fn create_person(
        &self,
        org_id: i64,
        fields: &BTreeMap<PersonField, FieldValue>,
    ) -> ClientResult<ExistingRecord> {
        let data = self
            .request_data(
                self.client
                    .post(self.url(&format!("/orgs/{}/people", org_id)))
                    .json(&fields_to_payload(fields)),
            )
            .await?;

        person_from_payload(&data)
    }

    async fn update_person(
        &self,
        org_id: i64,
        person_id: i64,
        fields: &BTreeMap<PersonField, FieldValue>,
    ) -> ClientResult<ExistingRecord> {
        let data = self
            .request_data(
                self.client
                    .patch(self.url(&format!("/orgs/{}/people/{}", org_id, person_id)))
                    .json(&fields_to_payload(fields)),
            )
            .await?;

        person_from_payload(&data)
    }

    async fn assign_tag(&self, org_id: i64, person_id: i64, tag_id: i64) -> ClientResult<()> {
        self.request_empty(self.client.put(self.url(&format!(
            "/orgs/{}/people/{}/tags/{}",
            org_id, person_id, tag_id
        ))))
        .await
    }

    async fn add_to_org(&self, org_id: i64, sub_org_id: i64, person_id: i64) -> ClientResult<()> {
        self.request_empty(self.client.put(self.url(&format!(
            "/orgs/{}/sub_organizations/{}/people/{}",
            org_id, sub_org_id, person_id
        ))))
        .await
    }
}

// ==========================================
// 载荷转换
// ==========================================

/// 将人员 JSON 载荷转换为 ExistingRecord
///
/// 日期类字段按 ISO 格式解析,解析失败时保留原始文本
fn person_from_payload(payload: &serde_json::Value) -> ClientResult<ExistingRecord> {
    let id = match payload.get("id").and_then(|v| v.as_i64()) {
        Some(id) => id,
        None => {
            return Err(ClientError::MalformedResponse(
                "人员载荷缺少 id".to_string(),
            ))
        }
    };

    let mut fields = BTreeMap::new();
    for field in PersonField::ALL {
        let value = match payload.get(field.as_str()) {
            Some(value) => value,
            None => continue,
        };

        let converted = match value {
            serde_json::Value::Null => continue,
            serde_json::Value::Number(n) => FieldValue::Number(n.as_f64().unwrap_or_default()),
            serde_json::Value::String(s) => {
                if s.trim().is_empty() {
                    continue;
                }
                if field.is_date() {
                    match NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
                        Ok(date) => FieldValue::Date(date),
                        Err(_) => FieldValue::Text(s.clone()),
                    }
                } else {
                    FieldValue::Text(s.clone())
                }
            }
            other => FieldValue::Text(other.to_string()),
        };

        fields.insert(field, converted);
    }

    Ok(ExistingRecord { id, fields })
}

/// 将字段值编码为 JSON 载荷
fn fields_to_payload(fields: &BTreeMap<PersonField, FieldValue>) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (field, value) in fields {
        let encoded = match value {
            FieldValue::Text(s) => serde_json::Value::String(s.trim().to_string()),
            FieldValue::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            FieldValue::Number(n) => serde_json::json!(n),
        };
        map.insert(field.as_str().to_string(), encoded);
    }
    serde_json::Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_from_payload_basic() {
        let payload = serde_json::json!({
            "id": 42,
            "first_name": "Ann",
            "email": "a@x.com",
            "birthday": "1990-05-01",
            "phone": null
        });

        let record = person_from_payload(&payload).unwrap();

        assert_eq!(record.id, 42);
        assert_eq!(
            record.field(PersonField::FirstName),
            Some(&FieldValue::Text("Ann".to_string()))
        );
        assert_eq!(
            record.field(PersonField::Birthday),
            Some(&FieldValue::Date(
                NaiveDate::from_ymd_opt(1990, 5, 1).unwrap()
            ))
        );
        assert_eq!(record.field(PersonField::Phone), None);
    }

    #[test]
    fn test_person_from_payload_missing_id() {
        let payload = serde_json::json!({ "first_name": "Ann" });
        assert!(person_from_payload(&payload).is_err());
    }

    #[test]
    fn test_fields_to_payload_date_encoding() {
        let mut fields = BTreeMap::new();
        fields.insert(
            PersonField::Birthday,
            FieldValue::Date(NaiveDate::from_ymd_opt(1990, 5, 1).unwrap()),
        );
        fields.insert(PersonField::Email, FieldValue::Text(" a@x.com ".to_string()));

        let payload = fields_to_payload(&fields);

        assert_eq!(payload["birthday"], "1990-05-01");
        assert_eq!(payload["email"], "a@x.com");
    }
}
