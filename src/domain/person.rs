// ==========================================
// 组织动员平台 - 名册导入 - 人员领域模型
// ==========================================
// 职责: 人员标准字段（封闭枚举）、带类型字段值、远端记录
// 红线: 字段标识在映射配置期一次性校验,未知标识立即拒绝
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ==========================================
// PersonField - 人员标准字段
// ==========================================
// 封闭枚举: 不接受任意字符串键
// 对齐: 平台人员档案字段表
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonField {
    ExtId,         // 外部系统 ID（匹配键候选）
    FirstName,     // 名
    LastName,      // 姓
    Email,         // 邮箱（匹配键候选）
    Phone,         // 电话
    AltPhone,      // 备用电话
    StreetAddress, // 街道地址
    CoAddress,     // 转交地址
    Zip,           // 邮编
    City,          // 城市
    Country,       // 国家
    Gender,        // 性别
    Birthday,      // 出生日期
    JoinDate,      // 加入日期
}

impl PersonField {
    /// 全部标准字段（用于远端载荷转换等遍历场景）
    pub const ALL: [PersonField; 14] = [
        PersonField::ExtId,
        PersonField::FirstName,
        PersonField::LastName,
        PersonField::Email,
        PersonField::Phone,
        PersonField::AltPhone,
        PersonField::StreetAddress,
        PersonField::CoAddress,
        PersonField::Zip,
        PersonField::City,
        PersonField::Country,
        PersonField::Gender,
        PersonField::Birthday,
        PersonField::JoinDate,
    ];

    /// 字段标识（与远端 API 载荷键一致）
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonField::ExtId => "ext_id",
            PersonField::FirstName => "first_name",
            PersonField::LastName => "last_name",
            PersonField::Email => "email",
            PersonField::Phone => "phone",
            PersonField::AltPhone => "alt_phone",
            PersonField::StreetAddress => "street_address",
            PersonField::CoAddress => "co_address",
            PersonField::Zip => "zip_code",
            PersonField::City => "city",
            PersonField::Country => "country",
            PersonField::Gender => "gender",
            PersonField::Birthday => "birthday",
            PersonField::JoinDate => "join_date",
        }
    }

    /// 是否为日期类字段（比对时按日历值比较）
    pub fn is_date(&self) -> bool {
        matches!(self, PersonField::Birthday | PersonField::JoinDate)
    }
}

impl fmt::Display for PersonField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// UnknownField - 未知字段标识
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl fmt::Display for UnknownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "未知人员字段: {}", self.0)
    }
}

impl std::error::Error for UnknownField {}

impl FromStr for PersonField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ext_id" => Ok(PersonField::ExtId),
            "first_name" => Ok(PersonField::FirstName),
            "last_name" => Ok(PersonField::LastName),
            "email" => Ok(PersonField::Email),
            "phone" => Ok(PersonField::Phone),
            "alt_phone" => Ok(PersonField::AltPhone),
            "street_address" => Ok(PersonField::StreetAddress),
            "co_address" => Ok(PersonField::CoAddress),
            "zip_code" => Ok(PersonField::Zip),
            "city" => Ok(PersonField::City),
            "country" => Ok(PersonField::Country),
            "gender" => Ok(PersonField::Gender),
            "birthday" => Ok(PersonField::Birthday),
            "join_date" => Ok(PersonField::JoinDate),
            other => Err(UnknownField(other.to_string())),
        }
    }
}

// ==========================================
// FieldValue - 带类型字段值
// ==========================================
// 比对规则: 日期按日历值、文本去首尾空白、数值按数值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Date(NaiveDate),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// 文本形式（匹配键标准化等场景）
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.trim().to_string(),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FieldValue::Number(n) => {
                if n.fract() == 0.0 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
        }
    }

    /// 是否为空白值
    pub fn is_blank(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.trim().is_empty())
    }

    /// 类型感知相等比较
    ///
    /// 文本与日期/数值比较时先尝试解析文本,解析失败视为不等
    pub fn loosely_equals(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => a.trim() == b.trim(),
            (FieldValue::Date(a), FieldValue::Date(b)) => a == b,
            (FieldValue::Number(a), FieldValue::Number(b)) => a == b,
            (FieldValue::Date(d), FieldValue::Text(s))
            | (FieldValue::Text(s), FieldValue::Date(d)) => {
                parse_loose_date(s).map(|p| p == *d).unwrap_or(false)
            }
            (FieldValue::Number(n), FieldValue::Text(s))
            | (FieldValue::Text(s), FieldValue::Number(n)) => {
                s.trim().parse::<f64>().map(|p| p == *n).unwrap_or(false)
            }
            (FieldValue::Date(_), FieldValue::Number(_))
            | (FieldValue::Number(_), FieldValue::Date(_)) => false,
        }
    }
}

/// 宽松解析日期（常见书写格式,依次尝试）
fn parse_loose_date(value: &str) -> Option<NaiveDate> {
    let v = value.trim();
    for format in ["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d", "%d.%m.%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(v, format) {
            return Some(date);
        }
    }
    None
}

// ==========================================
// ExistingRecord - 远端已有人员记录
// ==========================================
// 用途: 预检比对基准,由远端客户端拉取
// 红线: 比对引擎只读,绝不回写
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingRecord {
    pub id: i64,                                  // 平台人员 ID
    pub fields: BTreeMap<PersonField, FieldValue>, // 字段值（空字段不出现）
}

impl ExistingRecord {
    /// 读取指定字段
    pub fn field(&self, field: PersonField) -> Option<&FieldValue> {
        self.fields.get(&field)
    }
}

// ==========================================
// TagRecord - 标签目录项
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: i64,      // 标签 ID
    pub title: String, // 标签名称
}

// ==========================================
// SubOrgRecord - 下级组织目录项
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubOrgRecord {
    pub id: i64,      // 组织 ID
    pub title: String, // 组织名称
}
