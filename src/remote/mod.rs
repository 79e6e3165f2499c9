// ==========================================
// 组织动员平台 - 名册导入 - 远端数据层
// ==========================================
// 职责: 平台 API 数据访问（名册读取 + 导入写入）
// 红线: 远端接口被视为黑盒,本层不做业务规则
// ==========================================

pub mod error;
pub mod http_client;
pub mod roster_client;

// 重导出核心类型
pub use error::{ClientError, ClientResult};
pub use http_client::HttpRosterClient;
pub use roster_client::RemoteDataClient;
