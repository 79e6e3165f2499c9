// ==========================================
// 组织动员平台 - 名册导入 - 远端接口错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 远端接口错误类型
#[derive(Error, Debug)]
pub enum ClientError {
    // ===== 传输层错误 =====
    #[error("请求发送失败: {0}")]
    Transport(String),

    // ===== 协议层错误 =====
    #[error("远端接口返回异常状态 {status}: {body}")]
    ApiStatus { status: u16, body: String },

    #[error("响应解析失败: {0}")]
    MalformedResponse(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<reqwest::Error>
impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::MalformedResponse(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

/// Result 类型别名
pub type ClientResult<T> = Result<T, ClientError>;
