//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，作为对外入口（导出服务、设置状态、文件保存）的返回类型，
//! 宿主界面层通过 `Serialize` 获得结构化的错误信息（例如用于 toast 提示）。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `ExportError` 与 `std::io::Error` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，满足 IPC 要求。

use serde::Serialize;

use crate::export::ExportError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 导出链路错误（序列化 / 解码 / 光栅化 / 编码 / 读取文件）
    #[error("{0}")]
    Export(#[from] ExportError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 设置取值非法
    #[error("设置无效: {0}")]
    Settings(String),

    /// 保存目录或文件名不可用
    #[error("存储目录不可用: {0}")]
    Storage(String),
}

impl AppError {
    /// 稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Export(err) => err.code(),
            Self::Io(_) => "E_IO",
            Self::Settings(_) => "E_SETTINGS",
            Self::Storage(_) => "E_STORAGE",
        }
    }
}

/// IPC 要求返回值实现 `Serialize`。
/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_plain_message() {
        let err = AppError::Settings("颜色格式错误".to_string());
        let json = serde_json::to_string(&err).expect("serialize failed");

        assert_eq!(json, "\"设置无效: 颜色格式错误\"");
    }

    #[test]
    fn export_errors_keep_their_code() {
        let err: AppError = ExportError::Decode("bad svg".to_string()).into();
        assert_eq!(err.code(), "E_DECODE");
    }
}
