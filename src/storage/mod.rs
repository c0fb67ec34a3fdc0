//! # 存储模块
//!
//! 页面缓存和两个词典文件共用的键值存储抽象：
//!
//! - `file` - 基于目录的实现，先写临时文件再重命名
//! - `memory` - 进程内实现，用于测试
//!
//! 并发保证由存储自身负责：`read` 总是返回完整快照，`write` 对读者原子可见，
//! `update` 在按键划分的互斥范围内执行读-改-写。

pub mod file;
pub mod memory;

use thiserror::Error;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// 存储层错误
#[derive(Error, Debug)]
pub enum StorageError {
    /// 底层 I/O 失败
    #[error("I/O error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// 内容无法编码或解码
    #[error("serialization error on '{key}': {message}")]
    Serialization { key: String, message: String },

    /// 键不是合法的存储名
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    /// 持有锁的线程崩溃
    #[error("lock for '{0}' was poisoned")]
    Poisoned(String),
}

impl StorageError {
    pub(crate) fn io(key: &str, source: std::io::Error) -> Self {
        StorageError::Io {
            key: key.to_string(),
            source,
        }
    }

    pub(crate) fn serialization(key: &str, message: impl ToString) -> Self {
        StorageError::Serialization {
            key: key.to_string(),
            message: message.to_string(),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// 读-改-写回调：接收当前内容（不存在时为 `None`），返回新内容
pub type UpdateFn<'a> = dyn FnMut(Option<Vec<u8>>) -> StorageResult<Vec<u8>> + 'a;

/// 键值存储接口
///
/// 键是扁平的文件名风格字符串（例如 `word_replacements.json`、`<hash>.html`）。
pub trait Storage: Send + Sync {
    /// 读取完整内容；键不存在时返回 `Ok(None)`
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// 原子地替换内容
    fn write(&self, key: &str, data: &[u8]) -> StorageResult<()>;

    /// 在该键的互斥范围内读取、变换并写回
    ///
    /// 回调返回错误时不写入任何内容，锁在所有路径上都会释放。
    fn update(&self, key: &str, f: &mut UpdateFn<'_>) -> StorageResult<()>;

    /// 删除键；键不存在不算错误
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// 列出所有键
    fn keys(&self) -> StorageResult<Vec<String>>;
}

/// 校验键，拒绝路径分隔符和以点开头的名字
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty()
        || key.starts_with('.')
        || key.contains('/')
        || key.contains('\\')
        || key.contains('\0')
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
