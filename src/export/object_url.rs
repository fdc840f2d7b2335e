//! # 临时句柄注册表
//!
//! ## 设计思路
//!
//! 解码器不直接接收字节，而是通过注册表签发的 `blob:` 句柄取数，
//! 与浏览器中 `URL.createObjectURL` + `img.src` 的协作方式一致。
//!
//! 句柄的生命周期限定在单次导出内：
//! - `ObjectUrlGuard` 采用 RAII 模式，构造时签发句柄，`Drop` 时撤销
//! - 解码成功、解码失败、超时、提前返回、panic 展开都会经过 `Drop`
//! - 重复导出不会在注册表中累积未撤销的句柄

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use super::ExportError;
use super::source::{Blob, ObjectUrl};

const OBJECT_URL_PREFIX: &str = "blob:qrcode-export/";

/// 临时句柄注册能力。
pub trait ObjectUrlRegistry: Send + Sync {
    /// 为二进制对象签发句柄。
    fn create_object_url(&self, blob: Blob) -> Result<ObjectUrl, ExportError>;

    /// 解引用句柄；已撤销或未知的句柄返回 `None`。
    fn resolve(&self, url: &ObjectUrl) -> Option<Blob>;

    /// 撤销句柄。撤销未知句柄是空操作。
    fn revoke_object_url(&self, url: &ObjectUrl);

    /// 当前仍然存活的句柄数量。
    fn live_handles(&self) -> usize;
}

/// 进程内的默认注册表实现。
#[derive(Debug, Default)]
pub struct InMemoryObjectUrlRegistry {
    entries: Mutex<HashMap<ObjectUrl, Blob>>,
    next_id: AtomicU64,
}

impl InMemoryObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ObjectUrlRegistry for InMemoryObjectUrlRegistry {
    fn create_object_url(&self, blob: Blob) -> Result<ObjectUrl, ExportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = ObjectUrl::new(format!("{}{}", OBJECT_URL_PREFIX, id));

        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ExportError::ResourceLimit("句柄注册表锁已中毒".to_string()))?;
        entries.insert(url.clone(), blob);

        Ok(url)
    }

    fn resolve(&self, url: &ObjectUrl) -> Option<Blob> {
        let entries = self.entries.lock().ok()?;
        entries.get(url).cloned()
    }

    fn revoke_object_url(&self, url: &ObjectUrl) {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.remove(url);
            }
            Err(poisoned) => {
                poisoned.into_inner().remove(url);
            }
        }
    }

    fn live_handles(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

/// 临时句柄的 RAII 守卫。
///
/// # 示例
/// ```rust
/// use std::sync::Arc;
/// use qrcode_export::export::{Blob, InMemoryObjectUrlRegistry, ObjectUrlGuard, ObjectUrlRegistry};
///
/// let registry: Arc<dyn ObjectUrlRegistry> = Arc::new(InMemoryObjectUrlRegistry::new());
/// {
///     let guard = ObjectUrlGuard::acquire(Arc::clone(&registry), Blob::new(vec![1, 2, 3], "image/svg+xml"))?;
///     assert!(registry.resolve(guard.url()).is_some());
/// }
/// assert_eq!(registry.live_handles(), 0);
/// # Ok::<(), qrcode_export::export::ExportError>(())
/// ```
pub struct ObjectUrlGuard {
    registry: Arc<dyn ObjectUrlRegistry>,
    url: ObjectUrl,
}

impl ObjectUrlGuard {
    pub fn acquire(registry: Arc<dyn ObjectUrlRegistry>, blob: Blob) -> Result<Self, ExportError> {
        let url = registry.create_object_url(blob)?;
        log::debug!("🔗 已签发临时句柄 - {}", url);
        Ok(Self { registry, url })
    }

    pub fn url(&self) -> &ObjectUrl {
        &self.url
    }

    pub fn registry(&self) -> &dyn ObjectUrlRegistry {
        self.registry.as_ref()
    }
}

impl Drop for ObjectUrlGuard {
    fn drop(&mut self) {
        self.registry.revoke_object_url(&self.url);
        log::debug!("🧹 已撤销临时句柄 - {}", self.url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svg_blob() -> Blob {
        Blob::new(b"<svg/>".to_vec(), "image/svg+xml")
    }

    #[test]
    fn issued_urls_are_unique_and_resolvable() {
        let registry = InMemoryObjectUrlRegistry::new();

        let a = registry.create_object_url(svg_blob()).expect("create should succeed");
        let b = registry.create_object_url(svg_blob()).expect("create should succeed");

        assert_ne!(a, b);
        assert!(a.as_str().starts_with("blob:"));
        assert_eq!(registry.resolve(&a).map(|blob| blob.len()), Some(6));
        assert_eq!(registry.live_handles(), 2);
    }

    #[test]
    fn revoked_url_no_longer_resolves() {
        let registry = InMemoryObjectUrlRegistry::new();
        let url = registry.create_object_url(svg_blob()).expect("create should succeed");

        registry.revoke_object_url(&url);
        registry.revoke_object_url(&url);

        assert!(registry.resolve(&url).is_none());
        assert_eq!(registry.live_handles(), 0);
    }

    #[test]
    fn guard_revokes_on_early_return() {
        let registry: Arc<dyn ObjectUrlRegistry> = Arc::new(InMemoryObjectUrlRegistry::new());

        let attempt = || -> Result<(), ExportError> {
            let _guard = ObjectUrlGuard::acquire(Arc::clone(&registry), svg_blob())?;
            Err(ExportError::Decode("boom".to_string()))
        };

        assert!(attempt().is_err());
        assert_eq!(registry.live_handles(), 0);
    }

    #[test]
    fn guard_revokes_during_panic_unwind() {
        let registry: Arc<dyn ObjectUrlRegistry> = Arc::new(InMemoryObjectUrlRegistry::new());
        let cloned = Arc::clone(&registry);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = ObjectUrlGuard::acquire(cloned, svg_blob()).expect("acquire should succeed");
            panic!("decoder exploded");
        }));

        assert!(result.is_err());
        assert_eq!(registry.live_handles(), 0);
    }
}
