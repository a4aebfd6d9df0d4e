//! 共享数值单元
//!
//! 各轮询循环之间只通过很小的共享单元通信（bool / f64），
//! 每个单元只有一个写者（拥有它的循环），可以有任意多个读者。

use std::sync::atomic::{AtomicU64, Ordering};

/// 原子 f64（以 `AtomicU64` 存储位模式）
///
/// # 示例
///
/// ```rust
/// use mecanum_driver::cell::AtomicF64;
/// use std::sync::atomic::Ordering;
///
/// let scale = AtomicF64::new(0.4);
/// scale.store(0.5, Ordering::Relaxed);
/// assert_eq!(scale.load(Ordering::Relaxed), 0.5);
/// ```
#[derive(Debug)]
pub struct AtomicF64 {
    inner: AtomicU64,
}

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        Self {
            inner: AtomicU64::new(value.to_bits()),
        }
    }

    pub fn load(&self, ordering: Ordering) -> f64 {
        f64::from_bits(self.inner.load(ordering))
    }

    pub fn store(&self, value: f64, ordering: Ordering) {
        self.inner.store(value.to_bits(), ordering);
    }

    /// 原子地读取-修改-写入
    ///
    /// 返回更新前的值。
    pub fn fetch_update<F>(&self, set_order: Ordering, fetch_order: Ordering, mut f: F) -> f64
    where
        F: FnMut(f64) -> f64,
    {
        let prev = self
            .inner
            .fetch_update(set_order, fetch_order, |bits| {
                Some(f(f64::from_bits(bits)).to_bits())
            })
            .unwrap_or_else(|bits| bits);
        f64::from_bits(prev)
    }
}

impl Default for AtomicF64 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Clone for AtomicF64 {
    fn clone(&self) -> Self {
        Self::new(self.load(Ordering::Relaxed))
    }
}
