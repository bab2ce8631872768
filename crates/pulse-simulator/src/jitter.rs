use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;
use std::sync::Mutex;
use std::time::Duration;

/// 随机源
///
/// 所有通道共享一个随机源；测试中用固定种子得到确定的序列。
pub struct Jitter {
    rng: Mutex<StdRng>,
}

impl Jitter {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// 在 `[start, end)` 毫秒内均匀取一个延迟
    ///
    /// 调用方保证区间非空（见 `ChannelConfig::validate`）。
    pub fn delay(&self, window_ms: &Range<u64>) -> Duration {
        Duration::from_millis(self.with_rng(|rng| rng.gen_range(window_ms.clone())))
    }

    /// 在 `[start, end)` 内均匀取一个整数读数
    pub fn value(&self, range: &Range<i64>) -> i64 {
        self.with_rng(|rng| rng.gen_range(range.clone()))
    }

    /// 在 `[start, end)` 内均匀取一个小数读数，保留 `decimals` 位
    pub fn decimal(&self, range: &Range<i64>, decimals: u32) -> f64 {
        let raw = self.with_rng(|rng| rng.gen_range(range.start as f64..range.end as f64));
        let scale = 10f64.powi(decimals as i32);
        (raw * scale).round() / scale
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        // 持锁期间不会 panic，中毒时直接取回内部状态
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut rng)
    }
}

impl Default for Jitter {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_within_window() {
        let jitter = Jitter::seeded(7);
        let window = 30_000..120_000;

        for _ in 0..10_000 {
            let delay = jitter.delay(&window).as_millis() as u64;
            assert!(delay >= 30_000 && delay < 120_000, "delay out of window: {}", delay);
        }
    }

    #[test]
    fn test_value_within_range() {
        let jitter = Jitter::seeded(11);
        let mut seen_min = false;

        for _ in 0..10_000 {
            let v = jitter.value(&(92..100));
            assert!((92..100).contains(&v));
            seen_min |= v == 92;
        }
        assert!(seen_min);
    }

    #[test]
    fn test_decimal_rounded_to_two_places() {
        let jitter = Jitter::seeded(5);
        let mut fractional = false;

        for _ in 0..1_000 {
            let v = jitter.decimal(&(20..40), 2);
            assert!((20.0..=40.0).contains(&v), "value out of range: {}", v);
            assert!(((v * 100.0) - (v * 100.0).round()).abs() < 1e-6, "too many decimals: {}", v);
            fractional |= v.fract() != 0.0;
        }
        assert!(fractional);
    }

    #[test]
    fn test_seeded_is_deterministic() {
        let a = Jitter::seeded(42);
        let b = Jitter::seeded(42);
        for _ in 0..32 {
            assert_eq!(a.value(&(60..100)), b.value(&(60..100)));
        }
    }
}
