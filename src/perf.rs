// ==========================================
// 仓库库龄分析系统 - 阶段耗时统计
// ==========================================
// 开关: WAREHOUSE_AGING_SLOW_STAGE_MS=50 配置慢阶段阈值（毫秒）
//       超过阈值记 warn，否则记 debug
// ==========================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Once;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

static SLOW_STAGE_THRESHOLD_MS: AtomicU64 = AtomicU64::new(0);
static INIT: Once = Once::new();

const DEFAULT_SLOW_STAGE_MS: u64 = 500;

fn slow_threshold_ms() -> u64 {
    INIT.call_once(|| {
        let slow_ms = std::env::var("WAREHOUSE_AGING_SLOW_STAGE_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_SLOW_STAGE_MS);
        SLOW_STAGE_THRESHOLD_MS.store(slow_ms, Ordering::Relaxed);
    });
    SLOW_STAGE_THRESHOLD_MS.load(Ordering::Relaxed)
}

/// 阶段计时器，drop 时输出耗时
pub struct StageTimer {
    stage: &'static str,
    started: Instant,
}

impl StageTimer {
    pub fn start(stage: &'static str) -> Self {
        Self {
            stage,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed().as_millis() as u64;
        if elapsed_ms >= slow_threshold_ms() {
            warn!(stage = self.stage, elapsed_ms, "慢阶段");
        } else {
            debug!(stage = self.stage, elapsed_ms, "阶段完成");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_measures_elapsed() {
        let timer = StageTimer::start("test");
        std::thread::sleep(Duration::from_millis(2));
        assert!(timer.elapsed() >= Duration::from_millis(2));
    }
}
