//! 固定间隔节流
//! 上游调用之间顺序等待, 测试中使用零间隔

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    interval: Duration,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// 不等待
    #[cfg(test)]
    pub fn none() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 在两次上游调用之间等待
    pub async fn pause(&self) {
        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
    }
}

/// 各扫描阶段的节流设置
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// 全量收集和类型收集的关键词扫描
    pub keyword: Throttle,
    /// 全量收集的频道扫描
    pub channel: Throttle,
    /// 增强搜索的变体和子串查询
    pub variant: Throttle,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            keyword: Throttle::from_millis(100),
            channel: Throttle::from_millis(200),
            variant: Throttle::from_millis(200),
        }
    }
}

impl Pacing {
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            keyword: Throttle::none(),
            channel: Throttle::none(),
            variant: Throttle::none(),
        }
    }
}
