use std::fmt;

use serde::Serialize;

/// 缓存统计
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct CacheStats {
    pub parse_cache_size: usize,
    pub match_cache_size: usize,
}

/// 一轮匹配各阶段耗时（毫秒）
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct StageTimings {
    pub clear_ms: u64,
    pub load_ms: u64,
    pub build_ms: u64,
    pub match_ms: u64,
    pub persist_ms: u64,
    pub total_ms: u64,
}

/// 一轮完整匹配的结果报告
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunReport {
    pub canonical_rows: usize,
    pub secondary_rows: usize,
    pub accepted: usize,
    pub review_queued: usize,
    /// 百分比（0..=100）
    pub match_rate: f64,
    pub cache: CacheStats,
    pub timings: StageTimings,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "╔══════════════════════════════════════════════════╗")?;
        writeln!(f, "║           addr-link Run Report                   ║")?;
        writeln!(f, "╠══════════════════════════════════════════════════╣")?;
        writeln!(f, "║ 标准地址:   {:>10}                           ║", self.canonical_rows)?;
        writeln!(f, "║ 待匹配:     {:>10}                           ║", self.secondary_rows)?;
        writeln!(f, "║ 自动接受:   {:>10}                           ║", self.accepted)?;
        writeln!(f, "║ 入复核:     {:>10}                           ║", self.review_queued)?;
        writeln!(f, "║ 匹配率:     {:>9.2}%                           ║", self.match_rate)?;
        writeln!(f, "╠──────────────────────────────────────────────────╣")?;
        writeln!(f, "║ 缓存: 解析 {} 条 / 匹配 {} 条                  ║", self.cache.parse_cache_size, self.cache.match_cache_size)?;
        writeln!(f, "╠──────────────────────────────────────────────────╣")?;
        writeln!(f, "║ 耗时(ms):                                        ║")?;
        writeln!(f, "║   清空:     {:>10}                           ║", self.timings.clear_ms)?;
        writeln!(f, "║   加载:     {:>10}                           ║", self.timings.load_ms)?;
        writeln!(f, "║   建树:     {:>10}                           ║", self.timings.build_ms)?;
        writeln!(f, "║   匹配:     {:>10}                           ║", self.timings.match_ms)?;
        writeln!(f, "║   保存:     {:>10}                           ║", self.timings.persist_ms)?;
        writeln!(f, "║   合计:     {:>10}                           ║", self.timings.total_ms)?;
        writeln!(f, "╚══════════════════════════════════════════════════╝")?;
        Ok(())
    }
}

/// 面向控制面的总体统计（对应 Get Statistics）
#[derive(Clone, Debug, Default, Serialize)]
pub struct EngineStats {
    pub canonical_total: usize,
    pub secondary_total: usize,
    pub matched_pairs: usize,
    pub review_pending: usize,
    /// 百分比（0..=100）
    pub match_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_report_renders_all_sections() {
        let report = RunReport {
            canonical_rows: 1000,
            secondary_rows: 500,
            accepted: 400,
            review_queued: 100,
            match_rate: 80.0,
            cache: CacheStats {
                parse_cache_size: 1500,
                match_cache_size: 500,
            },
            timings: StageTimings {
                clear_ms: 1,
                load_ms: 2,
                build_ms: 30,
                match_ms: 200,
                persist_ms: 5,
                total_ms: 238,
            },
        };

        let rendered = report.to_string();
        assert!(rendered.contains("Run Report"));
        assert!(rendered.contains("80.00%"));
        assert!(rendered.contains("1500"));
        assert!(rendered.contains("238"));
    }

    #[test]
    fn run_report_serializes_to_json() {
        let report = RunReport::default();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("match_rate").is_some());
        assert!(json.get("timings").is_some());
        assert!(json["cache"].get("parse_cache_size").is_some());
    }
}
