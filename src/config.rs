use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// 引擎配置。workers = 0 表示交给自适应调度器按系统负载决定。
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// 批量匹配的每批行数
    pub batch_size: usize,
    /// 匹配线程池大小，0 = 自适应
    pub workers: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 256,
            workers: 0,
        }
    }
}

impl MatchConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("读取配置失败: {}", path.display()))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("解析配置失败: {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: MatchConfig = toml::from_str("batch_size = 64\nworkers = 4\n").unwrap();
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.workers, 4);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: MatchConfig = toml::from_str("batch_size = 64\n").unwrap();
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.workers, MatchConfig::default().workers);

        let empty: MatchConfig = toml::from_str("").unwrap();
        assert_eq!(empty.batch_size, 256);
        assert_eq!(empty.workers, 0);
    }
}
