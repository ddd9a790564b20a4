use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// 固定的行政层级数：省 → 市 → 区县 → 街道 → 社区 → 道路 → 楼栋 → 单元 → 户室
pub const LEVEL_COUNT: usize = 9;

/// 市级命中后需要跳过的"市辖区"占位标记
const CITY_DISTRICT_MARKER: &str = "市辖区";

/// 九级抽取器，顺序固定。前六级锚定行首做惰性匹配（最早出现的关键字结尾），
/// 后三级为数字编号模式，允许出现在剩余文本任意位置。
static LEVEL_PATTERNS: LazyLock<[Regex; 9]> = LazyLock::new(|| {
    [
        r"^(.*?(?:省|自治区|直辖市))",
        r"^(.*?(?:市|自治州|地区|盟))",
        r"^(.*?(?:区|县|县级市|自治县))",
        r"^(.*?(?:街道|镇|乡))",
        r"^(.*?(?:社区|村|居委会))",
        r"^(.*?(?:路|街|大道|胡同|巷))",
        r"(\d+号楼?|\d+栋|\d+幢|\d+座)",
        r"(\d+单元|\d+门)",
        r"(\d+室|\d+号|\d+户)",
    ]
    .map(|p| Regex::new(p).expect("内置层级模式必然合法"))
});

static PAREN_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[(（][^)）]*[)）]").expect("内置括号模式必然合法"));

static PUNCT_MARKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[，。；：]").expect("内置标点模式必然合法"));

/// 地址清洗：NFC 归一 → 去全部空白 → 去括号注记 → 去中文标点。
/// NFC 保证视觉相同的字符串共享缓存键与树路径。
pub fn clean_address(raw: &str) -> String {
    let normalized: String = raw.trim().nfc().collect();
    let compact: String = normalized.chars().filter(|c| !c.is_whitespace()).collect();
    let no_paren = PAREN_GROUP.replace_all(&compact, "");
    PUNCT_MARKS.replace_all(&no_paren, "").into_owned()
}

/// 把地址串分解为有序的行政层级组件。纯函数，永不失败。
///
/// 空输入返回空序列；非空输入恒定产出 9 个组件（未命中层级以空串占位），
/// 九级抽取后仍有剩余文本时追加为第 10 个自由文本组件。
pub fn parse_components(raw: &str) -> Vec<String> {
    let mut remaining = clean_address(raw);
    if remaining.is_empty() {
        return Vec::new();
    }

    let mut components = Vec::with_capacity(LEVEL_COUNT + 1);
    for (level, pattern) in LEVEL_PATTERNS.iter().enumerate() {
        let hit = pattern
            .captures(&remaining)
            .and_then(|caps| caps.get(1))
            .map(|m| (m.as_str().to_string(), m.end()));
        match hit {
            Some((component, end)) => {
                components.push(component);
                // 后三级命中点之前的文本随推进一并丢弃
                remaining = remaining[end..].trim().to_string();

                if level == 1 {
                    if let Some(rest) = remaining.strip_prefix(CITY_DISTRICT_MARKER) {
                        remaining = rest.to_string();
                    }
                }
            }
            None => components.push(String::new()),
        }
    }

    if !remaining.is_empty() {
        components.push(remaining);
    }

    tracing::trace!("地址解析: {} -> {:?}", raw, components);
    components
}

/// 模糊相等：完全相等，或一方包含另一方。
/// 空串被任何字符串包含，因此空目标与一切标签模糊相等。
pub fn fuzzy_eq(a: &str, b: &str) -> bool {
    a == b || a.contains(b) || b.contains(a)
}
