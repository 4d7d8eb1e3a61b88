//! Header格式转换工具
use http::header::HeaderMap;
use rstechscan_engine::MultiMap;

/// Header转换工具
pub struct HeaderConverter;

impl HeaderConverter {
    /// HeaderMap → 多值映射，键小写，多行取值按 `\n` 拆分
    pub fn to_multi_map(header_map: &HeaderMap) -> MultiMap {
        let mut map = MultiMap::new();
        for (key, value) in header_map.iter() {
            let key_str = key.as_str().to_lowercase();
            let value_str = String::from_utf8_lossy(value.as_bytes());
            let entry = map.entry(key_str).or_default();
            for line in value_str.split('\n') {
                entry.push(line.trim_end_matches('\r').to_string());
            }
        }
        map
    }

    /// 解析 `set-cookie` 取值 → 标准化 Cookie 映射
    /// 以第一个 `=` 拆分，名称小写，取值原样保留（含属性部分），无 `=` 的条目忽略
    pub fn parse_set_cookies(headers: &MultiMap) -> MultiMap {
        let mut cookies = MultiMap::new();
        let Some(raw_values) = headers.get("set-cookie") else {
            return cookies;
        };

        for raw in raw_values {
            let Some((name, value)) = raw.split_once('=') else {
                continue;
            };
            let name = name.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            cookies.entry(name).or_default().push(value.to_string());
        }
        cookies
    }
}
