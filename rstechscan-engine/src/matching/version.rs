//! 版本模板解析：`\N` 反向引用 + `\N?then:else` 三元表达式
use once_cell::sync::Lazy;
use regex::Regex;

/// 预编译 1..=9 号捕获组的三元表达式匹配器
static TERNARY_CACHE: Lazy<Vec<Option<Regex>>> =
    Lazy::new(|| (1..=9).map(build_ternary).collect());

fn build_ternary(index: usize) -> Option<Regex> {
    Regex::new(&format!(r"\\{}\?([^:]+):(.*)$", index)).ok()
}

fn with_ternary<R>(index: usize, f: impl FnOnce(Option<&Regex>) -> R) -> R {
    match TERNARY_CACHE.get(index.wrapping_sub(1)) {
        Some(cached) => f(cached.as_ref()),
        None => f(build_ternary(index).as_ref()),
    }
}

/// 按版本模板解析版本号
/// 正则未命中返回 None；超出捕获组数量的 `\N` 原样保留
pub fn resolve_version(template: &str, regex: &Regex, value: &str) -> Option<String> {
    let captures = regex.captures(value)?;
    let mut resolved = template.to_string();

    for index in 1..captures.len() {
        let capture = captures.get(index).map(|m| m.as_str());

        // 三元表达式在原始模板中查找，在当前结果中替换
        let ternary = with_ternary(index, |re| {
            re.and_then(|re| re.captures(template)).map(|t| {
                let whole = t.get(0).map_or("", |m| m.as_str()).to_string();
                let then = t.get(1).map_or("", |m| m.as_str()).to_string();
                let otherwise = t.get(2).map_or("", |m| m.as_str()).to_string();
                (whole, then, otherwise)
            })
        });
        if let Some((whole, then, otherwise)) = ternary {
            let branch = match capture {
                Some(c) if !c.is_empty() => then,
                _ => otherwise,
            };
            resolved = resolved.replacen(&whole, &branch, 1);
        }

        resolved = resolved.replace(&format!("\\{}", index), capture.unwrap_or(""));
    }

    Some(resolved.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::build_case_insensitive;

    fn resolve(template: &str, regex: &str, value: &str) -> Option<String> {
        resolve_version(template, &build_case_insensitive(regex).unwrap(), value)
    }

    #[test]
    fn substitutes_backreferences() {
        assert_eq!(
            resolve("\\1", "jquery-([\\d.]+)\\.js", "/js/jquery-3.6.0.js").as_deref(),
            Some("3.6.0")
        );
        assert_eq!(
            resolve("\\1.\\2", "v(\\d+)_(\\d+)", "v4_2").as_deref(),
            Some("4.2")
        );
    }

    #[test]
    fn no_match_yields_none() {
        assert_eq!(resolve("\\1", "foo-(\\d)", "bar"), None);
    }

    #[test]
    fn ternary_picks_branch_by_capture() {
        assert_eq!(
            resolve("\\1?next:legacy", "(beta)?-build", "beta-build").as_deref(),
            Some("next")
        );
        assert_eq!(
            resolve("\\1?next:legacy", "(beta)?-build", "-build").as_deref(),
            Some("legacy")
        );
    }

    #[test]
    fn later_index_sees_earlier_ternary_output() {
        // 1 号三元产出的 `\2` 随后被 2 号捕获替换
        assert_eq!(
            resolve("\\1?\\2:none", "(x)(\\d+)", "x42").as_deref(),
            Some("42")
        );
    }

    #[test]
    fn unresolved_indices_are_kept() {
        assert_eq!(
            resolve("\\1 \\3", "(a)(b)?", "a").as_deref(),
            Some("a \\3")
        );
    }

    #[test]
    fn result_is_trimmed_and_stable() {
        let first = resolve(" \\1 ", "ver=(\\S+)", "ver=2.1");
        assert_eq!(first.as_deref(), Some("2.1"));
        assert_eq!(first, resolve(" \\1 ", "ver=(\\S+)", "ver=2.1"));
    }

    #[test]
    fn template_without_groups_is_returned_trimmed() {
        assert_eq!(resolve(" 1.0 ", "bar", "foobar").as_deref(), Some("1.0"));
    }
}
