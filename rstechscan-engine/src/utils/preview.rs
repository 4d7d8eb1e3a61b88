use std::fmt::{self, Write};

// ======================== 日志预览工具 ========================
/// 日志输出用的文本预览：空白折叠为单个空格，超长截断并追加 `…`
/// 惰性格式化，日志级别关闭时不产生任何分配
#[inline]
pub fn preview<'a>(s: &'a str, max_chars: usize) -> impl fmt::Display + 'a {
    Preview {
        source: s,
        max_chars,
    }
}

struct Preview<'a> {
    source: &'a str,
    max_chars: usize,
}

impl fmt::Display for Preview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut written = 0;
        let mut in_space = false;
        for ch in self.source.trim().chars() {
            if written >= self.max_chars {
                return f.write_char('…');
            }
            if ch.is_whitespace() {
                if in_space {
                    continue;
                }
                in_space = true;
                f.write_char(' ')?;
            } else {
                in_space = false;
                f.write_char(ch)?;
            }
            written += 1;
        }
        Ok(())
    }
}
