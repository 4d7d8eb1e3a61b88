//! HTML标签提取器
//! 负责从HTML中提取script-src和meta标签

use std::cell::RefCell;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts
};
use markup5ever::interface::Attribute;
use rstechscan_engine::MultiMap;
use tendril::StrTendril;

#[derive(Debug, Default, Clone)]
pub struct HtmlExtractor {
    script_srcs: RefCell<Vec<String>>,
    meta_tags: RefCell<MultiMap>,
}

impl TokenSink for HtmlExtractor {
    type Handle = ();

    fn process_token(&self, token: Token, _line: u64) -> TokenSinkResult<()> {
        if let Token::TagToken(Tag {
            kind: TagKind::StartTag,
            name,
            attrs,
            ..
        }) = token
        {
            match name.as_ref() {
                "script" => self.extract_script_src(&attrs),
                "meta" => self.extract_meta_tag(&attrs),
                _ => {}
            }
        }
        TokenSinkResult::Continue
    }
}

impl HtmlExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从HTML字符串提取标签
    pub fn extract(html: &str) -> Self {
        let tokenizer = Tokenizer::new(Self::new(), TokenizerOpts::default());
        let queue = BufferQueue::default();
        queue.push_back(StrTendril::from(html));

        let _ = tokenizer.feed(&queue);
        tokenizer.end();

        tokenizer.sink
    }

    fn extract_script_src(&self, attrs: &[Attribute]) {
        if let Some(attr) = attrs.iter().find(|a| a.name.local.as_ref() == "src") {
            self.script_srcs.borrow_mut().push(attr.value.to_string());
        }
    }

    /// meta 名称取 `name`，缺省时取 `property`
    fn extract_meta_tag(&self, attrs: &[Attribute]) {
        let mut name = None;
        let mut property = None;
        let mut content = None;

        for attr in attrs {
            match attr.name.local.as_ref() {
                "name" => name = Some(attr.value.to_lowercase()),
                "property" => property = Some(attr.value.to_lowercase()),
                "content" => content = Some(attr.value.to_string()),
                _ => {}
            }
        }

        if let (Some(n), Some(c)) = (name.or(property), content) {
            self.meta_tags.borrow_mut().entry(n).or_default().push(c);
        }
    }

    /// script-src 列表（文档顺序）
    pub fn script_srcs(&self) -> Vec<String> {
        self.script_srcs.borrow().clone()
    }

    pub fn meta_tags(&self) -> MultiMap {
        self.meta_tags.borrow().clone()
    }

    pub fn into_parts(self) -> (Vec<String>, MultiMap) {
        (self.script_srcs.into_inner(), self.meta_tags.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_extractor() {
        let html = r#"
            <script src="/jquery.min.js"></script>
            <meta name="Generator" content="WordPress 6.0" />
            <meta property="og:site_name" content="Example">
            <meta name="generator" content="Elementor 3.1">
            <script>var inline = 1;</script>
            <script src="/vue.global.js"></script>
        "#;

        let result = HtmlExtractor::extract(html);

        assert_eq!(
            result.script_srcs(),
            vec!["/jquery.min.js".to_string(), "/vue.global.js".to_string()]
        );

        let meta = result.meta_tags();
        assert_eq!(meta["generator"], vec!["WordPress 6.0", "Elementor 3.1"]);
        assert_eq!(meta["og:site_name"], vec!["Example"]);
    }

    #[test]
    fn test_meta_without_content_is_ignored() {
        let result = HtmlExtractor::extract(r#"<meta name="viewport"><meta charset="utf-8">"#);
        assert!(result.meta_tags().is_empty());
    }
}
