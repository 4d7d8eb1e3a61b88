use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// 匹配字段的取值形态，编译期按字段名确定，匹配期不再判断
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldShape {
    /// 单值：规则模式逐条匹配同一个字符串
    Scalar,
    /// 列表：规则模式匹配列表中的每个元素
    List,
    /// 键值：按键查找取值后再匹配
    Keyed,
}

/// 匹配字段枚举，定义所有支持的检测维度
/// 声明顺序即匹配顺序（影响证据顺序，不可随意调整）
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchField {
    Url,
    Html,
    Css,
    Robots,
    CertIssuer,
    Scripts,
    Cookies,
    Meta,
    Headers,
    Js,
}

impl MatchField {
    pub const ALL: [MatchField; 10] = [
        MatchField::Url,
        MatchField::Html,
        MatchField::Css,
        MatchField::Robots,
        MatchField::CertIssuer,
        MatchField::Scripts,
        MatchField::Cookies,
        MatchField::Meta,
        MatchField::Headers,
        MatchField::Js,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchField::Url => "url",
            MatchField::Html => "html",
            MatchField::Css => "css",
            MatchField::Robots => "robots",
            MatchField::CertIssuer => "cert_issuer",
            MatchField::Scripts => "scripts",
            MatchField::Cookies => "cookies",
            MatchField::Meta => "meta",
            MatchField::Headers => "headers",
            MatchField::Js => "js",
        }
    }

    pub fn shape(&self) -> FieldShape {
        match self {
            MatchField::Url
            | MatchField::Html
            | MatchField::Css
            | MatchField::Robots
            | MatchField::CertIssuer => FieldShape::Scalar,
            MatchField::Scripts => FieldShape::List,
            MatchField::Cookies | MatchField::Meta | MatchField::Headers | MatchField::Js => {
                FieldShape::Keyed
            }
        }
    }

    /// 键名是否保留大小写（仅 js 全局变量路径区分大小写）
    #[inline]
    pub fn case_sensitive_keys(&self) -> bool {
        matches!(self, MatchField::Js)
    }
}

impl Display for MatchField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 证据来源：真实匹配的字段，或关联推导生成的合成证据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvidenceField {
    Matched(MatchField),
    Implied,
    Excluded,
}

impl EvidenceField {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceField::Matched(field) => field.as_str(),
            EvidenceField::Implied => "implied",
            EvidenceField::Excluded => "excluded",
        }
    }

    /// 合成证据不参与基础置信度统计
    #[inline]
    pub fn is_synthetic(&self) -> bool {
        matches!(self, EvidenceField::Implied | EvidenceField::Excluded)
    }
}

impl Display for EvidenceField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EvidenceField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
