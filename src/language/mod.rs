//! 语言路由模块
//!
//! 将自由文本映射到受支持的语言代码，检测失败时退回默认语言。

use serde::{Deserialize, Serialize};

/// 受支持的语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// 中文
    Zh,
    /// 荷兰语
    Nl,
    /// 英语
    En,
}

impl Language {
    /// 应用内语言代码
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Zh => "zh",
            Language::Nl => "nl",
            Language::En => "en",
        }
    }

    /// 解析语言代码
    pub fn parse(code: &str) -> Option<Language> {
        match code.trim().to_ascii_lowercase().as_str() {
            "zh" => Some(Language::Zh),
            "nl" => Some(Language::Nl),
            "en" => Some(Language::En),
            _ => None,
        }
    }

    /// 外部 locale 代码（用于 ASR/TTS 等语音接口）
    pub fn locale(&self) -> &'static str {
        match self {
            Language::Zh => "zh-CN",
            Language::Nl => "nl-NL",
            Language::En => "en-US",
        }
    }

    /// 全部受支持的语言
    pub fn supported() -> [Language; 3] {
        [Language::Zh, Language::Nl, Language::En]
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 语言解析器
///
/// 基于统计语言识别，识别不出或不在支持列表内时返回默认语言，
/// 对调用方而言永不失败。
#[derive(Debug, Clone)]
pub struct LanguageResolver {
    default: Language,
}

impl LanguageResolver {
    pub fn new(default: Language) -> Self {
        Self { default }
    }

    /// 检测文本语言
    pub fn detect(&self, text: &str) -> Language {
        if text.trim().is_empty() {
            return self.default;
        }

        match whatlang::detect_lang(text) {
            Some(lang) => map_detected(lang).unwrap_or(self.default),
            None => self.default,
        }
    }

    /// 默认语言
    pub fn default_language(&self) -> Language {
        self.default
    }
}

/// 检测器原始输出到应用语言代码的固定映射
fn map_detected(lang: whatlang::Lang) -> Option<Language> {
    match lang {
        whatlang::Lang::Cmn => Some(Language::Zh),
        whatlang::Lang::Nld => Some(Language::Nl),
        whatlang::Lang::Eng => Some(Language::En),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_detect_chinese() {
        let resolver = LanguageResolver::new(Language::Zh);
        assert_eq!(resolver.detect("你好，今天过得怎么样？"), Language::Zh);
    }

    #[test]
    fn test_detect_english() {
        let resolver = LanguageResolver::new(Language::Zh);
        assert_eq!(
            resolver.detect("Hello there, I would like to tell you about my garden today."),
            Language::En
        );
    }

    #[test]
    fn test_detect_dutch() {
        let resolver = LanguageResolver::new(Language::Zh);
        assert_eq!(
            resolver.detect(
                "Goedemorgen! Zullen we samen een kopje koffie drinken en gezellig \
                 bijpraten over de kleinkinderen en het weer van vandaag?"
            ),
            Language::Nl
        );
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("12345 67890")]
    fn test_undetectable_falls_back_to_default(#[case] text: &str) {
        let resolver = LanguageResolver::new(Language::Zh);
        assert_eq!(resolver.detect(text), Language::Zh);
    }

    #[test]
    fn test_unsupported_language_falls_back_to_default() {
        let resolver = LanguageResolver::new(Language::Zh);
        // 俄语不在支持列表中
        assert_eq!(
            resolver.detect("Здравствуйте, как у вас дела сегодня, дорогой друг?"),
            Language::Zh
        );
    }

    #[rstest]
    #[case(Language::Zh, "zh-CN")]
    #[case(Language::Nl, "nl-NL")]
    #[case(Language::En, "en-US")]
    fn test_locale_mapping(#[case] language: Language, #[case] locale: &str) {
        assert_eq!(language.locale(), locale);
    }

    #[test]
    fn test_parse_codes() {
        assert_eq!(Language::parse("zh"), Some(Language::Zh));
        assert_eq!(Language::parse("NL"), Some(Language::Nl));
        assert_eq!(Language::parse(" en "), Some(Language::En));
        assert_eq!(Language::parse("fr"), None);
    }
}
