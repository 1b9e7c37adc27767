//! 片段渲染
//!
//! 将片段映射为 ruby 标记或纯文本，供界面层使用

use serde::{Deserialize, Serialize};

use crate::furigana::script::format_furigana;
use crate::furigana::types::{Segment, SegmentKind};

/// 显示选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOptions {
    /// 是否显示振假名
    #[serde(default = "default_show_furigana")]
    pub show_furigana: bool,
}

fn default_show_furigana() -> bool {
    true
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_furigana: default_show_furigana(),
        }
    }
}

impl DisplayOptions {
    /// 切换振假名显示
    pub fn toggled(self) -> Self {
        Self {
            show_furigana: !self.show_furigana,
        }
    }
}

/// 渲染为 HTML：带读音的汉字片段输出 `<ruby>`，其余为转义后的原文
pub fn render_html(segments: &[Segment], options: DisplayOptions) -> String {
    let mut html = String::new();

    for segment in segments {
        match segment.reading.as_deref() {
            Some(reading) if options.show_furigana && segment.has_reading() => {
                html.push_str("<ruby>");
                html.push_str(&escape_html(&segment.surface));
                html.push_str("<rt>");
                html.push_str(&escape_html(reading));
                html.push_str("</rt></ruby>");
            }
            _ => html.push_str(&escape_html(&segment.surface)),
        }
    }

    html
}

/// 渲染为方括号记法 `漢字[かんじ]`
pub fn render_bracketed(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| {
            if s.is_annotated() {
                format_furigana(&s.surface, s.reading.as_deref())
            } else {
                s.surface.clone()
            }
        })
        .collect()
}

/// 仅输出原文
pub fn render_plain(segments: &[Segment]) -> String {
    segments.iter().map(|s| s.surface.as_str()).collect()
}

/// 可点击查词的片段：(原文, 读音)
pub fn interactive_words(segments: &[Segment]) -> Vec<(&str, Option<&str>)> {
    segments
        .iter()
        .filter(|s| s.kind == SegmentKind::Annotated)
        .map(|s| (s.surface.as_str(), s.reading.as_deref()))
        .collect()
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::furigana::notation::parse_furigana_notation;
    use crate::furigana::script::strip_furigana;

    #[test]
    fn test_render_html_with_furigana() {
        let segments = parse_furigana_notation("私(わたし)は学生です。");
        let html = render_html(&segments, DisplayOptions::default());
        assert_eq!(html, "<ruby>私<rt>わたし</rt></ruby>は学生です。");
    }

    #[test]
    fn test_render_html_hidden_furigana() {
        let segments = parse_furigana_notation("私(わたし)は学生です。");
        let options = DisplayOptions::default().toggled();
        assert!(!options.show_furigana);
        assert_eq!(render_html(&segments, options), "私は学生です。");
    }

    #[test]
    fn test_render_html_escapes() {
        let segments = vec![Segment::plain("<b>&</b>")];
        assert_eq!(
            render_html(&segments, DisplayOptions::default()),
            "&lt;b&gt;&amp;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_render_bracketed_round_trip() {
        let segments = parse_furigana_notation("東京(とうきょう)へ行く");
        let bracketed = render_bracketed(&segments);
        assert_eq!(bracketed, "東京[とうきょう]へ行く");
        assert_eq!(strip_furigana(&bracketed), render_plain(&segments));
    }

    #[test]
    fn test_interactive_words() {
        let segments = parse_furigana_notation("私(わたし)は学生です。");
        assert_eq!(
            interactive_words(&segments),
            vec![("私", Some("わたし")), ("学生", None)]
        );
    }
}
