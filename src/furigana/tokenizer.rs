//! 边界分词器
//!
//! - 按字符类别切分连续片段（汉字/平假名/片假名/拉丁/空白/标点）
//! - 无形态素后端时的回退分词

use crate::furigana::notation::parse_furigana_notation;
use crate::furigana::script::{is_hiragana, is_kanji, is_katakana, is_punctuation};
use crate::furigana::types::Segment;

/// 字符类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptClass {
    Kanji,
    Hiragana,
    Katakana,
    /// ASCII 字母/数字
    Latin,
    Whitespace,
    Punctuation,
    Other,
}

/// 同类别的连续片段
#[derive(Debug, Clone)]
pub struct Run {
    pub text: String,
    pub class: ScriptClass,
    /// 在原文中的起始字节位置
    pub start: usize,
    /// 在原文中的结束字节位置（不含）
    pub end: usize,
}

/// 按字符类别切分
///
/// 标点逐字成段，其余类别合并连续字符
pub fn split_runs(text: &str) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut current: Option<(ScriptClass, usize)> = None;

    for (idx, ch) in text.char_indices() {
        let class = classify_char(ch);

        if let Some((current_class, start)) = current {
            if current_class == class && class != ScriptClass::Punctuation {
                continue;
            }
            // 类型切换，保存当前片段
            runs.push(Run {
                text: text[start..idx].to_string(),
                class: current_class,
                start,
                end: idx,
            });
        }
        current = Some((class, idx));
    }

    // 处理最后一个片段
    if let Some((class, start)) = current {
        runs.push(Run {
            text: text[start..].to_string(),
            class,
            start,
            end: text.len(),
        });
    }

    runs
}

/// 字符分类
pub fn classify_char(ch: char) -> ScriptClass {
    if is_kanji(ch) {
        ScriptClass::Kanji
    } else if is_punctuation(ch) {
        ScriptClass::Punctuation
    } else if ch.is_whitespace() {
        ScriptClass::Whitespace
    } else if is_hiragana(ch) {
        ScriptClass::Hiragana
    } else if is_katakana(ch) {
        ScriptClass::Katakana
    } else if ch.is_ascii_alphanumeric() || ch == '_' {
        ScriptClass::Latin
    } else {
        ScriptClass::Other
    }
}

/// 回退分词器（无需异步加载）
///
/// 按标点与空白切分，同时识别文本中已有的振假名记法
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundaryTokenizer;

impl BoundaryTokenizer {
    pub fn tokenize(&self, text: &str) -> Vec<Segment> {
        parse_furigana_notation(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::furigana::types::{concat_surface, SegmentKind};

    #[test]
    fn test_split_runs_mixed() {
        let runs = split_runs("今日はテレビをwatchする。");
        let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["今日", "は", "テレビ", "を", "watch", "する", "。"]);
        assert_eq!(runs[0].class, ScriptClass::Kanji);
        assert_eq!(runs[2].class, ScriptClass::Katakana);
        assert_eq!(runs[4].class, ScriptClass::Latin);
        assert_eq!(runs[6].class, ScriptClass::Punctuation);
    }

    #[test]
    fn test_split_runs_offsets_cover_input() {
        let text = "「えっ！？」 ok";
        let runs = split_runs(text);
        let mut last_end = 0;
        for run in &runs {
            assert_eq!(run.start, last_end);
            assert_eq!(&text[run.start..run.end], run.text);
            last_end = run.end;
        }
        assert_eq!(last_end, text.len());
        // 连续标点逐字成段
        assert_eq!(runs[0].text, "「");
        assert_eq!(runs[2].text, "！");
        assert_eq!(runs[3].text, "？");
    }

    #[test]
    fn test_split_runs_empty() {
        assert!(split_runs("").is_empty());
    }

    #[test]
    fn test_boundary_tokenizer_is_lossless() {
        let tokenizer = BoundaryTokenizer;
        let text = "今日は良い天気ですね。";
        let segments = tokenizer.tokenize(text);
        assert!(!segments.is_empty());
        assert_eq!(concat_surface(&segments), text);
        assert_eq!(segments.last().unwrap().kind, SegmentKind::Punctuation);
    }
}
