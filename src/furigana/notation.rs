//! 振假名记法解析
//!
//! 将 `漢字(かんじ)`、`漢字（かんじ）`、`漢字|かんじ` 形式的文本拆分为片段序列。
//! 解析为全函数：任何输入都返回至少一个片段，不会失败。

use crate::furigana::script::{is_kanji, is_punctuation, is_reading_char, katakana_to_hiragana};
use crate::furigana::types::Segment;

/// 读音匹配结果
#[derive(Debug, PartialEq)]
enum ReadingMatch {
    /// 汉字后没有读音记法
    None,
    /// 合法读音，`end` 为记法结束的字节位置
    Reading { reading: String, end: usize },
    /// 括号组不合法（空、含非假名、未闭合），汉字、括号及其后的假名按普通文本处理
    Malformed { end: usize },
}

/// 解析带振假名记法的文本
pub fn parse_furigana_notation(text: &str) -> Vec<Segment> {
    if text.is_empty() {
        return vec![Segment::plain("")];
    }

    let mut parser = NotationParser::new(text);
    parser.run();
    parser.segments
}

/// 文本中是否含有至少一处合法的读音记法
pub fn has_explicit_reading(text: &str) -> bool {
    parse_furigana_notation(text).iter().any(Segment::has_reading)
}

struct NotationParser<'a> {
    text: &'a str,
    segments: Vec<Segment>,
    /// 当前普通文本的起始位置
    plain_start: Option<usize>,
}

impl<'a> NotationParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            segments: Vec::new(),
            plain_start: None,
        }
    }

    fn run(&mut self) {
        let mut pos = 0;

        while let Some(ch) = self.text[pos..].chars().next() {
            if is_kanji(ch) {
                let kanji_end = self.scan_while(pos, is_kanji);
                match self.match_reading(kanji_end) {
                    ReadingMatch::Reading { reading, end } => {
                        self.flush_plain(pos);
                        self.segments.push(Segment::annotated(
                            &self.text[pos..kanji_end],
                            Some(reading),
                        ));
                        pos = end;
                    }
                    ReadingMatch::Malformed { end } => {
                        // 并入当前普通文本
                        self.plain_start.get_or_insert(pos);
                        pos = end;
                    }
                    ReadingMatch::None => {
                        self.flush_plain(pos);
                        self.segments
                            .push(Segment::annotated(&self.text[pos..kanji_end], None));
                        pos = kanji_end;
                    }
                }
                continue;
            }

            if ch.is_whitespace() {
                // 空白是切分边界，连续空白合并为一个标点片段以保持原文可还原
                self.flush_plain(pos);
                let end = self.scan_while(pos, char::is_whitespace);
                self.segments.push(Segment::punctuation(&self.text[pos..end]));
                pos = end;
                continue;
            }

            if is_punctuation(ch) {
                self.flush_plain(pos);
                let end = pos + ch.len_utf8();
                self.segments.push(Segment::punctuation(&self.text[pos..end]));
                pos = end;
                continue;
            }

            self.plain_start.get_or_insert(pos);
            pos += ch.len_utf8();
        }

        self.flush_plain(self.text.len());
    }

    /// 从 `start` 开始扫描满足条件的字符，返回结束字节位置
    fn scan_while(&self, start: usize, pred: impl Fn(char) -> bool) -> usize {
        self.text[start..]
            .char_indices()
            .find(|(_, ch)| !pred(*ch))
            .map(|(offset, _)| start + offset)
            .unwrap_or(self.text.len())
    }

    /// 尝试匹配紧跟在汉字之后的读音记法
    ///
    /// 括号后只接受假名；遇到其他字符时不合法的部分止于该字符之前，
    /// 之后的文本照常解析
    fn match_reading(&self, at: usize) -> ReadingMatch {
        let open = match self.text[at..].chars().next() {
            Some(ch @ ('(' | '（')) => ch,
            Some('|') => return self.match_pipe_reading(at),
            _ => return ReadingMatch::None,
        };

        let content_start = at + open.len_utf8();
        let content_end = self.scan_while(content_start, is_reading_char);
        let content = &self.text[content_start..content_end];

        match self.text[content_end..].chars().next() {
            Some(close @ (')' | '）')) => {
                let end = content_end + close.len_utf8();
                if content.is_empty() {
                    ReadingMatch::Malformed { end }
                } else {
                    ReadingMatch::Reading {
                        reading: katakana_to_hiragana(content),
                        end,
                    }
                }
            }
            // 未闭合或混入非假名（包括嵌套括号）
            _ => ReadingMatch::Malformed { end: content_end },
        }
    }

    /// 竖线记法：`漢字|かんじ`，读音取最长假名序列
    fn match_pipe_reading(&self, at: usize) -> ReadingMatch {
        let reading_start = at + '|'.len_utf8();
        let end = self.scan_while(reading_start, is_reading_char);
        if end == reading_start {
            return ReadingMatch::None;
        }

        ReadingMatch::Reading {
            reading: katakana_to_hiragana(&self.text[reading_start..end]),
            end,
        }
    }

    fn flush_plain(&mut self, end: usize) {
        if let Some(start) = self.plain_start.take() {
            if end > start {
                self.segments.push(Segment::plain(&self.text[start..end]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::furigana::script::PUNCTUATION;
    use crate::furigana::types::{concat_surface, SegmentKind};

    fn kinds(segments: &[Segment]) -> Vec<SegmentKind> {
        segments.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_punctuation_isolation() {
        let segments = parse_furigana_notation("私(わたし)は学生(がくせい)です。");

        assert_eq!(
            kinds(&segments),
            vec![
                SegmentKind::Annotated,
                SegmentKind::PlainText,
                SegmentKind::Annotated,
                SegmentKind::PlainText,
                SegmentKind::Punctuation,
            ]
        );
        assert_eq!(segments[0].surface, "私");
        assert_eq!(segments[0].reading.as_deref(), Some("わたし"));
        assert_eq!(segments[1].surface, "は");
        assert_eq!(segments[2].surface, "学生");
        assert_eq!(segments[2].reading.as_deref(), Some("がくせい"));
        assert_eq!(segments[3].surface, "です");
        assert_eq!(segments[4].surface, "。");
        assert_eq!(segments.iter().filter(|s| s.has_reading()).count(), 2);
    }

    #[test]
    fn test_full_width_and_mixed_parentheses() {
        let segments = parse_furigana_notation("日本語（にほんご）を勉強(べんきょう）する");
        assert_eq!(segments[0].surface, "日本語");
        assert_eq!(segments[0].reading.as_deref(), Some("にほんご"));
        assert_eq!(segments[1].surface, "を");
        assert_eq!(segments[2].surface, "勉強");
        assert_eq!(segments[2].reading.as_deref(), Some("べんきょう"));
        assert_eq!(segments[3].surface, "する");
        assert_eq!(concat_surface(&segments), "日本語を勉強する");
    }

    #[test]
    fn test_katakana_reading_folded_to_hiragana() {
        let segments = parse_furigana_notation("珈琲(コーヒー)");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].reading.as_deref(), Some("こーひー"));
    }

    #[test]
    fn test_pipe_notation() {
        let segments = parse_furigana_notation("漢字|かんじ、");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].surface, "漢字");
        assert_eq!(segments[0].reading.as_deref(), Some("かんじ"));
        assert_eq!(segments[1].kind, SegmentKind::Punctuation);

        // 竖线后没有假名：汉字无读音，竖线按普通文本
        let segments = parse_furigana_notation("漢字|abc");
        assert_eq!(segments[0].reading, None);
        assert_eq!(segments[1].surface, "|abc");
    }

    #[test]
    fn test_unterminated_notation_is_plain_text() {
        let segments = parse_furigana_notation("漢字(かんじ");
        assert_eq!(segments, vec![Segment::plain("漢字(かんじ")]);
    }

    #[test]
    fn test_malformed_group_is_plain_text() {
        let segments = parse_furigana_notation("漢字(abc)です");
        assert_eq!(
            segments,
            vec![
                Segment::plain("漢字(abc"),
                Segment::punctuation(")"),
                Segment::plain("です"),
            ]
        );

        let segments = parse_furigana_notation("これは漢字()");
        assert_eq!(segments, vec![Segment::plain("これは漢字()")]);
    }

    #[test]
    fn test_unterminated_group_does_not_swallow_later_readings() {
        let segments = parse_furigana_notation("漢字(かんじ。私(わたし)は学生です。");
        assert_eq!(
            segments,
            vec![
                Segment::plain("漢字(かんじ"),
                Segment::punctuation("。"),
                Segment::annotated("私", Some("わたし".to_string())),
                Segment::plain("は"),
                Segment::annotated("学生", None),
                Segment::plain("です"),
                Segment::punctuation("。"),
            ]
        );
    }

    #[test]
    fn test_unterminated_group_keeps_punctuation_isolated() {
        let segments = parse_furigana_notation("漢字(かんじ、今日は晴れ。");
        assert_eq!(
            segments,
            vec![
                Segment::plain("漢字(かんじ"),
                Segment::punctuation("、"),
                Segment::annotated("今日", None),
                Segment::plain("は"),
                Segment::annotated("晴", None),
                Segment::plain("れ"),
                Segment::punctuation("。"),
            ]
        );
    }

    #[test]
    fn test_nested_parentheses_not_supported() {
        // 内层 '(' 不是假名，不合法部分止于此处
        let segments = parse_furigana_notation("漢字(か(ん)じ)");
        assert_eq!(
            segments,
            vec![
                Segment::plain("漢字(か"),
                Segment::punctuation("("),
                Segment::plain("ん"),
                Segment::punctuation(")"),
                Segment::plain("じ"),
                Segment::punctuation(")"),
            ]
        );
    }

    #[test]
    fn test_kanji_without_reading() {
        let segments = parse_furigana_notation("今日は良い天気");
        assert_eq!(
            kinds(&segments),
            vec![
                SegmentKind::Annotated,
                SegmentKind::PlainText,
                SegmentKind::Annotated,
                SegmentKind::PlainText,
                SegmentKind::Annotated,
            ]
        );
        assert!(segments.iter().all(|s| s.reading.is_none()));
        assert_eq!(segments[4].surface, "天気");
    }

    #[test]
    fn test_whitespace_is_boundary() {
        let segments = parse_furigana_notation("hello  world。");
        assert_eq!(segments[0], Segment::plain("hello"));
        assert_eq!(segments[1], Segment::punctuation("  "));
        assert_eq!(segments[2], Segment::plain("world"));
        assert_eq!(segments[3], Segment::punctuation("。"));
    }

    #[test]
    fn test_stray_parentheses() {
        let segments = parse_furigana_notation("(かんじ)");
        assert_eq!(
            segments,
            vec![
                Segment::punctuation("("),
                Segment::plain("かんじ"),
                Segment::punctuation(")"),
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        let segments = parse_furigana_notation("");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].surface, "");
        assert_eq!(segments[0].kind, SegmentKind::PlainText);
    }

    #[test]
    fn test_plain_text_is_reproduced() {
        let inputs = [
            "今日は良い天気ですね。",
            "「こんにちは」と言った！",
            "Rust 2021 edition, really?",
            "  前後に空白  ",
            "(かっこ)だけ",
            "々々",
            "🍣を食べたい",
        ];

        for input in inputs {
            let segments = parse_furigana_notation(input);
            assert_eq!(concat_surface(&segments), input, "input: {}", input);
            assert!(!segments.iter().any(Segment::has_reading), "input: {}", input);
        }
    }

    #[test]
    fn test_notation_surfaces_drop_readings() {
        let cases = [
            ("私(わたし)は学生(がくせい)です。", "私は学生です。"),
            ("東京（とうきょう）へ行(い)く", "東京へ行く"),
            ("漢字|かんじ", "漢字"),
            ("漢字(かんじ", "漢字(かんじ"),
        ];

        for (input, expected) in cases {
            assert_eq!(concat_surface(&parse_furigana_notation(input)), expected);
        }
    }

    #[test]
    fn test_every_punctuation_char_is_isolated() {
        let text: String = PUNCTUATION.iter().collect();
        let segments = parse_furigana_notation(&text);
        assert_eq!(segments.len(), PUNCTUATION.len());
        assert!(segments.iter().all(|s| s.kind == SegmentKind::Punctuation));
    }

    #[test]
    fn test_has_explicit_reading() {
        assert!(has_explicit_reading("私(わたし)"));
        assert!(!has_explicit_reading("私は"));
        assert!(!has_explicit_reading("漢字(かんじ"));
    }
}
