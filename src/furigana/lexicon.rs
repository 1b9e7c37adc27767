//! 形态素分析后端
//!
//! 基于词库的最长优先切词，词库格式：`surface<TAB>reading<TAB>part_of_speech`

use std::collections::HashSet;

use aho_corasick::{AhoCorasick, MatchKind};
use anyhow::Result;

use crate::furigana::script::{has_kanji, katakana_to_hiragana};
use crate::furigana::tokenizer::{classify_char, split_runs, ScriptClass};
use crate::furigana::types::Segment;

/// 形态素
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Morpheme {
    pub surface: String,
    /// 读音（片假名或平假名）
    pub reading: Option<String>,
    pub part_of_speech: Option<String>,
}

impl Morpheme {
    fn unknown(surface: &str) -> Self {
        Self {
            surface: surface.to_string(),
            reading: None,
            part_of_speech: None,
        }
    }
}

/// 形态素分析器
pub trait MorphologicalAnalyzer: Send + Sync {
    /// 切分文本，返回的形态素原文按序拼接应等于输入
    fn analyze(&self, text: &str) -> Result<Vec<Morpheme>>;
}

/// 词库条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexiconEntry {
    pub surface: String,
    pub reading: String,
    pub part_of_speech: Option<String>,
}

/// 解析单行词库，非法行返回 None
pub fn parse_lexicon_line(line: &str) -> Option<LexiconEntry> {
    let mut fields = line.split('\t').map(str::trim);
    let surface = fields.next().filter(|s| !s.is_empty())?;
    let reading = fields.next().filter(|s| !s.is_empty())?;
    let part_of_speech = fields.next().filter(|s| !s.is_empty()).map(str::to_string);

    Some(LexiconEntry {
        surface: surface.to_string(),
        reading: reading.to_string(),
        part_of_speech,
    })
}

/// 解析整个词库，跳过空行与非法行
pub fn parse_lexicon(content: &str) -> Vec<LexiconEntry> {
    content
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .filter_map(parse_lexicon_line)
        .collect()
}

/// 基于词库的形态素分析器（最左最长匹配）
pub struct LexiconAnalyzer {
    matcher: AhoCorasick,
    /// 与 matcher 模式一一对应
    entries: Vec<LexiconEntry>,
}

impl LexiconAnalyzer {
    pub fn new(entries: Vec<LexiconEntry>) -> Result<Self> {
        // 同一原文保留第一条
        let mut seen = HashSet::new();
        let entries: Vec<LexiconEntry> = entries
            .into_iter()
            .filter(|e| seen.insert(e.surface.clone()))
            .collect();

        if entries.is_empty() {
            anyhow::bail!("词库为空");
        }

        let matcher = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(entries.iter().map(|e| e.surface.as_str()))
            .map_err(|e| anyhow::anyhow!("构建词库匹配器失败: {}", e))?;

        Ok(Self { matcher, entries })
    }

    /// 去重后的词条数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 未命中词库的区间按字符类别切分
    fn push_unknown(morphemes: &mut Vec<Morpheme>, text: &str) {
        morphemes.extend(split_runs(text).iter().map(|run| Morpheme::unknown(&run.text)));
    }
}

impl MorphologicalAnalyzer for LexiconAnalyzer {
    fn analyze(&self, text: &str) -> Result<Vec<Morpheme>> {
        let mut morphemes = Vec::new();
        let mut last_end = 0;

        for found in self.matcher.find_iter(text) {
            if found.start() > last_end {
                Self::push_unknown(&mut morphemes, &text[last_end..found.start()]);
            }

            let entry = &self.entries[found.pattern().as_usize()];
            morphemes.push(Morpheme {
                surface: text[found.start()..found.end()].to_string(),
                reading: Some(entry.reading.clone()),
                part_of_speech: entry.part_of_speech.clone(),
            });
            last_end = found.end();
        }

        if last_end < text.len() {
            Self::push_unknown(&mut morphemes, &text[last_end..]);
        }

        Ok(morphemes)
    }
}

/// 形态素转片段
///
/// - 标点/空白 → Punctuation
/// - 含汉字 → Annotated（读音转平假名，与原文相同时不标注）
/// - 其余 → PlainText
pub fn morphemes_to_segments(morphemes: &[Morpheme]) -> Vec<Segment> {
    morphemes
        .iter()
        .filter(|m| !m.surface.is_empty())
        .map(|m| {
            if is_punctuation_morpheme(m) {
                return Segment::punctuation(&m.surface);
            }

            if has_kanji(&m.surface) {
                let reading = m
                    .reading
                    .as_deref()
                    .map(katakana_to_hiragana)
                    .filter(|r| !r.is_empty() && *r != m.surface && r != "*");
                return Segment::annotated(&m.surface, reading);
            }

            Segment::plain(&m.surface)
        })
        .collect()
}

fn is_punctuation_morpheme(morpheme: &Morpheme) -> bool {
    if morpheme.part_of_speech.as_deref().is_some_and(|pos| pos.starts_with("記号")) {
        return true;
    }

    morpheme.surface.chars().all(|ch| {
        matches!(
            classify_char(ch),
            ScriptClass::Whitespace | ScriptClass::Punctuation
        )
    })
}
