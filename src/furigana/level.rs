//! JLPT 难度估计
//!
//! 仅为启发式默认值（长度 + 字符类别），没有经过真实 JLPT 数据校验。
//! 有词典条目时应优先使用词典中的等级。

use crate::furigana::script::{is_kanji, is_katakana, katakana_to_hiragana};
use crate::furigana::types::{DictionaryEntry, JlptLevel, Segment, SegmentKind};
use crate::vocab_dictionary::DictionaryLookup;

/// 根据原文估计难度
pub fn estimate_level(surface: &str) -> JlptLevel {
    let chars: Vec<char> = surface.chars().filter(|ch| !ch.is_whitespace()).collect();
    let kanji_count = chars.iter().filter(|ch| is_kanji(**ch)).count();

    if kanji_count == 0 {
        // 片假名外来语或较长的假名词略高一级
        let all_katakana = !chars.is_empty() && chars.iter().all(|ch| is_katakana(*ch));
        return if all_katakana || chars.len() > 4 {
            JlptLevel::N4
        } else {
            JlptLevel::N5
        };
    }

    match kanji_count {
        1 if chars.len() <= 2 => JlptLevel::N5,
        1 => JlptLevel::N4,
        2 => JlptLevel::N3,
        3 => JlptLevel::N2,
        _ => JlptLevel::N1,
    }
}

/// 词典等级优先，缺失时回退到估计值
pub fn resolve_level(surface: &str, lookup: Option<&dyn DictionaryLookup>) -> JlptLevel {
    lookup
        .and_then(|dict| dict.lookup(surface))
        .and_then(|entry| entry.jlpt_level)
        .unwrap_or_else(|| estimate_level(surface))
}

/// 为汉字片段补充等级，并在缺少读音时用词典读音补齐
///
/// 汉字片段本身查不到时，连同其后的送假名（如 `食` + `べる`）按最长匹配再查一次
pub fn enrich_segments(segments: &mut [Segment], lookup: Option<&dyn DictionaryLookup>) {
    for idx in 0..segments.len() {
        if segments[idx].kind != SegmentKind::Annotated {
            continue;
        }

        let entry = lookup.and_then(|dict| {
            dict.lookup(&segments[idx].surface).or_else(|| {
                let okurigana = segments
                    .get(idx + 1)
                    .filter(|next| next.kind == SegmentKind::PlainText)?;
                inflected_entry(dict, &segments[idx].surface, &okurigana.surface)
            })
        });

        let segment = &mut segments[idx];
        if segment.reading.is_none() {
            segment.reading = entry
                .as_ref()
                .map(|e| e.reading.clone())
                .filter(|r| !r.is_empty());
        }

        segment.estimated_level = Some(
            entry
                .and_then(|e| e.jlpt_level)
                .unwrap_or_else(|| estimate_level(&segment.surface)),
        );
    }
}

/// 词干 + 送假名的词条，读音去掉送假名部分后只对应词干
fn inflected_entry(
    dict: &dyn DictionaryLookup,
    stem: &str,
    okurigana: &str,
) -> Option<DictionaryEntry> {
    let (word, entry) = dict.lookup_longest(&format!("{}{}", stem, okurigana))?;
    let tail = word.strip_prefix(stem).filter(|tail| !tail.is_empty())?;

    let reading = katakana_to_hiragana(&entry.reading);
    let stem_reading = reading
        .strip_suffix(katakana_to_hiragana(tail).as_str())
        .filter(|r| !r.is_empty())?
        .to_string();

    Some(DictionaryEntry {
        reading: stem_reading,
        ..entry
    })
}
