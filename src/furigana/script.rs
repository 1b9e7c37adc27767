//! 日文字符分类与振假名记法工具

use unicode_normalization::UnicodeNormalization;

/// 固定标点集合
pub const PUNCTUATION: &[char] = &[
    '。', '、', '！', '？', '「', '」', '『', '』', '（', '）', '(', ')', ',', '.', '!', '?',
];

/// 判断是否为汉字（含扩展区与々）
pub fn is_kanji(ch: char) -> bool {
    let code = ch as u32;
    ch == '々'
        // CJK Unified Ideographs
        || (0x4E00..=0x9FFF).contains(&code)
        // CJK Unified Ideographs Extension A
        || (0x3400..=0x4DBF).contains(&code)
        // CJK Unified Ideographs Extension B-F
        || (0x20000..=0x2CEAF).contains(&code)
        // CJK Compatibility Ideographs
        || (0xF900..=0xFAFF).contains(&code)
}

pub fn is_hiragana(ch: char) -> bool {
    ('\u{3040}'..='\u{309F}').contains(&ch)
}

pub fn is_katakana(ch: char) -> bool {
    ('\u{30A0}'..='\u{30FF}').contains(&ch)
}

/// 可出现在读音中的假名（ぁ-ゖ、ァ-ヺ、长音符）
pub fn is_reading_char(ch: char) -> bool {
    ('\u{3041}'..='\u{3096}').contains(&ch) || ('\u{30A1}'..='\u{30FA}').contains(&ch) || ch == 'ー'
}

pub fn is_punctuation(ch: char) -> bool {
    PUNCTUATION.contains(&ch)
}

pub fn has_kanji(text: &str) -> bool {
    text.chars().any(is_kanji)
}

pub fn has_hiragana(text: &str) -> bool {
    text.chars().any(is_hiragana)
}

pub fn has_katakana(text: &str) -> bool {
    text.chars().any(is_katakana)
}

/// 仅由平假名（可含空白）组成；空串视为 true
pub fn is_only_hiragana(text: &str) -> bool {
    text.chars().all(|ch| is_hiragana(ch) || ch.is_whitespace())
}

/// 片假名转平假名（ァ-ヶ），其余字符保持不变
pub fn katakana_to_hiragana(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            '\u{30A1}'..='\u{30F6}' => char::from_u32(ch as u32 - 0x60).unwrap_or(ch),
            _ => ch,
        })
        .collect()
}

/// NFC 归一化并去除所有空白，用作词典键
pub fn normalize_japanese_text(text: &str) -> String {
    text.nfc().filter(|ch| !ch.is_whitespace()).collect()
}

/// 生成方括号记法：`漢字[かんじ]`
pub fn format_furigana(text: &str, reading: Option<&str>) -> String {
    match reading {
        Some(reading) if !reading.is_empty() => format!("{}[{}]", text, reading),
        _ => text.to_string(),
    }
}

/// 解析 `漢字[かんじ]`，返回 (汉字, 读音)
pub fn extract_kanji_and_reading(text: &str) -> Option<(&str, &str)> {
    let body = text.strip_suffix(']')?;
    // 汉字部分至少一个字符，取其后的第一个 '['
    let first_len = body.chars().next()?.len_utf8();
    let open = first_len + body[first_len..].find('[')?;
    let kanji = &body[..open];
    let reading = &body[open + 1..];
    if reading.is_empty() {
        return None;
    }
    Some((kanji, reading))
}

/// 移除所有 `[...]` 读音标注；未闭合的 '[' 原样保留
pub fn strip_furigana(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('[') {
        let Some(close) = rest[open..].find(']') else {
            break;
        };
        result.push_str(&rest[..open]);
        rest = &rest[open + close + 1..];
    }

    result.push_str(rest);
    result
}
