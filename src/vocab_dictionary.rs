// 词汇词典
//
// 词汇子系统提供的只读查询能力，解析器仅用于补充读音与难度等级。
// 词典缺失时解析照常进行。

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;

use crate::furigana::script::normalize_japanese_text;
use crate::furigana::{DictionaryEntry, JlptLevel};

/// 最长匹配时尝试的最大字符数
pub const MAX_MATCH_CHARS: usize = 8;

/// 词典查询能力
pub trait DictionaryLookup: Send + Sync {
    fn lookup(&self, surface: &str) -> Option<DictionaryEntry>;

    /// 以 `text` 开头的最长词条，返回 (匹配到的原文, 词条)
    fn lookup_longest(&self, text: &str) -> Option<(String, DictionaryEntry)> {
        let chars: Vec<char> = text.chars().take(MAX_MATCH_CHARS).collect();
        (1..=chars.len()).rev().find_map(|len| {
            let candidate: String = chars[..len].iter().collect();
            self.lookup(&candidate).map(|entry| (candidate, entry))
        })
    }
}

/// 标准化词汇（NFC + 去除空白）
pub fn normalize_word(word: &str) -> String {
    normalize_japanese_text(word)
}

/// 解析一行词表：`word<TAB>reading<TAB>meaning[<TAB>pos[<TAB>level]]`
///
/// 读音为空时以词本身作为读音
pub fn parse_vocab_line(line: &str) -> Result<DictionaryEntry> {
    let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
    if fields.len() < 3 {
        anyhow::bail!("字段数不足: 期望至少 3 列，实际 {} 列", fields.len());
    }

    let word = fields[0];
    if word.is_empty() {
        anyhow::bail!("词为空");
    }
    let meaning = fields[2];
    if meaning.is_empty() {
        anyhow::bail!("释义为空: {}", word);
    }
    let reading = if fields[1].is_empty() { word } else { fields[1] };

    let part_of_speech = fields
        .get(3)
        .filter(|pos| !pos.is_empty())
        .map(|pos| pos.to_string());
    let jlpt_level = match fields.get(4).filter(|level| !level.is_empty()) {
        Some(level) => Some(level.parse::<JlptLevel>()?),
        None => None,
    };

    Ok(DictionaryEntry {
        word: word.to_string(),
        reading: reading.to_string(),
        meaning: meaning.to_string(),
        part_of_speech,
        jlpt_level,
    })
}

/// 内存词典：同时按词与读音建立索引
#[derive(Debug, Default, Clone)]
pub struct VocabDictionary {
    entries: HashMap<String, DictionaryEntry>,
}

impl VocabDictionary {
    pub fn new(entries: impl IntoIterator<Item = DictionaryEntry>) -> Self {
        let mut dictionary = Self::default();
        for entry in entries {
            dictionary.insert(entry);
        }
        dictionary
    }

    /// 从 TSV 文本构建，非法行记录警告后跳过；`#` 开头为注释
    pub fn from_tsv(content: &str) -> Self {
        let mut dictionary = Self::default();
        let mut skipped = 0usize;

        for (idx, line) in content.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_vocab_line(line) {
                Ok(entry) => dictionary.insert(entry),
                Err(err) => {
                    skipped += 1;
                    tracing::warn!("词表第 {} 行无效，已跳过: {}", idx + 1, err);
                }
            }
        }

        tracing::info!(
            "词表加载完成: {} 个索引键，跳过 {} 行",
            dictionary.len(),
            skipped
        );
        dictionary
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("读取词表失败 {:?}: {}", path, e))?;
        Ok(Self::from_tsv(&content))
    }

    /// 插入词条
    ///
    /// 词本身作为主键（覆盖旧值）；读音与词不同时作为别名键，不覆盖已有键
    pub fn insert(&mut self, entry: DictionaryEntry) {
        let word_key = normalize_word(&entry.word);
        if word_key.is_empty() {
            return;
        }

        let reading_key = normalize_word(&entry.reading);
        if !reading_key.is_empty() && reading_key != word_key {
            self.entries
                .entry(reading_key)
                .or_insert_with(|| entry.clone());
        }

        self.entries.insert(word_key, entry);
    }

    pub fn lookup_word(&self, word: &str) -> Option<&DictionaryEntry> {
        self.entries.get(&normalize_word(word))
    }

    /// 从 `start`（字符索引）开始查找最长的词典匹配
    pub fn find_longest_match(&self, text: &str, start: usize) -> Option<(String, &DictionaryEntry)> {
        let chars: Vec<char> = text.chars().skip(start).take(MAX_MATCH_CHARS).collect();

        (1..=chars.len()).rev().find_map(|len| {
            let candidate: String = chars[..len].iter().collect();
            self.lookup_word(&candidate)
                .map(|entry| (candidate, entry))
        })
    }

    /// 索引键数量（含读音别名）
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DictionaryLookup for VocabDictionary {
    fn lookup(&self, surface: &str) -> Option<DictionaryEntry> {
        self.lookup_word(surface).cloned()
    }

    fn lookup_longest(&self, text: &str) -> Option<(String, DictionaryEntry)> {
        self.find_longest_match(text, 0)
            .map(|(word, entry)| (word, entry.clone()))
    }
}
