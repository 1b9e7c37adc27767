//! 振假名类型定义

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 片段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// 普通文本（假名、拉丁字母等）
    PlainText,
    /// 汉字片段（读音可缺省）
    Annotated,
    /// 标点/空白
    Punctuation,
}

/// JLPT 等级（N5 最简单，N1 最难）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JlptLevel {
    N5,
    N4,
    N3,
    N2,
    N1,
}

impl JlptLevel {
    /// 由易到难
    pub const ALL: [JlptLevel; 5] = [
        JlptLevel::N5,
        JlptLevel::N4,
        JlptLevel::N3,
        JlptLevel::N2,
        JlptLevel::N1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JlptLevel::N5 => "N5",
            JlptLevel::N4 => "N4",
            JlptLevel::N3 => "N3",
            JlptLevel::N2 => "N2",
            JlptLevel::N1 => "N1",
        }
    }
}

impl fmt::Display for JlptLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JlptLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        JlptLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| anyhow::anyhow!("无效的 JLPT 等级: {}", s))
    }
}

/// 判断字符串是否为合法的 JLPT 等级（严格大写）
pub fn is_valid_jlpt_level(level: &str) -> bool {
    JlptLevel::ALL.iter().any(|l| l.as_str() == level)
}

/// 解析得到的文本片段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub kind: SegmentKind,
    /// 显示用原文（汉字或假名）
    pub surface: String,
    /// 平假名读音，仅 Annotated 片段可能有值
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading: Option<String>,
    /// 粗略难度估计，非权威
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_level: Option<JlptLevel>,
}

impl Segment {
    pub fn plain(surface: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::PlainText,
            surface: surface.into(),
            reading: None,
            estimated_level: None,
        }
    }

    pub fn punctuation(surface: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Punctuation,
            surface: surface.into(),
            reading: None,
            estimated_level: None,
        }
    }

    pub fn annotated(surface: impl Into<String>, reading: Option<String>) -> Self {
        Self {
            kind: SegmentKind::Annotated,
            surface: surface.into(),
            reading,
            estimated_level: None,
        }
    }

    pub fn is_annotated(&self) -> bool {
        self.kind == SegmentKind::Annotated
    }

    /// 是否带有读音
    pub fn has_reading(&self) -> bool {
        self.is_annotated() && self.reading.as_deref().is_some_and(|r| !r.is_empty())
    }
}

/// 拼接所有片段的原文
pub fn concat_surface(segments: &[Segment]) -> String {
    segments.iter().map(|s| s.surface.as_str()).collect()
}

/// 词典条目（由词汇子系统提供，本模块只读）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryEntry {
    pub word: String,
    pub reading: String,
    pub meaning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jlpt_level: Option<JlptLevel>,
}
