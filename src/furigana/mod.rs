//! 振假名标注核心
//!
//! 解析日文文本、识别汉字片段并附加读音。
//!
//! ## 处理流程
//! 1. 记法解析：`漢字(かんじ)` / `漢字（かんじ）` / `漢字|かんじ`
//! 2. 分词后端选择（形态素后端或边界回退，记忆化初始化）
//! 3. 词典补充读音与难度等级（可选）
//! 4. 渲染为 ruby 标记或纯文本

mod backend;
mod level;
mod lexicon;
mod notation;
mod render;
pub mod script;
mod tokenizer;
mod types;

pub use backend::{Backend, BackendLoader, BackendState, NoBackend, TokenizerService};
pub use level::{enrich_segments, estimate_level, resolve_level};
pub use lexicon::{
    morphemes_to_segments, parse_lexicon, parse_lexicon_line, LexiconAnalyzer, LexiconEntry,
    Morpheme, MorphologicalAnalyzer,
};
pub use notation::{has_explicit_reading, parse_furigana_notation};
pub use render::{interactive_words, render_bracketed, render_html, render_plain, DisplayOptions};
pub use tokenizer::{classify_char, split_runs, BoundaryTokenizer, Run, ScriptClass};
pub use types::{
    concat_surface, is_valid_jlpt_level, DictionaryEntry, JlptLevel, Segment, SegmentKind,
};
