//! 日文振假名标注与分词
//!
//! - [`furigana`]：记法解析、分词后端选择、难度估计、渲染
//! - [`vocab_dictionary`]：词表加载与查询
//! - [`lexicon_loader`]：形态素词库的本地/缓存/远程加载
//! - [`config`]：持久化配置

pub mod config;
mod fs_utils;
pub mod furigana;
pub mod lexicon_loader;
pub mod vocab_dictionary;

pub use config::{AnnotatorConfig, MorphologicalBackendConfig};
pub use furigana::{
    parse_furigana_notation, render_html, BackendState, DisplayOptions, JlptLevel, Segment,
    SegmentKind, TokenizerService,
};
pub use lexicon_loader::RemoteLexiconLoader;
pub use vocab_dictionary::{DictionaryLookup, VocabDictionary};
