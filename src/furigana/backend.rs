//! 分词后端选择
//!
//! 状态流转：
//! - `Uninitialized -> Initializing -> Ready`（形态素后端加载成功）
//! - `Uninitialized -> Initializing -> FallbackReady`（加载失败，不重试）
//! - `Uninitialized -> FallbackReady`（未配置后端，立即可用）
//!
//! 加载在 `tokio::spawn` 的任务中进行，调用方共享同一个句柄；
//! 结果写入 `tokio::sync::OnceCell`。调用方超时或被取消不会中断加载，也不会触发第二次加载。
//! 分词本身永不失败，后端不可用时返回回退分词结果。

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::OnceCell;

use crate::furigana::level::enrich_segments;
use crate::furigana::lexicon::{morphemes_to_segments, MorphologicalAnalyzer};
use crate::furigana::notation::parse_furigana_notation;
use crate::furigana::tokenizer::BoundaryTokenizer;
use crate::furigana::types::{concat_surface, Segment};
use crate::vocab_dictionary::DictionaryLookup;

/// 后端状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendState {
    Uninitialized,
    Initializing,
    Ready,
    FallbackReady,
}

/// 形态素后端加载器
pub trait BackendLoader: Send + Sync {
    fn load(&self) -> impl Future<Output = anyhow::Result<Arc<dyn MorphologicalAnalyzer>>> + Send;
}

/// 不提供形态素后端的加载器
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackend;

impl BackendLoader for NoBackend {
    async fn load(&self) -> anyhow::Result<Arc<dyn MorphologicalAnalyzer>> {
        anyhow::bail!("未配置形态素后端")
    }
}

/// 已选定的后端
#[derive(Clone)]
pub enum Backend {
    Morphological(Arc<dyn MorphologicalAnalyzer>),
    Fallback(BoundaryTokenizer),
}

impl Backend {
    pub fn is_morphological(&self) -> bool {
        matches!(self, Backend::Morphological(_))
    }
}

/// 后台加载任务的共享句柄
type LoadHandle = Shared<BoxFuture<'static, ()>>;

/// 分词服务（由组合根构造并注入）
pub struct TokenizerService<L> {
    loader: Arc<L>,
    backend: Arc<OnceCell<Backend>>,
    state: Arc<Mutex<BackendState>>,
    /// 加载在独立任务中进行，调用方放弃等待不会中断加载
    loading: Mutex<Option<LoadHandle>>,
    /// 文本 -> 片段缓存，不淘汰
    cache: Mutex<HashMap<String, Arc<[Segment]>>>,
    lookup: Option<Arc<dyn DictionaryLookup>>,
}

impl<L: BackendLoader + 'static> TokenizerService<L> {
    /// 创建服务，后端在首次分词或显式初始化时加载
    pub fn new(loader: L) -> Self {
        Self {
            loader: Arc::new(loader),
            backend: Arc::new(OnceCell::new()),
            state: Arc::new(Mutex::new(BackendState::Uninitialized)),
            loading: Mutex::new(None),
            cache: Mutex::new(HashMap::new()),
            lookup: None,
        }
    }

    /// 附加词典查询能力
    pub fn with_lookup(mut self, lookup: Arc<dyn DictionaryLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn state(&self) -> BackendState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 初始化后端（记忆化，最多加载一次）
    pub async fn initialize(&self) -> &Backend {
        if self.backend.get().is_none() {
            self.load_handle().await;
        }
        // 加载任务异常退出时未写入后端
        self.backend
            .get_or_init(|| async { Backend::Fallback(BoundaryTokenizer) })
            .await
    }

    /// 取得加载句柄，首次调用时启动加载任务
    fn load_handle(&self) -> LoadHandle {
        let mut loading = self.loading.lock().unwrap_or_else(|e| e.into_inner());
        loading
            .get_or_insert_with(|| {
                set_state(&self.state, BackendState::Initializing);

                let loader = self.loader.clone();
                let backend = self.backend.clone();
                let state = self.state.clone();
                let task = tokio::spawn(async move {
                    let selected = load_backend(loader.as_ref(), &state).await;
                    let _ = backend.set(selected);
                });

                let state = self.state.clone();
                async move {
                    if let Err(err) = task.await {
                        tracing::error!("形态素分析后端加载任务异常退出: {}", err);
                        set_state(&state, BackendState::FallbackReady);
                    }
                }
                .boxed()
                .shared()
            })
            .clone()
    }

    /// 分词（等待后端就绪）
    pub async fn tokenize(&self, text: &str) -> Arc<[Segment]> {
        if let Some(cached) = self.cached(text) {
            return cached;
        }

        let backend = self.initialize().await;
        self.remember(text, self.segment_with(backend, text))
    }

    /// 后端已就绪时同步分词，否则返回 None
    pub fn try_tokenize(&self, text: &str) -> Option<Arc<[Segment]>> {
        if let Some(cached) = self.cached(text) {
            return Some(cached);
        }

        let backend = self.backend.get()?;
        Some(self.remember(text, self.segment_with(backend, text)))
    }

    pub fn cache_len(&self) -> usize {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl TokenizerService<NoBackend> {
    /// 仅使用回退分词，立即可用
    pub fn fallback_only() -> Self {
        Self {
            loader: Arc::new(NoBackend),
            backend: Arc::new(OnceCell::new_with(Some(Backend::Fallback(BoundaryTokenizer)))),
            state: Arc::new(Mutex::new(BackendState::FallbackReady)),
            loading: Mutex::new(None),
            cache: Mutex::new(HashMap::new()),
            lookup: None,
        }
    }
}

fn set_state(state: &Mutex<BackendState>, next: BackendState) {
    let mut guard = state.lock().unwrap_or_else(|e| e.into_inner());
    tracing::debug!("分词后端状态: {:?} -> {:?}", *guard, next);
    *guard = next;
}

async fn load_backend<L: BackendLoader>(loader: &L, state: &Mutex<BackendState>) -> Backend {
    tracing::info!("开始加载形态素分析后端");
    let start = Instant::now();

    match loader.load().await {
        Ok(analyzer) => {
            tracing::info!(
                "形态素分析后端加载完成 (耗时: {}ms)",
                start.elapsed().as_millis()
            );
            set_state(state, BackendState::Ready);
            Backend::Morphological(analyzer)
        }
        Err(err) => {
            tracing::warn!("形态素分析后端加载失败，回退到边界分词: {:#}", err);
            set_state(state, BackendState::FallbackReady);
            Backend::Fallback(BoundaryTokenizer)
        }
    }
}

impl<L> TokenizerService<L> {
    fn cached(&self, text: &str) -> Option<Arc<[Segment]>> {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(text)
            .cloned()
    }

    fn remember(&self, text: &str, segments: Vec<Segment>) -> Arc<[Segment]> {
        let segments: Arc<[Segment]> = segments.into();
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(text.to_string())
            .or_insert(segments)
            .clone()
    }

    fn segment_with(&self, backend: &Backend, text: &str) -> Vec<Segment> {
        let mut segments = match backend {
            Backend::Fallback(tokenizer) => tokenizer.tokenize(text),
            Backend::Morphological(analyzer) => analyze_or_fallback(analyzer.as_ref(), text),
        };
        enrich_segments(&mut segments, self.lookup.as_deref());
        segments
    }
}

/// 形态素分词；文本已带读音记法、分析失败或结果不能还原原文时使用记法解析结果
fn analyze_or_fallback(analyzer: &dyn MorphologicalAnalyzer, text: &str) -> Vec<Segment> {
    let explicit = parse_furigana_notation(text);
    if text.is_empty() || explicit.iter().any(Segment::has_reading) {
        return explicit;
    }

    match analyzer.analyze(text) {
        Ok(morphemes) => {
            let segments = morphemes_to_segments(&morphemes);
            if concat_surface(&segments) == text {
                segments
            } else {
                tracing::warn!("形态素分析结果与原文不一致，使用回退分词");
                explicit
            }
        }
        Err(err) => {
            tracing::warn!("形态素分析失败，使用回退分词: {:#}", err);
            explicit
        }
    }
}
