use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use flate2::read::GzDecoder;
use futures_util::StreamExt;

use crate::config::MorphologicalBackendConfig;
use crate::fs_utils::write_atomic;
use crate::furigana::{parse_lexicon, BackendLoader, LexiconAnalyzer, MorphologicalAnalyzer};

pub const CACHE_FILENAME: &str = "lexicon_cache.tsv";
pub const MIN_VALID_LINE_COUNT: usize = 1;
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn default_cache_path() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir().ok_or_else(|| anyhow::anyhow!("无法获取缓存目录"))?;
    let app_dir = cache_dir.join("FuriganaCore");
    std::fs::create_dir_all(&app_dir)?;
    Ok(app_dir.join(CACHE_FILENAME))
}

/// 校验词库内容，返回有效行数
pub fn validate_lexicon(content: &str, max_bytes: usize) -> Result<usize> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        anyhow::bail!("词库为空");
    }

    if trimmed.len() > max_bytes {
        anyhow::bail!("词库内容过大");
    }

    let mut valid_line_count = 0usize;
    for (idx, line) in trimmed.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        if !is_valid_lexicon_line(line) {
            anyhow::bail!("词库第 {} 行格式不合法", idx + 1);
        }
        valid_line_count += 1;
    }

    if valid_line_count < MIN_VALID_LINE_COUNT {
        anyhow::bail!("词库有效行数不足");
    }

    Ok(valid_line_count)
}

fn is_valid_lexicon_line(line: &str) -> bool {
    let mut fields = line.split('\t');
    let surface = fields.next().unwrap_or_default();
    let reading = fields.next().unwrap_or_default();
    !surface.trim().is_empty() && !reading.trim().is_empty()
}

/// 解码词库包：gzip（按魔数识别）或 UTF-8 纯文本
pub fn decode_bundle(bytes: &[u8], max_bytes: usize) -> Result<String> {
    let raw = if bytes.starts_with(&GZIP_MAGIC) {
        let mut decoded = Vec::new();
        // 多读一个字节用于判断是否超限
        GzDecoder::new(bytes)
            .take(max_bytes as u64 + 1)
            .read_to_end(&mut decoded)
            .map_err(|err| anyhow::anyhow!("词库解压失败: {}", err))?;
        if decoded.len() > max_bytes {
            anyhow::bail!("词库内容过大");
        }
        decoded
    } else {
        bytes.to_vec()
    };

    String::from_utf8(raw).map_err(|err| anyhow::anyhow!("词库内容编码不合法: {}", err))
}

/// 读取缓存；校验失败时删除缓存
pub(crate) fn load_cached_lexicon(path: &Path, max_bytes: usize) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    match validate_lexicon(&content, max_bytes) {
        Ok(_) => Some(content),
        Err(err) => {
            tracing::warn!("缓存词库校验失败，删除缓存: {}", err);
            if let Err(err) = std::fs::remove_file(path) {
                tracing::warn!("删除损坏缓存失败: {}", err);
            }
            None
        }
    }
}

/// 有上限的下载缓冲区，超限时立即失败
pub(crate) struct BoundedBuffer {
    bytes: Vec<u8>,
    limit: usize,
}

impl BoundedBuffer {
    /// `declared_len` 为响应头声明的长度，已超限时直接拒绝
    pub(crate) fn new(declared_len: Option<u64>, limit: usize) -> Result<Self> {
        match declared_len {
            Some(len) if len > limit as u64 => {
                anyhow::bail!("词库内容过大: 声明 {} 字节，上限 {} 字节", len, limit)
            }
            Some(len) => Ok(Self {
                bytes: Vec::with_capacity(len as usize),
                limit,
            }),
            None => Ok(Self {
                bytes: Vec::new(),
                limit,
            }),
        }
    }

    pub(crate) fn push(&mut self, chunk: &[u8]) -> Result<()> {
        if self.bytes.len().saturating_add(chunk.len()) > self.limit {
            anyhow::bail!("词库内容过大: 超过上限 {} 字节", self.limit);
        }
        self.bytes.extend_from_slice(chunk);
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.bytes
    }
}

async fn read_body(response: reqwest::Response, limit: usize) -> Result<Vec<u8>> {
    let mut buffer = BoundedBuffer::new(response.content_length(), limit)?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        buffer.push(&chunk?)?;
    }
    tracing::debug!("词库下载完成: {} 字节", buffer.len());
    Ok(buffer.into_inner())
}

/// 按顺序拉取远程词库，返回 (内容, 成功的地址)
pub async fn fetch_remote_lexicon(
    client: &reqwest::Client,
    endpoints: &[String],
    max_bytes: usize,
) -> Result<(String, String)> {
    if endpoints.is_empty() {
        anyhow::bail!("未配置词库地址");
    }

    let mut last_error = "unknown".to_string();
    for endpoint in endpoints {
        let response = match client.get(endpoint).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!("词库拉取失败 {}: {}", endpoint, err);
                last_error = err.to_string();
                continue;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!("词库拉取失败 {}: HTTP {}", endpoint, status);
            last_error = format!("HTTP {}", status);
            continue;
        }

        let text = match read_body(response, max_bytes)
            .await
            .and_then(|bytes| decode_bundle(&bytes, max_bytes))
        {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!("词库读取响应失败 {}: {}", endpoint, err);
                last_error = err.to_string();
                continue;
            }
        };

        if let Err(err) = validate_lexicon(&text, max_bytes) {
            tracing::warn!("词库校验失败 {}: {}", endpoint, err);
            last_error = err.to_string();
            continue;
        }

        tracing::info!("词库拉取成功: {}", endpoint);
        return Ok((text, endpoint.clone()));
    }

    anyhow::bail!(
        "所有 {} 个词库地址均不可用, 最后错误: {}",
        endpoints.len(),
        last_error
    )
}

/// 形态素后端加载器：本地文件 → 缓存 → 远程
pub struct RemoteLexiconLoader {
    config: MorphologicalBackendConfig,
}

impl RemoteLexiconLoader {
    pub fn new(config: MorphologicalBackendConfig) -> Self {
        Self { config }
    }

    fn cache_path(&self) -> Result<PathBuf> {
        match &self.config.cache_path {
            Some(path) => Ok(path.clone()),
            None => default_cache_path(),
        }
    }

    /// 获取词库文本
    pub async fn load_content(&self) -> Result<String> {
        let max_bytes = self.config.max_bundle_bytes;

        if let Some(local_path) = &self.config.local_path {
            let bytes = tokio::fs::read(local_path)
                .await
                .map_err(|e| anyhow::anyhow!("读取本地词库失败 {:?}: {}", local_path, e))?;
            let content = decode_bundle(&bytes, max_bytes)?;
            validate_lexicon(&content, max_bytes)?;
            tracing::info!("使用本地词库: {:?}", local_path);
            return Ok(content);
        }

        let cache_path = match self.cache_path() {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::warn!("获取词库缓存路径失败，跳过缓存: {}", err);
                None
            }
        };

        if let Some(content) = cache_path
            .as_deref()
            .and_then(|path| load_cached_lexicon(path, max_bytes))
        {
            tracing::info!("使用缓存词库: {:?}", cache_path);
            return Ok(content);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .build()?;
        let (content, endpoint) =
            fetch_remote_lexicon(&client, &self.config.endpoints, max_bytes).await?;

        if let Some(path) = cache_path.as_deref() {
            if let Err(err) = write_atomic(path, content.as_bytes()) {
                tracing::warn!("写入词库缓存失败 ({}): {}", endpoint, err);
            }
        }

        Ok(content)
    }
}

impl BackendLoader for RemoteLexiconLoader {
    async fn load(&self) -> Result<Arc<dyn MorphologicalAnalyzer>> {
        let content = self.load_content().await?;
        let analyzer = LexiconAnalyzer::new(parse_lexicon(&content))?;
        tracing::info!("词库加载完成: {} 个词条", analyzer.len());
        Ok(Arc::new(analyzer))
    }
}
