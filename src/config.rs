// src/config.rs

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::furigana::DisplayOptions;
use crate::fs_utils::write_atomic;

// ============================================================================
// 形态素后端配置
// ============================================================================

/// 形态素后端（远程词库包）配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorphologicalBackendConfig {
    /// 是否启用形态素后端（默认关闭，仅使用边界分词）
    #[serde(default)]
    pub enabled: bool,
    /// 词库包下载地址，按顺序尝试
    #[serde(default)]
    pub endpoints: Vec<String>,
    /// 本地词库文件，存在时优先于缓存与远程
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    /// 词库缓存路径（None 表示使用系统缓存目录）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,
    /// 单次请求超时（秒）
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// 词库包大小上限（字节，解压后）
    #[serde(default = "default_max_bundle_bytes")]
    pub max_bundle_bytes: usize,
}

fn default_request_timeout_secs() -> u64 {
    6
}

fn default_max_bundle_bytes() -> usize {
    32 * 1024 * 1024
}

impl Default for MorphologicalBackendConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoints: Vec::new(),
            local_path: None,
            cache_path: None,
            request_timeout_secs: default_request_timeout_secs(),
            max_bundle_bytes: default_max_bundle_bytes(),
        }
    }
}

// ============================================================================
// 应用配置
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AnnotatorConfig {
    /// 振假名显示偏好
    #[serde(default)]
    pub display: DisplayOptions,
    /// 形态素后端配置
    #[serde(default)]
    pub morphological_backend: MorphologicalBackendConfig,
    /// 词表路径（TSV），用于补充读音与难度等级
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocabulary_path: Option<PathBuf>,
}

impl AnnotatorConfig {
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法获取配置目录"))?;
        let app_dir = config_dir.join("FuriganaCore");
        std::fs::create_dir_all(&app_dir)?;
        Ok(app_dir.join("config.json"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// 从指定路径加载；文件不存在时返回默认配置
    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::info!("尝试从以下路径加载配置: {:?}", path);

        if !path.exists() {
            tracing::info!("配置文件不存在，使用默认配置");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;

        // 先解析为 Value，整体反序列化失败时逐字段恢复
        let v: serde_json::Value = serde_json::from_str(&content)?;
        let config = match serde_json::from_value::<AnnotatorConfig>(v.clone()) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("直接解析配置失败，尝试逐字段恢复: {}", e);
                let mut cfg = AnnotatorConfig::default();

                if let Some(display) = v.get("display") {
                    if let Ok(display) = serde_json::from_value(display.clone()) {
                        tracing::info!("成功恢复 display");
                        cfg.display = display;
                    }
                }
                if let Some(backend) = v.get("morphological_backend") {
                    if let Ok(backend) = serde_json::from_value(backend.clone()) {
                        tracing::info!("成功恢复 morphological_backend");
                        cfg.morphological_backend = backend;
                    }
                }
                if let Some(vocabulary_path) = v.get("vocabulary_path") {
                    if let Ok(vocabulary_path) = serde_json::from_value(vocabulary_path.clone()) {
                        tracing::info!("成功恢复 vocabulary_path");
                        cfg.vocabulary_path = vocabulary_path;
                    }
                }

                cfg
            }
        };

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// 原子写入，失败时保留旧配置
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tracing::info!("保存配置到: {:?}", path);

        write_atomic(path, content.as_bytes()).map_err(|e| {
            tracing::error!("保存配置失败: {:#}", e);
            e
        })?;
        tracing::info!("配置保存成功");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_default() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let config = AnnotatorConfig::load_from(&temp.path().join("config.json")).expect("load");
        assert_eq!(config, AnnotatorConfig::default());
        assert!(config.display.show_furigana);
        assert!(!config.morphological_backend.enabled);
        assert_eq!(config.morphological_backend.request_timeout_secs, 6);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("nested").join("config.json");

        let mut config = AnnotatorConfig::default();
        config.display = config.display.toggled();
        config.morphological_backend.enabled = true;
        config.morphological_backend.endpoints = vec!["https://example.invalid/lexicon.tsv.gz".into()];
        config.vocabulary_path = Some(temp.path().join("vocab.tsv"));

        config.save_to(&path).expect("save");
        // 再次保存覆盖旧文件，且不留下备份
        config.save_to(&path).expect("save again");
        let files: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(files.len(), 1);

        let loaded = AnnotatorConfig::load_from(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("config.json");
        std::fs::write(&path, r#"{"morphological_backend":{"enabled":true}}"#).unwrap();

        let config = AnnotatorConfig::load_from(&path).expect("load");
        assert!(config.morphological_backend.enabled);
        assert_eq!(config.morphological_backend.max_bundle_bytes, 32 * 1024 * 1024);
        assert!(config.display.show_furigana);
    }

    #[test]
    fn test_invalid_field_is_recovered_individually() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"display":{"show_furigana":false},"morphological_backend":"broken"}"#,
        )
        .unwrap();

        let config = AnnotatorConfig::load_from(&path).expect("load");
        assert!(!config.display.show_furigana);
        assert_eq!(config.morphological_backend, MorphologicalBackendConfig::default());
    }

    #[test]
    fn test_invalid_json_is_error() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(AnnotatorConfig::load_from(&path).is_err());
    }
}
