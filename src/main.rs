// 振假名标注命令行工具
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};

use furigana_core::furigana::{
    render_bracketed, render_html, render_plain, BackendLoader, BackendState, TokenizerService,
};
use furigana_core::{AnnotatorConfig, RemoteLexiconLoader, VocabDictionary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Html,
    Bracket,
    Plain,
}

#[derive(Debug, Parser)]
#[command(name = "furigana", about = "为日文文本标注振假名")]
struct Cli {
    /// 输入文本（省略时从标准输入读取）
    text: Option<String>,

    /// 输出格式
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// HTML 输出时隐藏振假名
    #[arg(long)]
    no_furigana: bool,

    /// 启用形态素后端（覆盖配置）
    #[arg(long)]
    morph: bool,

    /// 配置文件路径
    #[arg(long)]
    config: Option<PathBuf>,

    /// 词表路径（TSV，覆盖配置）
    #[arg(long)]
    vocab: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AnnotatorConfig::load_from(path)?,
        None => AnnotatorConfig::load()?,
    };
    if cli.morph {
        config.morphological_backend.enabled = true;
    }
    if cli.no_furigana {
        config.display.show_furigana = false;
    }
    if let Some(vocab) = &cli.vocab {
        config.vocabulary_path = Some(vocab.clone());
    }

    let text = match &cli.text {
        Some(text) => text.clone(),
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            input.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    let vocabulary = match &config.vocabulary_path {
        Some(path) => Some(Arc::new(VocabDictionary::load_from_path(path)?)),
        None => None,
    };

    let output = if config.morphological_backend.enabled {
        let loader = RemoteLexiconLoader::new(config.morphological_backend.clone());
        annotate(TokenizerService::new(loader), vocabulary, &text, &cli, &config).await?
    } else {
        annotate(TokenizerService::fallback_only(), vocabulary, &text, &cli, &config).await?
    };

    println!("{}", output);
    Ok(())
}

async fn annotate<L: BackendLoader + 'static>(
    service: TokenizerService<L>,
    vocabulary: Option<Arc<VocabDictionary>>,
    text: &str,
    cli: &Cli,
    config: &AnnotatorConfig,
) -> Result<String> {
    let service = match vocabulary {
        Some(vocabulary) => service.with_lookup(vocabulary),
        None => service,
    };

    let segments = service.tokenize(text).await;
    if service.state() == BackendState::FallbackReady && config.morphological_backend.enabled {
        tracing::warn!("形态素后端不可用，已使用边界分词");
    }

    let output = match cli.format {
        OutputFormat::Json => serde_json::to_string_pretty(&*segments)?,
        OutputFormat::Html => render_html(&segments, config.display),
        OutputFormat::Bracket => render_bracketed(&segments),
        OutputFormat::Plain => render_plain(&segments),
    };
    Ok(output)
}
