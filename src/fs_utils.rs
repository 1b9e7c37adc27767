// 文件写入工具

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

/// 在目标文件名后追加后缀，如 `config.json` -> `config.json.bak`
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// 原子写入文件
///
/// 内容先落盘到同目录的临时文件，旧文件改名为 `.bak`，再把临时文件改名为目标；
/// 任一步失败时恢复旧文件并清理临时文件，目标路径上不会出现半写入的内容。
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path = sibling_path(path, &format!(".{}.tmp", nonce));
    let backup_path = sibling_path(path, ".bak");

    let written = std::fs::File::create(&tmp_path).and_then(|mut file| {
        file.write_all(content)?;
        file.sync_all()
    });
    if let Err(err) = written {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(err).with_context(|| format!("写入临时文件失败: {:?}", tmp_path));
    }

    let had_previous = path.exists();
    if had_previous {
        if let Err(err) = std::fs::rename(path, &backup_path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(err).with_context(|| format!("备份旧文件失败: {:?}", path));
        }
    }

    if let Err(err) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        if had_previous {
            match std::fs::rename(&backup_path, path) {
                Ok(()) => tracing::info!("已从备份恢复: {:?}", path),
                Err(restore_err) => tracing::error!("恢复备份失败: {}", restore_err),
            }
        }
        return Err(err).with_context(|| format!("替换文件失败: {:?}", path));
    }

    if had_previous {
        let _ = std::fs::remove_file(&backup_path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_should_create_parent_and_replace_content() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("nested").join("data.json");

        write_atomic(&path, b"first").expect("first write");
        write_atomic(&path, b"second").expect("second write");

        assert_eq!(std::fs::read(&path).expect("read back"), b"second");
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .expect("list dir")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name())
            .filter(|name| name != "data.json")
            .collect();
        assert!(leftovers.is_empty(), "leftover files: {:?}", leftovers);
    }

    #[test]
    fn write_atomic_should_keep_existing_file_on_failure() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "keep").expect("seed file");

        // 父路径是普通文件，无法创建目录
        assert!(write_atomic(&blocker.join("child.json"), b"content").is_err());
        assert_eq!(std::fs::read_to_string(&blocker).expect("read back"), "keep");
    }
}
