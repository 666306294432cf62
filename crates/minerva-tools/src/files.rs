// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File tools confined to a configured directory.
//!
//! Every tool resolves its path argument through [`resolve_in`]; a resolved
//! path that leaves the allowed directory produces a path-escape error
//! output and touches nothing on disk. The check lives here, inside the
//! tools, not in any caller.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, warn};
use walkdir::WalkDir;

use minerva_core::MinervaError;

use crate::tool::{Tool, ToolContext, ToolOutput};

/// Maximum characters returned by `readFile` before truncation.
const MAX_READ_CHARS: usize = 5000;

/// Files larger than this are skipped for content matching in `searchFiles`.
const CONTENT_SEARCH_MAX_BYTES: u64 = 100 * 1024;

/// Message returned on a path-escape attempt.
fn escape_message(path: &str) -> String {
    format!("路径超出允许的目录范围: {path}")
}

/// Resolves `requested` against `allowed`, rejecting any result that is not
/// a descendant of `allowed`.
///
/// Normalisation is purely lexical: `.` components are dropped and `..`
/// components pop, so no filesystem access happens before the containment
/// check passes.
pub fn resolve_in(allowed: &Path, requested: &str) -> Result<PathBuf, MinervaError> {
    let base: PathBuf = allowed
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let mut resolved = base.clone();

    for component in Path::new(requested).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() || !resolved.starts_with(&base) {
                    return Err(MinervaError::PathEscape {
                        path: requested.to_string(),
                    });
                }
            }
            Component::Normal(part) => resolved.push(part),
            Component::RootDir | Component::Prefix(_) => {
                return Err(MinervaError::PathEscape {
                    path: requested.to_string(),
                });
            }
        }
    }

    if resolved.starts_with(&base) {
        Ok(resolved)
    } else {
        Err(MinervaError::PathEscape {
            path: requested.to_string(),
        })
    }
}

fn path_arg(input: &serde_json::Value) -> String {
    input["path"].as_str().unwrap_or("").trim().to_string()
}

/// Reads a file's content, truncated to a preview size.
pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "readFile"
    }

    fn description(&self) -> &str {
        "读取文件内容。参数：文件路径（相对路径），例如：uploads/document.txt"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "文件路径（相对路径）"}
            },
            "required": ["path"]
        })
    }

    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, MinervaError> {
        let requested = path_arg(&input);
        info!(path = requested.as_str(), "readFile");

        let resolved = match resolve_in(&ctx.allowed_dir, &requested) {
            Ok(p) => p,
            Err(_) => {
                warn!(path = requested.as_str(), "blocked path escape");
                return Ok(ToolOutput::error(escape_message(&requested)));
            }
        };

        if !resolved.exists() {
            return Ok(ToolOutput::error(format!("文件不存在: {requested}")));
        }

        match tokio::fs::read_to_string(&resolved).await {
            Ok(content) => {
                let total = content.chars().count();
                let preview = if total > MAX_READ_CHARS {
                    let head: String = content.chars().take(MAX_READ_CHARS).collect();
                    format!("{head}\n\n...(文件过长，仅显示前{MAX_READ_CHARS}字符)")
                } else {
                    content
                };
                Ok(ToolOutput::ok(format!(
                    "文件: {requested}\n大小: {total} 字符\n\n内容:\n{preview}"
                )))
            }
            Err(e) => Ok(ToolOutput::error(format!(
                "读取文件失败: {requested}\n错误: {e}"
            ))),
        }
    }
}

/// Lists a directory's entries with kind markers and file sizes.
pub struct ListDirectoryTool;

#[async_trait]
impl Tool for ListDirectoryTool {
    fn name(&self) -> &str {
        "listDirectory"
    }

    fn description(&self) -> &str {
        "列出目录中的文件和文件夹。参数：目录路径（相对路径），留空表示根目录"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "目录路径，留空表示根目录"}
            },
            "required": []
        })
    }

    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, MinervaError> {
        let requested = path_arg(&input);
        let display_path = if requested.is_empty() {
            "根目录".to_string()
        } else {
            requested.clone()
        };
        info!(path = display_path.as_str(), "listDirectory");

        let resolved = match resolve_in(&ctx.allowed_dir, &requested) {
            Ok(p) => p,
            Err(_) => return Ok(ToolOutput::error(escape_message(&requested))),
        };

        if !resolved.exists() {
            return Ok(ToolOutput::error(format!("目录不存在: {display_path}")));
        }
        if !resolved.is_dir() {
            return Ok(ToolOutput::error(format!("不是目录: {display_path}")));
        }

        let mut entries = Vec::new();
        let mut reader = match tokio::fs::read_dir(&resolved).await {
            Ok(r) => r,
            Err(e) => {
                return Ok(ToolOutput::error(format!(
                    "列出目录失败: {display_path}\n错误: {e}"
                )))
            }
        };
        while let Ok(Some(entry)) = reader.next_entry().await {
            let name = entry.file_name().to_string_lossy().to_string();
            match entry.metadata().await {
                Ok(meta) if meta.is_dir() => entries.push(format!("[dir] {name}")),
                Ok(meta) => entries.push(format!("[file] {name} ({} 字节)", meta.len())),
                Err(_) => entries.push(format!("[?] {name} (无法访问)")),
            }
        }
        entries.sort();

        let body = if entries.is_empty() {
            "(目录为空)".to_string()
        } else {
            entries.join("\n")
        };
        Ok(ToolOutput::ok(format!("目录: {display_path}\n\n{body}")))
    }
}

/// Recursively searches for files by name and, for small files, by content.
pub struct SearchFilesTool;

#[async_trait]
impl Tool for SearchFilesTool {
    fn name(&self) -> &str {
        "searchFiles"
    }

    fn description(&self) -> &str {
        "搜索包含特定内容的文件。参数：搜索关键词、目录路径（可选，留空搜索所有）"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "keyword": {"type": "string", "description": "搜索关键词"},
                "path": {"type": "string", "description": "目录路径，留空搜索根目录"}
            },
            "required": ["keyword"]
        })
    }

    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, MinervaError> {
        let keyword = input["keyword"].as_str().unwrap_or("").trim().to_string();
        if keyword.is_empty() {
            return Ok(ToolOutput::error("缺少搜索关键词，请提供 keyword 参数。"));
        }
        let requested = path_arg(&input);
        let display_path = if requested.is_empty() {
            "根目录".to_string()
        } else {
            requested.clone()
        };
        info!(keyword = keyword.as_str(), path = display_path.as_str(), "searchFiles");

        let resolved = match resolve_in(&ctx.allowed_dir, &requested) {
            Ok(p) => p,
            Err(_) => return Ok(ToolOutput::error(escape_message(&requested))),
        };

        if !resolved.exists() {
            return Ok(ToolOutput::error(format!("目录不存在: {display_path}")));
        }

        let needle = keyword.to_lowercase();
        let matched = tokio::task::spawn_blocking(move || {
            let mut matched = Vec::new();
            for entry in WalkDir::new(&resolved)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let name = entry.file_name().to_string_lossy().to_string();
                if name.to_lowercase().contains(&needle) {
                    matched.push(format!("[file] {name}"));
                    continue;
                }
                let small = entry
                    .metadata()
                    .map(|m| m.len() < CONTENT_SEARCH_MAX_BYTES)
                    .unwrap_or(false);
                if small {
                    if let Ok(content) = std::fs::read_to_string(entry.path()) {
                        if content.to_lowercase().contains(&needle) {
                            matched.push(format!("[file] {name} (内容匹配)"));
                        }
                    }
                }
            }
            matched
        })
        .await
        .map_err(|e| MinervaError::Internal(format!("file search task failed: {e}")))?;

        let mut result = format!("搜索结果: 关键词='{keyword}', 目录={display_path}\n\n");
        if matched.is_empty() {
            result.push_str("未找到匹配的文件");
        } else {
            result.push_str(&matched.join("\n"));
            result.push_str(&format!("\n\n共找到 {} 个匹配文件", matched.len()));
        }
        Ok(ToolOutput::ok(result))
    }
}

/// Reports a file's name, absolute path, size, kind, and extension.
pub struct GetFileInfoTool;

#[async_trait]
impl Tool for GetFileInfoTool {
    fn name(&self) -> &str {
        "getFileInfo"
    }

    fn description(&self) -> &str {
        "获取文件的详细信息。参数：文件路径"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "文件路径"}
            },
            "required": ["path"]
        })
    }

    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, MinervaError> {
        let requested = path_arg(&input);
        info!(path = requested.as_str(), "getFileInfo");

        let resolved = match resolve_in(&ctx.allowed_dir, &requested) {
            Ok(p) => p,
            Err(_) => return Ok(ToolOutput::error(escape_message(&requested))),
        };

        if !resolved.exists() {
            return Ok(ToolOutput::error(format!("文件不存在: {requested}")));
        }

        let meta = match tokio::fs::metadata(&resolved).await {
            Ok(m) => m,
            Err(e) => {
                return Ok(ToolOutput::error(format!(
                    "获取文件信息失败: {requested}\n错误: {e}"
                )))
            }
        };

        let name = resolved
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| requested.clone());
        let absolute = resolved
            .canonicalize()
            .unwrap_or_else(|_| resolved.clone())
            .display()
            .to_string();

        let mut info = format!("文件信息: {requested}\n\n");
        info.push_str(&format!("- 文件名: {name}\n"));
        info.push_str(&format!("- 绝对路径: {absolute}\n"));
        info.push_str(&format!("- 大小: {} 字节\n", meta.len()));
        info.push_str(&format!(
            "- 类型: {}\n",
            if meta.is_dir() { "目录" } else { "文件" }
        ));
        if !meta.is_dir() {
            let ext = name.rsplit_once('.').map(|(_, e)| e).unwrap_or("无");
            info.push_str(&format!("- 扩展名: .{ext}\n"));
        }
        Ok(ToolOutput::ok(info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::context_in as ctx_in;

    #[test]
    fn resolve_keeps_descendants() {
        let base = Path::new("/srv/uploads");
        let resolved = resolve_in(base, "docs/report.txt").unwrap();
        assert_eq!(resolved, PathBuf::from("/srv/uploads/docs/report.txt"));
    }

    #[test]
    fn resolve_rejects_parent_escape() {
        let base = Path::new("/srv/uploads");
        assert!(resolve_in(base, "../../../etc/passwd").is_err());
        assert!(resolve_in(base, "docs/../../secret").is_err());
    }

    #[test]
    fn resolve_rejects_absolute_paths() {
        let base = Path::new("/srv/uploads");
        assert!(resolve_in(base, "/etc/passwd").is_err());
    }

    #[test]
    fn resolve_allows_dotdot_within_bounds() {
        let base = Path::new("/srv/uploads");
        let resolved = resolve_in(base, "docs/../other/file.txt").unwrap();
        assert_eq!(resolved, PathBuf::from("/srv/uploads/other/file.txt"));
    }

    #[tokio::test]
    async fn read_file_returns_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("note.txt"), "hello minerva").unwrap();
        let ctx = ctx_in(dir.path());

        let output = ReadFileTool
            .invoke(&ctx, serde_json::json!({"path": "note.txt"}))
            .await
            .unwrap();
        assert!(!output.is_error);
        assert!(output.content.contains("hello minerva"));
    }

    #[tokio::test]
    async fn read_file_truncates_long_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("big.txt"), "x".repeat(6000)).unwrap();
        let ctx = ctx_in(dir.path());

        let output = ReadFileTool
            .invoke(&ctx, serde_json::json!({"path": "big.txt"}))
            .await
            .unwrap();
        assert!(output.content.contains("文件过长"));
        assert!(output.content.contains("大小: 6000 字符"));
    }

    #[tokio::test]
    async fn read_file_blocks_escape_without_touching_fs() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_in(dir.path());

        let output = ReadFileTool
            .invoke(&ctx, serde_json::json!({"path": "../../../etc/passwd"}))
            .await
            .unwrap();
        assert!(output.is_error);
        assert!(output.content.contains("超出允许的目录范围"));
        assert!(!output.content.contains("root:"));
    }

    #[tokio::test]
    async fn read_missing_file_is_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_in(dir.path());

        let output = ReadFileTool
            .invoke(&ctx, serde_json::json!({"path": "absent.txt"}))
            .await
            .unwrap();
        assert!(output.is_error);
        assert!(output.content.contains("文件不存在"));
    }

    #[tokio::test]
    async fn list_directory_marks_kinds_and_sizes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "12345").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let ctx = ctx_in(dir.path());

        let output = ListDirectoryTool
            .invoke(&ctx, serde_json::json!({"path": ""}))
            .await
            .unwrap();
        assert!(output.content.contains("[file] a.txt (5 字节)"));
        assert!(output.content.contains("[dir] sub"));
    }

    #[tokio::test]
    async fn list_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_in(dir.path());
        let output = ListDirectoryTool
            .invoke(&ctx, serde_json::json!({}))
            .await
            .unwrap();
        assert!(output.content.contains("(目录为空)"));
    }

    #[tokio::test]
    async fn search_files_matches_name_and_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Report-Q3.txt"), "nothing here").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/notes.txt"), "quarterly report data").unwrap();
        let ctx = ctx_in(dir.path());

        let output = SearchFilesTool
            .invoke(&ctx, serde_json::json!({"keyword": "report", "path": ""}))
            .await
            .unwrap();
        // Name match is case-insensitive; content match is recursive.
        assert!(output.content.contains("Report-Q3.txt"));
        assert!(output.content.contains("notes.txt (内容匹配)"));
        assert!(output.content.contains("共找到 2 个匹配文件"));
    }

    #[tokio::test]
    async fn search_files_skips_large_file_content() {
        let dir = tempfile::tempdir().unwrap();
        let mut big = "padding ".repeat(20_000);
        big.push_str("needle");
        assert!(big.len() as u64 > CONTENT_SEARCH_MAX_BYTES);
        std::fs::write(dir.path().join("big.txt"), big).unwrap();
        let ctx = ctx_in(dir.path());

        let output = SearchFilesTool
            .invoke(&ctx, serde_json::json!({"keyword": "needle"}))
            .await
            .unwrap();
        assert!(output.content.contains("未找到匹配的文件"));
    }

    #[tokio::test]
    async fn get_file_info_reports_fields() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.csv"), "a,b,c").unwrap();
        let ctx = ctx_in(dir.path());

        let output = GetFileInfoTool
            .invoke(&ctx, serde_json::json!({"path": "data.csv"}))
            .await
            .unwrap();
        assert!(output.content.contains("- 文件名: data.csv"));
        assert!(output.content.contains("- 大小: 5 字节"));
        assert!(output.content.contains("- 类型: 文件"));
        assert!(output.content.contains("- 扩展名: .csv"));
    }
}
