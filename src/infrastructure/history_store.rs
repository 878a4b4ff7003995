//! 发布历史存储 - 基础设施层
//!
//! 持有唯一的历史文件资源，暴露"追加 / 查询 / 本轮占用"能力
//!
//! 历史是只追加的 JSON 文件，跨运行存活；本轮占用表是内存态，
//! 每轮开始时清空，用于并发任务发布前的最后查重

use crate::error::{AppError, AppResult};
use crate::models::HistoryEntry;
use chrono::Utc;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct HistoryState {
    entries: Vec<HistoryEntry>,
    /// 本轮已被任务占用的规范化选题键
    claimed: HashSet<String>,
}

/// 发布历史存储
pub struct HistoryStore {
    path: PathBuf,
    state: Mutex<HistoryState>,
}

impl HistoryStore {
    /// 从文件加载历史；文件不存在视为空历史
    pub fn load(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let entries: Vec<HistoryEntry> = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| {
                AppError::Store(crate::error::StoreError::ReadFailed {
                    path: path.display().to_string(),
                    source: Box::new(e),
                })
            })?;
            serde_json::from_str(&content)?
        } else {
            Vec::new()
        };

        info!("✓ 发布历史加载完成，共 {} 条记录", entries.len());

        Ok(Self {
            path,
            state: Mutex::new(HistoryState {
                entries,
                claimed: HashSet::new(),
            }),
        })
    }

    /// 追加一条记录并落盘
    pub fn append(&self, entry: HistoryEntry) -> AppResult<()> {
        let mut state = self.state.lock().expect("历史锁中毒");
        state.entries.push(entry);
        self.persist(&state.entries)
    }

    /// 回溯窗口内的记录快照
    pub fn recent(&self, window_days: i64) -> Vec<HistoryEntry> {
        let cutoff = Utc::now() - chrono::Duration::days(window_days);
        let state = self.state.lock().expect("历史锁中毒");
        state
            .entries
            .iter()
            .filter(|e| e.published_at >= cutoff)
            .cloned()
            .collect()
    }

    /// 记录总数
    pub fn len(&self) -> usize {
        self.state.lock().expect("历史锁中毒").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 新一轮运行开始，清空本轮占用表
    pub fn begin_run(&self) {
        let mut state = self.state.lock().expect("历史锁中毒");
        state.claimed.clear();
    }

    /// 发布前占用选题
    ///
    /// 同一轮里第一个占用成功的任务继续发布，后到者返回 false 转 Skipped
    pub fn try_claim(&self, normalized_key: &str) -> bool {
        let mut state = self.state.lock().expect("历史锁中毒");
        let fresh = state.claimed.insert(normalized_key.to_string());
        if !fresh {
            debug!("选题键已被并发任务占用: {}", normalized_key);
        }
        fresh
    }

    fn persist(&self, entries: &[HistoryEntry]) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| AppError::store_write_failed(parent.display().to_string(), e))?;
            }
        }
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)
            .map_err(|e| AppError::store_write_failed(self.path.display().to_string(), e))?;
        Ok(())
    }
}

/// 把一条用量台账追加到 JSON Lines 文件
pub fn append_usage_record(path: &str, record: &crate::models::UsageRecord) -> AppResult<()> {
    use std::io::Write;

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::store_write_failed(parent.display().to_string(), e))?;
        }
    }

    let line = serde_json::to_string(record)?;
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::store_write_failed(path.display().to_string(), e))?;
    writeln!(file, "{}", line)
        .map_err(|e| AppError::store_write_failed(path.display().to_string(), e))?;
    Ok(())
}
