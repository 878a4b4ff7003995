use crate::error::AppResult;
use futures::future::BoxFuture;

/// 一条检索命中
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub title: String,
    /// 摘要片段（作为候选论断）
    pub snippet: String,
    /// 来源链接
    pub url: String,
}

/// 事实检索服务
pub trait FactSearch: Send + Sync {
    /// 按查询词检索，最多返回 `limit` 条
    fn search(&self, query: String, limit: usize) -> BoxFuture<'_, AppResult<Vec<SearchHit>>>;
}
