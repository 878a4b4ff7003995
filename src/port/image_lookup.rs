use crate::error::AppResult;
use futures::future::BoxFuture;

/// 一张候选图片
#[derive(Debug, Clone)]
pub struct StockImage {
    pub url: String,
    pub alt_text: String,
    /// 来源署名（发布时随图展示）
    pub attribution: String,
}

/// 图库检索服务
pub trait ImageLookup: Send + Sync {
    /// 按关键词找图，最多返回 `count` 张
    fn find_images(
        &self,
        keywords: Vec<String>,
        count: usize,
    ) -> BoxFuture<'_, AppResult<Vec<StockImage>>>;
}
