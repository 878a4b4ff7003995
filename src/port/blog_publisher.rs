use crate::error::AppResult;
use futures::future::BoxFuture;

/// 待发布的成稿
#[derive(Debug, Clone)]
pub struct BlogPost {
    pub title: String,
    /// 唯一标识，由选题ID派生；平台按 slug 识别重复投稿
    pub slug: String,
    /// 含配图的最终 Markdown
    pub body: String,
    pub tags: Vec<String>,
}

/// 发布回执
#[derive(Debug, Clone)]
pub struct PublishReceipt {
    pub post_id: String,
    /// 平台已存在同 slug 文章，本次按幂等跳过
    pub duplicate: bool,
}

/// 发布目标平台
pub trait BlogPublisher: Send + Sync {
    fn publish(&self, post: BlogPost) -> BoxFuture<'_, AppResult<PublishReceipt>>;
}
