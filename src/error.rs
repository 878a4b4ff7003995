use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 鉴权错误
    Auth(AuthError),
    /// 调度错误
    Schedule(ScheduleError),
    /// 资料检索错误
    Research(ResearchError),
    /// 内容生成错误
    Generation(GenerationError),
    /// 配额错误
    Quota(QuotaError),
    /// 发布错误
    Publish(PublishError),
    /// 存储错误
    Store(StoreError),
    /// 配置错误
    Config(ConfigError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Auth(e) => write!(f, "鉴权错误: {}", e),
            AppError::Schedule(e) => write!(f, "调度错误: {}", e),
            AppError::Research(e) => write!(f, "检索错误: {}", e),
            AppError::Generation(e) => write!(f, "生成错误: {}", e),
            AppError::Quota(e) => write!(f, "配额错误: {}", e),
            AppError::Publish(e) => write!(f, "发布错误: {}", e),
            AppError::Store(e) => write!(f, "存储错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Auth(e) => Some(e),
            AppError::Schedule(e) => Some(e),
            AppError::Research(e) => Some(e),
            AppError::Generation(e) => Some(e),
            AppError::Quota(e) => Some(e),
            AppError::Publish(e) => Some(e),
            AppError::Store(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 鉴权错误
#[derive(Debug)]
pub enum AuthError {
    /// 缺少触发令牌
    MissingToken,
    /// 触发令牌不匹配
    InvalidToken,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "缺少触发令牌"),
            AuthError::InvalidToken => write!(f, "触发令牌不匹配"),
        }
    }
}

impl std::error::Error for AuthError {}

/// 调度错误
#[derive(Debug)]
pub enum ScheduleError {
    /// 已有一轮运行在进行中
    RunAlreadyActive,
    /// 运行超出总时间预算
    RunTimeout {
        budget_secs: u64,
    },
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::RunAlreadyActive => write!(f, "已有一轮运行在进行中"),
            ScheduleError::RunTimeout { budget_secs } => {
                write!(f, "运行超出总时间预算 ({}秒)", budget_secs)
            }
        }
    }
}

impl std::error::Error for ScheduleError {}

/// 资料检索错误
#[derive(Debug)]
pub enum ResearchError {
    /// 检索调用超时
    Timeout {
        timeout_secs: u64,
        attempts: u32,
    },
    /// 检索服务不可达
    Unavailable {
        attempts: u32,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for ResearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResearchError::Timeout {
                timeout_secs,
                attempts,
            } => {
                write!(
                    f,
                    "检索调用超时 (单次 {}秒, 已尝试 {} 次)",
                    timeout_secs, attempts
                )
            }
            ResearchError::Unavailable { attempts, source } => {
                write!(f, "检索服务不可达 (已尝试 {} 次): {}", attempts, source)
            }
        }
    }
}

impl std::error::Error for ResearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResearchError::Unavailable { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 内容生成错误
#[derive(Debug)]
pub enum GenerationError {
    /// LLM API 调用失败
    ApiCallFailed {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// LLM 返回内容为空
    EmptyContent {
        model: String,
    },
    /// LLM 响应无法解析
    ResponseParseFailed {
        response: String,
    },
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::ApiCallFailed { model, source } => {
                write!(f, "LLM API 调用失败 (模型: {}): {}", model, source)
            }
            GenerationError::EmptyContent { model } => {
                write!(f, "LLM 返回内容为空 (模型: {})", model)
            }
            GenerationError::ResponseParseFailed { response } => {
                write!(f, "LLM 响应无法解析: {}", response)
            }
        }
    }
}

impl std::error::Error for GenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerationError::ApiCallFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 配额错误
#[derive(Debug)]
pub enum QuotaError {
    /// 本轮配额已用尽
    Exceeded {
        kind: &'static str,
        limit: u64,
    },
}

impl fmt::Display for QuotaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaError::Exceeded { kind, limit } => {
                write!(f, "{} 调用配额已用尽 (上限: {})", kind, limit)
            }
        }
    }
}

impl std::error::Error for QuotaError {}

/// 发布错误
#[derive(Debug)]
pub enum PublishError {
    /// 发布请求失败
    RequestFailed {
        endpoint: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 发布平台返回错误响应
    BadResponse {
        endpoint: String,
        status: Option<u16>,
        message: Option<String>,
    },
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::RequestFailed { endpoint, source } => {
                write!(f, "发布请求失败 ({}): {}", endpoint, source)
            }
            PublishError::BadResponse {
                endpoint,
                status,
                message,
            } => {
                write!(
                    f,
                    "发布平台返回错误响应 ({}): status={:?}, message={:?}",
                    endpoint, status, message
                )
            }
        }
    }
}

impl std::error::Error for PublishError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PublishError::RequestFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 存储错误
#[derive(Debug)]
pub enum StoreError {
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// JSON 序列化/反序列化失败
    JsonFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    TomlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            StoreError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
            StoreError::JsonFailed { source } => write!(f, "JSON 处理失败: {}", source),
            StoreError::TomlParseFailed { path, source } => {
                write!(f, "TOML 解析失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::ReadFailed { source, .. }
            | StoreError::WriteFailed { source, .. }
            | StoreError::JsonFailed { source }
            | StoreError::TomlParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 风格画像不存在
    ProfileNotFound {
        name: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                    var_name, value, expected_type
                )
            }
            ConfigError::ProfileNotFound { name } => {
                write!(f, "风格画像不存在: {}", name)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== 从常见错误类型转换 ==========
// 注意：不需要手动实现 From<AppError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Store(StoreError::JsonFailed {
            source: Box::new(err),
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Store(StoreError::TomlParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Store(StoreError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建 LLM API 调用失败错误
    pub fn generation_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Generation(GenerationError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }

    /// 创建配额用尽错误
    pub fn quota_exceeded(kind: &'static str, limit: u64) -> Self {
        AppError::Quota(QuotaError::Exceeded { kind, limit })
    }

    /// 创建发布请求失败错误
    pub fn publish_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Publish(PublishError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入失败错误
    pub fn store_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Store(StoreError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 是否为"已有运行在进行中"
    pub fn is_run_already_active(&self) -> bool {
        matches!(self, AppError::Schedule(ScheduleError::RunAlreadyActive))
    }

    /// 是否为配额用尽
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, AppError::Quota(_))
    }

    /// 检索阶段是否可降级处理
    ///
    /// 检索超时、不可达和检索配额用尽都不致命：
    /// 任务以"未核实资料"继续起草，由下游收敛措辞
    pub fn is_degradable_research(&self) -> bool {
        matches!(self, AppError::Research(_) | AppError::Quota(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
