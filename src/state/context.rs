use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde_json::{Map, Value};

static THREAD_SEQ: AtomicU64 = AtomicU64::new(0);

/// 生成新的会话线程 ID
pub fn generate_thread_id() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let seq = THREAD_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("thread-{}-{}-{seq}", now.as_secs(), now.subsec_nanos())
}

/// 从请求元数据解析线程 ID：`thread_id` > `session_id` > 新生成
pub fn resolve_thread_id(metadata: &Map<String, Value>) -> String {
    ["thread_id", "session_id"]
        .iter()
        .filter_map(|key| metadata.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_else(generate_thread_id)
}

struct ContextState {
    query: String,
    response: Option<String>,
    metadata: Map<String, Value>,
    thread_id: String,
    outputs: Vec<(String, Map<String, Value>)>,
    warnings: Vec<String>,
}

/// 单次执行内节点共享的上下文
///
/// 节点之间只通过它传递数据；每次运行创建新的实例。
#[derive(Clone)]
pub struct ExecutionContext {
    inner: Arc<RwLock<ContextState>>,
}

impl ExecutionContext {
    pub fn new(query: impl Into<String>, metadata: Map<String, Value>) -> Self {
        let thread_id = resolve_thread_id(&metadata);
        Self {
            inner: Arc::new(RwLock::new(ContextState {
                query: query.into(),
                response: None,
                metadata,
                thread_id,
                outputs: Vec::new(),
                warnings: Vec::new(),
            })),
        }
    }

    pub fn query(&self) -> String {
        self.inner.read().query.clone()
    }

    pub fn set_query(&self, query: impl Into<String>) {
        self.inner.write().query = query.into();
    }

    pub fn response(&self) -> Option<String> {
        self.inner.read().response.clone()
    }

    pub fn set_response(&self, response: impl Into<String>) {
        self.inner.write().response = Some(response.into());
    }

    pub fn metadata(&self) -> Map<String, Value> {
        self.inner.read().metadata.clone()
    }

    pub fn insert_metadata(&self, key: impl Into<String>, value: Value) {
        self.inner.write().metadata.insert(key.into(), value);
    }

    pub fn thread_id(&self) -> String {
        self.inner.read().thread_id.clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.inner.read().warnings.clone()
    }

    pub fn push_warning(&self, warning: impl Into<String>) {
        self.inner.write().warnings.push(warning.into());
    }

    /// 指定节点的输出
    pub fn output(&self, node_id: &str) -> Option<Map<String, Value>> {
        self.inner
            .read()
            .outputs
            .iter()
            .find(|(id, _)| id == node_id)
            .map(|(_, output)| output.clone())
    }

    /// 已执行节点的 ID（按执行顺序）
    pub fn executed_nodes(&self) -> Vec<String> {
        self.inner
            .read()
            .outputs
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// 构造节点输入：当前查询、响应、元数据、线程 ID 和所有上游输出
    pub fn to_input(&self) -> Map<String, Value> {
        let state = self.inner.read();
        let mut input = Map::new();
        input.insert("query".into(), Value::String(state.query.clone()));
        if let Some(response) = &state.response {
            input.insert("response".into(), Value::String(response.clone()));
        }
        input.insert("metadata".into(), Value::Object(state.metadata.clone()));
        input.insert("thread_id".into(), Value::String(state.thread_id.clone()));
        let upstream: Map<String, Value> = state
            .outputs
            .iter()
            .map(|(id, output)| (id.clone(), Value::Object(output.clone())))
            .collect();
        input.insert("upstream".into(), Value::Object(upstream));
        input
    }

    /// 记录节点输出
    ///
    /// 字符串类型的 `response` 覆盖当前响应；`status: "error"` 和 `warnings` 数组记为警告。
    pub fn apply(&self, node_id: &str, output: Map<String, Value>) {
        let mut state = self.inner.write();
        if let Some(response) = output.get("response").and_then(Value::as_str) {
            state.response = Some(response.to_string());
        }
        if let Some(warnings) = output.get("warnings").and_then(Value::as_array) {
            let warnings: Vec<String> = warnings
                .iter()
                .filter_map(Value::as_str)
                .map(|w| format!("{node_id}: {w}"))
                .collect();
            state.warnings.extend(warnings);
        }
        if output.get("status").and_then(Value::as_str) == Some("error") {
            let detail = output
                .get("response")
                .or_else(|| output.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("node reported an error");
            state.warnings.push(format!("{node_id}: {detail}"));
        }
        state.outputs.push((node_id.to_string(), output));
    }
}
