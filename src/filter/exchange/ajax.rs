//! AJAX 交换客户端
//!
//! 以 Moodle 外部服务的 AJAX 协议调用远程过滤方法：
//!
//! ```text
//! POST {wwwroot}/lib/ajax/service.php?sesskey=..&info=filter_multilang2
//! [{"index":0,"methodname":"filter_multilang2","args":{"contextid":5,"data":["..."]}}]
//! ```
//!
//! 成功响应为 `[{"error":false,"data":["..."]}]`，失败时条目带有
//! `exception`；会话级失败（如 sesskey 失效）返回单个错误对象。

use futures::future::{FutureExt, LocalBoxFuture};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{ContextId, Exchange};
use crate::filter::config::{constants, FilterConfig};
use crate::filter::error::{FilterError, FilterResult};

#[derive(Debug, Serialize)]
struct AjaxRequest<'a> {
    index: usize,
    methodname: &'a str,
    args: FilterArgs<'a>,
}

#[derive(Debug, Serialize)]
struct FilterArgs<'a> {
    contextid: &'a ContextId,
    data: &'a [String],
}

#[derive(Debug, Deserialize)]
struct AjaxResponse {
    error: bool,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    exception: Option<AjaxException>,
}

#[derive(Debug, Default, Deserialize)]
struct AjaxException {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errorcode: String,
}

/// 基于 reqwest 的远程过滤客户端
#[derive(Debug, Clone)]
pub struct AjaxExchange {
    client: reqwest::Client,
    endpoint: Url,
    method_name: String,
}

impl AjaxExchange {
    pub fn new(wwwroot: &str, sesskey: &str, method_name: &str) -> FilterResult<Self> {
        let mut base = Url::parse(wwwroot)
            .map_err(|e| FilterError::ConfigError(format!("无效的站点地址 {}: {}", wwwroot, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut endpoint = base
            .join(constants::AJAX_SERVICE_PATH)
            .map_err(|e| FilterError::ConfigError(format!("无法构造服务地址: {}", e)))?;
        endpoint
            .query_pairs_mut()
            .append_pair("sesskey", sesskey)
            .append_pair("info", method_name);

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            method_name: method_name.to_string(),
        })
    }

    /// 从配置创建，要求 `wwwroot` 已设置
    pub fn from_config(config: &FilterConfig) -> FilterResult<Self> {
        let wwwroot = config
            .wwwroot
            .as_deref()
            .ok_or_else(|| FilterError::ConfigError("未配置 wwwroot".to_string()))?;
        let sesskey = config.sesskey.as_deref().unwrap_or_default();
        Self::new(wwwroot, sesskey, &config.method_name)
    }

    /// 使用自定义的 HTTP 客户端（代理、超时、Cookie 等）
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn send(&self, context_id: &ContextId, payloads: Vec<String>) -> FilterResult<Vec<String>> {
        let body = [AjaxRequest {
            index: 0,
            methodname: &self.method_name,
            args: FilterArgs {
                contextid: context_id,
                data: &payloads,
            },
        }];

        tracing::debug!(
            "发送过滤请求: {} 项 -> {}",
            payloads.len(),
            self.endpoint.path()
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let text = response.text().await?;
        parse_response(&text)
    }
}

impl Exchange for AjaxExchange {
    fn call<'a>(
        &'a self,
        context_id: &'a ContextId,
        payloads: Vec<String>,
    ) -> LocalBoxFuture<'a, FilterResult<Vec<String>>> {
        self.send(context_id, payloads).boxed_local()
    }
}

/// 解析服务端响应体
pub(crate) fn parse_response(body: &str) -> FilterResult<Vec<String>> {
    let value: serde_json::Value = serde_json::from_str(body)?;

    // 会话级失败返回单个对象而不是数组
    if let Some(object) = value.as_object() {
        let message = object
            .get("error")
            .and_then(|e| e.as_str())
            .unwrap_or("unknown error")
            .to_string();
        let errorcode = object
            .get("errorcode")
            .and_then(|e| e.as_str())
            .unwrap_or_default()
            .to_string();
        return Err(FilterError::RemoteError { errorcode, message });
    }

    let mut responses: Vec<AjaxResponse> = serde_json::from_value(value)?;
    if responses.is_empty() {
        return Err(FilterError::ParseError("响应为空数组".to_string()));
    }
    let first = responses.swap_remove(0);

    if first.error {
        let exception = first.exception.unwrap_or_default();
        return Err(FilterError::RemoteError {
            errorcode: exception.errorcode,
            message: exception.message,
        });
    }

    let data = first
        .data
        .ok_or_else(|| FilterError::ParseError("响应缺少 data 字段".to_string()))?;
    Ok(serde_json::from_value(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_construction() {
        let exchange = AjaxExchange::new("https://lms.example.org/moodle", "abc123", "filter_multilang2")
            .unwrap();
        assert_eq!(
            exchange.endpoint().as_str(),
            "https://lms.example.org/moodle/lib/ajax/service.php?sesskey=abc123&info=filter_multilang2"
        );
    }

    #[test]
    fn test_from_config_requires_wwwroot() {
        let config = FilterConfig::default();
        assert!(matches!(
            AjaxExchange::from_config(&config),
            Err(FilterError::ConfigError(_))
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let payloads = vec!["Hello {mlang en}x{mlang}".to_string()];
        let body = [AjaxRequest {
            index: 0,
            methodname: "filter_multilang2",
            args: FilterArgs {
                contextid: &ContextId(12),
                data: &payloads,
            },
        }];
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "index": 0,
                "methodname": "filter_multilang2",
                "args": {"contextid": 12, "data": ["Hello {mlang en}x{mlang}"]}
            }])
        );
    }

    #[test]
    fn test_parse_success() {
        let data = parse_response(r#"[{"error":false,"data":["Hello","World"]}]"#).unwrap();
        assert_eq!(data, vec!["Hello".to_string(), "World".to_string()]);
    }

    #[test]
    fn test_parse_exception() {
        let err = parse_response(
            r#"[{"error":true,"exception":{"message":"Invalid parameter","errorcode":"invalidparameter"}}]"#,
        )
        .unwrap_err();
        match err {
            FilterError::RemoteError { errorcode, message } => {
                assert_eq!(errorcode, "invalidparameter");
                assert_eq!(message, "Invalid parameter");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_session_failure_and_garbage() {
        let err = parse_response(r#"{"error":"Your session has most likely timed out","errorcode":"servicerequireslogin"}"#)
            .unwrap_err();
        assert!(matches!(err, FilterError::RemoteError { .. }));

        assert!(matches!(
            parse_response("<html>oops</html>"),
            Err(FilterError::SerializationError(_))
        ));
        assert!(matches!(parse_response("[]"), Err(FilterError::ParseError(_))));
    }
}
