// 集成测试公共模块
//
// 提供测试用页面、可记录调用的交换替身与通知替身

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use futures::future::{FutureExt, LocalBoxFuture};
use markup5ever_rcdom::{Handle, RcDom};

use mlang_filter::filter::{
    ContextId, Exchange, FilterConfig, FilterError, FilterResult, MultilangFilter, RenderNotifier,
};
use mlang_filter::parsers::html::{find_nodes, get_node_attr, node_text};
use mlang_filter::parsers::html_to_dom;

/// HTML测试工具
pub struct HtmlTestHelper;

impl HtmlTestHelper {
    /// 创建测试用的DOM结构
    pub fn create_test_dom(html: &str) -> RcDom {
        html_to_dom(html.as_bytes(), "utf-8")
    }

    /// 只含一个带标记段落的页面
    pub fn create_single_paragraph_page() -> String {
        "<p>Hello [[MLANG]]en[[/MLANG]]</p>".to_string()
    }

    /// 两个独立区域的页面，第二个区域是带页眉的弹窗
    pub fn create_two_region_page() -> String {
        r#"<!DOCTYPE html>
<html>
<body>
    <div id="region-a">
        <div class="a-inner"><p>A {mlang en}a{mlang}</p></div>
    </div>
    <div id="region-b" class="modal">
        <div class="modal-header"><h5>Head {mlang en}h{mlang}</h5></div>
        <div class="modal-body"><p>Body {mlang en}b{mlang}</p></div>
    </div>
</body>
</html>"#
            .to_string()
    }

    /// 带各种排除区域的课程页面
    pub fn create_course_page() -> String {
        r#"<!DOCTYPE html>
<html>
<head><title>Course {mlang en}C{mlang}</title></head>
<body>
    <div id="page">
        <h2>{mlang en}Welcome{mlang}{mlang fr}Bienvenue{mlang}</h2>
        <p>See <b>{mlang en}bold{mlang}{mlang fr}gras{mlang}</b></p>
        <script>var label = "{mlang en}script{mlang}";</script>
        <textarea>{mlang en}draft{mlang}</textarea>
        <pre>{mlang en}code{mlang}</pre>
        <div class="ignore-multilang"><p><i>{mlang en}raw{mlang}</i></p></div>
        <div contenteditable="true"><p>{mlang en}editing{mlang}</p></div>
        <p>Plain paragraph</p>
    </div>
</body>
</html>"#
            .to_string()
    }

    pub fn first(dom: &RcDom, tag: &str) -> Handle {
        find_nodes(&dom.document, &[tag])
            .into_iter()
            .next()
            .expect("element should exist")
    }

    /// 按 id 查找元素
    pub fn by_id(dom: &RcDom, tag: &str, id: &str) -> Handle {
        find_nodes(&dom.document, &[tag])
            .into_iter()
            .find(|node| get_node_attr(node, "id").as_deref() == Some(id))
            .expect("element with id should exist")
    }

    /// 按 class 查找元素
    pub fn by_class(dom: &RcDom, tag: &str, class: &str) -> Handle {
        find_nodes(&dom.document, &[tag])
            .into_iter()
            .find(|node| {
                get_node_attr(node, "class")
                    .is_some_and(|c| c.split_ascii_whitespace().any(|part| part == class))
            })
            .expect("element with class should exist")
    }

    pub fn text_of(node: &Handle) -> String {
        node_text(node)
    }
}

/// 交换调用记录
#[derive(Debug, Default)]
pub struct ExchangeLog {
    pub calls: RefCell<Vec<(ContextId, Vec<String>)>>,
    in_flight: Cell<usize>,
    max_in_flight: Cell<usize>,
}

impl ExchangeLog {
    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn payloads(&self, call: usize) -> Vec<String> {
        self.calls.borrow()[call].1.clone()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.get()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.get()
    }
}

/// 调用进行中的计数守卫；超时丢弃 future 时同样会递减
struct InFlightGuard(Rc<ExchangeLog>);

impl InFlightGuard {
    fn enter(log: &Rc<ExchangeLog>) -> Self {
        let now = log.in_flight.get() + 1;
        log.in_flight.set(now);
        log.max_in_flight.set(log.max_in_flight.get().max(now));
        Self(Rc::clone(log))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.set(self.0.in_flight.get() - 1);
    }
}

type Responder = Box<dyn Fn(usize, &[String]) -> FilterResult<Vec<String>>>;

/// 可记录调用的交换替身
///
/// 响应函数收到调用序号（从0开始）和请求数据。
pub struct RecordingExchange {
    log: Rc<ExchangeLog>,
    delay: Duration,
    respond: Responder,
}

impl RecordingExchange {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(usize, &[String]) -> FilterResult<Vec<String>> + 'static,
    {
        Self {
            log: Rc::new(ExchangeLog::default()),
            delay: Duration::ZERO,
            respond: Box::new(respond),
        }
    }

    /// 原样返回请求数据，标记保持不变
    pub fn echo() -> Self {
        Self::new(|_, data| Ok(data.to_vec()))
    }

    /// 模拟服务端：每项只保留 `{mlang en}` 块中的内容，`[[MLANG]]` 形式整体删除
    pub fn resolving() -> Self {
        Self::new(|_, data| Ok(data.iter().map(|s| resolve_english(s)).collect()))
    }

    pub fn fixed(response: Vec<String>) -> Self {
        Self::new(move |_, _| Ok(response.clone()))
    }

    pub fn failing() -> Self {
        Self::new(|_, _| Err(FilterError::NetworkError("connection refused".to_string())))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn log(&self) -> Rc<ExchangeLog> {
        Rc::clone(&self.log)
    }
}

impl Exchange for RecordingExchange {
    fn call<'a>(
        &'a self,
        context_id: &'a ContextId,
        payloads: Vec<String>,
    ) -> LocalBoxFuture<'a, FilterResult<Vec<String>>> {
        async move {
            let index = self.log.call_count();
            self.log
                .calls
                .borrow_mut()
                .push((context_id.clone(), payloads.clone()));
            let _guard = InFlightGuard::enter(&self.log);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            (self.respond)(index, &payloads)
        }
        .boxed_local()
    }
}

/// 极简的服务端解析：保留 `{mlang en}` 块的内容，丢弃其他语言块与 `[[MLANG]]..[[/MLANG]]` 块
pub fn resolve_english(text: &str) -> String {
    let mut output = String::new();
    let mut rest = text;

    loop {
        let square = rest.find("[[MLANG]]");
        let curly = rest.find("{mlang ");
        let start = match (square, curly) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => break,
        };
        output.push_str(&rest[..start]);
        let block = &rest[start..];

        if block.starts_with("[[MLANG]]") {
            match block.find("[[/MLANG]]") {
                Some(end) => rest = &block[end + "[[/MLANG]]".len()..],
                None => {
                    rest = "";
                    break;
                }
            }
        } else {
            let Some(header_end) = block.find('}') else {
                output.push_str(block);
                rest = "";
                break;
            };
            let lang = block["{mlang ".len()..header_end].trim();
            let body = &block[header_end + 1..];
            let Some(close) = body.find("{mlang}") else {
                output.push_str(block);
                rest = "";
                break;
            };
            if lang == "en" {
                output.push_str(&body[..close]);
            }
            rest = &body[close + "{mlang}".len()..];
        }
    }

    output.push_str(rest);
    output.trim_end().to_string()
}

/// 可记录调用的通知替身
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    pub calls: Rc<RefCell<Vec<Vec<Handle>>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl RenderNotifier for RecordingNotifier {
    fn content_rendering_complete(&self, nodes: &[Handle]) {
        self.calls.borrow_mut().push(nodes.to_vec());
    }
}

/// 测试默认配置：默认排除规则，500ms 重试间隔
pub fn test_config() -> FilterConfig {
    FilterConfig::default()
}

/// 用替身组装过滤器
pub fn build_filter(
    dom: &RcDom,
    exchange: RecordingExchange,
    notifier: RecordingNotifier,
    config: FilterConfig,
) -> MultilangFilter {
    MultilangFilter::builder(dom.document.clone(), ContextId(42))
        .config(config)
        .exchange(exchange)
        .notifier(notifier)
        .build()
        .expect("filter should build")
}

/// 推进（暂停的）时钟
pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
