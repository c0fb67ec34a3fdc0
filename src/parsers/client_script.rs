//! 客户端脚本注入
//!
//! 注入到页面 `<body>` 末尾的脚本是一个带版本号的模板，负责在页面生命周期内
//! 持续执行三条规则：替换签名图片、删除广告域名元素、让新出现的链接经过代理。
//! 每次 DOM 变化后都会重新执行。

use crate::parsers::html::{append_child, new_element, new_text_node, prepend_child, Document};

/// 脚本模板版本，改动模板行为时递增
pub const CLIENT_SCRIPT_VERSION: u32 = 1;

/// 横幅样式
const BANNER_STYLE: &str = "background: rgba(255,255,255,0.0); color: #4695D6; padding: 0px; \
                            text-align: center; font-weight: bold; position: sticky; top: 0; z-index: 9999;";

/// 客户端脚本参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientScriptConfig {
    /// 代理入口，最好是绝对地址
    pub proxy_entry: String,
    /// 占位图地址
    pub placeholder_image: String,
    /// 需要替换的图片必须同时带有的类名
    pub image_classes: Vec<String>,
    /// 被屏蔽的广告域名
    pub blocked_domain: Option<String>,
}

/// 编码为可以安全嵌入 `<script>` 的 JS 字面量
fn js_literal(value: serde_json::Value) -> String {
    value.to_string().replace("</", "<\\/")
}

/// 渲染脚本正文（不含 `<script>` 标签）
pub fn render_client_script(config: &ClientScriptConfig) -> String {
    let proxy_entry = js_literal(config.proxy_entry.clone().into());
    let placeholder = js_literal(config.placeholder_image.clone().into());
    let image_classes = js_literal(config.image_classes.clone().into());
    let blocked_domain = js_literal(
        config
            .blocked_domain
            .clone()
            .map(serde_json::Value::from)
            .unwrap_or(serde_json::Value::Null),
    );

    format!(
        r#"
(function () {{
  'use strict';
  var config = {{
    version: {version},
    proxyEntry: {proxy_entry},
    placeholder: {placeholder},
    imageClasses: {image_classes},
    blockedDomain: {blocked_domain}
  }};
  var proxyBase = new URL(config.proxyEntry, window.location.href).href;

  function replaceImages() {{
    if (!config.imageClasses.length) return;
    document.querySelectorAll('img').forEach(function (img) {{
      var matches = config.imageClasses.every(function (name) {{
        return img.classList.contains(name);
      }});
      if (matches && img.getAttribute('src') !== config.placeholder) {{
        img.removeAttribute('srcset');
        img.setAttribute('src', config.placeholder);
      }}
    }});
  }}

  function removeBlocked() {{
    if (!config.blockedDomain) return;
    var selector = '[src*="' + config.blockedDomain + '"], [href*="' + config.blockedDomain + '"]';
    document.querySelectorAll(selector).forEach(function (el) {{
      el.remove();
    }});
  }}

  function proxyLinks() {{
    document.querySelectorAll('a[href]').forEach(function (link) {{
      var href = link.getAttribute('href');
      if (!href || href.charAt(0) === '#' || /^javascript:/i.test(href)) return;
      var url;
      try {{
        url = new URL(href, document.baseURI);
      }} catch (e) {{
        return;
      }}
      if (url.protocol !== 'http:' && url.protocol !== 'https:') return;
      if (url.href.indexOf(proxyBase) === 0) return;
      link.setAttribute('href', proxyBase + '?url=' + encodeURIComponent(url.href));
    }});
  }}

  function apply() {{
    replaceImages();
    removeBlocked();
    proxyLinks();
  }}

  function start() {{
    apply();
    new MutationObserver(apply).observe(document.body, {{
      childList: true,
      subtree: true,
      attributes: true,
      attributeFilter: ['src', 'href', 'class']
    }});
  }}

  if (document.readyState === 'loading') {{
    document.addEventListener('DOMContentLoaded', start);
  }} else {{
    start();
  }}
}})();
"#,
        version = CLIENT_SCRIPT_VERSION,
        proxy_entry = proxy_entry,
        placeholder = placeholder,
        image_classes = image_classes,
        blocked_domain = blocked_domain,
    )
}

/// 把客户端脚本追加为 `<body>` 的最后一个子节点
///
/// 文档没有 `<body>`（例如 frameset）时返回 `false`。
pub fn inject_client_script(document: &mut Document, config: &ClientScriptConfig) -> bool {
    let Some(body) = document.body() else {
        return false;
    };

    let version = CLIENT_SCRIPT_VERSION.to_string();
    let script = new_element(
        document.dom(),
        "script",
        &[("data-wordswap-version", version.as_str())],
    );
    append_child(&script, new_text_node(&render_client_script(config)));
    append_child(&body, script);

    true
}

/// 在 `<body>` 开头插入横幅
pub fn inject_banner(document: &mut Document, text: &str) -> bool {
    let Some(body) = document.body() else {
        return false;
    };

    let banner = new_element(
        document.dom(),
        "div",
        &[("class", "wordswap-banner"), ("style", BANNER_STYLE)],
    );
    append_child(&banner, new_text_node(text));
    prepend_child(&body, banner);

    true
}
