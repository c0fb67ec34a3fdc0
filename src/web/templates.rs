//! HTML 模板生成

use crate::parsers::link_rewriter::proxy_link;
use crate::utils::url::Url;
use crate::web::routes::ADMIN_WORDS_PATH;
use crate::words::WordReview;

const REVIEW_STYLE: &str = "body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 2rem; color: #333; }
table { border-collapse: collapse; width: 100%; max-width: 960px; }
th, td { text-align: left; padding: 0.35rem 0.6rem; border-bottom: 1px solid #e1e5e9; }
td.frequency { text-align: right; color: #666; }
tr.replaced td.word { color: #4695D6; }
.notice { background: #c6f6d5; color: #22543d; padding: 0.75rem 1rem; border-radius: 4px; margin-bottom: 1rem; }
.actions { margin: 1rem 0; }";

const EXCLUDE_SCRIPT: &str = r#"document.querySelectorAll('button.exclude').forEach(function (button) {
  button.addEventListener('click', function () {
    var body = new URLSearchParams();
    body.set('exclude_word', button.dataset.word);
    fetch(window.location.pathname, { method: 'POST', body: body })
      .then(function (response) { return response.text(); })
      .then(function (text) {
        if (text === 'excluded') {
          var row = button.closest('tr');
          if (row) { row.remove(); }
        }
      });
  });
});"#;

/// 转义 HTML 文本和属性值
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// 生成单词审阅页面
///
/// 每个单词一行：单词、出现次数、名为 `replace_<id>` 的替换输入框、排除按钮。
pub fn word_review_page(review: &WordReview, proxy_path: &str, notice: Option<&str>) -> String {
    let (action, view_link) = match Url::parse(&review.url) {
        Ok(url) => (proxy_link(ADMIN_WORDS_PATH, &url), proxy_link(proxy_path, &url)),
        Err(_) => (ADMIN_WORDS_PATH.to_string(), proxy_path.to_string()),
    };

    let mut rows = String::new();
    for row in &review.words {
        let replacement = row.replacement.as_deref().unwrap_or("");
        rows.push_str(&format!(
            "<tr{class}><td class=\"word\">{word}</td><td class=\"frequency\">{frequency}</td>\
             <td><input type=\"text\" name=\"replace_{id}\" value=\"{replacement}\"></td>\
             <td><button type=\"button\" class=\"exclude\" data-word=\"{word}\">Exclude</button></td></tr>\n",
            class = if row.replacement.is_some() { " class=\"replaced\"" } else { "" },
            word = escape_html(&row.word),
            frequency = row.frequency,
            id = row.id,
            replacement = escape_html(replacement),
        ));
    }

    let notice = notice
        .map(|text| format!("<div class=\"notice\">{}</div>\n", escape_html(text)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Word review: {url}</title>
<style>{style}</style>
</head>
<body>
<h1>Word review</h1>
<p><a href="{view_link}">{url}</a> &middot; {count} words</p>
{notice}<form method="post" action="{action}">
<table>
<thead><tr><th>Word</th><th>Frequency</th><th>Replacement</th><th></th></tr></thead>
<tbody>
{rows}</tbody>
</table>
<div class="actions"><button type="submit">Save replacements</button></div>
</form>
<script>{script}</script>
</body>
</html>
"#,
        url = escape_html(&review.url),
        style = REVIEW_STYLE,
        view_link = escape_html(&view_link),
        count = review.words.len(),
        notice = notice,
        action = escape_html(&action),
        rows = rows,
        script = EXCLUDE_SCRIPT,
    )
}
