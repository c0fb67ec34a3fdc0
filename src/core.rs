use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::env::{EnvResult, EnvVar};
use crate::network::{CacheStore, Clock, Fetcher, PageSource, SystemClock};
use crate::parsers::html::{extract_visible_text, replace_images, strip_blocked_elements, Document};
use crate::parsers::{inject_banner, inject_client_script, rewrite_links, ClientScriptConfig};
use crate::storage::{FileStorage, Storage, StorageError};
use crate::words::{
    analyze, apply_replacements, arrange, replace_field_name, Dictionary, ReconcileSummary,
    ReplacementMap, WordReview,
};

/// Errors that can occur while serving a proxied page
///
/// Each variant maps to exactly one HTTP status through [`ProxyError::status_code`].
/// Malformed markup is never an error: html5ever recovers what it can.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Target is missing, malformed, not http(s), or has no host
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Fetch failed, timed out, returned an error status or an empty body
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Upstream body is binary and does not resemble HTML
    #[error("upstream content is not HTML")]
    NotHtml,

    /// Reading or writing the cache or a dictionary failed
    #[error("persistence failure: {0}")]
    Persistence(#[from] StorageError),

    /// Serializing the rewritten document failed
    #[error("failed to serialize document: {0}")]
    Serialize(io::Error),
}

impl ProxyError {
    pub fn status_code(&self) -> u16 {
        match self {
            ProxyError::InvalidUrl(_) => 400,
            ProxyError::UpstreamUnavailable(_) | ProxyError::NotHtml => 502,
            ProxyError::Persistence(_) | ProxyError::Serialize(_) => 500,
        }
    }

    /// Plaintext message shown to clients; internal details stay in the logs
    pub fn public_message(&self) -> &'static str {
        match self {
            ProxyError::InvalidUrl(_) => "Invalid URL.",
            ProxyError::UpstreamUnavailable(_) => "Failed to fetch remote content.",
            ProxyError::NotHtml => "Remote content is not HTML.",
            ProxyError::Persistence(_) => "Failed to persist data.",
            ProxyError::Serialize(_) => "Failed to render page.",
        }
    }
}

/// Configuration options for the proxy pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyOptions {
    /// Dictionaries live here, the page cache in `<data_dir>/cache`
    pub data_dir: PathBuf,
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
    pub user_agent: String,
    /// Path of the proxy entry point, e.g. `/proxy`
    pub proxy_path: String,
    pub placeholder_image: String,
    /// Images carrying all of these classes get the placeholder
    pub image_classes: Vec<String>,
    pub blocked_domain: Option<String>,
    pub banner: Option<String>,
}

impl ProxyOptions {
    /// Loads every option from `WORDSWAP_*` environment variables
    pub fn from_env() -> EnvResult<Self> {
        use crate::env::{network, rewrite, storage, web};

        Ok(Self {
            data_dir: PathBuf::from(storage::DataDir::get()?),
            cache_ttl: network::CacheTtl::get()?,
            fetch_timeout: network::FetchTimeout::get()?,
            user_agent: network::UserAgent::get()?,
            proxy_path: web::ProxyPath::get()?,
            placeholder_image: rewrite::PlaceholderImage::get()?,
            image_classes: rewrite::ImageClasses::get()?,
            blocked_domain: rewrite::BlockedDomain::get()?,
            banner: rewrite::Banner::get()?,
        })
    }

    /// Runs the same checks the environment parsers do, for options built in code
    pub fn validate(&self) -> EnvResult<()> {
        use crate::env::{network, rewrite, web};

        if self.cache_ttl.is_zero() {
            return Err(env_error(network::CacheTtl::NAME, "TTL must be positive"));
        }
        if self.fetch_timeout.is_zero() {
            return Err(env_error(
                network::FetchTimeout::NAME,
                "Timeout must be positive",
            ));
        }
        web::ProxyPath::parse(&self.proxy_path)?;
        if self.image_classes.iter().all(|c| c.trim().is_empty()) {
            return Err(env_error(
                rewrite::ImageClasses::NAME,
                "At least one class is required",
            ));
        }

        Ok(())
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    pub fn client_script_config(&self, proxy_entry: &str) -> ClientScriptConfig {
        ClientScriptConfig {
            proxy_entry: proxy_entry.to_string(),
            placeholder_image: self.placeholder_image.clone(),
            image_classes: self.image_classes.clone(),
            blocked_domain: self.blocked_domain.clone(),
        }
    }

    /// Built-in defaults, ignoring the environment
    pub fn builtin() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            cache_ttl: Duration::from_secs(86_400),
            fetch_timeout: Duration::from_secs(30),
            user_agent: crate::env::network::default_user_agent(),
            proxy_path: "/proxy".to_string(),
            placeholder_image: "/static/placeholder.jpg".to_string(),
            image_classes: vec!["w-100".to_string(), "h-auto".to_string()],
            blocked_domain: Some("adnxs.com".to_string()),
            banner: None,
        }
    }
}

impl Default for ProxyOptions {
    fn default() -> Self {
        Self::from_env().unwrap_or_else(|e| {
            warn!("Failed to load proxy options from environment: {}. Using defaults.", e);
            Self::builtin()
        })
    }
}

fn env_error(variable: &str, message: &str) -> crate::env::EnvError {
    crate::env::EnvError {
        variable: variable.to_string(),
        message: message.to_string(),
    }
}

/// The request pipeline
///
/// Every call re-reads the cache and both dictionaries from storage; nothing is kept
/// in memory between calls.
pub struct Proxy {
    options: ProxyOptions,
    source: PageSource,
    dictionary: Dictionary,
}

impl Proxy {
    /// Opens file-backed storage under `options.data_dir`
    pub fn open(options: ProxyOptions, fetcher: Arc<dyn Fetcher>) -> Result<Self, ProxyError> {
        let dictionaries: Arc<dyn Storage> = Arc::new(FileStorage::new(&options.data_dir)?);
        let cache: Arc<dyn Storage> = Arc::new(FileStorage::new(options.cache_dir())?);

        info!(data_dir = %options.data_dir.display(), "opened proxy storage");
        Ok(Self::with_storage(
            options,
            cache,
            dictionaries,
            fetcher,
            Arc::new(SystemClock),
        ))
    }

    pub fn with_storage(
        options: ProxyOptions,
        cache_storage: Arc<dyn Storage>,
        dictionary_storage: Arc<dyn Storage>,
        fetcher: Arc<dyn Fetcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = CacheStore::with_clock(cache_storage, options.cache_ttl, clock);

        Self {
            source: PageSource::new(cache, fetcher),
            dictionary: Dictionary::new(dictionary_storage),
            options,
        }
    }

    pub fn options(&self) -> &ProxyOptions {
        &self.options
    }

    pub fn cache(&self) -> &CacheStore {
        self.source.cache()
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Resolves and rewrites a page for display through the proxy
    ///
    /// `proxy_entry` is the address rewritten links point at; pass an absolute URL
    /// when the request host is known, otherwise the proxy path.
    pub fn render_page(&self, url: &Url, proxy_entry: &str) -> Result<Vec<u8>, ProxyError> {
        let mut document = self.load_document(url)?;

        // 横幅先于替换插入，横幅里的词同样会被替换
        if let Some(banner) = &self.options.banner {
            inject_banner(&mut document, banner);
        }

        let replacements = self.replacements_for_render();
        apply_replacements(&mut document, &replacements);

        let classes: Vec<&str> = self.options.image_classes.iter().map(String::as_str).collect();
        replace_images(&mut document, &classes, &self.options.placeholder_image);
        if let Some(domain) = &self.options.blocked_domain {
            strip_blocked_elements(&mut document, domain);
        }

        rewrite_links(&mut document, url, proxy_entry);
        inject_client_script(&mut document, &self.options.client_script_config(proxy_entry));

        document.serialize()
    }

    /// Visible text of the page, one text node per line
    pub fn page_text(&self, url: &Url) -> Result<String, ProxyError> {
        let document = self.load_document(url)?;
        Ok(extract_visible_text(&document).join("\n"))
    }

    /// Ranked word list for the admin review surface
    pub fn review_words(&self, url: &Url) -> Result<WordReview, ProxyError> {
        let document = self.load_document(url)?;
        let ranked = analyze(&extract_visible_text(&document));

        let exclusions = self.dictionary.load_exclusions()?;
        let replacements = self.dictionary.load()?;

        Ok(WordReview {
            url: url.to_string(),
            words: arrange(ranked, &exclusions, &replacements),
        })
    }

    /// Reconciles the replacement file against a submitted review form
    ///
    /// Candidates are derived exactly as in [`Proxy::review_words`]; each one is read
    /// from its `replace_<id>` field. Words not on the page are left untouched.
    pub fn save_replacements(
        &self,
        url: &Url,
        fields: &HashMap<String, String>,
    ) -> Result<ReconcileSummary, ProxyError> {
        let review = self.review_words(url)?;
        let candidates = review.candidates();

        let proposals: HashMap<String, String> = candidates
            .iter()
            .filter_map(|word| {
                fields
                    .get(&replace_field_name(word))
                    .map(|value| (word.to_string(), value.clone()))
            })
            .collect();

        let summary = self.dictionary.save_reconciled(&candidates, &proposals)?;
        info!(
            url = %url,
            set = summary.set,
            removed = summary.removed,
            "saved word replacements"
        );

        Ok(summary)
    }

    pub fn exclude_word(&self, word: &str) -> Result<bool, ProxyError> {
        let changed = self.dictionary.exclude(word)?;
        info!(word, changed, "excluded word");
        Ok(changed)
    }

    pub fn unexclude_word(&self, word: &str) -> Result<bool, ProxyError> {
        let changed = self.dictionary.unexclude(word)?;
        info!(word, changed, "unexcluded word");
        Ok(changed)
    }

    fn load_document(&self, url: &Url) -> Result<Document, ProxyError> {
        let body = self.source.resolve(url)?;
        Document::parse(&body)
    }

    /// A corrupt replacement file must not take every page down; render without it
    fn replacements_for_render(&self) -> ReplacementMap {
        self.dictionary.load().unwrap_or_else(|e| {
            warn!(error = %e, "failed to load word replacements, rendering without them");
            ReplacementMap::new()
        })
    }
}

/// Opens the default file-backed proxy with an HTTP fetcher
pub fn open_http_proxy(options: ProxyOptions) -> Result<Proxy, ProxyError> {
    let fetcher = crate::network::HttpFetcher::new(&options.user_agent, options.fetch_timeout)?;
    Proxy::open(options, Arc::new(fetcher))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticFetcher {
        body: &'static str,
        calls: AtomicUsize,
    }

    impl Fetcher for StaticFetcher {
        fn fetch(&self, _url: &Url) -> Result<Vec<u8>, ProxyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.as_bytes().to_vec())
        }
    }

    const PAGE: &str = r##"<!DOCTYPE html>
<html><head><title>Cats</title></head>
<body>
  <h1>The cat sat</h1>
  <p>A cat and another cat. <a href="/dogs">Dogs</a> <a href="#top">top</a></p>
  <img class="w-100 h-auto" src="/photo.jpg" srcset="/photo-2x.jpg 2x">
  <script src="https://ib.adnxs.com/tag.js"></script>
  <script>var cat = "cat";</script>
</body></html>"##;

    fn proxy(options: ProxyOptions) -> (Arc<MemoryStorage>, Proxy) {
        let dictionaries = Arc::new(MemoryStorage::new());
        let fetcher = Arc::new(StaticFetcher {
            body: PAGE,
            calls: AtomicUsize::new(0),
        });
        let proxy = Proxy::with_storage(
            options,
            Arc::new(MemoryStorage::new()),
            dictionaries.clone(),
            fetcher,
            Arc::new(SystemClock),
        );
        (dictionaries, proxy)
    }

    fn page_url() -> Url {
        Url::parse("https://site.example/animals").unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ProxyError::InvalidUrl("x".into()).status_code(), 400);
        assert_eq!(ProxyError::UpstreamUnavailable("x".into()).status_code(), 502);
        assert_eq!(ProxyError::NotHtml.status_code(), 502);
        assert_eq!(
            ProxyError::from(StorageError::InvalidKey("x".into())).status_code(),
            500
        );

        let serialize = ProxyError::Serialize(io::Error::new(io::ErrorKind::Other, "x"));
        assert_eq!(serialize.status_code(), 500);
        assert_eq!(serialize.public_message(), "Failed to render page.");
    }

    #[test]
    fn test_builtin_options_are_valid() {
        assert!(ProxyOptions::builtin().validate().is_ok());

        let mut options = ProxyOptions::builtin();
        options.proxy_path = "proxy".to_string();
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_render_page_full_pipeline() {
        let mut options = ProxyOptions::builtin();
        options.banner = Some("Proxied cat pages".to_string());
        let (_, proxy) = proxy(options);
        proxy
            .dictionary()
            .save(&[("cat", "dog")].into_iter().collect())
            .unwrap();

        let html = String::from_utf8(
            proxy
                .render_page(&page_url(), "http://localhost:7080/proxy")
                .unwrap(),
        )
        .unwrap();

        assert!(html.contains("The dog sat"));
        assert!(html.contains("A dog and another dog."));
        assert!(html.contains(r#"var cat = "cat";"#));
        assert!(html.contains(
            r#"href="http://localhost:7080/proxy?url=https%3A%2F%2Fsite.example%2Fdogs""#
        ));
        assert!(html.contains(r##"href="#top""##));
        assert!(html.contains(r#"src="/static/placeholder.jpg""#));
        assert!(!html.contains("/photo-2x.jpg"));
        assert!(!html.contains("adnxs.com/tag.js"));
        assert!(html.contains("data-wordswap-version"));
        assert!(html.contains("Proxied dog pages"));
    }

    #[test]
    fn test_render_survives_corrupt_dictionary() {
        let (dictionaries, proxy) = proxy(ProxyOptions::builtin());
        dictionaries
            .write(crate::words::REPLACEMENTS_KEY, b"{oops")
            .unwrap();

        let html = proxy.render_page(&page_url(), "/proxy").unwrap();
        assert!(String::from_utf8(html).unwrap().contains("The cat sat"));
    }

    #[test]
    fn test_page_text_lines() {
        let (_, proxy) = proxy(ProxyOptions::builtin());
        let text = proxy.page_text(&page_url()).unwrap();

        assert_eq!(text, "The cat sat\nA cat and another cat.\nDogs\ntop");
    }

    #[test]
    fn test_review_and_save_replacements() {
        let (_, proxy) = proxy(ProxyOptions::builtin());
        proxy.exclude_word("The").unwrap();

        let review = proxy.review_words(&page_url()).unwrap();
        assert_eq!(review.words[0].word, "cat");
        assert_eq!(review.words[0].frequency, 3);
        assert!(review.words.iter().all(|row| row.word != "The"));

        let mut fields = HashMap::new();
        fields.insert(replace_field_name("cat"), "tiger".to_string());
        fields.insert(replace_field_name("sat"), "sat".to_string());
        let summary = proxy.save_replacements(&page_url(), &fields).unwrap();
        assert_eq!(summary.set, 1);

        let review = proxy.review_words(&page_url()).unwrap();
        let last = review.words.last().unwrap();
        assert_eq!(last.word, "cat");
        assert_eq!(last.replacement.as_deref(), Some("tiger"));
    }
}
