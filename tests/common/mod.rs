//! Common test utilities

#![allow(dead_code)]

use newsgrab::config::Config;
use newsgrab::models::RawArticle;

/// Config tuned for mock servers: no host spacing, millisecond backoff
pub fn test_config(article_limit: usize, max_retries: u32) -> Config {
    let mut config = Config::default();
    config.engine.article_limit = article_limit;
    config.engine.max_retries = max_retries;
    config.engine.per_host_min_interval_ms = 0;
    config.engine.request_timeout_ms = 2_000;
    config.engine.concurrency = 4;
    config.retry.base_delay_ms = 10;
    config.retry.max_delay_ms = 50;
    config.classifier.probe_timeout_ms = 2_000;
    config
}

/// RSS 2.0 document with `count` items
pub fn rss_feed(count: usize) -> String {
    let items: String = (1..=count)
        .map(|i| {
            format!(
                r#"<item>
  <title>Story {i} &amp; more</title>
  <link>https://news.example.com/story/{i}</link>
  <description><![CDATA[<p>Summary of <b>story</b> {i}.</p>]]></description>
  <pubDate>Wed, 01 May 2024 10:{:02}:00 GMT</pubDate>
</item>
"#,
                i % 60
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
<channel>
  <title>Example News</title>
  <link>https://news.example.com/</link>
  <description>Test feed</description>
{items}</channel>
</rss>"#
    )
}

/// Atom document with `count` entries
pub fn atom_feed(count: usize) -> String {
    let entries: String = (1..=count)
        .map(|i| {
            format!(
                r#"<entry>
  <title>Atom entry {i}</title>
  <link rel="alternate" href="https://blog.example.com/posts/{i}"/>
  <id>tag:blog.example.com,2024:{i}</id>
  <updated>2024-05-0{}T08:00:00Z</updated>
  <summary type="html">&lt;p&gt;Entry {i} summary&lt;/p&gt;</summary>
</entry>
"#,
                (i % 9) + 1
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Blog</title>
{entries}</feed>"#
    )
}

/// Server-rendered listing page with `count` article cards
pub fn listing_page(count: usize) -> String {
    let cards: String = (1..=count)
        .map(|i| {
            format!(
                r#"<article class="post">
  <h2><a href="/news/{i}">Headline number {i}</a></h2>
  <time datetime="2024-05-01T09:00:00Z">May 1, 2024</time>
  <p class="excerpt">Excerpt for headline {i} with enough words to read.</p>
</article>
"#
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html><head><title>Latest news</title></head>
<body>
<nav><a href="/about">About</a><a href="/contact">Contact</a></nav>
<main>
{cards}</main>
<footer><a href="/privacy">Privacy</a></footer>
</body></html>"#
    )
}

/// Raw article with markup in every field
pub fn raw_article(n: usize) -> RawArticle {
    RawArticle {
        source_url: "https://news.example.com/feed".to_string(),
        title: format!("  <em>Story</em> {n} &amp; friends "),
        link: format!(" https://news.example.com/story/{n} "),
        published_at: None,
        raw_summary_html: Some(format!("<p>Summary&nbsp;{n}</p><script>x()</script>")),
        raw_body_html: None,
    }
}
