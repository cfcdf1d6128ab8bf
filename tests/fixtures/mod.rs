//! HTML pages served by the local fixture site.

#![allow(dead_code)]

/// Complete article: title, long description and a content image.
pub const ARTICLE_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Field Notes on Queue Backpressure</title>
  <meta property="og:site_name" content="Ops Journal">
  <meta property="og:description" content="What happens to a Redis-backed work queue when consumers fall behind for an hour.">
  <meta property="og:image" content="/img/hero.jpg">
  <meta property="article:published_time" content="2024-05-14T08:30:00Z">
  <meta name="author" content="Avery Chen">
</head>
<body>
  <header><a href="/">Ops Journal</a></header>
  <article>
    <h1>Field Notes on Queue Backpressure</h1>
    <p>The consumers fell behind at nine in the morning, when a downstream API started answering in seconds instead of milliseconds, and the backlog grew by several thousand messages before anyone looked at the dashboard.</p>
    <p>Nothing was lost. Every delivered message sat in the processing list until its handler finished, and the ones abandoned by a restarted worker were moved back onto the queue at startup.</p>
    <p>The lesson was mostly about alerting: queue depth is the first number worth paging on, long before error rates move at all.</p>
  </article>
</body>
</html>"#;

/// Good text, no image anywhere on the page.
pub const NO_IMAGE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Release Checklist</title>
  <meta name="description" content="The twelve steps we run before tagging any release of the ingestion service.">
</head>
<body>
  <main>
    <h1>Release Checklist</h1>
    <p>Run the migrations against a copy of production first.</p>
  </main>
</body>
</html>"#;

/// Title only; too little text to stand on its own.
pub const THIN_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Loading</title>
  <meta name="description" content="Please wait.">
</head>
<body><div id="root"></div></body>
</html>"#;

/// Nothing extractable.
pub const EMPTY_PAGE: &str = "<html><head></head><body></body></html>";

/// Title and body text the mock renderer returns for every page.
pub const RENDERED_TITLE: &str = "Rendered Application";
pub const RENDERED_TEXT: &str = "Text that only exists after client-side scripts have run.";
