//! Theme stylesheet and runtime script.

/// Asset pipeline utilities.
pub struct AssetPipeline;

impl AssetPipeline {
    /// Generate the main CSS file.
    pub fn generate_css() -> String {
        DEFAULT_CSS.to_string()
    }

    /// Generate the main JavaScript file.
    pub fn generate_js() -> String {
        DEFAULT_JS.to_string()
    }

    /// Minify CSS using lightningcss.
    pub fn minify_css(css: &str) -> Result<String, String> {
        use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

        let stylesheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| format!("CSS parse error: {}", e))?;

        let minified = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..Default::default()
            })
            .map_err(|e| format!("CSS minify error: {}", e))?;

        Ok(minified.code)
    }
}

const DEFAULT_CSS: &str = r#"/* pukidocs theme */

:root {
  --primary: #3f51b5;
  --primary-foreground: #ffffff;
  --background: #ffffff;
  --foreground: #1f2328;
  --muted: #f5f6f8;
  --muted-foreground: #5c6370;
  --border: #e1e4e8;
  --code-background: #f6f8fa;
  --notice: #fff8e1;
  --sidebar-width: 260px;
  --toc-width: 200px;
  --content-max-width: 820px;
  --radius: 0.25rem;
}

* {
  box-sizing: border-box;
}

body {
  margin: 0;
  font-family: system-ui, -apple-system, "Hiragino Sans", "Noto Sans JP", "Yu Gothic", sans-serif;
  background: var(--background);
  color: var(--foreground);
  line-height: 1.7;
}

/* Header */
.header {
  position: sticky;
  top: 0;
  z-index: 20;
  display: flex;
  align-items: center;
  gap: 1.5rem;
  padding: 0.5rem 1.5rem;
  background: var(--primary);
  color: var(--primary-foreground);
}

.header a {
  color: var(--primary-foreground);
  text-decoration: none;
}

.site-name {
  font-weight: 700;
  font-size: 1.15rem;
  white-space: nowrap;
}

.tabs {
  display: flex;
  gap: 1rem;
  overflow-x: auto;
}

.tab {
  opacity: 0.75;
  white-space: nowrap;
}

.tab.active,
.tab:hover {
  opacity: 1;
}

.search-input {
  margin-left: auto;
  padding: 0.3rem 0.6rem;
  border: none;
  border-radius: var(--radius);
  min-width: 12rem;
}

.locale-switcher {
  display: flex;
  gap: 0.75rem;
  list-style: none;
  margin: 0;
  padding: 0;
}

.locale-switcher li.active a {
  font-weight: 700;
  text-decoration: underline;
}

/* Layout */
.layout {
  display: grid;
  grid-template-columns: var(--sidebar-width) 1fr;
  min-height: calc(100vh - 3rem);
}

.sidebar {
  padding: 1.5rem 1rem;
  border-right: 1px solid var(--border);
  background: var(--muted);
  position: sticky;
  top: 3rem;
  height: calc(100vh - 3rem);
  overflow-y: auto;
}

.nav-list {
  list-style: none;
  margin: 0;
  padding: 0;
}

.nav-list .nav-list {
  margin-left: 0.75rem;
}

.nav-item a,
.nav-section-title {
  display: block;
  padding: 0.25rem 0.5rem;
  border-radius: var(--radius);
  color: var(--muted-foreground);
  text-decoration: none;
}

.nav-section-title {
  font-weight: 600;
  color: var(--foreground);
}

.nav-item a:hover {
  color: var(--primary);
}

.nav-item.active > a {
  color: var(--primary);
  font-weight: 600;
}

.main {
  display: grid;
  grid-template-columns: minmax(0, 1fr) var(--toc-width);
  gap: 2rem;
  padding: 1.5rem 2rem;
  max-width: calc(var(--content-max-width) + var(--toc-width) + 4rem);
}

.doc {
  min-width: 0;
}

/* Content */
.content h1 {
  font-size: 2rem;
  margin: 0 0 1.25rem;
}

.content h2 {
  font-size: 1.5rem;
  margin: 2rem 0 1rem;
  padding-bottom: 0.3rem;
  border-bottom: 1px solid var(--border);
}

.content h3 {
  font-size: 1.25rem;
  margin: 1.5rem 0 0.75rem;
}

.content a {
  color: var(--primary);
}

.content img {
  max-width: 100%;
}

.content img.on-glb {
  cursor: zoom-in;
}

.headerlink {
  margin-left: 0.4rem;
  font-size: 0.8em;
  opacity: 0;
  text-decoration: none;
}

h1:hover .headerlink,
h2:hover .headerlink,
h3:hover .headerlink,
h4:hover .headerlink {
  opacity: 0.6;
}

.content blockquote {
  margin: 1rem 0;
  padding: 0.25rem 1rem;
  border-left: 4px solid var(--border);
  color: var(--muted-foreground);
}

.content table {
  border-collapse: collapse;
  margin-bottom: 1rem;
}

.content th,
.content td {
  border: 1px solid var(--border);
  padding: 0.4rem 0.75rem;
}

.content dt {
  font-weight: 600;
}

.content dd {
  margin: 0 0 0.75rem 1.5rem;
}

.content pre {
  position: relative;
  background: var(--code-background);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 0.75rem 1rem;
  overflow-x: auto;
  font-size: 0.875rem;
}

.content code {
  font-family: ui-monospace, SFMono-Regular, Menlo, monospace;
  font-size: 0.9em;
  background: var(--code-background);
  padding: 0.1rem 0.3rem;
  border-radius: var(--radius);
}

.content pre code {
  background: none;
  padding: 0;
}

.content iframe {
  max-width: 100%;
}

.copy-btn {
  position: absolute;
  top: 0.4rem;
  right: 0.4rem;
  padding: 0.15rem 0.6rem;
  font-size: 0.75rem;
  border: 1px solid var(--border);
  border-radius: var(--radius);
  background: var(--background);
  cursor: pointer;
}

.fallback-notice {
  padding: 0.5rem 1rem;
  background: var(--notice);
  border-radius: var(--radius);
}

/* Search */
.search-results {
  list-style: none;
  margin: 0 0 1.5rem;
  padding: 0;
  grid-column: 1 / -1;
}

.search-results li {
  padding: 0.4rem 0;
  border-bottom: 1px solid var(--border);
}

/* Table of contents */
.toc {
  position: sticky;
  top: 4.5rem;
  align-self: start;
  font-size: 0.875rem;
}

.toc h2 {
  font-size: 0.8rem;
  text-transform: uppercase;
  color: var(--muted-foreground);
}

.toc ul {
  list-style: none;
  padding: 0;
}

.toc a {
  color: var(--muted-foreground);
  text-decoration: none;
}

.toc a:hover {
  color: var(--primary);
}

.toc-level-3 {
  padding-left: 0.75rem;
}

.toc-level-4 {
  padding-left: 1.5rem;
}

/* Lightbox */
.lightbox {
  position: fixed;
  inset: 0;
  z-index: 100;
  display: flex;
  align-items: center;
  justify-content: center;
  background: rgba(0, 0, 0, 0.8);
  cursor: zoom-out;
}

.lightbox img {
  max-width: 92vw;
  max-height: 92vh;
}

.menu-btn {
  display: none;
  border: none;
  background: none;
  color: var(--primary-foreground);
  font-size: 1.25rem;
  cursor: pointer;
}

@media (max-width: 1024px) {
  .layout,
  .main {
    grid-template-columns: 1fr;
  }

  .sidebar {
    position: fixed;
    left: -100%;
    z-index: 30;
    width: var(--sidebar-width);
    transition: left 0.3s;
  }

  .sidebar.open {
    left: 0;
  }

  .toc,
  .tabs {
    display: none;
  }

  .menu-btn {
    display: block;
  }
}
"#;

const DEFAULT_JS: &str = r#"// pukidocs runtime
(function() {
  'use strict';

  const baseUrl = document.body.dataset.baseUrl || '/';

  // Mobile menu toggle
  const menuBtn = document.querySelector('.menu-btn');
  const sidebar = document.querySelector('.sidebar');
  if (menuBtn && sidebar) {
    menuBtn.addEventListener('click', () => sidebar.classList.toggle('open'));
  }

  // Lightbox for images marked .on-glb
  document.querySelectorAll('.content img.on-glb').forEach(img => {
    img.addEventListener('click', () => {
      const overlay = document.createElement('div');
      overlay.className = 'lightbox';
      const full = document.createElement('img');
      full.src = img.src;
      full.alt = img.alt;
      overlay.appendChild(full);
      overlay.addEventListener('click', () => overlay.remove());
      document.body.appendChild(overlay);
    });
  });

  document.addEventListener('keydown', event => {
    if (event.key === 'Escape') {
      document.querySelectorAll('.lightbox').forEach(el => el.remove());
    }
  });

  // Copy button for code blocks
  document.querySelectorAll('.content pre').forEach(pre => {
    if (pre.querySelector('.copy-btn')) return;

    const btn = document.createElement('button');
    btn.className = 'copy-btn';
    btn.textContent = 'Copy';
    btn.setAttribute('type', 'button');
    btn.addEventListener('click', async () => {
      const code = pre.querySelector('code');
      try {
        await navigator.clipboard.writeText((code || pre).textContent || '');
        btn.textContent = 'Copied!';
      } catch (err) {
        btn.textContent = 'Error';
      }
      setTimeout(() => { btn.textContent = 'Copy'; }, 2000);
    });
    pre.appendChild(btn);
  });

  // Search over search-index.json, limited to the page language
  const input = document.querySelector('.search-input');
  const results = document.querySelector('.search-results');
  if (!input || !results) return;

  const lang = document.documentElement.lang;
  let docs = null;

  const load = () => {
    if (docs) return Promise.resolve(docs);
    return fetch(baseUrl + 'search-index.json')
      .then(response => response.json())
      .then(index => {
        docs = index.docs.filter(doc => !doc.lang || doc.lang === lang);
        return docs;
      });
  };

  input.addEventListener('input', () => {
    const query = input.value.trim().toLowerCase();
    if (!query) {
      results.hidden = true;
      results.replaceChildren();
      return;
    }
    load().then(all => {
      const hits = all
        .filter(doc => doc.title.toLowerCase().includes(query) || doc.text.toLowerCase().includes(query))
        .slice(0, 20);
      results.replaceChildren(...hits.map(doc => {
        const li = document.createElement('li');
        const a = document.createElement('a');
        a.href = baseUrl + doc.location;
        a.textContent = doc.title;
        li.appendChild(a);
        return li;
      }));
      results.hidden = false;
    });
  });
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_css() {
        let css = AssetPipeline::generate_css();
        assert!(css.contains(":root"));
        assert!(css.contains(".headerlink"));
        assert!(css.contains(".lightbox"));
    }

    #[test]
    fn generates_js() {
        let js = AssetPipeline::generate_js();
        assert!(js.contains("search-index.json"));
        assert!(js.contains("img.on-glb"));
    }

    #[test]
    fn minifies_css() {
        let css = r#"
.locale-switcher {
    display: flex;
    gap: 10px;
}
        "#;

        let minified = AssetPipeline::minify_css(css).unwrap();

        assert!(!minified.contains('\n'));
        assert!(minified.contains(".locale-switcher"));
    }

    #[test]
    fn minifies_theme_css() {
        let css = AssetPipeline::generate_css();
        let minified = AssetPipeline::minify_css(&css).unwrap();
        assert!(minified.len() < css.len());
    }
}
