//! Template engine for rendering documentation pages.

use minijinja::{context, Environment};

use crate::markdown::TocEntry;
use crate::navigation::NavItem;

/// An entry of the locale switcher.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Alternate {
    /// Display name, e.g. `日本語`
    pub name: String,
    pub link: String,
    pub lang: String,
    /// Whether this is the locale being rendered
    pub active: bool,
}

/// Context for rendering a page template.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Context {
    /// Page title
    pub title: String,
    /// Site name, localized when the locale sets one
    pub site_name: String,
    pub site_description: Option<String>,
    /// Locale code for `<html lang>`
    pub lang: String,
    /// Rendered content HTML
    pub content: String,
    /// Navigation items
    pub nav: Vec<NavItem>,
    /// Table of contents
    pub toc: Vec<TocEntry>,
    /// Base URL of the site, ends with `/`
    pub base_url: String,
    /// Home URL of the current locale
    pub home_url: String,
    /// Locale switcher entries
    pub alternates: Vec<Alternate>,
    /// Theme feature toggles
    pub features: Vec<String>,
    /// The `extra` section of the site configuration
    pub extra: serde_yaml::Mapping,
    /// Rendered from the default locale because the locale lacks the page
    pub fallback: bool,
    /// Live reload client script, set by the dev server
    pub live_reload: Option<String>,
}

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with default templates.
    pub fn new() -> Self {
        let mut env = Environment::new();

        env.add_template_owned("base.html".to_string(), BASE_TEMPLATE.to_string())
            .expect("Failed to add base template");
        env.add_template_owned("page.html".to_string(), PAGE_TEMPLATE.to_string())
            .expect("Failed to add page template");
        env.add_template_owned("nav.html".to_string(), NAV_TEMPLATE.to_string())
            .expect("Failed to add nav template");

        Self { env }
    }

    /// Render a page using the specified template.
    pub fn render_page(
        &self,
        template: &str,
        context: &Context,
    ) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template(template)?;

        tmpl.render(context! {
            title => &context.title,
            site_name => &context.site_name,
            site_description => &context.site_description,
            lang => &context.lang,
            content => &context.content,
            nav => &context.nav,
            toc => &context.toc,
            base_url => &context.base_url,
            home_url => &context.home_url,
            alternates => &context.alternates,
            features => &context.features,
            extra => &context.extra,
            fallback => context.fallback,
            live_reload => &context.live_reload,
        })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

const BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="{{ lang }}">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  {% if site_description %}<meta name="description" content="{{ site_description }}">
  {% endif %}<title>{% if title != site_name %}{{ title }} - {% endif %}{{ site_name }}</title>
  <link rel="stylesheet" href="{{ base_url }}assets/main.css">
</head>
<body data-base-url="{{ base_url }}">
  <header class="header">
    <button class="menu-btn" type="button" aria-label="Menu">&#9776;</button>
    <a href="{{ home_url }}" class="site-name">{{ site_name }}</a>
    {% if "navigation.tabs" in features %}
    <nav class="tabs">
      {% for item in nav %}
      {% if item.url %}<a href="{{ item.url }}" class="tab{% if item.active %} active{% endif %}">{{ item.title }}</a>
      {% elif item.children and item.children[0].url %}<a href="{{ item.children[0].url }}" class="tab{% if item.active %} active{% endif %}">{{ item.title }}</a>{% endif %}
      {% endfor %}
    </nav>
    {% endif %}
    <input class="search-input" type="search" placeholder="Search" aria-label="Search">
    {% if alternates | length > 1 %}
    <ul class="locale-switcher">
      {% for alt in alternates %}
      <li{% if alt.active %} class="active"{% endif %}><a href="{{ alt.link }}" hreflang="{{ alt.lang }}" lang="{{ alt.lang }}">{{ alt.name }}</a></li>
      {% endfor %}
    </ul>
    {% endif %}
  </header>
  <div class="layout">
    <nav class="sidebar">
      {% include "nav.html" %}
    </nav>
    <main class="main">
      <ul class="search-results" hidden></ul>
      {% block content %}{% endblock %}
    </main>
  </div>
  <script src="{{ base_url }}assets/main.js"></script>
  {% if live_reload %}<script src="{{ live_reload }}"></script>{% endif %}
</body>
</html>"##;

const PAGE_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<article class="doc">
  {% if fallback %}
  <p class="fallback-notice">This page has not been translated yet.</p>
  {% endif %}
  <div class="content">
    {{ content | safe }}
  </div>
</article>

{% if toc %}
<aside class="toc">
  <h2>{% if lang == "ja" %}目次{% else %}On this page{% endif %}</h2>
  <ul>
  {% for entry in toc %}
    <li class="toc-level-{{ entry.level }}">
      <a href="#{{ entry.id }}">{{ entry.title }}</a>
    </li>
  {% endfor %}
  </ul>
</aside>
{% endif %}
{% endblock %}"##;

const NAV_TEMPLATE: &str = r##"<ul class="nav-list">
{% for item in nav recursive %}
  <li class="nav-item{% if item.active %} active{% endif %}{% if item.children %} nav-section{% endif %}">
    {% if item.url %}<a href="{{ item.url }}"{% if item.external %} rel="noopener" target="_blank"{% endif %}>{{ item.title }}</a>
    {% else %}<span class="nav-section-title">{{ item.title }}</span>{% endif %}
    {% if item.children %}<ul class="nav-list">{{ loop(item.children) }}</ul>{% endif %}
  </li>
{% endfor %}
</ul>"##;
