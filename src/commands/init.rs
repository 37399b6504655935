//! Initialize a new blog site

use anyhow::{bail, Result};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

use crate::Blog;

const CONFIG: &str = r#"# spacetraveling configuration

# Site
title: spacetraveling
description: ''
author: ''
language: en
timezone: ''

# URL
url: http://localhost:3000

# Directory
public_dir: public
static_dir: static

# Date / Time format
date_format: DD MMM YYYY
time_format: HH:mm

# Seconds a generated page stays fresh
revalidate: 86400

listing:
  page_size: 2

detail:
  # Pre-render only the newest N posts; leave empty to pre-render all
  prerender_limit:

api:
  # endpoint: https://<repository>.cdn.prismic.io/api/v2
  # access_token is read from PRISMIC_ACCESS_TOKEN when set
  document_type: post
  # Local content used instead of the remote API
  fixture: content.json
"#;

const STYLESHEET: &str = r#"* {
  margin: 0;
  padding: 0;
  box-sizing: border-box;
}

body {
  background: #1a1d23;
  color: #d7d7d7;
  font-family: 'Inter', sans-serif;
  line-height: 1.6;
}

a {
  color: inherit;
  text-decoration: none;
}

.container {
  max-width: 720px;
  margin: 0 auto;
  padding: 0 1rem;
}

header {
  padding: 4rem 0 3rem;
}

.home .post {
  display: block;
  margin-bottom: 3rem;
}

.post h1 {
  color: #f8f8f8;
}

.logo {
  margin: 4rem 0 3rem;
}

.info {
  display: flex;
  gap: 1.5rem;
  font-size: 0.875rem;
  color: #bbbbbb;
  margin-top: 0.5rem;
}

.edited {
  font-style: italic;
  font-size: 0.875rem;
  margin-top: 0.5rem;
}

.banner {
  width: 100%;
  max-height: 400px;
  object-fit: cover;
}

.post section {
  margin-top: 4rem;
}

.post section h2 {
  margin-bottom: 2rem;
}

.post section p {
  margin-bottom: 1rem;
}

.load-more {
  background: none;
  border: none;
  color: #ff57b2;
  font-weight: 600;
  cursor: pointer;
}

.navigation {
  display: flex;
  justify-content: space-between;
  border-top: 1px solid #383c46;
  margin: 4rem 0;
  padding-top: 3rem;
}

.navigation .next {
  text-align: right;
  margin-left: auto;
}

.navigation span {
  color: #ff57b2;
}

.preview-banner {
  background: #ff57b2;
  color: #1a1d23;
  text-align: center;
  padding: 0.5rem;
}
"#;

const LOGO: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="239" height="27" viewBox="0 0 239 27">
  <text x="0" y="22" fill="#f8f8f8" font-family="Inter, sans-serif" font-size="24" font-weight="700">spacetraveling<tspan fill="#ff57b2">.</tspan></text>
</svg>
"##;

fn paragraph(text: &str) -> Value {
    json!({ "type": "paragraph", "text": text, "spans": [] })
}

fn sample_post(id: &str, uid: &str, first: &str, last: &str, title: &str, subtitle: &str) -> Value {
    json!({
        "id": id,
        "uid": uid,
        "type": "post",
        "first_publication_date": first,
        "last_publication_date": last,
        "data": {
            "title": title,
            "subtitle": subtitle,
            "author": "Joseph Oliveira",
            "banner": { "url": "/images/logo.svg", "alt": title },
            "content": [
                {
                    "heading": "Getting started",
                    "body": [
                        paragraph("This post was written against the local content fixture. Point the api section of _config.yml at a repository endpoint to read real content."),
                        {
                            "type": "paragraph",
                            "text": "Rich text keeps its emphasis and links.",
                            "spans": [
                                { "start": 20, "end": 28, "type": "strong" },
                                { "start": 33, "end": 38, "type": "hyperlink", "data": { "url": "https://prismic.io" } }
                            ]
                        }
                    ]
                },
                {
                    "heading": "Next steps",
                    "body": [
                        { "type": "list-item", "text": "Edit content.json", "spans": [] },
                        { "type": "list-item", "text": "Run the server", "spans": [] },
                        { "type": "list-item", "text": "Export the site", "spans": [] }
                    ]
                }
            ]
        }
    })
}

/// Sample content served until a remote repository is configured
fn sample_content() -> Value {
    json!({
        "documents": [
            sample_post(
                "YC0EuBAAACQAxq3r",
                "como-utilizar-hooks",
                "2021-03-15T19:25:28+0000",
                "2021-03-25T19:27:35+0000",
                "Como utilizar Hooks",
                "Pensando em sincronização em vez de ciclos de vida",
            ),
            sample_post(
                "YC0FGBAAACAAxq7J",
                "criando-um-app-cra-do-zero",
                "2021-03-12T14:10:00+0000",
                "2021-03-12T14:10:00+0000",
                "Criando um app CRA do zero",
                "Tudo sobre como criar a sua primeira aplicação utilizando Create React App",
            ),
            sample_post(
                "YC0FUhAAACQAxq_H",
                "hello-world",
                "2021-03-10T09:00:00+0000",
                "2021-03-10T09:00:00+0000",
                "Hello world",
                "The first post of the blog",
            ),
        ],
        "refs": {}
    })
}

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        bail!("{:?} already contains a site", target_dir);
    }

    fs::create_dir_all(target_dir.join("static/css"))?;
    fs::create_dir_all(target_dir.join("static/images"))?;

    fs::write(&config_path, CONFIG)?;
    fs::write(
        target_dir.join("content.json"),
        serde_json::to_string_pretty(&sample_content())?,
    )?;
    fs::write(target_dir.join("static/css/style.css"), STYLESHEET)?;
    fs::write(target_dir.join("static/images/logo.svg"), LOGO)?;

    Ok(())
}

/// Run the init command with an existing Blog instance
pub fn run(blog: &Blog) -> Result<()> {
    init_site(&blog.base_dir)
}
