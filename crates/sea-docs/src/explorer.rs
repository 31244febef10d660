//! # API Explorer
//!
//! The explorer lives under one root path (default `/swagger-ui`):
//!
//! | Request                    | Served                                 |
//! |----------------------------|----------------------------------------|
//! | `<root>` or `<root>/`      | the HTML shell, `index.html`           |
//! | `<root>/document.json`     | the rendered document                  |
//! | `<root>/<asset>`           | a file from the public directory       |
//!
//! This module only decides which of the three a path maps to. Serving is
//! left to the HTTP layer.

use std::fs;
use std::path::PathBuf;

use crate::error::DocumentError;

/// The file name of the rendered document under the explorer root.
pub const DOCUMENT_FILE: &str = "document.json";
const SHELL_FILE: &str = "index.html";
const SWAGGER_UI_CDN: &str = "https://unpkg.com/swagger-ui-dist@5";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorerRoute {
    Shell,
    Document,
    Asset(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerConfig {
    root: String,
    public_dir: PathBuf,
    base_url: String,
}

impl ExplorerConfig {
    pub fn new(root: &str, public_dir: impl Into<PathBuf>, base_url: &str) -> Self {
        let trimmed = root.trim_end_matches('/');
        let root = if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };
        Self {
            root,
            public_dir: public_dir.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Absolute URL of the rendered document, as embedded in the shell.
    pub fn document_url(&self) -> String {
        format!("{}{}/{DOCUMENT_FILE}", self.base_url, self.root)
    }

    /// Location of the HTML shell on disk.
    pub fn shell_path(&self) -> PathBuf {
        self.public_dir.join(SHELL_FILE)
    }

    /// Map a request path to what the explorer serves, if anything.
    ///
    /// Asset paths with `..`, `.`, empty or backslash-carrying segments are
    /// not served.
    pub fn route(&self, request_path: &str) -> Option<ExplorerRoute> {
        let rest = request_path.strip_prefix(self.root.as_str())?;
        if rest.is_empty() || rest == "/" {
            return Some(ExplorerRoute::Shell);
        }
        let rest = rest.strip_prefix('/')?;
        if rest == DOCUMENT_FILE {
            return Some(ExplorerRoute::Document);
        }
        let safe = rest
            .split('/')
            .all(|s| !s.is_empty() && s != "." && s != ".." && !s.contains('\\'));
        if !safe {
            return None;
        }
        Some(ExplorerRoute::Asset(self.public_dir.join(rest)))
    }

    /// The HTML shell: loads Swagger UI and points it at
    /// [`document_url`](Self::document_url).
    pub fn shell_html(&self, title: &str) -> String {
        format!(
            r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>{title}</title>
  <link rel="stylesheet" href="{cdn}/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="{cdn}/swagger-ui-bundle.js" crossorigin></script>
  <script>
    window.onload = () => {{
      window.ui = SwaggerUIBundle({{ url: "{url}", dom_id: "#swagger-ui" }});
    }};
  </script>
</body>
</html>
"##,
            title = escape_html(title),
            cdn = SWAGGER_UI_CDN,
            url = self.document_url(),
        )
    }

    /// Create the public directory and write the shell into it. Existing
    /// assets are left in place.
    pub fn deploy_public_assets(&self, title: &str) -> Result<PathBuf, DocumentError> {
        fs::create_dir_all(&self.public_dir)?;
        let shell = self.shell_path();
        fs::write(&shell, self.shell_html(title))?;
        tracing::info!(path = %shell.display(), "deployed explorer shell");
        Ok(shell)
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
