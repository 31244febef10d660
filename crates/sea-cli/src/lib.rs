//! # sea-cli
//!
//! Subcommand handlers for the `sea` binary. Each handler takes its parsed
//! arguments and returns the process exit code.
//!
//! Services started from the command line carry the core layer and the
//! layers declared on disk (`document.*` files). Routes contributed in code
//! need a binary of their own built on [`sea_api::ServiceBuilder`].

pub mod document;
pub mod serve;
pub mod validate;

use std::path::Path;

use anyhow::Context;
use sea_api::{Service, ServiceBuilder};

/// Build the service declared by the definition file at `path`.
pub fn load_service(path: &Path) -> anyhow::Result<Service> {
    let builder = ServiceBuilder::from_file(path)
        .with_context(|| format!("loading definition {}", path.display()))?;
    builder
        .build()
        .with_context(|| format!("bootstrapping service from {}", path.display()))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::fs;
    use std::path::PathBuf;

    use tempfile::TempDir;

    /// A definition file next to an application directory holding one
    /// documented model.
    pub fn definition_file() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        fs::create_dir_all(&app).unwrap();
        fs::write(
            app.join("document.yaml"),
            "models:\n  - name: OkResponse\n    properties:\n      ok:\n        type: boolean\n",
        )
        .unwrap();
        let file = dir.path().join("service.yaml");
        fs::write(
            &file,
            "name: widgets\nappDir: app\nproducts: [shop]\ntransport:\n  host: localhost\n  port: 4100\n",
        )
        .unwrap();
        (dir, file)
    }
}
