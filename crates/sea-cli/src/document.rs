//! # document
//!
//! Renders the OpenAPI document of a service, to stdout or a file.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

#[derive(Args, Debug)]
pub struct DocumentArgs {
    /// Path to the service definition (YAML or JSON).
    pub definition: PathBuf,

    /// Write the document here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

pub fn run_document(args: &DocumentArgs) -> anyhow::Result<u8> {
    let service = crate::load_service(&args.definition)?;
    let rendered = serde_json::to_string_pretty(&service.document().render())?;
    match &args.output {
        Some(path) => {
            fs::write(path, format!("{rendered}\n"))
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), "document written");
        }
        None => println!("{rendered}"),
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::definition_file;
    use serde_json::Value;

    #[test]
    fn writes_rendered_document_to_output() {
        let (dir, file) = definition_file();
        let output = dir.path().join("openapi.json");
        let code = run_document(&DocumentArgs {
            definition: file,
            output: Some(output.clone()),
        })
        .unwrap();
        assert_eq!(code, 0);

        let written: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written["openapi"], "3.0.1");
        assert!(written["paths"]["/version"]["get"].is_object());
        assert!(written["components"]["schemas"]["OkResponse"].is_object());
    }
}
