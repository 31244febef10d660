//! # validate
//!
//! Bootstraps the service without binding a listener. Any definition,
//! document or route failure is reported and the exit code is 1.

use std::path::PathBuf;

use clap::Args;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the service definition (YAML or JSON).
    pub definition: PathBuf,
}

pub fn run_validate(args: &ValidateArgs) -> anyhow::Result<u8> {
    let service = crate::load_service(&args.definition)?;
    let definition = service.definition();
    tracing::info!(
        service = %definition.name,
        routes = service.registry().len(),
        models = service.document().models().len(),
        "definition is valid"
    );
    println!(
        "OK  {} ({} routes, {} models)",
        definition.name,
        service.registry().len(),
        service.document().models().len()
    );
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::definition_file;

    #[test]
    fn valid_definition_exits_zero() {
        let (_dir, file) = definition_file();
        let code = run_validate(&ValidateArgs { definition: file }).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn missing_definition_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_validate(&ValidateArgs {
            definition: dir.path().join("absent.yaml"),
        })
        .unwrap_err();
        assert!(format!("{err:#}").contains("absent.yaml"));
    }

    #[test]
    fn schema_violation_is_an_error() {
        let (dir, file) = definition_file();
        std::fs::write(&file, "name: ab\nappDir: app\nproducts: [shop]\n").unwrap();
        assert!(run_validate(&ValidateArgs { definition: file }).is_err());
        drop(dir);
    }
}
