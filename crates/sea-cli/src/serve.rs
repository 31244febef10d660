//! # serve
//!
//! Bootstraps the service and serves it on the definition's transport
//! address until interrupted.

use std::path::PathBuf;

use clap::Args;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to the service definition (YAML or JSON).
    pub definition: PathBuf,
}

pub fn run_serve(args: &ServeArgs) -> anyhow::Result<u8> {
    let service = crate::load_service(&args.definition)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(service.serve())?;
    Ok(0)
}
