//! # Service Bootstrap
//!
//! Assembles a [`Service`] from a definition and the layers contributed in
//! code and on disk.
//!
//! ## Bootstrap Sequence
//!
//! 1. **Schemas**: application keywords, then the document, route and
//!    service schemas, then application schemas.
//! 2. **Definition**: validate the raw definition and type it.
//! 3. **Document**: create the document model and deploy the explorer
//!    shell to `<appDir>/public/docs`.
//! 4. **Layer documents**: models, tags and servers of the core layer,
//!    the application layer and each declared product, in that order.
//! 5. **Layer routes**: the same order. Product routes are namespaced
//!    under `/<product>`.
//! 6. **Before-boot hooks**, then the document paths are synchronised
//!    with the registry.
//! 7. **Router**: bind the registry, mount the explorer, the not-found
//!    fallback, transport middleware and panic containment.
//! 8. **Boot hooks**.
//!
//! Any failure aborts the bootstrap; nothing is retried or skipped.

use std::path::Path;
use std::sync::Arc;

use axum::{Extension, Router};
use serde_json::Value;
use tower_http::catch_panic::CatchPanicLayer;

use sea_core::path;
use sea_docs::{DocumentDefinition, DocumentModel};
use sea_routes::{GuardFactory, Layer, RouteRegistry};
use sea_schema::{Catalog, FailureMode, KeywordDefinition, SchemaEngine, ValidationFailure};

use crate::core_layer::{self, ServiceInfo};
use crate::definition::{apply_env_overrides, ServiceDefinition};
use crate::error::{self, BootstrapError};
use crate::explorer;
use crate::layer::{load_optional_document, LayerContribution};
use crate::schemas::{self, SERVICE};
use crate::transport::{apply_stack, Stage, TransportMiddleware};

/// Mutable view handed to before-boot hooks, after every layer has been
/// registered and before the router is bound.
pub struct BootContext<'a> {
    pub definition: &'a ServiceDefinition,
    pub engine: &'a mut SchemaEngine,
    pub document: &'a mut DocumentModel,
    pub registry: &'a mut RouteRegistry,
}

type BeforeBootHook = Box<dyn FnOnce(&mut BootContext<'_>) -> Result<(), BootstrapError> + Send>;
type BootHook = Box<dyn FnOnce(&Service) -> Result<(), BootstrapError> + Send>;

pub struct ServiceBuilder {
    definition: Value,
    keywords: Vec<(String, KeywordDefinition)>,
    schemas: Vec<(String, Value)>,
    app: LayerContribution,
    products: Vec<(String, LayerContribution)>,
    before: Vec<TransportMiddleware>,
    after: Vec<TransportMiddleware>,
    on_before_boot: Vec<BeforeBootHook>,
    on_boot: Vec<BootHook>,
}

impl ServiceBuilder {
    /// Start from a raw definition. It is validated by [`build`](Self::build).
    pub fn new(definition: Value) -> Self {
        Self {
            definition,
            keywords: Vec::new(),
            schemas: Vec::new(),
            app: LayerContribution::default(),
            products: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
            on_before_boot: Vec::new(),
            on_boot: Vec::new(),
        }
    }

    /// Read a definition file and apply the `HOST`, `PORT` and `PRODUCTS`
    /// environment overrides.
    pub fn from_file(path: &Path) -> Result<Self, BootstrapError> {
        let mut definition = ServiceDefinition::read(path)?;
        apply_env_overrides(&mut definition, |var| std::env::var(var).ok());
        Ok(Self::new(definition))
    }

    pub fn app_layer(mut self, contribution: LayerContribution) -> Self {
        self.app.routes.extend(contribution.routes);
        self.app.document.extend(contribution.document);
        self
    }

    pub fn product_layer(
        mut self,
        product: impl Into<String>,
        contribution: LayerContribution,
    ) -> Self {
        self.products.push((product.into(), contribution));
        self
    }

    /// Register a custom keyword before any schema is compiled.
    pub fn keyword(mut self, name: impl Into<String>, definition: KeywordDefinition) -> Self {
        self.keywords.push((name.into(), definition));
        self
    }

    pub fn schema(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.schemas.push((name.into(), schema));
        self
    }

    /// Transport middleware run after the definition's `before` list.
    pub fn before(mut self, middleware: TransportMiddleware) -> Self {
        self.before.push(middleware);
        self
    }

    /// Transport middleware run after the definition's `after` list.
    pub fn after(mut self, middleware: TransportMiddleware) -> Self {
        self.after.push(middleware);
        self
    }

    pub fn on_before_boot<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&mut BootContext<'_>) -> Result<(), BootstrapError> + Send + 'static,
    {
        self.on_before_boot.push(Box::new(hook));
        self
    }

    pub fn on_boot<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&Service) -> Result<(), BootstrapError> + Send + 'static,
    {
        self.on_boot.push(Box::new(hook));
        self
    }

    pub fn build(self) -> Result<Service, BootstrapError> {
        let Self {
            definition,
            keywords,
            schemas: app_schemas,
            app,
            products,
            before,
            after,
            on_before_boot,
            on_boot,
        } = self;

        // 1. Schemas
        let mut engine = SchemaEngine::new(FailureMode::Throw);
        for (name, keyword) in keywords {
            engine.add_keyword(&name, keyword)?;
        }
        DocumentModel::register(&mut engine)?;
        sea_routes::schema::register_schema(&mut engine)?;
        engine.add_schema(schemas::service(), SERVICE)?;
        for (name, schema) in app_schemas {
            engine.add_schema(schema, &name)?;
        }

        // 2. Definition
        let definition = ServiceDefinition::from_value(&engine, definition)?;
        tracing::info!(
            service = %definition.name,
            products = ?definition.products,
            "bootstrapping service"
        );
        if let Some((unknown, _)) = products
            .iter()
            .find(|(p, _)| !definition.products.contains(p))
        {
            return Err(BootstrapError::UnknownProduct(unknown.clone()));
        }

        // 3. Document
        let meta = definition.document.clone().unwrap_or_default();
        let mut document_definition = DocumentDefinition::new(
            definition.base_url(),
            definition.app_dir.join("public").join("docs"),
        );
        document_definition.title = meta.title.clone();
        document_definition.description = meta.description.clone();
        document_definition.version = meta.version.clone();
        let mut document = DocumentModel::new(&engine, document_definition)?;
        document.explorer().deploy_public_assets(document.title())?;

        // 4. Layer documents
        let mut layers = vec![(Layer::Core, core_layer::contribution())];
        layers.push((Layer::App, with_file_document(&definition.app_dir, app)?));
        let mut products = products;
        for product in &definition.products {
            let mut contribution = LayerContribution::default();
            for (_, c) in products.iter_mut().filter(|(p, _)| p == product) {
                contribution.routes.append(&mut c.routes);
                contribution.document.extend(std::mem::take(&mut c.document));
            }
            let dir = definition.app_dir.join("products").join(product);
            layers.push((
                Layer::Product(product.clone()),
                with_file_document(&dir, contribution)?,
            ));
        }

        let mut layer_routes = Vec::with_capacity(layers.len());
        for (layer, contribution) in layers {
            if contribution.document.is_empty() {
                tracing::debug!(layer = %layer, "layer has no document literals");
            } else {
                tracing::info!(layer = %layer, "loading layer document");
                contribution.document.apply(&mut engine, &mut document)?;
            }
            layer_routes.push((layer, contribution.routes));
        }

        // 5. Layer routes
        let mut registry = RouteRegistry::new();
        for (layer, routes) in layer_routes {
            tracing::info!(layer = %layer, routes = routes.len(), "loading layer routes");
            registry.register_layer(&engine, &document, &layer, routes)?;
        }

        // 6. Before-boot hooks, then paths
        {
            let mut context = BootContext {
                definition: &definition,
                engine: &mut engine,
                document: &mut document,
                registry: &mut registry,
            };
            for hook in on_before_boot {
                hook(&mut context)?;
            }
        }
        check_explorer_shadowing(&document, &registry)?;
        document.sync_paths(&engine, &registry.project_to_paths())?;

        // 7. Router
        let engine = Arc::new(engine);
        let document = Arc::new(document);
        let info = ServiceInfo::new(
            definition.name.clone(),
            meta.version
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
        );

        let catalog: Arc<dyn Catalog> = document.clone();
        let guards = GuardFactory::new(Arc::clone(&engine), catalog);
        let mut router = registry.bind(&guards)?;

        let (mut before_stack, mut after_stack) = match &definition.transport {
            Some(t) => (
                t.middleware.before.iter().cloned().map(TransportMiddleware::from).collect(),
                t.middleware.after.iter().cloned().map(TransportMiddleware::from).collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };
        before_stack.extend(before);
        after_stack.extend(after);

        router = apply_stack(router, Stage::After, &after_stack)?;
        router = router
            .merge(explorer::router(Arc::clone(&document)))
            .fallback(error::not_found)
            .layer(Extension(info.clone()));
        router = apply_stack(router, Stage::Before, &before_stack)?;
        router = router.layer(CatchPanicLayer::custom(error::handle_panic));

        let service = Service {
            definition,
            engine,
            document,
            registry,
            router,
            info,
        };

        // 8. Boot hooks
        for hook in on_boot {
            hook(&service)?;
        }
        tracing::info!(
            service = %service.definition.name,
            routes = service.registry.len(),
            explorer = %service.document.explorer().root(),
            "service assembled"
        );
        Ok(service)
    }
}

impl std::fmt::Debug for ServiceBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceBuilder")
            .field("definition", &self.definition)
            .field("app_routes", &self.app.routes.len())
            .field("products", &self.products.iter().map(|(p, _)| p).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn with_file_document(
    dir: &Path,
    mut contribution: LayerContribution,
) -> Result<LayerContribution, BootstrapError> {
    if let Some(mut literals) = load_optional_document(dir)? {
        literals.extend(std::mem::take(&mut contribution.document));
        contribution.document = literals;
    }
    Ok(contribution)
}

fn check_explorer_shadowing(
    document: &DocumentModel,
    registry: &RouteRegistry,
) -> Result<(), BootstrapError> {
    let root = document.explorer().root();
    let nested = format!("{root}/");
    for route in registry.routes() {
        let template = path::normalize(&route.path);
        if template == root || template.starts_with(&nested) {
            return Err(BootstrapError::ExplorerShadowed(template));
        }
    }
    Ok(())
}

/// An assembled service: the frozen engine and document, the route
/// registry, and the router serving them.
pub struct Service {
    definition: ServiceDefinition,
    engine: Arc<SchemaEngine>,
    document: Arc<DocumentModel>,
    registry: RouteRegistry,
    router: Router,
    info: ServiceInfo,
}

impl Service {
    pub fn definition(&self) -> &ServiceDefinition {
        &self.definition
    }

    pub fn engine(&self) -> &SchemaEngine {
        &self.engine
    }

    pub fn document(&self) -> &DocumentModel {
        &self.document
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    pub fn info(&self) -> &ServiceInfo {
        &self.info
    }

    /// The request router. Cheap to clone.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Validate (and normalize) `data` against the documented model `name`.
    pub fn validate_model(&self, name: &str, data: &mut Value) -> Result<bool, ValidationFailure> {
        self.engine
            .validate_against_document(name, data, self.document.as_ref())
    }

    /// Bind the transport address and serve until interrupted.
    pub async fn serve(self) -> Result<(), BootstrapError> {
        let Some(transport) = self.definition.transport.clone() else {
            return Err(BootstrapError::NoTransport(self.definition.name.clone()));
        };
        let listener =
            tokio::net::TcpListener::bind((transport.host.as_str(), transport.port)).await?;
        tracing::info!(
            service = %self.definition.name,
            address = %listener.local_addr()?,
            "listening"
        );
        let explorer = format!(
            "{}{}",
            self.definition.base_url(),
            self.document.explorer().root()
        );
        tracing::info!(explorer = %explorer, "api explorer");
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        tracing::info!(service = %self.definition.name, "shut down");
        Ok(())
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("definition", &self.definition)
            .field("routes", &self.registry.len())
            .finish_non_exhaustive()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
