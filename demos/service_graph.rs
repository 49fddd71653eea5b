//! Wires a small service graph, prints its validation report and DOT export,
//! then tears it down. Run with `RUST_LOG=ferrous_registry=trace` to see
//! every bind, build and release.

use ferrous_registry::{Construct, Dep, MetricsObserver, Policy, Registry, RegistryConfig, Resolver};
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

struct AppConfig {
    database_url: String,
}

struct Database {
    url: String,
}

impl Construct<(AppConfig,)> for Database {
    fn construct((config,): (Dep<AppConfig>,)) -> Self {
        let url = config
            .map(|c| c.database_url.clone())
            .unwrap_or_else(|| "sqlite::memory:".to_string());
        tracing::info!(%url, "database connected");
        Database { url }
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        tracing::info!(url = %self.url, "database closed");
    }
}

struct RequestContext {
    id: u32,
}

struct UserService {
    db: Dep<Database>,
    request: Dep<RequestContext>,
}

impl Construct<(Database, RequestContext)> for UserService {
    fn construct((db, request): (Dep<Database>, Dep<RequestContext>)) -> Self {
        UserService { db, request }
    }
}

impl UserService {
    fn describe(&self) -> String {
        format!(
            "request {} on {}",
            self.request.as_ref().map_or(0, |r| r.id),
            self.db.as_ref().map_or("<no database>", |d| d.url.as_str())
        )
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Rc::new(AppConfig {
        database_url: "postgres://localhost/app".to_string(),
    });
    let metrics = Rc::new(MetricsObserver::new());

    {
        let mut registry = Registry::with_config(RegistryConfig::from_env()?);
        registry.add_observer(metrics.clone());

        registry.register_supplied(&config);
        registry.register::<Database, (AppConfig,)>(Policy::Exclusive);
        let next_id = std::cell::Cell::new(0);
        registry.register_factory::<RequestContext, _>(Policy::PerRequest, move |_| {
            next_id.set(next_id.get() + 1);
            RequestContext { id: next_id.get() }
        });
        registry.register::<UserService, (Database, RequestContext)>(Policy::PerRequest);
        registry.seal();

        let report = registry.validate();
        println!("valid: {}", report.is_valid());
        for warning in &report.warnings {
            println!("warning: {}", warning);
        }

        for _ in 0..3 {
            let users = registry.retrieve_required::<UserService>();
            println!("{}", users.describe());
        }

        println!("{}", registry.dependency_graph().to_dot());
        println!("tracked instances: {}", registry.instance_count());
    }

    println!(
        "builds={} reuses={} releases={}",
        metrics.build_count(),
        metrics.reuse_count(),
        metrics.release_count()
    );
    println!("config still owned by main: {}", Rc::strong_count(&config) == 1);
    Ok(())
}
