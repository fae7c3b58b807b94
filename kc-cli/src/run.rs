use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;

use kc_core::config::HarnessConfig;
use kc_core::discovery::{
    Case,
    discover_cases,
};
use kc_core::errors::*;
use kc_core::k8s::{
    GVK,
    KubeClusterClient,
};
use kc_core::lifecycle::wait_until_present;
use kc_core::manifest::Manifest;
use kc_core::prelude::*;
use kc_core::runner::run_case;
use kube::discovery::ApiResource;
use tokio_util::sync::CancellationToken;
use tracing::*;

#[derive(clap::Args, Debug, Default)]
pub struct Args {
    #[arg(short, long, long_help = "harness config file (YAML)")]
    pub config: Option<PathBuf>,

    #[arg(long, long_help = "directory containing one subdirectory per test case (overrides config)")]
    pub cases_dir: Option<PathBuf>,

    #[arg(long, long_help = "prefix for the per-case test namespaces (overrides config)")]
    pub namespace_prefix: Option<String>,

    #[arg(
        long = "case",
        long_help = "only run the named case; may be given more than once",
        value_name = "NAME"
    )]
    pub cases: Vec<String>,
}

impl Args {
    pub(crate) fn load_config(&self) -> anyhow::Result<HarnessConfig> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::load(path)?,
            None => HarnessConfig::default(),
        };

        if let Some(cases_dir) = &self.cases_dir {
            config.cases_dir.clone_from(cases_dir);
        }
        if let Some(prefix) = &self.namespace_prefix {
            config.namespace_prefix.clone_from(prefix);
        }
        Ok(config)
    }
}

pub async fn cmd(args: &Args, client: kube::Client) -> EmptyResult {
    let config = args.load_config()?;
    let cases = select_cases(discover_cases(&config.cases_dir)?, &args.cases)?;
    let cluster: Arc<dyn ClusterClient> = Arc::new(KubeClusterClient::new(client, &config.field_manager));

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, cancelling outstanding waits");
                cancel.cancel();
            }
        }
    });

    for case in &cases {
        run_in_namespace(cluster.clone(), &config, case, cancel.clone()).await?;
    }
    println!("{} case(s) passed", cases.len());
    Ok(())
}

pub(crate) fn select_cases(cases: Vec<Case>, names: &[String]) -> anyhow::Result<Vec<Case>> {
    if names.is_empty() {
        return Ok(cases);
    }

    for name in names {
        ensure!(cases.iter().any(|c| &c.name == name), "no test case named {name}");
    }
    Ok(cases.into_iter().filter(|c| names.contains(&c.name)).collect())
}

// Each case gets a fresh namespace, which is created before the case runs and deleted afterwards
// regardless of the outcome
pub(crate) async fn run_in_namespace(
    cluster: Arc<dyn ClusterClient>,
    config: &HarnessConfig,
    case: &Case,
    cancel: CancellationToken,
) -> EmptyResult {
    let ns_name = config.namespace_for(&case.name);
    let ns_manifest = namespace_manifest(&ns_name, &config.field_manager);
    let ctx = HarnessContext::new(cluster.clone(), &ns_name)
        .with_poll(config.poll)
        .with_transformers(config.transformers())
        .with_cancel(cancel);

    cluster.apply(&ns_manifest).await?;
    let res = match wait_for_namespace(&ctx, &ns_manifest).await {
        Ok(()) => run_case(&ctx, case).await,
        Err(e) => Err(e),
    };

    match &res {
        Ok(()) => println!("PASS {}", case.description),
        Err(e) => println!("FAIL {}: {e:#}", case.description),
    }

    // Not waited on; namespace deletion can take minutes
    let cleanup_res = cluster.delete(&ns_manifest).await.map_err(anyhow::Error::from);
    res.and(cleanup_res)
}

async fn wait_for_namespace(ctx: &HarnessContext, ns_manifest: &Manifest) -> EmptyResult {
    for ns in ns_manifest.resources() {
        wait_until_present(ctx, ns).await?;
    }
    Ok(())
}

fn namespace_manifest(name: &str, managed_by: &str) -> Manifest {
    let gvk = GVK::new("", "v1", NAMESPACE_KIND);
    let mut ns = DynamicObject::new(name, &ApiResource::from_gvk(&gvk));
    ns.labels_mut()
        .insert(APP_KUBERNETES_IO_MANAGED_BY_KEY.into(), managed_by.into());
    Manifest::from_objects(Path::new("<test namespace>"), vec![ns])
}
