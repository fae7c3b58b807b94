use tracing::*;

use crate::compare::compare;
use crate::discovery::Case;
use crate::lifecycle::{
    assert_absent,
    deploy,
    remove,
};
use crate::prelude::*;

/// Run a single declarative case: deploy its manifests (and its config, if it has one), check that
/// every expected resource shows up and matches, check that every forbidden resource stays absent,
/// and then tear everything down again.  Teardown runs even if the checks fail; the first error is
/// the one that gets returned.
#[instrument(skip_all, fields(case = %case.name, ns = %ctx.namespace))]
pub async fn run_case(ctx: &HarnessContext, case: &Case) -> EmptyResult {
    info!("{}", case.description);
    let has_config = case.config.is_file();
    if !has_config {
        info!("no config found at {}, skipping", case.config.display());
    }

    let res = run_case_checks(ctx, case, has_config).await;
    if let Err(e) = &res {
        error!("case {} failed: {e:#}", case.name);
    }

    let teardown_res = teardown(ctx, case, has_config).await;
    res.and(teardown_res)
}

async fn run_case_checks(ctx: &HarnessContext, case: &Case, has_config: bool) -> EmptyResult {
    for path in &case.deploy {
        deploy(ctx, path).await?;
    }

    if has_config {
        deploy(ctx, &case.config).await?;
    }

    for path in &case.expected.created {
        compare(ctx, path).await?;
    }

    for path in &case.expected.not_created {
        assert_absent(ctx, path).await?;
    }

    Ok(())
}

async fn teardown(ctx: &HarnessContext, case: &Case, has_config: bool) -> EmptyResult {
    let config = has_config.then_some(case.config.as_path());
    let mut res = Ok(());
    for path in config.into_iter().chain(case.deploy.iter().rev().map(|p| p.as_path())) {
        if let Err(e) = remove(ctx, path).await {
            warn!("could not clean up {}: {e:#}", path.display());
            res = res.and(Err(e));
        }
    }
    res
}

