use kc_core::compare::ComparisonStore;
use kc_core::prelude::*;

pub fn cmd() -> EmptyResult {
    for kind in ComparisonStore::default().kinds() {
        println!("{kind}");
    }
    Ok(())
}
