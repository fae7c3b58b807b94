pub use anyhow::{
    anyhow,
    bail,
    ensure,
};
pub use paste::paste;
pub use thiserror::Error;

pub type EmptyResult = anyhow::Result<()>;

// This macro creates an enum which derives from thiserror::Error, and also
// creates constructor functions in snake case for each of the enum variants
#[macro_export]
macro_rules! err_impl {
    (@hidden $errtype:ident, $item:ident, String) => {
        paste! {
            pub(crate) fn [<$item:snake>](in_: &str) -> anyhow::Error {
                anyhow!{$errtype::$item(in_.into())}
            }
        }
    };

    (@hidden $errtype:ident, $item:ident, $($dtype:tt)::+) => {
        paste! {
            pub(crate) fn [<$item:snake>](in_: &$($dtype)::+) -> anyhow::Error {
                anyhow!{$errtype::$item(in_.clone())}
            }
        }
    };

    ($errtype:ident,
        $(#[$errinfo:meta] $item:ident($($dtype:tt)::+),)+
    ) => {
        #[derive(Debug, Error)]
        pub enum $errtype {
            $(#[$errinfo] $item($($dtype)::+)),+
        }

        impl $errtype {
            $(err_impl! {@hidden $errtype, $item, $($dtype)::+})+
        }
    };
}

pub use err_impl;

err_impl! {HarnessError,
    #[error("could not read case directory {0}")]
    CaseDirUnreadable(String),

    #[error("case {0} has no manifests in its deploy directory")]
    EmptyDeployDir(String),

    #[error("manifest contains no resources: {0}")]
    EmptyManifest(String),

    #[error("resource has no type information: {0}")]
    MissingTypeInfo(String),

    #[error("resource does not match expected state: {0}")]
    ResourceMismatch(String),

    #[error("resource still exists on cluster: {0}")]
    ResourceStillExists(String),

    #[error("no comparison procedure registered for kind {0}")]
    UnregisteredKind(String),
}
