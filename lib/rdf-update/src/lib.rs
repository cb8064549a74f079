#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod error;
pub mod io;
pub mod store;

pub mod model {
    pub use rdf_update_model::*;
}

pub mod sparql {
    pub use rdf_update_engine::sparql::*;
}

pub mod storage {
    pub use rdf_update_storage::*;
}
