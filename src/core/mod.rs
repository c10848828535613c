pub mod date_dimension;
pub mod etl;
pub mod frame;
pub mod lookup;
pub mod orchestrator;
pub mod snapshot;
pub mod transformers;

pub use crate::domain::model::{
    CurrencyLookup, OutputSet, OutputTable, Record, Snapshot, Table, TransformOutcome,
};
pub use crate::domain::ports::{ConfigProvider, LookupLoader, RawDataSource, Storage};
pub use crate::utils::error::Result;
