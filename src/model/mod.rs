pub mod bucket;
pub mod horizon;
pub mod label;
pub mod multiple;
pub mod sample;

pub use bucket::{AggregatedPoint, Granularity};
pub use horizon::{Horizon, HORIZON_30D, HORIZON_365D};
pub use label::{Label, LabelTone};
pub use multiple::{History, HistoryPoint, HorizonPair, PriceMultiple, Summary};
pub use sample::PriceSample;
