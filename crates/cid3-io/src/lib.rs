//! File formats for the cid3 pipeline: names, data, test, and cases files,
//! scored-case output, and rule-tree JSON.

mod cases;
mod data;
mod error;
mod files;
mod names;
mod rules;

pub use cases::{CasesReader, CasesWriter, ScoredCase};
pub use data::{DataReader, RawRecord};
pub use error::IoError;
pub use files::{DataFiles, scored_cases_path};
pub use names::NamesReader;
pub use rules::{RuleWriter, read_rules};
