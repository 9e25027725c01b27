//! Question understanding and answering: classify, extract, execute, format.

pub mod classifier;
pub mod executor;
pub mod extractor;
pub mod formatter;
pub mod resolver;

pub use classifier::{default_rules, IntentClassifier, IntentRule, Signals};
pub use executor::QueryExecutor;
pub use extractor::ParameterExtractor;
pub use formatter::{format, sample_questions};
pub use resolver::{EntityKind, EntityResolver};
