mod environment;
mod evaluator;
mod natives;

pub use environment::{Environment, Platform};
pub(crate) use environment::normalize_arch;
pub use evaluator::{
    should_include, should_include_features, to_folder_rules, Feature, OsRule, Rule, RuleAction,
};
pub use natives::{extract_native_classifier, NativeClassifier};
