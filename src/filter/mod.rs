pub mod ast;
pub mod comparators;
pub mod eval;
pub mod parser;
pub mod validate;

pub use ast::{Comparator, Condition, FilterExpr, FilterValue, Group, LogicalOperator};
pub use comparators::DateEquality;
pub use eval::{evaluate, evaluate_refs, evaluate_with, EvalOptions};
pub use parser::{parse, ParseError};
pub use validate::validate;
