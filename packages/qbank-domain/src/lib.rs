pub mod grouping;
pub mod similarity;
