pub mod comment;
pub mod enrichment;
