pub mod bp_search;
pub mod nc;
pub mod schoolboard;
pub mod sources;
pub mod stats;
