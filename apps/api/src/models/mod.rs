pub mod match_record;
pub mod posting;
