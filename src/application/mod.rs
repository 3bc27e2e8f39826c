pub mod order_placement;
pub mod submission;
