pub mod score;
pub mod weights;
