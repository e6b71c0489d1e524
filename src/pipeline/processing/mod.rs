pub mod dates;
pub mod dedupe;
pub mod normalize;
pub mod similarity;
