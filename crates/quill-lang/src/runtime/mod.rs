pub mod interpolate;
pub mod interpreter;
pub mod intrinsics;
pub mod ops;
pub mod value;
