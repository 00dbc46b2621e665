/// Cooperative cancellation shared between the caller and running work
pub mod cancel;
/// Combinations, explicit choices and generated editions
pub mod combination;
/// Retry-until-unique edition generation
pub mod generator;
