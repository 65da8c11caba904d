//! Client-side state for the mobile app: recipients actions, the reducer that
//! folds them into state, and the effects that turn requests into API calls.

pub mod effects;
pub mod recipients;
