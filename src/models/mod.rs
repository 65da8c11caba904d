pub mod delivery_problem;
pub mod deliveryman;
pub mod file;
pub mod order;
pub mod recipient;
