// Accessbar managers: stateful preference containers.

pub mod preference_slice;
pub mod preference_store;
