mod collisions;
mod helper;
mod prior_state;
