mod common;

mod awards;
mod catalog;
mod hall_pass;
