mod common;

mod scenarios;
