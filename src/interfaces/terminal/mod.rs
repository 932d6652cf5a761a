pub mod command_reader;
pub mod effect_writer;
