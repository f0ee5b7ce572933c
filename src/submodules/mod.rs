pub mod collector;
pub mod error;
pub mod generator;
pub mod input_deck;
pub mod input_params;
pub mod mfile;
pub mod palette;
pub mod plot_recipes;
pub mod plotting;
pub mod regions;
pub mod runner;
pub mod scan;
pub mod table;
pub mod type_lib;
