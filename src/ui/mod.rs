pub mod day_grid;
pub mod theme;
