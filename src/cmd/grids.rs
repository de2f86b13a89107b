use crate::reports;
use loopforge::config::Config;
use loopforge::grids::KnownGrid;
use strum::IntoEnumIterator;

pub fn run() {
    let base = Config::default();
    let rows: Vec<(KnownGrid, usize)> = KnownGrid::iter()
        .map(|grid| (grid, grid.expand(&base).len()))
        .collect();
    reports::print_grid_table(&rows);
}
