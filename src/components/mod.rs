pub mod dialog;
pub mod grid;
pub mod top_bar;
