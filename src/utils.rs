//! Terminal output helpers.

mod progress;
mod table;

pub use progress::{render_line, Progress, ProgressBar};
pub use table::{format_table, print_table};
