pub mod format;
pub mod table;

pub use format::{format_brl, format_date_br};
pub use table::{render_details, render_partners, render_table, write_csv};
