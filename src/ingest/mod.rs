pub mod folder;
pub mod marker;
pub mod reader;

pub use reader::{read_sheet, read_tabular, RawRow};
