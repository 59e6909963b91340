pub mod a1;

pub use a1::{cell_text, column_letter, column_position, A1Range, CellWrite, SheetRef};
