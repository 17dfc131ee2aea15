// CSV boundary: rows in, summary rows out
pub mod reader;
pub mod writer;

pub use reader::{parse_timestamp, RecordReader};
pub use writer::{default_output_path, header, row_cells, write_json, SummaryWriter};
