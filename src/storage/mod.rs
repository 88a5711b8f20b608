pub mod dump;
pub mod reader;
pub mod schema;

pub use reader::{ContentReader, ReadError, Record, RecordStream};
pub use schema::RecordSchema;
