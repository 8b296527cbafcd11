pub mod aggregate;
pub mod parser;
pub mod test_node;
