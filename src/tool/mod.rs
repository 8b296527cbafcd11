pub mod attachments;
pub mod invoker;
