pub mod client_server_msg;
pub mod dequeue;
pub mod fields;
pub mod server_client_msg;
