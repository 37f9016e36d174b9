pub mod booru_server;
