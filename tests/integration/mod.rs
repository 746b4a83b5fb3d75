mod remote_server;
mod scp_transfer;
mod test_utils;
