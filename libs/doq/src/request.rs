use hickory_proto::op::Message;

use crate::client::Client;
use crate::context::Context;
use crate::error::Result;

/// Perform a one-off DNS over QUIC query
///
/// Builds a client with default options, sends the query on a background
/// context and drops the connection afterwards.
pub async fn query(addr: &str, message: &Message) -> Result<Message> {
    let client = Client::new(addr)?;
    client.send(&Context::background(), message).await
}
