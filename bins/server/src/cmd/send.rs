use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::config::SendArgs;
use crate::error::ServerError;

/// Submit one payload, close the write half and print everything the
/// server sends back before it closes the connection.
pub async fn run(args: SendArgs) -> Result<(), ServerError> {
    let body = if args.payload.is_empty() {
        let mut buf = Vec::new();
        tokio::io::stdin().read_to_end(&mut buf).await?;
        buf
    } else {
        args.payload.join(" ").into_bytes()
    };
    let payload = frame_payload(body, args.terminator);

    let mut stream = TcpStream::connect(&args.addr)
        .await
        .map_err(|source| ServerError::Connect { addr: args.addr.clone(), source })?;
    tracing::debug!(addr = %args.addr, len = payload.len(), "sending payload");

    stream.write_all(&payload).await?;
    stream.shutdown().await?;

    let mut reply = Vec::new();
    tokio::time::timeout(Duration::from_secs(args.timeout_secs), stream.read_to_end(&mut reply))
        .await
        .map_err(|_| ServerError::Timeout(args.timeout_secs))??;

    let mut stdout = tokio::io::stdout();
    stdout.write_all(&reply).await?;
    stdout.flush().await?;
    Ok(())
}

/// Append the terminator unless the payload already ends with it.
fn frame_payload(mut body: Vec<u8>, terminator: u8) -> Vec<u8> {
    if body.last() != Some(&terminator) {
        body.push(terminator);
    }
    body
}
