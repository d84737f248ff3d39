use crate::domain::ports::Transport;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Line-oriented [`Transport`] over any async byte stream.
///
/// A read that times out mid-line keeps the bytes received so far and hands
/// them out as the line, the same way a serial readline with a timeout does.
pub struct LineTransport<S> {
    stream: BufReader<S>,
    timeout: Duration,
    pending: Vec<u8>,
}

impl<S> LineTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, timeout: Duration) -> Self {
        Self {
            stream: BufReader::new(stream),
            timeout,
            pending: Vec::new(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn take_pending(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let bytes = std::mem::take(&mut self.pending);
        let line = String::from_utf8_lossy(&bytes);
        Some(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

#[async_trait]
impl<S> Transport for LineTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, data: &str) -> Result<()> {
        let stream = self.stream.get_mut();
        stream.write_all(data.as_bytes()).await?;
        stream.flush().await?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<Option<String>> {
        // read_until 取消時已讀到的位元組會留在 pending 中
        match tokio::time::timeout(
            self.timeout,
            self.stream.read_until(b'\n', &mut self.pending),
        )
        .await
        {
            Ok(Ok(_)) => Ok(self.take_pending()),
            Ok(Err(e)) => {
                self.pending.clear();
                Err(e.into())
            }
            Err(_elapsed) => Ok(self.take_pending()),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.pending.clear();
        self.stream.get_mut().shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_reads_lines_and_times_out() {
        let (client, mut device) = duplex(256);
        let mut transport = LineTransport::new(client, Duration::from_millis(50));

        device.write_all(b"{\"a\": 1}\r\n{\"b\": 2}\n").await.unwrap();

        assert_eq!(
            transport.read_line().await.unwrap().as_deref(),
            Some("{\"a\": 1}")
        );
        assert_eq!(
            transport.read_line().await.unwrap().as_deref(),
            Some("{\"b\": 2}")
        );
        assert_eq!(transport.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_partial_line_is_returned_after_timeout() {
        let (client, mut device) = duplex(256);
        let mut transport = LineTransport::new(client, Duration::from_millis(50));

        device.write_all(b"{\"partial\"").await.unwrap();
        assert_eq!(
            transport.read_line().await.unwrap().as_deref(),
            Some("{\"partial\"")
        );
    }

    #[tokio::test]
    async fn test_write_is_sent_verbatim() {
        let (client, mut device) = duplex(256);
        let mut transport = LineTransport::new(client, Duration::from_millis(50));

        transport.write("{\"get_info\":true}").await.unwrap();
        transport.close().await.unwrap();

        let mut received = String::new();
        tokio::io::AsyncReadExt::read_to_string(&mut device, &mut received)
            .await
            .unwrap();
        assert_eq!(received, "{\"get_info\":true}");
    }

    #[tokio::test]
    async fn test_request_reply_exchange() {
        let stream = tokio_test::io::Builder::new()
            .write(b"{\"get_status\":true}")
            .read(b"{\"success\": true,\r\n")
            .read(b" \"data\": {}}\r\n")
            .build();
        let mut transport = LineTransport::new(stream, Duration::from_millis(50));

        transport.write("{\"get_status\":true}").await.unwrap();
        assert_eq!(
            transport.read_line().await.unwrap().as_deref(),
            Some("{\"success\": true,")
        );
        assert_eq!(
            transport.read_line().await.unwrap().as_deref(),
            Some(" \"data\": {}}")
        );
        // 資料流結束
        assert_eq!(transport.read_line().await.unwrap(), None);
    }
}
