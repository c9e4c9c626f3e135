//! Streaming echo channel.

use super::{Recorder, Suite};
use crate::fixtures::STREAM_GREETING;
use crate::models::Category;
use crate::steps::{Passed, StepFailure, StepResult};
use crate::transport::{StreamChannel, Transport};
use async_trait::async_trait;
use bls_proto::is_echo_of;
use std::time::Duration;
use tracing::debug;

const STEPS: &[&str] = &["connection_test"];

/// Opens the stream, sends a greeting and waits for its echo.
pub struct StreamingSuite {
    id: String,
    description: String,
    path: String,
    timeout: Duration,
}

impl StreamingSuite {
    pub fn new(path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            id: "streaming".to_string(),
            description: "WebSocket echo round trip".to_string(),
            path: path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Suite for StreamingSuite {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> Category {
        Category::Streaming
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn steps(&self) -> &'static [&'static str] {
        STEPS
    }

    async fn run(&self, transport: &dyn Transport, recorder: &mut Recorder<'_>) {
        let result = match transport.open_stream(&self.path).await {
            Ok(mut channel) => {
                let result = round_trip(channel.as_mut(), self.timeout).await;
                channel.close().await;
                result
            }
            Err(e) => Err(e.into()),
        };
        recorder.record("connection_test", result);
    }
}

async fn round_trip(channel: &mut dyn StreamChannel, timeout: Duration) -> StepResult<()> {
    channel.send(STREAM_GREETING).await?;
    let reply = channel.receive(timeout).await?;
    debug!(%reply, "stream reply");

    if is_echo_of(&reply, STREAM_GREETING) {
        Ok(Passed::unit(format!("Received echo: {reply}")))
    } else {
        Err(StepFailure::Stream {
            message: format!("unexpected reply: {reply}"),
        })
    }
}
