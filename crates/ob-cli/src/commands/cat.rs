//! `ob cat <bucket> <key>` — `GET /v1/objects/:bucket/:key`, stream the
//! body to stdout.

use anyhow::Result;
use tokio::io::{stdout, AsyncWriteExt};

use super::CommandContext;
use crate::client::exit_code_for_status;

pub async fn execute(ctx: &CommandContext, bucket: &str, key: &str) -> Result<i32> {
    let path = format!("/v1/objects/{bucket}/{key}");
    let mut resp = ctx.client.get(&path).await?;
    let status = resp.status();

    if !status.is_success() {
        ctx.error(&format!("get '{bucket}/{key}' failed: {status}"));
        return Ok(exit_code_for_status(status));
    }

    let mut out = stdout();
    while let Some(chunk) = resp.chunk().await? {
        out.write_all(&chunk).await?;
    }
    out.flush().await?;
    Ok(0)
}
