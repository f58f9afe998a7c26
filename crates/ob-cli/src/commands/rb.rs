//! `ob rb <bucket>` — `DELETE /v1/buckets/:name` (destroy, §4.5).

use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use crate::client::exit_code_for_status;

pub async fn execute(ctx: &CommandContext, bucket: &str) -> Result<i32> {
    let path = format!("/v1/buckets/{bucket}");
    let resp = ctx.client.delete(&path).await?;
    let status = resp.status();

    if !status.is_success() {
        ctx.error(&format!("remove_bucket '{bucket}' failed: {status}"));
        return Ok(exit_code_for_status(status));
    }

    ctx.info(&format!("{}: {bucket}", "remove_bucket".red()));
    Ok(0)
}
