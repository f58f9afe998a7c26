//! `ob rm <bucket> <key>` — `DELETE /v1/objects/:bucket/:key`.

use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use crate::client::exit_code_for_status;

pub async fn execute(ctx: &CommandContext, bucket: &str, key: &str) -> Result<i32> {
    let path = format!("/v1/objects/{bucket}/{key}");
    let resp = ctx.client.delete(&path).await?;
    let status = resp.status();

    if !status.is_success() {
        ctx.error(&format!("delete '{bucket}/{key}' failed: {status}"));
        return Ok(exit_code_for_status(status));
    }

    ctx.info(&format!("{}: {bucket}/{key}", "delete".red()));
    Ok(0)
}
