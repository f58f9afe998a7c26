//! `ob mb <bucket>` — `POST /v1/buckets/:name` (§4.5 create path, `create_ais`
//! branch of `CreateBucketBody`).

use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use crate::client::exit_code_for_status;

pub async fn execute(ctx: &CommandContext, bucket: &str) -> Result<i32> {
    let path = format!("/v1/buckets/{bucket}");
    let body = serde_json::json!({ "create_ais": true });
    let resp = ctx
        .client
        .post_json(&path, &body)
        .await?;
    let status = resp.status();

    if !status.is_success() {
        ctx.error(&format!("make_bucket '{bucket}' failed: {status}"));
        return Ok(exit_code_for_status(status));
    }

    ctx.info(&format!("{}: {bucket}", "make_bucket".green()));
    Ok(0)
}
