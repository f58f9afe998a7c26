//! S3-compatible façade and "Easy URL" rewrites (§6.1, GLOSSARY "Easy URL").
//!
//! §1 excludes "the S3 XML surface beyond how it maps onto the core
//! routing" from scope — this module only does the path/verb translation
//! C12 names (`/s3/...` and the `/gs`, `/az`, `/ais` prefixes collapse onto
//! the same `/v1/objects`/`/v1/buckets` handlers); it does not reimplement
//! S3's multipart/versioning/lifecycle/ACL/policy XML bodies (§7
//! "Unsupported: 501 for S3 lifecycle/CORS/ACL/policy").

use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use ob_core::bck::Provider;

use crate::handlers::buckets::{self, BucketQuery, CreateBucketBody, ListQuery};
use crate::handlers::objects::{self, ObjectQuery};
use crate::state::AppState;

/// `/s3/:bucket`: list-objects (GET), create (PUT), destroy (DELETE).
pub async fn s3_bucket(state: State<AppState>, path: Path<String>, method: Method) -> Response {
    match method {
        Method::GET => {
            buckets::list_bucket(state, path, Query(BucketQuery::default()), Query(empty_list_query())).await
        }
        Method::PUT => {
            buckets::post_bucket(
                state,
                path,
                Query(BucketQuery::default()),
                None,
                Json(CreateBucketBody { create_ais: true, head_remote: false, try_head_remote: false }),
            )
            .await
        }
        Method::DELETE => buckets::delete_bucket(state, path, Query(BucketQuery::default())).await,
        Method::HEAD => buckets::head_bucket(state, path, Query(BucketQuery::default())).await,
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

/// `/s3/:bucket/*key`: object verbs, collapsing onto the same redirect
/// contract `/v1/objects` uses.
pub async fn s3_object(state: State<AppState>, path: Path<(String, String)>, method: Method) -> Response {
    objects::object_verb(state, path, Query(ObjectQuery::default()), method).await
}

fn provider_for_prefix(prefix: &str) -> Option<Provider> {
    match prefix {
        "gs" => Some(Provider::Gcp),
        "az" => Some(Provider::Azure),
        "ais" => Some(Provider::Ais),
        _ => None,
    }
}

fn empty_list_query() -> ListQuery {
    ListQuery { prefix: None, token: None, page_size: None, uuid: None }
}

/// `/gs|az|ais/:bucket/*key`: "easy URL" rewrite to `/v1/objects`, the
/// provider implied by the prefix rather than a query param.
pub async fn easy_url_object(
    state: State<AppState>,
    Path((prefix, bucket, key)): Path<(String, String, String)>,
    method: Method,
) -> Response {
    let Some(provider) = provider_for_prefix(&prefix) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let query = ObjectQuery { provider: Some(provider.to_string()), namespace: None };
    objects::object_verb(state, Path((bucket, key)), Query(query), method).await
}

/// `/gs|az|ais/:bucket`: "easy URL" rewrite to `/v1/buckets`.
pub async fn easy_url_bucket(
    state: State<AppState>,
    Path((prefix, bucket)): Path<(String, String)>,
    method: Method,
) -> Response {
    let Some(provider) = provider_for_prefix(&prefix) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let query = BucketQuery { provider: Some(provider.to_string()), namespace: None };
    match method {
        Method::GET => buckets::list_bucket(state, Path(bucket), Query(query), Query(empty_list_query())).await,
        Method::HEAD => buckets::head_bucket(state, Path(bucket), Query(query)).await,
        Method::DELETE => buckets::delete_bucket(state, Path(bucket), Query(query)).await,
        Method::PUT => {
            buckets::post_bucket(
                state,
                Path(bucket),
                Query(query),
                None,
                Json(CreateBucketBody { create_ais: false, head_remote: true, try_head_remote: true }),
            )
            .await
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_easy_url_prefix_is_rejected() {
        assert!(provider_for_prefix("ftp").is_none());
    }

    #[test]
    fn known_easy_url_prefixes_map_to_their_provider() {
        assert_eq!(provider_for_prefix("gs"), Some(Provider::Gcp));
        assert_eq!(provider_for_prefix("az"), Some(Provider::Azure));
        assert_eq!(provider_for_prefix("ais"), Some(Provider::Ais));
    }
}
