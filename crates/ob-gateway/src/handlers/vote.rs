//! `POST /v1/vote` (§4.7): election prepare/commit receiver. The candidate
//! side lives in [`ob_cluster::keepalive::run_election`]; this handler is
//! the peer side that votes.

use axum::extract::State;
use axum::Json;
use ob_cluster::keepalive::{VotePhase, VoteRequest, VoteResponse};

use crate::state::AppState;

pub async fn vote(State(state): State<AppState>, Json(req): Json<VoteRequest>) -> Json<VoteResponse> {
    match req.phase {
        VotePhase::Prepare => {
            // A node with a higher-versioned Smap already than the
            // candidate's payload refuses to vote for it (§4.7 "prepare").
            let local_version = state.smap.current().version;
            let candidate_version = req.payload.smap.as_ref().map(|s| s.version).unwrap_or(0);
            Json(VoteResponse {
                accepted: candidate_version >= local_version,
            })
        }
        VotePhase::Commit => {
            let mut accepted = false;
            if let Some(smap) = req.payload.smap {
                accepted = state.smap.receive(smap, false).is_ok();
            }
            if let Some(bmd) = req.payload.bmd {
                let _ = state.bmd.receive(bmd, false);
            }
            if let Some(rmd) = req.payload.rmd {
                let _ = state.rmd.receive(rmd, false);
            }
            if accepted {
                state.is_primary.store(false, std::sync::atomic::Ordering::SeqCst);
            }
            Json(VoteResponse { accepted })
        }
    }
}
