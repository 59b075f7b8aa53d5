//! A stateless request/response façade for embedding in an HTTP handler.
//!
//! The core does not listen on a socket; the hosting layer parses the HTTP
//! stream, hands the method, path and body here, and writes the returned
//! status, content type and body back out. Admission control and timeouts
//! are the host's concern.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::executor::{self, ResultStore};

#[derive(Debug)]
pub struct Request<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub body: &'a [u8],
}

#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RunRequest {
    workflow: String,
}

#[derive(Debug, Serialize)]
struct RunResponse<'a> {
    workflow: &'a str,
    results: &'a ResultStore,
}

/// Handle `POST /run` with body `{"workflow": "<path>"}`.
///
/// Returns `200` with the result store on success, `400` for a malformed
/// body, `404` for any other path or method, and `500` for every
/// downstream failure. Error bodies carry the message as plain text.
pub fn handle(root: &Path, request: &Request<'_>) -> Response {
    if request.method != "POST" || request.path != "/run" {
        return Response::text(404, "not found");
    }

    let run_request: RunRequest = match serde_json::from_slice(request.body) {
        Ok(r) => r,
        Err(e) => return Response::text(400, format!("invalid request body: {e}")),
    };

    match executor::run_workflow(&run_request.workflow, root) {
        Ok(results) => {
            let payload = RunResponse {
                workflow: &run_request.workflow,
                results: &results,
            };
            match serde_json::to_string(&payload) {
                Ok(body) => Response {
                    status: 200,
                    content_type: "application/json",
                    body,
                },
                Err(e) => Response::text(500, e.to_string()),
            }
        }
        Err(e) => Response::text(500, e.to_string()),
    }
}
