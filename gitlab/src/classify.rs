use labsync_common::error::MembershipError;
use reqwest::StatusCode;

const MAX_BODY_CHARS: usize = 200;

/// Maps a non-success HTTP answer onto the failure taxonomy.
pub(crate) fn status_error(
    status: StatusCode,
    retry_after: Option<&str>,
    body: &str,
) -> MembershipError {
    let message = body_message(status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => MembershipError::Unauthorized(message),
        StatusCode::NOT_FOUND => MembershipError::NotFound(message),
        // "Member already exists"
        StatusCode::CONFLICT => MembershipError::AlreadyMember,
        StatusCode::TOO_MANY_REQUESTS => MembershipError::RateLimited {
            retry_after_secs: retry_after.and_then(|v| v.trim().parse().ok()),
        },
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            MembershipError::Network(message)
        }
        _ => MembershipError::Malformed(message),
    }
}

pub(crate) fn transport_error(err: reqwest::Error) -> MembershipError {
    if err.is_decode() {
        MembershipError::Malformed(err.to_string())
    } else {
        MembershipError::Network(err.to_string())
    }
}

/// GitLab wraps errors as `{"message": ...}` or `{"error": ...}`; anything else is kept raw.
fn body_message(status: StatusCode, body: &str) -> String {
    let parsed: Option<String> = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            let field = value.get("message").or_else(|| value.get("error"))?;
            Some(match field.as_str() {
                Some(text) => text.to_string(),
                None => field.to_string(),
            })
        });

    let detail: String =
        parsed.unwrap_or_else(|| body.trim().chars().take(MAX_BODY_CHARS).collect());
    if detail.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {detail}")
    }
}
