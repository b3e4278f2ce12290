use crate::error::ProfileError;
use crate::session::Credential;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

/// One JSON POST. Status and body problems map onto the pipeline error taxonomy.
pub(crate) async fn post_json<B, T>(
    http: &reqwest::Client,
    url: &str,
    credential: &Credential,
    body: &B,
) -> Result<T, ProfileError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let mut req = http.post(url).json(body);
    if let Some(value) = credential.authorization() {
        req = req.header(AUTHORIZATION, value);
    }

    let res = req
        .send()
        .await
        .map_err(|e| ProfileError::Transport(format!("request to {url} failed: {e}")))?;

    let status = res.status();
    let text = res
        .text()
        .await
        .map_err(|e| ProfileError::Transport(format!("failed to read response from {url}: {e}")))?;

    if !status.is_success() {
        return Err(ProfileError::Upstream {
            status_code: status.as_u16(),
            message: error_message(status, &text),
        });
    }

    serde_json::from_str::<T>(&text).map_err(|e| {
        ProfileError::Transport(format!("malformed response body from {url}: {e}"))
    })
}

/// Prefers the body's `message`, then `error`, then the status reason phrase.
fn error_message(status: StatusCode, body: &str) -> String {
    let from_body = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "error"].iter().find_map(|field| {
                v.get(field)
                    .and_then(|m| m.as_str())
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
            })
        });

    from_body.unwrap_or_else(|| {
        status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.to_string())
    })
}
