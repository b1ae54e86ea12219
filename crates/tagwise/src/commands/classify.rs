use tagwise_upstream::{BackoffPolicy, UpstreamError};

pub fn run(message: &str) -> anyhow::Result<()> {
    print!("{}", render(message));
    Ok(())
}

fn render(message: &str) -> String {
    let err = UpstreamError::from_message(message);
    let kind = err.kind();
    let delay = BackoffPolicy::default().delay(&err, 0);

    let mut out = format!("kind: {}\n", kind.as_str());
    if let Some(api) = err.api_error() {
        out.push_str(&format!("status: {}\n", api.status));
        if let Some(error_type) = &api.error_type {
            out.push_str(&format!("type: {error_type}\n"));
        }
    }
    out.push_str(&format!("retryable: {}\n", err.is_retryable()));
    out.push_str(&format!("first retry in: {}s\n", delay.as_secs()));
    out
}
