use crate::cli::KindArg;
use std::time::Duration;
use tagwise_upstream::{BackoffPolicy, ErrorKind};

impl From<KindArg> for ErrorKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::RateLimit => ErrorKind::TransientRateLimit,
            KindArg::Quota => ErrorKind::PermanentQuota,
            KindArg::Other => ErrorKind::Other,
        }
    }
}

pub fn run(kind: KindArg, attempts: u32, retry_after: Option<u64>) -> anyhow::Result<()> {
    print!(
        "{}",
        render(
            &BackoffPolicy::default(),
            kind.into(),
            attempts,
            retry_after.map(Duration::from_secs)
        )
    );
    Ok(())
}

fn render(
    policy: &BackoffPolicy,
    kind: ErrorKind,
    attempts: u32,
    retry_after: Option<Duration>,
) -> String {
    let mut out = format!("Backoff schedule ({})\n", kind.as_str());
    out.push_str("======================\n");
    for attempt in 0..attempts {
        let delay = policy.delay_for(kind, attempt, retry_after);
        out.push_str(&format!("  attempt {:>2}: {}\n", attempt, format_delay(delay)));
    }
    out
}

fn format_delay(delay: Duration) -> String {
    let secs = delay.as_secs();
    match secs {
        s if s >= 3600 && s % 3600 == 0 => format!("{}h", s / 3600),
        s if s >= 60 && s % 60 == 0 => format!("{}m", s / 60),
        s => format!("{}s", s),
    }
}
